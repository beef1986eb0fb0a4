use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tempfile::TempDir;

use crate::config::context::CommandContext;
use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{Effects, SharedEffects};
use crate::process::{ProcessRunner, RunOutput};
use crate::resolver::{IndexResolver, PackageResolver};

pub(crate) const LOCATOR: &str = "github:NixOS/nixpkgs/nixos-24.05";

pub(crate) const PYTHON_DESCRIPTOR: &str = r#"
[inputs]
nixpkgs = "github:NixOS/nixpkgs/nixos-24.05"

[outputs]
systems = ["x86_64-linux", "aarch64-darwin"]

[outputs.devShell]
buildInputs = ["python3", "black", "isort"]
shellHook = "echo ready"

[outputs.devShell.env]
PIP_DISABLE_PIP_VERSION_CHECK = "1"
"#;

const INDEX: &str = r#"{
  "sources": {
    "github:NixOS/nixpkgs/nixos-24.05": {
      "revision": "63dacb46bf939521bdc93981b4cbb7ecb58427a0",
      "packages": {
        "python3": {
          "x86_64-linux": "/nix/store/aaaa-python3-3.11.9",
          "aarch64-darwin": "/nix/store/bbbb-python3-3.11.9"
        },
        "black": {
          "x86_64-linux": "/nix/store/cccc-black-24.4.2",
          "aarch64-darwin": "/nix/store/dddd-black-24.4.2"
        },
        "isort": {
          "x86_64-linux": "/nix/store/eeee-isort-5.13.2"
        }
      }
    }
  }
}"#;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRun {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

/// Records passthrough invocations and answers with a fixed exit code.
pub(crate) struct RecordingRunner {
    pub code: i32,
    pub runs: Mutex<Vec<RecordedRun>>,
}

impl ProcessRunner for RecordingRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
        cwd: &Path,
    ) -> Result<RunOutput> {
        self.run_passthrough(program, args, envs, cwd)
    }

    fn run_passthrough(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
        _cwd: &Path,
    ) -> Result<RunOutput> {
        self.runs.lock().unwrap().push(RecordedRun {
            program: program.to_string(),
            args: args.to_vec(),
            envs: envs.to_vec(),
        });
        Ok(RunOutput {
            code: self.code,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

pub(crate) struct TestEffects {
    pub resolver: IndexResolver,
    pub runner: RecordingRunner,
}

impl Effects for TestEffects {
    fn resolver(&self) -> &dyn PackageResolver {
        &self.resolver
    }

    fn process(&self) -> &dyn ProcessRunner {
        &self.runner
    }
}

/// Scratch project with a snapshot index and an optional descriptor.
pub(crate) struct Workspace {
    pub dir: TempDir,
    pub effects: Arc<TestEffects>,
}

impl Workspace {
    pub(crate) fn new(descriptor: Option<&str>) -> Self {
        Self::with_exit_code(descriptor, 0)
    }

    pub(crate) fn with_exit_code(descriptor: Option<&str>, code: i32) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = dir.path().join("index.json");
        fs::write(&index, INDEX).expect("index");
        if let Some(contents) = descriptor {
            fs::write(dir.path().join("dx.toml"), contents).expect("descriptor");
        }
        let effects = Arc::new(TestEffects {
            resolver: IndexResolver::new(index),
            runner: RecordingRunner {
                code,
                runs: Mutex::new(Vec::new()),
            },
        });
        Self { dir, effects }
    }

    pub(crate) fn descriptor_path(&self) -> PathBuf {
        self.dir.path().join("dx.toml")
    }

    pub(crate) fn global(&self) -> GlobalOptions {
        GlobalOptions {
            descriptor: Some(self.descriptor_path().display().to_string()),
            ..GlobalOptions::default()
        }
    }

    pub(crate) fn context<'a>(&self, global: &'a GlobalOptions) -> CommandContext<'a> {
        let env = EnvSnapshot::testing(&[("PATH", "/usr/bin:/bin")]);
        let config = Config::from_snapshot(&env).expect("config");
        let effects: SharedEffects = self.effects.clone();
        CommandContext::with_effects(global, env, config, self.dir.path().to_path_buf(), effects)
    }

    pub(crate) fn runs(&self) -> Vec<RecordedRun> {
        self.effects.runner.runs.lock().unwrap().clone()
    }
}

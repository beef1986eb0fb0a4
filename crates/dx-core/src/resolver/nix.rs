use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use dx_domain::{PackageName, PackageSource, TargetPlatform};
use serde::Deserialize;
use tracing::{debug, trace};

use super::{PackageLookup, PackageResolver, PinnedSnapshot, ResolveError};
use crate::process::ProcessRunner;

const EXPERIMENTAL_FEATURES: &str = "nix-command flakes";

const MISSING_MARKERS: [&str; 2] = ["does not provide attribute", "undefined variable"];
const UNSUPPORTED_MARKERS: [&str; 2] = [
    "is not available on the requested hostPlatform",
    "is not supported on",
];
// this machine has no builder for the system; the package itself may be fine
const NO_BUILDER_MARKER: &str = "is required to build";

#[derive(Debug, Deserialize)]
struct FlakeMetadata {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    locked: Option<LockedRef>,
}

#[derive(Debug, Deserialize)]
struct LockedRef {
    #[serde(default)]
    rev: Option<String>,
    #[serde(default, rename = "narHash")]
    nar_hash: Option<String>,
}

/// Drives the `nix` CLI: `flake metadata` pins the source, `build` realizes
/// each package and reports its store path.
pub struct NixResolver {
    program: String,
    cwd: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl NixResolver {
    #[must_use]
    pub fn new(program: impl Into<String>, cwd: PathBuf, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            cwd,
            runner,
        }
    }

    fn ensure_available(&self) -> Result<PathBuf, ResolveError> {
        which::which(&self.program).map_err(|err| ResolveError::Unavailable {
            backend: "nix",
            reason: format!("`{}` not found on PATH ({err})", self.program),
        })
    }

    fn nix(
        &self,
        binary: &Path,
        args: &[&str],
    ) -> Result<crate::process::RunOutput, ResolveError> {
        let mut argv = vec![
            "--extra-experimental-features".to_string(),
            EXPERIMENTAL_FEATURES.to_string(),
        ];
        argv.extend(args.iter().map(ToString::to_string));
        trace!(program = %binary.display(), args = ?argv, "invoking nix");
        let program = binary.to_string_lossy();
        Ok(self.runner.run(&program, &argv, &[], &self.cwd)?)
    }
}

impl PackageResolver for NixResolver {
    fn name(&self) -> &'static str {
        "nix"
    }

    fn resolve_source(&self, source: &PackageSource) -> Result<PinnedSnapshot, ResolveError> {
        let binary = self.ensure_available()?;
        let locator = source.locator.to_string();
        let output = self.nix(&binary, &["flake", "metadata", "--json", &locator])?;
        if output.code != 0 {
            return Err(ResolveError::Unresolved {
                locator,
                reason: last_error_line(&output.stderr),
            });
        }
        let metadata: FlakeMetadata = serde_json::from_str(&output.stdout)
            .map_err(|err| anyhow!("nix flake metadata returned unexpected output: {err}"))?;
        let locked = metadata.locked.as_ref();
        let revision = locked
            .and_then(|entry| entry.rev.clone().or_else(|| entry.nar_hash.clone()))
            .unwrap_or_else(|| source.locator.revision());
        let reference = metadata.url.unwrap_or_else(|| locator.clone());
        debug!(%locator, %revision, "pinned package source");
        Ok(PinnedSnapshot {
            locator,
            reference,
            revision,
        })
    }

    fn lookup(
        &self,
        snapshot: &PinnedSnapshot,
        name: &PackageName,
        platform: TargetPlatform,
    ) -> Result<PackageLookup, ResolveError> {
        let binary = self.ensure_available()?;
        let installable = format!(
            "{}#legacyPackages.{}.{}",
            snapshot.reference,
            platform.as_str(),
            name.as_str()
        );
        let output = self.nix(
            &binary,
            &["build", "--no-link", "--print-out-paths", &installable],
        )?;
        if output.code == 0 {
            let path = output
                .stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .ok_or_else(|| anyhow!("nix build printed no output path for {installable}"))?;
            return Ok(PackageLookup::Found(PathBuf::from(path)));
        }
        if output.stderr.contains(NO_BUILDER_MARKER) {
            return Err(ResolveError::Unavailable {
                backend: "nix",
                reason: format!(
                    "no builder for {platform} on this machine: {}",
                    last_error_line(&output.stderr)
                ),
            });
        }
        Ok(classify_build_failure(&output.stderr).ok_or_else(|| {
            anyhow!(
                "nix build {installable} failed: {}",
                last_error_line(&output.stderr)
            )
        })?)
    }
}

fn classify_build_failure(stderr: &str) -> Option<PackageLookup> {
    if MISSING_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        Some(PackageLookup::Missing)
    } else if UNSUPPORTED_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        Some(PackageLookup::Unsupported)
    } else {
        None
    }
}

fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| line.starts_with("error:"))
        .or_else(|| stderr.lines().map(str::trim).rev().find(|l| !l.is_empty()))
        .unwrap_or("no diagnostics from nix")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::process::RunOutput;

    struct ScriptedRunner {
        replies: Mutex<Vec<RunOutput>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn new(replies: Vec<RunOutput>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(
            &self,
            _program: &str,
            args: &[String],
            _envs: &[(String, String)],
            _cwd: &Path,
        ) -> anyhow::Result<RunOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow!("unexpected nix invocation"))
        }

        fn run_passthrough(
            &self,
            program: &str,
            args: &[String],
            envs: &[(String, String)],
            cwd: &Path,
        ) -> anyhow::Result<RunOutput> {
            self.run(program, args, envs, cwd)
        }
    }

    fn reply(code: i32, stdout: &str, stderr: &str) -> RunOutput {
        RunOutput {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    // `sh` stands in for nix so `which` succeeds; the runner never spawns it.
    fn resolver(runner: Arc<ScriptedRunner>) -> NixResolver {
        NixResolver::new("sh", PathBuf::from("."), runner)
    }

    #[cfg(unix)]
    #[test]
    fn pins_the_locked_revision() {
        let runner = ScriptedRunner::new(vec![reply(
            0,
            r#"{"url":"github:NixOS/nixpkgs/4a3c","locked":{"rev":"4a3c"}}"#,
            "",
        )]);
        let source = PackageSource::new("nixpkgs", "github:NixOS/nixpkgs/nixos-24.05").unwrap();
        let pinned = resolver(runner.clone()).resolve_source(&source).unwrap();
        assert_eq!(pinned.revision, "4a3c");
        assert_eq!(pinned.reference, "github:NixOS/nixpkgs/4a3c");
        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0][2..],
            ["flake", "metadata", "--json", "github:NixOS/nixpkgs/nixos-24.05"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_metadata_is_unresolved() {
        let runner = ScriptedRunner::new(vec![reply(
            1,
            "",
            "warning: foo\nerror: cannot find Git revision 'nope'\n",
        )]);
        let source = PackageSource::new("nixpkgs", "github:NixOS/nixpkgs/nope").unwrap();
        match resolver(runner).resolve_source(&source) {
            Err(ResolveError::Unresolved { reason, .. }) => {
                assert_eq!(reason, "error: cannot find Git revision 'nope'");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn build_failures_are_classified() {
        let runner = ScriptedRunner::new(vec![
            reply(0, "/nix/store/abc-python3-3.11.9\n", ""),
            reply(
                1,
                "",
                "error: flake 'github:NixOS/nixpkgs/4a3c' does not provide attribute 'legacyPackages.x86_64-linux.nope'",
            ),
            reply(
                1,
                "",
                "error: Package 'foo' is not available on the requested hostPlatform",
            ),
            reply(1, "", "error: unexpected failure"),
            reply(
                1,
                "",
                "error: a 'aarch64-darwin' with features {} is required to build '/nix/store/x-baz.drv', but I am a 'x86_64-linux'",
            ),
        ]);
        let resolver = resolver(runner.clone());
        let pinned = PinnedSnapshot {
            locator: "github:NixOS/nixpkgs/nixos-24.05".into(),
            reference: "github:NixOS/nixpkgs/4a3c".into(),
            revision: "4a3c".into(),
        };
        let lookup = |name: &str| {
            resolver.lookup(
                &pinned,
                &PackageName::new(name).unwrap(),
                TargetPlatform::X86_64Linux,
            )
        };
        assert_eq!(
            lookup("python3").unwrap(),
            PackageLookup::Found(PathBuf::from("/nix/store/abc-python3-3.11.9"))
        );
        assert_eq!(lookup("nope").unwrap(), PackageLookup::Missing);
        assert_eq!(lookup("foo").unwrap(), PackageLookup::Unsupported);
        assert!(matches!(lookup("bar"), Err(ResolveError::Backend(_))));
        match lookup("baz") {
            Err(ResolveError::Unavailable { reason, .. }) => {
                assert!(reason.starts_with("no builder for x86_64-linux"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0].last().map(String::as_str),
            Some("github:NixOS/nixpkgs/4a3c#legacyPackages.x86_64-linux.python3")
        );
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let runner = ScriptedRunner::new(Vec::new());
        let resolver = NixResolver::new("dx-no-such-nix", PathBuf::from("."), runner);
        let source = PackageSource::new("nixpkgs", "github:NixOS/nixpkgs/nixos-24.05").unwrap();
        assert!(matches!(
            resolver.resolve_source(&source),
            Err(ResolveError::Unavailable { .. })
        ));
    }
}

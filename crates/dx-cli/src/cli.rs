use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

pub const DX_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const DX_BEFORE_HELP: &str = concat!(
    "dx ",
    env!("CARGO_PKG_VERSION"),
    " – pinned development shells from dx.toml\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  init             Write a starter dx.toml for a Python development shell.\n",
    "  check            Validate dx.toml without contacting the package manager.\n",
    "  realize          Resolve every tool and print where each one lives.\n",
    "  env              Print export statements; use with eval \"$(dx env)\".\n",
    "  shell            Run a command, or $SHELL, inside the development shell.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "dx",
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = DX_BEFORE_HELP,
    help_template = DX_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct DxCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still set the exit code)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        help = "Descriptor to use instead of the closest dx.toml (or DX_DESCRIPTOR)",
        global = true
    )]
    pub file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Write a starter dx.toml describing a Python development shell.",
        override_usage = "dx init [--force] [--snapshot LOCATOR]"
    )]
    Init(InitArgs),
    #[command(about = "Validate dx.toml without resolving anything (read-only).")]
    Check,
    #[command(
        about = "Resolve the development shell and report every tool path.",
        override_usage = "dx realize [--system PLATFORM]"
    )]
    Realize(SystemArgs),
    #[command(
        about = "Print shell statements that activate the development shell.",
        override_usage = "dx env [--system PLATFORM]"
    )]
    Env(SystemArgs),
    #[command(
        about = "Run a command inside the development shell; exits with its status.",
        override_usage = "dx shell [--system PLATFORM] [-- <COMMAND> [ARG...]]"
    )]
    Shell(ShellArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[arg(long, help = "Overwrite an existing dx.toml")]
    pub force: bool,
    #[arg(
        long,
        value_name = "LOCATOR",
        help = "Pinned package snapshot (default github:NixOS/nixpkgs/nixos-24.05)"
    )]
    pub snapshot: Option<String>,
}

#[derive(Args, Debug)]
pub struct SystemArgs {
    #[arg(
        long,
        value_name = "PLATFORM",
        help = "Target platform, e.g. x86_64-linux (defaults to DX_SYSTEM or the host)"
    )]
    pub system: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShellArgs {
    #[command(flatten)]
    pub target: SystemArgs,
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Command and arguments to run (defaults to $SHELL)"
    )]
    pub command: Vec<String>,
}

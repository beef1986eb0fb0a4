use clap::Parser;
use color_eyre::Result;
use dx_core::{CommandContext, GlobalOptions};

mod cli;
mod dispatch;
mod output;
mod style;

use cli::DxCli;
use output::{emit_output, OutputOptions};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = DxCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        descriptor: cli.file.as_ref().map(|p| p.to_string_lossy().to_string()),
    };
    let opts = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
    };

    let (info, outcome) = match CommandContext::new(&global) {
        Ok(ctx) => dispatch::dispatch_command(&ctx, &cli.command)?,
        Err(err) => (
            dispatch::command_info(&cli.command),
            dispatch::context_failure(&err),
        ),
    };
    let code = emit_output(&opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("dx={level},dx_cli={level},dx_core={level},dx_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

use atty::Stream;
use color_eyre::Result;
use dx_core::{diag_commands, CommandGroup, CommandInfo, CommandStatus, ExecutionOutcome};
use serde_json::Value;

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

/// Prints `outcome` and returns the process exit code.
pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = exit_code(info, outcome);
    let style = Style::new(opts.no_color, atty::is(Stream::Stdout));

    if opts.json {
        let payload = dx_core::to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    if let CommandStatus::Ok = outcome.status {
        match info.group {
            // stdout is meant for `eval`, so print the script even with --quiet
            CommandGroup::Env => {
                if let Some(script) = outcome.details.get("script").and_then(Value::as_str) {
                    print!("{script}");
                }
            }
            // the child already owned the terminal
            CommandGroup::Shell => {}
            _ if opts.quiet => {}
            _ => {
                let message = dx_core::format_status_message(info, &outcome.message);
                println!("{}", style.status(&outcome.status, &message));
                if let Some(table) = render_tool_table(&style, &outcome.details) {
                    println!("{table}");
                }
                if let Some(hint) = hint_from_details(&outcome.details) {
                    println!("{}", style.info(&format!("Tip: {hint}")));
                }
            }
        }
        return Ok(code);
    }

    // failures go to stderr so `eval "$(dx env)"` never evaluates them
    let style = Style::new(opts.no_color, atty::is(Stream::Stderr));
    let header = format!("{}  {}", error_code(info), outcome.message);
    eprintln!("{}", style.error_header(&outcome.status, &header));
    eprintln!();
    eprintln!("Why:");
    for reason in collect_why_bullets(&outcome.details, &outcome.message) {
        eprintln!("  • {reason}");
    }
    let fixes = collect_fix_bullets(&outcome.details);
    if !fixes.is_empty() {
        eprintln!();
        eprintln!("Fix:");
        for fix in fixes {
            eprintln!("{}", style.fix_bullet(&format!("  • {fix}")));
        }
    }
    Ok(code)
}

fn exit_code(info: CommandInfo, outcome: &ExecutionOutcome) -> i32 {
    match outcome.status {
        CommandStatus::Ok if info.group == CommandGroup::Shell => outcome.exit_code().unwrap_or(0),
        status => status.exit_code(),
    }
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

/// Renders `details.shell.tools` as a two-column table.
fn render_tool_table(style: &Style, details: &Value) -> Option<String> {
    let tools = details.get("shell")?.get("tools")?.as_object()?;
    if tools.is_empty() {
        return None;
    }
    let rows: Vec<(&str, &str)> = tools
        .iter()
        .filter_map(|(name, path)| Some((name.as_str(), path.as_str()?)))
        .collect();
    let width = rows
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0)
        .max("Tool".len());

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(style.table_header(&format!("{:<width$}  Path", "Tool")));
    lines.push(format!("{:-<width$}  {:-<4}", "", ""));
    for (name, path) in rows {
        lines.push(format!("{name:<width$}  {}", style.dim(path)));
    }
    Some(lines.join("\n"))
}

fn error_code(info: CommandInfo) -> &'static str {
    match info.group {
        CommandGroup::Init => diag_commands::INIT,
        CommandGroup::Check => diag_commands::CHECK,
        CommandGroup::Realize => diag_commands::REALIZE,
        CommandGroup::Env => diag_commands::ENV,
        CommandGroup::Shell => diag_commands::SHELL,
    }
}

fn collect_why_bullets(details: &Value, fallback: &str) -> Vec<String> {
    let mut bullets = Vec::new();
    if let Some(reason) = details.get("reason").and_then(Value::as_str) {
        push_unique(
            &mut bullets,
            reason_display(reason).unwrap_or(reason).to_string(),
        );
    }
    if let Some(packages) = details.get("packages").and_then(Value::as_array) {
        let names: Vec<&str> = packages.iter().filter_map(Value::as_str).collect();
        if !names.is_empty() {
            push_unique(&mut bullets, format!("Packages: {}", names.join(", ")));
        }
    }
    if let Some(cause) = details.get("cause").and_then(Value::as_str) {
        push_unique(&mut bullets, cause.to_string());
    }
    if let Some(issues) = details.get("issues").and_then(Value::as_array) {
        for issue in issues.iter().filter_map(Value::as_str) {
            push_unique(&mut bullets, issue.to_string());
        }
    }
    if bullets.is_empty() {
        bullets.push(fallback.to_string());
    }
    bullets
}

fn collect_fix_bullets(details: &Value) -> Vec<String> {
    let mut fixes = Vec::new();
    if let Some(hint) = hint_from_details(details) {
        push_unique(&mut fixes, hint.to_string());
    }
    if fixes.is_empty() {
        fixes.push("Re-run with -v for more detail or --help for usage.".to_string());
    }
    fixes
}

fn push_unique(vec: &mut Vec<String>, text: impl Into<String>) {
    let entry = text.into();
    if entry.trim().is_empty() {
        return;
    }
    if !vec.iter().any(|existing| existing == &entry) {
        vec.push(entry);
    }
}

fn reason_display(code: &str) -> Option<&'static str> {
    match code {
        "missing_descriptor" => Some("No dx.toml was found."),
        "invalid_descriptor" => Some("dx.toml is not valid TOML."),
        "invalid_locator" => Some("An input locator is not pinned to a revision."),
        "unresolved_source" => Some("The package source could not be fetched at that revision."),
        "unknown_package" => Some("Some requested packages do not exist in the snapshot."),
        "platform_unsupported" => Some("Some requested packages have no build for this platform."),
        "platform_not_declared" => Some("dx.toml does not declare outputs for this platform."),
        "resolver_unavailable" => Some("The package manager could not be used."),
        _ => None,
    }
}

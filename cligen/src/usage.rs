//! Usage and help text derived from the command tree.

use crate::tree::{CommandNode, CommandTree, Subcommand};

/// One line per command: `service (endpoint1|endpoint2)`, or `service endpoint`
/// when the service has a single endpoint.
pub fn usage_commands(tree: &CommandTree) -> Vec<String> {
    tree.services
        .iter()
        .map(|cmd| {
            let subs: Vec<&str> = cmd.subcommands.iter().map(|s| s.name.as_str()).collect();
            if subs.len() > 1 {
                format!("{} ({})", cmd.name, subs.join("|"))
            } else {
                format!("{} {}", cmd.name, subs.join(""))
            }
        })
        .collect()
}

/// Runnable examples: one per command, for the first `max_examples` commands.
pub fn usage_examples(tree: &CommandTree) -> Vec<String> {
    tree.services
        .iter()
        .take(tree.max_examples)
        .map(|cmd| format!("{} {}", tree.tool, cmd.example))
        .collect()
}

/// Top-level help: grammar, global flags, commands and examples.
pub fn tool_usage(tree: &CommandTree) -> String {
    let mut lines = vec![
        "Usage:".to_string(),
        format!("    {} [globalflags] SERVICE ENDPOINT [flags]", tree.tool),
    ];

    if !tree.global_flags.is_empty() {
        lines.push(String::new());
        lines.push("Global flags:".to_string());
        for flag in &tree.global_flags {
            let mut line = format!("    --{}", flag.name);
            if flag.takes_value {
                line.push_str(" STRING");
            }
            line.push_str(&format!(": {}", flag.description));
            if let Some(default) = &flag.default {
                line.push_str(&format!(" (default {default:?})"));
            }
            lines.push(line);
        }
    }

    lines.push(String::new());
    lines.push("Commands:".to_string());
    lines.extend(usage_commands(tree).into_iter().map(|l| format!("    {l}")));
    lines.push(String::new());
    lines.push("Additional help:".to_string());
    lines.push(format!("    {} SERVICE --help", tree.tool));
    lines.push(String::new());
    lines.push("Example:".to_string());
    lines.extend(usage_examples(tree).into_iter().map(|l| format!("    {l}")));
    text(&lines)
}

/// Help of a service command, listing its endpoints.
pub fn command_usage(tree: &CommandTree, cmd: &CommandNode) -> String {
    let mut lines = vec![
        cmd.description.clone(),
        "Usage:".to_string(),
        format!("    {} [globalflags] {} COMMAND [flags]", tree.tool, cmd.name),
        String::new(),
        "COMMAND:".to_string(),
    ];
    lines.extend(
        cmd.subcommands
            .iter()
            .map(|sub| format!("    {}: {}", sub.name, sub.description)),
    );
    lines.push(String::new());
    lines.push("Additional help:".to_string());
    lines.push(format!("    {} {} COMMAND --help", tree.tool, cmd.name));
    lines.push(String::new());
    lines.push("Example:".to_string());
    lines.push(format!("    {} {}", tree.tool, cmd.example));
    text(&lines)
}

/// Help of an endpoint: synopsis, description, one line per flag and an example.
pub fn subcommand_usage(tree: &CommandTree, cmd: &CommandNode, sub: &Subcommand) -> String {
    let mut synopsis = format!("{} [flags] {} {}", tree.tool, cmd.name, sub.name);
    for flag in &sub.flags {
        synopsis.push_str(&format!(" --{} {}", flag.name, flag.kind));
    }

    let mut lines = vec![synopsis, String::new(), sub.description.clone()];
    for flag in &sub.flags {
        let mut line = format!("    --{} {}:", flag.name, flag.kind);
        if !flag.description.is_empty() {
            line.push(' ');
            line.push_str(&flag.description);
        }
        if flag.required {
            line.push_str(" (REQUIRED)");
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push("Example:".to_string());
    lines.push(format!("    {} {}", tree.tool, sub.example));
    text(&lines)
}

/// Newline-terminated text from lines.
fn text(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

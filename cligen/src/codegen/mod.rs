//! Rust source emission for the command tree.
//!
//! A generated CLI is a set of [`File`]s, each an ordered list of
//! [`Section`]s (a template plus the data it renders). Rendering is pure and
//! deterministic; writing happens separately through [`write_files`].

pub mod sink;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use crate::config::GeneratorConfig;
use crate::design::DesignSpec;
use crate::error::GenResult;
use crate::naming;
use crate::payload::{self, PayloadStrategy};
use crate::tree::{CommandNode, CommandTree, Subcommand};
use crate::usage;

use self::sink::OutputSink;

const TEMPLATES: [(&str, &str); 5] = [
    ("header.tera", include_str!("templates/header.tera")),
    ("usage.tera", include_str!("templates/usage.tera")),
    ("parse.tera", include_str!("templates/parse.tera")),
    ("command_usage.tera", include_str!("templates/command_usage.tera")),
    ("build_payload.tera", include_str!("templates/build_payload.tera")),
];

/// One rendering unit: a template name and its data.
#[derive(Debug, Clone)]
pub struct Section {
    pub template: &'static str,
    pub data: Context,
}

impl Section {
    pub fn new(template: &'static str, data: &impl Serialize) -> GenResult<Self> {
        Ok(Self {
            template,
            data: Context::from_serialize(data)?,
        })
    }
}

/// A destination path (relative to the output directory) and its sections.
#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub sections: Vec<Section>,
}

/// Rendered file content, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> GenResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        // Rust source, nothing to escape.
        tera.autoescape_on(vec![]);
        Ok(Self { tera })
    }

    /// Render every section and join them with one blank line.
    pub fn render(&self, file: &File) -> GenResult<GeneratedFile> {
        let mut parts = Vec::with_capacity(file.sections.len());
        for section in &file.sections {
            let text = self.tera.render(section.template, &section.data)?;
            parts.push(format!("{}\n", text.trim_end()));
        }
        Ok(GeneratedFile {
            path: file.path.clone(),
            content: parts.join("\n"),
        })
    }
}

// ==================== template data ====================

#[derive(Serialize)]
struct HeaderData {
    title: String,
    command: String,
    uses: Vec<&'static str>,
}

#[derive(Serialize)]
struct UsageData {
    commands: String,
    examples: String,
}

#[derive(Serialize)]
struct GlobalData {
    name_literal: String,
    takes_value: bool,
    default_literal: Option<String>,
}

#[derive(Serialize)]
struct BuildCall {
    path: String,
    args: Vec<String>,
}

#[derive(Serialize)]
struct SubcommandData {
    name: String,
    name_literal: String,
    variant: String,
    payload_type: Option<String>,
    usage_fn: String,
    usage: String,
    has_flags: bool,
    flag_literals: Vec<String>,
    build: Option<BuildCall>,
    inline: Option<String>,
}

#[derive(Serialize)]
struct CommandData {
    name: String,
    name_literal: String,
    usage_fn: String,
    usage: String,
    subcommands: Vec<SubcommandData>,
}

#[derive(Serialize)]
struct ParseData<'a> {
    usage: String,
    globals: Vec<GlobalData>,
    commands: &'a [CommandData],
}

/// Rust string literal for `text`.
fn literal(text: &str) -> String {
    format!("{text:?}")
}

fn lines_literal(lines: &[String]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    literal(&text)
}

fn indent(code: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    code.lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("{pad}{l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indent every line but the first, for expressions continuing a line.
fn indent_tail(code: &str, levels: usize) -> String {
    let mut lines = code.lines();
    let first = lines.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return first;
    }
    format!("{first}\n{}", indent(&rest.join("\n"), levels))
}

fn command_data(tree: &CommandTree, cmd: &CommandNode, config: &GeneratorConfig) -> CommandData {
    let service_module = payload::service_module(&config.module_path, &cmd.service);
    let client_module = format!("{service_module}::client::cli");
    let subcommands = cmd
        .subcommands
        .iter()
        .map(|sub| subcommand_data(tree, cmd, sub, &service_module, &client_module))
        .collect();

    CommandData {
        name: cmd.name.clone(),
        name_literal: literal(&cmd.name),
        usage_fn: format!("{}_usage", naming::snake(&[&cmd.service])),
        usage: literal(&usage::command_usage(tree, cmd)),
        subcommands,
    }
}

fn subcommand_data(
    tree: &CommandTree,
    cmd: &CommandNode,
    sub: &Subcommand,
    service_module: &str,
    client_module: &str,
) -> SubcommandData {
    let build = match sub.strategy {
        PayloadStrategy::Build => Some(BuildCall {
            path: format!(
                "{client_module}::{}",
                payload::build_function_name(&sub.endpoint.name)
            ),
            args: sub.flags.iter().map(payload::flag_arg).collect(),
        }),
        PayloadStrategy::Inline | PayloadStrategy::Empty => None,
    };
    let inline = match (sub.strategy, sub.flags.first()) {
        (PayloadStrategy::Inline, Some(flag)) => Some(indent(
            &payload::inline_code(&sub.endpoint, flag, service_module),
            5,
        )),
        _ => None,
    };

    SubcommandData {
        name: sub.name.clone(),
        name_literal: literal(&sub.name),
        variant: naming::camel(&sub.full_name),
        payload_type: payload::payload_type(service_module, &sub.endpoint),
        usage_fn: format!("{}_usage", sub.full_name),
        usage: literal(&usage::subcommand_usage(tree, cmd, sub)),
        has_flags: !sub.flags.is_empty(),
        flag_literals: sub.flags.iter().map(|f| literal(&f.name)).collect(),
        build,
        inline,
    }
}

/// The files of a generated CLI: the endpoint parser plus one payload-builder
/// file per service.
pub fn files(api: &str, tree: &CommandTree, config: &GeneratorConfig) -> GenResult<Vec<File>> {
    let commands: Vec<CommandData> = tree
        .services
        .iter()
        .map(|cmd| command_data(tree, cmd, config))
        .collect();

    let title = if api.is_empty() {
        "command line parser".to_string()
    } else {
        format!("{api} command line parser")
    };
    let mut sections = vec![
        Section::new(
            "header.tera",
            &HeaderData {
                title,
                command: "cligen gen".to_string(),
                uses: vec![
                    "cligen::parser::{FlagSet, FlagValues, TokenStream}",
                    "cligen::{CliError, FlagKind}",
                ],
            },
        )?,
        Section::new(
            "usage.tera",
            &UsageData {
                commands: lines_literal(&usage::usage_commands(tree)),
                examples: lines_literal(&usage::usage_examples(tree)),
            },
        )?,
        Section::new(
            "parse.tera",
            &ParseData {
                usage: literal(&usage::tool_usage(tree)),
                globals: tree
                    .global_flags
                    .iter()
                    .map(|f| GlobalData {
                        name_literal: literal(&f.name),
                        takes_value: f.takes_value,
                        default_literal: f.default.as_deref().map(literal),
                    })
                    .collect(),
                commands: &commands,
            },
        )?,
    ];
    for cmd in &commands {
        sections.push(Section::new("command_usage.tera", cmd)?);
    }

    let mut out = vec![File {
        path: PathBuf::from("cli.rs"),
        sections,
    }];
    for cmd in &tree.services {
        out.push(payload_builders(cmd, config)?);
    }
    Ok(out)
}

fn payload_builders(cmd: &CommandNode, config: &GeneratorConfig) -> GenResult<File> {
    let service_module = payload::service_module(&config.module_path, &cmd.service);
    let mut sections = vec![Section::new(
        "header.tera",
        &HeaderData {
            title: format!("{} command line payload builders", cmd.service),
            command: "cligen gen".to_string(),
            uses: vec!["cligen::{CliError, FlagKind}"],
        },
    )?];

    for sub in &cmd.subcommands {
        if let Some(mut build) = payload::build_function(&sub.endpoint, &sub.flags, &service_module) {
            build.body = build.body.iter().map(|stmt| indent(stmt, 1)).collect();
            build.init = indent_tail(&build.init, 1);
            sections.push(Section::new("build_payload.tera", &build)?);
        }
    }

    Ok(File {
        path: PathBuf::from(naming::snake(&[&cmd.service]))
            .join("client")
            .join("cli.rs"),
        sections,
    })
}

/// Render a whole CLI to memory. Pure: the same design and config always
/// produce byte-identical files.
pub fn generate(design: &DesignSpec, config: &GeneratorConfig) -> GenResult<Vec<GeneratedFile>> {
    let tree = CommandTree::build(design, config)?;
    let renderer = Renderer::new()?;
    let rendered = files(&design.api.name, &tree, config)?
        .iter()
        .map(|f| renderer.render(f))
        .collect::<GenResult<Vec<_>>>()?;
    tracing::info!(
        files = rendered.len(),
        services = tree.services.len(),
        "generation complete"
    );
    Ok(rendered)
}

/// Write rendered files under `out_dir`.
///
/// Every file is staged first; targets are only replaced once all of them
/// were staged, and a staging failure leaves the output directory untouched.
pub fn write_files(out_dir: &Path, files: &[GeneratedFile]) -> GenResult<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let mut sink = OutputSink::create(&out_dir.join(&file.path))?;
        sink.write_str(&file.content)?;
        staged.push(sink);
    }

    let mut written = Vec::with_capacity(staged.len());
    for sink in staged {
        let path = sink.commit()?;
        tracing::info!(path = %path.display(), "wrote file");
        written.push(path);
    }
    Ok(written)
}

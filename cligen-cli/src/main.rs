//! cligen: generate service/endpoint command line parsers, or interpret a
//! command line against a design directly.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cligen::{codegen, usage, CliError, CommandTree, DesignSpec, GeneratorConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const EMBEDDED_DESIGN: &str = include_str!("calc.yaml");

/// Generate two-level service/endpoint CLIs from API designs
#[derive(Parser)]
#[command(name = "cligen")]
#[command(about = "Generate two-level service/endpoint CLIs from API designs", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug events to stderr
    #[arg(long, global = true)]
    verbose: bool,
    /// Write JSON log lines to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Generator config file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the CLI sources of a design
    Gen {
        /// Path to the design file
        design: PathBuf,
        /// Output directory
        #[arg(long, default_value = "gen")]
        out: PathBuf,
        /// Program name shown in usage text
        #[arg(long)]
        tool: Option<String>,
        /// Module path of the service payload types in generated code
        #[arg(long)]
        module_path: Option<String>,
    },
    /// Print the top-level usage of a design
    Usage {
        /// Path to the design file (embedded calc design when omitted)
        design: Option<PathBuf>,
        /// Program name shown in usage text
        #[arg(long)]
        tool: Option<String>,
    },
    /// Parse a command line against a design and print the resolved request
    Call {
        /// Path to the design file (embedded calc design when omitted)
        #[arg(long)]
        design: Option<PathBuf>,
        /// Command line of the described tool, without the program name
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() {
    match real_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}

fn real_main() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let mut config = GeneratorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Gen {
            design,
            out,
            tool,
            module_path,
        } => {
            if let Some(tool) = tool {
                config.tool = tool;
            }
            if let Some(module_path) = module_path {
                config.module_path = module_path;
            }
            let design = load_design(Some(&design))?;
            let files = codegen::generate(&design, &config).context("Generation failed")?;
            let written = codegen::write_files(&out, &files)
                .with_context(|| format!("Failed to write output to {}", out.display()))?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(0)
        }
        Commands::Usage { design, tool } => {
            if let Some(tool) = tool {
                config.tool = tool;
            }
            let design = load_design(design.as_deref())?;
            let tree = CommandTree::build(&design, &config).context("Invalid design")?;
            print!("{}", usage::tool_usage(&tree));
            Ok(0)
        }
        Commands::Call { design, args } => {
            let design = load_design(design.as_deref())?;
            let outcome = cligen::interpret(&design, &config, &args).context("Invalid design")?;
            Ok(report(outcome))
        }
    }
}

/// Print a parse outcome; returns the process exit code.
fn report(outcome: Result<cligen::Invocation, CliError>) -> i32 {
    match outcome {
        Ok(invocation) => {
            let out = serde_json::json!({
                "service": invocation.endpoint.service,
                "endpoint": invocation.endpoint.endpoint,
                "method": invocation.endpoint.method,
                "payload": invocation.payload.to_json(),
                "globals": invocation.globals,
            });
            match serde_json::to_string_pretty(&out) {
                Ok(text) => {
                    println!("{text}");
                    0
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    1
                }
            }
        }
        Err(CliError::HelpRequested(help)) => {
            print!("{help}");
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn load_design(path: Option<&Path>) -> Result<DesignSpec> {
    let text = match path {
        Some(p) => fs::read_to_string(p)
            .with_context(|| format!("Failed to read design file: {}", p.display()))?,
        None => EMBEDDED_DESIGN.to_string(),
    };
    cligen::parse_design(&text)
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let (file_layer, stderr_layer) = match log_file {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}

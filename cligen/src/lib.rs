//! Generates two-level `tool <service> <endpoint> [flags]` command line
//! parsers from an API design.
//!
//! The same command tree drives two consumers: [`parser::parse_endpoint`]
//! interprets a token stream in process, and [`codegen::generate`] renders
//! Rust source that does the same work at compile time.

pub mod codegen;
pub mod config;
pub mod design;
pub mod error;
pub mod flags;
pub mod kind;
pub mod naming;
pub mod parser;
pub mod payload;
pub mod rules;
pub mod tree;
pub mod usage;
pub mod validation;

pub use config::{GeneratorConfig, GlobalFlag};
pub use design::{parse_design, DesignSpec};
pub use error::{CliError, CliResult, GenError, GenResult};
pub use kind::FlagKind;
pub use parser::{FlagSet, FlagValues, Invocation, TokenStream};
pub use payload::Payload;
pub use tree::CommandTree;

/// Build the command tree of `design` and parse `args` (program name excluded)
/// against it, using the configured global flags.
///
/// The outer result reports an unusable design, the inner one the outcome of
/// parsing the command line.
pub fn interpret(design: &DesignSpec, config: &GeneratorConfig, args: &[String]) -> GenResult<CliResult<Invocation>> {
    let tree = CommandTree::build(design, config)?;
    let globals = FlagSet::globals(&tree.global_flags).with_usage(usage::tool_usage(&tree));
    Ok(parser::parse_endpoint(&tree, &globals, TokenStream::new(args)))
}

//! Error handling for cligen.
//!
//! Two families live here: [`CliError`] is what a generated (or interpreted)
//! command line parser hands back to its caller, [`GenError`] is what the
//! generator itself fails with.

use thiserror::Error;

use crate::kind::FlagKind;

/// Outcome of a failed command line parse.
///
/// The parser never prints or exits; the caller decides what to do with these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CliError {
    /// Unrecognized service token, or endpoint token within `service`.
    #[error("{}", unknown_command_message(.service.as_deref(), .token))]
    UnknownCommand {
        token: String,
        service: Option<String>,
    },
    /// Fewer tokens than the current step requires, or a required flag left out.
    #[error("not enough arguments: missing {what}")]
    MissingArgument { what: String },
    /// Scalar conversion failure.
    #[error("invalid value for {flag}, must be {expected}")]
    FlagParse { flag: String, expected: FlagKind },
    /// Malformed JSON on a composite flag.
    #[error("invalid JSON for {flag}, example of valid JSON:\n{example}")]
    JsonDecode { flag: String, example: String },
    /// Declared field constraint violated after successful conversion.
    #[error("invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },
    /// Flag not declared at the level it appeared at.
    #[error("flag provided but not defined: -{flag}")]
    UnknownFlag { flag: String },
    /// Token left over once the endpoint flags were consumed.
    #[error("unexpected argument {token:?}")]
    UnexpectedArgument { token: String },
    /// `-h` / `--help` was given; carries the help text for that level.
    #[error("{0}")]
    HelpRequested(String),
}

fn unknown_command_message(service: Option<&str>, token: &str) -> String {
    match service {
        Some(svc) => format!("unknown {svc:?} endpoint {token:?}"),
        None => format!("unknown service {token:?}"),
    }
}

impl CliError {
    pub fn unknown_service(token: impl Into<String>) -> Self {
        CliError::UnknownCommand {
            token: token.into(),
            service: None,
        }
    }

    pub fn unknown_endpoint(service: impl Into<String>, token: impl Into<String>) -> Self {
        CliError::UnknownCommand {
            token: token.into(),
            service: Some(service.into()),
        }
    }

    pub fn missing_argument(what: impl Into<String>) -> Self {
        CliError::MissingArgument { what: what.into() }
    }

    pub fn flag_parse(flag: impl Into<String>, expected: FlagKind) -> Self {
        CliError::FlagParse {
            flag: flag.into(),
            expected,
        }
    }

    pub fn json_decode(flag: impl Into<String>, example: impl Into<String>) -> Self {
        CliError::JsonDecode {
            flag: flag.into(),
            example: example.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CliError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for help requests, which callers usually print to stdout and exit 0 on.
    #[must_use]
    pub fn is_help(&self) -> bool {
        matches!(self, CliError::HelpRequested(_))
    }
}

/// Generation failures. Nothing is written to disk when one of these occurs.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("design declares no services")]
    NoServices,
    #[error("service {service:?} declares no endpoints")]
    EmptyService { service: String },
    #[error("service {service:?} is declared more than once")]
    DuplicateService { service: String },
    #[error("endpoint {endpoint:?} is declared more than once in service {service:?}")]
    DuplicateEndpoint { service: String, endpoint: String },
    #[error("invalid validation pattern for {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
pub type GenResult<T> = Result<T, GenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_service_display() {
        let err = CliError::unknown_service("calcz");
        assert_eq!(err.to_string(), "unknown service \"calcz\"");
    }

    #[test]
    fn test_unknown_endpoint_display() {
        let err = CliError::unknown_endpoint("calc", "mul");
        assert_eq!(err.to_string(), "unknown \"calc\" endpoint \"mul\"");
    }

    #[test]
    fn test_flag_parse_display() {
        let err = CliError::flag_parse("a", FlagKind::Int);
        assert_eq!(err.to_string(), "invalid value for a, must be INT");
    }

    #[test]
    fn test_json_decode_display_embeds_example() {
        let err = CliError::json_decode("p", r#"{"a":1}"#);
        let msg = err.to_string();
        assert!(msg.starts_with("invalid JSON for p"));
        assert!(msg.ends_with(r#"{"a":1}"#));
    }

    #[test]
    fn test_missing_argument_display() {
        let err = CliError::missing_argument("endpoint");
        assert_eq!(err.to_string(), "not enough arguments: missing endpoint");
    }

    #[test]
    fn test_is_help() {
        assert!(CliError::HelpRequested("usage".to_string()).is_help());
        assert!(!CliError::missing_argument("service").is_help());
    }

    #[test]
    fn test_gen_error_empty_service_display() {
        let err = GenError::EmptyService {
            service: "calc".to_string(),
        };
        assert_eq!(err.to_string(), "service \"calc\" declares no endpoints");
    }

    #[test]
    fn test_gen_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: GenError = io_err.into();
        assert!(matches!(err, GenError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_gen_error_invalid_pattern_has_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = GenError::InvalidPattern {
            field: "name".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("name"));
    }
}

//! The compiled generated parser against the in-process interpreter: both
//! must resolve the same endpoint, payload and globals, or fail the same way.

use cligen::{parse_design, CliError, FlagValues, GeneratorConfig};
use cligen_test_consumer::cli::{self, Request};
use cligen_test_consumer::people::{Address, CreatePayload};
use serde_json::{json, Value};

const DESIGN: &str = include_str!("../people.yaml");

type Outcome = Result<(String, String, Value, FlagValues), CliError>;

fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

fn generated(line: &str) -> Outcome {
    let (request, globals) = cli::parse_endpoint(&args(line), &cli::global_flags())?;
    Ok((
        request.service().to_string(),
        request.endpoint().to_string(),
        request.payload_json(),
        globals,
    ))
}

fn interpreted(line: &str) -> Outcome {
    let design = parse_design(DESIGN).unwrap();
    let invocation = cligen::interpret(&design, &GeneratorConfig::default(), &args(line)).unwrap()?;
    Ok((
        invocation.endpoint.service,
        invocation.endpoint.endpoint,
        invocation.payload.to_json(),
        invocation.globals,
    ))
}

fn assert_same(line: &str) -> Outcome {
    let outcome = generated(line);
    assert_eq!(outcome, interpreted(line), "outcomes differ for {line:?}");
    outcome
}

// ==================== strategy tests ====================

#[test]
fn test_build_strategy_agrees() {
    let (service, endpoint, payload, _) = assert_same("people create --name ann").unwrap();
    assert_eq!((service.as_str(), endpoint.as_str()), ("people", "create"));
    assert_eq!(payload, json!({"name": "ann"}));

    let (_, _, payload, _) = assert_same("people create --name ann --score 2 --street main --zip 12345").unwrap();
    assert_eq!(
        payload,
        json!({"name": "ann", "score": 2.0, "address": {"street": "main", "zip": 12345}})
    );
}

#[test]
fn test_inline_strategy_agrees() {
    let (_, endpoint, payload, _) = assert_same("people show --id 7").unwrap();
    assert_eq!(endpoint, "show");
    assert_eq!(payload, json!({"id": 7}));
    assert_eq!(
        assert_same("people show --id -1").unwrap_err(),
        CliError::flag_parse("id", cligen::FlagKind::UInt32)
    );
}

#[test]
fn test_empty_strategy_agrees() {
    let (_, endpoint, payload, globals) = assert_same("--url http://example.com people list").unwrap();
    assert_eq!(endpoint, "list");
    assert_eq!(payload, Value::Null);
    assert_eq!(globals.get("url"), Some("http://example.com"));
    assert_eq!(globals.get("timeout"), Some("30"));

    assert!(matches!(
        assert_same("people list extra").unwrap_err(),
        CliError::UnexpectedArgument { ref token } if token == "extra"
    ));
}

// ==================== nested object tests ====================

#[test]
fn test_optional_group_with_only_required_leaf() {
    let (request, _) = cli::parse_endpoint(&args("people create --name ann --street main"), &cli::global_flags())
        .unwrap();
    let Request::PeopleCreate(payload) = request else {
        panic!("expected create request");
    };
    assert_eq!(
        payload,
        CreatePayload {
            name: "ann".to_string(),
            score: None,
            address: Some(Address {
                street: "main".to_string(),
                zip: None,
            }),
        }
    );
    assert_same("people create --name ann --street main").unwrap();
}

#[test]
fn test_partial_optional_group_is_rejected() {
    let err = assert_same("people create --name ann --zip 12345").unwrap_err();
    assert_eq!(err, CliError::missing_argument("flag --street"));
}

// ==================== validation tests ====================

#[test]
fn test_enum_on_float_accepts_integer_literal() {
    let (_, _, payload, _) = assert_same("people create --name ann --score 1").unwrap();
    assert_eq!(payload["score"], json!(1.0));

    let err = assert_same("people create --name ann --score 1.5").unwrap_err();
    assert!(matches!(err, CliError::Validation { .. }));
}

#[test]
fn test_validation_failures_agree() {
    for line in [
        "people create --name a",
        "people create --name Ann",
        "people create --name ann --street main --zip 12",
        "people create --name ann --score x",
    ] {
        assert!(assert_same(line).is_err(), "{line:?} should fail");
    }
}

// ==================== flag name tests ====================

#[test]
fn test_flag_named_h_is_a_value() {
    let (_, _, payload, _) = assert_same("people resize --w 64 --h 48").unwrap();
    assert_eq!(payload, json!({"w": 64, "h": 48}));
    assert!(assert_same("people resize --help").unwrap_err().is_help());
}

// ==================== error tests ====================

#[test]
fn test_routing_errors_agree() {
    assert!(matches!(
        assert_same("nope list").unwrap_err(),
        CliError::UnknownCommand { ref token, service: None } if token == "nope"
    ));
    assert!(matches!(
        assert_same("people nope").unwrap_err(),
        CliError::UnknownCommand { ref token, service: Some(_) } if token == "nope"
    ));
    assert_eq!(
        assert_same("people create").unwrap_err(),
        CliError::missing_argument("flag --name")
    );
    assert!(matches!(assert_same("").unwrap_err(), CliError::MissingArgument { .. }));
}

#[test]
fn test_help_text_agrees() {
    for line in ["--help", "people --help", "people create -h"] {
        assert!(assert_same(line).unwrap_err().is_help(), "{line:?} should ask for help");
    }
    assert!(cli::people_usage()
        .ends_with("Example:\n    cli people create --name ann --score 1 --street main --zip 12345\n"));
}

#[test]
fn test_usage_examples_parse() {
    let examples = cli::usage_examples();
    assert!(!examples.is_empty());
    for example in examples.lines() {
        let line = example.strip_prefix("cli ").unwrap();
        assert!(assert_same(line).is_ok(), "{example:?} should parse");
    }
}

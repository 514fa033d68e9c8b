//! Conversion rule table: how flag text becomes a typed value.
//!
//! Each [`ValueType`] has exactly one [`ConversionRule`]. A rule is used in
//! two ways: in-process, through [`convert`], by the interpreting parser; and
//! as a source template, through [`conversion_code`], by the emitters.

use serde::Serialize;
use serde_json::Value;

use crate::error::{CliError, CliResult};
use crate::kind::{FlagKind, JsonShape, ValueType};

/// A converted flag value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Int32(i32),
    Int64(i64),
    UInt(u64),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(Value),
}

impl FlagValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            FlagValue::Bool(_) => ValueType::Bool,
            FlagValue::Int(_) => ValueType::Int,
            FlagValue::Int32(_) => ValueType::Int32,
            FlagValue::Int64(_) => ValueType::Int64,
            FlagValue::UInt(_) => ValueType::UInt,
            FlagValue::UInt32(_) => ValueType::UInt32,
            FlagValue::UInt64(_) => ValueType::UInt64,
            FlagValue::Float32(_) => ValueType::Float32,
            FlagValue::Float64(_) => ValueType::Float64,
            FlagValue::String(_) => ValueType::String,
            FlagValue::Bytes(_) => ValueType::Bytes,
            FlagValue::Json(_) => ValueType::Json,
        }
    }

    /// JSON form of the value. Bytes are rendered as (lossy) UTF-8 text.
    pub fn to_json(&self) -> Value {
        match self {
            FlagValue::Bool(v) => Value::Bool(*v),
            FlagValue::Int(v) | FlagValue::Int64(v) => Value::from(*v),
            FlagValue::Int32(v) => Value::from(*v),
            FlagValue::UInt(v) | FlagValue::UInt64(v) => Value::from(*v),
            FlagValue::UInt32(v) => Value::from(*v),
            FlagValue::Float32(v) => Value::from(f64::from(*v)),
            FlagValue::Float64(v) => Value::from(*v),
            FlagValue::String(v) => Value::String(v.clone()),
            FlagValue::Bytes(v) => Value::String(String::from_utf8_lossy(v).into_owned()),
            FlagValue::Json(v) => v.clone(),
        }
    }

    /// Text that converts back to this value under its own rule.
    pub fn to_flag_text(&self) -> String {
        match self {
            FlagValue::Bool(v) => v.to_string(),
            FlagValue::Int(v) | FlagValue::Int64(v) => v.to_string(),
            FlagValue::Int32(v) => v.to_string(),
            FlagValue::UInt(v) | FlagValue::UInt64(v) => v.to_string(),
            FlagValue::UInt32(v) => v.to_string(),
            FlagValue::Float32(v) => v.to_string(),
            FlagValue::Float64(v) => v.to_string(),
            FlagValue::String(v) => v.clone(),
            FlagValue::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
            FlagValue::Json(v) => v.to_string(),
        }
    }
}

/// One row of the rule table.
pub struct ConversionRule {
    pub value_type: ValueType,
    /// Rust type of the converted value in generated code (JSON rules use the field's own type).
    pub rust_type: &'static str,
    /// Expression template over `{from}` (a `&str`) and `{ty}`.
    pub parse: &'static str,
    /// Whether `parse` yields a `Result` that must be checked.
    pub fallible: bool,
    /// Optional values bind through an intermediate typed value before being wrapped.
    pub needs_intermediate: bool,
    /// Error expression template over `{flag}`, `{kind}` and `{example}`.
    pub error: &'static str,
    parser: fn(&str) -> Option<FlagValue>,
}

const SCALAR_ERROR: &str = "CliError::flag_parse({flag}, {kind})";
const JSON_ERROR: &str = "CliError::json_decode({flag}, {example})";

pub static RULES: [ConversionRule; 12] = [
    ConversionRule {
        value_type: ValueType::Bool,
        rust_type: "bool",
        parse: "cligen::rules::parse_bool({from}).ok_or(())",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| parse_bool(s).map(FlagValue::Bool),
    },
    ConversionRule {
        value_type: ValueType::Int,
        rust_type: "i64",
        parse: "{from}.parse::<i64>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::Int),
    },
    ConversionRule {
        value_type: ValueType::Int32,
        rust_type: "i32",
        parse: "{from}.parse::<i32>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::Int32),
    },
    ConversionRule {
        value_type: ValueType::Int64,
        rust_type: "i64",
        parse: "{from}.parse::<i64>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::Int64),
    },
    ConversionRule {
        value_type: ValueType::UInt,
        rust_type: "u64",
        parse: "{from}.parse::<u64>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::UInt),
    },
    ConversionRule {
        value_type: ValueType::UInt32,
        rust_type: "u32",
        parse: "{from}.parse::<u32>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::UInt32),
    },
    ConversionRule {
        value_type: ValueType::UInt64,
        rust_type: "u64",
        parse: "{from}.parse::<u64>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::UInt64),
    },
    ConversionRule {
        value_type: ValueType::Float32,
        rust_type: "f32",
        parse: "{from}.parse::<f32>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::Float32),
    },
    ConversionRule {
        value_type: ValueType::Float64,
        rust_type: "f64",
        parse: "{from}.parse::<f64>()",
        fallible: true,
        needs_intermediate: true,
        error: SCALAR_ERROR,
        parser: |s| s.parse().ok().map(FlagValue::Float64),
    },
    ConversionRule {
        value_type: ValueType::String,
        rust_type: "String",
        parse: "{from}.to_string()",
        fallible: false,
        needs_intermediate: false,
        error: SCALAR_ERROR,
        parser: |s| Some(FlagValue::String(s.to_string())),
    },
    ConversionRule {
        value_type: ValueType::Bytes,
        rust_type: "Vec<u8>",
        parse: "{from}.as_bytes().to_vec()",
        fallible: false,
        needs_intermediate: false,
        error: SCALAR_ERROR,
        parser: |s| Some(FlagValue::Bytes(s.as_bytes().to_vec())),
    },
    ConversionRule {
        value_type: ValueType::Json,
        rust_type: "serde_json::Value",
        parse: "serde_json::from_str::<{ty}>({from})",
        fallible: true,
        needs_intermediate: true,
        error: JSON_ERROR,
        parser: |s| serde_json::from_str(s).ok().map(FlagValue::Json),
    },
];

/// Rule for a value type. Total over [`ValueType`].
pub fn rule_for(value_type: ValueType) -> &'static ConversionRule {
    let index = match value_type {
        ValueType::Bool => 0,
        ValueType::Int => 1,
        ValueType::Int32 => 2,
        ValueType::Int64 => 3,
        ValueType::UInt => 4,
        ValueType::UInt32 => 5,
        ValueType::UInt64 => 6,
        ValueType::Float32 => 7,
        ValueType::Float64 => 8,
        ValueType::String => 9,
        ValueType::Bytes => 10,
        ValueType::Json => 11,
    };
    &RULES[index]
}

/// Boolean text as accepted by generated parsers.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Everything [`convert`] needs to know about the flag being converted.
#[derive(Debug, Clone, Copy)]
pub struct ConversionTarget<'a> {
    pub flag: &'a str,
    pub value_type: ValueType,
    pub json_shape: JsonShape,
    /// Canonical example, embedded in JSON decode errors.
    pub example: &'a str,
}

/// Convert flag text to a typed value.
pub fn convert(target: &ConversionTarget<'_>, text: &str) -> CliResult<FlagValue> {
    let rule = rule_for(target.value_type);
    match (rule.parser)(text) {
        Some(FlagValue::Json(v)) if !target.json_shape.accepts(&v) => {
            Err(CliError::json_decode(target.flag, target.example))
        }
        Some(value) => Ok(value),
        None if target.value_type == ValueType::Json => {
            Err(CliError::json_decode(target.flag, target.example))
        }
        None => Err(CliError::flag_parse(target.flag, target.value_type.flag_kind())),
    }
}

/// Example used when a field or endpoint declares none.
pub fn default_example(value_type: ValueType, json_shape: JsonShape) -> Value {
    match value_type {
        ValueType::Bool => Value::Bool(true),
        ValueType::Int
        | ValueType::Int32
        | ValueType::Int64
        | ValueType::UInt
        | ValueType::UInt32
        | ValueType::UInt64 => Value::from(1),
        ValueType::Float32 | ValueType::Float64 => Value::from(1.5),
        ValueType::String | ValueType::Bytes => Value::String("abc".to_string()),
        ValueType::Json => json_shape.empty_example(),
    }
}

/// Flag text for an example value: raw strings for string kinds, compact JSON otherwise.
pub fn example_text(value_type: ValueType, example: &Value) -> String {
    match (value_type, example) {
        (ValueType::String | ValueType::Bytes, Value::String(s)) => s.clone(),
        (ValueType::Json, v) => v.to_string(),
        (_, Value::String(s)) => s.clone(),
        (_, v) => v.to_string(),
    }
}

/// Inputs of one rendered conversion.
#[derive(Debug, Clone)]
pub struct Conversion<'a> {
    /// `&str` expression when required, `Option<&str>` expression otherwise.
    pub from: &'a str,
    /// Variable bound by the snippet.
    pub to: &'a str,
    /// Rust type of the converted value.
    pub ty: &'a str,
    pub value_type: ValueType,
    pub required: bool,
    pub flag: &'a str,
    pub example: &'a str,
}

/// Render the statements that bind `to` from `from` using the rule for `value_type`.
///
/// Optional values end up as `Option<ty>`, so absence never reads as a zero value.
pub fn conversion_code(c: &Conversion<'_>) -> String {
    let rule = rule_for(c.value_type);
    let error = render_error(rule, c.flag, c.value_type.flag_kind(), c.example);

    if c.required {
        let parse = render_parse(rule, c.from, c.ty);
        return if rule.fallible {
            format!("let {}: {} = {}.map_err(|_| {})?;", c.to, c.ty, parse, error)
        } else {
            format!("let {}: {} = {};", c.to, c.ty, parse)
        };
    }

    if !rule.needs_intermediate {
        let parse = render_parse(rule, "raw", c.ty);
        return format!(
            "let {}: Option<{}> = {}.map(|raw| {});",
            c.to, c.ty, c.from, parse
        );
    }

    let parse = render_parse(rule, "raw", c.ty);
    let bind = if rule.fallible {
        format!("let val: {} = {}.map_err(|_| {})?;", c.ty, parse, error)
    } else {
        format!("let val: {} = {};", c.ty, parse)
    };
    format!(
        "let mut {to}: Option<{ty}> = None;\nif let Some(raw) = {from} {{\n    {bind}\n    {to} = Some(val);\n}}",
        to = c.to,
        ty = c.ty,
        from = c.from,
        bind = bind,
    )
}

fn render_parse(rule: &ConversionRule, from: &str, ty: &str) -> String {
    rule.parse.replace("{from}", from).replace("{ty}", ty)
}

fn render_error(rule: &ConversionRule, flag: &str, kind: FlagKind, example: &str) -> String {
    rule.error
        .replace("{flag}", &format!("{flag:?}"))
        .replace("{kind}", kind.rust_path())
        .replace("{example}", &format!("{example:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(value_type: ValueType) -> ConversionTarget<'static> {
        ConversionTarget {
            flag: "a",
            value_type,
            json_shape: JsonShape::Any,
            example: "{}",
        }
    }

    #[test]
    fn test_rule_table_is_indexed_by_value_type() {
        for rule in &RULES {
            assert_eq!(rule_for(rule.value_type).value_type, rule.value_type);
        }
    }

    #[test]
    fn test_string_and_bytes_skip_intermediate() {
        assert!(!rule_for(ValueType::String).needs_intermediate);
        assert!(!rule_for(ValueType::Bytes).needs_intermediate);
        assert!(rule_for(ValueType::Int32).needs_intermediate);
        assert!(rule_for(ValueType::Json).needs_intermediate);
    }

    #[test]
    fn test_convert_int() {
        assert_eq!(convert(&target(ValueType::Int), "42").unwrap(), FlagValue::Int(42));
    }

    #[test]
    fn test_convert_int_failure_names_flag_and_kind() {
        let err = convert(&target(ValueType::Int), "xyz").unwrap_err();
        assert_eq!(err, CliError::flag_parse("a", FlagKind::Int));
    }

    #[test]
    fn test_convert_int32_out_of_range() {
        let err = convert(&target(ValueType::Int32), "4294967296").unwrap_err();
        assert_eq!(err, CliError::flag_parse("a", FlagKind::Int32));
    }

    #[test]
    fn test_convert_uint_rejects_negative() {
        assert!(convert(&target(ValueType::UInt32), "-1").is_err());
    }

    #[test]
    fn test_convert_bool_variants() {
        for t in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(convert(&target(ValueType::Bool), t).unwrap(), FlagValue::Bool(true));
        }
        for f in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(convert(&target(ValueType::Bool), f).unwrap(), FlagValue::Bool(false));
        }
        assert!(convert(&target(ValueType::Bool), "yes").is_err());
    }

    #[test]
    fn test_convert_string_passthrough() {
        assert_eq!(
            convert(&target(ValueType::String), " spaced ").unwrap(),
            FlagValue::String(" spaced ".to_string())
        );
    }

    #[test]
    fn test_convert_bytes_identity() {
        assert_eq!(
            convert(&target(ValueType::Bytes), "abc").unwrap(),
            FlagValue::Bytes(b"abc".to_vec())
        );
    }

    #[test]
    fn test_convert_json_error_embeds_example() {
        let t = ConversionTarget {
            flag: "p",
            value_type: ValueType::Json,
            json_shape: JsonShape::Object,
            example: r#"{"a":1}"#,
        };
        let err = convert(&t, "{not json").unwrap_err();
        assert_eq!(err, CliError::json_decode("p", r#"{"a":1}"#));
    }

    #[test]
    fn test_convert_json_wrong_shape() {
        let t = ConversionTarget {
            flag: "ids",
            value_type: ValueType::Json,
            json_shape: JsonShape::Array,
            example: "[1]",
        };
        assert!(convert(&t, r#"{"a":1}"#).is_err());
        assert_eq!(
            convert(&t, "[1,2]").unwrap(),
            FlagValue::Json(serde_json::json!([1, 2]))
        );
    }

    #[test]
    fn test_default_examples_convert() {
        for rule in &RULES {
            let ex = default_example(rule.value_type, JsonShape::Object);
            let text = example_text(rule.value_type, &ex);
            let t = ConversionTarget {
                flag: "x",
                value_type: rule.value_type,
                json_shape: JsonShape::Object,
                example: &text,
            };
            assert!(convert(&t, &text).is_ok(), "{:?}", rule.value_type);
        }
    }

    #[test]
    fn test_example_text() {
        assert_eq!(example_text(ValueType::String, &serde_json::json!("abc")), "abc");
        assert_eq!(example_text(ValueType::Int, &serde_json::json!(7)), "7");
        assert_eq!(
            example_text(ValueType::Json, &serde_json::json!({"a": [1, 2]})),
            r#"{"a":[1,2]}"#
        );
        assert_eq!(example_text(ValueType::Json, &serde_json::json!("x")), r#""x""#);
    }

    #[test]
    fn test_conversion_code_required_int() {
        let code = conversion_code(&Conversion {
            from: "a_raw",
            to: "a",
            ty: "i64",
            value_type: ValueType::Int,
            required: true,
            flag: "a",
            example: "1",
        });
        assert_eq!(
            code,
            r#"let a: i64 = a_raw.parse::<i64>().map_err(|_| CliError::flag_parse("a", FlagKind::Int))?;"#
        );
    }

    #[test]
    fn test_conversion_code_optional_string() {
        let code = conversion_code(&Conversion {
            from: "name_raw",
            to: "name",
            ty: "String",
            value_type: ValueType::String,
            required: false,
            flag: "name",
            example: "abc",
        });
        assert_eq!(
            code,
            "let name: Option<String> = name_raw.map(|raw| raw.to_string());"
        );
    }

    #[test]
    fn test_conversion_code_optional_json_uses_intermediate() {
        let code = conversion_code(&Conversion {
            from: "tags_raw",
            to: "tags",
            ty: "Vec<String>",
            value_type: ValueType::Json,
            required: false,
            flag: "tags",
            example: r#"["a"]"#,
        });
        assert!(code.starts_with("let mut tags: Option<Vec<String>> = None;"));
        assert!(code.contains("serde_json::from_str::<Vec<String>>(raw)"));
        assert!(code.contains(r#"CliError::json_decode("tags", "[\"a\"]")"#));
        assert!(code.contains("tags = Some(val);"));
    }

    #[test]
    fn test_flag_value_to_json() {
        assert_eq!(FlagValue::UInt32(3).to_json(), serde_json::json!(3));
        assert_eq!(FlagValue::Bytes(b"hi".to_vec()).to_json(), serde_json::json!("hi"));
        assert_eq!(FlagValue::Bool(false).to_json(), serde_json::json!(false));
    }
}

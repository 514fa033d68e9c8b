//! Field constraints, checked after conversion and rendered into generated code.

use regex::Regex;
use serde_json::Value;

use crate::design::{DomainType, Validation};
use crate::error::{CliError, CliResult, GenError, GenResult};
use crate::kind::ValueType;
use crate::rules::FlagValue;

/// A validation annotation whose pattern has been compiled.
#[derive(Debug, Clone)]
pub struct CompiledValidation {
    pub rule: Validation,
    pattern: Option<Regex>,
}

impl CompiledValidation {
    /// Compile a field's validation; an invalid pattern is a generation error.
    pub fn compile(field: &str, rule: &Validation) -> GenResult<Self> {
        let pattern = rule
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|source| GenError::InvalidPattern {
                field: field.to_string(),
                source,
            })?;
        Ok(Self {
            rule: rule.clone(),
            pattern,
        })
    }

    /// Check a converted value. `field` names the offending field in the error.
    pub fn check(&self, field: &str, value: &FlagValue) -> CliResult<()> {
        let rule = &self.rule;

        if let Some(allowed) = &rule.enum_values {
            let json = value.to_json();
            if !allowed.iter().any(|v| json_equal(v, &json)) {
                let list: Vec<String> = allowed.iter().map(Value::to_string).collect();
                return Err(CliError::validation(
                    field,
                    format!("value must be one of {}", list.join(", ")),
                ));
            }
        }

        if let (Some(re), FlagValue::String(s)) = (&self.pattern, value) {
            if !re.is_match(s) {
                return Err(CliError::validation(
                    field,
                    format!("value must match the regexp {:?}", re.as_str()),
                ));
            }
        }

        if let Some(len) = length_of(value) {
            if let Some(min) = rule.min_length {
                if len < min {
                    return Err(CliError::validation(
                        field,
                        format!("length must be greater or equal than {min}"),
                    ));
                }
            }
            if let Some(max) = rule.max_length {
                if len > max {
                    return Err(CliError::validation(
                        field,
                        format!("length must be less or equal than {max}"),
                    ));
                }
            }
        }

        if let Some(n) = number_of(value) {
            if let Some(min) = rule.minimum {
                if n < min {
                    return Err(CliError::validation(
                        field,
                        format!("value must be greater or equal than {min}"),
                    ));
                }
            }
            if let Some(max) = rule.maximum {
                if n > max {
                    return Err(CliError::validation(
                        field,
                        format!("value must be less or equal than {max}"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Rust statements checking `var`, a reference to the converted value.
    pub fn check_code(&self, field: &str, var: &str, value_type: ValueType, ty: &DomainType) -> String {
        let rule = &self.rule;
        let mut checks: Vec<String> = Vec::new();
        let fail = |reason: String| {
            format!("    return Err(CliError::validation({field:?}, {reason:?}));\n}}")
        };

        if let Some(allowed) = &rule.enum_values {
            let list: Vec<String> = allowed.iter().map(Value::to_string).collect();
            checks.push(format!(
                "if !{list:?}.iter().any(|a| {{\n    let allowed = serde_json::from_str::<serde_json::Value>(a).ok();\n    let given = serde_json::to_value({var}).ok();\n    allowed.zip(given).is_some_and(|(a, b)| cligen::validation::json_equal(&a, &b))\n}}) {{\n{}",
                fail(format!("value must be one of {}", list.join(", "))),
            ));
        }
        if let (Some(pattern), ValueType::String) = (&rule.pattern, value_type) {
            checks.push(format!(
                "if !regex::Regex::new({pattern:?}).is_ok_and(|re| re.is_match({var})) {{\n{}",
                fail(format!("value must match the regexp {pattern:?}")),
            ));
        }
        if let Some(len) = length_code(var, value_type, ty) {
            if let Some(min) = rule.min_length {
                checks.push(format!(
                    "if {len} < {min} {{\n{}",
                    fail(format!("length must be greater or equal than {min}")),
                ));
            }
            if let Some(max) = rule.max_length {
                checks.push(format!(
                    "if {len} > {max} {{\n{}",
                    fail(format!("length must be less or equal than {max}")),
                ));
            }
        }
        if is_numeric(value_type) {
            if let Some(min) = rule.minimum {
                checks.push(format!(
                    "if (*{var} as f64) < {min:?} {{\n{}",
                    fail(format!("value must be greater or equal than {min}")),
                ));
            }
            if let Some(max) = rule.maximum {
                checks.push(format!(
                    "if (*{var} as f64) > {max:?} {{\n{}",
                    fail(format!("value must be less or equal than {max}")),
                ));
            }
        }
        checks.join("\n")
    }
}

fn length_code(var: &str, value_type: ValueType, ty: &DomainType) -> Option<String> {
    match (value_type, ty) {
        (ValueType::String, _) => Some(format!("{var}.chars().count()")),
        (ValueType::Bytes, _) | (ValueType::Json, DomainType::Array(_) | DomainType::Map(..)) => {
            Some(format!("{var}.len()"))
        }
        _ => None,
    }
}

fn is_numeric(value_type: ValueType) -> bool {
    matches!(
        value_type,
        ValueType::Int
            | ValueType::Int32
            | ValueType::Int64
            | ValueType::UInt
            | ValueType::UInt32
            | ValueType::UInt64
            | ValueType::Float32
            | ValueType::Float64
    )
}

/// JSON equality where numbers compare by value, so `1` equals `1.0`.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
        _ => a == b,
    }
}

fn length_of(value: &FlagValue) -> Option<usize> {
    match value {
        FlagValue::String(s) => Some(s.chars().count()),
        FlagValue::Bytes(b) => Some(b.len()),
        FlagValue::Json(Value::Array(a)) => Some(a.len()),
        FlagValue::Json(Value::Object(o)) => Some(o.len()),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn number_of(value: &FlagValue) -> Option<f64> {
    match value {
        FlagValue::Int(v) | FlagValue::Int64(v) => Some(*v as f64),
        FlagValue::Int32(v) => Some(f64::from(*v)),
        FlagValue::UInt(v) | FlagValue::UInt64(v) => Some(*v as f64),
        FlagValue::UInt32(v) => Some(f64::from(*v)),
        FlagValue::Float32(v) => Some(f64::from(*v)),
        FlagValue::Float64(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compiled(rule: Validation) -> CompiledValidation {
        CompiledValidation::compile("f", &rule).unwrap()
    }

    #[test]
    fn test_invalid_pattern_is_generation_error() {
        let rule = Validation {
            pattern: Some("[".to_string()),
            ..Default::default()
        };
        let err = CompiledValidation::compile("name", &rule).unwrap_err();
        assert!(matches!(err, GenError::InvalidPattern { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_pattern() {
        let v = compiled(Validation {
            pattern: Some("^[a-z]+$".to_string()),
            ..Default::default()
        });
        assert!(v.check("f", &FlagValue::String("abc".into())).is_ok());
        let err = v.check("f", &FlagValue::String("ABC".into())).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "f"));
    }

    #[test]
    fn test_length_counts_chars() {
        let v = compiled(Validation {
            min_length: Some(2),
            max_length: Some(3),
            ..Default::default()
        });
        assert!(v.check("f", &FlagValue::String("\u{e9}\u{e9}".into())).is_ok());
        assert!(v.check("f", &FlagValue::String("a".into())).is_err());
        assert!(v.check("f", &FlagValue::String("abcd".into())).is_err());
        assert!(v.check("f", &FlagValue::Json(json!([1, 2]))).is_ok());
    }

    #[test]
    fn test_range() {
        let v = compiled(Validation {
            minimum: Some(1.0),
            maximum: Some(10.0),
            ..Default::default()
        });
        assert!(v.check("f", &FlagValue::Int(1)).is_ok());
        assert!(v.check("f", &FlagValue::Int(10)).is_ok());
        assert!(v.check("f", &FlagValue::Int(0)).is_err());
        assert!(v.check("f", &FlagValue::Float64(10.5)).is_err());
    }

    #[test]
    fn test_enum() {
        let v = compiled(Validation {
            enum_values: Some(vec![json!("red"), json!("green")]),
            ..Default::default()
        });
        assert!(v.check("f", &FlagValue::String("red".into())).is_ok());
        let err = v.check("f", &FlagValue::String("blue".into())).unwrap_err();
        assert!(err.to_string().contains(r#""red", "green""#));
    }

    #[test]
    fn test_enum_numeric() {
        let v = compiled(Validation {
            enum_values: Some(vec![json!(1), json!(2)]),
            ..Default::default()
        });
        assert!(v.check("f", &FlagValue::Int32(2)).is_ok());
        assert!(v.check("f", &FlagValue::Int32(3)).is_err());
    }

    #[test]
    fn test_check_code_range() {
        let v = compiled(Validation {
            minimum: Some(1.0),
            ..Default::default()
        });
        let code = v.check_code("a", "v", ValueType::Int, &DomainType::Int);
        assert!(code.contains("if (*v as f64) < 1.0 {"));
        assert!(code.contains(r#"CliError::validation("a", "value must be greater or equal than 1")"#));
    }

    #[test]
    fn test_check_code_length_by_type() {
        let v = compiled(Validation {
            min_length: Some(1),
            ..Default::default()
        });
        assert!(v.check_code("a", "v", ValueType::Int, &DomainType::Int).is_empty());
        assert!(v
            .check_code("a", "v", ValueType::String, &DomainType::String)
            .contains("v.chars().count() < 1"));
        let list = DomainType::Array(Box::new(DomainType::Int));
        assert!(v.check_code("a", "v", ValueType::Json, &list).contains("v.len() < 1"));
        let user = DomainType::User("Bottle".into());
        assert!(v.check_code("a", "v", ValueType::Json, &user).is_empty());
    }

    #[test]
    fn test_check_code_enum() {
        let v = compiled(Validation {
            enum_values: Some(vec![json!("red")]),
            ..Default::default()
        });
        let code = v.check_code("color", "v", ValueType::String, &DomainType::String);
        assert!(code.starts_with(r#"if !["\"red\""].iter().any(|a|"#));
        assert!(code.contains("serde_json::to_value(v)"));
        assert!(code.contains("cligen::validation::json_equal(&a, &b)"));
    }

    #[test]
    fn test_enum_on_float_accepts_integer_literals() {
        let v = compiled(Validation {
            enum_values: Some(vec![json!(1), json!(2)]),
            ..Default::default()
        });
        assert!(v.check("score", &FlagValue::Float64(1.0)).is_ok());
        assert!(v.check("score", &FlagValue::Float32(2.0)).is_ok());
        assert!(v.check("score", &FlagValue::Float64(1.5)).is_err());
    }

    #[test]
    fn test_json_equal() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(!json_equal(&json!(1), &json!(2.0)));
        assert!(json_equal(&json!("a"), &json!("a")));
        assert!(!json_equal(&json!("1"), &json!(1)));
    }
}

//! Property-based tests for flag conversion and example synthesis.

use cligen::design::parse_design;
use cligen::kind::{JsonShape, ValueType};
use cligen::naming;
use cligen::rules::{self, ConversionTarget, FlagValue};
use cligen::{CommandTree, GeneratorConfig};
use proptest::prelude::*;

fn target(value_type: ValueType) -> ConversionTarget<'static> {
    ConversionTarget {
        flag: "x",
        value_type,
        json_shape: JsonShape::Any,
        example: "{}",
    }
}

fn round_trip(value: &FlagValue) -> FlagValue {
    rules::convert(&target(value.value_type()), &value.to_flag_text()).unwrap()
}

/// Any scalar the rule table converts.
fn scalar() -> impl Strategy<Value = FlagValue> {
    prop_oneof![
        any::<bool>().prop_map(FlagValue::Bool),
        any::<i64>().prop_map(FlagValue::Int),
        any::<i32>().prop_map(FlagValue::Int32),
        any::<i64>().prop_map(FlagValue::Int64),
        any::<u64>().prop_map(FlagValue::UInt),
        any::<u32>().prop_map(FlagValue::UInt32),
        any::<u64>().prop_map(FlagValue::UInt64),
        (-1.0e30f32..1.0e30f32).prop_map(FlagValue::Float32),
        (-1.0e300f64..1.0e300f64).prop_map(FlagValue::Float64),
    ]
}

/// Domain type names for a single field.
fn field_type() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "boolean",
        "int",
        "int32",
        "uint64",
        "float32",
        "string",
        "bytes",
        "any",
        "array<int>",
        "map<string,int>",
        "Bottle",
    ])
}

proptest! {
    #[test]
    fn prop_scalar_text_round_trips(value in scalar()) {
        prop_assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn prop_string_round_trips(text in "[ -~]{0,40}") {
        let value = FlagValue::String(text);
        prop_assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn prop_out_of_range_is_rejected(v in (i64::from(i32::MAX) + 1)..i64::MAX) {
        prop_assert!(rules::convert(&target(ValueType::Int32), &v.to_string()).is_err());
        prop_assert!(rules::convert(&target(ValueType::UInt32), &v.to_string()).is_err());
    }

    #[test]
    fn prop_generated_examples_convert(types in prop::collection::vec(field_type(), 1..6)) {
        let fields: String = types
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("            - {{ name: f{i}, type: '{ty}' }}\n"))
            .collect();
        let yaml = format!(
            "services:\n  - name: svc\n    endpoints:\n      - name: ep\n        payload:\n          fields:\n{fields}"
        );
        let tree = CommandTree::build(&parse_design(&yaml).unwrap(), &GeneratorConfig::default()).unwrap();
        for flag in &tree.services[0].subcommands[0].flags {
            let value = rules::convert(&flag.target(), &flag.example);
            prop_assert!(value.is_ok(), "example {:?} of {} does not convert", flag.example, flag.name);
            prop_assert_eq!(naming::shell_unquote(&flag.example_arg()), flag.example.clone());
            if let Ok(FlagValue::Json(json)) = value {
                prop_assert!(flag.json_shape.accepts(&json));
            }
        }
    }
}

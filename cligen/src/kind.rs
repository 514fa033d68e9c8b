//! Type mapping: domain types to conversion-level value types and flag kinds.

use std::fmt;

use serde::Serialize;

use crate::design::{DomainType, PayloadShape};

/// Canonical flag kind shown in usage text and carried in parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlagKind {
    Bool,
    Int,
    Int32,
    Int64,
    UInt,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Json,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKind::Bool => "BOOL",
            FlagKind::Int => "INT",
            FlagKind::Int32 => "INT32",
            FlagKind::Int64 => "INT64",
            FlagKind::UInt => "UINT",
            FlagKind::UInt32 => "UINT32",
            FlagKind::UInt64 => "UINT64",
            FlagKind::Float32 => "FLOAT32",
            FlagKind::Float64 => "FLOAT64",
            FlagKind::String => "STRING",
            FlagKind::Json => "JSON",
        }
    }

    /// Variant path used when generated code names a kind.
    pub fn rust_path(self) -> &'static str {
        match self {
            FlagKind::Bool => "FlagKind::Bool",
            FlagKind::Int => "FlagKind::Int",
            FlagKind::Int32 => "FlagKind::Int32",
            FlagKind::Int64 => "FlagKind::Int64",
            FlagKind::UInt => "FlagKind::UInt",
            FlagKind::UInt32 => "FlagKind::UInt32",
            FlagKind::UInt64 => "FlagKind::UInt64",
            FlagKind::Float32 => "FlagKind::Float32",
            FlagKind::Float64 => "FlagKind::Float64",
            FlagKind::String => "FlagKind::String",
            FlagKind::Json => "FlagKind::Json",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a flag's text is converted into. One conversion rule exists per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Bool,
    Int,
    Int32,
    Int64,
    UInt,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Bytes,
    Json,
}

impl ValueType {
    pub fn flag_kind(self) -> FlagKind {
        match self {
            ValueType::Bool => FlagKind::Bool,
            ValueType::Int => FlagKind::Int,
            ValueType::Int32 => FlagKind::Int32,
            ValueType::Int64 => FlagKind::Int64,
            ValueType::UInt => FlagKind::UInt,
            ValueType::UInt32 => FlagKind::UInt32,
            ValueType::UInt64 => FlagKind::UInt64,
            ValueType::Float32 => FlagKind::Float32,
            ValueType::Float64 => FlagKind::Float64,
            ValueType::String | ValueType::Bytes => FlagKind::String,
            ValueType::Json => FlagKind::Json,
        }
    }
}

/// Structure a JSON-kind value must decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JsonShape {
    Any,
    Array,
    Object,
}

impl JsonShape {
    pub fn accepts(self, value: &serde_json::Value) -> bool {
        match self {
            JsonShape::Any => true,
            JsonShape::Array => value.is_array(),
            JsonShape::Object => value.is_object(),
        }
    }

    /// Placeholder example for a composite value that declares none.
    pub fn empty_example(self) -> serde_json::Value {
        match self {
            JsonShape::Array => serde_json::Value::Array(Vec::new()),
            JsonShape::Any | JsonShape::Object => serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Map a domain type to its value type. Total: anything composite or unknown is JSON.
pub fn value_type(ty: &DomainType) -> ValueType {
    match ty {
        DomainType::Boolean => ValueType::Bool,
        DomainType::Int => ValueType::Int,
        DomainType::Int32 => ValueType::Int32,
        DomainType::Int64 => ValueType::Int64,
        DomainType::UInt => ValueType::UInt,
        DomainType::UInt32 => ValueType::UInt32,
        DomainType::UInt64 => ValueType::UInt64,
        DomainType::Float32 => ValueType::Float32,
        DomainType::Float64 => ValueType::Float64,
        DomainType::String => ValueType::String,
        DomainType::Bytes => ValueType::Bytes,
        DomainType::Any | DomainType::Array(_) | DomainType::Map(..) | DomainType::User(_) => {
            ValueType::Json
        }
    }
}

/// Flag kind of a domain type.
pub fn flag_kind(ty: &DomainType) -> FlagKind {
    value_type(ty).flag_kind()
}

pub fn json_shape(ty: &DomainType) -> JsonShape {
    match ty {
        DomainType::Array(_) => JsonShape::Array,
        DomainType::Map(..) | DomainType::User(_) => JsonShape::Object,
        _ => JsonShape::Any,
    }
}

/// Value type of a whole shape. Objects and references are always JSON.
pub fn shape_value_type(shape: &PayloadShape) -> ValueType {
    match shape {
        PayloadShape::Primitive { ty } => value_type(ty),
        PayloadShape::Reference { name } => value_type(&DomainType::parse(name)),
        PayloadShape::Object { .. } => ValueType::Json,
    }
}

pub fn shape_json_shape(shape: &PayloadShape) -> JsonShape {
    match shape {
        PayloadShape::Primitive { ty } => json_shape(ty),
        PayloadShape::Reference { name } => json_shape(&DomainType::parse(name)),
        PayloadShape::Object { .. } => JsonShape::Object,
    }
}

/// Rust type used for a value in generated code. User types live in `module`.
pub fn rust_type(ty: &DomainType, module: &str) -> String {
    match ty {
        DomainType::Boolean => "bool".to_string(),
        DomainType::Int | DomainType::Int64 => "i64".to_string(),
        DomainType::Int32 => "i32".to_string(),
        DomainType::UInt | DomainType::UInt64 => "u64".to_string(),
        DomainType::UInt32 => "u32".to_string(),
        DomainType::Float32 => "f32".to_string(),
        DomainType::Float64 => "f64".to_string(),
        DomainType::String => "String".to_string(),
        DomainType::Bytes => "Vec<u8>".to_string(),
        DomainType::Any => "serde_json::Value".to_string(),
        DomainType::Array(elem) => format!("Vec<{}>", rust_type(elem, module)),
        DomainType::Map(key, elem) => format!(
            "std::collections::HashMap<{}, {}>",
            rust_type(key, module),
            rust_type(elem, module)
        ),
        DomainType::User(name) => format!("{module}::{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_map_to_matching_kind() {
        assert_eq!(flag_kind(&DomainType::Boolean), FlagKind::Bool);
        assert_eq!(flag_kind(&DomainType::Int), FlagKind::Int);
        assert_eq!(flag_kind(&DomainType::UInt32), FlagKind::UInt32);
        assert_eq!(flag_kind(&DomainType::Float64), FlagKind::Float64);
        assert_eq!(flag_kind(&DomainType::String), FlagKind::String);
    }

    #[test]
    fn test_bytes_surface_as_string() {
        assert_eq!(value_type(&DomainType::Bytes), ValueType::Bytes);
        assert_eq!(flag_kind(&DomainType::Bytes), FlagKind::String);
    }

    #[test]
    fn test_composites_and_unknown_map_to_json() {
        let array = DomainType::Array(Box::new(DomainType::Int));
        let map = DomainType::Map(Box::new(DomainType::String), Box::new(DomainType::Int));
        assert_eq!(flag_kind(&array), FlagKind::Json);
        assert_eq!(flag_kind(&map), FlagKind::Json);
        assert_eq!(flag_kind(&DomainType::Any), FlagKind::Json);
        assert_eq!(flag_kind(&DomainType::User("Bottle".into())), FlagKind::Json);
    }

    #[test]
    fn test_object_and_reference_shapes_are_json() {
        let obj = PayloadShape::Object { fields: vec![] };
        let reference = PayloadShape::Reference {
            name: "Bottle".to_string(),
        };
        assert_eq!(shape_value_type(&obj), ValueType::Json);
        assert_eq!(shape_value_type(&reference), ValueType::Json);
        assert_eq!(shape_json_shape(&reference), JsonShape::Object);
    }

    #[test]
    fn test_reference_to_scalar_name_keeps_scalar_kind() {
        let reference = PayloadShape::Reference {
            name: "int".to_string(),
        };
        assert_eq!(shape_value_type(&reference), ValueType::Int);
    }

    #[test]
    fn test_json_shape_accepts() {
        assert!(JsonShape::Array.accepts(&serde_json::json!([1, 2])));
        assert!(!JsonShape::Array.accepts(&serde_json::json!({"a": 1})));
        assert!(JsonShape::Object.accepts(&serde_json::json!({})));
        assert!(JsonShape::Any.accepts(&serde_json::json!("x")));
    }

    #[test]
    fn test_rust_type() {
        let ty = DomainType::Map(
            Box::new(DomainType::String),
            Box::new(DomainType::Array(Box::new(DomainType::User("Bottle".into())))),
        );
        assert_eq!(
            rust_type(&ty, "storage"),
            "std::collections::HashMap<String, Vec<storage::Bottle>>"
        );
    }

    #[test]
    fn test_flag_kind_display() {
        assert_eq!(FlagKind::UInt64.to_string(), "UINT64");
        assert_eq!(FlagKind::Json.to_string(), "JSON");
    }
}

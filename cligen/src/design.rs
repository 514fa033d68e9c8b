//! API design metadata: the services, endpoints and payload shapes a CLI is generated from.
//!
//! Designs are loaded from YAML. Everything here is immutable once
//! [`parse_design`] returns.

use std::fmt;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSpec {
    #[serde(default)]
    pub api: ApiInfo,
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// No payload means the endpoint takes no flags at all.
    #[serde(default)]
    pub payload: Option<PayloadShape>,
    /// Example of the whole payload; used for `Reference` and `Primitive` payloads.
    #[serde(default)]
    pub example: Option<Value>,
}

/// Shape of a payload or of one of its fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadShape {
    Primitive {
        #[serde(rename = "type")]
        ty: DomainType,
    },
    Object {
        fields: Vec<FieldDescriptor>,
    },
    Reference {
        #[serde(rename = "ref")]
        name: String,
    },
}

impl<'de> Deserialize<'de> for PayloadShape {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Inspect the keys to pick the variant, so that a field can carry its
        // shape inline next to name/required/example.
        let value = serde_yaml::Value::deserialize(deserializer)?;
        let serde_yaml::Value::Mapping(map) = &value else {
            return Err(serde::de::Error::custom(
                "payload shape must be a mapping with one of `type`, `fields` or `ref`",
            ));
        };

        if let Some(fields) = map.get("fields") {
            let fields: Vec<FieldDescriptor> =
                serde_yaml::from_value(fields.clone()).map_err(serde::de::Error::custom)?;
            return Ok(PayloadShape::Object { fields });
        }
        if let Some(name) = map.get("ref") {
            let name: String =
                serde_yaml::from_value(name.clone()).map_err(serde::de::Error::custom)?;
            return Ok(PayloadShape::Reference { name });
        }
        if let Some(ty) = map.get("type") {
            let ty: String =
                serde_yaml::from_value(ty.clone()).map_err(serde::de::Error::custom)?;
            return Ok(PayloadShape::Primitive {
                ty: DomainType::parse(&ty),
            });
        }
        Err(serde::de::Error::custom(
            "payload shape needs one of `type`, `fields` or `ref`",
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub shape: PayloadShape,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub example: Option<Value>,
    #[serde(default)]
    pub validation: Option<Validation>,
    /// Names from the payload root down to this field. Filled in by [`parse_design`].
    #[serde(skip)]
    pub path: Vec<String>,
}

/// Declared constraints on a field value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

/// Type of a field as written in the design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainType {
    Boolean,
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
    Any,
    Array(Box<DomainType>),
    Map(Box<DomainType>, Box<DomainType>),
    /// User-defined or otherwise unresolved type name.
    User(String),
}

impl DomainType {
    /// Parse a type string. Never fails: unknown names become [`DomainType::User`].
    pub fn parse(text: &str) -> DomainType {
        static ARRAY_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^(?:array<(?P<a>.+)>|\[\](?P<b>.+))$").expect("valid regex")
        });
        static MAP_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^(?:map<(?P<k1>[^,]+),(?P<v1>.+)>|map\[(?P<k2>[^\]]+)\](?P<v2>.+))$")
                .expect("valid regex")
        });

        let text = text.trim();
        match text {
            "boolean" | "bool" => return DomainType::Boolean,
            "int" => return DomainType::Int,
            "int32" => return DomainType::Int32,
            "int64" => return DomainType::Int64,
            "uint" => return DomainType::UInt,
            "uint32" => return DomainType::UInt32,
            "uint64" => return DomainType::UInt64,
            "float32" => return DomainType::Float32,
            "float64" | "number" => return DomainType::Float64,
            "string" => return DomainType::String,
            "bytes" => return DomainType::Bytes,
            "any" => return DomainType::Any,
            _ => {}
        }
        if let Some(caps) = ARRAY_RE.captures(text) {
            let elem = caps.name("a").or_else(|| caps.name("b")).map_or("", |m| m.as_str());
            return DomainType::Array(Box::new(DomainType::parse(elem)));
        }
        if let Some(caps) = MAP_RE.captures(text) {
            let key = caps.name("k1").or_else(|| caps.name("k2")).map_or("", |m| m.as_str());
            let elem = caps.name("v1").or_else(|| caps.name("v2")).map_or("", |m| m.as_str());
            return DomainType::Map(
                Box::new(DomainType::parse(key)),
                Box::new(DomainType::parse(elem)),
            );
        }
        DomainType::User(text.to_string())
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainType::Boolean => write!(f, "boolean"),
            DomainType::Int => write!(f, "int"),
            DomainType::Int32 => write!(f, "int32"),
            DomainType::Int64 => write!(f, "int64"),
            DomainType::UInt => write!(f, "uint"),
            DomainType::UInt32 => write!(f, "uint32"),
            DomainType::UInt64 => write!(f, "uint64"),
            DomainType::Float32 => write!(f, "float32"),
            DomainType::Float64 => write!(f, "float64"),
            DomainType::String => write!(f, "string"),
            DomainType::Bytes => write!(f, "bytes"),
            DomainType::Any => write!(f, "any"),
            DomainType::Array(elem) => write!(f, "array<{elem}>"),
            DomainType::Map(key, elem) => write!(f, "map<{key},{elem}>"),
            DomainType::User(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for DomainType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DomainType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(DomainType::parse(&text))
    }
}

/// Load a design from YAML and assign field paths.
pub fn parse_design(yaml: &str) -> Result<DesignSpec> {
    let mut spec: DesignSpec = serde_yaml::from_str(yaml).context("Failed to parse design YAML")?;
    for svc in &mut spec.services {
        for ep in &mut svc.endpoints {
            if let Some(PayloadShape::Object { fields }) = &mut ep.payload {
                assign_paths(fields, &[]);
            }
        }
    }
    Ok(spec)
}

fn assign_paths(fields: &mut [FieldDescriptor], parent: &[String]) {
    for field in fields {
        let mut path = parent.to_vec();
        path.push(field.name.clone());
        if let PayloadShape::Object { fields: nested } = &mut field.shape {
            assign_paths(nested, &path);
        }
        field.path = path;
    }
}

//! Flattening of payload shapes into per-endpoint flag specifications.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::design::{DomainType, EndpointDescriptor, FieldDescriptor, PayloadShape};
use crate::error::GenResult;
use crate::kind::{self, FlagKind, JsonShape, ValueType};
use crate::naming;
use crate::rules::{self, ConversionTarget};
use crate::validation::CompiledValidation;

/// Name of the single flag carrying a whole reference or primitive payload.
pub const PAYLOAD_FLAG: &str = "p";

/// One command line flag derived from a leaf field (or from the whole payload).
#[derive(Debug, Clone)]
pub struct FlagSpec {
    /// Kebab-case name, unique within the owning subcommand.
    pub name: String,
    /// Snake-case `<service>_<endpoint>_<flag>` identifier for generated code.
    pub full_name: String,
    pub kind: FlagKind,
    pub value_type: ValueType,
    pub json_shape: JsonShape,
    pub domain_type: DomainType,
    pub required: bool,
    pub description: String,
    /// Example text, valid input to this flag's own conversion rule.
    pub example: String,
    /// Field path inside the payload; empty for a whole-payload flag.
    pub path: Vec<String>,
    pub validation: Option<CompiledValidation>,
}

impl FlagSpec {
    pub fn target(&self) -> ConversionTarget<'_> {
        ConversionTarget {
            flag: &self.name,
            value_type: self.value_type,
            json_shape: self.json_shape,
            example: &self.example,
        }
    }

    /// Example as it appears on a shell command line.
    pub fn example_arg(&self) -> String {
        naming::shell_quote(&self.example)
    }
}

/// Produce the flags of one endpoint, in payload declaration order.
///
/// Only fails when a declared validation pattern does not compile.
pub fn synthesize(service: &str, endpoint: &EndpointDescriptor) -> GenResult<Vec<FlagSpec>> {
    let Some(shape) = &endpoint.payload else {
        return Ok(Vec::new());
    };

    let flags = match shape {
        PayloadShape::Reference { name } => {
            let ty = DomainType::parse(name);
            vec![whole_payload_flag(service, endpoint, ty)]
        }
        PayloadShape::Primitive { ty } => {
            vec![whole_payload_flag(service, endpoint, ty.clone())]
        }
        PayloadShape::Object { fields } => {
            let mut leaves = Vec::new();
            collect_leaves(fields, true, &mut leaves);
            let names = assign_names(&leaves);
            leaves
                .into_iter()
                .zip(names)
                .map(|((field, required), name)| leaf_flag(service, endpoint, field, required, name))
                .collect::<GenResult<Vec<_>>>()?
        }
    };

    tracing::debug!(
        service,
        endpoint = %endpoint.name,
        flags = flags.len(),
        "synthesized flags"
    );
    Ok(flags)
}

fn whole_payload_flag(service: &str, endpoint: &EndpointDescriptor, ty: DomainType) -> FlagSpec {
    let value_type = kind::value_type(&ty);
    let json_shape = kind::json_shape(&ty);
    let example = checked_example(
        PAYLOAD_FLAG,
        value_type,
        json_shape,
        endpoint.example.as_ref(),
    );
    FlagSpec {
        name: PAYLOAD_FLAG.to_string(),
        full_name: naming::snake(&[service, &endpoint.name, PAYLOAD_FLAG]),
        kind: value_type.flag_kind(),
        value_type,
        json_shape,
        domain_type: ty,
        required: true,
        description: endpoint
            .description
            .clone()
            .unwrap_or_else(|| "Request payload".to_string()),
        example,
        path: Vec::new(),
        validation: None,
    }
}

/// Depth-first walk. Nested objects are flattened; a leaf is required only
/// when it and every ancestor are required.
fn collect_leaves<'a>(
    fields: &'a [FieldDescriptor],
    parent_required: bool,
    out: &mut Vec<(&'a FieldDescriptor, bool)>,
) {
    for field in fields {
        let required = parent_required && field.required;
        match &field.shape {
            PayloadShape::Object { fields: nested } if !nested.is_empty() => {
                collect_leaves(nested, required, out);
            }
            _ => out.push((field, required)),
        }
    }
}

fn assign_names(leaves: &[(&FieldDescriptor, bool)]) -> Vec<String> {
    let short: Vec<String> = leaves.iter().map(|(f, _)| naming::kebab(&f.name)).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in &short {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let candidates: Vec<String> = leaves
        .iter()
        .zip(&short)
        .map(|((field, _), name)| {
            if counts[name.as_str()] > 1 && field.path.len() > 1 {
                naming::kebab(&field.path.join("_"))
            } else {
                name.clone()
            }
        })
        .collect();

    let mut used: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .map(|name| {
            let mut unique = name.clone();
            let mut n = 1;
            while !used.insert(unique.clone()) {
                n += 1;
                unique = format!("{name}-{n}");
            }
            unique
        })
        .collect()
}

fn leaf_flag(
    service: &str,
    endpoint: &EndpointDescriptor,
    field: &FieldDescriptor,
    required: bool,
    name: String,
) -> GenResult<FlagSpec> {
    let (ty, value_type, json_shape) = match &field.shape {
        PayloadShape::Primitive { ty } => (ty.clone(), kind::value_type(ty), kind::json_shape(ty)),
        PayloadShape::Reference { name } => {
            let ty = DomainType::parse(name);
            let (vt, js) = (kind::value_type(&ty), kind::json_shape(&ty));
            (ty, vt, js)
        }
        // Empty nested object: carried as an opaque JSON object.
        PayloadShape::Object { .. } => (
            DomainType::Map(Box::new(DomainType::String), Box::new(DomainType::Any)),
            ValueType::Json,
            JsonShape::Object,
        ),
    };

    let validation = field
        .validation
        .as_ref()
        .map(|v| CompiledValidation::compile(&name, v))
        .transpose()?;
    let example = checked_example(&name, value_type, json_shape, field.example.as_ref());

    Ok(FlagSpec {
        full_name: naming::snake(&[service, &endpoint.name, &name]),
        kind: value_type.flag_kind(),
        value_type,
        json_shape,
        domain_type: ty,
        required,
        description: field.description.clone().unwrap_or_default(),
        example,
        path: field.path.clone(),
        validation,
        name,
    })
}

/// Example text for a flag. A declared example that would not convert under
/// the flag's own rule is replaced by the kind's default.
fn checked_example(
    flag: &str,
    value_type: ValueType,
    json_shape: JsonShape,
    declared: Option<&Value>,
) -> String {
    let fallback = || rules::example_text(value_type, &rules::default_example(value_type, json_shape));
    let Some(declared) = declared else {
        return fallback();
    };

    let text = rules::example_text(value_type, declared);
    let target = ConversionTarget {
        flag,
        value_type,
        json_shape,
        example: &text,
    };
    match rules::convert(&target, &text) {
        Ok(_) => text,
        Err(err) => {
            tracing::warn!(flag, %err, "declared example does not convert, using default");
            fallback()
        }
    }
}

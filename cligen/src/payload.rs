//! Payload construction from flag text: the in-process builder and the
//! Rust source of generated build functions.

use std::ops::Range;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::design::{EndpointDescriptor, FieldDescriptor, PayloadShape};
use crate::error::{CliError, CliResult};
use crate::flags::FlagSpec;
use crate::kind::{self, ValueType};
use crate::naming;
use crate::parser::FlagValues;
use crate::rules::{self, Conversion, FlagValue};

/// How an endpoint turns its flags into a payload. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PayloadStrategy {
    /// No payload, no flags.
    Empty,
    /// One flag, converted in place by the parser.
    Inline,
    /// Several flags, assembled by a dedicated build function.
    Build,
}

impl PayloadStrategy {
    pub fn select(flags: &[FlagSpec]) -> Self {
        match flags.len() {
            0 => PayloadStrategy::Empty,
            1 => PayloadStrategy::Inline,
            _ => PayloadStrategy::Build,
        }
    }
}

/// One leaf of an object payload. `None` means the flag was not given.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadField {
    pub path: Vec<String>,
    pub value: Option<FlagValue>,
}

/// A constructed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Value(FlagValue),
    Object(Vec<PayloadField>),
}

impl Payload {
    /// Value of the leaf at `path`, if the payload is an object and the leaf was given.
    pub fn get(&self, path: &[&str]) -> Option<&FlagValue> {
        let Payload::Object(fields) = self else {
            return None;
        };
        fields
            .iter()
            .find(|f| f.path.iter().map(String::as_str).eq(path.iter().copied()))
            .and_then(|f| f.value.as_ref())
    }

    /// JSON form. Absent fields are omitted, nesting is rebuilt from the paths.
    pub fn to_json(&self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Value(v) => v.to_json(),
            Payload::Object(fields) => {
                let mut root = Map::new();
                for field in fields {
                    if let Some(value) = &field.value {
                        insert_path(&mut root, &field.path, value.to_json());
                    }
                }
                Value::Object(root)
            }
        }
    }
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [leaf] => {
            map.insert(leaf.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Build the payload of an endpoint from parsed flag values.
///
/// Flags are converted in declaration order; the first conversion or
/// validation failure is returned and nothing else is built. An optional
/// nested object given only in part fails on its first missing required leaf.
pub fn construct(
    endpoint: &EndpointDescriptor,
    flags: &[FlagSpec],
    values: &FlagValues,
) -> CliResult<Payload> {
    if flags.is_empty() {
        return Ok(Payload::Empty);
    }

    if let [flag] = flags {
        if flag.path.is_empty() {
            let raw = values.require(&flag.name)?;
            return convert_checked(flag, raw).map(Payload::Value);
        }
    }

    let mut fields = Vec::with_capacity(flags.len());
    for flag in flags {
        let value = match values.get(&flag.name) {
            Some(raw) => Some(convert_checked(flag, raw)?),
            None if flag.required => {
                return Err(CliError::missing_argument(format!("flag --{}", flag.name)))
            }
            None => None,
        };
        fields.push(PayloadField {
            path: flag.path.clone(),
            value,
        });
    }

    if let Some(PayloadShape::Object { fields: declared }) = &endpoint.payload {
        let given = |i: usize| fields.get(i).is_some_and(|f| f.value.is_some());
        for group in optional_groups(declared) {
            if !group.members.clone().any(given) {
                continue;
            }
            if let Some(&missing) = group.required.iter().find(|&&i| !given(i)) {
                let name = flags.get(missing).map_or("", |f| f.name.as_str());
                return Err(CliError::missing_argument(format!("flag --{name}")));
            }
        }
    }
    Ok(Payload::Object(fields))
}

/// Leaves of one optional nested object, as flag indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalGroup {
    pub members: Range<usize>,
    /// Leaves the object cannot be built without once any member is given.
    pub required: Vec<usize>,
}

/// Every optional nested object of a payload, outermost first.
pub fn optional_groups(fields: &[FieldDescriptor]) -> Vec<OptionalGroup> {
    let mut groups = Vec::new();
    let mut next = 0;
    walk_groups(fields, &mut next, &mut groups);
    groups
}

fn walk_groups(fields: &[FieldDescriptor], next: &mut usize, groups: &mut Vec<OptionalGroup>) {
    for field in fields {
        match &field.shape {
            PayloadShape::Object { fields: nested } if !nested.is_empty() => {
                let start = *next;
                let mut inner = Vec::new();
                walk_groups(nested, next, &mut inner);
                if !field.required {
                    let mut required = Vec::new();
                    let mut index = start;
                    required_leaves(nested, &mut index, &mut required);
                    groups.push(OptionalGroup {
                        members: start..*next,
                        required,
                    });
                }
                groups.extend(inner);
            }
            _ => *next += 1,
        }
    }
}

/// Leaves reachable from `fields` through required fields only.
fn required_leaves(fields: &[FieldDescriptor], next: &mut usize, out: &mut Vec<usize>) {
    for field in fields {
        match &field.shape {
            PayloadShape::Object { fields: nested } if !nested.is_empty() => {
                if field.required {
                    required_leaves(nested, next, out);
                } else {
                    *next += count_leaves(nested);
                }
            }
            _ => {
                if field.required {
                    out.push(*next);
                }
                *next += 1;
            }
        }
    }
}

fn convert_checked(flag: &FlagSpec, raw: &str) -> CliResult<FlagValue> {
    let value = rules::convert(&flag.target(), raw)?;
    if let Some(validation) = &flag.validation {
        validation.check(&flag.name, &value)?;
    }
    Ok(value)
}

// ==================== generated source ====================

/// Module holding a service's payload types in generated code.
pub fn service_module(module_path: &str, service: &str) -> String {
    format!("{module_path}::{}", naming::ident(service))
}

/// Rust type of an endpoint payload, `None` when the endpoint has none.
pub fn payload_type(service_module: &str, endpoint: &EndpointDescriptor) -> Option<String> {
    let ty = match endpoint.payload.as_ref()? {
        PayloadShape::Object { .. } => {
            format!("{service_module}::{}Payload", naming::camel(&endpoint.name))
        }
        PayloadShape::Reference { name } => {
            kind::rust_type(&crate::design::DomainType::parse(name), service_module)
        }
        PayloadShape::Primitive { ty } => kind::rust_type(ty, service_module),
    };
    Some(ty)
}

/// Rust type a flag converts to.
pub fn flag_rust_type(flag: &FlagSpec, service_module: &str) -> String {
    match flag.value_type {
        ValueType::Json => kind::rust_type(&flag.domain_type, service_module),
        other => rules::rule_for(other).rust_type.to_string(),
    }
}

/// Variable holding a flag's converted value in generated code.
pub fn flag_var(flag: &FlagSpec) -> String {
    naming::ident(&flag.name)
}

/// Statements converting and validating `from` into the flag's variable.
pub fn field_code(flag: &FlagSpec, from: &str, service_module: &str) -> String {
    let to = flag_var(flag);
    let ty = flag_rust_type(flag, service_module);
    let mut code = rules::conversion_code(&Conversion {
        from,
        to: &to,
        ty: &ty,
        value_type: flag.value_type,
        required: flag.required,
        flag: &flag.name,
        example: &flag.example,
    });

    if let Some(validation) = &flag.validation {
        let checks = validation.check_code(&flag.name, "v", flag.value_type, &flag.domain_type);
        if !checks.is_empty() {
            let open = if flag.required {
                format!("{{\n    let v = &{to};\n")
            } else {
                format!("if let Some(v) = &{to} {{\n")
            };
            code.push('\n');
            code.push_str(&open);
            code.push_str(&indent(&checks, 1));
            code.push_str("\n}");
        }
    }
    code
}

/// Statements rejecting optional nested objects given without one of their
/// required leaves.
pub fn group_check_code(fields: &[FieldDescriptor], flags: &[FlagSpec]) -> Vec<String> {
    let mut out = Vec::new();
    for group in optional_groups(fields) {
        let Some(members) = flags.get(group.members.clone()) else {
            continue;
        };
        if members.len() < 2 {
            continue;
        }
        let present = members
            .iter()
            .map(|f| format!("{}.is_some()", flag_var(f)))
            .collect::<Vec<_>>()
            .join(" || ");
        for flag in group.required.iter().filter_map(|&i| flags.get(i)) {
            out.push(format!(
                "if ({present}) && {}.is_none() {{\n    return Err(CliError::missing_argument({:?}));\n}}",
                flag_var(flag),
                format!("flag --{}", flag.name),
            ));
        }
    }
    out
}

/// Struct literal assembling an object payload from the flag variables.
pub fn init_code(
    fields: &[FieldDescriptor],
    flags: &[FlagSpec],
    type_name: &str,
    service_module: &str,
) -> String {
    let mut vars = flags.iter();
    render_struct(fields, &mut vars, type_name, service_module, false, 0)
}

fn render_struct<'a>(
    fields: &[FieldDescriptor],
    vars: &mut impl Iterator<Item = &'a FlagSpec>,
    type_name: &str,
    service_module: &str,
    under_optional: bool,
    depth: usize,
) -> String {
    let pad = "    ".repeat(depth + 1);
    let mut out = format!("{type_name} {{\n");
    for field in fields {
        let name = naming::ident(&field.name);
        let value = match &field.shape {
            PayloadShape::Object { fields: nested } if !nested.is_empty() => {
                let nested_type = format!("{service_module}::{}", naming::camel(&field.name));
                if field.required {
                    render_struct(nested, vars, &nested_type, service_module, under_optional, depth + 1)
                } else {
                    let leaves: Vec<&FlagSpec> = vars.take(count_leaves(nested)).collect();
                    let present = leaves
                        .iter()
                        .map(|f| format!("{}.is_some()", flag_var(f)))
                        .collect::<Vec<_>>()
                        .join(" || ");
                    let mut inner = leaves.into_iter();
                    let literal =
                        render_struct(nested, &mut inner, &nested_type, service_module, true, depth + 1);
                    format!("if {present} {{ (|| Some({literal}))() }} else {{ None }}")
                }
            }
            _ => match vars.next() {
                Some(flag) if field.required && under_optional => format!("{}?", flag_var(flag)),
                Some(flag) => flag_var(flag),
                None => "Default::default()".to_string(),
            },
        };
        out.push_str(&format!("{pad}{name}: {value},\n"));
    }
    out.push_str(&"    ".repeat(depth));
    out.push('}');
    out
}

fn count_leaves(fields: &[FieldDescriptor]) -> usize {
    fields
        .iter()
        .map(|f| match &f.shape {
            PayloadShape::Object { fields: nested } if !nested.is_empty() => count_leaves(nested),
            _ => 1,
        })
        .sum()
}

fn indent(code: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    code.lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("{pad}{l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildParam {
    pub name: String,
    pub ty: String,
    /// Expression passing the raw flag text at the call site.
    pub arg: String,
}

/// Render data of one generated build function.
#[derive(Debug, Clone, Serialize)]
pub struct BuildFunction {
    pub name: String,
    pub result_type: String,
    pub description: String,
    pub params: Vec<BuildParam>,
    pub body: Vec<String>,
    pub init: String,
}

pub fn build_function_name(endpoint: &str) -> String {
    naming::snake(&["build", endpoint, "payload"])
}

/// Raw-text expression for a flag at the parser call site.
pub fn flag_arg(flag: &FlagSpec) -> String {
    if flag.required {
        format!("values.require({:?})?", flag.name)
    } else {
        format!("values.get({:?})", flag.name)
    }
}

/// Build function for an endpoint using [`PayloadStrategy::Build`].
pub fn build_function(
    endpoint: &EndpointDescriptor,
    flags: &[FlagSpec],
    service_module: &str,
) -> Option<BuildFunction> {
    if PayloadStrategy::select(flags) != PayloadStrategy::Build {
        return None;
    }
    let result_type = payload_type(service_module, endpoint)?;
    let PayloadShape::Object { fields } = endpoint.payload.as_ref()? else {
        return None;
    };

    let params = flags
        .iter()
        .map(|f| BuildParam {
            name: f.full_name.clone(),
            ty: if f.required { "&str" } else { "Option<&str>" }.to_string(),
            arg: flag_arg(f),
        })
        .collect();
    let body = flags
        .iter()
        .map(|f| field_code(f, &f.full_name, service_module))
        .chain(group_check_code(fields, flags))
        .collect();

    Some(BuildFunction {
        name: build_function_name(&endpoint.name),
        description: format!(
            "Builds the payload of the {:?} endpoint from its command line flags.",
            endpoint.name
        ),
        init: init_code(fields, flags, &result_type, service_module),
        result_type,
        params,
        body,
    })
}

/// Statements binding `data` for an endpoint using [`PayloadStrategy::Inline`].
pub fn inline_code(endpoint: &EndpointDescriptor, flag: &FlagSpec, service_module: &str) -> String {
    let raw = format!("{}_raw", flag_var(flag).trim_start_matches("r#"));
    let bind = format!("let {raw} = {};", flag_arg(flag));
    let convert = field_code(flag, &raw, service_module);

    match (endpoint.payload.as_ref(), payload_type(service_module, endpoint)) {
        (Some(PayloadShape::Object { fields }), Some(ty)) => {
            let init = init_code(fields, std::slice::from_ref(flag), &ty, service_module);
            format!("{bind}\n{convert}\nlet data = {init};")
        }
        _ => format!("{bind}\n{convert}\nlet data = {};", flag_var(flag)),
    }
}

//! Two-level command line parsing: `[globals] <service> [service flags] <endpoint> [endpoint flags]`.
//!
//! [`TokenStream`], [`FlagSet`] and [`FlagValues`] are shared by the in-process
//! interpreter ([`parse_endpoint`]) and by generated parsers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::GlobalFlag;
use crate::error::{CliError, CliResult};
use crate::flags::FlagSpec;
use crate::payload::{self, Payload};
use crate::tree::CommandTree;
use crate::usage;

/// Immutable view over the remaining argument tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenStream<'a> {
    tokens: &'a [String],
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Self { tokens }
    }

    pub fn is_empty(self) -> bool {
        self.tokens.is_empty()
    }

    pub fn remaining(self) -> &'a [String] {
        self.tokens
    }

    pub fn peek(self) -> Option<&'a str> {
        self.tokens.first().map(String::as_str)
    }

    fn advance(self, n: usize) -> Self {
        Self {
            tokens: self.tokens.get(n..).unwrap_or_default(),
        }
    }

    /// Take one positional token; `what` names it in the error when none is left.
    pub fn next_positional(self, what: &str) -> CliResult<(&'a str, TokenStream<'a>)> {
        match self.tokens.first() {
            Some(token) => Ok((token.as_str(), self.advance(1))),
            None => Err(CliError::missing_argument(what)),
        }
    }

    pub fn expect_end(self) -> CliResult<()> {
        match self.tokens.first() {
            Some(token) => Err(CliError::UnexpectedArgument {
                token: token.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
struct FlagDef {
    name: String,
    takes_value: bool,
    default: Option<String>,
}

/// Flags accepted at one level of the command line.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    defs: Vec<FlagDef>,
    usage: String,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag set for the global level.
    pub fn globals(flags: &[GlobalFlag]) -> Self {
        flags.iter().fold(Self::new(), |set, f| {
            let set = if f.takes_value {
                set.value(&f.name)
            } else {
                set.switch(&f.name)
            };
            match &f.default {
                Some(default) => set.with_default(&f.name, default),
                None => set,
            }
        })
    }

    #[must_use]
    pub fn value(mut self, name: &str) -> Self {
        self.defs.push(FlagDef {
            name: name.to_string(),
            takes_value: true,
            default: None,
        });
        self
    }

    #[must_use]
    pub fn switch(mut self, name: &str) -> Self {
        self.defs.push(FlagDef {
            name: name.to_string(),
            takes_value: false,
            default: None,
        });
        self
    }

    #[must_use]
    pub fn with_default(mut self, name: &str, default: &str) -> Self {
        if let Some(def) = self.defs.iter_mut().find(|d| d.name == name) {
            def.default = Some(default.to_string());
        }
        self
    }

    /// Help text carried by [`CliError::HelpRequested`].
    #[must_use]
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    fn lookup(&self, name: &str) -> Option<&FlagDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Consume flags up to the first positional token or `--`.
    ///
    /// Accepts `-name value`, `--name value` and `--name=value`. A repeated
    /// flag keeps its last value. Unset flags with a default get the default.
    pub fn parse<'a>(&self, mut tokens: TokenStream<'a>) -> CliResult<(FlagValues, TokenStream<'a>)> {
        let mut values = FlagValues::default();

        while let Some(token) = tokens.peek() {
            if token == "--" {
                tokens = tokens.advance(1);
                break;
            }
            let Some(body) = token
                .strip_prefix("--")
                .or_else(|| token.strip_prefix('-'))
                .filter(|b| !b.is_empty())
            else {
                break;
            };
            tokens = tokens.advance(1);

            let (name, inline) = match body.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (body, None),
            };
            // `h` and `help` only ask for help when the level does not define them.
            let def = match self.lookup(name) {
                Some(def) => def,
                None if name == "h" || name == "help" => {
                    return Err(CliError::HelpRequested(self.usage.clone()));
                }
                None => {
                    return Err(CliError::UnknownFlag {
                        flag: name.to_string(),
                    })
                }
            };

            let value = match (def.takes_value, inline) {
                (_, Some(v)) => v.to_string(),
                (false, None) => "true".to_string(),
                (true, None) => {
                    let (v, rest) = tokens.next_positional(&format!("value for flag -{name}"))?;
                    tokens = rest;
                    v.to_string()
                }
            };
            tracing::trace!(flag = name, "flag parsed");
            values.set(name, &value);
        }

        for def in &self.defs {
            if let Some(default) = &def.default {
                if values.get(&def.name).is_none() {
                    values.set(&def.name, default);
                }
            }
        }
        Ok((values, tokens))
    }
}

/// Raw flag text by flag name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlagValues {
    values: BTreeMap<String, String>,
}

impl FlagValues {
    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of a required flag.
    pub fn require(&self, name: &str) -> CliResult<&str> {
        self.get(name)
            .ok_or_else(|| CliError::missing_argument(format!("flag --{name}")))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The endpoint a command line resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointRef {
    pub service: String,
    pub endpoint: String,
    /// Client method name, e.g. `Add`.
    pub method: String,
}

/// A fully parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub endpoint: EndpointRef,
    pub payload: Payload,
    pub globals: FlagValues,
}

/// Parse a command line against a command tree.
///
/// Returns every outcome to the caller, including help requests; never prints or exits.
pub fn parse_endpoint(tree: &CommandTree, globals: &FlagSet, tokens: TokenStream<'_>) -> CliResult<Invocation> {
    let (global_values, tokens) = globals.parse(tokens)?;

    let (svc_token, tokens) = tokens.next_positional("service")?;
    let service = tree
        .find_service(svc_token)
        .ok_or_else(|| CliError::unknown_service(svc_token))?;
    tracing::debug!(service = %service.name, "service selected");

    let (_, tokens) = level_flags(&service.flags)
        .with_usage(usage::command_usage(tree, service))
        .parse(tokens)?;

    let (ep_token, tokens) = tokens.next_positional("endpoint")?;
    let sub = service
        .find_subcommand(ep_token)
        .ok_or_else(|| CliError::unknown_endpoint(&service.name, ep_token))?;
    tracing::debug!(endpoint = %sub.name, strategy = ?sub.strategy, "endpoint selected");

    let (values, tokens) = level_flags(&sub.flags)
        .with_usage(usage::subcommand_usage(tree, service, sub))
        .parse(tokens)?;
    tokens.expect_end()?;

    let payload = payload::construct(&sub.endpoint, &sub.flags, &values)?;
    Ok(Invocation {
        endpoint: EndpointRef {
            service: service.service.clone(),
            endpoint: sub.endpoint.name.clone(),
            method: sub.method.clone(),
        },
        payload,
        globals: global_values,
    })
}

fn level_flags(flags: &[FlagSpec]) -> FlagSet {
    flags.iter().fold(FlagSet::new(), |set, f| set.value(&f.name))
}

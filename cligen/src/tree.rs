//! Two-level command tree: one command per service, one subcommand per endpoint.

use std::collections::HashSet;

use crate::config::{GeneratorConfig, GlobalFlag};
use crate::design::{DesignSpec, EndpointDescriptor, ServiceDescriptor};
use crate::error::{GenError, GenResult};
use crate::flags::{self, FlagSpec};
use crate::naming;
use crate::payload::PayloadStrategy;

#[derive(Debug, Clone)]
pub struct CommandTree {
    /// Program name used in usage text.
    pub tool: String,
    pub global_flags: Vec<GlobalFlag>,
    pub max_examples: usize,
    pub services: Vec<CommandNode>,
}

/// Service-level command.
#[derive(Debug, Clone)]
pub struct CommandNode {
    /// Token selecting this command on the command line.
    pub name: String,
    /// Service name as declared in the design.
    pub service: String,
    pub description: String,
    /// Service-scoped flags. Designs do not declare any yet, so this stays empty.
    pub flags: Vec<FlagSpec>,
    pub subcommands: Vec<Subcommand>,
    /// Example of the first subcommand.
    pub example: String,
}

/// Endpoint-level command.
#[derive(Debug, Clone)]
pub struct Subcommand {
    pub name: String,
    pub endpoint: EndpointDescriptor,
    /// Snake-case `<service>_<endpoint>`.
    pub full_name: String,
    pub description: String,
    /// Client method name.
    pub method: String,
    pub flags: Vec<FlagSpec>,
    pub strategy: PayloadStrategy,
    /// `<service> <endpoint> --flag example ...`, shell-quoted.
    pub example: String,
}

impl CommandTree {
    /// Build the tree, keeping the design's service and endpoint order.
    pub fn build(design: &DesignSpec, config: &GeneratorConfig) -> GenResult<Self> {
        if design.services.is_empty() {
            return Err(GenError::NoServices);
        }

        let mut seen = HashSet::new();
        let mut services = Vec::with_capacity(design.services.len());
        for svc in &design.services {
            if !seen.insert(naming::kebab(&svc.name)) {
                return Err(GenError::DuplicateService {
                    service: svc.name.clone(),
                });
            }
            services.push(build_command(svc)?);
        }

        tracing::debug!(
            services = services.len(),
            endpoints = services.iter().map(|s| s.subcommands.len()).sum::<usize>(),
            "command tree built"
        );
        Ok(Self {
            tool: config.tool.clone(),
            global_flags: config.global_flags.clone(),
            max_examples: config.max_examples,
            services,
        })
    }

    pub fn find_service(&self, token: &str) -> Option<&CommandNode> {
        self.services.iter().find(|s| s.name == token)
    }

    /// Every (command, subcommand) pair, in tree order.
    pub fn paths(&self) -> impl Iterator<Item = (&CommandNode, &Subcommand)> {
        self.services
            .iter()
            .flat_map(|s| s.subcommands.iter().map(move |sub| (s, sub)))
    }
}

impl CommandNode {
    pub fn find_subcommand(&self, token: &str) -> Option<&Subcommand> {
        self.subcommands.iter().find(|s| s.name == token)
    }
}

fn build_command(svc: &ServiceDescriptor) -> GenResult<CommandNode> {
    if svc.endpoints.is_empty() {
        return Err(GenError::EmptyService {
            service: svc.name.clone(),
        });
    }

    let name = naming::kebab(&svc.name);
    let mut seen = HashSet::new();
    let mut subcommands = Vec::with_capacity(svc.endpoints.len());
    for ep in &svc.endpoints {
        if !seen.insert(naming::kebab(&ep.name)) {
            return Err(GenError::DuplicateEndpoint {
                service: svc.name.clone(),
                endpoint: ep.name.clone(),
            });
        }
        subcommands.push(build_subcommand(&name, &svc.name, ep)?);
    }

    let description = svc
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Make requests to the {name:?} service"));
    let example = subcommands
        .first()
        .map(|s| s.example.clone())
        .unwrap_or_default();

    Ok(CommandNode {
        name,
        service: svc.name.clone(),
        description,
        flags: Vec::new(),
        subcommands,
        example,
    })
}

fn build_subcommand(command: &str, service: &str, ep: &EndpointDescriptor) -> GenResult<Subcommand> {
    let flags = flags::synthesize(service, ep)?;
    let strategy = PayloadStrategy::select(&flags);
    tracing::debug!(service, endpoint = %ep.name, ?strategy, "payload strategy selected");

    let name = naming::kebab(&ep.name);
    let mut example = format!("{command} {name}");
    for flag in &flags {
        example.push_str(&format!(" --{} {}", flag.name, flag.example_arg()));
    }
    let description = ep
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Make request to the {:?} endpoint", ep.name));

    Ok(Subcommand {
        full_name: naming::snake(&[service, &ep.name]),
        method: naming::camel(&ep.name),
        endpoint: ep.clone(),
        name,
        description,
        flags,
        strategy,
        example,
    })
}

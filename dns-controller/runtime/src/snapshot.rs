//! Resource providers and a YAML-file backed snapshot implementing them.

use crate::k8s::{self, RouteResource};
use gateway_dns_core::{
    AllowedNamespaces, BoxError, Gateway, Labels, Namespace, Route, RouteKind, Selector,
};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Restricts a listing to a namespace and a label selector.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// When unset, resources in every namespace are listed.
    pub namespace: Option<String>,
    pub labels: Selector,
}

pub trait RouteProvider {
    fn routes(&self, kind: RouteKind, filter: &Filter) -> Result<Vec<Route>, BoxError>;
}

pub trait GatewayProvider {
    fn gateways(&self, filter: &Filter) -> Result<Vec<Gateway>, BoxError>;
}

pub trait NamespaceProvider {
    fn namespaces(&self) -> Result<Vec<Namespace>, BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {index} is not valid YAML")]
    Yaml {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("document {index} has no kind")]
    MissingKind { index: usize },

    #[error("document {index} is not a valid {kind}")]
    Resource {
        index: usize,
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Routes, Gateways and Namespaces read from a multi-document YAML file.
///
/// Documents may also be `List`s of resources. Documents of other kinds are ignored.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    routes: Vec<Route>,
    gateways: Vec<Gateway>,
    namespaces: Vec<Namespace>,
}

// === impl Filter ===

impl Filter {
    pub fn new(namespace: Option<String>, labels: Selector) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
            labels,
        }
    }

    pub fn matches(&self, namespace: &str, labels: &Labels) -> bool {
        if let Some(ns) = self.namespace.as_deref() {
            if ns != namespace {
                return false;
            }
        }
        self.labels.matches(labels)
    }
}

// === impl Snapshot ===

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, SnapshotError> {
        use serde::Deserialize;

        let mut snapshot = Self::default();
        for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = Value::deserialize(document)
                .map_err(|source| SnapshotError::Yaml { index, source })?;
            if value.is_null() {
                continue;
            }
            snapshot.insert(index, value)?;
        }

        tracing::debug!(
            routes = snapshot.routes.len(),
            gateways = snapshot.gateways.len(),
            namespaces = snapshot.namespaces.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    fn insert(&mut self, index: usize, value: Value) -> Result<(), SnapshotError> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(SnapshotError::MissingKind { index })?
            .to_string();

        match kind.as_str() {
            "List" => {
                let items = value
                    .get("items")
                    .and_then(Value::as_sequence)
                    .cloned()
                    .unwrap_or_default();
                for item in items {
                    self.insert(index, item)?;
                }
            }
            "Namespace" => {
                let ns = decode::<k8s::Namespace>(index, &kind, value)?;
                self.namespaces.push(k8s::gateway::namespace(&ns));
            }
            "Gateway" => {
                let mut value = value;
                let unknown = take_unknown_namespace_policies(&mut value);
                let gw = decode::<k8s::Gateway>(index, &kind, value)?;
                let mut gateway = k8s::gateway::gateway(&gw);
                for (name, from) in unknown {
                    tracing::warn!(gateway = %gateway.id, listener = %name, %from, "Unknown namespace policy");
                    if let Some(listener) = gateway.listeners.iter_mut().find(|l| l.name == name) {
                        listener.allowed_routes.namespaces = AllowedNamespaces::Unknown(from);
                    }
                }
                self.gateways.push(gateway);
            }
            "HTTPRoute" => self.insert_route::<k8s::HTTPRoute>(index, &kind, value)?,
            "GRPCRoute" => self.insert_route::<k8s::GRPCRoute>(index, &kind, value)?,
            "TLSRoute" => self.insert_route::<k8s::TLSRoute>(index, &kind, value)?,
            "TCPRoute" => self.insert_route::<k8s::TCPRoute>(index, &kind, value)?,
            "UDPRoute" => self.insert_route::<k8s::UDPRoute>(index, &kind, value)?,
            _ => tracing::debug!(%kind, index, "Ignoring unsupported resource"),
        }
        Ok(())
    }

    fn insert_route<R>(&mut self, index: usize, kind: &str, value: Value) -> Result<(), SnapshotError>
    where
        R: RouteResource + DeserializeOwned,
    {
        let route = decode::<R>(index, kind, value)?;
        self.routes.push(route.to_route());
        Ok(())
    }
}

/// Replaces listener `allowedRoutes.namespaces.from` policies that the typed Gateway cannot
/// represent with `Same`, returning the replaced policies by listener name.
fn take_unknown_namespace_policies(gateway: &mut Value) -> Vec<(String, String)> {
    const KNOWN: [&str; 3] = ["All", "Same", "Selector"];

    let mut unknown = Vec::new();
    let Some(listeners) = gateway
        .get_mut("spec")
        .and_then(|spec| spec.get_mut("listeners"))
        .and_then(Value::as_sequence_mut)
    else {
        return unknown;
    };

    for listener in listeners {
        let name = listener
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(from) = listener
            .get_mut("allowedRoutes")
            .and_then(|allowed| allowed.get_mut("namespaces"))
            .and_then(|namespaces| namespaces.get_mut("from"))
        else {
            continue;
        };
        let Some(policy) = from.as_str().map(str::to_string) else {
            continue;
        };
        if !KNOWN.contains(&policy.as_str()) {
            *from = Value::String("Same".to_string());
            unknown.push((name, policy));
        }
    }
    unknown
}

fn decode<T: DeserializeOwned>(index: usize, kind: &str, value: Value) -> Result<T, SnapshotError> {
    serde_yaml::from_value(value).map_err(|source| SnapshotError::Resource {
        index,
        kind: kind.to_string(),
        source,
    })
}

impl RouteProvider for Snapshot {
    fn routes(&self, kind: RouteKind, filter: &Filter) -> Result<Vec<Route>, BoxError> {
        Ok(self
            .routes
            .iter()
            .filter(|r| r.kind == kind && filter.matches(&r.id.namespace, &r.labels))
            .cloned()
            .collect())
    }
}

impl GatewayProvider for Snapshot {
    fn gateways(&self, filter: &Filter) -> Result<Vec<Gateway>, BoxError> {
        Ok(self
            .gateways
            .iter()
            .filter(|gw| filter.matches(&gw.id.namespace, &gw.labels))
            .cloned()
            .collect())
    }
}

impl NamespaceProvider for Snapshot {
    fn namespaces(&self) -> Result<Vec<Namespace>, BoxError> {
        Ok(self.namespaces.clone())
    }
}

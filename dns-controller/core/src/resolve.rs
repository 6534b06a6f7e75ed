use crate::{
    gateway::{AllowedNamespaces, Gateway, Listener},
    hostname,
    hosts::{AnnotationExtractor, HostnameSource},
    index::GatewayIndex,
    route::{ResourceId, Route, RouteKind},
    targets, BoxError,
};
use std::collections::BTreeMap;

/// Resolved hostnames and the targets each should point at.
pub type HostTargets = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to determine hostnames for {kind} {route}")]
    Hostnames {
        route: ResourceId,
        kind: RouteKind,
        #[source]
        source: BoxError,
    },
}

/// Resolves routes against a [`GatewayIndex`].
#[derive(Debug)]
pub struct Resolver<A> {
    hosts: HostnameSource<A>,

    /// When set, only Gateways with this name are considered.
    gateway_name: Option<String>,
}

// === impl Resolver ===

impl<A: AnnotationExtractor> Resolver<A> {
    pub fn new(hosts: HostnameSource<A>) -> Self {
        Self {
            hosts,
            gateway_name: None,
        }
    }

    pub fn with_gateway_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.gateway_name = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn hosts(&self) -> &HostnameSource<A> {
        &self.hosts
    }

    /// Computes the hostnames `route` publishes through the Gateways that accepted it.
    ///
    /// Only template errors fail resolution. A route that attaches nowhere resolves to an empty
    /// map.
    pub fn resolve(
        &self,
        route: &Route,
        index: &GatewayIndex<'_>,
    ) -> Result<HostTargets, ResolveError> {
        let _span = tracing::debug_span!("resolve", kind = %route.kind, route = %route.id).entered();

        let hostnames = self
            .hosts
            .hosts(route)
            .map_err(|source| ResolveError::Hostnames {
                route: route.id.clone(),
                kind: route.kind,
                source,
            })?;

        let mut resolved = HostTargets::new();
        if route.parent_refs.is_empty() {
            tracing::debug!("No parent references");
            return Ok(resolved);
        }

        let route_ns = route.id.namespace.as_str();
        for status in &route.parents {
            let parent = &status.parent_ref;
            let namespace = parent.namespace(route_ns);

            if !route.declares_parent(parent) {
                tracing::debug!(
                    parent.namespace = %namespace,
                    parent.name = %parent.name,
                    "Status names a parent the route does not reference"
                );
                continue;
            }

            if !parent.targets_gateway() {
                tracing::debug!(
                    parent.group = %parent.group(),
                    parent.kind = %parent.kind(),
                    parent.name = %parent.name,
                    "Parent is not a Gateway"
                );
                continue;
            }

            let gateway = match index.gateway(namespace, &parent.name) {
                Some(gateway) => gateway,
                None => {
                    tracing::debug!(gateway.namespace = %namespace, gateway.name = %parent.name, "Gateway not found");
                    continue;
                }
            };

            if let Some(name) = self.gateway_name.as_deref() {
                if name != parent.name {
                    tracing::debug!(gateway.namespace = %namespace, gateway.name = %parent.name, "Gateway name does not match filter");
                    continue;
                }
            }

            if !status.is_accepted() {
                tracing::debug!(gateway.namespace = %namespace, gateway.name = %parent.name, "Route not accepted by Gateway");
                continue;
            }

            let section = parent.section_name();
            let listeners = gateway.section(section);
            if listeners.is_empty() {
                tracing::debug!(
                    gateway.namespace = %namespace,
                    gateway.name = %parent.name,
                    %section,
                    "No listeners in section"
                );
                continue;
            }

            let addrs = self.targets(gateway.gateway);
            for listener in listeners {
                if !self.admits(route, gateway.gateway, listener, index) {
                    continue;
                }
                if let Some(port) = parent.port {
                    if port != listener.port {
                        tracing::debug!(listener = %listener.name, listener.port = listener.port, port, "Port mismatch");
                        continue;
                    }
                }

                let listener_host = listener.hostname();
                for host in &hostnames {
                    if host.is_empty() && listener_host.is_empty() {
                        continue;
                    }
                    match hostname::overlap(host, listener_host) {
                        Some(host) => resolved
                            .entry(host)
                            .or_default()
                            .extend(addrs.iter().cloned()),
                        None => {
                            tracing::debug!(%host, listener = %listener.name, listener.hostname = %listener_host, "No matching hostname")
                        }
                    }
                }
            }
        }

        for addrs in resolved.values_mut() {
            *addrs = targets::dedupe(std::mem::take(addrs));
        }
        Ok(resolved)
    }

    /// The Gateway's targets: its target annotation when present, its status addresses otherwise.
    fn targets(&self, gateway: &Gateway) -> Vec<String> {
        let targets = self.hosts.annotations().targets(&gateway.annotations);
        if targets.is_empty() {
            gateway.addresses.clone()
        } else {
            targets
        }
    }

    fn admits(
        &self,
        route: &Route,
        gateway: &Gateway,
        listener: &Listener,
        index: &GatewayIndex<'_>,
    ) -> bool {
        if !route.protocol().is_compatible_with(&listener.protocol) {
            tracing::debug!(
                listener = %listener.name,
                listener.protocol = %listener.protocol,
                protocol = %route.protocol(),
                "Unsupported protocol"
            );
            return false;
        }

        if !admits_namespace(route, gateway, listener, index) {
            tracing::debug!(listener = %listener.name, "Namespace not allowed");
            return false;
        }

        if !listener.admits_kind(route.kind) {
            tracing::debug!(listener = %listener.name, "Route kind not allowed");
            return false;
        }

        true
    }
}

fn admits_namespace(
    route: &Route,
    gateway: &Gateway,
    listener: &Listener,
    index: &GatewayIndex<'_>,
) -> bool {
    match &listener.allowed_routes.namespaces {
        AllowedNamespaces::Same => gateway.id.namespace == route.id.namespace,
        AllowedNamespaces::All => true,
        AllowedNamespaces::Selector(None) => false,
        AllowedNamespaces::Selector(Some(selector)) => {
            let selector = match selector.to_selector() {
                Ok(selector) => selector,
                Err(error) => {
                    tracing::warn!(%error, gateway = %gateway.id, listener = %listener.name, "Invalid namespace selector");
                    return false;
                }
            };
            match index.namespace(&route.id.namespace) {
                Some(ns) => selector.matches(&ns.labels),
                None => {
                    tracing::error!(namespace = %route.id.namespace, "Namespace not found");
                    false
                }
            }
        }
        AllowedNamespaces::Unknown(from) => {
            tracing::debug!(%from, listener = %listener.name, "Unknown namespace policy");
            false
        }
    }
}

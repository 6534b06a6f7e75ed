use crate::{
    endpoint::{Endpoint, RecordConfig},
    k8s::{annotations, ExternalDnsAnnotations, FqdnTemplate},
    metrics::SourceMetrics,
    snapshot::{Filter, GatewayProvider, NamespaceProvider, RouteProvider},
};
use gateway_dns_core::{BoxError, GatewayIndex, HostnameSource, Resolver, RouteKind, Selector};

/// Configures a [`RouteSource`].
#[derive(Clone, Debug, Default)]
pub struct SourceConfig {
    pub kind: RouteKind,
    pub routes: Filter,
    pub gateways: Filter,

    /// Selects routes by their annotations.
    pub annotation_filter: Selector,

    pub gateway_name: Option<String>,
    pub fqdn_template: Option<FqdnTemplate>,
    pub combine_fqdn_annotation: bool,
    pub ignore_hostname_annotation: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to list {resource}")]
    List {
        resource: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Generates DNS endpoints from the routes of one kind.
#[derive(Debug)]
pub struct RouteSource<P> {
    provider: P,
    kind: RouteKind,
    routes: Filter,
    gateways: Filter,
    annotation_filter: Selector,
    resolver: Resolver<ExternalDnsAnnotations>,
    metrics: SourceMetrics,
}

// === impl RouteSource ===

impl<P> RouteSource<P>
where
    P: RouteProvider + GatewayProvider + NamespaceProvider,
{
    pub fn new(provider: P, config: SourceConfig, metrics: SourceMetrics) -> Self {
        let SourceConfig {
            kind,
            routes,
            gateways,
            annotation_filter,
            gateway_name,
            fqdn_template,
            combine_fqdn_annotation,
            ignore_hostname_annotation,
        } = config;

        let mut hosts = HostnameSource::new(ExternalDnsAnnotations)
            .combine_fqdn_annotation(combine_fqdn_annotation)
            .ignore_hostname_annotation(ignore_hostname_annotation);
        if let Some(template) = fqdn_template {
            hosts = hosts.with_template(template);
        }
        let mut resolver = Resolver::new(hosts);
        if let Some(name) = gateway_name {
            resolver = resolver.with_gateway_name(name);
        }

        Self {
            provider,
            kind,
            routes,
            gateways,
            annotation_filter,
            resolver,
            metrics,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolves every route in the current snapshot and returns the endpoints they publish,
    /// sorted by name and record type.
    ///
    /// A route that fails to resolve is logged and skipped.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>, SourceError> {
        let _span = tracing::info_span!("endpoints", kind = %self.kind).entered();

        let routes = self
            .provider
            .routes(self.kind, &self.routes)
            .map_err(|source| SourceError::List {
                resource: "routes",
                source,
            })?;
        let gateways = self
            .provider
            .gateways(&self.gateways)
            .map_err(|source| SourceError::List {
                resource: "gateways",
                source,
            })?;
        let namespaces = self
            .provider
            .namespaces()
            .map_err(|source| SourceError::List {
                resource: "namespaces",
                source,
            })?;

        let index = GatewayIndex::build(&gateways, &namespaces);
        let mut endpoints = Vec::new();
        for route in &routes {
            if !self.annotation_filter.matches_map(&route.annotations) {
                tracing::debug!(route = %route.id, "Annotations do not match filter");
                continue;
            }

            if !annotations::is_managed(&route.annotations) {
                tracing::debug!(
                    route = %route.id,
                    controller = route.annotations.get(annotations::CONTROLLER).map(String::as_str),
                    "Skipping route managed by another controller"
                );
                continue;
            }

            let host_targets = match self.resolver.resolve(route, &index) {
                Ok(host_targets) => host_targets,
                Err(error) => {
                    tracing::warn!(route = %route.id, %error, "Failed to resolve route");
                    self.metrics.error(self.kind);
                    continue;
                }
            };
            self.metrics.resolved(self.kind);

            if host_targets.is_empty() {
                tracing::debug!(route = %route.id, "No endpoints could be generated");
                continue;
            }

            let config = RecordConfig::for_route(route);
            let generated = host_targets
                .iter()
                .flat_map(|(host, targets)| Endpoint::for_hostname(host, targets, &config))
                .collect::<Vec<_>>();
            tracing::debug!(route = %route.id, endpoints = generated.len(), "Generated endpoints");
            self.metrics.endpoints(self.kind, generated.len());
            endpoints.extend(generated);
        }

        endpoints.sort_by(|a, b| {
            (&a.dns_name, a.record_type, &a.set_identifier).cmp(&(
                &b.dns_name,
                b.record_type,
                &b.set_identifier,
            ))
        });
        Ok(endpoints)
    }
}

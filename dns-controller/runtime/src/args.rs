use crate::{
    core::{RouteKind, Selector},
    k8s::FqdnTemplate,
    metrics::SourceMetrics,
    snapshot::{Filter, Snapshot},
    source::{RouteSource, SourceConfig},
};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use prometheus_client::{encoding::text::encode, registry::Registry};
use std::{num::NonZeroU64, path::PathBuf, str::FromStr};
use tokio::time::Duration;
use tracing::{info, info_span};

#[derive(Debug, Parser)]
#[clap(
    name = "gateway-dns",
    about = "Derives DNS records from Gateway API routes"
)]
pub struct Args {
    #[clap(long, default_value = "gateway_dns=info,warn", env = "GATEWAY_DNS_LOG")]
    log_level: String,

    #[clap(long, default_value = "plain", env = "GATEWAY_DNS_LOG_FORMAT")]
    log_format: LogFormat,

    /// A multi-document YAML file holding Gateways, routes and Namespaces.
    #[clap(long, env = "GATEWAY_DNS_SNAPSHOT")]
    snapshot: PathBuf,

    #[clap(long, default_value = "httproute", env = "GATEWAY_DNS_ROUTE_KIND")]
    route_kind: RouteKind,

    /// Restricts routes to a single namespace. All namespaces are watched by default.
    #[clap(long, env = "GATEWAY_DNS_NAMESPACE")]
    namespace: Option<String>,

    #[clap(long, env = "GATEWAY_DNS_LABEL_FILTER")]
    label_filter: Option<Selector>,

    #[clap(long, env = "GATEWAY_DNS_ANNOTATION_FILTER")]
    annotation_filter: Option<Selector>,

    /// Only resolve routes against Gateways with this name.
    #[clap(long, env = "GATEWAY_DNS_GATEWAY_NAME")]
    gateway_name: Option<String>,

    #[clap(long, env = "GATEWAY_DNS_GATEWAY_NAMESPACE")]
    gateway_namespace: Option<String>,

    #[clap(long, env = "GATEWAY_DNS_GATEWAY_LABEL_FILTER")]
    gateway_label_filter: Option<Selector>,

    /// Generates hostnames for routes, e.g. `{{ .Name }}.{{ .Namespace }}.example.com`.
    #[clap(long, env = "GATEWAY_DNS_FQDN_TEMPLATE")]
    fqdn_template: Option<FqdnTemplate>,

    /// Adds templated hostnames even when a route declares its own.
    #[clap(long, env = "GATEWAY_DNS_COMBINE_FQDN_ANNOTATION")]
    combine_fqdn_annotation: bool,

    #[clap(long, env = "GATEWAY_DNS_IGNORE_HOSTNAME_ANNOTATION")]
    ignore_hostname_annotation: bool,

    /// Seconds between passes. When unset, a single pass is run.
    #[clap(long, env = "GATEWAY_DNS_INTERVAL")]
    interval: Option<NonZeroU64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid log format {0:?}; expected plain or json")]
pub struct InvalidLogFormat(String);

// === impl Args ===

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            snapshot,
            route_kind,
            namespace,
            label_filter,
            annotation_filter,
            gateway_name,
            gateway_namespace,
            gateway_label_filter,
            fqdn_template,
            combine_fqdn_annotation,
            ignore_hostname_annotation,
            interval,
        } = self;

        log_format.try_init(&log_level)?;

        let mut prom = Registry::default();
        let metrics = SourceMetrics::register(prom.sub_registry_with_prefix("gateway_dns"));

        let config = SourceConfig {
            kind: route_kind,
            routes: Filter::new(namespace, label_filter.unwrap_or_default()),
            gateways: Filter::new(gateway_namespace, gateway_label_filter.unwrap_or_default()),
            annotation_filter: annotation_filter.unwrap_or_default(),
            gateway_name: gateway_name.filter(|name| !name.is_empty()),
            fqdn_template,
            combine_fqdn_annotation,
            ignore_hostname_annotation,
        };

        let Some(interval) = interval else {
            run_pass(&snapshot, &config, &metrics)?;
            log_metrics(&prom);
            return Ok(());
        };

        let mut ticks = tokio::time::interval(Duration::from_secs(interval.get()));
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Err(error) = run_pass(&snapshot, &config, &metrics) {
                        tracing::error!(error = %format!("{error:#}"), "Pass failed");
                    }
                }
                res = tokio::signal::ctrl_c() => {
                    res.context("failed to listen for shutdown signal")?;
                    info!("Shutting down");
                    break;
                }
            }
        }

        log_metrics(&prom);
        Ok(())
    }
}

/// Loads the snapshot and logs the endpoints its routes publish.
///
/// The snapshot is re-read on every pass.
fn run_pass(path: &std::path::Path, config: &SourceConfig, metrics: &SourceMetrics) -> Result<()> {
    let _span = info_span!("pass", snapshot = %path.display()).entered();

    let snapshot = Snapshot::load(path)?;
    let source = RouteSource::new(snapshot, config.clone(), metrics.clone());
    let endpoints = source.endpoints()?;

    for endpoint in &endpoints {
        info!(
            %endpoint,
            resource = endpoint.labels.get(crate::endpoint::RESOURCE_LABEL).map(String::as_str),
            "Endpoint"
        );
    }
    info!(endpoints = endpoints.len(), "Pass complete");
    Ok(())
}

fn log_metrics(prom: &Registry) {
    let mut text = String::new();
    match encode(&mut text, prom) {
        Ok(()) => tracing::debug!(metrics = %text, "Metrics"),
        Err(error) => tracing::warn!(%error, "Failed to encode metrics"),
    }
}

// === impl LogFormat ===

impl LogFormat {
    /// Installs the global tracing subscriber.
    pub fn try_init(self, filter: &str) -> Result<()> {
        let filter = tracing_subscriber::EnvFilter::try_new(filter)
            .with_context(|| format!("invalid log filter {filter:?}"))?;
        let fmt = tracing_subscriber::fmt().with_env_filter(filter);
        match self {
            Self::Plain => fmt.try_init(),
            Self::Json => fmt.json().try_init(),
        }
        .map_err(|error| anyhow!(error))
        .context("failed to install tracing subscriber")
    }
}

impl FromStr for LogFormat {
    type Err = InvalidLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("plain") {
            Ok(Self::Plain)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(InvalidLogFormat(s.to_string()))
        }
    }
}

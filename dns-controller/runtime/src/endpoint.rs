use crate::k8s::{
    annotations::{self, ProviderSpecific},
    duration::Ttl,
};
use gateway_dns_core::Route;
use std::{collections::BTreeMap, fmt, net::IpAddr};

/// Label naming the resource an endpoint was generated from.
pub const RESOURCE_LABEL: &str = "resource";

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
}

/// A DNS record to be published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub dns_name: String,
    pub record_type: RecordType,
    pub targets: Vec<String>,
    pub ttl: Option<Ttl>,
    pub set_identifier: Option<String>,
    pub provider_specific: ProviderSpecific,
    pub labels: BTreeMap<String, String>,
}

/// Record properties shared by every endpoint generated from one route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordConfig {
    pub ttl: Option<Ttl>,
    pub set_identifier: Option<String>,
    pub provider_specific: ProviderSpecific,

    /// `<kind>/<namespace>/<name>` of the source route.
    pub resource: String,
}

// === impl RecordType ===

impl RecordType {
    /// Chooses the record type for a target: A or AAAA for IP addresses, CNAME otherwise.
    pub fn for_target(target: &str) -> Self {
        match target.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Self::A,
            Ok(IpAddr::V6(_)) => Self::Aaaa,
            Err(_) => Self::Cname,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl RecordConfig ===

impl RecordConfig {
    /// Reads record properties from the route's annotations. An invalid TTL is ignored.
    pub fn for_route(route: &Route) -> Self {
        let resource = format!(
            "{}/{}/{}",
            route.kind.kind().to_ascii_lowercase(),
            route.id.namespace,
            route.id.name
        );

        let ttl = match annotations::ttl(&route.annotations) {
            Ok(ttl) => ttl,
            Err(error) => {
                tracing::warn!(%error, %resource, "Ignoring invalid TTL");
                None
            }
        };

        Self {
            ttl,
            set_identifier: annotations::set_identifier(&route.annotations).map(str::to_string),
            provider_specific: annotations::provider_specific(&route.annotations),
            resource,
        }
    }
}

// === impl Endpoint ===

impl Endpoint {
    /// Builds one endpoint per record type among `targets`.
    pub fn for_hostname(hostname: &str, targets: &[String], config: &RecordConfig) -> Vec<Self> {
        let mut by_type = BTreeMap::<RecordType, Vec<String>>::new();
        for target in targets {
            by_type
                .entry(RecordType::for_target(target))
                .or_default()
                .push(target.clone());
        }

        by_type
            .into_iter()
            .map(|(record_type, targets)| Self {
                dns_name: hostname.to_string(),
                record_type,
                targets,
                ttl: config.ttl,
                set_identifier: config.set_identifier.clone(),
                provider_specific: config.provider_specific.clone(),
                labels: Some((RESOURCE_LABEL.to_string(), config.resource.clone()))
                    .into_iter()
                    .collect(),
            })
            .collect()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dns_name, self.record_type)?;
        if let Some(ttl) = self.ttl {
            write!(f, " {}", ttl.as_secs())?;
        }
        write!(f, " [{}]", self.targets.join(" "))?;
        if let Some(id) = self.set_identifier.as_deref() {
            write!(f, " set-identifier={id}")?;
        }
        Ok(())
    }
}

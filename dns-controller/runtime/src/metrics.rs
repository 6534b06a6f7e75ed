use gateway_dns_core::RouteKind;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug)]
pub struct SourceMetrics {
    routes_resolved: Family<KindLabels, Counter>,
    route_errors: Family<KindLabels, Counter>,
    endpoints: Family<KindLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

impl SourceMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let routes_resolved = Family::default();
        prom.register(
            "routes_resolved",
            "Count of routes resolved against their Gateways",
            routes_resolved.clone(),
        );

        let route_errors = Family::default();
        prom.register(
            "route_errors",
            "Count of routes that failed to resolve",
            route_errors.clone(),
        );

        let endpoints = Family::default();
        prom.register(
            "endpoints",
            "Count of endpoints generated from routes",
            endpoints.clone(),
        );

        Self {
            routes_resolved,
            route_errors,
            endpoints,
        }
    }

    pub fn resolved(&self, kind: RouteKind) {
        self.routes_resolved.get_or_create(&KindLabels::from(kind)).inc();
    }

    pub fn error(&self, kind: RouteKind) {
        self.route_errors.get_or_create(&KindLabels::from(kind)).inc();
    }

    pub fn endpoints(&self, kind: RouteKind, count: usize) {
        self.endpoints
            .get_or_create(&KindLabels::from(kind))
            .inc_by(count as u64);
    }
}

impl From<RouteKind> for KindLabels {
    fn from(kind: RouteKind) -> Self {
        Self {
            kind: kind.kind().to_string(),
        }
    }
}

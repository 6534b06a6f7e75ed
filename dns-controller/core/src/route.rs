use crate::{labels::Labels, protocol::Protocol, Annotations, GATEWAY_GROUP, GATEWAY_KIND};
use std::{fmt, str::FromStr};

/// The condition type a Gateway sets on a route's parent status once it has accepted the route.
pub const ROUTE_CONDITION_ACCEPTED: &str = "Accepted";

pub const CONDITION_TRUE: &str = "True";

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

/// The Gateway API route kinds that share the resolution algorithm.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum RouteKind {
    #[default]
    Http,
    Grpc,
    Tls,
    Tcp,
    Udp,
}

/// A route, reduced to the fields that decide where it attaches and what it publishes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Route {
    pub id: ResourceId,
    pub kind: RouteKind,
    pub labels: Labels,
    pub annotations: Annotations,

    /// Hostnames declared in the route's spec. Empty means the route inherits the hostnames of
    /// the listeners it attaches to.
    pub hostnames: Vec<String>,

    /// Parents the route asks to attach to.
    pub parent_refs: Vec<ParentRef>,

    /// Parents that have reported on the route, as recorded in its status.
    pub parents: Vec<RouteParentStatus>,
}

/// A reference from a route to a parent resource.
///
/// Unset (or empty) fields take their defaults: the route's namespace, the Gateway API group, and
/// the `Gateway` kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group: Option<String>,
    pub kind: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
    pub section_name: Option<String>,
    pub port: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteParentStatus {
    pub parent_ref: ParentRef,
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Condition {
    pub type_: String,
    pub status: String,
}

// === impl ResourceId ===

impl ResourceId {
    pub fn new(namespace: String, name: String) -> Self {
        Self { namespace, name }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl RouteKind ===

impl RouteKind {
    pub const ALL: [RouteKind; 5] = [Self::Http, Self::Grpc, Self::Tls, Self::Tcp, Self::Udp];

    pub fn group(&self) -> &'static str {
        GATEWAY_GROUP
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http => "HTTPRoute",
            Self::Grpc => "GRPCRoute",
            Self::Tls => "TLSRoute",
            Self::Tcp => "TCPRoute",
            Self::Udp => "UDPRoute",
        }
    }

    /// The protocol a route of this kind declares when matched against listeners.
    ///
    /// gRPC is carried over HTTP/2, so GRPCRoutes attach to HTTP and HTTPS listeners.
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Http => Protocol::Http,
            Self::Grpc => Protocol::Https,
            Self::Tls => Protocol::Tls,
            Self::Tcp => Protocol::Tcp,
            Self::Udp => Protocol::Udp,
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown route kind {0:?}")]
pub struct UnknownRouteKind(String);

impl FromStr for RouteKind {
    type Err = UnknownRouteKind;

    /// Parses a route kind case-insensitively, e.g. `httproute` or `HTTPRoute`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.kind().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRouteKind(s.to_string()))
    }
}

// === impl Route ===

impl Route {
    pub fn protocol(&self) -> Protocol {
        self.kind.protocol()
    }

    /// Returns whether `parent` names one of the parents declared in the route's spec.
    ///
    /// Status entries are written by gateway controllers and are not trusted to agree with the
    /// spec.
    pub fn declares_parent(&self, parent: &ParentRef) -> bool {
        self.parent_refs
            .iter()
            .any(|declared| declared.is_same_parent(parent, &self.id.namespace))
    }
}

// === impl ParentRef ===

impl ParentRef {
    pub fn group(&self) -> &str {
        or_default(self.group.as_deref(), GATEWAY_GROUP)
    }

    pub fn kind(&self) -> &str {
        or_default(self.kind.as_deref(), GATEWAY_KIND)
    }

    pub fn namespace<'a>(&'a self, route_namespace: &'a str) -> &'a str {
        or_default(self.namespace.as_deref(), route_namespace)
    }

    /// The listener section the reference selects; empty selects every listener.
    pub fn section_name(&self) -> &str {
        self.section_name.as_deref().unwrap_or_default()
    }

    pub fn targets_gateway(&self) -> bool {
        self.group() == GATEWAY_GROUP && self.kind() == GATEWAY_KIND
    }

    /// Two references name the same parent when their defaulted group, kind and namespace and
    /// their name agree. Section and port are not part of the parent's identity.
    pub fn is_same_parent(&self, other: &ParentRef, route_namespace: &str) -> bool {
        self.group() == other.group()
            && self.kind() == other.kind()
            && self.name == other.name
            && self.namespace(route_namespace) == other.namespace(route_namespace)
    }
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => default,
    }
}

// === impl RouteParentStatus ===

impl RouteParentStatus {
    /// Returns whether the parent accepted the route. A missing `Accepted` condition means the
    /// route has not been accepted.
    pub fn is_accepted(&self) -> bool {
        self.conditions
            .iter()
            .find(|c| c.type_ == ROUTE_CONDITION_ACCEPTED)
            .map(|c| c.status == CONDITION_TRUE)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_ref(name: &str) -> ParentRef {
        ParentRef {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn parent_ref_defaults() {
        let parent = ParentRef {
            group: Some(String::new()),
            ..gateway_ref("gw")
        };
        assert_eq!(parent.group(), GATEWAY_GROUP);
        assert_eq!(parent.kind(), GATEWAY_KIND);
        assert_eq!(parent.namespace("ns-0"), "ns-0");
        assert_eq!(parent.section_name(), "");
        assert!(parent.targets_gateway());

        let parent = ParentRef {
            group: Some("example.com".to_string()),
            kind: Some("Mesh".to_string()),
            namespace: Some("ns-1".to_string()),
            ..gateway_ref("gw")
        };
        assert_eq!(parent.namespace("ns-0"), "ns-1");
        assert!(!parent.targets_gateway());
    }

    #[test]
    fn same_parent_uses_defaulted_identity() {
        let explicit = ParentRef {
            group: Some(GATEWAY_GROUP.to_string()),
            kind: Some(GATEWAY_KIND.to_string()),
            namespace: Some("ns-0".to_string()),
            section_name: Some("web".to_string()),
            port: Some(80),
            ..gateway_ref("gw")
        };
        assert!(explicit.is_same_parent(&gateway_ref("gw"), "ns-0"));
        assert!(gateway_ref("gw").is_same_parent(&explicit, "ns-0"));
        assert!(!explicit.is_same_parent(&gateway_ref("gw"), "ns-1"));
        assert!(!explicit.is_same_parent(&gateway_ref("other"), "ns-0"));

        let other_kind = ParentRef {
            kind: Some("Service".to_string()),
            ..gateway_ref("gw")
        };
        assert!(!other_kind.is_same_parent(&gateway_ref("gw"), "ns-0"));
    }

    #[test]
    fn acceptance_fails_closed() {
        let status = |conditions: Vec<(&str, &str)>| RouteParentStatus {
            parent_ref: gateway_ref("gw"),
            conditions: conditions
                .into_iter()
                .map(|(type_, status)| Condition {
                    type_: type_.to_string(),
                    status: status.to_string(),
                })
                .collect(),
        };

        assert!(status(vec![("Accepted", "True")]).is_accepted());
        assert!(status(vec![("ResolvedRefs", "False"), ("Accepted", "True")]).is_accepted());
        assert!(!status(vec![("Accepted", "False")]).is_accepted());
        assert!(!status(vec![("Accepted", "Unknown")]).is_accepted());
        assert!(!status(vec![("ResolvedRefs", "True")]).is_accepted());
        assert!(!status(vec![]).is_accepted());
    }

    #[test]
    fn route_kinds() {
        assert_eq!("httproute".parse::<RouteKind>(), Ok(RouteKind::Http));
        assert_eq!("GRPCRoute".parse::<RouteKind>(), Ok(RouteKind::Grpc));
        assert_eq!("tcproute".parse::<RouteKind>().map(|k| k.protocol()), Ok(Protocol::Tcp));
        assert!("ingress".parse::<RouteKind>().is_err());
        assert_eq!(RouteKind::Udp.to_string(), "UDPRoute");
    }
}

use crate::{
    labels::{self, InvalidSelector, Labels, Selector},
    protocol::Protocol,
    route::{ResourceId, RouteKind},
    Annotations, GATEWAY_GROUP,
};

/// A Gateway, reduced to its listeners and the addresses it is reachable at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gateway {
    pub id: ResourceId,
    pub labels: Labels,
    pub annotations: Annotations,
    pub listeners: Vec<Listener>,

    /// Address values reported in the Gateway's status.
    pub addresses: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listener {
    /// The section name, unique within the Gateway.
    pub name: String,
    pub protocol: Protocol,
    pub port: i32,
    pub hostname: Option<String>,
    pub allowed_routes: AllowedRoutes,
}

/// Constrains which routes may attach to a listener.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedRoutes {
    pub namespaces: AllowedNamespaces,

    /// Route kinds that may attach. Empty admits every kind.
    pub kinds: Vec<RouteGroupKind>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowedNamespaces {
    /// Only routes in the Gateway's namespace.
    #[default]
    Same,

    /// Routes in any namespace.
    All,

    /// Routes in namespaces whose labels match the selector. Without a selector, no namespace is
    /// selected.
    Selector(Option<LabelSelector>),

    /// A policy this controller does not understand; nothing is admitted.
    Unknown(String),
}

/// A label selector as written on a listener, not yet validated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector {
    pub match_labels: Option<labels::Map>,
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: String,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteGroupKind {
    /// Defaults to the Gateway API group when unset or empty.
    pub group: Option<String>,
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub labels: Labels,
}

// === impl Listener ===

impl Listener {
    pub fn new(name: impl Into<String>, protocol: Protocol, port: i32) -> Self {
        Self {
            name: name.into(),
            protocol,
            port,
            hostname: None,
            allowed_routes: AllowedRoutes::default(),
        }
    }

    /// The listener's hostname; empty when the listener accepts any hostname.
    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or_default()
    }

    /// Returns whether routes of `kind` may attach to this listener.
    pub fn admits_kind(&self, kind: RouteKind) -> bool {
        let kinds = &self.allowed_routes.kinds;
        kinds.is_empty() || kinds.iter().any(|gk| gk.matches(kind))
    }
}

// === impl RouteGroupKind ===

impl RouteGroupKind {
    fn group(&self) -> &str {
        match self.group.as_deref() {
            Some(group) if !group.is_empty() => group,
            _ => GATEWAY_GROUP,
        }
    }

    fn matches(&self, kind: RouteKind) -> bool {
        self.group() == kind.group() && self.kind == kind.kind()
    }
}

// === impl LabelSelector ===

impl LabelSelector {
    pub fn to_selector(&self) -> Result<Selector, InvalidSelector> {
        Selector::try_new(
            self.match_labels.clone(),
            self.match_expressions
                .iter()
                .map(|req| (req.key.clone(), req.operator.clone(), req.values.clone())),
        )
    }
}

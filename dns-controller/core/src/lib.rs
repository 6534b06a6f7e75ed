//! Gateway route resolution
//!
//! Derives the DNS names a route should publish, and the targets each name should point at, from a
//! snapshot of Gateways, their Listeners, Namespaces and the route itself.
//!
//! ```text
//! [ Route ] -> [ ParentRef ] -> [ Gateway ] -> [ Listener ] -> { hostname: [targets] }
//! ```
//!
//! A route only publishes a hostname through a listener when every compatibility check agrees:
//! the route's status names the parent as one it declared; the parent is a Gateway in the index;
//! the Gateway accepted the route; the listener speaks a compatible protocol (and port, when the
//! reference names one); the listener admits the route's namespace and kind; and the route's and
//! listener's hostnames overlap.
//!
//! The [`index::GatewayIndex`] is built once per snapshot and is read-only afterwards, so routes
//! may be resolved concurrently against the same index.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod gateway;
pub mod hostname;
pub mod hosts;
pub mod index;
pub mod labels;
pub mod protocol;
pub mod resolve;
pub mod route;
pub mod targets;

pub use self::{
    gateway::{AllowedNamespaces, AllowedRoutes, Gateway, Listener, Namespace, RouteGroupKind},
    hosts::{AnnotationExtractor, HostnameSource, HostnameTemplate},
    index::GatewayIndex,
    labels::{Labels, Selector},
    protocol::Protocol,
    resolve::{HostTargets, ResolveError, Resolver},
    route::{Condition, ParentRef, ResourceId, Route, RouteKind, RouteParentStatus},
};

/// The API group owning Gateways.
pub const GATEWAY_GROUP: &str = "gateway.networking.k8s.io";

/// The kind of the only parent resource routes are resolved against.
pub const GATEWAY_KIND: &str = "Gateway";

/// Errors produced by collaborators (e.g. template engines) crossing into the core.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Free-form resource annotations.
pub type Annotations = std::collections::BTreeMap<String, String>;

use gateway_api::apis::experimental::{
    grpcroutes::GRPCRoute, httproutes::HTTPRoute, tcproutes::TCPRoute, tlsroutes::TLSRoute,
    udproutes::UDPRoute,
};
use gateway_dns_core::{Condition, ParentRef, ResourceId, Route, RouteKind, RouteParentStatus};
use kube::ResourceExt;

/// A Gateway API route resource.
///
/// Every route kind is reduced to the same [`Route`] shape so that a single resolver handles all
/// of them.
pub trait RouteResource: kube::Resource + Sized {
    const KIND: RouteKind;

    /// Hostnames declared in the route's spec. Kinds without hostnames declare none.
    fn hostnames(&self) -> Vec<String>;

    fn parent_refs(&self) -> Vec<ParentRef>;

    fn parent_statuses(&self) -> Vec<RouteParentStatus>;

    fn to_route(&self) -> Route {
        Route {
            id: ResourceId::new(self.namespace().unwrap_or_default(), self.name_any()),
            kind: Self::KIND,
            labels: self.labels().clone().into(),
            annotations: self.annotations().clone(),
            hostnames: self.hostnames(),
            parent_refs: self.parent_refs(),
            parents: self.parent_statuses(),
        }
    }
}

/// Each route kind has its own generated parent reference type with identical fields.
macro_rules! parent_ref {
    ($parent:expr) => {{
        let parent = $parent;
        ParentRef {
            group: parent.group.clone(),
            kind: parent.kind.clone(),
            namespace: parent.namespace.clone(),
            name: parent.name.clone(),
            section_name: parent.section_name.clone(),
            port: parent.port,
        }
    }};
}

macro_rules! impl_route_resource {
    ($resource:ty, $kind:expr, |$route:ident| $hostnames:expr) => {
        impl RouteResource for $resource {
            const KIND: RouteKind = $kind;

            fn hostnames(&self) -> Vec<String> {
                let $route = self;
                $hostnames
            }

            fn parent_refs(&self) -> Vec<ParentRef> {
                self.spec
                    .parent_refs
                    .iter()
                    .flatten()
                    .map(|parent| parent_ref!(parent))
                    .collect()
            }

            fn parent_statuses(&self) -> Vec<RouteParentStatus> {
                self.status
                    .iter()
                    .flat_map(|status| status.parents.iter())
                    .map(|status| RouteParentStatus {
                        parent_ref: parent_ref!(&status.parent_ref),
                        conditions: status
                            .conditions
                            .iter()
                            .flatten()
                            .map(|c| Condition {
                                type_: c.type_.clone(),
                                status: c.status.clone(),
                            })
                            .collect(),
                    })
                    .collect()
            }
        }
    };
}

impl_route_resource!(HTTPRoute, RouteKind::Http, |route| route
    .spec
    .hostnames
    .clone()
    .unwrap_or_default());
impl_route_resource!(GRPCRoute, RouteKind::Grpc, |route| route
    .spec
    .hostnames
    .clone()
    .unwrap_or_default());
impl_route_resource!(TLSRoute, RouteKind::Tls, |route| route
    .spec
    .hostnames
    .clone()
    .unwrap_or_default());
impl_route_resource!(TCPRoute, RouteKind::Tcp, |_route| Vec::new());
impl_route_resource!(UDPRoute, RouteKind::Udp, |_route| Vec::new());

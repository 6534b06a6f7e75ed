//! Adapters from Kubernetes Gateway API resources into the resolution model, along with the
//! `external-dns` annotation conventions and hostname templates.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
pub mod duration;
pub mod fqdn;
pub mod gateway;
pub mod routes;

pub use self::{
    annotations::ExternalDnsAnnotations,
    fqdn::{FqdnTemplate, TemplateError},
    routes::RouteResource,
};
pub use gateway_api::apis::experimental::{
    gateways::Gateway,
    grpcroutes::GRPCRoute,
    httproutes::HTTPRoute,
    tcproutes::TCPRoute,
    tlsroutes::TLSRoute,
    udproutes::UDPRoute,
};
pub use k8s_openapi::api::core::v1::Namespace;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use kube::ResourceExt;

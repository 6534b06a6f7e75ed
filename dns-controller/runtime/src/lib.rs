#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use gateway_dns_core as core;
pub use gateway_dns_k8s_api as k8s;

mod args;
pub mod endpoint;
pub mod metrics;
pub mod snapshot;
pub mod source;

pub use self::args::{Args, LogFormat};

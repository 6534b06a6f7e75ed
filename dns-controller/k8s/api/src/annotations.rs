//! The `external-dns.alpha.kubernetes.io/*` annotation conventions.

use crate::duration::{ParseError, Ttl};
use gateway_dns_core::{AnnotationExtractor, Annotations};
use std::collections::BTreeMap;

pub const PREFIX: &str = "external-dns.alpha.kubernetes.io/";

pub const HOSTNAME: &str = "external-dns.alpha.kubernetes.io/hostname";
pub const TARGET: &str = "external-dns.alpha.kubernetes.io/target";
pub const TTL: &str = "external-dns.alpha.kubernetes.io/ttl";
pub const SET_IDENTIFIER: &str = "external-dns.alpha.kubernetes.io/set-identifier";
pub const CONTROLLER: &str = "external-dns.alpha.kubernetes.io/controller";
pub const CLOUDFLARE_PROXIED: &str = "external-dns.alpha.kubernetes.io/cloudflare-proxied";

/// The value of the controller annotation on resources this controller manages.
pub const CONTROLLER_NAME: &str = "dns-controller";

/// Provider-specific record properties, by property name.
pub type ProviderSpecific = BTreeMap<String, String>;

/// Extracts hostnames and targets from `external-dns` annotations.
#[derive(Copy, Clone, Debug, Default)]
pub struct ExternalDnsAnnotations;

impl AnnotationExtractor for ExternalDnsAnnotations {
    fn hostnames(&self, annotations: &Annotations) -> Vec<String> {
        hostnames(annotations)
    }

    fn targets(&self, annotations: &Annotations) -> Vec<String> {
        targets(annotations)
    }
}

/// Returns the comma-separated hostnames in the hostname annotation.
pub fn hostnames(annotations: &Annotations) -> Vec<String> {
    split(annotations.get(HOSTNAME)).collect()
}

/// Returns the comma-separated targets in the target annotation, without trailing dots.
pub fn targets(annotations: &Annotations) -> Vec<String> {
    split(annotations.get(TARGET))
        .map(|t| t.trim_end_matches('.').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Returns the TTL annotation, if one is set.
pub fn ttl(annotations: &Annotations) -> Result<Option<Ttl>, ParseError> {
    annotations.get(TTL).map(|v| v.parse()).transpose()
}

pub fn set_identifier(annotations: &Annotations) -> Option<&str> {
    annotations.get(SET_IDENTIFIER).map(String::as_str)
}

/// Returns whether a resource is managed by this controller. Resources without a controller
/// annotation are.
pub fn is_managed(annotations: &Annotations) -> bool {
    annotations
        .get(CONTROLLER)
        .map(|c| c == CONTROLLER_NAME)
        .unwrap_or(true)
}

/// Collects provider-specific properties.
///
/// `cloudflare-proxied` keeps its full annotation key; `aws-<name>` and `webhook-<name>` become
/// `aws/<name>` and `webhook/<name>`.
pub fn provider_specific(annotations: &Annotations) -> ProviderSpecific {
    let mut props = ProviderSpecific::new();
    for (key, value) in annotations {
        if key == CLOUDFLARE_PROXIED {
            props.insert(key.clone(), value.clone());
            continue;
        }

        let Some(name) = key.strip_prefix(PREFIX) else {
            continue;
        };
        for provider in ["aws", "webhook"] {
            if let Some(attr) = name
                .strip_prefix(provider)
                .and_then(|n| n.strip_prefix('-'))
            {
                if !attr.is_empty() {
                    props.insert(format!("{provider}/{attr}"), value.clone());
                }
            }
        }
    }
    props
}

fn split(value: Option<&String>) -> impl Iterator<Item = String> + '_ {
    value
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(|v| v.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    fn annotations(pairs: &[(&str, &str)]) -> Annotations {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn hostnames_and_targets() {
        let a = annotations(&[
            (HOSTNAME, " a.example.com, b.example.com,,"),
            (TARGET, "lb.example.net., 192.0.2.1"),
        ]);
        assert_eq!(hostnames(&a), vec!["a.example.com", "b.example.com"]);
        assert_eq!(targets(&a), vec!["lb.example.net", "192.0.2.1"]);

        let none = Annotations::new();
        assert!(hostnames(&none).is_empty());
        assert!(targets(&none).is_empty());
        assert_eq!(ExternalDnsAnnotations.targets(&a), targets(&a));
    }

    #[test]
    fn ttls() {
        assert_eq!(ttl(&annotations(&[])), Ok(None));
        assert_eq!(
            ttl(&annotations(&[(TTL, "60")])).map(|t| t.map(|t| t.as_secs())),
            Ok(Some(60))
        );
        assert_eq!(
            ttl(&annotations(&[(TTL, "2m")])).map(|t| t.map(|t| t.as_secs())),
            Ok(Some(120))
        );
        assert!(ttl(&annotations(&[(TTL, "0")])).is_err());
        assert!(ttl(&annotations(&[(TTL, "soon")])).is_err());
    }

    #[test]
    fn controller() {
        assert!(is_managed(&annotations(&[])));
        assert!(is_managed(&annotations(&[(CONTROLLER, CONTROLLER_NAME)])));
        assert!(!is_managed(&annotations(&[(CONTROLLER, "other-dns")])));
    }

    #[test]
    fn provider_properties() {
        let a = annotations(&[
            (CLOUDFLARE_PROXIED, "true"),
            ("external-dns.alpha.kubernetes.io/aws-weight", "10"),
            ("external-dns.alpha.kubernetes.io/webhook-zone", "internal"),
            ("external-dns.alpha.kubernetes.io/aws-", "ignored"),
            ("external-dns.alpha.kubernetes.io/awsweight", "ignored"),
            ("example.com/aws-weight", "ignored"),
            (SET_IDENTIFIER, "blue"),
        ]);
        assert_eq!(
            provider_specific(&a),
            btreemap! {
                CLOUDFLARE_PROXIED.to_string() => "true".to_string(),
                "aws/weight".to_string() => "10".to_string(),
                "webhook/zone".to_string() => "internal".to_string(),
            }
        );
        assert_eq!(set_identifier(&a), Some("blue"));
    }
}

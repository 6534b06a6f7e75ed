use gateway_api::apis::experimental::gateways::{
    Gateway, GatewayListeners, GatewayListenersAllowedRoutes,
    GatewayListenersAllowedRoutesNamespaces, GatewayListenersAllowedRoutesNamespacesFrom,
    GatewayListenersAllowedRoutesNamespacesSelector,
};
use gateway_dns_core::{
    gateway::{self as model, LabelSelector, LabelSelectorRequirement},
    AllowedNamespaces, AllowedRoutes, Listener, Protocol, ResourceId, RouteGroupKind,
};
use k8s_openapi::api::core::v1::Namespace;
use kube::ResourceExt;

/// Converts a Gateway into the resolution model.
pub fn gateway(gateway: &Gateway) -> model::Gateway {
    model::Gateway {
        id: ResourceId::new(
            gateway.namespace().unwrap_or_default(),
            gateway.name_any(),
        ),
        labels: gateway.labels().clone().into(),
        annotations: gateway.annotations().clone(),
        listeners: gateway.spec.listeners.iter().map(listener).collect(),
        addresses: gateway
            .status
            .iter()
            .flat_map(|status| status.addresses.iter().flatten())
            .map(|addr| addr.value.clone())
            .collect(),
    }
}

pub fn namespace(ns: &Namespace) -> model::Namespace {
    model::Namespace {
        name: ns.name_any(),
        labels: ns.labels().clone().into(),
    }
}

fn listener(listener: &GatewayListeners) -> Listener {
    Listener {
        hostname: listener.hostname.clone(),
        allowed_routes: listener
            .allowed_routes
            .as_ref()
            .map(allowed_routes)
            .unwrap_or_default(),
        ..Listener::new(
            listener.name.clone(),
            Protocol::from(listener.protocol.as_str()),
            listener.port,
        )
    }
}

fn allowed_routes(allowed: &GatewayListenersAllowedRoutes) -> AllowedRoutes {
    AllowedRoutes {
        namespaces: allowed
            .namespaces
            .as_ref()
            .map(allowed_namespaces)
            .unwrap_or_default(),
        kinds: allowed
            .kinds
            .iter()
            .flatten()
            .map(|gk| RouteGroupKind {
                group: gk.group.clone(),
                kind: gk.kind.clone(),
            })
            .collect(),
    }
}

fn allowed_namespaces(namespaces: &GatewayListenersAllowedRoutesNamespaces) -> AllowedNamespaces {
    match namespaces.from {
        None | Some(GatewayListenersAllowedRoutesNamespacesFrom::Same) => AllowedNamespaces::Same,
        Some(GatewayListenersAllowedRoutesNamespacesFrom::All) => AllowedNamespaces::All,
        Some(GatewayListenersAllowedRoutesNamespacesFrom::Selector) => {
            AllowedNamespaces::Selector(namespaces.selector.as_ref().map(label_selector))
        }
    }
}

fn label_selector(selector: &GatewayListenersAllowedRoutesNamespacesSelector) -> LabelSelector {
    LabelSelector {
        match_labels: selector.match_labels.clone(),
        match_expressions: selector
            .match_expressions
            .iter()
            .flatten()
            .map(|expr| LabelSelectorRequirement {
                key: expr.key.clone(),
                operator: expr.operator.clone(),
                values: expr.values.clone().unwrap_or_default(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_api::apis::experimental::gateways::{
        GatewayListenersAllowedRoutesKinds,
        GatewayListenersAllowedRoutesNamespacesSelectorMatchExpressions, GatewaySpec,
        GatewayStatus, GatewayStatusAddresses,
    };
    use gateway_dns_core::Labels;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    fn listener(name: &str, protocol: &str, port: i32) -> GatewayListeners {
        GatewayListeners {
            name: name.to_string(),
            protocol: protocol.to_string(),
            port,
            ..Default::default()
        }
    }

    #[test]
    fn converts_gateway() {
        let gw = Gateway {
            metadata: ObjectMeta {
                namespace: Some("ns-0".to_string()),
                name: Some("gw".to_string()),
                annotations: Some(btreemap! {
                    "external-dns.alpha.kubernetes.io/target".to_string() => "lb.example.net".to_string(),
                }),
                ..Default::default()
            },
            spec: GatewaySpec {
                gateway_class_name: "example".to_string(),
                listeners: vec![
                    GatewayListeners {
                        hostname: Some("*.example.com".to_string()),
                        ..listener("web", "HTTP", 80)
                    },
                    GatewayListeners {
                        allowed_routes: Some(GatewayListenersAllowedRoutes {
                            kinds: Some(vec![GatewayListenersAllowedRoutesKinds {
                                group: None,
                                kind: "TLSRoute".to_string(),
                            }]),
                            namespaces: Some(GatewayListenersAllowedRoutesNamespaces {
                                from: Some(GatewayListenersAllowedRoutesNamespacesFrom::Selector),
                                selector: Some(GatewayListenersAllowedRoutesNamespacesSelector {
                                    match_labels: Some(btreemap! {
                                        "team".to_string() => "a".to_string(),
                                    }),
                                    match_expressions: Some(vec![
                                        GatewayListenersAllowedRoutesNamespacesSelectorMatchExpressions {
                                            key: "env".to_string(),
                                            operator: "Exists".to_string(),
                                            values: None,
                                        },
                                    ]),
                                }),
                            }),
                        }),
                        ..listener("tls", "TLS", 443)
                    },
                ],
                ..Default::default()
            },
            status: Some(GatewayStatus {
                addresses: Some(vec![
                    GatewayStatusAddresses {
                        r#type: Some("IPAddress".to_string()),
                        value: "192.0.2.1".to_string(),
                    },
                    GatewayStatusAddresses {
                        r#type: Some("Hostname".to_string()),
                        value: "lb.example.net".to_string(),
                    },
                ]),
                ..Default::default()
            }),
        };

        let converted = gateway(&gw);
        assert_eq!(converted.id, ResourceId::new("ns-0".to_string(), "gw".to_string()));
        assert_eq!(converted.addresses, vec!["192.0.2.1", "lb.example.net"]);
        assert_eq!(
            converted.annotations.get("external-dns.alpha.kubernetes.io/target"),
            Some(&"lb.example.net".to_string())
        );

        let web = &converted.listeners[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.protocol, Protocol::Http);
        assert_eq!(web.hostname(), "*.example.com");
        assert_eq!(web.allowed_routes, AllowedRoutes::default());

        let tls = &converted.listeners[1];
        assert_eq!(tls.protocol, Protocol::Tls);
        assert_eq!(tls.port, 443);
        assert_eq!(
            tls.allowed_routes,
            AllowedRoutes {
                namespaces: AllowedNamespaces::Selector(Some(LabelSelector {
                    match_labels: Some(btreemap! { "team".to_string() => "a".to_string() }),
                    match_expressions: vec![LabelSelectorRequirement {
                        key: "env".to_string(),
                        operator: "Exists".to_string(),
                        values: vec![],
                    }],
                })),
                kinds: vec![RouteGroupKind {
                    group: None,
                    kind: "TLSRoute".to_string(),
                }],
            }
        );
    }

    #[test]
    fn gateway_without_status() {
        let gw = Gateway {
            metadata: ObjectMeta {
                namespace: Some("ns-0".to_string()),
                name: Some("gw".to_string()),
                ..Default::default()
            },
            spec: GatewaySpec {
                listeners: vec![GatewayListeners {
                    allowed_routes: Some(GatewayListenersAllowedRoutes {
                        namespaces: Some(GatewayListenersAllowedRoutesNamespaces {
                            from: Some(GatewayListenersAllowedRoutesNamespacesFrom::All),
                            selector: None,
                        }),
                        kinds: None,
                    }),
                    ..listener("web", "HTTPS", 443)
                }],
                ..Default::default()
            },
            status: None,
        };
        let converted = gateway(&gw);
        assert!(converted.addresses.is_empty());
        assert_eq!(
            converted.listeners[0].allowed_routes.namespaces,
            AllowedNamespaces::All
        );
    }

    #[test]
    fn converts_namespace() {
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some("team-a".to_string()),
                labels: Some(btreemap! { "team".to_string() => "a".to_string() }),
                ..Default::default()
            },
            ..Default::default()
        };
        let converted = namespace(&ns);
        assert_eq!(converted.name, "team-a");
        assert_eq!(converted.labels, Labels::from_iter(Some(("team", "a"))));
    }
}

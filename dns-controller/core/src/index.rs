use crate::gateway::{Gateway, Listener, Namespace};
use ahash::AHashMap as HashMap;

/// Lookup tables over one snapshot of Gateways and Namespaces.
///
/// The index borrows the snapshot and is rebuilt for every resolution pass.
#[derive(Debug, Default)]
pub struct GatewayIndex<'a> {
    /// Gateways by namespace, then name.
    gateways: HashMap<&'a str, HashMap<&'a str, GatewayListeners<'a>>>,
    namespaces: HashMap<&'a str, &'a Namespace>,
}

/// A Gateway with its listeners grouped by section name.
#[derive(Debug)]
pub struct GatewayListeners<'a> {
    pub gateway: &'a Gateway,

    /// Listeners by section name. The empty section name holds every listener.
    sections: HashMap<&'a str, &'a [Listener]>,
}

// === impl GatewayIndex ===

impl<'a> GatewayIndex<'a> {
    pub fn build(gateways: &'a [Gateway], namespaces: &'a [Namespace]) -> Self {
        let mut index = HashMap::<_, HashMap<_, _>>::new();
        for gateway in gateways {
            index
                .entry(gateway.id.namespace.as_str())
                .or_default()
                .insert(gateway.id.name.as_str(), GatewayListeners::new(gateway));
        }

        let namespaces = namespaces
            .iter()
            .map(|ns| (ns.name.as_str(), ns))
            .collect();

        Self {
            gateways: index,
            namespaces,
        }
    }

    pub fn gateway(&self, namespace: &str, name: &str) -> Option<&GatewayListeners<'a>> {
        self.gateways.get(namespace)?.get(name)
    }

    pub fn namespace(&self, name: &str) -> Option<&'a Namespace> {
        self.namespaces.get(name).copied()
    }
}

// === impl GatewayListeners ===

impl<'a> GatewayListeners<'a> {
    fn new(gateway: &'a Gateway) -> Self {
        let listeners = gateway.listeners.as_slice();
        let mut sections = HashMap::with_capacity(listeners.len() + 1);
        for (i, listener) in listeners.iter().enumerate() {
            sections.insert(listener.name.as_str(), &listeners[i..=i]);
        }
        sections.insert("", listeners);
        Self { gateway, sections }
    }

    /// Returns the listeners selected by `section_name`; the empty name selects all of them.
    pub fn section(&self, section_name: &str) -> &'a [Listener] {
        self.sections.get(section_name).copied().unwrap_or_default()
    }
}

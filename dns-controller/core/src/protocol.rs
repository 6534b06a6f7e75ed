use std::fmt;

/// A route or listener protocol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
    Tls,
    Tcp,
    Udp,
    /// An implementation-specific protocol, e.g. `example.com/custom`.
    Other(String),
}

// === impl Protocol ===

impl Protocol {
    /// Returns whether a route declaring `self` may attach to a listener declaring `listener`.
    ///
    /// HTTPS is treated as HTTP on both sides. A TLS listener additionally accepts TCP routes; a
    /// TCP listener does not accept TLS routes.
    pub fn is_compatible_with(&self, listener: &Protocol) -> bool {
        match (self.http_equivalent(), listener.http_equivalent()) {
            (Self::Tcp, Self::Tls) => true,
            (route, listener) => route == listener,
        }
    }

    fn http_equivalent(&self) -> &Self {
        match self {
            Self::Https => &Self::Http,
            protocol => protocol,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
            Self::Tls => "TLS",
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Other(protocol) => protocol,
        }
    }
}

impl From<&str> for Protocol {
    fn from(protocol: &str) -> Self {
        match protocol {
            "HTTP" => Self::Http,
            "HTTPS" => Self::Https,
            "TLS" => Self::Tls,
            "TCP" => Self::Tcp,
            "UDP" => Self::Udp,
            protocol => Self::Other(protocol.to_string()),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use crate::{route::Route, Annotations, BoxError};

/// Reads DNS configuration from resource annotations.
pub trait AnnotationExtractor {
    /// Hostnames a resource requests in addition to those in its spec.
    fn hostnames(&self, annotations: &Annotations) -> Vec<String>;

    /// Targets that replace a Gateway's status addresses. Empty when not overridden.
    fn targets(&self, annotations: &Annotations) -> Vec<String>;
}

/// Expands a configured hostname template against a route.
pub trait HostnameTemplate {
    fn execute(&self, route: &Route) -> Result<Vec<String>, BoxError>;
}

impl<F> HostnameTemplate for F
where
    F: Fn(&Route) -> Result<Vec<String>, BoxError>,
{
    fn execute(&self, route: &Route) -> Result<Vec<String>, BoxError> {
        (self)(route)
    }
}

/// Computes the candidate hostnames of a route from its spec, its annotations and, optionally, a
/// hostname template.
pub struct HostnameSource<A> {
    annotations: A,
    template: Option<Box<dyn HostnameTemplate + Send + Sync>>,
    combine_fqdn_annotation: bool,
    ignore_hostname_annotation: bool,
}

// === impl HostnameSource ===

impl<A: AnnotationExtractor> HostnameSource<A> {
    pub fn new(annotations: A) -> Self {
        Self {
            annotations,
            template: None,
            combine_fqdn_annotation: false,
            ignore_hostname_annotation: false,
        }
    }

    pub fn with_template(mut self, template: impl HostnameTemplate + Send + Sync + 'static) -> Self {
        self.template = Some(Box::new(template));
        self
    }

    /// Expands the template even when the route already has hostnames.
    pub fn combine_fqdn_annotation(mut self, combine: bool) -> Self {
        self.combine_fqdn_annotation = combine;
        self
    }

    pub fn ignore_hostname_annotation(mut self, ignore: bool) -> Self {
        self.ignore_hostname_annotation = ignore;
        self
    }

    pub fn annotations(&self) -> &A {
        &self.annotations
    }

    /// Returns the route's candidate hostnames.
    ///
    /// When the route's spec declares no hostnames, the list ends with an empty hostname so that
    /// the route inherits the hostnames of the listeners it attaches to.
    pub fn hosts(&self, route: &Route) -> Result<Vec<String>, BoxError> {
        let mut hostnames = route.hostnames.clone();

        if !self.ignore_hostname_annotation {
            hostnames.extend(self.annotations.hostnames(&route.annotations));
        }

        if let Some(template) = self.template.as_ref() {
            if hostnames.is_empty() || self.combine_fqdn_annotation {
                hostnames.extend(template.execute(route)?);
            }
        }

        if route.hostnames.is_empty() {
            hostnames.push(String::new());
        }

        Ok(hostnames)
    }
}

impl<A: std::fmt::Debug> std::fmt::Debug for HostnameSource<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostnameSource")
            .field("annotations", &self.annotations)
            .field("template", &self.template.is_some())
            .field("combine_fqdn_annotation", &self.combine_fqdn_annotation)
            .field("ignore_hostname_annotation", &self.ignore_hostname_annotation)
            .finish()
    }
}

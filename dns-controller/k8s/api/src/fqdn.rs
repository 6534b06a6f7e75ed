//! Hostname templates, e.g. `{{ .Name }}.{{ .Namespace }}.example.com`.
//!
//! A template is a comma-separated list of entries; each entry expands to one hostname.

use gateway_dns_core::{BoxError, HostnameTemplate, ResourceId, Route, RouteKind};
use regex::Regex;
use std::str::FromStr;

const PLACEHOLDER: &str = r"\{\{\s*\.(\w+)(?:\.([^\s{}]+))?\s*\}\}";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FqdnTemplate {
    entries: Vec<Vec<Segment>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Field {
    Name,
    Namespace,
    Kind,
    Label(String),
    Annotation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown template field {0:?}")]
    UnknownField(String),

    #[error("unbalanced braces in template {0:?}")]
    Unbalanced(String),

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{kind} {route} has no label {key:?}")]
    MissingLabel {
        route: ResourceId,
        kind: RouteKind,
        key: String,
    },

    #[error("{kind} {route} has no annotation {key:?}")]
    MissingAnnotation {
        route: ResourceId,
        kind: RouteKind,
        key: String,
    },
}

// === impl FqdnTemplate ===

impl FqdnTemplate {
    pub fn expand(&self, route: &Route) -> Result<Vec<String>, TemplateError> {
        let mut hostnames = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let mut hostname = String::new();
            for segment in entry {
                match segment {
                    Segment::Literal(s) => hostname.push_str(s),
                    Segment::Field(field) => hostname.push_str(field.value(route)?),
                }
            }
            let hostname = hostname.trim().trim_end_matches('.');
            if !hostname.is_empty() {
                hostnames.push(hostname.to_string());
            }
        }
        Ok(hostnames)
    }
}

impl FromStr for FqdnTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let placeholder = Regex::new(PLACEHOLDER)?;

        let mut entries = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut segments = Vec::new();
            let literal = |text: &str, segments: &mut Vec<Segment>| {
                if text.contains("{{") || text.contains("}}") {
                    return Err(TemplateError::Unbalanced(entry.to_string()));
                }
                if !text.is_empty() {
                    segments.push(Segment::Literal(text.to_string()));
                }
                Ok(())
            };

            let mut end = 0;
            for caps in placeholder.captures_iter(entry) {
                let (Some(all), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                literal(&entry[end..all.start()], &mut segments)?;
                segments.push(Segment::Field(Field::parse(
                    name.as_str(),
                    caps.get(2).map(|k| k.as_str()),
                )?));
                end = all.end();
            }
            literal(&entry[end..], &mut segments)?;

            entries.push(segments);
        }

        Ok(Self { entries })
    }
}

impl HostnameTemplate for FqdnTemplate {
    fn execute(&self, route: &Route) -> Result<Vec<String>, BoxError> {
        self.expand(route).map_err(Into::into)
    }
}

// === impl Field ===

impl Field {
    fn parse(name: &str, key: Option<&str>) -> Result<Self, TemplateError> {
        match (name, key) {
            ("Name", None) => Ok(Self::Name),
            ("Namespace", None) => Ok(Self::Namespace),
            ("Kind", None) => Ok(Self::Kind),
            ("Labels", Some(key)) => Ok(Self::Label(key.to_string())),
            ("Annotations", Some(key)) => Ok(Self::Annotation(key.to_string())),
            (name, None) => Err(TemplateError::UnknownField(name.to_string())),
            (name, Some(key)) => Err(TemplateError::UnknownField(format!("{name}.{key}"))),
        }
    }

    fn value<'r>(&self, route: &'r Route) -> Result<&'r str, TemplateError> {
        match self {
            Self::Name => Ok(route.id.name.as_str()),
            Self::Namespace => Ok(route.id.namespace.as_str()),
            Self::Kind => Ok(route.kind.kind()),
            Self::Label(key) => route
                .labels
                .as_ref()
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| TemplateError::MissingLabel {
                    route: route.id.clone(),
                    kind: route.kind,
                    key: key.clone(),
                }),
            Self::Annotation(key) => route
                .annotations
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| TemplateError::MissingAnnotation {
                    route: route.id.clone(),
                    kind: route.kind,
                    key: key.clone(),
                }),
        }
    }
}

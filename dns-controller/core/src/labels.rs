use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
    sync::Arc,
};

#[derive(Clone, Debug, Eq, Default)]
pub struct Labels(Arc<Map>);

pub type Map = BTreeMap<String, String>;

pub type Expressions = Vec<Expression>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// Selects a set of resources by their labels.
///
/// All `match_labels` pairs and all `match_expressions` must hold. An empty selector matches
/// everything.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Selector {
    match_labels: Option<Map>,
    match_expressions: Option<Expressions>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSelector {
    #[error("label selector key must not be empty")]
    EmptyKey,

    #[error("unknown label selector operator {0:?}")]
    UnknownOperator(String),

    #[error("operator {operator:?} on {key:?} requires values")]
    MissingValues { key: String, operator: Operator },

    #[error("operator {operator:?} on {key:?} must not have values")]
    UnexpectedValues { key: String, operator: Operator },

    #[error("invalid label selector requirement {0:?}")]
    InvalidRequirement(String),
}

// === Selector ===

impl Selector {
    pub fn from_expressions(exprs: Expressions) -> Self {
        Self {
            match_labels: None,
            match_expressions: Some(exprs),
        }
    }

    pub fn from_map(map: Map) -> Self {
        Self {
            match_labels: Some(map),
            match_expressions: None,
        }
    }

    /// Builds a selector from its structured form, validating each expression.
    pub fn try_new<I>(match_labels: Option<Map>, match_expressions: I) -> Result<Self, InvalidSelector>
    where
        I: IntoIterator<Item = (String, String, Vec<String>)>,
    {
        let exprs = match_expressions
            .into_iter()
            .map(|(key, operator, values)| Expression::try_new(key, &operator, values))
            .collect::<Result<Expressions, _>>()?;
        Ok(Self {
            match_labels,
            match_expressions: if exprs.is_empty() { None } else { Some(exprs) },
        })
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        self.matches_map(labels.as_ref())
    }

    /// Matches an arbitrary string map, e.g. a resource's annotations.
    pub fn matches_map(&self, labels: &Map) -> bool {
        for expr in self.match_expressions.iter().flatten() {
            if !expr.matches(labels) {
                return false;
            }
        }

        if let Some(match_labels) = self.match_labels.as_ref() {
            for (k, v) in match_labels.iter() {
                if labels.get(k) != Some(v) {
                    return false;
                }
            }
        }

        true
    }

    pub fn is_empty(&self) -> bool {
        self.match_labels.iter().all(Map::is_empty)
            && self.match_expressions.iter().all(Vec::is_empty)
    }
}

/// Parses an equality-based selector, e.g. `app=web,tier!=cache,managed,!legacy`.
impl FromStr for Selector {
    type Err = InvalidSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut match_labels = Map::new();
        let mut exprs = Expressions::new();

        for requirement in s.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            if let Some((key, value)) = requirement.split_once("!=") {
                let (key, value) = (key.trim(), value.trim());
                if key.starts_with('!') || value.contains(['=', '!']) {
                    return Err(InvalidSelector::InvalidRequirement(requirement.to_string()));
                }
                exprs.push(Expression::try_new(
                    key.to_string(),
                    "NotIn",
                    vec![value.to_string()],
                )?);
            } else if let Some((key, value)) = requirement
                .split_once("==")
                .or_else(|| requirement.split_once('='))
            {
                let (key, value) = (key.trim(), value.trim());
                if key.is_empty() {
                    return Err(InvalidSelector::EmptyKey);
                }
                if key.starts_with('!') || value.contains(['=', '!']) {
                    return Err(InvalidSelector::InvalidRequirement(requirement.to_string()));
                }
                match_labels.insert(key.to_string(), value.to_string());
            } else if let Some(key) = requirement.strip_prefix('!') {
                exprs.push(Expression::try_new(key.trim().to_string(), "DoesNotExist", vec![])?);
            } else if requirement.contains(char::is_whitespace) {
                return Err(InvalidSelector::InvalidRequirement(requirement.to_string()));
            } else {
                exprs.push(Expression::try_new(requirement.to_string(), "Exists", vec![])?);
            }
        }

        Ok(Self {
            match_labels: if match_labels.is_empty() { None } else { Some(match_labels) },
            match_expressions: if exprs.is_empty() { None } else { Some(exprs) },
        })
    }
}

impl std::iter::FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl std::iter::FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self::from_expressions(iter.into_iter().collect())
    }
}

// === Labels ===

impl From<Map> for Labels {
    #[inline]
    fn from(labels: Map) -> Self {
        Self(Arc::new(labels))
    }
}

impl AsRef<Map> for Labels {
    #[inline]
    fn as_ref(&self) -> &Map {
        self.0.as_ref()
    }
}

impl<T: AsRef<Map>> std::cmp::PartialEq<T> for Labels {
    #[inline]
    fn eq(&self, t: &T) -> bool {
        self.0.as_ref().eq(t.as_ref())
    }
}

impl std::iter::FromIterator<(String, String)> for Labels {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Labels {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

// === Expression ===

impl Expression {
    pub fn try_new(
        key: String,
        operator: &str,
        values: impl IntoIterator<Item = String>,
    ) -> Result<Self, InvalidSelector> {
        if key.is_empty() {
            return Err(InvalidSelector::EmptyKey);
        }
        let operator = operator.parse::<Operator>()?;
        let values = values.into_iter().collect::<BTreeSet<_>>();
        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                Err(InvalidSelector::MissingValues { key, operator })
            }
            Operator::Exists | Operator::DoesNotExist if !values.is_empty() => {
                Err(InvalidSelector::UnexpectedValues { key, operator })
            }
            operator => Ok(Self {
                key,
                operator,
                values,
            }),
        }
    }

    fn matches(&self, labels: &Map) -> bool {
        match self.operator {
            Operator::In => labels
                .get(&self.key)
                .map(|v| self.values.contains(v))
                .unwrap_or(false),
            Operator::NotIn => labels
                .get(&self.key)
                .map(|v| !self.values.contains(v))
                .unwrap_or(true),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}

// === Operator ===

impl FromStr for Operator {
    type Err = InvalidSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            "Exists" => Ok(Self::Exists),
            "DoesNotExist" => Ok(Self::DoesNotExist),
            op => Err(InvalidSelector::UnknownOperator(op.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::FromIterator;

    fn expr(key: &str, operator: &str, values: &[&str]) -> Expression {
        Expression::try_new(
            key.to_string(),
            operator,
            values.iter().map(|v| v.to_string()),
        )
        .expect("valid expression")
    }

    #[test]
    fn test_matches() {
        for (selector, labels, matches, msg) in &[
            (Selector::default(), Labels::default(), true, "empty match"),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                Labels::from_iter(Some(("foo", "bar"))),
                true,
                "exact label match",
            ),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                Labels::from_iter(vec![("foo", "bar"), ("bah", "baz")]),
                true,
                "sufficient label match",
            ),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                Labels::from_iter(Some(("foo", "baz"))),
                false,
                "label mismatch",
            ),
            (
                Selector::from_iter(Some(expr("foo", "In", &["bar"]))),
                Labels::from_iter(vec![("foo", "bar"), ("bah", "baz")]),
                true,
                "expression match",
            ),
            (
                Selector::from_iter(Some(expr("foo", "NotIn", &["bar"]))),
                Labels::from_iter(Some(("foo", "bar"))),
                false,
                "not-in excludes",
            ),
            (
                Selector::from_iter(Some(expr("foo", "NotIn", &["bar"]))),
                Labels::default(),
                true,
                "not-in admits missing key",
            ),
            (
                Selector::from_iter(Some(expr("foo", "Exists", &[]))),
                Labels::from_iter(Some(("foo", ""))),
                true,
                "exists",
            ),
            (
                Selector::from_iter(Some(expr("foo", "DoesNotExist", &[]))),
                Labels::from_iter(Some(("foo", "bar"))),
                false,
                "does not exist",
            ),
        ] {
            assert_eq!(selector.matches(labels), *matches, "{}", msg);
        }
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert_eq!(
            Expression::try_new("foo".into(), "Matches", None),
            Err(InvalidSelector::UnknownOperator("Matches".into()))
        );
        assert!(matches!(
            Expression::try_new("foo".into(), "In", None),
            Err(InvalidSelector::MissingValues { .. })
        ));
        assert!(matches!(
            Expression::try_new("foo".into(), "Exists", Some("bar".to_string())),
            Err(InvalidSelector::UnexpectedValues { .. })
        ));
        assert_eq!(
            Expression::try_new(String::new(), "Exists", None),
            Err(InvalidSelector::EmptyKey)
        );
    }

    #[test]
    fn parses_equality_selectors() {
        let selector = "app=web, tier!=cache,managed,!legacy"
            .parse::<Selector>()
            .expect("valid selector");
        assert!(selector.matches(&Labels::from_iter(vec![("app", "web"), ("managed", "true")])));
        assert!(!selector.matches(&Labels::from_iter(vec![
            ("app", "web"),
            ("managed", "true"),
            ("tier", "cache"),
        ])));
        assert!(!selector.matches(&Labels::from_iter(vec![
            ("app", "web"),
            ("managed", "true"),
            ("legacy", "yes"),
        ])));
        assert!(!selector.matches(&Labels::from_iter(Some(("app", "web")))));

        assert_eq!(
            "a==b".parse::<Selector>(),
            Ok(Selector::from_iter(Some(("a", "b"))))
        );
        assert!("".parse::<Selector>().expect("empty selector").is_empty());
        assert_eq!("=b".parse::<Selector>(), Err(InvalidSelector::EmptyKey));
        assert!("a in (b)".parse::<Selector>().is_err());
    }

    #[test]
    fn rejects_ambiguous_equality_requirements() {
        for selector in ["a=b=c", "a==b=c", "!a=b", "a!=b=c", "!a!=b", "a=!b"] {
            assert_eq!(
                selector.parse::<Selector>(),
                Err(InvalidSelector::InvalidRequirement(selector.to_string())),
                "{selector}"
            );
        }
    }
}

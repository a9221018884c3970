//! Context-variable bindings threaded through matching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A flat map from context-variable name to the text it must match.
///
/// Contexts are never mutated while matching. Entering a block or a nested
/// construct produces an [`extended`](Self::extended) copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, String>);

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns a copy of this context with `name` bound to `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the text bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns a new context holding these bindings overlaid by `other`.
    #[must_use]
    pub fn extended(&self, other: &Self) -> Self {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    /// Returns whether no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_prefers_the_inner_binding() {
        let outer = Context::new().with("table", "users").with("db", "conn");
        let inner = Context::new().with("table", "orders");

        let merged = outer.extended(&inner);

        assert_eq!(merged.get("table"), Some("orders"));
        assert_eq!(merged.get("db"), Some("conn"));
        assert_eq!(outer.get("table"), Some("users"));
    }

    #[test]
    fn serialises_as_a_plain_object() {
        let context: Context = [("pl", "polars")].into_iter().collect();
        let json = serde_json::to_string(&context).expect("serialise");
        assert_eq!(json, r#"{"pl":"polars"}"#);
    }
}

//! Compiled patterns.

mod decorators;
mod node;

use std::collections::BTreeMap;
use std::fmt;

use prism_syntax::SupportedLanguage;
use serde::{Deserialize, Serialize};

pub use decorators::{AggregationDecorator, ChainDecorator};
pub use node::{ANY_KIND, PatternNode};

use crate::template::Template;

/// Index of a pattern inside a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternId(usize);

impl PatternId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How many entries an aggregation accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// No entry or exactly one.
    ZeroToOne,
    /// Any number of entries.
    #[default]
    ZeroToMany,
    /// At least one entry.
    OneToMany,
}

impl Cardinality {
    /// Returns whether `count` entries are allowed.
    #[must_use]
    pub const fn allows(self, count: usize) -> bool {
        match self {
            Self::ZeroToOne => count <= 1,
            Self::ZeroToMany => true,
            Self::OneToMany => count >= 1,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ZeroToOne => "0..1",
            Self::ZeroToMany => "0..n",
            Self::OneToMany => "1..n",
        })
    }
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    language: SupportedLanguage,
    root: PatternNode,
    priority: usize,
    aggregations: BTreeMap<String, AggregationDecorator>,
    chains: BTreeMap<String, ChainDecorator>,
    template: Template,
}

impl Pattern {
    pub(crate) fn new(template: Template, root: PatternNode) -> Self {
        let priority = root.literal_leaf_count();
        Self {
            name: template.name().to_owned(),
            language: template.language(),
            root,
            priority,
            aggregations: BTreeMap::new(),
            chains: BTreeMap::new(),
            template,
        }
    }

    /// Returns the pattern name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the language the pattern matches.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the root of the pattern tree.
    #[must_use]
    pub const fn root(&self) -> &PatternNode {
        &self.root
    }

    /// Returns the number of literal leaves, used to order candidates.
    #[must_use]
    pub const fn priority(&self) -> usize {
        self.priority
    }

    /// Returns the template the pattern was compiled from.
    #[must_use]
    pub const fn template(&self) -> &Template {
        &self.template
    }

    /// Returns the decorator of the named aggregation.
    #[must_use]
    pub fn aggregation(&self, name: &str) -> Option<&AggregationDecorator> {
        self.aggregations.get(name)
    }

    /// Returns the decorator of the named chain.
    #[must_use]
    pub fn chain(&self, name: &str) -> Option<&ChainDecorator> {
        self.chains.get(name)
    }

    /// Iterates over the aggregation decorators by name.
    pub fn aggregations(&self) -> impl Iterator<Item = (&str, &AggregationDecorator)> {
        self.aggregations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the chain decorators by name.
    pub fn chains(&self) -> impl Iterator<Item = (&str, &ChainDecorator)> {
        self.chains.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) const fn root_mut(&mut self) -> &mut PatternNode {
        &mut self.root
    }

    pub(crate) fn decorate_aggregation(&mut self, name: String, decorator: AggregationDecorator) {
        self.aggregations.insert(name, decorator);
    }

    pub(crate) fn decorate_chain(&mut self, name: String, decorator: ChainDecorator) {
        self.chains.insert(name, decorator);
    }

    pub(crate) fn aggregation_mut(&mut self, name: &str) -> Option<&mut AggregationDecorator> {
        self.aggregations.get_mut(name)
    }

    pub(crate) fn chain_mut(&mut self, name: &str) -> Option<&mut ChainDecorator> {
        self.chains.get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Cardinality::ZeroToOne, 0, true)]
    #[case(Cardinality::ZeroToOne, 2, false)]
    #[case(Cardinality::ZeroToMany, 0, true)]
    #[case(Cardinality::ZeroToMany, 7, true)]
    #[case(Cardinality::OneToMany, 0, false)]
    #[case(Cardinality::OneToMany, 3, true)]
    fn cardinality_bounds_entry_count(
        #[case] cardinality: Cardinality,
        #[case] count: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(cardinality.allows(count), expected);
    }
}

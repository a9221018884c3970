//! Pattern tree nodes.

use prism_syntax::LanguageProfile;

use crate::context::Context;
use crate::pattern::Cardinality;

/// Root kind that matches any concrete node kind.
pub const ANY_KIND: &str = "*";

/// A node of a compiled pattern tree.
///
/// Children are owned, so every node except the root has exactly one parent.
/// Each variant records the field name it occupies in its parent; the
/// matcher requires the concrete node to sit in the same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// A concrete node that must match by kind and either leaf text or
    /// children.
    Regular {
        /// Concrete node kind.
        kind: &'static str,
        /// Field name in the parent.
        field: Option<&'static str>,
        /// Literal text, present for leaves only.
        text: Option<String>,
        /// Texts of anonymous tokens that sit in a field, such as the
        /// `operator` of a binary expression.
        operators: Vec<String>,
        /// Named children in source order.
        children: Vec<PatternNode>,
    },
    /// Binds any concrete node whose kind is allowed.
    Argument {
        /// Binding name.
        name: String,
        /// Allowed concrete kinds.
        kinds: Vec<String>,
        /// Field name in the parent.
        field: Option<&'static str>,
    },
    /// Matches the language's block node and captures its range.
    Block {
        /// Field name in the parent.
        field: Option<&'static str>,
        /// Bindings active inside the block.
        context: Context,
    },
    /// Matches an aggregatable node and checks every entry against the
    /// aggregation's part patterns.
    Aggregation {
        /// Aggregation name, the key of its decorator.
        name: String,
        /// Aggregatable node kind.
        node_kind: String,
        /// Field name in the parent.
        field: Option<&'static str>,
        /// Whether the first child must match the start pattern.
        has_start: bool,
        /// Allowed number of entries.
        cardinality: Cardinality,
        /// Bindings active inside each entry.
        context: Context,
    },
    /// Matches a chain of links that bottoms out in the start pattern.
    Chain {
        /// Chain name, the key of its decorator.
        name: String,
        /// Field name in the parent.
        field: Option<&'static str>,
        /// Minimum number of links.
        min_links: usize,
        /// Bindings active inside the chain.
        context: Context,
    },
    /// Marks where a link's receiver continues the chain. Matches anything.
    ChainContinuation {
        /// Field name in the parent.
        field: Option<&'static str>,
    },
    /// Matches an identifier whose text is bound in the caller's context.
    ContextVariable {
        /// Variable name.
        name: String,
        /// Concrete kind at the placeholder, checked when unbound.
        kind: &'static str,
        /// Field name in the parent.
        field: Option<&'static str>,
    },
}

impl PatternNode {
    /// Returns the field name this node occupies in its parent.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Regular { field, .. }
            | Self::Argument { field, .. }
            | Self::Block { field, .. }
            | Self::Aggregation { field, .. }
            | Self::Chain { field, .. }
            | Self::ChainContinuation { field }
            | Self::ContextVariable { field, .. } => *field,
        }
    }

    /// Replaces the field name.
    pub const fn set_field(&mut self, new_field: Option<&'static str>) {
        match self {
            Self::Regular { field, .. }
            | Self::Argument { field, .. }
            | Self::Block { field, .. }
            | Self::Aggregation { field, .. }
            | Self::Chain { field, .. }
            | Self::ChainContinuation { field }
            | Self::ContextVariable { field, .. } => *field = new_field,
        }
    }

    /// Returns the children of a regular node; other variants have none.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Regular { children, .. } => children,
            _ => &[],
        }
    }

    /// Returns the text of a regular leaf.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Regular { text, .. } => text.as_deref(),
            _ => None,
        }
    }

    /// Counts the regular leaves below and including this node.
    ///
    /// This is the pattern's priority: the more literal source a pattern
    /// pins down, the earlier it is tried.
    #[must_use]
    pub fn literal_leaf_count(&self) -> usize {
        match self {
            Self::Regular { children, .. } if children.is_empty() => 1,
            Self::Regular { children, .. } => children.iter().map(Self::literal_leaf_count).sum(),
            _ => 0,
        }
    }

    /// Returns the concrete kinds this node can match when it is a
    /// pattern's root. [`ANY_KIND`] stands for every kind.
    #[must_use]
    pub fn root_kinds(&self, profile: &LanguageProfile) -> Vec<String> {
        match self {
            Self::Regular { kind, .. } => vec![(*kind).to_owned()],
            Self::Argument { kinds, .. } => kinds.clone(),
            Self::Block { .. } => vec![profile.block().kind.to_owned()],
            Self::Aggregation { node_kind, .. } => vec![node_kind.clone()],
            Self::Chain { .. } => profile
                .chains()
                .chainables
                .iter()
                .map(|entry| entry.kind.to_owned())
                .collect(),
            Self::ChainContinuation { .. } => vec![ANY_KIND.to_owned()],
            Self::ContextVariable { kind, .. } => vec![(*kind).to_owned()],
        }
    }

    /// Follows child indices from this node.
    #[must_use]
    pub fn follow(&self, path: &[usize]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |current, &step| current.children().get(step))
    }

    /// Follows child indices from this node, mutably.
    pub fn follow_mut(&mut self, path: &[usize]) -> Option<&mut Self> {
        path.iter().try_fold(self, |current, &step| match current {
            Self::Regular { children, .. } => children.get_mut(step),
            _ => None,
        })
    }

    /// Returns the pre-order path to the first regular leaf with `text`.
    #[must_use]
    pub fn path_to_text(&self, text: &str) -> Option<Vec<usize>> {
        if self.text() == Some(text) {
            return Some(Vec::new());
        }
        self.children().iter().enumerate().find_map(|(index, child)| {
            child.path_to_text(text).map(|mut path| {
                path.insert(0, index);
                path
            })
        })
    }

    /// Visits this node and its descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

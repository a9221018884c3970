//! Results of verifying a pattern against a concrete node.

use std::collections::BTreeMap;
use std::ops::Range;

use prism_syntax::node_text;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tree_sitter::Node;

use crate::context::Context;
use crate::pattern::{Cardinality, PatternId};

/// A half-open byte range in the matched source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodeRange {
    /// Inclusive start offset.
    pub from: usize,
    /// Exclusive end offset.
    pub to: usize,
}

impl CodeRange {
    /// Creates a range; `to` is clamped so the range is never inverted.
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to: if to < from { from } else { to },
        }
    }

    /// Returns the range a node covers.
    #[must_use]
    pub fn of(node: Node<'_>) -> Self {
        Self::new(node.start_byte(), node.end_byte())
    }

    /// Returns the number of bytes covered.
    #[must_use]
    pub const fn len(self) -> usize {
        self.to.saturating_sub(self.from)
    }

    /// Returns whether the range covers nothing.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.from == self.to
    }

    /// Returns whether the two ranges share at least one offset, or touch
    /// when either is empty.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    /// Returns the range as a [`Range`].
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.from..self.to
    }
}

impl From<Range<usize>> for CodeRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// A source range that activates context bindings, such as the inside of a
/// block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRange {
    /// Inclusive start offset.
    pub from: usize,
    /// Exclusive end offset.
    pub to: usize,
    /// Bindings active inside the range.
    pub context: Context,
}

impl ContextRange {
    pub(crate) const fn new(range: CodeRange, context: Context) -> Self {
        Self {
            from: range.from,
            to: range.to,
            context,
        }
    }
}

/// A block captured by a match.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMatch<'t> {
    /// The concrete block node.
    pub node: Node<'t>,
    /// Editable range inside the block.
    pub range: CodeRange,
    /// Bindings active inside the block, the outer context included.
    pub context: Context,
}

/// A successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'t> {
    /// The matched pattern.
    pub pattern: PatternId,
    /// Name of the matched pattern.
    pub name: String,
    /// The concrete node the pattern root matched.
    pub node: Node<'t>,
    /// Range of the matched node.
    pub range: CodeRange,
    /// Nodes bound by the pattern's arguments.
    pub bindings: BTreeMap<String, Node<'t>>,
    /// Blocks in source order.
    pub blocks: Vec<BlockMatch<'t>>,
    /// Link ranges of each chain, innermost link first.
    pub chains: BTreeMap<String, Vec<CodeRange>>,
    /// Entry ranges of each aggregation.
    pub aggregations: BTreeMap<String, Vec<CodeRange>>,
    /// Range of each aggregation's start expression.
    pub aggregation_starts: BTreeMap<String, CodeRange>,
    /// Context the match was verified in.
    pub context: Context,
    /// Ranges where the pattern activates extra bindings.
    pub context_ranges: Vec<ContextRange>,
    pub(crate) nested: Vec<Self>,
}

impl<'t> Match<'t> {
    /// Returns the matches found in aggregation entries and chains.
    #[must_use]
    pub fn nested(&self) -> &[Self] {
        &self.nested
    }

    /// Returns the node bound under `name`.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<Node<'t>> {
        self.bindings.get(name).copied()
    }

    /// Returns the text bound under `name`.
    #[must_use]
    pub fn binding_text<'s>(&self, name: &str, source: &'s str) -> Option<&'s str> {
        self.binding(name).map(|node| node_text(node, source))
    }

    /// Detaches the match from the tree so it can outlive it.
    #[must_use]
    pub fn to_record(&self, source: &str) -> MatchRecord {
        MatchRecord {
            pattern: self.name.clone(),
            range: self.range,
            bindings: self
                .bindings
                .iter()
                .map(|(name, node)| (name.clone(), BoundNode::new(*node, source)))
                .collect(),
            blocks: self
                .blocks
                .iter()
                .map(|block| ContextRange::new(block.range, block.context.clone()))
                .collect(),
            chains: self.chains.clone(),
            aggregations: self.aggregations.clone(),
            aggregation_starts: self.aggregation_starts.clone(),
        }
    }
}

/// A concrete node bound by an argument, detached from its tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundNode {
    /// Concrete node kind.
    pub kind: String,
    /// Covered range.
    pub range: CodeRange,
    /// Source text of the node.
    pub text: String,
}

impl BoundNode {
    fn new(node: Node<'_>, source: &str) -> Self {
        Self {
            kind: node.kind().to_owned(),
            range: CodeRange::of(node),
            text: node_text(node, source).to_owned(),
        }
    }
}

/// An owned, serialisable form of a [`Match`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Name of the matched pattern.
    pub pattern: String,
    /// Range of the matched node.
    pub range: CodeRange,
    /// Bound nodes by argument name.
    pub bindings: BTreeMap<String, BoundNode>,
    /// Editable block ranges with their bindings.
    pub blocks: Vec<ContextRange>,
    /// Link ranges of each chain.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chains: BTreeMap<String, Vec<CodeRange>>,
    /// Entry ranges of each aggregation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregations: BTreeMap<String, Vec<CodeRange>>,
    /// Start ranges of each aggregation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregation_starts: BTreeMap<String, CodeRange>,
}

/// Why a pattern did not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MismatchReason {
    /// The concrete node is a syntax error.
    #[error("syntax error at {range:?}")]
    SyntaxError {
        /// Range of the error node.
        range: CodeRange,
    },

    /// The concrete node sits in another field of its parent.
    #[error("expected field {expected:?}, found {found:?}")]
    Field {
        /// Field recorded in the pattern.
        expected: Option<&'static str>,
        /// Field of the concrete node.
        found: Option<&'static str>,
    },

    /// The concrete node has the wrong kind.
    #[error("expected kind '{expected}', found '{found}'")]
    Kind {
        /// Allowed kinds, joined with `|`.
        expected: String,
        /// Kind of the concrete node.
        found: String,
    },

    /// A leaf's text differs.
    #[error("expected text '{expected}', found '{found}'")]
    Text {
        /// Text recorded in the pattern.
        expected: String,
        /// Text of the concrete leaf.
        found: String,
    },

    /// Anonymous tokens in fields, such as operators, differ.
    #[error("expected operators {expected:?}, found {found:?}")]
    Operators {
        /// Operators recorded in the pattern.
        expected: Vec<String>,
        /// Operators of the concrete node.
        found: Vec<String>,
    },

    /// The concrete node has a different number of named children.
    #[error("expected {expected} children, found {found}")]
    ChildCount {
        /// Children in the pattern.
        expected: usize,
        /// Named children of the concrete node.
        found: usize,
    },

    /// A bound context variable names another identifier.
    #[error("context variable '{name}' expects '{expected}', found '{found}'")]
    ContextVariable {
        /// Variable name.
        name: String,
        /// Bound text.
        expected: String,
        /// Text of the concrete node.
        found: String,
    },

    /// An aggregation holds a number of entries its cardinality forbids.
    #[error("aggregation '{name}' has {count} entries, allowed {cardinality}")]
    Cardinality {
        /// Aggregation name.
        name: String,
        /// Number of entries found.
        count: usize,
        /// Allowed number of entries.
        cardinality: Cardinality,
    },

    /// The start expression of an aggregation does not match.
    #[error("start of aggregation '{name}' does not match")]
    UnmatchedStart {
        /// Aggregation name.
        name: String,
    },

    /// A chain element is neither a link nor the start.
    #[error("chain '{name}' breaks at {range:?}")]
    BrokenChain {
        /// Chain name.
        name: String,
        /// Range of the unmatched element.
        range: CodeRange,
    },

    /// A chain has fewer links than required.
    #[error("chain '{name}' has {found} links, needs {required}")]
    ChainTooShort {
        /// Chain name.
        name: String,
        /// Links found.
        found: usize,
        /// Required minimum.
        required: usize,
    },

    /// A decorator refers to a pattern the registry does not hold.
    #[error("pattern {id} is not in the registry")]
    UnknownPattern {
        /// The missing id.
        id: PatternId,
    },
}

/// A failed verification with the bindings made before it failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Mismatch {
    /// Why verification stopped.
    pub reason: MismatchReason,
    /// Argument bindings recorded before the failure.
    pub bindings: BTreeMap<String, CodeRange>,
}

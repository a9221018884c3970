//! Pattern matching over concrete syntax trees.
//!
//! [`PatternMatcher::execute`] walks a tree depth-first and tries the
//! registry's top-level patterns at every node. The first pattern that
//! verifies claims the node: its match is emitted, followed by the matches
//! found inside its aggregations and chains, and then each captured block is
//! scanned again with the block's context. The other children of a matched
//! node are not visited.

mod outcome;
mod verify;

use prism_syntax::node_text;
use tracing::{debug, trace};
use tree_sitter::Node;

pub use outcome::{
    BlockMatch, BoundNode, CodeRange, ContextRange, Match, MatchRecord, Mismatch, MismatchReason,
};

use crate::context::Context;
use crate::pattern::PatternId;
use crate::registry::PatternRegistry;

const MATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::matcher");

/// Everything one traversal found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchingResult<'t> {
    /// Matches in emission order. Nested matches follow the match that
    /// contains them and carry no nested matches of their own.
    pub matches: Vec<Match<'t>>,
    /// Ranges where matched patterns activate context bindings.
    pub context_ranges: Vec<ContextRange>,
}

impl MatchingResult<'_> {
    /// Detaches the matches from the tree.
    #[must_use]
    pub fn to_records(&self, source: &str) -> Vec<MatchRecord> {
        self.matches
            .iter()
            .map(|found| found.to_record(source))
            .collect()
    }
}

/// Matches the patterns of a frozen registry against one source text.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher<'a> {
    registry: &'a PatternRegistry,
    source: &'a str,
}

impl<'a> PatternMatcher<'a> {
    /// Creates a matcher for trees parsed from `source`.
    #[must_use]
    pub const fn new(registry: &'a PatternRegistry, source: &'a str) -> Self {
        Self { registry, source }
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &'a PatternRegistry {
        self.registry
    }

    /// Returns the source the trees were parsed from.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.source
    }

    /// Scans `root` and everything below it.
    #[must_use]
    pub fn execute<'t>(&self, root: Node<'t>, context: &Context) -> MatchingResult<'t> {
        let mut result = MatchingResult::default();
        self.scan(root, context, &mut result);
        debug!(
            target: MATCH_TARGET,
            root = root.kind(),
            matches = result.matches.len(),
            context_ranges = result.context_ranges.len(),
            "matching pass finished"
        );
        result
    }

    /// Tries the top-level patterns at `node` only, without descending.
    #[must_use]
    pub fn execute_spanning<'t>(&self, node: Node<'t>, context: &Context) -> MatchingResult<'t> {
        let mut result = MatchingResult::default();
        if let Some(found) = self.first_match(node, context) {
            self.emit(found, &mut result);
        }
        result
    }

    /// Verifies the pattern `id` against `node`.
    ///
    /// # Errors
    ///
    /// Returns a [`Mismatch`] describing the first difference, with the
    /// bindings made up to that point.
    pub fn verify<'t>(
        &self,
        id: PatternId,
        node: Node<'t>,
        context: &Context,
    ) -> Result<Match<'t>, Mismatch> {
        verify::verify(self, id, node, context)
    }

    fn scan<'t>(&self, node: Node<'t>, context: &Context, result: &mut MatchingResult<'t>) {
        if let Some(found) = self.first_match(node, context) {
            self.emit(found, result);
            return;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        for child in children {
            self.scan(child, context, result);
        }
    }

    fn first_match<'t>(&self, node: Node<'t>, context: &Context) -> Option<Match<'t>> {
        self.registry
            .candidates(node.kind())
            .into_iter()
            .find_map(|id| match self.verify(id, node, context) {
                Ok(found) => {
                    debug!(
                        target: MATCH_TARGET,
                        pattern = %found.name,
                        from = found.range.from,
                        to = found.range.to,
                        "pattern matched"
                    );
                    Some(found)
                }
                Err(mismatch) => {
                    trace!(
                        target: MATCH_TARGET,
                        pattern = %id,
                        kind = node.kind(),
                        text = node_text(node, self.source),
                        reason = %mismatch,
                        "pattern rejected"
                    );
                    None
                }
            })
    }

    fn emit<'t>(&self, mut found: Match<'t>, result: &mut MatchingResult<'t>) {
        let nested = std::mem::take(&mut found.nested);
        let blocks = found.blocks.clone();
        result
            .context_ranges
            .extend(found.context_ranges.iter().cloned());
        result.matches.push(found);

        for inner in nested {
            self.emit(inner, result);
        }
        for block in blocks {
            let mut cursor = block.node.walk();
            let statements: Vec<_> = block.node.named_children(&mut cursor).collect();
            for statement in statements {
                self.scan(statement, &block.context, result);
            }
        }
    }
}

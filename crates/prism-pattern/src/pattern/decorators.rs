//! Sub-pattern sets attached to a pattern's aggregations and chains.
//!
//! Decorators refer to their sub-patterns by [`PatternId`], so a part or a
//! link may be a pattern that is registered later under a name.

use crate::pattern::PatternId;

/// The parts and the optional start pattern of one aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationDecorator {
    /// Aggregatable node kind.
    pub node_kind: String,
    /// Patterns a single entry may match, tried in order.
    pub parts: Vec<PatternId>,
    /// Pattern the leading start expression must match.
    pub start: Option<PatternId>,
}

/// The start and link patterns of one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDecorator {
    /// Pattern the innermost receiver must match.
    pub start: PatternId,
    /// Patterns a single link may match, tried in order.
    pub links: Vec<PatternId>,
}

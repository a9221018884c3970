//! Structural verification of one pattern against one concrete node.

use std::collections::BTreeMap;

use prism_syntax::tree_path::{children_with_fields, follow, unwrap_parenthesized_call};
use prism_syntax::{BlockRangeStyle, EMPTY_ARGUMENT_PREFIX, LanguageProfile, is_error_node, node_text};
use tracing::trace;
use tree_sitter::Node;

use crate::context::Context;
use crate::pattern::{ANY_KIND, Cardinality, Pattern, PatternId, PatternNode};

use super::PatternMatcher;
use super::outcome::{BlockMatch, CodeRange, ContextRange, Match, Mismatch, MismatchReason};

const VERIFY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::verify");

type Verdict = Result<(), MismatchReason>;

/// Field of a pattern child whose preceding comments are ignored.
const BODY_FIELD: &str = "body";

/// Verifies pattern `id` at `node`.
pub(super) fn verify<'t>(
    matcher: &PatternMatcher<'_>,
    id: PatternId,
    node: Node<'t>,
    context: &Context,
) -> Result<Match<'t>, Mismatch> {
    let pattern = matcher.registry().get(id).ok_or_else(|| Mismatch {
        reason: MismatchReason::UnknownPattern { id },
        bindings: BTreeMap::new(),
    })?;
    let mut verifier = Verifier::new(matcher, pattern, context);
    match verifier.visit(pattern.root(), node, None) {
        Ok(()) => Ok(verifier.finish(id, node)),
        Err(reason) => Err(verifier.fail(reason)),
    }
}

struct Verifier<'m, 'a, 't> {
    matcher: &'m PatternMatcher<'a>,
    profile: &'static LanguageProfile,
    pattern: &'a Pattern,
    context: &'m Context,
    bindings: BTreeMap<String, Node<'t>>,
    blocks: Vec<BlockMatch<'t>>,
    chains: BTreeMap<String, Vec<CodeRange>>,
    aggregations: BTreeMap<String, Vec<CodeRange>>,
    aggregation_starts: BTreeMap<String, CodeRange>,
    context_ranges: Vec<ContextRange>,
    nested: Vec<Match<'t>>,
}

impl<'m, 'a, 't> Verifier<'m, 'a, 't> {
    fn new(matcher: &'m PatternMatcher<'a>, pattern: &'a Pattern, context: &'m Context) -> Self {
        Self {
            matcher,
            profile: matcher.registry().language().profile(),
            pattern,
            context,
            bindings: BTreeMap::new(),
            blocks: Vec::new(),
            chains: BTreeMap::new(),
            aggregations: BTreeMap::new(),
            aggregation_starts: BTreeMap::new(),
            context_ranges: Vec::new(),
            nested: Vec::new(),
        }
    }

    fn finish(self, id: PatternId, node: Node<'t>) -> Match<'t> {
        Match {
            pattern: id,
            name: self.pattern.name().to_owned(),
            node,
            range: CodeRange::of(node),
            bindings: self.bindings,
            blocks: self.blocks,
            chains: self.chains,
            aggregations: self.aggregations,
            aggregation_starts: self.aggregation_starts,
            context: self.context.clone(),
            context_ranges: self.context_ranges,
            nested: self.nested,
        }
    }

    fn fail(self, reason: MismatchReason) -> Mismatch {
        Mismatch {
            reason,
            bindings: self
                .bindings
                .into_iter()
                .map(|(name, node)| (name, CodeRange::of(node)))
                .collect(),
        }
    }

    fn source(&self) -> &'a str {
        self.matcher.source()
    }

    /// Checks `node` against `expected`. `field` is the concrete node's
    /// field in its parent; it is `None` for the pattern root, whose field
    /// is not checked.
    fn visit(
        &mut self,
        expected: &'a PatternNode,
        node: Node<'t>,
        field: Option<Option<&'static str>>,
    ) -> Verdict {
        let node = unwrap_parenthesized_call(node);
        if is_error_node(node) {
            return Err(MismatchReason::SyntaxError {
                range: CodeRange::of(node),
            });
        }
        if let Some(found) = field.filter(|found| *found != expected.field()) {
            return Err(MismatchReason::Field {
                expected: expected.field(),
                found,
            });
        }

        match expected {
            PatternNode::Regular {
                kind,
                text,
                operators,
                children,
                ..
            } => self.visit_regular(kind, text.as_deref(), operators, children, node),
            PatternNode::Argument { name, kinds, .. } => {
                self.bindings.insert(name.clone(), node);
                let found = clean_kind(node, self.source());
                if kinds.iter().any(|kind| kind == ANY_KIND || kind == found) {
                    Ok(())
                } else {
                    Err(MismatchReason::Kind {
                        expected: kinds.join("|"),
                        found: found.to_owned(),
                    })
                }
            }
            PatternNode::ContextVariable { name, kind, .. } => {
                self.visit_context_variable(name, kind, node)
            }
            PatternNode::Block { context, .. } => self.visit_block(context, node),
            PatternNode::Aggregation {
                name,
                node_kind,
                has_start,
                cardinality,
                context,
                ..
            } => self.visit_aggregation(name, node_kind, *has_start, *cardinality, context, node),
            PatternNode::Chain {
                name,
                min_links,
                context,
                ..
            } => self.visit_chain(name, *min_links, context, node),
            PatternNode::ChainContinuation { .. } => Ok(()),
        }
    }

    fn visit_regular(
        &mut self,
        kind: &str,
        text: Option<&str>,
        operators: &[String],
        children: &'a [PatternNode],
        node: Node<'t>,
    ) -> Verdict {
        check_kind(kind, node)?;
        if let Some(expected) = text {
            let found = node_text(node, self.source());
            return if found == expected {
                Ok(())
            } else {
                Err(MismatchReason::Text {
                    expected: expected.to_owned(),
                    found: found.to_owned(),
                })
            };
        }

        let too_few_or_many = || MismatchReason::ChildCount {
            expected: children.len(),
            found: node.named_child_count(),
        };
        let comment_kind = self.profile.comments().comment_kind;
        let mut pending = children.iter().peekable();
        let mut found_operators = Vec::new();
        for (child, child_field) in children_with_fields(node) {
            if !child.is_named() {
                if child_field.is_some() {
                    found_operators.push(node_text(child, self.source()).to_owned());
                }
                continue;
            }
            if child.kind() == comment_kind && pending.peek().is_some_and(|next| skips_comments(next)) {
                continue;
            }
            let next = pending.next().ok_or_else(too_few_or_many)?;
            self.visit(next, child, Some(child_field))?;
        }
        if pending.next().is_some() {
            return Err(too_few_or_many());
        }
        if found_operators != operators {
            return Err(MismatchReason::Operators {
                expected: operators.to_vec(),
                found: found_operators,
            });
        }
        Ok(())
    }

    /// A bound variable requires the identifier text. An unbound one only
    /// checks the node kind.
    fn visit_context_variable(&self, name: &str, kind: &str, node: Node<'t>) -> Verdict {
        let Some(bound) = self.context.get(name) else {
            return check_kind(kind, node);
        };
        let found = node_text(node, self.source());
        if node.kind() == "identifier" && found == bound {
            Ok(())
        } else {
            Err(MismatchReason::ContextVariable {
                name: name.to_owned(),
                expected: bound.to_owned(),
                found: found.to_owned(),
            })
        }
    }

    fn visit_block(&mut self, context: &Context, node: Node<'t>) -> Verdict {
        let config = self.profile.block();
        check_kind(config.kind, node)?;
        let range = block_range(node, config.range_style);
        if !context.is_empty() {
            self.context_ranges
                .push(ContextRange::new(range, context.clone()));
        }
        self.blocks.push(BlockMatch {
            node,
            range,
            context: self.context.extended(context),
        });
        Ok(())
    }

    fn visit_aggregation(
        &mut self,
        name: &str,
        node_kind: &str,
        has_start: bool,
        cardinality: Cardinality,
        context: &Context,
        node: Node<'t>,
    ) -> Verdict {
        check_kind(node_kind, node)?;
        let decorator = self.pattern.aggregation(name);
        let inner = self.context.extended(context);

        let mut cursor = node.walk();
        let mut entries: Vec<Node<'t>> = node
            .named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .collect();
        if has_start {
            if entries.is_empty() {
                return Err(MismatchReason::UnmatchedStart {
                    name: name.to_owned(),
                });
            }
            let start = entries.remove(0);
            let found = decorator
                .and_then(|entry| entry.start)
                .and_then(|id| self.matcher.verify(id, start, &inner).ok())
                .ok_or_else(|| MismatchReason::UnmatchedStart {
                    name: name.to_owned(),
                })?;
            self.nested.push(found);
            self.aggregation_starts
                .insert(name.to_owned(), CodeRange::of(start));
        }

        if !cardinality.allows(entries.len()) {
            return Err(MismatchReason::Cardinality {
                name: name.to_owned(),
                count: entries.len(),
                cardinality,
            });
        }

        let parts = decorator.map_or(&[][..], |entry| entry.parts.as_slice());
        let mut ranges = Vec::with_capacity(entries.len());
        for entry in entries {
            let range = CodeRange::of(entry);
            match parts
                .iter()
                .find_map(|id| self.matcher.verify(*id, entry, &inner).ok())
            {
                Some(found) => self.nested.push(found),
                None => trace!(
                    target: VERIFY_TARGET,
                    aggregation = name,
                    from = range.from,
                    to = range.to,
                    "entry matches no part"
                ),
            }
            if !context.is_empty() {
                self.context_ranges
                    .push(ContextRange::new(range, context.clone()));
            }
            ranges.push(range);
        }
        self.aggregations.insert(name.to_owned(), ranges);
        Ok(())
    }

    /// Walks from the outermost link towards the receiver. Each chainable
    /// element must match a link; the first element that does not must
    /// match the start.
    fn visit_chain(
        &mut self,
        name: &str,
        min_links: usize,
        context: &Context,
        node: Node<'t>,
    ) -> Verdict {
        let chains = self.profile.chains();
        if !chains.is_chainable(node.kind()) {
            return Err(MismatchReason::Kind {
                expected: chains
                    .chainables
                    .iter()
                    .map(|entry| entry.kind)
                    .collect::<Vec<_>>()
                    .join("|"),
                found: node.kind().to_owned(),
            });
        }
        let broken = |at: Node<'_>| MismatchReason::BrokenChain {
            name: name.to_owned(),
            range: CodeRange::of(at),
        };
        let decorator = self.pattern.chain(name).ok_or_else(|| broken(node))?;
        let inner = self.context.extended(context);

        let mut links = Vec::new();
        let mut link_ranges = Vec::new();
        let mut current = node;
        let start = loop {
            let chainable = chains.chainable(current.kind());
            let link = chainable.and_then(|_| {
                decorator
                    .links
                    .iter()
                    .find_map(|id| self.matcher.verify(*id, current, &inner).ok())
            });
            if let (Some(chainable), Some(found)) = (chainable, link) {
                let begin = follow(current, chainable.path_to_link_begin)
                    .map_or_else(|| current.start_byte(), |begin| begin.start_byte());
                links.push(found);
                link_ranges.push(CodeRange::new(begin, current.end_byte()));
                current = follow(current, chainable.path_to_next_link).ok_or_else(|| broken(current))?;
                continue;
            }
            match self.matcher.verify(decorator.start, current, &inner) {
                Ok(start) => break start,
                Err(_) => {
                    // Only the receiver at the bottom of the chain must match.
                    let chainable = chainable.ok_or_else(|| broken(current))?;
                    trace!(
                        target: VERIFY_TARGET,
                        chain = name,
                        from = current.start_byte(),
                        "stepping over an unlinked element"
                    );
                    current = follow(current, chainable.path_to_next_link)
                        .ok_or_else(|| broken(current))?;
                }
            }
        };

        if links.len() < min_links {
            return Err(MismatchReason::ChainTooShort {
                name: name.to_owned(),
                found: links.len(),
                required: min_links,
            });
        }

        if !context.is_empty() {
            self.context_ranges
                .push(ContextRange::new(start.range, context.clone()));
            self.context_ranges.extend(
                link_ranges
                    .iter()
                    .rev()
                    .map(|range| ContextRange::new(*range, context.clone())),
            );
        }
        self.nested.push(start);
        self.nested.extend(links.into_iter().rev());
        link_ranges.reverse();
        self.chains.insert(name.to_owned(), link_ranges);
        Ok(())
    }
}

/// Whether comments in front of this pattern child are ignored.
fn skips_comments(next: &PatternNode) -> bool {
    next.field() == Some(BODY_FIELD) || matches!(next, PatternNode::Block { .. })
}

fn check_kind(expected: &str, node: Node<'_>) -> Verdict {
    if node.kind() == expected {
        Ok(())
    } else {
        Err(MismatchReason::Kind {
            expected: expected.to_owned(),
            found: node.kind().to_owned(),
        })
    }
}

/// Returns the node kind, reading an empty draft identifier such as
/// `__empty_call` as the kind it stands for.
fn clean_kind<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node_text(node, source)
        .strip_prefix(EMPTY_ARGUMENT_PREFIX)
        .filter(|_| node.kind() == "identifier")
        .unwrap_or_else(|| node.kind())
}

fn block_range(node: Node<'_>, style: BlockRangeStyle) -> CodeRange {
    match style {
        BlockRangeStyle::AfterColon => {
            let from = preceding_token(node)
                .filter(|token| token.kind() == ":")
                .map_or_else(|| node.start_byte() + 1, |colon| colon.end_byte());
            CodeRange::new(from, node.end_byte())
        }
        BlockRangeStyle::InsideBraces => {
            CodeRange::new(node.start_byte() + 1, node.end_byte().saturating_sub(1))
        }
    }
}

/// Returns the nearest anonymous sibling before `node`.
fn preceding_token(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        if !sibling.is_named() {
            return Some(sibling);
        }
        current = sibling.prev_sibling();
    }
    None
}

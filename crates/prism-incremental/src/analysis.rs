//! Change analysis: which units to rematch and which to invalidate.
//!
//! The analysis compares the units of the document before and after a batch
//! of transactions. Units are paired by position; a pair whose text differs
//! is compared structurally, so that formatting-only edits inside a unit do
//! not cost a rematch. Error units are never matched but are reported for
//! invalidation, which clears whatever was shown for them before.

use std::collections::BTreeMap;

use prism_pattern::CodeRange;
use prism_syntax::{contains_error, is_error_node, node_text};
use tracing::debug;
use tree_sitter::Node;

use crate::document::Selection;
use crate::units::{SplitUnits, index_at_or_after, index_at_or_before, unit_at};

const ANALYSIS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::analysis");

/// Units selected by one analysis, each sorted by start then end offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis<'t> {
    /// Units to run through the matcher.
    pub rematch: Vec<Node<'t>>,
    /// Units whose previous matches must be dropped.
    pub invalidate: Vec<Node<'t>>,
}

impl Analysis<'_> {
    /// Returns the ranges of the units to rematch.
    #[must_use]
    pub fn rematch_ranges(&self) -> Vec<CodeRange> {
        self.rematch.iter().map(|unit| CodeRange::of(*unit)).collect()
    }

    /// Returns the ranges of the units to invalidate.
    #[must_use]
    pub fn invalidate_ranges(&self) -> Vec<CodeRange> {
        self.invalidate
            .iter()
            .map(|unit| CodeRange::of(*unit))
            .collect()
    }
}

/// One side of the comparison.
pub(crate) struct Snapshot<'s, 't> {
    pub text: &'s str,
    pub selection: Selection,
    pub split: SplitUnits<'t>,
}

/// What the batch did, apart from the two document states.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EditSummary {
    pub force: bool,
    pub doc_changed: bool,
    pub changed: Option<CodeRange>,
}

/// Node set ordered by position, keyed by node id for deduplication.
#[derive(Default)]
struct UnitSet<'t>(BTreeMap<(usize, usize, usize), Node<'t>>);

impl<'t> UnitSet<'t> {
    fn key(node: Node<'_>) -> (usize, usize, usize) {
        (node.start_byte(), node.end_byte(), node.id())
    }

    fn insert(&mut self, node: Node<'t>) {
        self.0.insert(Self::key(node), node);
    }

    fn contains(&self, node: Node<'_>) -> bool {
        self.0.contains_key(&Self::key(node))
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn into_sorted(self) -> Vec<Node<'t>> {
        self.0.into_values().collect()
    }
}

impl<'t> Extend<Node<'t>> for UnitSet<'t> {
    fn extend<I: IntoIterator<Item = Node<'t>>>(&mut self, nodes: I) {
        for node in nodes {
            self.insert(node);
        }
    }
}

impl<'t> FromIterator<Node<'t>> for UnitSet<'t> {
    fn from_iter<I: IntoIterator<Item = Node<'t>>>(nodes: I) -> Self {
        let mut set = Self::default();
        set.extend(nodes);
        set
    }
}

/// Rematch and invalidate sets under construction.
#[derive(Default)]
struct Selected<'t> {
    rematch: UnitSet<'t>,
    invalidate: UnitSet<'t>,
}

/// Selects the units of `after` that need attention.
pub(crate) fn analyze<'t>(
    before: &Snapshot<'_, '_>,
    after: &Snapshot<'_, 't>,
    edit: EditSummary,
) -> Analysis<'t> {
    let mut selected = Selected {
        rematch: UnitSet::default(),
        invalidate: after.split.error_units.iter().copied().collect(),
    };

    if edit.force {
        select_everything(&after.split.units, &mut selected);
    } else if edit.doc_changed {
        select_changes(before, after, edit.changed, &mut selected);
    } else if after.selection.is_empty() {
        select_cursor_unit(&after.split.units, after.selection.anchor, &mut selected);
    } else {
        select_range(&after.split.units, before.selection, after.selection, &mut selected);
    }

    Analysis {
        rematch: selected.rematch.into_sorted(),
        invalidate: selected.invalidate.into_sorted(),
    }
}

fn select_everything<'t>(units: &[Node<'t>], selected: &mut Selected<'t>) {
    let (valid, invalid) = partition_valid(units);
    selected.invalidate.extend(valid.iter().copied());
    selected.invalidate.extend(invalid);
    selected.rematch.extend(valid);
    debug!(
        target: ANALYSIS_TARGET,
        units = selected.rematch.len(),
        "forced rematch of every unit"
    );
}

fn select_changes<'t>(
    before: &Snapshot<'_, '_>,
    after: &Snapshot<'_, 't>,
    changed: Option<CodeRange>,
    selected: &mut Selected<'t>,
) {
    let units = &after.split.units;
    let changes = changed_units(before, after);
    let mut candidates = changes.changed;
    selected.invalidate.extend(changes.erroneous.0.into_values());

    let inserted = changed
        .map(|range| units_in_range(units, range))
        .unwrap_or_default();
    for unit in inserted {
        if !selected.invalidate.contains(unit) {
            candidates.insert(unit);
        }
    }
    if let Some(unit) = unit_at(units, after.selection.head)
        && !selected.invalidate.contains(unit)
    {
        candidates.insert(unit);
    }

    let (valid, invalid) = partition_valid(&candidates.into_sorted());
    selected.invalidate.extend(invalid);
    selected.invalidate.extend(valid.iter().copied());
    selected.rematch.extend(valid);
    debug!(
        target: ANALYSIS_TARGET,
        rematch = selected.rematch.len(),
        invalidate = selected.invalidate.len(),
        "document changed"
    );
}

fn select_cursor_unit<'t>(units: &[Node<'t>], position: usize, selected: &mut Selected<'t>) {
    match unit_at(units, position) {
        Some(unit) if contains_error(unit) => {
            selected.invalidate.insert(unit);
            debug!(target: ANALYSIS_TARGET, position, "invalidating erroneous unit under the cursor");
        }
        Some(unit) => {
            selected.rematch.insert(unit);
            debug!(target: ANALYSIS_TARGET, position, "rematching unit under the cursor");
        }
        None => debug!(target: ANALYSIS_TARGET, position, "cursor outside every unit"),
    }
}

fn select_range<'t>(
    units: &[Node<'t>],
    old: Selection,
    new: Selection,
    selected: &mut Selected<'t>,
) {
    let span = CodeRange::new(old.head.min(new.head), old.head.max(new.head));
    let touched = if span.is_empty() {
        units
    } else {
        selected_units(units, span)
    };
    let (valid, invalid) = partition_valid(touched);
    selected.rematch.extend(valid);
    selected.invalidate.extend(invalid);
    debug!(
        target: ANALYSIS_TARGET,
        from = span.from,
        to = span.to,
        rematch = selected.rematch.len(),
        "selection changed"
    );
}

fn partition_valid<'t>(units: &[Node<'t>]) -> (Vec<Node<'t>>, Vec<Node<'t>>) {
    units.iter().copied().partition(|unit| !contains_error(*unit))
}

/// Units from the one at or before `span.from` to the one at or after
/// `span.to`.
fn selected_units<'u, 't>(units: &'u [Node<'t>], span: CodeRange) -> &'u [Node<'t>] {
    let Some(last_index) = units.len().checked_sub(1) else {
        return units;
    };
    let first = index_at_or_before(units, span.from).unwrap_or(0);
    let last = index_at_or_after(units, span.to).unwrap_or(last_index);
    units.get(first..=last).unwrap_or_default()
}

/// Units touched by inserted text: from the one at or after `range.from` to
/// the one at or before `range.to`.
fn units_in_range<'t>(units: &[Node<'t>], range: CodeRange) -> Vec<Node<'t>> {
    let first = index_at_or_after(units, range.from);
    let last = index_at_or_before(units, range.to);
    match (first, last) {
        (Some(first), Some(last)) if first <= last => {
            units.get(first..=last).map(<[_]>::to_vec).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

struct Changes<'t> {
    changed: UnitSet<'t>,
    erroneous: UnitSet<'t>,
}

/// Pairs the units by position and keeps the new units that differ.
fn changed_units<'t>(before: &Snapshot<'_, '_>, after: &Snapshot<'_, 't>) -> Changes<'t> {
    let mut changes = Changes {
        changed: UnitSet::default(),
        erroneous: UnitSet::default(),
    };
    let new_units = &after.split.units;
    let old_units = &before.split.units;
    let Some(first) = new_units.first() else {
        return changes;
    };

    let mut index = 0;
    if leading_whitespace(before.text) != leading_whitespace(after.text) {
        changes.changed.insert(*first);
        index = 1;
    }

    while let Some(new_unit) = new_units.get(index).copied() {
        index += 1;
        let Some(old_unit) = old_units.get(index - 1).copied() else {
            changes.changed.insert(new_unit);
            continue;
        };
        if node_text(old_unit, before.text) == node_text(new_unit, after.text) {
            continue;
        }
        if is_error_node(new_unit) {
            changes.erroneous.insert(new_unit);
            continue;
        }
        if new_unit.kind() == "comment" {
            changes.changed.insert(new_unit);
            if let Some(next) = new_units.get(index).copied() {
                changes.changed.insert(next);
            }
            index += 1;
        }
        match compare(Some(old_unit), Some(new_unit), before.text, after.text) {
            Comparison::Equal => {}
            Comparison::Different => changes.changed.insert(new_unit),
            Comparison::Erroneous => changes.erroneous.insert(new_unit),
        }
    }
    changes
}

fn leading_whitespace(text: &str) -> &str {
    let body = text.trim_start();
    text.get(..text.len() - body.len()).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Equal,
    Different,
    Erroneous,
}

/// Compares two subtrees by child count, kind and leaf text.
///
/// The new subtree is always walked completely, so an error node hidden
/// anywhere below it is reported even when a difference was found earlier.
fn compare(old: Option<Node<'_>>, new: Option<Node<'_>>, old_text: &str, new_text: &str) -> Comparison {
    if new.is_some_and(is_error_node) {
        return Comparison::Erroneous;
    }
    let mut different = match (old, new) {
        (Some(old_node), Some(new_node)) if old_node.child_count() != new_node.child_count() => true,
        (Some(old_node), Some(new_node)) if new_node.child_count() == 0 => {
            node_text(old_node, old_text) != node_text(new_node, new_text)
        }
        (Some(old_node), Some(new_node)) => old_node.kind() != new_node.kind(),
        _ => true,
    };

    let old_children = children(old);
    let new_children = children(new);
    for position in 0..old_children.len().max(new_children.len()) {
        let outcome = compare(
            old_children.get(position).copied(),
            new_children.get(position).copied(),
            old_text,
            new_text,
        );
        match outcome {
            Comparison::Erroneous => return Comparison::Erroneous,
            Comparison::Different => different = true,
            Comparison::Equal => {}
        }
    }

    if different {
        Comparison::Different
    } else {
        Comparison::Equal
    }
}

fn children(node: Option<Node<'_>>) -> Vec<Node<'_>> {
    node.map(|parent| {
        let mut cursor = parent.walk();
        let found: Vec<_> = parent.children(&mut cursor).collect();
        found
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use prism_syntax::{ParseResult, Parser, SupportedLanguage};
    use rstest::rstest;

    use super::*;

    fn parse(source: &str) -> ParseResult {
        let mut parser = Parser::new(SupportedLanguage::Python).expect("parser init");
        parser.parse(source).expect("parse")
    }

    fn root_compare(old: &ParseResult, new: &ParseResult) -> Comparison {
        compare(
            Some(old.root_node()),
            Some(new.root_node()),
            old.source(),
            new.source(),
        )
    }

    #[rstest]
    #[case("x = f(1)\n", "x = f(1)\n", Comparison::Equal)]
    #[case("x = f(1)\n", "x  =  f( 1 )\n", Comparison::Equal)]
    #[case("x = f(1)\n", "x = f(2)\n", Comparison::Different)]
    #[case("x = f(1)\n", "x = f(1, 2)\n", Comparison::Different)]
    fn subtrees_compare_by_structure_and_leaf_text(
        #[case] old: &str,
        #[case] new: &str,
        #[case] expected: Comparison,
    ) {
        assert_eq!(root_compare(&parse(old), &parse(new)), expected);
    }

    #[rstest]
    #[case("", "")]
    #[case("\n\n  x", "\n\n  ")]
    #[case("x\n", "")]
    fn leading_whitespace_is_the_prefix_before_text(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(leading_whitespace(text), expected);
    }
}

//! Matching units.
//!
//! A document is split into units following the language's splitting table:
//! some node kinds contribute every named child, some only the child in one
//! field, and every other node is a unit of its own. Units come out in source
//! order, which the lookups below rely on.

use std::cmp::Ordering;

use prism_syntax::{LanguageProfile, SplitRule, is_error_node};
use tree_sitter::Node;

/// Units of one parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitUnits<'t> {
    /// Units that are not error nodes themselves. They may still contain
    /// errors further down.
    pub units: Vec<Node<'t>>,
    /// Error nodes met while splitting.
    pub error_units: Vec<Node<'t>>,
}

/// Splits the tree below `root` into matching units.
#[must_use]
pub fn split_units<'t>(root: Node<'t>, profile: &LanguageProfile) -> SplitUnits<'t> {
    let mut split = SplitUnits::default();
    collect(root, profile, &mut split);
    split
}

fn collect<'t>(node: Node<'t>, profile: &LanguageProfile, split: &mut SplitUnits<'t>) {
    if is_error_node(node) {
        split.error_units.push(node);
        return;
    }
    match profile.split_rule(node.kind()) {
        None => split.units.push(node),
        Some(SplitRule::AllChildren) => {
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            if children.is_empty() {
                split.units.push(node);
            }
            for child in children {
                collect(child, profile, split);
            }
        }
        Some(SplitRule::Field(field)) => match node.child_by_field_name(field) {
            Some(child) => collect(child, profile, split),
            None => split.units.push(node),
        },
    }
}

fn locate(unit: Node<'_>, position: usize) -> Ordering {
    if position < unit.start_byte() {
        Ordering::Greater
    } else if position > unit.end_byte() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Returns the unit whose range contains `position`, bounds included.
#[must_use]
pub fn unit_at<'t>(units: &[Node<'t>], position: usize) -> Option<Node<'t>> {
    let index = units
        .binary_search_by(|unit| locate(*unit, position))
        .ok()?;
    units.get(index).copied()
}

/// Returns the index of the unit containing `position`, or of the last unit
/// that ends before it.
#[must_use]
pub fn index_at_or_before(units: &[Node<'_>], position: usize) -> Option<usize> {
    match units.binary_search_by(|unit| locate(*unit, position)) {
        Ok(index) => Some(index),
        Err(insert_at) => insert_at.checked_sub(1),
    }
}

/// Returns the index of the unit containing `position`, or of the first unit
/// that starts after it.
#[must_use]
pub fn index_at_or_after(units: &[Node<'_>], position: usize) -> Option<usize> {
    match units.binary_search_by(|unit| locate(*unit, position)) {
        Ok(index) => Some(index),
        Err(insert_at) => (insert_at < units.len()).then_some(insert_at),
    }
}

#[cfg(test)]
mod tests {
    use prism_syntax::{ParseResult, Parser, SupportedLanguage};
    use rstest::rstest;

    use super::*;

    fn parse(language: SupportedLanguage, source: &str) -> ParseResult {
        let mut parser = Parser::new(language).expect("parser init");
        parser.parse(source).expect("parse")
    }

    fn unit_texts<'s>(parsed: &'s ParseResult) -> Vec<&'s str> {
        let split = split_units(parsed.root_node(), parsed.language().profile());
        split
            .units
            .iter()
            .map(|unit| parsed.text_of(*unit))
            .collect()
    }

    #[test]
    fn python_definitions_split_along_their_body() {
        let parsed = parse(
            SupportedLanguage::Python,
            "a = 1\ndef f():\n    b = 2\n    c = 3\nif a:\n    d = 4\n",
        );

        assert_eq!(
            unit_texts(&parsed),
            vec!["a = 1", "b = 2", "c = 3", "if a:\n    d = 4"]
        );
    }

    #[test]
    fn typescript_programs_split_into_statements() {
        let parsed = parse(SupportedLanguage::TypeScript, "a();\n{ b(); c(); }\n");

        assert_eq!(unit_texts(&parsed), vec!["a();", "b();", "c();"]);
    }

    #[test]
    fn error_nodes_are_kept_apart() {
        let parsed = parse(SupportedLanguage::Python, "a = 1\n)\nb = 2\n");

        let split = split_units(parsed.root_node(), parsed.language().profile());

        assert!(split.units.iter().all(|unit| !is_error_node(*unit)));
        assert!(
            !split.error_units.is_empty()
                || split.units.iter().any(|unit| prism_syntax::contains_error(*unit))
        );
    }

    #[rstest]
    #[case(0, Some("a = 1"))]
    #[case(5, Some("a = 1"))]
    #[case(7, Some("b = 2"))]
    #[case(13, None)]
    fn positions_resolve_to_their_unit(#[case] position: usize, #[case] expected: Option<&str>) {
        let parsed = parse(SupportedLanguage::Python, "a = 1\nb = 2\n\n");
        let split = split_units(parsed.root_node(), parsed.language().profile());

        let found = unit_at(&split.units, position).map(|unit| parsed.text_of(unit));

        assert_eq!(found, expected);
    }

    #[rstest]
    #[case(2, Some(0), Some(0))]
    #[case(7, Some(0), Some(1))]
    #[case(20, Some(1), None)]
    fn neighbouring_units_are_found_by_position(
        #[case] position: usize,
        #[case] before: Option<usize>,
        #[case] after: Option<usize>,
    ) {
        let parsed = parse(SupportedLanguage::Python, "a = 1\n\n\nb = 2\n");
        let split = split_units(parsed.root_node(), parsed.language().profile());

        assert_eq!(index_at_or_before(&split.units, position), before);
        assert_eq!(index_at_or_after(&split.units, position), after);
    }
}

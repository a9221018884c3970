//! Walks a parsed template and produces the pattern tree.

use std::ops::Range;

use prism_syntax::tree_path::{children_with_fields, unwrap_parenthesized_call};
use prism_syntax::{LanguageProfile, node_text};
use tracing::trace;
use tree_sitter::Node;

use crate::error::PatternError;
use crate::pattern::PatternNode;
use crate::template::{PLACEHOLDER_PREFIX, ParameterTable};

use super::COMPILE_TARGET;

/// Node kinds whose internal structure is opaque to patterns.
const ATOMIC_KINDS: &[&str] = &["string"];

/// Converts concrete template trees into pattern trees.
pub(super) struct TreeBuilder<'a> {
    pub(super) template: &'a str,
    pub(super) source: &'a str,
    pub(super) table: &'a ParameterTable,
    pub(super) profile: &'static LanguageProfile,
}

impl TreeBuilder<'_> {
    /// Transforms `node` and everything below it. Anonymous tokens are not
    /// represented, except that tokens sitting in a field are recorded as
    /// operators of their parent.
    pub(super) fn transform(
        &self,
        node: Node<'_>,
        field: Option<&'static str>,
    ) -> Result<PatternNode, PatternError> {
        let node = unwrap_parenthesized_call(node);
        let range = node.byte_range();
        let param = self
            .table
            .resolve(&range)
            .filter(|_| !has_child_spanning(node, &range));
        if let Some(param) = param {
            trace!(
                target: COMPILE_TARGET,
                template = self.template,
                placeholder = %param.placeholder(),
                kind = node.kind(),
                "resolved placeholder"
            );
            return Ok(param.to_pattern_node(node.kind(), field, self.profile));
        }

        if is_atomic(node) {
            return self.leaf(node, field);
        }

        let mut children = Vec::new();
        let mut operators = Vec::new();
        for (child, child_field) in children_with_fields(node) {
            if child.is_named() {
                children.push(self.transform(child, child_field)?);
            } else if child_field.is_some() {
                operators.push(node_text(child, self.source).to_owned());
            }
        }

        if let Some(mut block) = self.take_promoted_block(node, &mut children) {
            block.set_field(field);
            return Ok(block);
        }

        Ok(PatternNode::Regular {
            kind: node.kind(),
            field,
            text: None,
            operators,
            children,
        })
    }

    fn leaf(
        &self,
        node: Node<'_>,
        field: Option<&'static str>,
    ) -> Result<PatternNode, PatternError> {
        let text = node_text(node, self.source);
        if text.starts_with(PLACEHOLDER_PREFIX) {
            return Err(PatternError::unknown_parameter(self.template, text));
        }
        Ok(PatternNode::Regular {
            kind: node.kind(),
            field,
            text: Some(text.to_owned()),
            operators: Vec::new(),
            children: Vec::new(),
        })
    }

    /// A statement or block wrapper whose only child is a block placeholder
    /// is replaced by that placeholder.
    fn take_promoted_block(
        &self,
        node: Node<'_>,
        children: &mut Vec<PatternNode>,
    ) -> Option<PatternNode> {
        let wrapper =
            node.kind() == self.profile.statement_kind() || node.kind() == self.profile.block().kind;
        let promotes = wrapper && matches!(children.as_slice(), [PatternNode::Block { .. }]);
        promotes.then(|| children.pop()).flatten()
    }
}

fn is_atomic(node: Node<'_>) -> bool {
    node.named_child_count() == 0 || ATOMIC_KINDS.contains(&node.kind())
}

fn has_child_spanning(node: Node<'_>, range: &Range<usize>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| child.byte_range() == *range);
    found
}

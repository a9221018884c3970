//! Child-index paths through concrete syntax trees.
//!
//! Steps index the raw children of a node, anonymous tokens included, so the
//! `.` of `a.b` is child 1 of the attribute node.

use tree_sitter::Node;

/// Follows `path` from `node`, returning `None` when a step does not exist.
#[must_use]
pub fn follow<'tree>(node: Node<'tree>, path: &[usize]) -> Option<Node<'tree>> {
    path.iter().try_fold(node, |current, &step| current.child(step))
}

/// Returns the raw children of `node` together with the field each one
/// occupies.
#[must_use]
pub fn children_with_fields<'tree>(node: Node<'tree>) -> Vec<(Node<'tree>, Option<&'static str>)> {
    let mut children = Vec::with_capacity(node.child_count());
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            children.push((cursor.node(), cursor.field_name()));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    children
}

/// Returns the call wrapped by a parenthesised expression, or `node` itself.
///
/// Patterns treat `(f(x))` as `f(x)`. The caller keeps the field of the
/// wrapper.
#[must_use]
pub fn unwrap_parenthesized_call(node: Node<'_>) -> Node<'_> {
    match node.child(1) {
        Some(inner) if node.kind() == "parenthesized_expression" && inner.kind() == "call" => inner,
        _ => node,
    }
}

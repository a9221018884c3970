//! Context declared in comments above a matched statement.
//!
//! A comment of the form `# CONTEXT: {"table": "users"}` directly above a
//! statement attaches JSON data to every match inside that statement.

use prism_syntax::{LanguageProfile, node_text};
use serde_json::Value;
use tracing::trace;
use tree_sitter::Node;

const COMMENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::comments");

/// Marker that introduces a context declaration inside a comment.
pub const CONTEXT_MARKER: &str = "CONTEXT";

/// Returns the JSON declared in the comments immediately preceding the
/// statement that encloses `node`.
///
/// Comments are scanned from the nearest one upwards; scanning stops at the
/// first sibling that is not a comment. Within a comment the longest prefix
/// that parses as JSON wins, so trailing prose is ignored.
#[must_use]
pub fn comment_context(node: Node<'_>, profile: &LanguageProfile, source: &str) -> Option<Value> {
    let comments = profile.comments();
    let mut statement = node;
    while statement.kind() != comments.statement_kind {
        statement = statement.parent()?;
    }

    let mut previous = statement.prev_sibling();
    while let Some(sibling) = previous {
        if sibling.kind() != comments.comment_kind {
            break;
        }
        let text = node_text(sibling, source);
        if let Some(value) = declared_context(text, comments.start_tokens) {
            trace!(target: COMMENTS_TARGET, comment = text, "found comment context");
            return Some(value);
        }
        previous = sibling.prev_sibling();
    }
    None
}

fn declared_context(comment: &str, start_tokens: &[&str]) -> Option<Value> {
    start_tokens.iter().find_map(|token| {
        let body = comment
            .trim_start()
            .strip_prefix(token)?
            .trim_start()
            .strip_prefix(CONTEXT_MARKER)?
            .trim_start()
            .strip_prefix(':')?
            .trim_start();
        match body.chars().next() {
            Some('{') => largest_json(body, '}'),
            Some('[') => largest_json(body, ']'),
            _ => None,
        }
    })
}

/// Parses the longest prefix of `text` that ends in `closing` and is valid
/// JSON.
fn largest_json(text: &str, closing: char) -> Option<Value> {
    let ends: Vec<usize> = text
        .char_indices()
        .filter(|(_, found)| *found == closing)
        .map(|(index, _)| index + closing.len_utf8())
        .collect();
    ends.into_iter()
        .rev()
        .find_map(|end| text.get(..end).and_then(|prefix| serde_json::from_str(prefix).ok()))
}

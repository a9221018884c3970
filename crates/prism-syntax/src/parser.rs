//! Tree-sitter parsing wrapper.
//!
//! Wraps the raw Tree-sitter parser and keeps the parsed source next to its
//! tree so node text can be sliced without threading the source through
//! every call.

use std::fmt;
use std::ops::Range;

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;

/// Kind of the node Tree-sitter inserts around unparsable input.
pub const ERROR_KIND: &str = "ERROR";

/// Result of parsing source code.
///
/// Tree-sitter is error-tolerant, so a parse result may contain both a
/// valid tree and error nodes.
#[derive(Debug, Clone)]
pub struct ParseResult {
    tree: tree_sitter::Tree,
    source: String,
    language: SupportedLanguage,
}

impl ParseResult {
    /// Returns the parsed syntax tree.
    #[must_use]
    pub const fn tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    /// Returns the source code that was parsed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the language of the parsed code.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the root node of the syntax tree.
    #[must_use]
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Returns the source text covered by `node`.
    #[must_use]
    pub fn text_of(&self, node: tree_sitter::Node<'_>) -> &str {
        node_text(node, &self.source)
    }

    /// Returns whether the tree contains `ERROR` or missing nodes.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Collects the syntax errors found in the tree, in source order.
    ///
    /// Nodes below a reported `ERROR` node are not reported again.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        let mut errors = Vec::new();
        collect_errors(self.tree.root_node(), &mut errors);
        errors
    }
}

/// Location and description of a syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Byte range of the error in the source.
    pub byte_range: Range<usize>,
    /// Line number (one-based) where the error starts.
    pub line: u32,
    /// Column number (one-based) where the error starts.
    pub column: u32,
    /// What went wrong.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn from_node(node: tree_sitter::Node<'_>) -> Self {
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else if node.kind() == ERROR_KIND {
            "unexpected input".to_owned()
        } else {
            "unterminated string".to_owned()
        };
        let start = node.start_position();
        Self {
            byte_range: node.byte_range(),
            line: one_based(start.row),
            column: one_based(start.column),
            message,
        }
    }
}

impl fmt::Display for SyntaxErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.line, self.column)
    }
}

/// Tree-sitter parser configured for one language.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: SupportedLanguage,
}

impl Parser {
    /// Creates a new parser for the given language.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tree-sitter parser rejects the grammar.
    pub fn new(language: SupportedLanguage) -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.tree_sitter_language())
            .map_err(|e| SyntaxError::parser_init(language, e.to_string()))?;

        Ok(Self { inner, language })
    }

    /// Returns the language this parser is configured for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Parses source code and returns the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser fails to produce a syntax tree.
    pub fn parse(&mut self, source: &str) -> Result<ParseResult, SyntaxError> {
        let tree = self
            .inner
            .parse(source, None)
            .ok_or_else(|| SyntaxError::parse(self.language, "parsing failed"))?;

        Ok(ParseResult {
            tree,
            source: source.to_owned(),
            language: self.language,
        })
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Returns the slice of `source` covered by `node`, or `""` when the range
/// does not fall on character boundaries.
#[must_use]
pub fn node_text<'s>(node: tree_sitter::Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// Returns whether `node` stands for unparsable input.
///
/// Besides `ERROR` nodes this covers the zero-width `string_end` that the
/// Python grammar emits for an unterminated string, which Tree-sitter does
/// not flag as an error.
#[must_use]
pub fn is_error_node(node: tree_sitter::Node<'_>) -> bool {
    node.kind() == ERROR_KIND || (node.kind() == "string_end" && node.start_byte() == node.end_byte())
}

/// Returns whether `node` or any descendant is an error node in the sense of
/// [`is_error_node`].
#[must_use]
pub fn contains_error(node: tree_sitter::Node<'_>) -> bool {
    if is_error_node(node) {
        return true;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(contains_error);
    found
}

fn collect_errors(node: tree_sitter::Node<'_>, errors: &mut Vec<SyntaxErrorInfo>) {
    if node.is_missing() || is_error_node(node) {
        errors.push(SyntaxErrorInfo::from_node(node));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, errors);
    }
}

fn one_based(value: usize) -> u32 {
    u32::try_from(value.saturating_add(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn python() -> Parser {
        Parser::new(SupportedLanguage::Python).expect("parser init")
    }

    #[rstest]
    #[case(SupportedLanguage::Python, "for row in rows:\n    db.save(row)\n")]
    #[case(SupportedLanguage::TypeScript, "rows.forEach((row) => { db.save(row); });")]
    fn clean_sources_report_no_errors(#[case] language: SupportedLanguage, #[case] source: &str) {
        let mut parser = Parser::new(language).expect("parser init");
        let parsed = parser.parse(source).expect("parse");

        assert!(!parsed.has_errors());
        assert!(!contains_error(parsed.root_node()));
        assert!(parsed.errors().is_empty());
        assert_eq!(parsed.language(), language);
    }

    #[rstest]
    #[case(SupportedLanguage::Python, "db.save(row")]
    #[case(SupportedLanguage::TypeScript, "db.save(row")]
    fn unbalanced_calls_report_errors(#[case] language: SupportedLanguage, #[case] source: &str) {
        let mut parser = Parser::new(language).expect("parser init");
        let parsed = parser.parse(source).expect("parse");

        assert!(parsed.has_errors());
        assert!(!parsed.errors().is_empty());
    }

    #[rstest]
    fn errors_point_at_their_line(mut python: Parser) {
        let parsed = python.parse("x = 1\ny = (\n").expect("parse");

        let first = parsed.errors().into_iter().next().expect("has error");
        assert!(first.line >= 2);
        assert!(first.column >= 1);
        assert!(first.to_string().contains(" at "));
    }

    #[rstest]
    fn text_of_slices_the_source(mut python: Parser) {
        let parsed = python.parse("answer = 42").expect("parse");
        let statement = parsed.root_node().child(0).expect("statement");

        assert_eq!(parsed.text_of(statement), "answer = 42");
        assert_eq!(node_text(statement, "short"), "");
    }
}

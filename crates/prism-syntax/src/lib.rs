//! Tree-sitter parsing and per-language configuration for the Prism
//! projection engine.
//!
//! This crate provides the syntactic layer the rest of the workspace builds
//! on:
//!
//! - **Parsing** via [`Parser`], which keeps the parsed source next to its
//!   tree in a [`ParseResult`]
//! - **Language profiles** via [`LanguageProfile`], describing which node
//!   kinds act as blocks, aggregations and chains in each grammar
//! - **Tree paths** via [`tree_path::follow`], used to navigate from a
//!   chainable node to its link and to the next chain element
//!
//! # Supported Languages
//!
//! - Python
//! - TypeScript, parsed with the TSX grammar so JSX elements are accepted
//!
//! # Example
//!
//! ```
//! use prism_syntax::{Parser, SupportedLanguage};
//!
//! let mut parser = Parser::new(SupportedLanguage::Python)?;
//! let parsed = parser.parse("orders.filter(1)")?;
//!
//! assert!(!parsed.has_errors());
//! assert!(SupportedLanguage::Python.profile().chains().is_chainable("call"));
//! # Ok::<(), prism_syntax::SyntaxError>(())
//! ```

mod error;
mod language;
mod parser;
mod profile;
pub mod tree_path;

pub use error::SyntaxError;
pub use language::{LanguageParseError, SupportedLanguage};
pub use parser::{
    ERROR_KIND, ParseResult, Parser, SyntaxErrorInfo, contains_error, is_error_node, node_text,
};
pub use profile::{
    AGGREGATION_PLACEHOLDER, AGGREGATION_START_PLACEHOLDER, AggregatableKind, ArgumentDraft,
    BlockConfig, BlockRangeStyle, ChainableKind, ChainsConfig, CommentConfig,
    EMPTY_ARGUMENT_PREFIX, KIND_PLACEHOLDER, LINK_PLACEHOLDER, LanguageProfile, PYTHON,
    SplitEntry, SplitRule, TYPESCRIPT,
};

#[cfg(test)]
mod tests;

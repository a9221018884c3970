//! Error types for incremental re-matching.

use prism_syntax::{SupportedLanguage, SyntaxError};
use thiserror::Error;

/// Errors raised while preparing or running a rematch pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IncrementalError {
    /// An edit addressed bytes outside the document or inside a character.
    #[error("edit {from}..{to} does not fit a document of {len} bytes")]
    InvalidEdit {
        /// Start of the replaced range.
        from: usize,
        /// End of the replaced range.
        to: usize,
        /// Length of the edited document.
        len: usize,
    },

    /// The registry was built for a different language than the document.
    #[error("registry targets {registry}, but the document is {document}")]
    LanguageMismatch {
        /// Language of the pattern registry.
        registry: SupportedLanguage,
        /// Language of the parsed document.
        document: SupportedLanguage,
    },

    /// Parsing one of the document states failed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl IncrementalError {
    /// Creates an invalid edit error.
    #[must_use]
    pub const fn invalid_edit(from: usize, to: usize, len: usize) -> Self {
        Self::InvalidEdit { from, to, len }
    }
}

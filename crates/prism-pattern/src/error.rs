//! Construction errors raised while turning templates into patterns.
//!
//! Every variant describes a defect in a template or in the way patterns are
//! registered. A broken pattern cannot be matched safely, so these errors are
//! surfaced to whoever builds the registry instead of being skipped. A failed
//! match is not an error; see [`crate::Mismatch`].

use prism_syntax::{SupportedLanguage, SyntaxError};
use thiserror::Error;

/// Errors from template compilation and registry construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PatternError {
    /// The parsed template contains a placeholder that no parameter owns.
    #[error("template '{template}' contains unknown placeholder '{placeholder}'")]
    UnknownParameter {
        /// Name of the template being compiled.
        template: String,
        /// Placeholder text found in the parsed source.
        placeholder: String,
    },

    /// The rendered template source does not parse cleanly.
    #[error("template '{template}' renders to unparsable {language} source ({detail}): {source_text}")]
    InvalidTemplateSource {
        /// Name of the template being compiled.
        template: String,
        /// Language the template was parsed as.
        language: SupportedLanguage,
        /// The first problem found in the parsed source.
        detail: String,
        /// The rendered source.
        source_text: String,
    },

    /// An aggregation names a node kind the language does not aggregate.
    #[error("aggregation '{name}' uses node kind '{node_kind}', which {language} cannot aggregate")]
    UnsupportedAggregation {
        /// Aggregation name.
        name: String,
        /// Requested node kind.
        node_kind: String,
        /// Target language.
        language: SupportedLanguage,
    },

    /// A chain link does not compile to a chainable node.
    #[error("chain link '{template}' compiles to '{kind}', which {language} cannot chain")]
    UnsupportedChain {
        /// Name of the link template.
        template: String,
        /// Kind found at the link position.
        kind: String,
        /// Target language.
        language: SupportedLanguage,
    },

    /// The aggregatable kind needs a start template and none was given.
    #[error("aggregation '{name}' over '{node_kind}' requires a start template")]
    MissingStartTemplate {
        /// Aggregation name.
        name: String,
        /// Aggregatable node kind.
        node_kind: String,
    },

    /// A configured path does not exist in a compiled pattern tree.
    #[error("template '{template}' has no node at path {path:?}")]
    PathNotFound {
        /// Name of the template being compiled.
        template: String,
        /// The path that could not be followed.
        path: Vec<usize>,
    },

    /// A pattern was referenced by name but never defined.
    #[error("pattern '{name}' is referenced but never defined")]
    UnresolvedReference {
        /// The missing pattern name.
        name: String,
    },

    /// A pattern name was defined twice.
    #[error("pattern '{name}' is already defined")]
    DuplicatePattern {
        /// The duplicated name.
        name: String,
    },

    /// An extension targets a pattern that does not exist.
    #[error("unknown pattern '{name}'")]
    UnknownPattern {
        /// Name that was looked up.
        name: String,
    },

    /// An extension targets a chain the pattern does not declare.
    #[error("pattern '{pattern}' has no chain named '{chain}'")]
    UnknownChain {
        /// Pattern name.
        pattern: String,
        /// Chain name that was looked up.
        chain: String,
    },

    /// An extension targets an aggregation the pattern does not declare.
    #[error("pattern '{pattern}' has no aggregation named '{aggregation}'")]
    UnknownAggregation {
        /// Pattern name.
        pattern: String,
        /// Aggregation name that was looked up.
        aggregation: String,
    },

    /// A template was registered with a registry for another language.
    #[error("template '{template}' targets {found}, but the registry targets {expected}")]
    LanguageMismatch {
        /// Name of the template.
        template: String,
        /// Language of the registry.
        expected: SupportedLanguage,
        /// Language of the template.
        found: SupportedLanguage,
    },

    /// The underlying parser failed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl PatternError {
    /// Creates an unknown-parameter error.
    #[must_use]
    pub fn unknown_parameter(template: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::UnknownParameter {
            template: template.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Creates a path-not-found error.
    #[must_use]
    pub fn path_not_found(template: impl Into<String>, path: &[usize]) -> Self {
        Self::PathNotFound {
            template: template.into(),
            path: path.to_vec(),
        }
    }

    /// Creates an unresolved-reference error.
    #[must_use]
    pub fn unresolved_reference(name: impl Into<String>) -> Self {
        Self::UnresolvedReference { name: name.into() }
    }

    /// Creates an unknown-pattern error.
    #[must_use]
    pub fn unknown_pattern(name: impl Into<String>) -> Self {
        Self::UnknownPattern { name: name.into() }
    }
}

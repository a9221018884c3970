//! Source languages and their Tree-sitter grammars.

use strum::{Display, EnumString, VariantArray};

use crate::profile::{LanguageProfile, PYTHON, TYPESCRIPT};

/// Languages that templates can be written in and matched against.
///
/// Parses case-insensitively from the language name or its usual file
/// extension (`"Python"`, `"py"`, `"typescript"`, `"ts"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    VariantArray,
)]
#[strum(ascii_case_insensitive)]
pub enum SupportedLanguage {
    /// Python source.
    #[default]
    #[strum(to_string = "python", serialize = "py")]
    Python,
    /// TypeScript source, parsed with the TSX grammar.
    #[strum(to_string = "typescript", serialize = "ts", serialize = "tsx")]
    TypeScript,
}

/// Error raised when a language name is not recognised.
pub type LanguageParseError = strum::ParseError;

impl SupportedLanguage {
    /// Returns the Tree-sitter grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    /// Returns the matching configuration for this language.
    #[must_use]
    pub const fn profile(self) -> &'static LanguageProfile {
        match self {
            Self::Python => &PYTHON,
            Self::TypeScript => &TYPESCRIPT,
        }
    }

    /// Returns all supported languages.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        Self::VARIANTS
    }
}

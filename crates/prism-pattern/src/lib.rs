//! Template compilation and structural matching for Prism projections.
//!
//! A projection describes a piece of code as a *template*: source text with
//! typed holes. This crate turns templates into pattern trees and finds
//! the places in a parsed document where they match:
//!
//! - **Templates** are composed with a [`TemplateBuilder`], which issues the
//!   parameter ids. Parameters bind arguments, capture blocks, aggregate
//!   delimited lists, follow method chains and compare context variables.
//! - **Registries** compile templates with a [`RegistryBuilder`]. Patterns
//!   may refer to each other by name; [`RegistryBuilder::freeze`] checks the
//!   references and yields an immutable [`PatternRegistry`].
//! - **Matching** is done by a [`PatternMatcher`], which walks a concrete
//!   tree and reports [`Match`]es together with the ranges in which extra
//!   context bindings apply.
//! - **Drafts** render a template as insertable starter code with
//!   [`Template::draft`].
//!
//! # Example
//!
//! ```
//! use prism_pattern::{Context, PatternMatcher, RegistryBuilder, TemplateBuilder};
//! use prism_syntax::{Parser, SupportedLanguage};
//!
//! let mut templates = TemplateBuilder::new(SupportedLanguage::Python);
//! let table = templates.arg("table", ["identifier"]);
//! let drop = templates
//!     .statement("drop_table")
//!     .text("db.drop(")
//!     .param(&table)
//!     .text(")")
//!     .build();
//!
//! let mut builder = RegistryBuilder::new(SupportedLanguage::Python)?;
//! builder.register(&drop)?;
//! let registry = builder.freeze()?;
//!
//! let mut parser = Parser::new(SupportedLanguage::Python)?;
//! let parsed = parser.parse("db.drop(users)\n")?;
//! let matcher = PatternMatcher::new(&registry, parsed.source());
//! let result = matcher.execute(parsed.root_node(), &Context::new());
//!
//! let found = result.matches.first().expect("one match");
//! assert_eq!(found.name, "drop_table");
//! assert_eq!(found.binding_text("table", parsed.source()), Some("users"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod comments;
mod compile;
mod context;
mod error;
mod matcher;
mod pattern;
mod registry;
mod template;

pub use comments::{CONTEXT_MARKER, comment_context};
pub use context::Context;
pub use error::PatternError;
pub use matcher::{
    BlockMatch, BoundNode, CodeRange, ContextRange, Match, MatchRecord, MatchingResult, Mismatch,
    MismatchReason, PatternMatcher,
};
pub use pattern::{
    ANY_KIND, AggregationDecorator, Cardinality, ChainDecorator, Pattern, PatternId, PatternNode,
};
pub use registry::{PatternRegistry, RegistryBuilder};
pub use template::{
    CodeString, NoTemplates, PLACEHOLDER_PREFIX, ParameterId, ParameterKind, ParameterTable,
    SubTemplate, Template, TemplateAggregation, TemplateArgument, TemplateBlock, TemplateBuilder,
    TemplateChain, TemplateComposer, TemplateContextVariable, TemplateKind, TemplateLookup,
    TemplateParameter, TemplatePart,
};

#[cfg(test)]
mod tests;

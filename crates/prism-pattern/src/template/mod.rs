//! Templates: source text interleaved with typed parameters.
//!
//! Templates are composed with a [`TemplateBuilder`], which issues the
//! parameter ids:
//!
//! ```ignore
//! let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
//! let table = builder.arg("table", ["identifier"]);
//! let template = builder
//!     .statement("drop_table")
//!     .text("db.drop(")
//!     .param(&table)
//!     .text(")")
//!     .build();
//! ```

pub(crate) mod code_string;
mod draft;
mod parameter;

use prism_syntax::SupportedLanguage;

pub use code_string::{CodeString, ParameterTable};
pub use parameter::{
    PLACEHOLDER_PREFIX, ParameterId, ParameterKind, SubTemplate, TemplateAggregation,
    TemplateArgument, TemplateBlock, TemplateChain, TemplateContextVariable, TemplateParameter,
};

use crate::context::Context;

/// Whether a template stands for a statement or an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// The template parses as a complete statement.
    Statement,
    /// The template is an expression; the pattern starts below the
    /// statement wrapping it.
    Expression,
}

/// One piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal source text.
    Text(String),
    /// A parameter rendered as its placeholder.
    Param(TemplateParameter),
}

/// A named template for one language.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    language: SupportedLanguage,
    kind: TemplateKind,
    parts: Vec<TemplatePart>,
}

impl Template {
    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the target language.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns whether this is a statement or expression template.
    #[must_use]
    pub const fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Returns the parts in source order.
    #[must_use]
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Iterates over the parameters in source order.
    pub fn parameters(&self) -> impl Iterator<Item = &TemplateParameter> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Param(param) => Some(param),
            TemplatePart::Text(_) => None,
        })
    }
}

/// Resolves template references by pattern name.
pub trait TemplateLookup {
    /// Returns the template defined under `name`.
    fn template(&self, name: &str) -> Option<&Template>;
}

/// A lookup that knows no templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateLookup for NoTemplates {
    fn template(&self, _name: &str) -> Option<&Template> {
        None
    }
}

/// Issues parameter ids and starts template composition.
///
/// Ids are unique and monotonic for the lifetime of the builder. Use one
/// builder per registry so placeholders never collide.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    language: SupportedLanguage,
    next_id: u64,
}

impl TemplateBuilder {
    /// Creates a builder for `language`.
    #[must_use]
    pub const fn new(language: SupportedLanguage) -> Self {
        Self {
            language,
            next_id: 0,
        }
    }

    /// Returns the language of the templates this builder composes.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the next id and advances the counter.
    pub const fn issue_id(&mut self) -> ParameterId {
        let id = ParameterId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn issue(&mut self, kind: ParameterKind) -> TemplateParameter {
        TemplateParameter::new(self.issue_id(), kind)
    }

    /// Creates an argument binding a node of one of `kinds`.
    pub fn arg<I, K>(&mut self, name: impl Into<String>, kinds: I) -> TemplateParameter
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.issue(ParameterKind::Argument(TemplateArgument {
            name: name.into(),
            kinds: kinds.into_iter().map(Into::into).collect(),
        }))
    }

    /// Creates a block without context bindings.
    pub fn block(&mut self) -> TemplateParameter {
        self.block_with_context(Context::new())
    }

    /// Creates a block that activates `context` inside it.
    pub fn block_with_context(&mut self, context: Context) -> TemplateParameter {
        self.issue(ParameterKind::Block(TemplateBlock { context }))
    }

    /// Creates an aggregation parameter.
    pub fn aggregation(&mut self, aggregation: TemplateAggregation) -> TemplateParameter {
        self.issue(ParameterKind::Aggregation(aggregation))
    }

    /// Creates a chain parameter.
    pub fn chain(&mut self, chain: TemplateChain) -> TemplateParameter {
        self.issue(ParameterKind::Chain(chain))
    }

    /// Creates a context variable.
    pub fn context_variable(&mut self, name: impl Into<String>) -> TemplateParameter {
        self.issue(ParameterKind::ContextVariable(TemplateContextVariable {
            name: name.into(),
        }))
    }

    /// Starts composing a statement template.
    #[must_use]
    pub fn statement(&self, name: impl Into<String>) -> TemplateComposer {
        TemplateComposer::new(name.into(), self.language, TemplateKind::Statement)
    }

    /// Starts composing an expression template.
    #[must_use]
    pub fn expression(&self, name: impl Into<String>) -> TemplateComposer {
        TemplateComposer::new(name.into(), self.language, TemplateKind::Expression)
    }
}

/// Accumulates the parts of a template.
#[derive(Debug, Clone)]
#[must_use]
pub struct TemplateComposer {
    template: Template,
}

impl TemplateComposer {
    const fn new(name: String, language: SupportedLanguage, kind: TemplateKind) -> Self {
        Self {
            template: Template {
                name,
                language,
                kind,
                parts: Vec::new(),
            },
        }
    }

    /// Appends literal source text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.template.parts.push(TemplatePart::Text(text.into()));
        self
    }

    /// Appends a parameter. The same parameter may appear more than once.
    pub fn param(mut self, param: &TemplateParameter) -> Self {
        self.template.parts.push(TemplatePart::Param(param.clone()));
        self
    }

    /// Finishes the template.
    pub fn build(self) -> Template {
        self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let first = builder.arg("a", ["identifier"]);
        let second = builder.block();
        let third = builder.context_variable("db");

        assert!(first.id() < second.id());
        assert!(second.id() < third.id());
        assert_eq!(first.placeholder(), "__template_arg_0");
        assert_eq!(second.placeholder(), "__template_block_1");
        assert_eq!(third.placeholder(), "__template_context_variable_2");
    }

    #[test]
    fn ids_keep_counting_past_the_32_bit_range() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        builder.next_id = u64::from(u32::MAX);

        let last_narrow = builder.issue_id();
        let next = builder.arg("wide", ["identifier"]);

        assert_eq!(last_narrow.get(), u64::from(u32::MAX));
        assert!(last_narrow < next.id());
        assert_eq!(next.placeholder(), "__template_arg_4294967296");
    }

    #[test]
    fn composer_keeps_parts_in_order() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::TypeScript);
        let value = builder.arg("value", ["number"]);
        let template = builder
            .statement("log")
            .text("console.log(")
            .param(&value)
            .text(");")
            .build();

        assert_eq!(template.name(), "log");
        assert_eq!(template.kind(), TemplateKind::Statement);
        assert_eq!(template.parts().len(), 3);
        assert_eq!(template.parameters().count(), 1);
    }
}

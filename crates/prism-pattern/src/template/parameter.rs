//! Active template parameters.
//!
//! A parameter is a typed hole in a template. When the template is rendered
//! the hole is filled with a placeholder identifier that encodes the
//! parameter id, so the pattern builder can recover the parameter from the
//! parsed tree.

use std::fmt;

use prism_syntax::LanguageProfile;

use crate::context::Context;
use crate::pattern::{Cardinality, PatternNode};
use crate::template::Template;

/// Common prefix of every placeholder.
pub const PLACEHOLDER_PREFIX: &str = "__template_";

/// Identifier of a template parameter, unique within its
/// [`TemplateBuilder`](crate::TemplateBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(u64);

impl ParameterId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A sub-template: either an inline template or a reference to a pattern
/// defined elsewhere in the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum SubTemplate {
    /// A template compiled in place.
    Inline(Template),
    /// The name of a pattern defined with
    /// [`RegistryBuilder::define`](crate::RegistryBuilder::define).
    Reference(String),
}

impl SubTemplate {
    /// Creates a reference to the named pattern.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// Returns the inline template, if any.
    #[must_use]
    pub const fn as_inline(&self) -> Option<&Template> {
        match self {
            Self::Inline(template) => Some(template),
            Self::Reference(_) => None,
        }
    }
}

impl From<Template> for SubTemplate {
    fn from(template: Template) -> Self {
        Self::Inline(template)
    }
}

/// Binds a concrete node whose kind is in an allowed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateArgument {
    /// Name under which the node is bound.
    pub name: String,
    /// Allowed concrete node kinds.
    pub kinds: Vec<String>,
}

/// Matches a statement block and captures its range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateBlock {
    /// Bindings that become active inside the block.
    pub context: Context,
}

/// Matches a delimited list whose entries match one of several parts.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAggregation {
    /// Name under which part ranges are recorded.
    pub name: String,
    /// Aggregatable node kind, e.g. `argument_list`.
    pub node_kind: String,
    /// Allowed shapes of a single entry.
    pub parts: Vec<SubTemplate>,
    /// Shape of the leading start expression, for kinds that carry one.
    pub start: Option<SubTemplate>,
    /// Bindings that become active inside each part.
    pub context: Context,
    /// Allowed number of entries.
    pub cardinality: Cardinality,
}

impl TemplateAggregation {
    /// Creates an aggregation over `node_kind` with the given parts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        node_kind: impl Into<String>,
        parts: impl IntoIterator<Item = SubTemplate>,
    ) -> Self {
        Self {
            name: name.into(),
            node_kind: node_kind.into(),
            parts: parts.into_iter().collect(),
            start: None,
            context: Context::new(),
            cardinality: Cardinality::default(),
        }
    }

    /// Sets the start template.
    #[must_use]
    pub fn with_start(mut self, start: impl Into<SubTemplate>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the bindings active inside each part.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Sets the allowed number of entries.
    #[must_use]
    pub const fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }
}

/// Matches a method/attribute chain of unbounded length.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateChain {
    /// Name under which chain ranges are recorded.
    pub name: String,
    /// Shape of the receiver at the bottom of the chain.
    pub start: SubTemplate,
    /// Allowed shapes of a single link.
    pub links: Vec<SubTemplate>,
    /// Minimum number of links.
    pub min_links: usize,
    /// Bindings that become active inside the chain.
    pub context: Context,
}

impl TemplateChain {
    /// Creates a chain with the given start and links, requiring one link.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        start: impl Into<SubTemplate>,
        links: impl IntoIterator<Item = SubTemplate>,
    ) -> Self {
        Self {
            name: name.into(),
            start: start.into(),
            links: links.into_iter().collect(),
            min_links: 1,
            context: Context::new(),
        }
    }

    /// Sets the minimum number of links.
    #[must_use]
    pub const fn with_min_links(mut self, min_links: usize) -> Self {
        self.min_links = min_links;
        self
    }

    /// Sets the bindings active inside the chain.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// Matches an identifier whose text is supplied by the caller's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContextVariable {
    /// Variable name looked up in the [`Context`].
    pub name: String,
}

/// The kind-specific data of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// See [`TemplateArgument`].
    Argument(TemplateArgument),
    /// See [`TemplateBlock`].
    Block(TemplateBlock),
    /// See [`TemplateAggregation`].
    Aggregation(TemplateAggregation),
    /// See [`TemplateChain`].
    Chain(TemplateChain),
    /// See [`TemplateContextVariable`].
    ContextVariable(TemplateContextVariable),
}

impl ParameterKind {
    const fn tag(&self) -> &'static str {
        match self {
            Self::Argument(_) => "arg",
            Self::Block(_) => "block",
            Self::Aggregation(_) => "agg",
            Self::Chain(_) => "chain",
            Self::ContextVariable(_) => "context_variable",
        }
    }
}

/// A parameter with its issued id.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameter {
    id: ParameterId,
    kind: ParameterKind,
}

impl TemplateParameter {
    pub(crate) const fn new(id: ParameterId, kind: ParameterKind) -> Self {
        Self { id, kind }
    }

    /// Returns the parameter id.
    #[must_use]
    pub const fn id(&self) -> ParameterId {
        self.id
    }

    /// Returns the kind-specific data.
    #[must_use]
    pub const fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// Renders the placeholder identifier, e.g. `__template_arg_3`.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("{PLACEHOLDER_PREFIX}{}_{}", self.kind.tag(), self.id)
    }

    /// Builds the pattern node standing in for this parameter.
    ///
    /// `kind` is the concrete kind of the placeholder node and `field` the
    /// field it occupies in its parent. A start template only takes effect
    /// for aggregatable kinds that carry a start expression.
    pub(crate) fn to_pattern_node(
        &self,
        kind: &'static str,
        field: Option<&'static str>,
        profile: &LanguageProfile,
    ) -> PatternNode {
        match &self.kind {
            ParameterKind::Argument(arg) => PatternNode::Argument {
                name: arg.name.clone(),
                kinds: arg.kinds.clone(),
                field,
            },
            ParameterKind::Block(block) => PatternNode::Block {
                field,
                context: block.context.clone(),
            },
            ParameterKind::Aggregation(agg) => PatternNode::Aggregation {
                name: agg.name.clone(),
                node_kind: agg.node_kind.clone(),
                field,
                has_start: agg.start.is_some()
                    && profile
                        .aggregatable(&agg.node_kind)
                        .is_some_and(|config| config.has_start),
                cardinality: agg.cardinality,
                context: agg.context.clone(),
            },
            ParameterKind::Chain(chain) => PatternNode::Chain {
                name: chain.name.clone(),
                field,
                min_links: chain.min_links,
                context: chain.context.clone(),
            },
            ParameterKind::ContextVariable(variable) => PatternNode::ContextVariable {
                name: variable.name.clone(),
                kind,
                field,
            },
        }
    }
}

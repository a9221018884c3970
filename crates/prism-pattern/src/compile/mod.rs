//! Template compilation.
//!
//! A template is rendered to source, parsed, and walked into a
//! [`PatternNode`] tree. Aggregations and chains need a second pass: their
//! parts, starts and links are compiled inside a context that makes them
//! parse in the right syntactic position, and the relevant subtree is cut
//! out of the result.

mod tree_builder;

use std::collections::BTreeSet;

use prism_syntax::{
    AGGREGATION_PLACEHOLDER, AGGREGATION_START_PLACEHOLDER, AggregatableKind, LINK_PLACEHOLDER,
    LanguageProfile, Parser, contains_error,
};
use tracing::debug;
use tree_sitter::Node;

use crate::error::PatternError;
use crate::pattern::{Pattern, PatternNode};
use crate::template::code_string::{aggregatable_config, render_sub_template};
use crate::template::{
    CodeString, ParameterKind, SubTemplate, Template, TemplateAggregation, TemplateChain,
    TemplateKind,
};

use tree_builder::TreeBuilder;

pub(crate) const COMPILE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::compile");

/// A sub-pattern that is either compiled in place or defined elsewhere.
#[derive(Debug)]
pub(crate) enum CompiledSub {
    Inline(Box<Compiled>),
    Reference(String),
}

#[derive(Debug)]
pub(crate) struct CompiledAggregation {
    pub(crate) name: String,
    pub(crate) node_kind: String,
    pub(crate) parts: Vec<CompiledSub>,
    pub(crate) start: Option<CompiledSub>,
}

#[derive(Debug)]
pub(crate) struct CompiledChain {
    pub(crate) name: String,
    pub(crate) start: CompiledSub,
    pub(crate) links: Vec<CompiledSub>,
}

/// A compiled pattern whose decorators still own their sub-patterns.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) pattern: Pattern,
    pub(crate) aggregations: Vec<CompiledAggregation>,
    pub(crate) chains: Vec<CompiledChain>,
}

/// Compiles templates for one language.
pub(crate) struct Compiler<'a> {
    parser: &'a mut Parser,
    profile: &'static LanguageProfile,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(parser: &'a mut Parser) -> Self {
        let profile = parser.language().profile();
        Self { parser, profile }
    }

    /// Compiles a complete statement or expression template.
    pub(crate) fn compile(&mut self, template: &Template) -> Result<Compiled, PatternError> {
        let code = CodeString::from_template(template, self.profile)?;
        let root = self.tree(template.name(), &code, template.kind())?;
        self.finish(template, root)
    }

    /// Compiles an additional part of an existing aggregation.
    pub(crate) fn compile_part(
        &mut self,
        aggregation: &TemplateAggregation,
        part: &Template,
    ) -> Result<Compiled, PatternError> {
        let config = aggregatable_config(aggregation, self.profile)?;
        let start = self.start_code(aggregation, config)?;
        self.part(part, config, start)
    }

    /// Compiles an additional link of an existing chain.
    pub(crate) fn compile_link(&mut self, link: &Template) -> Result<Compiled, PatternError> {
        self.link(link)
    }

    fn finish(&mut self, template: &Template, root: PatternNode) -> Result<Compiled, PatternError> {
        let mut compiled = Compiled {
            pattern: Pattern::new(template.clone(), root),
            aggregations: Vec::new(),
            chains: Vec::new(),
        };

        let mut seen = BTreeSet::new();
        for param in template.parameters() {
            if !seen.insert(param.id()) {
                continue;
            }
            match param.kind() {
                ParameterKind::Aggregation(aggregation) => {
                    compiled.aggregations.push(self.aggregation(aggregation)?);
                }
                ParameterKind::Chain(chain) => compiled.chains.push(self.chain(chain)?),
                ParameterKind::Argument(_)
                | ParameterKind::Block(_)
                | ParameterKind::ContextVariable(_) => {}
            }
        }

        debug!(
            target: COMPILE_TARGET,
            template = template.name(),
            priority = compiled.pattern.priority(),
            aggregations = compiled.aggregations.len(),
            chains = compiled.chains.len(),
            "compiled pattern"
        );
        Ok(compiled)
    }

    fn aggregation(
        &mut self,
        aggregation: &TemplateAggregation,
    ) -> Result<CompiledAggregation, PatternError> {
        let config = aggregatable_config(aggregation, self.profile)?;
        let start_code = self.start_code(aggregation, config)?;

        let mut parts = Vec::with_capacity(aggregation.parts.len());
        for part in &aggregation.parts {
            parts.push(match part {
                SubTemplate::Inline(template) => {
                    CompiledSub::Inline(Box::new(self.part(template, config, start_code.clone())?))
                }
                SubTemplate::Reference(name) => CompiledSub::Reference(name.clone()),
            });
        }

        let start = match (&aggregation.start, config.has_start) {
            (Some(SubTemplate::Inline(template)), true) => {
                Some(CompiledSub::Inline(Box::new(self.start(template, config)?)))
            }
            (Some(SubTemplate::Reference(name)), true) => Some(CompiledSub::Reference(name.clone())),
            (None, true) => {
                return Err(PatternError::MissingStartTemplate {
                    name: aggregation.name.clone(),
                    node_kind: aggregation.node_kind.clone(),
                });
            }
            (_, false) => None,
        };

        Ok(CompiledAggregation {
            name: aggregation.name.clone(),
            node_kind: aggregation.node_kind.clone(),
            parts,
            start,
        })
    }

    /// Renders the start expression embedded in the parts' context.
    fn start_code(
        &self,
        aggregation: &TemplateAggregation,
        config: &AggregatableKind,
    ) -> Result<Option<CodeString>, PatternError> {
        if !config.has_start {
            return Ok(None);
        }
        match &aggregation.start {
            Some(SubTemplate::Inline(template)) => {
                Ok(Some(CodeString::from_template(template, self.profile)?))
            }
            Some(reference @ SubTemplate::Reference(_)) => Ok(Some(CodeString::new(
                render_sub_template(reference, self.profile)?,
            ))),
            None => Ok(None),
        }
    }

    fn part(
        &mut self,
        template: &Template,
        config: &AggregatableKind,
        start: Option<CodeString>,
    ) -> Result<Compiled, PatternError> {
        let part_code = CodeString::from_template(template, self.profile)?;
        let mut context = CodeString::new(config.context_template);
        if let Some(start_code) = start {
            context = context.replace(AGGREGATION_START_PLACEHOLDER, start_code);
        }
        let code = context.replace(AGGREGATION_PLACEHOLDER, part_code);
        let tree = self.tree(template.name(), &code, TemplateKind::Statement)?;
        let path = self.context_path(template.name(), config, AGGREGATION_PLACEHOLDER)?;
        let root = cut(&tree, &path).ok_or_else(|| PatternError::path_not_found(template.name(), &path))?;
        self.finish(template, root)
    }

    fn start(
        &mut self,
        template: &Template,
        config: &AggregatableKind,
    ) -> Result<Compiled, PatternError> {
        let start_code = CodeString::from_template(template, self.profile)?;
        let code = CodeString::new(config.context_template)
            .replace(AGGREGATION_START_PLACEHOLDER, start_code);
        let tree = self.tree(template.name(), &code, TemplateKind::Statement)?;
        let path = self.context_path(template.name(), config, AGGREGATION_START_PLACEHOLDER)?;
        let root = cut(&tree, &path).ok_or_else(|| PatternError::path_not_found(template.name(), &path))?;
        self.finish(template, root)
    }

    /// Finds where a placeholder sits in the bare context template.
    fn context_path(
        &mut self,
        template: &str,
        config: &AggregatableKind,
        placeholder: &str,
    ) -> Result<Vec<usize>, PatternError> {
        let bare = CodeString::new(config.context_template);
        let tree = self.tree(template, &bare, TemplateKind::Statement)?;
        tree.path_to_text(placeholder)
            .ok_or_else(|| PatternError::path_not_found(template, &[]))
    }

    fn chain(&mut self, chain: &TemplateChain) -> Result<CompiledChain, PatternError> {
        let start = match &chain.start {
            SubTemplate::Inline(template) => {
                let mut compiled = self.compile(template)?;
                compiled.pattern.root_mut().set_field(None);
                CompiledSub::Inline(Box::new(compiled))
            }
            SubTemplate::Reference(name) => CompiledSub::Reference(name.clone()),
        };

        let mut links = Vec::with_capacity(chain.links.len());
        for link in &chain.links {
            links.push(match link {
                SubTemplate::Inline(template) => CompiledSub::Inline(Box::new(self.link(template)?)),
                SubTemplate::Reference(name) => CompiledSub::Reference(name.clone()),
            });
        }

        Ok(CompiledChain {
            name: chain.name.clone(),
            start,
            links,
        })
    }

    /// Compiles a link as `a.<link>` and replaces its receiver with a
    /// continuation.
    fn link(&mut self, template: &Template) -> Result<Compiled, PatternError> {
        let chains = self.profile.chains();
        let code = CodeString::from_template(template, self.profile)?
            .insert_into(self.profile.link_context(), LINK_PLACEHOLDER);
        let tree = self.tree(template.name(), &code, TemplateKind::Statement)?;

        let mut root = cut(&tree, chains.path_to_first_link)
            .ok_or_else(|| PatternError::path_not_found(template.name(), chains.path_to_first_link))?;
        let kind = match &root {
            PatternNode::Regular { kind, .. } => *kind,
            _ => "",
        };
        let chainable = chains
            .chainable(kind)
            .ok_or_else(|| PatternError::UnsupportedChain {
                template: template.name().to_owned(),
                kind: kind.to_owned(),
                language: self.profile.language(),
            })?;

        let receiver = root
            .follow_mut(chainable.path_to_next_link)
            .ok_or_else(|| PatternError::path_not_found(template.name(), chainable.path_to_next_link))?;
        *receiver = PatternNode::ChainContinuation {
            field: receiver.field(),
        };
        self.finish(template, root)
    }

    /// Parses `code` and builds the pattern tree, unwrapping the top node.
    fn tree(
        &mut self,
        template: &str,
        code: &CodeString,
        kind: TemplateKind,
    ) -> Result<PatternNode, PatternError> {
        let parsed = self.parser.parse(code.raw())?;
        let invalid = |detail: String| PatternError::InvalidTemplateSource {
            template: template.to_owned(),
            language: self.profile.language(),
            detail,
            source_text: code.raw().to_owned(),
        };
        if parsed.has_errors() || contains_error(parsed.root_node()) {
            let detail = parsed
                .errors()
                .first()
                .map_or_else(|| "syntax error".to_owned(), ToString::to_string);
            return Err(invalid(detail));
        }

        let start = match kind {
            TemplateKind::Statement => Some(parsed.root_node()),
            TemplateKind::Expression => {
                first_of_kind(parsed.root_node(), self.profile.statement_kind())
                    .and_then(|statement| statement.named_child(0))
            }
        }
        .ok_or_else(|| invalid("no expression statement".to_owned()))?;

        let builder = TreeBuilder {
            template,
            source: parsed.source(),
            table: code.table(),
            profile: self.profile,
        };
        let root = builder.transform(start, None)?;
        match root {
            PatternNode::Regular {
                kind: top,
                mut children,
                ..
            } if top == self.profile.top_kind() => {
                if children.len() != 1 {
                    return Err(invalid(format!("{} top-level statements", children.len())));
                }
                let mut statement = children
                    .pop()
                    .ok_or_else(|| invalid("no statement".to_owned()))?;
                statement.set_field(None);
                Ok(statement)
            }
            other => Ok(other),
        }
    }
}

/// Copies the subtree at `path` and detaches it from its parent.
fn cut(tree: &PatternNode, path: &[usize]) -> Option<PatternNode> {
    let mut root = tree.follow(path)?.clone();
    root.set_field(None);
    Some(root)
}

fn first_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| first_of_kind(child, kind))
}

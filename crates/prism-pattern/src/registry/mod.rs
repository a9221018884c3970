//! Two-phase pattern registry.
//!
//! A [`RegistryBuilder`] compiles templates into an arena of patterns.
//! Sub-patterns may refer to other patterns by name before those are
//! defined; a reference reserves an arena slot that a later definition
//! fills. [`RegistryBuilder::freeze`] checks that every slot is filled and
//! produces the immutable [`PatternRegistry`] the matcher reads.

use std::collections::HashMap;

use prism_syntax::{Parser, SupportedLanguage};
use tracing::{debug, info};

use crate::compile::{Compiled, CompiledSub, Compiler};
use crate::context::Context;
use crate::error::PatternError;
use crate::pattern::{ANY_KIND, AggregationDecorator, ChainDecorator, Pattern, PatternId};
use crate::template::{ParameterKind, SubTemplate, Template, TemplateLookup};

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

#[derive(Debug, Clone)]
struct TopLevel {
    id: PatternId,
    package: Option<String>,
}

/// Collects and compiles patterns for one language.
#[derive(Debug)]
pub struct RegistryBuilder {
    parser: Parser,
    slots: Vec<Option<Pattern>>,
    names: HashMap<String, PatternId>,
    top_level: Vec<TopLevel>,
}

impl RegistryBuilder {
    /// Creates an empty builder for `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser for `language` cannot be created.
    pub fn new(language: SupportedLanguage) -> Result<Self, PatternError> {
        Ok(Self {
            parser: Parser::new(language)?,
            slots: Vec::new(),
            names: HashMap::new(),
            top_level: Vec::new(),
        })
    }

    /// Returns the language of the registered patterns.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.parser.language()
    }

    /// Compiles `template` and registers it as a top-level pattern that the
    /// traversal tries at every node.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not compile, targets another
    /// language or reuses a defined name.
    pub fn register(&mut self, template: &Template) -> Result<PatternId, PatternError> {
        self.register_top_level(template, None)
    }

    /// Registers a top-level pattern that belongs to `package`.
    ///
    /// # Errors
    ///
    /// See [`RegistryBuilder::register`].
    pub fn register_in_package(
        &mut self,
        package: &str,
        template: &Template,
    ) -> Result<PatternId, PatternError> {
        self.register_top_level(template, Some(package.to_owned()))
    }

    fn register_top_level(
        &mut self,
        template: &Template,
        package: Option<String>,
    ) -> Result<PatternId, PatternError> {
        let id = self.define(template)?;
        info!(
            target: REGISTRY_TARGET,
            pattern = template.name(),
            package = package.as_deref(),
            "registered pattern"
        );
        self.top_level.push(TopLevel { id, package });
        Ok(id)
    }

    /// Compiles `template` and makes it available to references without
    /// trying it at every node.
    ///
    /// # Errors
    ///
    /// See [`RegistryBuilder::register`].
    pub fn define(&mut self, template: &Template) -> Result<PatternId, PatternError> {
        self.check_language(template)?;
        let reserved = self.names.get(template.name()).copied();
        if reserved.is_some_and(|id| self.slot(id).is_some()) {
            return Err(PatternError::DuplicatePattern {
                name: template.name().to_owned(),
            });
        }

        let compiled = Compiler::new(&mut self.parser).compile(template)?;
        let id = match reserved {
            Some(id) => {
                self.fill(id, compiled);
                id
            }
            None => {
                let id = self.insert(compiled);
                self.names.insert(template.name().to_owned(), id);
                id
            }
        };
        Ok(id)
    }

    /// Returns the id of the pattern defined under `name`, reserving a slot
    /// when the name is not defined yet.
    pub fn reference(&mut self, name: &str) -> PatternId {
        if let Some(id) = self.names.get(name) {
            return *id;
        }
        let id = PatternId::new(self.slots.len());
        self.slots.push(None);
        self.names.insert(name.to_owned(), id);
        debug!(target: REGISTRY_TARGET, pattern = name, "reserved reference");
        id
    }

    /// Adds a link to the named chain of an existing pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern or chain does not exist or the link
    /// does not compile.
    pub fn extend_chain(
        &mut self,
        pattern: &str,
        chain: &str,
        link: &SubTemplate,
    ) -> Result<PatternId, PatternError> {
        let owner = self.defined(pattern)?;
        if self.slot(owner).and_then(|found| found.chain(chain)).is_none() {
            return Err(PatternError::UnknownChain {
                pattern: pattern.to_owned(),
                chain: chain.to_owned(),
            });
        }

        let link_id = match link {
            SubTemplate::Inline(template) => {
                self.check_language(template)?;
                let compiled = Compiler::new(&mut self.parser).compile_link(template)?;
                self.insert(compiled)
            }
            SubTemplate::Reference(name) => self.reference(name),
        };
        if let Some(decorator) = self.slot_mut(owner).and_then(|found| found.chain_mut(chain)) {
            decorator.links.push(link_id);
        }
        debug!(target: REGISTRY_TARGET, pattern, chain, "extended chain");
        Ok(link_id)
    }

    /// Adds a part to the named aggregation of an existing pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern or aggregation does not exist or the
    /// part does not compile.
    pub fn extend_aggregation(
        &mut self,
        pattern: &str,
        aggregation: &str,
        part: &SubTemplate,
    ) -> Result<PatternId, PatternError> {
        let owner = self.defined(pattern)?;
        let unknown = || PatternError::UnknownAggregation {
            pattern: pattern.to_owned(),
            aggregation: aggregation.to_owned(),
        };
        let definition = self
            .slot(owner)
            .and_then(|found| {
                found
                    .template()
                    .parameters()
                    .find_map(|param| match param.kind() {
                        ParameterKind::Aggregation(agg) if agg.name == aggregation => {
                            Some(agg.clone())
                        }
                        _ => None,
                    })
            })
            .ok_or_else(unknown)?;

        let part_id = match part {
            SubTemplate::Inline(template) => {
                self.check_language(template)?;
                let compiled = Compiler::new(&mut self.parser).compile_part(&definition, template)?;
                self.insert(compiled)
            }
            SubTemplate::Reference(name) => self.reference(name),
        };
        let decorator = self
            .slot_mut(owner)
            .and_then(|found| found.aggregation_mut(aggregation))
            .ok_or_else(unknown)?;
        decorator.parts.push(part_id);
        debug!(target: REGISTRY_TARGET, pattern, aggregation, "extended aggregation");
        Ok(part_id)
    }

    /// Stops trying the top-level patterns of `package`. Returns how many
    /// were removed. Their definitions stay available to references.
    pub fn remove_package(&mut self, package: &str) -> usize {
        let before = self.top_level.len();
        self.top_level
            .retain(|entry| entry.package.as_deref() != Some(package));
        let removed = before - self.top_level.len();
        info!(target: REGISTRY_TARGET, package, removed, "removed package");
        removed
    }

    /// Produces the immutable registry.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::UnresolvedReference`] if a referenced name
    /// was never defined.
    pub fn freeze(&self) -> Result<PatternRegistry, PatternError> {
        let mut patterns = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            let pattern = slot.as_ref().ok_or_else(|| {
                let name = self
                    .names
                    .iter()
                    .find(|(_, id)| id.index() == index)
                    .map_or_else(|| format!("#{index}"), |(name, _)| name.clone());
                PatternError::unresolved_reference(name)
            })?;
            patterns.push(pattern.clone());
        }

        let mut ordered: Vec<(usize, PatternId)> = self
            .top_level
            .iter()
            .enumerate()
            .map(|(rank, entry)| (rank, entry.id))
            .collect();
        ordered.sort_by_key(|(rank, id)| {
            let priority = patterns.get(id.index()).map_or(0, Pattern::priority);
            (std::cmp::Reverse(priority), *rank)
        });
        let top_level: Vec<PatternId> = ordered.into_iter().map(|(_, id)| id).collect();

        let profile = self.language().profile();
        let mut by_kind: HashMap<String, Vec<PatternId>> = HashMap::new();
        for id in &top_level {
            if let Some(pattern) = patterns.get(id.index()) {
                for kind in pattern.root().root_kinds(profile) {
                    by_kind.entry(kind).or_default().push(*id);
                }
            }
        }

        info!(
            target: REGISTRY_TARGET,
            language = %self.language(),
            patterns = patterns.len(),
            top_level = top_level.len(),
            "froze registry"
        );
        Ok(PatternRegistry {
            language: self.language(),
            patterns,
            top_level,
            by_kind,
            names: self.names.clone(),
        })
    }

    fn check_language(&self, template: &Template) -> Result<(), PatternError> {
        if template.language() == self.language() {
            Ok(())
        } else {
            Err(PatternError::LanguageMismatch {
                template: template.name().to_owned(),
                expected: self.language(),
                found: template.language(),
            })
        }
    }

    fn defined(&self, name: &str) -> Result<PatternId, PatternError> {
        self.names
            .get(name)
            .copied()
            .filter(|id| self.slot(*id).is_some())
            .ok_or_else(|| PatternError::unknown_pattern(name))
    }

    fn slot(&self, id: PatternId) -> Option<&Pattern> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: PatternId) -> Option<&mut Pattern> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn insert(&mut self, compiled: Compiled) -> PatternId {
        let id = PatternId::new(self.slots.len());
        self.slots.push(None);
        self.fill(id, compiled);
        id
    }

    /// Stores `compiled` at `id`, first moving its sub-patterns into the
    /// arena.
    fn fill(&mut self, id: PatternId, compiled: Compiled) {
        let Compiled {
            mut pattern,
            aggregations,
            chains,
        } = compiled;

        for aggregation in aggregations {
            let parts = aggregation
                .parts
                .into_iter()
                .map(|part| self.insert_sub(part))
                .collect();
            let start = aggregation.start.map(|start| self.insert_sub(start));
            pattern.decorate_aggregation(
                aggregation.name,
                AggregationDecorator {
                    node_kind: aggregation.node_kind,
                    parts,
                    start,
                },
            );
        }
        for chain in chains {
            let start = self.insert_sub(chain.start);
            let links = chain
                .links
                .into_iter()
                .map(|link| self.insert_sub(link))
                .collect();
            pattern.decorate_chain(chain.name, ChainDecorator { start, links });
        }

        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = Some(pattern);
        }
    }

    fn insert_sub(&mut self, sub: CompiledSub) -> PatternId {
        match sub {
            CompiledSub::Inline(compiled) => self.insert(*compiled),
            CompiledSub::Reference(name) => self.reference(&name),
        }
    }
}

/// An immutable set of compiled patterns.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    language: SupportedLanguage,
    patterns: Vec<Pattern>,
    top_level: Vec<PatternId>,
    by_kind: HashMap<String, Vec<PatternId>>,
    names: HashMap<String, PatternId>,
}

impl PatternRegistry {
    /// Returns the language of the patterns.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the pattern with `id`.
    #[must_use]
    pub fn get(&self, id: PatternId) -> Option<&Pattern> {
        self.patterns.get(id.index())
    }

    /// Returns the id of the pattern defined under `name`.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<PatternId> {
        self.names.get(name).copied()
    }

    /// Returns the top-level patterns in the order they are tried.
    #[must_use]
    pub fn top_level(&self) -> &[PatternId] {
        &self.top_level
    }

    /// Returns the number of patterns, sub-patterns included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns whether the registry holds no pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the top-level patterns whose root may match a node of
    /// `kind`, in the order they are tried.
    #[must_use]
    pub fn candidates(&self, kind: &str) -> Vec<PatternId> {
        let specific = self.by_kind.get(kind).map_or(&[][..], Vec::as_slice);
        let any = self.by_kind.get(ANY_KIND).map_or(&[][..], Vec::as_slice);
        if any.is_empty() || kind == ANY_KIND {
            return specific.to_vec();
        }
        self.top_level
            .iter()
            .filter(|id| specific.contains(id) || any.contains(id))
            .copied()
            .collect()
    }

    /// Renders a draft of the pattern defined under `name`. Referenced
    /// patterns are drafted from this registry.
    #[must_use]
    pub fn draft(&self, name: &str, context: &Context) -> Option<String> {
        self.template(name)
            .map(|template| template.draft_with(self.language.profile(), context, self))
    }
}

impl TemplateLookup for PatternRegistry {
    fn template(&self, name: &str) -> Option<&Template> {
        self.id_of(name)
            .and_then(|id| self.get(id))
            .map(Pattern::template)
    }
}

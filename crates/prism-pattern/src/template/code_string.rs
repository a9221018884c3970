//! Rendered template source with a parameter table.

use std::ops::Range;

use prism_syntax::{
    AGGREGATION_PLACEHOLDER, AGGREGATION_START_PLACEHOLDER, AggregatableKind, LanguageProfile,
};

use crate::error::PatternError;
use crate::template::{
    ParameterKind, SubTemplate, Template, TemplateAggregation, TemplateParameter, TemplatePart,
};

/// Maps byte ranges of a rendered source to the parameters rendered there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    entries: Vec<(Range<usize>, TemplateParameter)>,
}

impl ParameterTable {
    /// Returns the parameter rendered exactly at `range`.
    #[must_use]
    pub fn resolve(&self, range: &Range<usize>) -> Option<&TemplateParameter> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == range)
            .map(|(_, param)| param)
    }

    /// Returns the number of recorded parameters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no parameter is recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = (&Range<usize>, &TemplateParameter)> {
        self.entries.iter().map(|(range, param)| (range, param))
    }

    fn insert(&mut self, range: Range<usize>, param: TemplateParameter) {
        self.entries.push((range, param));
    }

    fn shift(&mut self, offset: usize) {
        for (range, _) in &mut self.entries {
            *range = range.start + offset..range.end + offset;
        }
    }

    /// Moves entries starting at or after `bound` by `added - removed`.
    fn shift_after(&mut self, bound: usize, removed: usize, added: usize) {
        for (range, _) in &mut self.entries {
            if range.start >= bound {
                *range = range.start - removed + added..range.end - removed + added;
            }
        }
    }

    fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }
}

/// Source text produced from a template, together with the ranges where
/// parameters were rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeString {
    raw: String,
    table: ParameterTable,
}

impl CodeString {
    /// Wraps plain source without parameters.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            table: ParameterTable::default(),
        }
    }

    /// Renders `template` for `profile`'s language.
    ///
    /// # Errors
    ///
    /// Fails when an aggregation names a kind the language cannot aggregate
    /// or lacks a required start template.
    pub fn from_template(
        template: &Template,
        profile: &LanguageProfile,
    ) -> Result<Self, PatternError> {
        let mut rendered = Self::default();
        for part in template.parts() {
            match part {
                TemplatePart::Text(text) => rendered.raw.push_str(text),
                TemplatePart::Param(param) => {
                    let code = render_parameter(param, profile)?;
                    let start = rendered.raw.len();
                    rendered.raw.push_str(&code);
                    rendered.table.insert(start..rendered.raw.len(), param.clone());
                }
            }
        }
        Ok(rendered)
    }

    /// Returns the rendered source.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parameter table.
    #[must_use]
    pub const fn table(&self) -> &ParameterTable {
        &self.table
    }

    /// Replaces the first occurrence of `placeholder` with `replacement`,
    /// merging its parameter table. The string is returned unchanged when
    /// the placeholder does not occur.
    #[must_use]
    pub fn replace(mut self, placeholder: &str, mut replacement: Self) -> Self {
        let Some(offset) = self.raw.find(placeholder) else {
            return self;
        };
        let bound = offset + placeholder.len();
        self.table
            .shift_after(bound, placeholder.len(), replacement.raw.len());
        replacement.table.shift(offset);
        self.table.merge(replacement.table);
        self.raw.replace_range(offset..bound, &replacement.raw);
        self
    }

    /// Embeds this code string in `target` at `placeholder`.
    #[must_use]
    pub fn insert_into(self, target: &str, placeholder: &str) -> Self {
        Self::new(target).replace(placeholder, self)
    }
}

fn render_parameter(
    param: &TemplateParameter,
    profile: &LanguageProfile,
) -> Result<String, PatternError> {
    match param.kind() {
        ParameterKind::Aggregation(aggregation) => render_aggregation(param, aggregation, profile),
        ParameterKind::Argument(_)
        | ParameterKind::Block(_)
        | ParameterKind::Chain(_)
        | ParameterKind::ContextVariable(_) => Ok(param.placeholder()),
    }
}

/// Renders an aggregation so it parses as its aggregatable kind.
///
/// The first part is rendered twice so that kinds which need two entries
/// to be recognised, such as tuples, still parse as that kind.
fn render_aggregation(
    param: &TemplateParameter,
    aggregation: &TemplateAggregation,
    profile: &LanguageProfile,
) -> Result<String, PatternError> {
    let config = aggregatable_config(aggregation, profile)?;
    let inner = match aggregation.parts.first() {
        Some(part) => {
            let code = render_sub_template(part, profile)?;
            format!("{code}{} {code}", config.delimiter_token)
        }
        None => param.placeholder(),
    };

    if !config.has_start {
        return Ok(format!("{}{inner}{}", config.start_token, config.end_token));
    }
    let start = aggregation
        .start
        .as_ref()
        .ok_or_else(|| PatternError::MissingStartTemplate {
            name: aggregation.name.clone(),
            node_kind: aggregation.node_kind.clone(),
        })?;
    let start_code = render_sub_template(start, profile)?;
    Ok(config
        .context_template
        .replacen(AGGREGATION_START_PLACEHOLDER, &start_code, 1)
        .replacen(AGGREGATION_PLACEHOLDER, &inner, 1))
}

pub(crate) fn aggregatable_config(
    aggregation: &TemplateAggregation,
    profile: &LanguageProfile,
) -> Result<&'static AggregatableKind, PatternError> {
    profile
        .aggregatable(&aggregation.node_kind)
        .ok_or_else(|| PatternError::UnsupportedAggregation {
            name: aggregation.name.clone(),
            node_kind: aggregation.node_kind.clone(),
            language: profile.language(),
        })
}

/// Renders a sub-template's source. References render as an empty
/// identifier: the surrounding placeholder is atomic, so only its shape as
/// an expression matters.
pub(crate) fn render_sub_template(
    sub: &SubTemplate,
    profile: &LanguageProfile,
) -> Result<String, PatternError> {
    match sub {
        SubTemplate::Inline(template) => Ok(CodeString::from_template(template, profile)?.raw),
        SubTemplate::Reference(_) => Ok(profile.argument_draft("identifier")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateBuilder;
    use prism_syntax::SupportedLanguage;

    #[test]
    fn table_records_placeholder_ranges() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let value = builder.arg("value", ["integer"]);
        let template = builder
            .statement("assign")
            .text("x = ")
            .param(&value)
            .build();

        let code = CodeString::from_template(&template, SupportedLanguage::Python.profile())
            .expect("render");

        assert_eq!(code.raw(), "x = __template_arg_0");
        let found = code.table().resolve(&(4..20)).expect("entry");
        assert_eq!(found.id(), value.id());
    }

    #[test]
    fn replace_shifts_both_tables() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let outer_arg = builder.arg("outer", ["identifier"]);
        let inner_arg = builder.arg("inner", ["identifier"]);
        let outer = CodeString::from_template(
            &builder
                .statement("outer")
                .text("f(__agg__, ")
                .param(&outer_arg)
                .text(")")
                .build(),
            SupportedLanguage::Python.profile(),
        )
        .expect("render outer");
        let inner = CodeString::from_template(
            &builder.expression("inner").text("g(").param(&inner_arg).text(")").build(),
            SupportedLanguage::Python.profile(),
        )
        .expect("render inner");

        let combined = outer.replace("__agg__", inner);

        assert_eq!(combined.raw(), "f(g(__template_arg_1), __template_arg_0)");
        assert!(combined.table().resolve(&(4..20)).is_some());
        assert!(combined.table().resolve(&(23..39)).is_some());
        assert_eq!(combined.table().len(), 2);
    }

    #[test]
    fn insert_into_embeds_at_the_placeholder() {
        let link = CodeString::new("where(1)");
        assert_eq!(link.insert_into("a.<link>", "<link>").raw(), "a.where(1)");
    }

    #[test]
    fn aggregation_renders_between_its_tokens() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let part = builder.expression("part").text("1").build();
        let args = builder.aggregation(TemplateAggregation::new(
            "args",
            "argument_list",
            [SubTemplate::from(part)],
        ));
        let template = builder.statement("call").text("f").param(&args).build();

        let code = CodeString::from_template(&template, SupportedLanguage::Python.profile())
            .expect("render");

        assert_eq!(code.raw(), "f(1, 1)");
        assert!(code.table().resolve(&(1..7)).is_some());
    }

    #[test]
    fn subscript_aggregation_requires_a_start() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let items = builder.aggregation(TemplateAggregation::new("items", "subscript", []));
        let template = builder.statement("index").param(&items).build();

        let error = CodeString::from_template(&template, SupportedLanguage::Python.profile())
            .expect_err("missing start");

        assert!(matches!(error, PatternError::MissingStartTemplate { .. }));
    }
}

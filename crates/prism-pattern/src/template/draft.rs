//! Starter snippets rendered from templates.
//!
//! A draft is the source an editor inserts when the user picks a template:
//! every parameter is replaced by a small piece of code that parses in its
//! position and still matches the template's pattern.

use prism_syntax::LanguageProfile;

use crate::context::Context;
use crate::template::{
    NoTemplates, ParameterKind, SubTemplate, Template, TemplateAggregation, TemplateChain,
    TemplateLookup, TemplatePart,
};

/// Nesting limit for drafts of referenced templates. Deeper references,
/// including self references, draft as an empty identifier.
const MAX_DRAFT_DEPTH: usize = 8;

impl Template {
    /// Renders a draft of this template. References to other templates draft
    /// as empty identifiers.
    #[must_use]
    pub fn draft(&self, profile: &LanguageProfile, context: &Context) -> String {
        self.draft_with(profile, context, &NoTemplates)
    }

    /// Renders a draft, drafting referenced templates found in `lookup`.
    #[must_use]
    pub fn draft_with(
        &self,
        profile: &LanguageProfile,
        context: &Context,
        lookup: &dyn TemplateLookup,
    ) -> String {
        Drafter {
            profile,
            context,
            lookup,
        }
        .template(self, 0)
    }
}

struct Drafter<'a> {
    profile: &'a LanguageProfile,
    context: &'a Context,
    lookup: &'a dyn TemplateLookup,
}

impl Drafter<'_> {
    fn template(&self, template: &Template, depth: usize) -> String {
        let mut draft = String::new();
        for part in template.parts() {
            match part {
                TemplatePart::Text(text) => draft.push_str(text),
                TemplatePart::Param(param) => draft.push_str(&self.parameter(param.kind(), depth)),
            }
        }
        draft
    }

    fn parameter(&self, kind: &ParameterKind, depth: usize) -> String {
        match kind {
            ParameterKind::Argument(argument) => self
                .profile
                .argument_draft(argument.kinds.first().map_or("identifier", String::as_str)),
            ParameterKind::Block(_) => self.profile.block().draft.to_owned(),
            ParameterKind::ContextVariable(variable) => self
                .context
                .get(&variable.name)
                .unwrap_or(&variable.name)
                .to_owned(),
            ParameterKind::Aggregation(aggregation) => self.aggregation(aggregation, depth),
            ParameterKind::Chain(chain) => self.chain(chain, depth),
        }
    }

    fn sub_template(&self, sub: &SubTemplate, depth: usize) -> String {
        let template = match sub {
            SubTemplate::Inline(template) => Some(template),
            SubTemplate::Reference(name) => self.lookup.template(name),
        };
        match template.filter(|_| depth < MAX_DRAFT_DEPTH) {
            Some(found) => self.template(found, depth + 1),
            None => self.profile.argument_draft("identifier"),
        }
    }

    /// Start, opening token, the first part and the closing token.
    fn aggregation(&self, aggregation: &TemplateAggregation, depth: usize) -> String {
        let part = aggregation
            .parts
            .first()
            .map(|first| self.sub_template(first, depth))
            .unwrap_or_default();
        let Some(config) = self.profile.aggregatable(&aggregation.node_kind) else {
            return part;
        };
        let start = aggregation
            .start
            .as_ref()
            .filter(|_| config.has_start)
            .map(|start_template| self.sub_template(start_template, depth))
            .unwrap_or_default();
        format!("{start}{}{part}{}", config.start_token, config.end_token)
    }

    /// The start followed by `min_links` links, cycling through the link
    /// templates.
    fn chain(&self, chain: &TemplateChain, depth: usize) -> String {
        let mut draft = self.sub_template(&chain.start, depth);
        for link in chain.links.iter().cycle().take(chain.min_links) {
            draft.push('.');
            draft.push_str(&self.sub_template(link, depth));
        }
        draft
    }
}

#[cfg(test)]
mod tests {
    use prism_syntax::SupportedLanguage;
    use rstest::rstest;

    use super::*;
    use crate::template::TemplateBuilder;

    #[rstest]
    #[case("string", "print(\"\")")]
    #[case("integer", "print(1)")]
    #[case("call", "print(__empty_call)")]
    fn arguments_draft_by_their_first_kind(#[case] kind: &str, #[case] expected: &str) {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let value = builder.arg("value", [kind]);
        let template = builder
            .statement("print")
            .text("print(")
            .param(&value)
            .text(")")
            .build();

        let draft = template.draft(SupportedLanguage::Python.profile(), &Context::new());

        assert_eq!(draft, expected);
    }

    #[test]
    fn context_variables_draft_as_their_binding() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let frame = builder.context_variable("df");
        let template = builder
            .statement("head")
            .param(&frame)
            .text(".head()")
            .build();
        let profile = SupportedLanguage::Python.profile();

        assert_eq!(template.draft(profile, &Context::new()), "df.head()");
        assert_eq!(
            template.draft(profile, &Context::new().with("df", "sales")),
            "sales.head()"
        );
    }

    #[test]
    fn blocks_aggregations_and_chains_draft_structurally() {
        let mut builder = TemplateBuilder::new(SupportedLanguage::TypeScript);
        let entry = builder.expression("entry").text("1").build();
        let args = builder.aggregation(TemplateAggregation::new(
            "args",
            "arguments",
            [SubTemplate::from(entry)],
        ));
        let start = builder.expression("start").text("db").build();
        let link = builder.expression("link").text("next()").build();
        let query = builder.chain(TemplateChain::new("query", start, [SubTemplate::from(link)]).with_min_links(2));
        let body = builder.block();
        let template = builder
            .statement("guarded")
            .text("if (")
            .param(&query)
            .text(") ")
            .param(&body)
            .text("\nrun")
            .param(&args)
            .text(";")
            .build();

        let draft = template.draft(SupportedLanguage::TypeScript.profile(), &Context::new());

        insta::assert_snapshot!(draft, @r"
        if (db.next().next()) {
          // instructions go here
        }
        run(1);
        ");
    }

    #[test]
    fn self_references_stop_at_the_depth_limit() {
        struct Recursive(Template);
        impl TemplateLookup for Recursive {
            fn template(&self, _name: &str) -> Option<&Template> {
                Some(&self.0)
            }
        }

        let mut builder = TemplateBuilder::new(SupportedLanguage::Python);
        let inner = builder.aggregation(TemplateAggregation::new(
            "items",
            "list",
            [SubTemplate::reference("nested")],
        ));
        let template = builder.expression("nested").param(&inner).build();
        let lookup = Recursive(template.clone());

        let draft = template.draft_with(SupportedLanguage::Python.profile(), &Context::new(), &lookup);

        assert!(draft.starts_with("[[[["));
        assert!(draft.contains("__empty_identifier"));
    }
}

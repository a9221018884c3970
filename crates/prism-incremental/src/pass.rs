//! Rematch passes.
//!
//! A [`RematchPass`] parses the oldest and newest document state of a batch,
//! decides which units need attention and runs the matcher over them.

use prism_pattern::{CodeRange, Context, ContextRange, MatchRecord, PatternMatcher, PatternRegistry};
use prism_syntax::{ParseResult, Parser, SupportedLanguage};
use tracing::debug;

use crate::analysis::{Analysis, EditSummary, Snapshot, analyze};
use crate::debounce::Batch;
use crate::document::Selection;
use crate::error::IncrementalError;
use crate::units::split_units;

const PASS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::pass");

/// Matches and ranges produced by one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RematchOutcome {
    /// Matches found in the rematched units, detached from the tree.
    pub matches: Vec<MatchRecord>,
    /// Ranges where the matches activate context bindings.
    pub context_ranges: Vec<ContextRange>,
    /// Ranges of the units that were rematched.
    pub rematched: Vec<CodeRange>,
    /// Ranges whose previous matches must be dropped.
    pub invalidated: Vec<CodeRange>,
}

/// One scheduler pass over a batch of transactions.
#[derive(Debug)]
pub struct RematchPass {
    before: ParseResult,
    after: ParseResult,
    old_selection: Selection,
    new_selection: Selection,
    edit: EditSummary,
}

impl RematchPass {
    /// Parses the states around `batch`.
    ///
    /// With `force`, every valid unit is rematched regardless of what the
    /// batch changed, as needed after the registry was replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if either document state fails to parse.
    pub fn new(parser: &mut Parser, batch: &Batch, force: bool) -> Result<Self, IncrementalError> {
        let before = parser.parse(&batch.start().text)?;
        let after = parser.parse(&batch.end().text)?;
        Ok(Self {
            before,
            after,
            old_selection: batch.start().selection,
            new_selection: batch.end().selection,
            edit: EditSummary {
                force,
                doc_changed: batch.doc_changed(),
                changed: batch.changed_range(),
            },
        })
    }

    /// Returns the language of the parsed documents.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.after.language()
    }

    /// Returns the parsed document after the batch.
    #[must_use]
    pub const fn document(&self) -> &ParseResult {
        &self.after
    }

    /// Selects the units to rematch and to invalidate.
    #[must_use]
    pub fn analyze(&self) -> Analysis<'_> {
        let profile = self.language().profile();
        let before = Snapshot {
            text: self.before.source(),
            selection: self.old_selection,
            split: split_units(self.before.root_node(), profile),
        };
        let after = Snapshot {
            text: self.after.source(),
            selection: self.new_selection,
            split: split_units(self.after.root_node(), profile),
        };
        analyze(&before, &after, self.edit)
    }

    /// Matches the selected units against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`IncrementalError::LanguageMismatch`] when the registry
    /// targets another language than the document.
    pub fn run(
        &self,
        registry: &PatternRegistry,
        context: &Context,
    ) -> Result<RematchOutcome, IncrementalError> {
        if registry.language() != self.language() {
            return Err(IncrementalError::LanguageMismatch {
                registry: registry.language(),
                document: self.language(),
            });
        }

        let analysis = self.analyze();
        let source = self.after.source();
        let matcher = PatternMatcher::new(registry, source);
        let mut outcome = RematchOutcome {
            rematched: analysis.rematch_ranges(),
            invalidated: analysis.invalidate_ranges(),
            ..RematchOutcome::default()
        };
        for unit in &analysis.rematch {
            let result = matcher.execute(*unit, context);
            outcome.matches.extend(result.to_records(source));
            outcome.context_ranges.extend(result.context_ranges);
        }

        debug!(
            target: PASS_TARGET,
            rematched = outcome.rematched.len(),
            invalidated = outcome.invalidated.len(),
            matches = outcome.matches.len(),
            "rematch pass finished"
        );
        Ok(outcome)
    }
}

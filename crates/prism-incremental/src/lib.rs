//! Incremental re-matching for Prism projections.
//!
//! Re-running every pattern over a whole document on each keystroke does not
//! scale. This crate narrows a pass down to the parts of the document an edit
//! can have affected:
//!
//! - **Units** split a parsed document into independently matchable pieces,
//!   following the language profile's splitting table ([`split_units`]).
//! - **Transactions** describe how the document and its selection moved
//!   ([`EditTransaction`]); a [`Debouncer`] buffers them until typing pauses
//!   and hands them over as a [`Batch`].
//! - **Passes** compare the units before and after a batch, select the units
//!   to rematch and to invalidate, and run the matcher over the former
//!   ([`RematchPass`]).
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//!
//! use prism_incremental::{Debouncer, DocumentState, EditTransaction, RematchPass, Selection};
//! use prism_pattern::{Context, RegistryBuilder};
//! use prism_syntax::{Parser, SupportedLanguage};
//!
//! let registry = RegistryBuilder::new(SupportedLanguage::Python)?.freeze()?;
//! let mut parser = Parser::new(SupportedLanguage::Python)?;
//! let mut debouncer = Debouncer::default();
//!
//! let start = DocumentState::new("a = 1\nb = 2\n", Selection::cursor(5));
//! let now = Instant::now();
//! debouncer.push(EditTransaction::replace(start, 4, 5, "3")?, now);
//!
//! let batch = debouncer.poll(now + Duration::from_millis(200)).expect("batch");
//! let pass = RematchPass::new(&mut parser, &batch, false)?;
//! let outcome = pass.run(&registry, &Context::new())?;
//! assert_eq!(outcome.rematched.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod analysis;
mod debounce;
mod document;
mod error;
mod pass;
mod units;

pub use analysis::Analysis;
pub use debounce::{Batch, DEFAULT_DEBOUNCE, Debouncer};
pub use document::{DocumentState, EditTransaction, Selection};
pub use error::IncrementalError;
pub use pass::{RematchOutcome, RematchPass};
pub use units::{SplitUnits, index_at_or_after, index_at_or_before, split_units, unit_at};

#[cfg(test)]
mod tests;

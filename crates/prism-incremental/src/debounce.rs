//! Debouncing of editor transactions.
//!
//! Transactions are buffered while the user types. Every push restarts the
//! deadline; once it passes without a further push, [`Debouncer::poll`]
//! releases the buffered transactions as one [`Batch`]. The debouncer never
//! reads the clock itself: callers pass `now`, which keeps it deterministic
//! under test.

use std::iter;
use std::time::{Duration, Instant};

use prism_config::Config;
use prism_pattern::CodeRange;
use tracing::trace;

use crate::document::{DocumentState, EditTransaction};

const DEBOUNCE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::debounce");

/// Delay used by [`Debouncer::default`].
pub const DEFAULT_DEBOUNCE: Duration = prism_config::default_debounce();

/// A non-empty run of buffered transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    first: EditTransaction,
    rest: Vec<EditTransaction>,
}

impl Batch {
    /// Creates a batch from buffered transactions, oldest first.
    ///
    /// Returns `None` when `transactions` is empty.
    #[must_use]
    pub fn new(transactions: impl IntoIterator<Item = EditTransaction>) -> Option<Self> {
        let mut buffered = transactions.into_iter();
        let first = buffered.next()?;
        Some(Self {
            first,
            rest: buffered.collect(),
        })
    }

    /// Creates a batch holding one transaction.
    #[must_use]
    pub const fn single(transaction: EditTransaction) -> Self {
        Self {
            first: transaction,
            rest: Vec::new(),
        }
    }

    /// Returns the state before the oldest transaction.
    #[must_use]
    pub const fn start(&self) -> &DocumentState {
        &self.first.start
    }

    /// Returns the state after the newest transaction.
    #[must_use]
    pub fn end(&self) -> &DocumentState {
        &self.rest.last().unwrap_or(&self.first).end
    }

    /// Returns the transactions, oldest first.
    pub fn transactions(&self) -> impl Iterator<Item = &EditTransaction> {
        iter::once(&self.first).chain(&self.rest)
    }

    /// Returns the number of transactions in the batch.
    #[must_use]
    pub const fn transaction_count(&self) -> usize {
        self.rest.len().saturating_add(1)
    }

    /// Returns whether any transaction changed the text.
    #[must_use]
    pub fn doc_changed(&self) -> bool {
        self.transactions().any(EditTransaction::doc_changed)
    }

    /// Returns the smallest range covering every changed range.
    ///
    /// Each transaction reports its ranges in its own resulting document, so
    /// the union approximates the affected region of the final document.
    #[must_use]
    pub fn changed_range(&self) -> Option<CodeRange> {
        self.transactions()
            .flat_map(|transaction| transaction.changes.iter().copied())
            .reduce(|covered, range| {
                CodeRange::new(covered.from.min(range.from), covered.to.max(range.to))
            })
    }
}

/// Buffers transactions until the document has been idle for the delay.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    buffer: Vec<EditTransaction>,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    /// Creates a debouncer with the given idle delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            buffer: Vec::new(),
            deadline: None,
        }
    }

    /// Creates a debouncer using the configured delay.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.debounce())
    }

    /// Returns the idle delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Changes the idle delay. A running deadline keeps its old value until
    /// the next push.
    pub const fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Returns when the buffered transactions become due, if any are
    /// buffered.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns whether transactions are waiting.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Buffers `transaction` and restarts the deadline from `now`.
    pub fn push(&mut self, transaction: EditTransaction, now: Instant) {
        self.buffer.push(transaction);
        self.deadline = now.checked_add(self.delay).or(Some(now));
        trace!(
            target: DEBOUNCE_TARGET,
            buffered = self.buffer.len(),
            delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
            "transaction buffered"
        );
    }

    /// Releases the buffered transactions once the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Batch> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.flush()
    }

    /// Releases the buffered transactions immediately.
    pub fn flush(&mut self) -> Option<Batch> {
        self.deadline = None;
        let batch = Batch::new(std::mem::take(&mut self.buffer))?;
        trace!(
            target: DEBOUNCE_TARGET,
            transactions = batch.transaction_count(),
            "batch released"
        );
        Some(batch)
    }

    /// Drops the buffered transactions and stops the deadline. Returns how
    /// many transactions were dropped.
    pub fn cancel(&mut self) -> usize {
        self.deadline = None;
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::document::Selection;

    fn typed(text: &str, position: usize) -> EditTransaction {
        let start = DocumentState::new(text, Selection::cursor(position));
        EditTransaction::replace(start, position, position, "x").expect("valid edit")
    }

    #[fixture]
    fn epoch() -> Instant {
        Instant::now()
    }

    #[rstest]
    fn nothing_is_released_before_the_deadline(epoch: Instant) {
        let mut debouncer = Debouncer::default();
        debouncer.push(typed("a", 1), epoch);

        assert!(debouncer.poll(epoch + Duration::from_millis(199)).is_none());
        assert!(debouncer.is_pending());
        assert!(debouncer.poll(epoch + DEFAULT_DEBOUNCE).is_some());
        assert!(!debouncer.is_pending());
    }

    #[rstest]
    fn every_push_restarts_the_deadline(epoch: Instant) {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let first = typed("a", 1);
        let second = typed(&first.end.text, 2);
        debouncer.push(first, epoch);
        debouncer.push(second, epoch + Duration::from_millis(80));

        assert!(debouncer.poll(epoch + Duration::from_millis(150)).is_none());
        let batch = debouncer
            .poll(epoch + Duration::from_millis(180))
            .expect("batch after the idle gap");

        assert_eq!(batch.transaction_count(), 2);
        assert_eq!(batch.start().text, "a");
        assert_eq!(batch.end().text, "axx");
        assert_eq!(batch.changed_range(), Some(CodeRange::new(1, 3)));
    }

    #[rstest]
    fn cancelling_drops_the_buffer(epoch: Instant) {
        let mut debouncer = Debouncer::default();
        debouncer.push(typed("a", 0), epoch);

        assert_eq!(debouncer.cancel(), 1);
        assert_eq!(debouncer.deadline(), None);
        assert!(debouncer.poll(epoch + Duration::from_secs(1)).is_none());
    }

    #[rstest]
    fn new_delays_apply_from_the_next_push(epoch: Instant) {
        let mut debouncer = Debouncer::default();
        debouncer.set_delay(Duration::from_millis(10));
        debouncer.push(typed("a", 0), epoch);

        assert_eq!(debouncer.deadline(), Some(epoch + Duration::from_millis(10)));
        assert!(debouncer.flush().is_some());
        assert!(debouncer.flush().is_none());
    }

    #[rstest]
    fn configured_delays_drive_the_deadline(epoch: Instant) {
        let config = Config::default().with_debounce_ms(40);
        let mut debouncer = Debouncer::from_config(&config);
        debouncer.push(typed("a", 0), epoch);

        assert_eq!(debouncer.delay(), Duration::from_millis(40));
        assert!(debouncer.poll(epoch + Duration::from_millis(39)).is_none());
        assert!(debouncer.poll(epoch + Duration::from_millis(40)).is_some());
    }

    #[test]
    fn selection_only_batches_report_no_change() {
        let start = DocumentState::new("a = 1", Selection::cursor(0));
        let batch = Batch::single(EditTransaction::select(start, Selection::cursor(3)));

        assert!(!batch.doc_changed());
        assert_eq!(batch.changed_range(), None);
        assert_eq!(batch.end().selection, Selection::cursor(3));
    }
}

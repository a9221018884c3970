//! Behaviour-driven development (BDD) step definitions for incremental
//! re-matching scenarios.

use std::cell::RefCell;
use std::str::FromStr;
use std::time::{Duration, Instant};

use prism_syntax::{Parser, SupportedLanguage};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::{Batch, Debouncer, DocumentState, EditTransaction, RematchPass, Selection};

// =============================================================================
// Test World
// =============================================================================

/// State shared across BDD steps.
struct TestWorld {
    /// Language of the document.
    language: SupportedLanguage,
    /// Document state after the last transaction.
    document: DocumentState,
    /// Debouncer under test.
    debouncer: Debouncer,
    /// Clock origin of the scenario.
    epoch: Instant,
    /// Batch released by the last poll.
    batch: Option<Batch>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self {
            language: SupportedLanguage::Python,
            document: DocumentState::default(),
            debouncer: Debouncer::default(),
            epoch: Instant::now(),
            batch: None,
        }
    }
}

impl TestWorld {
    fn at(&self, millis: &str) -> Instant {
        let offset: u64 = millis.parse().expect("milliseconds");
        self.epoch + Duration::from_millis(offset)
    }

    fn push(&mut self, transaction: EditTransaction, millis: &str) {
        let now = self.at(millis);
        self.document = transaction.end.clone();
        self.debouncer.push(transaction, now);
    }

    fn rematched_texts(&self) -> Vec<String> {
        let batch = self.batch.as_ref().expect("a batch should be released");
        let mut parser = Parser::new(self.language).expect("parser init");
        let pass = RematchPass::new(&mut parser, batch, false).expect("pass");
        let analysis = pass.analyze();
        analysis
            .rematch
            .iter()
            .map(|unit| pass.document().text_of(*unit).to_owned())
            .collect()
    }
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

/// Strips surrounding double quotes and expands `\n` escapes.
fn unquote(s: &str) -> String {
    s.trim_matches('"').replace("\\n", "\n")
}

// =============================================================================
// Given Steps
// =============================================================================

#[given("the {language} document {text}")]
fn given_document(world: &RefCell<TestWorld>, language: String, text: String) {
    let mut w = world.borrow_mut();
    w.language = SupportedLanguage::from_str(&language).expect("language");
    w.document = DocumentState::new(unquote(&text), Selection::cursor(0));
}

// =============================================================================
// When Steps
// =============================================================================

#[when("{text} is typed at {position} after {millis} ms")]
fn when_typed(world: &RefCell<TestWorld>, text: String, position: String, millis: String) {
    let mut w = world.borrow_mut();
    let offset: usize = position.parse().expect("position");
    let transaction = EditTransaction::replace(w.document.clone(), offset, offset, &unquote(&text))
        .expect("valid edit");
    w.push(transaction, &millis);
}

#[when("the cursor moves to {position} after {millis} ms")]
fn when_cursor_moves(world: &RefCell<TestWorld>, position: String, millis: String) {
    let mut w = world.borrow_mut();
    let offset: usize = position.parse().expect("position");
    let transaction = EditTransaction::select(w.document.clone(), Selection::cursor(offset));
    w.push(transaction, &millis);
}

#[when("the debouncer is polled after {millis} ms")]
fn when_polled(world: &RefCell<TestWorld>, millis: String) {
    let mut w = world.borrow_mut();
    let now = w.at(&millis);
    w.batch = w.debouncer.poll(now);
}

#[when("the pending edits are cancelled")]
fn when_cancelled(world: &RefCell<TestWorld>) {
    let dropped = world.borrow_mut().debouncer.cancel();
    assert!(dropped > 0, "expected buffered edits to cancel");
}

// =============================================================================
// Then Steps
// =============================================================================

#[then("no batch is released")]
fn then_no_batch(world: &RefCell<TestWorld>) {
    assert!(world.borrow().batch.is_none());
}

#[then("the batch holds {count} transactions")]
fn then_batch_size(world: &RefCell<TestWorld>, count: String) {
    let w = world.borrow();
    let batch = w.batch.as_ref().expect("a batch should be released");
    let expected: usize = count.parse().expect("count");
    assert_eq!(batch.transaction_count(), expected);
}

#[then("the rematched units are {expected}")]
fn then_rematched(world: &RefCell<TestWorld>, expected: String) {
    let expected_text = unquote(&expected);
    let wanted: Vec<&str> = expected_text.split(", ").collect();
    assert_eq!(world.borrow().rematched_texts(), wanted);
}

#[then("nothing is rematched")]
fn then_nothing_rematched(world: &RefCell<TestWorld>) {
    assert!(world.borrow().rematched_texts().is_empty());
}

// =============================================================================
// Scenario Bindings
// =============================================================================

#[scenario(
    path = "tests/features/prism_incremental.feature",
    name = "Editing one statement rematches only that statement"
)]
fn editing_one_statement(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/prism_incremental.feature",
    name = "A burst of typing is matched once"
)]
fn burst_of_typing(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/prism_incremental.feature",
    name = "Moving the cursor rematches the unit under it"
)]
fn cursor_moves(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/prism_incremental.feature",
    name = "A cursor on a blank line rematches nothing"
)]
fn cursor_on_blank_line(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/prism_incremental.feature",
    name = "Cancelled edits are never matched"
)]
fn cancelled_edits(world: RefCell<TestWorld>) {
    let _ = world;
}

//! End-to-end tests for prism-incremental.
//!
//! These tests drive a document through debounced edits and rematch passes
//! against a real pattern registry.

use std::time::{Duration, Instant};

use insta::assert_snapshot;
use prism_incremental::{
    Batch, Debouncer, DocumentState, EditTransaction, RematchOutcome, RematchPass, Selection,
};
use prism_pattern::{Context, PatternRegistry, RegistryBuilder, TemplateBuilder};
use prism_syntax::{Parser, SupportedLanguage};

fn log_registry() -> PatternRegistry {
    let mut templates = TemplateBuilder::new(SupportedLanguage::TypeScript);
    let value = templates.arg("value", ["identifier"]);
    let log = templates
        .statement("log")
        .text("console.log(")
        .param(&value)
        .text(");")
        .build();
    let mut builder = RegistryBuilder::new(SupportedLanguage::TypeScript)
        .unwrap_or_else(|err| panic!("registry: {err}"));
    builder
        .register(&log)
        .unwrap_or_else(|err| panic!("register: {err}"));
    builder
        .freeze()
        .unwrap_or_else(|err| panic!("freeze: {err}"))
}

fn run(batch: &Batch, force: bool) -> RematchOutcome {
    let mut parser =
        Parser::new(SupportedLanguage::TypeScript).unwrap_or_else(|err| panic!("parser: {err}"));
    let pass = RematchPass::new(&mut parser, batch, force).unwrap_or_else(|err| panic!("pass: {err}"));
    pass.run(&log_registry(), &Context::new())
        .unwrap_or_else(|err| panic!("run: {err}"))
}

fn summary(outcome: &RematchOutcome) -> String {
    let mut lines: Vec<String> = outcome
        .matches
        .iter()
        .map(|record| {
            let value = record
                .bindings
                .get("value")
                .map_or("", |node| node.text.as_str());
            format!(
                "{} {}..{} value={value}",
                record.pattern, record.range.from, record.range.to
            )
        })
        .collect();
    let rematched: Vec<String> = outcome
        .rematched
        .iter()
        .map(|range| format!("{}..{}", range.from, range.to))
        .collect();
    lines.push(format!("rematched {}", rematched.join(" ")));
    lines.join("\n")
}

const DOCUMENT: &str = "console.log(a);\nconsole.log(b);\n";

#[test]
fn forced_passes_match_the_whole_document() {
    let start = DocumentState::new(DOCUMENT, Selection::cursor(0));
    let batch = Batch::single(EditTransaction::select(start, Selection::cursor(0)));

    let outcome = run(&batch, true);

    assert_snapshot!(summary(&outcome), @r"
    log 0..15 value=a
    log 16..31 value=b
    rematched 0..15 16..31
    ");
}

#[test]
fn debounced_edits_rematch_the_edited_statement() {
    let epoch = Instant::now();
    let mut debouncer = Debouncer::default();
    let start = DocumentState::new(DOCUMENT, Selection::cursor(28));
    let renamed = EditTransaction::replace(start, 28, 29, "total")
        .unwrap_or_else(|err| panic!("edit: {err}"));
    debouncer.push(renamed, epoch);

    assert!(debouncer.poll(epoch + Duration::from_millis(50)).is_none());
    let batch = debouncer
        .poll(epoch + Duration::from_millis(200))
        .unwrap_or_else(|| panic!("batch after the idle gap"));
    let outcome = run(&batch, false);

    assert_snapshot!(summary(&outcome), @r"
    log 16..35 value=total
    rematched 16..35
    ");
    assert_eq!(outcome.invalidated, outcome.rematched);
}

//! Cross-module tests for prism-pattern.

mod behaviour;

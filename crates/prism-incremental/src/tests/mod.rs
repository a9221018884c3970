//! Cross-module tests for prism-incremental.

mod behaviour;

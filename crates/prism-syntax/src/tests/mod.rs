//! Cross-module tests for prism-syntax.

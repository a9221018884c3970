//! Per-language matching configuration.
//!
//! A [`LanguageProfile`] tells the pattern builder and the matcher which
//! concrete node kinds play the role of blocks, aggregations and chains in a
//! grammar, how to split a file into independently matchable units, and how
//! to render starter drafts. Profiles are `'static` tables; obtain one with
//! [`SupportedLanguage::profile`].

use crate::language::SupportedLanguage;

/// Placeholder standing in for an aggregation part inside a context template.
pub const AGGREGATION_PLACEHOLDER: &str = "__agg__";

/// Placeholder standing in for an aggregation start inside a context template.
pub const AGGREGATION_START_PLACEHOLDER: &str = "__start__";

/// Placeholder standing in for a chain link inside [`LanguageProfile::link_context`].
pub const LINK_PLACEHOLDER: &str = "<link>";

/// Token replaced by a node kind in the default argument draft.
pub const KIND_PLACEHOLDER: &str = "<kind>";

/// Prefix of identifiers that stand in for an empty argument of some kind.
pub const EMPTY_ARGUMENT_PREFIX: &str = "__empty_";

/// How the editable range of a block is derived from the block node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRangeStyle {
    /// Indentation-delimited blocks: the range starts after the `:` that
    /// introduces the block and runs to the end of the block node.
    AfterColon,
    /// Brace-delimited blocks: the range excludes the opening and closing
    /// brace.
    InsideBraces,
}

/// Block configuration for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockConfig {
    /// Concrete node kind of a statement block.
    pub kind: &'static str,
    /// How the block range is computed.
    pub range_style: BlockRangeStyle,
    /// Source inserted for an empty block when drafting.
    pub draft: &'static str,
}

/// A node kind whose children form a delimited, variable-length list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatableKind {
    /// Concrete node kind, e.g. `argument_list`.
    pub kind: &'static str,
    /// Token opening the list.
    pub start_token: &'static str,
    /// Token separating list entries.
    pub delimiter_token: &'static str,
    /// Token closing the list.
    pub end_token: &'static str,
    /// Source that embeds a single part at [`AGGREGATION_PLACEHOLDER`] so it
    /// parses in the right syntactic position.
    pub context_template: &'static str,
    /// Whether the node carries a leading start expression, as a subscript
    /// carries its receiver.
    pub has_start: bool,
}

/// A node kind that forms one link of a method/attribute chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainableKind {
    /// Concrete node kind, e.g. `call`.
    pub kind: &'static str,
    /// Path from the chainable node to the first token of its link.
    pub path_to_link_begin: &'static [usize],
    /// Path from the chainable node to the next (inner) chain element.
    pub path_to_next_link: &'static [usize],
}

/// Chain configuration for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainsConfig {
    /// Path from the link context statement to the outermost link.
    pub path_to_first_link: &'static [usize],
    /// Node kinds that can be chained.
    pub chainables: &'static [ChainableKind],
}

impl ChainsConfig {
    /// Looks up the chainable entry for `kind`.
    #[must_use]
    pub fn chainable(&self, kind: &str) -> Option<&'static ChainableKind> {
        self.chainables.iter().find(|entry| entry.kind == kind)
    }

    /// Returns whether `kind` can be chained.
    #[must_use]
    pub fn is_chainable(&self, kind: &str) -> bool {
        self.chainable(kind).is_some()
    }
}

/// How a node kind is split into matching units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRule {
    /// Every child becomes a unit candidate.
    AllChildren,
    /// Only the child in the named field is split further.
    Field(&'static str),
}

/// One row of the splitting table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitEntry {
    /// Concrete node kind this rule applies to.
    pub kind: &'static str,
    /// Rule applied to nodes of that kind.
    pub rule: SplitRule,
}

/// Comment configuration used for context extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentConfig {
    /// Kind of the statements that comments may annotate.
    pub statement_kind: &'static str,
    /// Concrete node kind of a comment.
    pub comment_kind: &'static str,
    /// Tokens a comment may start with.
    pub start_tokens: &'static [&'static str],
}

/// Draft text for arguments of a given node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentDraft {
    /// Concrete node kind.
    pub kind: &'static str,
    /// Source inserted for an empty argument of that kind.
    pub draft: &'static str,
}

/// Matching configuration for one language.
#[derive(Debug)]
pub struct LanguageProfile {
    language: SupportedLanguage,
    top_kind: &'static str,
    statement_kind: &'static str,
    link_context: &'static str,
    block: BlockConfig,
    aggregatables: &'static [AggregatableKind],
    chains: ChainsConfig,
    split_table: &'static [SplitEntry],
    comments: CommentConfig,
    argument_drafts: &'static [ArgumentDraft],
    default_argument_draft: &'static str,
}

impl LanguageProfile {
    /// Returns the language this profile configures.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the kind of the root node of a parsed file.
    #[must_use]
    pub const fn top_kind(&self) -> &'static str {
        self.top_kind
    }

    /// Returns the kind wrapping a bare expression used as a statement.
    #[must_use]
    pub const fn statement_kind(&self) -> &'static str {
        self.statement_kind
    }

    /// Returns the source into which chain links are embedded.
    #[must_use]
    pub const fn link_context(&self) -> &'static str {
        self.link_context
    }

    /// Returns the block configuration.
    #[must_use]
    pub const fn block(&self) -> &BlockConfig {
        &self.block
    }

    /// Returns the configured aggregatable node kinds.
    #[must_use]
    pub const fn aggregatables(&self) -> &'static [AggregatableKind] {
        self.aggregatables
    }

    /// Looks up the aggregatable entry for `kind`.
    #[must_use]
    pub fn aggregatable(&self, kind: &str) -> Option<&'static AggregatableKind> {
        self.aggregatables.iter().find(|entry| entry.kind == kind)
    }

    /// Returns the chain configuration.
    #[must_use]
    pub const fn chains(&self) -> &ChainsConfig {
        &self.chains
    }

    /// Returns the split rule for `kind`, if the kind is split at all.
    #[must_use]
    pub fn split_rule(&self, kind: &str) -> Option<SplitRule> {
        self.split_table
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.rule)
    }

    /// Returns the comment configuration.
    #[must_use]
    pub const fn comments(&self) -> &CommentConfig {
        &self.comments
    }

    /// Returns the draft source for an empty argument of `kind`.
    ///
    /// Kinds without a dedicated draft get an identifier of the form
    /// `__empty_<kind>`, which the matcher accepts as a node of that kind.
    #[must_use]
    pub fn argument_draft(&self, kind: &str) -> String {
        self.argument_drafts
            .iter()
            .find(|entry| entry.kind == kind)
            .map_or_else(
                || self.default_argument_draft.replace(KIND_PLACEHOLDER, kind),
                |entry| entry.draft.to_owned(),
            )
    }
}

/// Profile for Python.
pub static PYTHON: LanguageProfile = LanguageProfile {
    language: SupportedLanguage::Python,
    top_kind: "module",
    statement_kind: "expression_statement",
    link_context: "a.<link>",
    block: BlockConfig {
        kind: "block",
        range_style: BlockRangeStyle::AfterColon,
        draft: "pass # instructions go here",
    },
    aggregatables: &[
        AggregatableKind {
            kind: "argument_list",
            start_token: "(",
            delimiter_token: ",",
            end_token: ")",
            context_template: "someFunction(__agg__)",
            has_start: false,
        },
        AggregatableKind {
            kind: "dictionary",
            start_token: "{",
            delimiter_token: ",",
            end_token: "}",
            context_template: "{__agg__}",
            has_start: false,
        },
        AggregatableKind {
            kind: "set",
            start_token: "{",
            delimiter_token: ",",
            end_token: "}",
            context_template: "{__agg__}",
            has_start: false,
        },
        AggregatableKind {
            kind: "list",
            start_token: "[",
            delimiter_token: ",",
            end_token: "]",
            context_template: "[__agg__]",
            has_start: false,
        },
        AggregatableKind {
            kind: "tuple",
            start_token: "(",
            delimiter_token: ",",
            end_token: ")",
            context_template: "(__agg__, 1)",
            has_start: false,
        },
        AggregatableKind {
            kind: "subscript",
            start_token: "[",
            delimiter_token: ",",
            end_token: "]",
            context_template: "__start__[__agg__]",
            has_start: true,
        },
    ],
    chains: ChainsConfig {
        path_to_first_link: &[0],
        chainables: &[
            ChainableKind {
                kind: "call",
                path_to_link_begin: &[0, 1],
                path_to_next_link: &[0, 0],
            },
            ChainableKind {
                kind: "attribute",
                path_to_link_begin: &[1],
                path_to_next_link: &[0],
            },
        ],
    },
    split_table: &[
        SplitEntry {
            kind: "function_definition",
            rule: SplitRule::Field("body"),
        },
        SplitEntry {
            kind: "class_definition",
            rule: SplitRule::Field("body"),
        },
        SplitEntry {
            kind: "module",
            rule: SplitRule::AllChildren,
        },
        SplitEntry {
            kind: "block",
            rule: SplitRule::AllChildren,
        },
    ],
    comments: CommentConfig {
        statement_kind: "expression_statement",
        comment_kind: "comment",
        start_tokens: &["#"],
    },
    argument_drafts: &[
        ArgumentDraft {
            kind: "string",
            draft: "\"\"",
        },
        ArgumentDraft {
            kind: "integer",
            draft: "1",
        },
        ArgumentDraft {
            kind: "list",
            draft: "[]",
        },
    ],
    default_argument_draft: "__empty_<kind>",
};

/// Profile for TypeScript (parsed with the TSX grammar).
pub static TYPESCRIPT: LanguageProfile = LanguageProfile {
    language: SupportedLanguage::TypeScript,
    top_kind: "program",
    statement_kind: "expression_statement",
    link_context: "a.<link>",
    block: BlockConfig {
        kind: "statement_block",
        range_style: BlockRangeStyle::InsideBraces,
        draft: "{\n  // instructions go here\n}",
    },
    aggregatables: &[AggregatableKind {
        kind: "arguments",
        start_token: "(",
        delimiter_token: ",",
        end_token: ")",
        context_template: "someFunction(__agg__)",
        has_start: false,
    }],
    chains: ChainsConfig {
        path_to_first_link: &[0],
        chainables: &[
            ChainableKind {
                kind: "call_expression",
                path_to_link_begin: &[0, 1],
                path_to_next_link: &[0, 0],
            },
            ChainableKind {
                kind: "member_expression",
                path_to_link_begin: &[1],
                path_to_next_link: &[0],
            },
        ],
    },
    split_table: &[
        SplitEntry {
            kind: "program",
            rule: SplitRule::AllChildren,
        },
        SplitEntry {
            kind: "statement_block",
            rule: SplitRule::AllChildren,
        },
    ],
    comments: CommentConfig {
        statement_kind: "expression_statement",
        comment_kind: "comment",
        start_tokens: &["//", "/*"],
    },
    argument_drafts: &[
        ArgumentDraft {
            kind: "string",
            draft: "\"\"",
        },
        ArgumentDraft {
            kind: "number",
            draft: "1",
        },
        ArgumentDraft {
            kind: "array",
            draft: "[]",
        },
    ],
    default_argument_draft: "__empty_<kind>",
};

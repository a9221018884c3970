//! Document states and the transactions that move between them.

use prism_pattern::CodeRange;

use crate::error::IncrementalError;

/// The main selection of a document, as byte offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// Fixed end of the selection.
    pub anchor: usize,
    /// Moving end of the selection, where the cursor is drawn.
    pub head: usize,
}

impl Selection {
    /// Creates an empty selection at `position`.
    #[must_use]
    pub const fn cursor(position: usize) -> Self {
        Self {
            anchor: position,
            head: position,
        }
    }

    /// Creates a selection from `anchor` to `head`.
    #[must_use]
    pub const fn range(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Returns whether the selection is a bare cursor.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.anchor == self.head
    }
}

/// Document text together with its main selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentState {
    /// Full document text.
    pub text: String,
    /// Main selection.
    pub selection: Selection,
}

impl DocumentState {
    /// Creates a document state.
    #[must_use]
    pub fn new(text: impl Into<String>, selection: Selection) -> Self {
        Self {
            text: text.into(),
            selection,
        }
    }
}

/// One editor transaction.
///
/// `changes` holds the changed ranges in the coordinates of the `end`
/// document. A transaction without changes only moved the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditTransaction {
    /// State before the transaction.
    pub start: DocumentState,
    /// State after the transaction.
    pub end: DocumentState,
    /// Changed ranges in the new document.
    pub changes: Vec<CodeRange>,
}

impl EditTransaction {
    /// Creates a transaction from explicit states and changes.
    #[must_use]
    pub fn new(
        start: DocumentState,
        end: DocumentState,
        changes: impl IntoIterator<Item = CodeRange>,
    ) -> Self {
        Self {
            start,
            end,
            changes: changes.into_iter().collect(),
        }
    }

    /// Moves the selection of `start` without touching the text.
    #[must_use]
    pub fn select(start: DocumentState, selection: Selection) -> Self {
        let end = DocumentState::new(start.text.clone(), selection);
        Self {
            start,
            end,
            changes: Vec::new(),
        }
    }

    /// Replaces `from..to` in `start` with `insert` and places the cursor
    /// after the inserted text.
    ///
    /// # Errors
    ///
    /// Returns [`IncrementalError::InvalidEdit`] when the range is reversed,
    /// exceeds the document or splits a character.
    pub fn replace(
        start: DocumentState,
        from: usize,
        to: usize,
        insert: &str,
    ) -> Result<Self, IncrementalError> {
        let invalid = || IncrementalError::invalid_edit(from, to, start.text.len());
        if from > to {
            return Err(invalid());
        }
        let before = start.text.get(..from).ok_or_else(invalid)?;
        let after = start.text.get(to..).ok_or_else(invalid)?;
        let text = format!("{before}{insert}{after}");
        let inserted_end = from.saturating_add(insert.len());
        let end = DocumentState::new(text, Selection::cursor(inserted_end));
        Ok(Self {
            start,
            end,
            changes: vec![CodeRange::new(from, inserted_end)],
        })
    }

    /// Returns whether the transaction changed the text.
    #[must_use]
    pub fn doc_changed(&self) -> bool {
        !self.changes.is_empty() || self.start.text != self.end.text
    }
}

//! Edit records and their deterministic application against one source.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A single edit: the bytes `[start_byte, end_byte)` of the original
/// source are replaced by `replacement`.
///
/// Offsets always refer to the original source, never to the evolving
/// output of earlier edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Start byte offset into the original source (inclusive).
    pub start_byte: usize,
    /// End byte offset into the original source (exclusive).
    pub end_byte: usize,
    /// Replacement content.
    pub replacement: String,
}

impl Edit {
    /// Create a replacement edit.
    #[must_use]
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    /// Create a deletion edit.
    #[must_use]
    pub fn delete(start_byte: usize, end_byte: usize) -> Self {
        Self::new(start_byte, end_byte, "")
    }

    /// Create a pure insertion at `position`.
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Length of the range being replaced.
    #[must_use]
    pub const fn range_len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    /// True when the edit replaces no bytes.
    #[must_use]
    pub const fn is_insertion(&self) -> bool {
        self.start_byte == self.end_byte
    }

    /// True when the replaced ranges of two edits share bytes.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    /// The edit's range as a [`Span`].
    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.start_byte, self.end_byte)
    }

    /// Pair the edit with the original substring it replaces.
    #[must_use]
    pub fn preview(&self, source: &str) -> EditPreview {
        let end = self.end_byte.min(source.len());
        let start = self.start_byte.min(end);
        EditPreview {
            start_byte: self.start_byte,
            end_byte: self.end_byte,
            original: source[start..end].to_owned(),
            replacement: self.replacement.clone(),
        }
    }
}

/// One edit paired with the original substring it replaces, for
/// inspection without mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPreview {
    /// Start byte offset into the original source.
    pub start_byte: usize,
    /// End byte offset into the original source.
    pub end_byte: usize,
    /// The bytes the edit removes.
    pub original: String,
    /// The bytes the edit writes.
    pub replacement: String,
}

/// An ordered list of edits against one immutable source.
///
/// Edits accumulate in call order and are not deduplicated. Overlapping
/// replacement ranges are neither detected nor rejected: application stays
/// deterministic and the edit with the lower start offset wins over bytes
/// an earlier-applied edit already touched, because its range refers to
/// the original indices. Callers that want to fail fast instead can
/// consult [`EditBuffer::has_overlaps`] before applying.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    edits: Vec<Edit>,
}

impl EditBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a replacement of `[start_byte, end_byte)` by `replacement`.
    pub fn add(&mut self, start_byte: usize, end_byte: usize, replacement: impl Into<String>) {
        self.edits.push(Edit::new(start_byte, end_byte, replacement));
    }

    /// Queue a prebuilt edit.
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Queue several edits, keeping their order.
    pub fn extend(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.edits.extend(edits);
    }

    /// Number of queued edits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// True when no edits are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// The queued edits, in call order.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// True when any two queued edits overlap. Diagnostic only; `apply`
    /// never consults it.
    #[must_use]
    pub fn has_overlaps(&self) -> bool {
        for i in 0..self.edits.len() {
            for j in (i + 1)..self.edits.len() {
                if self.edits[i].overlaps(&self.edits[j]) {
                    return true;
                }
            }
        }
        false
    }

    /// Apply every queued edit to `source` and return the new string.
    ///
    /// Edits are ordered by `(start_byte, end_byte)` with ties keeping
    /// their queueing order, then spliced walking that order in reverse:
    /// each splice touches only bytes at or after its own range, so no
    /// offset ever needs adjustment. Same-offset pure insertions therefore
    /// appear in the output in the order they were queued.
    ///
    /// Splicing is byte-level with the range end clamped to the evolving
    /// buffer, so even overlapping edit sets degrade deterministically;
    /// for well-formed edits on UTF-8 boundaries the result is exact.
    #[must_use]
    pub fn apply(&self, source: &str) -> String {
        debug!(
            "applying {} edits to {} source bytes",
            self.edits.len(),
            source.len()
        );
        let mut buf = source.as_bytes().to_vec();
        for &i in self.application_order().iter().rev() {
            let edit = &self.edits[i];
            let end = edit.end_byte.min(buf.len());
            let start = edit.start_byte.min(end);
            buf.splice(start..end, edit.replacement.bytes());
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Preview every queued edit against `source`, ordered by position.
    #[must_use]
    pub fn previews(&self, source: &str) -> Vec<EditPreview> {
        self.application_order()
            .iter()
            .map(|&i| self.edits[i].preview(source))
            .collect()
    }

    /// Indices of `self.edits` sorted ascending by `(start, end)`; the
    /// sort is stable, so full ties keep queueing order.
    fn application_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by_key(|&i| (self.edits[i].start_byte, self.edits[i].end_byte));
        order
    }
}

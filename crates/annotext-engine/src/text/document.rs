use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xi_rope::Rope;
use xi_rope::rope::{BaseMetric, Utf16CodeUnitsMetric};

use super::slice::slice_to_string;
use super::span::Span;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document {id} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        id: DocumentId,
        source: std::str::Utf8Error,
    },
}

/// Identifies the entity that owns a document: a reading passage part or a
/// submitted essay.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An immutable annotated text.
///
/// The text lives in a single `xi_rope::Rope`; spans are expressed in UTF-16
/// code units and converted to rope byte offsets through the rope's metrics.
/// Documents are never edited in place: a changed passage or essay is a new
/// `Document` with a bumped `version`.
#[derive(Clone)]
pub struct Document {
    id: DocumentId,
    text: Rope,
    version: u64,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("len_utf16", &self.len_utf16())
            .finish()
    }
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: &str) -> Self {
        Self {
            id: id.into(),
            text: Rope::from(text),
            version: 0,
        }
    }

    /// Create a document from raw bytes supplied by the host.
    ///
    /// Invalid UTF-8 is an integration bug on the caller's side and fails loudly.
    pub fn from_bytes(id: impl Into<DocumentId>, bytes: &[u8]) -> Result<Self, DocumentError> {
        let id = id.into();
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(id, text)),
            Err(source) => Err(DocumentError::InvalidUtf8 { id, source }),
        }
    }

    /// A new version of this document carrying different text.
    pub fn revise(&self, text: &str) -> Self {
        Self {
            id: self.id.clone(),
            text: Rope::from(text),
            version: self.version + 1,
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rope(&self) -> &Rope {
        &self.text
    }

    /// The whole document as a String.
    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Length in UTF-16 code units.
    pub fn len_utf16(&self) -> usize {
        self.text.measure::<Utf16CodeUnitsMetric>()
    }

    pub fn is_empty(&self) -> bool {
        self.len_utf16() == 0
    }

    /// Converts a UTF-16 offset into a rope byte offset.
    ///
    /// Returns `None` past the end or inside a surrogate pair.
    pub fn byte_offset(&self, units: usize) -> Option<usize> {
        if units > self.len_utf16() {
            return None;
        }
        let byte = self
            .text
            .convert_metrics::<Utf16CodeUnitsMetric, BaseMetric>(units);
        let back = self
            .text
            .convert_metrics::<BaseMetric, Utf16CodeUnitsMetric>(byte);
        (back == units).then_some(byte)
    }

    /// Converts a rope byte offset (on a char boundary) into UTF-16 units.
    pub fn utf16_offset(&self, byte: usize) -> usize {
        self.text
            .convert_metrics::<BaseMetric, Utf16CodeUnitsMetric>(byte)
    }

    /// Byte range for a span, or `None` if either end is not a valid boundary.
    pub fn byte_range(&self, span: Span) -> Option<Range<usize>> {
        if span.start > span.end {
            return None;
        }
        Some(self.byte_offset(span.start)?..self.byte_offset(span.end)?)
    }

    /// Text covered by `span`, or `None` if the span is not valid for this document.
    pub fn slice(&self, span: Span) -> Option<String> {
        self.byte_range(span)
            .map(|range| slice_to_string(&self.text, range))
    }

    /// Finds the occurrence of `needle` whose start is nearest to `near`.
    ///
    /// Ties go to the earlier occurrence. Empty needles never match.
    pub fn find_nearest(&self, needle: &str, near: usize) -> Option<Span> {
        if needle.is_empty() {
            return None;
        }
        let haystack = self.text();
        let mut best: Option<Span> = None;
        let mut from = 0;
        // Step one char past each hit so overlapping occurrences are seen too.
        while let Some(found) = haystack[from..].find(needle) {
            let byte = from + found;
            let span = Span::new(
                self.utf16_offset(byte),
                self.utf16_offset(byte + needle.len()),
            );
            if best.is_none_or(|b| span.start.abs_diff(near) < b.start.abs_diff(near)) {
                best = Some(span);
            }
            let step = haystack[byte..].chars().next().map_or(1, char::len_utf8);
            from = byte + step;
        }
        best
    }
}

use serde::{Deserialize, Serialize};

use crate::text::{Document, Span};

use super::error::AnnotationError;
use super::wire::WireAnnotation;

/// Opaque annotation identifier, unique within one document's annotation set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// A fresh random identifier for a newly created annotation.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// What an annotation does to the text it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Reader highlight, optionally colored.
    Highlight,
    /// Struck-through text (eliminated answer options, deleted words).
    Strike,
    /// Reviewer comment attached to a range.
    Comment,
    /// Reviewer replacement suggestion for a range.
    Suggestion,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 4] = [
        AnnotationKind::Highlight,
        AnnotationKind::Strike,
        AnnotationKind::Comment,
        AnnotationKind::Suggestion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Strike => "strike",
            AnnotationKind::Comment => "comment",
            AnnotationKind::Suggestion => "suggestion",
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional data carried by an annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// CSS color, highlights only.
    pub color: Option<String>,
    /// Verification snippet: the covered text captured at creation time.
    pub text: Option<String>,
    /// Comment body.
    pub comment: Option<String>,
    /// Suggested replacement text.
    pub suggestion: Option<String>,
}

/// A typed range over a document.
///
/// Serializes to and from the wire record shape (`type`, `start`, `end` and
/// flattened payload fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireAnnotation", into = "WireAnnotation")]
pub struct Annotation {
    pub id: AnnotationId,
    pub span: Span,
    pub kind: AnnotationKind,
    pub payload: Payload,
}

impl Annotation {
    pub fn new(id: impl Into<AnnotationId>, span: Span, kind: AnnotationKind) -> Self {
        Self {
            id: id.into(),
            span,
            kind,
            payload: Payload::default(),
        }
    }

    /// Creates an annotation for a resolved selection, capturing the covered
    /// text as its verification snippet.
    pub fn from_selection(
        span: Span,
        kind: AnnotationKind,
        doc: &Document,
    ) -> Result<Self, AnnotationError> {
        if !span.fits(doc.len_utf16()) {
            return Err(AnnotationError::OutOfBounds {
                span,
                len: doc.len_utf16(),
            });
        }
        let text = doc.slice(span).ok_or(AnnotationError::OutOfBounds {
            span,
            len: doc.len_utf16(),
        })?;
        let mut annotation = Self::new(AnnotationId::generate(), span, kind);
        annotation.payload.text = Some(text);
        Ok(annotation)
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.payload.color = Some(color.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.payload.comment = Some(comment.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.payload.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_snippet(mut self, text: impl Into<String>) -> Self {
        self.payload.text = Some(text.into());
        self
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_selection_captures_snippet() {
        let doc = Document::new("p1", "The quick brown fox");
        let a = Annotation::from_selection(Span::new(4, 9), AnnotationKind::Highlight, &doc)
            .unwrap();
        assert_eq!(a.payload.text.as_deref(), Some("quick"));
        assert_eq!(a.span, Span::new(4, 9));
        assert!(!a.id.as_str().is_empty());
    }

    #[test]
    fn from_selection_rejects_out_of_bounds() {
        let doc = Document::new("p1", "short");
        let err = Annotation::from_selection(Span::new(3, 9), AnnotationKind::Strike, &doc)
            .unwrap_err();
        assert!(matches!(err, AnnotationError::OutOfBounds { len: 5, .. }));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(AnnotationId::generate(), AnnotationId::generate());
    }

    #[test]
    fn kind_names_match_wire_values() {
        for kind in AnnotationKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}

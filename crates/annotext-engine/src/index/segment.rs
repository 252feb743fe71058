use serde::Serialize;

use crate::annotation::Annotation;
use crate::text::Span;

/// A run of document text, either plain or covered by one annotation.
///
/// Derived on every render; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderSegment {
    /// Span of this run in the document (UTF-16 code units).
    pub span: Span,
    /// The text of the run.
    pub text: String,
    /// The annotation rendered over this run, if any.
    pub annotation: Option<Annotation>,
}

impl RenderSegment {
    pub fn plain(span: Span, text: String) -> Self {
        Self {
            span,
            text,
            annotation: None,
        }
    }

    pub fn annotated(span: Span, text: String, annotation: Annotation) -> Self {
        Self {
            span,
            text,
            annotation: Some(annotation),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.annotation.is_none()
    }
}

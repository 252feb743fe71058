use thiserror::Error;

use crate::text::Span;

use super::types::AnnotationId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("annotation range {span} is outside the document (length {len})")]
    OutOfBounds { span: Span, len: usize },

    #[error("annotation range {span} overlaps existing annotation {existing}")]
    Overlap { span: Span, existing: AnnotationId },

    #[error("annotation id {0} is already in use")]
    DuplicateId(AnnotationId),

    #[error("no annotation with id {0}")]
    UnknownId(AnnotationId),
}

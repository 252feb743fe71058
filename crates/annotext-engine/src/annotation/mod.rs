//! # Annotations
//!
//! Typed ranges over a document and the validated set that owns them.
//!
//! - **`types`**: `Annotation`, `AnnotationId`, `AnnotationKind`, `Payload`
//! - **`set`**: `AnnotationSet`, sorted and non-overlapping, rejects bad inserts
//! - **`wire`**: backend JSON records (`type`/`start`/`end` plus payload fields)
//! - **`error`**: `AnnotationError`
//!
//! ## Invariants
//!
//! - `0 <= start < end <= len` in UTF-16 code units
//! - ids are unique within a document's set
//! - members never overlap; adjacent members (`end == start`) are fine

pub mod error;
pub mod set;
pub mod types;
pub mod wire;

pub use error::AnnotationError;
pub use set::AnnotationSet;
pub use types::{Annotation, AnnotationId, AnnotationKind, Payload};
pub use wire::{
    FeedbackBlob, PassageHighlights, WireAnnotation, decode_annotations, encode_annotations,
};

pub mod annotation;
pub mod index;
pub mod markers;
pub mod materialize;
pub mod persist;
pub mod resolver;
pub mod text;
pub mod view;

// Re-export key types for easier usage
pub use annotation::{
    Annotation, AnnotationError, AnnotationId, AnnotationKind, AnnotationSet, FeedbackBlob,
    PassageHighlights, Payload,
};
pub use index::{IndexReport, RenderSegment, build_segments, build_segments_with_report};
pub use markers::{Stopwatch, TimeMarker, TimeMarkerLog, format_elapsed};
pub use materialize::{HighlightView, MaterializeError, Mode, RestoreIssue, RestoreReport, Restored};
pub use persist::{AnnotationStore, JsonFileStore, SaveDebouncer, StoreError};
pub use resolver::{ResolveError, Selection, resolve_selection, resolve_span};
pub use text::{Document, DocumentError, DocumentId, Span};
pub use view::{NodeId, Point, ViewTree};

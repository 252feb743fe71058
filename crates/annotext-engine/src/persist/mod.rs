//! # Persistence
//!
//! Annotations are saved as one whole-list blob per document. Edits come in
//! bursts, so saves are coalesced by a [`SaveDebouncer`] before they reach an
//! [`AnnotationStore`].
//!
//! - **`store`**: `AnnotationStore` trait and the `JsonFileStore` used by the CLI
//! - **`debounce`**: clock-injected `SaveDebouncer` (last write wins per document)

pub mod debounce;
pub mod store;

pub use debounce::{DEFAULT_QUIET_PERIOD, PendingSave, SaveDebouncer};
pub use store::{AnnotationStore, JsonFileStore, StoreError};

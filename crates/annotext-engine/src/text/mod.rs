//! # Text
//!
//! Documents and the offset algebra every other module is built on.
//!
//! - **`span`**: `Span`, a half-open `[start, end)` range in UTF-16 code units
//! - **`document`**: `Document`, an immutable rope-backed text with an owning id
//! - **`slice`**: allocation helpers (`slice_to_string`, `preview`) and UTF-16
//!   conversions for plain `&str`

pub mod document;
pub mod slice;
pub mod span;

pub use document::{Document, DocumentError, DocumentId};
pub use slice::{preview, slice_to_string, utf16_len, utf16_to_byte};
pub use span::Span;

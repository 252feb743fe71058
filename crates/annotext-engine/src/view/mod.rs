//! # View Tree
//!
//! The rendering surface the resolver reads and the materializer paints.
//!
//! A browser front end mirrors the DOM into this tree; the terminal front end
//! renders it to styled lines directly. Keeping the surface behind a small
//! arena type is what lets selection mapping and highlight painting be tested
//! without a browser.
//!
//! - **`tree`**: `ViewTree`, `NodeId`, `Point` (DOM boundary point), `ViewSnapshot`
//! - **`markup`**: `ViewTree::from_markup` for passages with inline tags
//! - **`cursor`**: byte cursor used by the markup reader

pub mod cursor;
pub mod markup;
pub mod tree;

pub use markup::MarkupError;
pub use tree::{Element, NodeData, NodeId, Point, ViewSnapshot, ViewTree};

//! # Range Resolver
//!
//! Turns a live selection on the view (two DOM-style boundary points) into
//! document offsets for a new annotation.
//!
//! The document offset of a point is the number of UTF-16 code units in the
//! text leaves that precede it under the container, plus the in-leaf offset.
//! Only text lengths are counted, so the result does not depend on how the
//! text is wrapped in inline markup or existing highlight marks.
//!
//! Fails closed: points outside the container, collapsed selections, and
//! ranges that intersect an existing annotation never yield a span.

use thiserror::Error;

use crate::annotation::{AnnotationId, AnnotationSet};
use crate::text::{Span, utf16_len, utf16_to_byte};
use crate::view::{NodeId, Point, ViewTree};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("selection boundary is outside the document container")]
    OutsideContainer,

    #[error("selection is collapsed")]
    Collapsed,

    #[error("boundary offset {offset} is not valid for its node")]
    InvalidOffset { offset: usize },

    #[error("selection {span} overlaps annotation {existing}")]
    Overlap { span: Span, existing: AnnotationId },
}

impl ResolveError {
    /// True for selections that should be ignored rather than reported
    /// (anything except an overlap rejection).
    pub fn is_not_applicable(&self) -> bool {
        !matches!(self, ResolveError::Overlap { .. })
    }
}

/// Where a selection started (`anchor`) and where it currently ends (`focus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// A caret with no extent.
    pub fn caret(at: Point) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }
}

/// Offset of `point` within the text under `container`.
pub fn document_offset(
    tree: &ViewTree,
    container: NodeId,
    point: Point,
) -> Result<usize, ResolveError> {
    if !tree.contains(point.node) || !tree.is_descendant(point.node, container) {
        return Err(ResolveError::OutsideContainer);
    }

    if let Some(text) = tree.text(point.node) {
        utf16_to_byte(text, point.offset).ok_or(ResolveError::InvalidOffset {
            offset: point.offset,
        })?;
        return Ok(start_of(tree, container, point.node) + point.offset);
    }

    let children = tree.children(point.node);
    if point.offset > children.len() {
        return Err(ResolveError::InvalidOffset {
            offset: point.offset,
        });
    }
    let before: usize = children[..point.offset]
        .iter()
        .map(|&c| tree.text_len(c))
        .sum();
    Ok(start_of(tree, container, point.node) + before)
}

/// Text units that precede `node` under `container`.
fn start_of(tree: &ViewTree, container: NodeId, node: NodeId) -> usize {
    if node == container {
        return 0;
    }
    let mut running = 0;
    for n in tree.descendants(container) {
        if n == node {
            break;
        }
        if let Some(t) = tree.text(n) {
            running += utf16_len(t);
        }
    }
    running
}

/// Resolves a selection to a document span without consulting annotations.
pub fn resolve_span(
    tree: &ViewTree,
    container: NodeId,
    selection: Selection,
) -> Result<Span, ResolveError> {
    // Check both ends before doing any work so a half-outside selection is a no-op.
    for p in [selection.anchor, selection.focus] {
        if !tree.contains(p.node) || !tree.is_descendant(p.node, container) {
            return Err(ResolveError::OutsideContainer);
        }
    }
    let a = document_offset(tree, container, selection.anchor)?;
    let b = document_offset(tree, container, selection.focus)?;
    let span = Span::between(a, b);
    if span.is_empty() {
        return Err(ResolveError::Collapsed);
    }
    Ok(span)
}

/// Resolves a selection into the span of a new annotation.
///
/// Rejects spans that intersect any member of `existing`; adjacency is allowed.
pub fn resolve_selection(
    tree: &ViewTree,
    container: NodeId,
    selection: Selection,
    existing: &AnnotationSet,
) -> Result<Span, ResolveError> {
    let span = resolve_span(tree, container, selection)?;
    if let Some(a) = existing.first_overlap(span) {
        return Err(ResolveError::Overlap {
            span,
            existing: a.id.clone(),
        });
    }
    Ok(span)
}

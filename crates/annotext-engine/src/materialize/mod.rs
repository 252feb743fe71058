//! # Highlight Materializer
//!
//! Paints a document's annotations onto a [`ViewTree`] and keeps the two in
//! step while the user edits.
//!
//! Each annotated run of the [Offset Index](crate::index) is wrapped in one
//! `mark` element per text leaf it crosses. Marks carry the annotation id, so
//! hover and click hooks can walk up from any boundary point to find it.
//! Painting never changes text, only wrapping: the view's plain text is the
//! document text before and after.
//!
//! ## Lifecycle
//!
//! ```text
//! proposed --resolve--> accepted --paint--> rendered <--restore--> restored
//!                                              |
//!                                           remove
//!                                              v
//!                                           deleted
//! ```
//!
//! [`HighlightView::rematerialize`] strips every mark and paints again from
//! `(document, annotations)`, so calling it twice leaves the same view as
//! calling it once.

pub mod marks;
pub mod restore;

use log::debug;
use thiserror::Error;

use crate::annotation::{
    Annotation, AnnotationError, AnnotationId, AnnotationKind, AnnotationSet, Payload,
};
use crate::index::{RenderSegment, build_segments};
use crate::resolver::{ResolveError, Selection, resolve_selection};
use crate::text::{Document, DocumentId, Span};
use crate::view::{NodeId, Point, ViewSnapshot, ViewTree};

pub use marks::{ID_ATTR, KIND_ATTR, MARK_TAG, is_mark, mark_element};
pub use restore::{Relocation, RestoreIssue, RestoreReport, Restored, relocate};

/// Whether the view accepts annotation edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Learner or reviewer is annotating.
    #[default]
    Live,
    /// Reviewing submitted work; marks render but nothing changes.
    ReadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterializeError {
    #[error("view is read-only")]
    ReadOnly,

    #[error("view text does not match document {id}")]
    TextMismatch { id: DocumentId },

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A document, its accepted annotations, and the view they are painted on.
#[derive(Debug, Clone)]
pub struct HighlightView {
    doc: Document,
    tree: ViewTree,
    container: NodeId,
    mode: Mode,
    annotations: AnnotationSet,
}

impl HighlightView {
    /// Paints `annotations` over a fresh view holding the document as one text node.
    pub fn paint(doc: Document, annotations: AnnotationSet, mode: Mode) -> Self {
        let tree = ViewTree::with_text("div", &doc.text());
        let container = tree.root();
        let mut view = Self {
            doc,
            tree,
            container,
            mode,
            annotations,
        };
        view.apply_marks();
        view
    }

    /// Paints `annotations` over an existing tree whose text under `container`
    /// is the document (e.g. a passage with inline markup).
    ///
    /// Marks already present in the tree are replaced.
    pub fn paint_over(
        doc: Document,
        tree: ViewTree,
        container: NodeId,
        annotations: AnnotationSet,
        mode: Mode,
    ) -> Result<Self, MaterializeError> {
        if !tree.contains(container) || tree.text_content(container) != doc.text() {
            return Err(MaterializeError::TextMismatch { id: doc.id().clone() });
        }
        let mut view = Self {
            doc,
            tree,
            container,
            mode,
            annotations,
        };
        view.rematerialize();
        Ok(view)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    /// Removes every mark and paints again from the document and annotation set.
    pub fn rematerialize(&mut self) {
        self.strip_marks();
        self.apply_marks();
    }

    fn strip_marks(&mut self) {
        let marks = self.tree.find_elements(self.container, is_mark);
        // Innermost first, so an outer unwrap never moves a node still queued.
        for &m in marks.iter().rev() {
            self.tree.unwrap(m);
        }
        self.tree.normalize(self.container);
    }

    fn apply_marks(&mut self) {
        let segments = build_segments(&self.doc, self.annotations.as_slice());
        for seg in segments {
            if let Some(a) = &seg.annotation {
                self.wrap_span(seg.span, a);
            }
        }
    }

    /// Wraps the part of every text leaf inside `span` in a mark for `annotation`.
    fn wrap_span(&mut self, span: Span, annotation: &Annotation) {
        let mut wrapped = 0;
        for (leaf, leaf_span) in self.tree.text_leaves(self.container) {
            if !leaf_span.intersects(span) {
                continue;
            }
            let from = span.start.max(leaf_span.start) - leaf_span.start;
            let to = span.end.min(leaf_span.end) - leaf_span.start;

            if to < leaf_span.len() && self.tree.split_text(leaf, to).is_none() {
                continue;
            }
            let target = if from > 0 {
                match self.tree.split_text(leaf, from) {
                    Some(tail) => tail,
                    None => continue,
                }
            } else {
                leaf
            };
            self.tree.wrap(target, mark_element(annotation, self.mode));
            wrapped += 1;
        }
        debug!("painted {} at {span} in {wrapped} mark(s)", annotation.id);
    }

    fn unwrap_marks_of(&mut self, id: &AnnotationId) {
        let marks = self.tree.find_elements(self.container, |e| {
            is_mark(e) && e.attrs.get(ID_ATTR).map(String::as_str) == Some(id.as_str())
        });
        for m in marks {
            self.tree.unwrap(m);
        }
        self.tree.normalize(self.container);
    }

    fn ensure_live(&self) -> Result<(), MaterializeError> {
        match self.mode {
            Mode::Live => Ok(()),
            Mode::ReadOnly => Err(MaterializeError::ReadOnly),
        }
    }

    /// The annotation whose mark encloses `point`, if any.
    pub fn annotation_at(&self, point: Point) -> Option<&Annotation> {
        if !self.tree.contains(point.node) || !self.tree.is_descendant(point.node, self.container) {
            return None;
        }
        let mut node = Some(point.node);
        while let Some(n) = node {
            if let Some(e) = self.tree.element(n)
                && is_mark(e)
                && let Some(id) = e.attrs.get(ID_ATTR)
            {
                return self.annotations.get(&AnnotationId::new(id.as_str()));
            }
            if n == self.container {
                break;
            }
            node = self.tree.parent(n);
        }
        None
    }

    /// The annotation covering a document offset.
    pub fn annotation_at_offset(&self, offset: usize) -> Option<&Annotation> {
        self.annotations.at(offset)
    }

    /// Hover hook: id of the annotation under the pointer.
    pub fn hover(&self, point: Point) -> Option<&AnnotationId> {
        self.annotation_at(point).map(|a| &a.id)
    }

    /// Click hook: id of the annotation to open for editing.
    ///
    /// Read-only views still report hovers but ignore clicks.
    pub fn click(&self, point: Point) -> Option<&AnnotationId> {
        match self.mode {
            Mode::Live => self.hover(point),
            Mode::ReadOnly => None,
        }
    }

    /// Resolves a live selection and paints a new annotation of `kind` over it.
    pub fn annotate_selection(
        &mut self,
        selection: Selection,
        kind: AnnotationKind,
    ) -> Result<AnnotationId, MaterializeError> {
        self.ensure_live()?;
        let span = resolve_selection(&self.tree, self.container, selection, &self.annotations)?;
        let annotation = Annotation::from_selection(span, kind, &self.doc)?;
        let id = annotation.id.clone();
        self.add(annotation)?;
        Ok(id)
    }

    /// Accepts a new annotation and paints it.
    pub fn add(&mut self, annotation: Annotation) -> Result<(), MaterializeError> {
        self.ensure_live()?;
        let span = annotation.span;
        self.annotations.insert(annotation.clone(), &self.doc)?;
        self.wrap_span(span, &annotation);
        Ok(())
    }

    /// Deletes an annotation and unwraps its marks, leaving the text untouched.
    pub fn remove(&mut self, id: &AnnotationId) -> Result<Annotation, MaterializeError> {
        self.ensure_live()?;
        let removed = self
            .annotations
            .remove(id)
            .ok_or_else(|| AnnotationError::UnknownId(id.clone()))?;
        self.unwrap_marks_of(id);
        Ok(removed)
    }

    pub fn set_comment(
        &mut self,
        id: &AnnotationId,
        comment: impl Into<String>,
    ) -> Result<(), MaterializeError> {
        let comment = comment.into();
        self.edit_payload(id, |p| p.comment = Some(comment))
    }

    pub fn set_color(
        &mut self,
        id: &AnnotationId,
        color: impl Into<String>,
    ) -> Result<(), MaterializeError> {
        let color = color.into();
        self.edit_payload(id, |p| p.color = Some(color))
    }

    pub fn set_suggestion(
        &mut self,
        id: &AnnotationId,
        suggestion: impl Into<String>,
    ) -> Result<(), MaterializeError> {
        let suggestion = suggestion.into();
        self.edit_payload(id, |p| p.suggestion = Some(suggestion))
    }

    fn edit_payload(
        &mut self,
        id: &AnnotationId,
        edit: impl FnOnce(&mut Payload),
    ) -> Result<(), MaterializeError> {
        self.ensure_live()?;
        let payload = self
            .annotations
            .payload_mut(id)
            .ok_or_else(|| AnnotationError::UnknownId(id.clone()))?;
        edit(payload);

        // Mark attributes mirror the payload; repaint just this annotation.
        if let Some(a) = self.annotations.get(id).cloned() {
            self.unwrap_marks_of(id);
            self.wrap_span(a.span, &a);
        }
        Ok(())
    }

    /// Text of the view, ignoring all wrapping. Always equals the document text.
    pub fn plain_text(&self) -> String {
        self.tree.text_content(self.container)
    }

    pub fn to_html(&self) -> String {
        self.tree.to_html(self.container)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.tree.snapshot(self.container)
    }

    pub fn segments(&self) -> Vec<RenderSegment> {
        build_segments(&self.doc, self.annotations.as_slice())
    }

    /// Maps a document offset to a boundary point in the current view.
    pub fn point_at(&self, offset: usize) -> Option<Point> {
        self.tree.leaf_at(self.container, offset)
    }
}

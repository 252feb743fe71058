use crate::text::{Document, Span};

use super::error::AnnotationError;
use super::types::{Annotation, AnnotationId};

/// The validated annotation list of one document.
///
/// Kept sorted by `start`. Because members never overlap, that order is also
/// the order by `end`, which lets every overlap check look only at the two
/// neighbours of an insertion point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    items: Vec<Annotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `annotation` against `doc` and the current members, then inserts it.
    ///
    /// On error the set is left unchanged.
    pub fn insert(&mut self, annotation: Annotation, doc: &Document) -> Result<(), AnnotationError> {
        let span = annotation.span;
        let len = doc.len_utf16();
        if !span.fits(len) || doc.byte_range(span).is_none() {
            return Err(AnnotationError::OutOfBounds { span, len });
        }
        if self.get(&annotation.id).is_some() {
            return Err(AnnotationError::DuplicateId(annotation.id));
        }
        if let Some(existing) = self.first_overlap(span) {
            return Err(AnnotationError::Overlap {
                span,
                existing: existing.id.clone(),
            });
        }
        let at = self.items.partition_point(|a| a.span.start < span.start);
        self.items.insert(at, annotation);
        Ok(())
    }

    pub fn remove(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let idx = self.items.iter().position(|a| &a.id == id)?;
        Some(self.items.remove(idx))
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.items.iter().find(|a| &a.id == id)
    }

    /// Mutable access for payload edits. The span is not exposed mutably so
    /// ordering and non-overlap cannot be broken through this handle.
    pub fn payload_mut(&mut self, id: &AnnotationId) -> Option<&mut super::Payload> {
        self.items
            .iter_mut()
            .find(|a| &a.id == id)
            .map(|a| &mut a.payload)
    }

    /// The first member intersecting `span`, if any.
    pub fn first_overlap(&self, span: Span) -> Option<&Annotation> {
        let at = self.items.partition_point(|a| a.span.end <= span.start);
        self.items.get(at).filter(|a| a.span.intersects(span))
    }

    /// The member covering `offset`.
    pub fn at(&self, offset: usize) -> Option<&Annotation> {
        let at = self.items.partition_point(|a| a.span.end <= offset);
        self.items.get(at).filter(|a| a.span.contains(offset))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Owned copy of the members, in order, for handing to a save callback.
    pub fn to_vec(&self) -> Vec<Annotation> {
        self.items.clone()
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

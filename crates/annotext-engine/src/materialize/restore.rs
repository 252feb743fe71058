//! Rebuilding a view from stored annotation records.
//!
//! Stored offsets are trusted only while the verification snippet still
//! matches the text at those offsets. When it does not, the snippet is
//! searched for once and the occurrence nearest the stored start wins (the
//! earlier one on a tie). Records that cannot be placed are skipped and
//! reported; restore itself never fails for bad records.

use log::{debug, warn};
use thiserror::Error;

use crate::annotation::{Annotation, AnnotationError, AnnotationId, AnnotationSet};
use crate::text::{Document, Span};
use crate::view::{NodeId, ViewTree};

use super::{HighlightView, MaterializeError, Mode};

/// Why a stored record was left out of a restored view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreIssue {
    #[error("annotation {id} at {span} is outside the document")]
    OutOfBounds { id: AnnotationId, span: Span },

    #[error("annotation {id}: snippet {snippet:?} no longer appears in the document")]
    RelocationFailure { id: AnnotationId, snippet: String },

    #[error("annotation {id} at {span} overlaps earlier annotation {existing}")]
    Overlap {
        id: AnnotationId,
        span: Span,
        existing: AnnotationId,
    },

    #[error("annotation id {id} appears more than once")]
    DuplicateId { id: AnnotationId },
}

impl RestoreIssue {
    pub fn id(&self) -> &AnnotationId {
        match self {
            RestoreIssue::OutOfBounds { id, .. }
            | RestoreIssue::RelocationFailure { id, .. }
            | RestoreIssue::Overlap { id, .. }
            | RestoreIssue::DuplicateId { id } => id,
        }
    }
}

/// A record whose offsets were corrected by snippet search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub id: AnnotationId,
    pub from: Span,
    pub to: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Records painted, relocated ones included.
    pub restored: usize,
    pub relocated: Vec<Relocation>,
    pub issues: Vec<RestoreIssue>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.relocated.is_empty() && self.issues.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Restored {
    pub view: HighlightView,
    pub report: RestoreReport,
}

/// Where a stored annotation belongs in `doc`.
pub fn relocate(doc: &Document, stored: &Annotation) -> Result<Span, RestoreIssue> {
    let span = stored.span;
    let at_offsets = span
        .fits(doc.len_utf16())
        .then(|| doc.slice(span))
        .flatten();

    let Some(snippet) = stored.payload.text.as_deref().filter(|s| !s.is_empty()) else {
        return match at_offsets {
            Some(_) => Ok(span),
            None => Err(RestoreIssue::OutOfBounds {
                id: stored.id.clone(),
                span,
            }),
        };
    };

    if at_offsets.as_deref() == Some(snippet) {
        return Ok(span);
    }
    doc.find_nearest(snippet, span.start)
        .ok_or_else(|| RestoreIssue::RelocationFailure {
            id: stored.id.clone(),
            snippet: snippet.to_string(),
        })
}

/// Places every stored record it can, first-wins on overlap.
fn accept(doc: &Document, stored: &[Annotation]) -> (AnnotationSet, RestoreReport) {
    let mut report = RestoreReport::default();
    let mut placed: Vec<Annotation> = Vec::with_capacity(stored.len());

    for a in stored {
        match relocate(doc, a) {
            Ok(span) => {
                let mut a = a.clone();
                if span != a.span {
                    debug!("relocated {} from {} to {span}", a.id, a.span);
                    report.relocated.push(Relocation {
                        id: a.id.clone(),
                        from: a.span,
                        to: span,
                    });
                    a.span = span;
                }
                placed.push(a);
            }
            Err(issue) => report.issues.push(issue),
        }
    }

    // Same order as the offset index, so both agree on who wins.
    placed.sort_by(|a, b| {
        (a.span.start, a.span.end, &a.id).cmp(&(b.span.start, b.span.end, &b.id))
    });

    let mut set = AnnotationSet::new();
    for a in placed {
        let (id, span) = (a.id.clone(), a.span);
        match set.insert(a, doc) {
            Ok(()) => report.restored += 1,
            Err(AnnotationError::Overlap { existing, .. }) => {
                report.issues.push(RestoreIssue::Overlap { id, span, existing });
            }
            Err(AnnotationError::DuplicateId(_)) => {
                report.issues.push(RestoreIssue::DuplicateId { id });
            }
            Err(AnnotationError::OutOfBounds { .. } | AnnotationError::UnknownId(_)) => {
                report.issues.push(RestoreIssue::OutOfBounds { id, span });
            }
        }
    }
    report.relocated.retain(|r| set.get(&r.id).is_some_and(|a| a.span == r.to));

    for issue in &report.issues {
        warn!("restore {}: skipped: {issue}", doc.id());
    }
    debug!(
        "restore {}: {} of {} record(s) placed",
        doc.id(),
        report.restored,
        stored.len()
    );
    (set, report)
}

impl HighlightView {
    /// Rebuilds a view of `doc` from stored records.
    pub fn restore(doc: Document, stored: &[Annotation], mode: Mode) -> Restored {
        let (set, report) = accept(&doc, stored);
        Restored {
            view: HighlightView::paint(doc, set, mode),
            report,
        }
    }

    /// Like [`HighlightView::restore`], painting over an existing tree.
    ///
    /// Restoring over a tree that is already painted replaces its marks, so
    /// restoring twice yields the same view as restoring once.
    pub fn restore_over(
        doc: Document,
        tree: ViewTree,
        container: NodeId,
        stored: &[Annotation],
        mode: Mode,
    ) -> Result<Restored, MaterializeError> {
        let (set, report) = accept(&doc, stored);
        let view = HighlightView::paint_over(doc, tree, container, set, mode)?;
        Ok(Restored { view, report })
    }

    /// Replaces this view's annotations with stored records and repaints.
    pub fn reload(&mut self, stored: &[Annotation]) -> RestoreReport {
        let (set, report) = accept(&self.doc, stored);
        self.annotations = set;
        self.rematerialize();
        report
    }
}

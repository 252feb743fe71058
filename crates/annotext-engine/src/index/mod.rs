//! # Offset Index
//!
//! Pure mapping from `(document, annotations)` to an ordered list of
//! [`RenderSegment`]s covering the whole document exactly once.
//!
//! ## Contract
//!
//! - Input annotations need not be sorted; a sorted copy of references is used
//! - Concatenating every segment's `text` reproduces the document
//! - Plain segments fill the gaps between annotations; empty gaps emit nothing
//! - Out-of-bounds or empty annotations are dropped from rendering
//! - Overlaps are resolved first-wins: the overlapping part of a later-starting
//!   annotation is dropped and any remainder still renders with it
//!
//! Cost is O(n + k log k) for n code units and k annotations.

pub mod segment;

use std::ops::Range;

use log::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::text::{Document, Span, preview, slice_to_string};

pub use segment::RenderSegment;

/// Segments plus what had to be left out to produce them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub segments: Vec<RenderSegment>,
    /// Annotations whose range is empty or not inside the document.
    pub out_of_bounds: Vec<AnnotationId>,
    /// Annotations entirely covered by an earlier-starting one.
    pub shadowed: Vec<AnnotationId>,
    /// Annotations rendered with their overlapping head cut off.
    pub trimmed: Vec<AnnotationId>,
}

impl IndexReport {
    pub fn is_clean(&self) -> bool {
        self.out_of_bounds.is_empty() && self.shadowed.is_empty() && self.trimmed.is_empty()
    }
}

/// Splits `doc` into plain and annotated runs. See the module docs for the contract.
pub fn build_segments(doc: &Document, annotations: &[Annotation]) -> Vec<RenderSegment> {
    build_segments_with_report(doc, annotations).segments
}

/// Like [`build_segments`], also reporting dropped and trimmed annotations.
pub fn build_segments_with_report(doc: &Document, annotations: &[Annotation]) -> IndexReport {
    let mut report = IndexReport::default();
    let rope = doc.rope();

    // Resolve byte ranges once; drop anything that isn't a valid in-bounds span.
    let mut valid: Vec<(&Annotation, Range<usize>)> = Vec::with_capacity(annotations.len());
    for a in annotations {
        match doc.byte_range(a.span).filter(|_| !a.span.is_empty()) {
            Some(bytes) => valid.push((a, bytes)),
            None => {
                debug!(
                    "dropping annotation {} at {} from render of {}: out of bounds",
                    a.id,
                    a.span,
                    doc.id()
                );
                report.out_of_bounds.push(a.id.clone());
            }
        }
    }
    valid.sort_by(|(a, _), (b, _)| {
        (a.span.start, a.span.end, &a.id).cmp(&(b.span.start, b.span.end, &b.id))
    });

    // Helper to flush a gap as a plain segment
    fn flush_plain(doc: &Document, out: &mut Vec<RenderSegment>, start: usize, end: usize) {
        if end > start {
            let span = Span::new(doc.utf16_offset(start), doc.utf16_offset(end));
            out.push(RenderSegment::plain(
                span,
                slice_to_string(doc.rope(), start..end),
            ));
        }
    }

    // Cursor position in both units: code units for spans, bytes for slicing.
    let mut cursor = 0usize;
    let mut cursor_byte = 0usize;
    for (a, bytes) in valid {
        if a.span.end <= cursor {
            debug!("annotation {} at {} is shadowed by an earlier one", a.id, a.span);
            report.shadowed.push(a.id.clone());
            continue;
        }
        let (start, start_byte) = if a.span.start < cursor {
            debug!(
                "annotation {} at {} overlaps an earlier one; rendering from {}",
                a.id, a.span, cursor
            );
            report.trimmed.push(a.id.clone());
            (cursor, cursor_byte)
        } else {
            (a.span.start, bytes.start)
        };

        flush_plain(doc, &mut report.segments, cursor_byte, start_byte);
        let text = slice_to_string(rope, start_byte..bytes.end);
        debug!("segment {} over {:?}", a.id, preview(&text, 24));
        report.segments.push(RenderSegment::annotated(
            Span::new(start, a.span.end),
            text,
            a.clone(),
        ));
        cursor = a.span.end;
        cursor_byte = bytes.end;
    }
    flush_plain(doc, &mut report.segments, cursor_byte, rope.len());

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;
    use pretty_assertions::assert_eq;

    fn hl(id: &str, start: usize, end: usize) -> Annotation {
        Annotation::new(id, Span::new(start, end), AnnotationKind::Highlight)
    }

    fn texts(segments: &[RenderSegment]) -> Vec<(&str, Option<&str>)> {
        segments
            .iter()
            .map(|s| (s.text.as_str(), s.annotation.as_ref().map(|a| a.id.as_str())))
            .collect()
    }

    #[test]
    fn empty_document_has_no_segments() {
        let doc = Document::new("p1", "");
        assert!(build_segments(&doc, &[]).is_empty());
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let doc = Document::new("p1", "The quick brown fox");
        let segments = build_segments(&doc, &[hl("b", 10, 15), hl("a", 4, 9)]);
        assert_eq!(
            texts(&segments),
            vec![
                ("The ", None),
                ("quick", Some("a")),
                (" ", None),
                ("brown", Some("b")),
                (" fox", None),
            ]
        );
    }

    #[test]
    fn annotation_at_document_edges() {
        let doc = Document::new("p1", "abcdef");
        let segments = build_segments(&doc, &[hl("a", 0, 2), hl("b", 4, 6)]);
        assert_eq!(
            texts(&segments),
            vec![("ab", Some("a")), ("cd", None), ("ef", Some("b"))]
        );
    }

    #[test]
    fn out_of_bounds_annotation_is_dropped_not_fatal() {
        let doc = Document::new("p1", "abcdef");
        let report = build_segments_with_report(&doc, &[hl("bad", 4, 40), hl("empty", 2, 2), hl("ok", 0, 1)]);
        assert_eq!(texts(&report.segments), vec![("a", Some("ok")), ("bcdef", None)]);
        assert_eq!(
            report.out_of_bounds,
            vec![AnnotationId::new("bad"), AnnotationId::new("empty")]
        );
    }

    #[test]
    fn overlap_is_first_wins_with_trimmed_remainder() {
        let doc = Document::new("p1", "The quick brown fox");
        let report = build_segments_with_report(&doc, &[hl("first", 4, 9), hl("late", 6, 15)]);
        assert_eq!(
            texts(&report.segments),
            vec![
                ("The ", None),
                ("quick", Some("first")),
                (" brown", Some("late")),
                (" fox", None),
            ]
        );
        assert_eq!(report.segments[2].span, Span::new(9, 15));
        assert_eq!(report.trimmed, vec![AnnotationId::new("late")]);
    }

    #[test]
    fn fully_covered_annotation_is_shadowed() {
        let doc = Document::new("p1", "The quick brown fox");
        let report = build_segments_with_report(&doc, &[hl("outer", 0, 19), hl("inner", 4, 9)]);
        assert_eq!(texts(&report.segments), vec![("The quick brown fox", Some("outer"))]);
        assert_eq!(report.shadowed, vec![AnnotationId::new("inner")]);
        assert!(!report.is_clean());
    }

    #[test]
    fn segment_spans_are_utf16() {
        let doc = Document::new("p1", "😀 smile 😀");
        let segments = build_segments(&doc, &[hl("a", 3, 8)]);
        assert_eq!(texts(&segments), vec![("😀 ", None), ("smile", Some("a")), (" 😀", None)]);
        assert_eq!(segments[0].span, Span::new(0, 3));
        assert_eq!(segments[2].span, Span::new(8, 11));
    }

    #[test]
    fn coverage_holds_for_every_layout() {
        let text = "Reading passage with several words in it.";
        let doc = Document::new("p1", text);
        let len = doc.len_utf16();
        for a in 0..len {
            for b in (a + 1)..=len {
                for c in b..len {
                    let annotations = [hl("x", a, b), hl("y", c, len)];
                    let joined: String = build_segments(&doc, &annotations)
                        .into_iter()
                        .map(|s| s.text)
                        .collect();
                    assert_eq!(joined, text);
                }
            }
        }
    }
}

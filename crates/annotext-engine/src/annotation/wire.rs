//! JSON shapes exchanged with the backend.
//!
//! A document's annotation set travels as one array, either under
//! `feedback.annotations` for essay feedback or under `highlights[partId]`
//! for reading passages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::text::Span;

use super::types::{Annotation, AnnotationId, AnnotationKind, Payload};

/// One annotation record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAnnotation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<WireAnnotation> for Annotation {
    fn from(w: WireAnnotation) -> Self {
        Annotation {
            id: AnnotationId::new(w.id),
            span: Span::new(w.start, w.end),
            kind: w.kind,
            payload: Payload {
                color: w.color,
                text: w.text,
                comment: w.comment,
                suggestion: w.suggestion,
            },
        }
    }
}

impl From<Annotation> for WireAnnotation {
    fn from(a: Annotation) -> Self {
        WireAnnotation {
            id: a.id.as_str().to_string(),
            kind: a.kind,
            start: a.span.start,
            end: a.span.end,
            color: a.payload.color,
            comment: a.payload.comment,
            suggestion: a.payload.suggestion,
            text: a.payload.text,
        }
    }
}

/// Essay feedback blob: `{ "annotations": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackBlob {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Reading passage highlights keyed by passage part id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageHighlights {
    #[serde(default)]
    pub highlights: BTreeMap<String, Vec<Annotation>>,
}

impl PassageHighlights {
    pub fn part(&self, part_id: &str) -> &[Annotation] {
        self.highlights
            .get(part_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replaces the whole annotation list of one part.
    pub fn set_part(&mut self, part_id: impl Into<String>, annotations: Vec<Annotation>) {
        self.highlights.insert(part_id.into(), annotations);
    }
}

/// Decodes a bare JSON array of annotation records.
pub fn decode_annotations(json: &str) -> serde_json::Result<Vec<Annotation>> {
    serde_json::from_str(json)
}

/// Encodes annotations as a bare JSON array of records.
pub fn encode_annotations(annotations: &[Annotation]) -> serde_json::Result<String> {
    serde_json::to_string(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_record_with_optional_fields() {
        let json = r#"[
            {"id": "a1", "type": "highlight", "start": 4, "end": 9, "color": "yellow"},
            {"id": "a2", "type": "comment", "start": 10, "end": 15, "comment": "word choice"}
        ]"#;
        let annotations = decode_annotations(json).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].kind, AnnotationKind::Highlight);
        assert_eq!(annotations[0].span, Span::new(4, 9));
        assert_eq!(annotations[0].payload.color.as_deref(), Some("yellow"));
        assert_eq!(annotations[1].payload.comment.as_deref(), Some("word choice"));
        assert_eq!(annotations[1].payload.color, None);
    }

    #[test]
    fn encode_omits_absent_fields() {
        let a = Annotation::new("a1", Span::new(0, 3), AnnotationKind::Strike);
        let json = encode_annotations(&[a]).unwrap();
        assert_eq!(json, r#"[{"id":"a1","type":"strike","start":0,"end":3}]"#);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let json = r#"[{"id": "a1", "type": "underline", "start": 0, "end": 3}]"#;
        assert!(decode_annotations(json).is_err());
    }

    #[test]
    fn feedback_blob_defaults_to_empty() {
        let blob: FeedbackBlob = serde_json::from_str("{}").unwrap();
        assert!(blob.annotations.is_empty());
    }

    #[test]
    fn passage_highlights_by_part() {
        let json = r#"{"highlights": {"part-1": [{"id": "h", "type": "highlight", "start": 0, "end": 2}]}}"#;
        let passage: PassageHighlights = serde_json::from_str(json).unwrap();
        assert_eq!(passage.part("part-1").len(), 1);
        assert!(passage.part("part-2").is_empty());
    }
}

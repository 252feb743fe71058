use crate::annotation::{Annotation, AnnotationKind};
use crate::view::Element;

use super::Mode;

pub const MARK_TAG: &str = "mark";
pub const ID_ATTR: &str = "data-annotation-id";
pub const KIND_ATTR: &str = "data-kind";

/// True for wrapper elements produced by [`mark_element`].
pub fn is_mark(element: &Element) -> bool {
    element.tag == MARK_TAG && element.attrs.contains_key(ID_ATTR)
}

/// The wrapper element for one piece of an annotated run.
///
/// An annotation spanning several text leaves gets one wrapper per leaf,
/// all carrying the same id.
pub fn mark_element(annotation: &Annotation, mode: Mode) -> Element {
    let kind = annotation.kind;
    let mut mark = Element::new(MARK_TAG)
        .with_attr(ID_ATTR, annotation.id.as_str())
        .with_attr(KIND_ATTR, kind.as_str())
        .with_attr("class", format!("annotation annotation-{kind}"));

    let p = &annotation.payload;
    match kind {
        AnnotationKind::Highlight => {
            if let Some(color) = &p.color {
                mark = mark.with_attr("style", format!("background-color: {color}"));
            }
        }
        AnnotationKind::Strike => {
            mark = mark.with_attr("style", "text-decoration: line-through");
        }
        AnnotationKind::Comment => {
            if let Some(comment) = &p.comment {
                mark = mark.with_attr("title", comment.as_str());
            }
        }
        AnnotationKind::Suggestion => {
            if let Some(suggestion) = &p.suggestion {
                mark = mark.with_attr("title", suggestion.as_str());
            }
        }
    }

    if mode == Mode::Live {
        mark = mark.with_attr("tabindex", "0").with_attr("data-editable", "true");
    }
    mark
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Span;

    #[test]
    fn highlight_carries_color_and_id() {
        let a = Annotation::new("h1", Span::new(0, 1), AnnotationKind::Highlight).with_color("#ff0");
        let mark = mark_element(&a, Mode::ReadOnly);
        assert!(is_mark(&mark));
        assert_eq!(mark.attrs.get(ID_ATTR).map(String::as_str), Some("h1"));
        assert_eq!(
            mark.attrs.get("style").map(String::as_str),
            Some("background-color: #ff0")
        );
        assert!(!mark.attrs.contains_key("tabindex"));
    }

    #[test]
    fn live_marks_are_focusable() {
        let a = Annotation::new("s1", Span::new(0, 1), AnnotationKind::Strike);
        let mark = mark_element(&a, Mode::Live);
        assert_eq!(mark.attrs.get("tabindex").map(String::as_str), Some("0"));
        assert_eq!(
            mark.attrs.get("class").map(String::as_str),
            Some("annotation annotation-strike")
        );
    }

    #[test]
    fn plain_mark_tag_without_id_is_not_ours() {
        assert!(!is_mark(&Element::new("mark")));
    }
}

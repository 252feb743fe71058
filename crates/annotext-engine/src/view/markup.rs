//! Reads passages that arrive as text with inline markup
//! (`The <b>quick</b> fox`) into a [`ViewTree`].
//!
//! Only the inline subset passages use is understood: open/close tags with
//! quoted attributes, self-closing tags, and character entities. The text
//! content of the resulting tree is the document the annotations index.

use thiserror::Error;

use super::cursor::Cursor;
use super::tree::{Element, NodeId, ViewTree};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("malformed tag at byte {at}")]
    MalformedTag { at: usize },

    #[error("closing </{found}> at byte {at} does not match open <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        at: usize,
    },

    #[error("closing </{found}> at byte {at} has no open tag")]
    UnexpectedClose { found: String, at: usize },

    #[error("<{tag}> is never closed")]
    Unclosed { tag: String },
}

impl ViewTree {
    /// Builds a tree rooted at a `root_tag` element from inline markup.
    pub fn from_markup(root_tag: &str, markup: &str) -> Result<ViewTree, MarkupError> {
        let mut tree = ViewTree::new(root_tag);
        let mut open: Vec<NodeId> = vec![tree.root()];
        let mut cur = Cursor::new(markup);

        while !cur.eof() {
            if cur.peek() != Some(b'<') {
                let raw = cur.take_until(b'<');
                let text = html_escape::decode_html_entities(raw).into_owned();
                let leaf = tree.create_text(text);
                tree.append_child(current(&open), leaf);
                continue;
            }

            let at = cur.i;
            cur.bump(); // <
            if cur.peek() == Some(b'/') {
                cur.bump();
                let name = tag_name(&mut cur);
                cur.skip_whitespace();
                if name.is_empty() || cur.bump() != Some(b'>') {
                    return Err(MarkupError::MalformedTag { at });
                }
                if open.len() == 1 {
                    return Err(MarkupError::UnexpectedClose {
                        found: name.to_string(),
                        at,
                    });
                }
                let top = current(&open);
                let expected = tree.element(top).map(|e| e.tag.clone()).unwrap_or_default();
                if expected != name {
                    return Err(MarkupError::MismatchedClose {
                        expected,
                        found: name.to_string(),
                        at,
                    });
                }
                open.pop();
                continue;
            }

            let (element, self_closing) = parse_open_tag(&mut cur).ok_or(MarkupError::MalformedTag { at })?;
            let node = tree.create_element(element);
            tree.append_child(current(&open), node);
            if !self_closing {
                open.push(node);
            }
        }

        if open.len() > 1 {
            let tag = tree
                .element(current(&open))
                .map(|e| e.tag.clone())
                .unwrap_or_default();
            return Err(MarkupError::Unclosed { tag });
        }
        tree.normalize(tree.root());
        Ok(tree)
    }
}

fn current(open: &[NodeId]) -> NodeId {
    // The root is pushed first and never popped.
    open[open.len() - 1]
}

fn tag_name<'a>(cur: &mut Cursor<'a>) -> &'a str {
    cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Parses the rest of an opening tag after `<`, up to and including `>`.
fn parse_open_tag(cur: &mut Cursor<'_>) -> Option<(Element, bool)> {
    let name = tag_name(cur);
    if name.is_empty() {
        return None;
    }
    let mut element = Element::new(name);
    loop {
        cur.skip_whitespace();
        if cur.starts_with(b"/>") {
            cur.bump_n(2);
            return Some((element, true));
        }
        if cur.peek() == Some(b'>') {
            cur.bump();
            return Some((element, false));
        }
        let attr = tag_name(cur);
        if attr.is_empty() {
            return None;
        }
        cur.skip_whitespace();
        let value = if cur.peek() == Some(b'=') {
            cur.bump();
            cur.skip_whitespace();
            let quote = cur.bump().filter(|q| *q == b'"' || *q == b'\'')?;
            let raw = cur.take_until(quote);
            cur.bump()?;
            html_escape::decode_html_entities(raw).into_owned()
        } else {
            String::new()
        };
        element.attrs.insert(attr.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewSnapshot;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_one_leaf() {
        let tree = ViewTree::from_markup("p", "The quick brown fox").unwrap();
        assert_eq!(tree.children(tree.root()).len(), 1);
        assert_eq!(tree.text_content(tree.root()), "The quick brown fox");
    }

    #[test]
    fn nested_inline_markup() {
        let tree = ViewTree::from_markup("p", "The <b>qu<i>ick</i></b> fox").unwrap();
        assert_eq!(tree.text_content(tree.root()), "The quick fox");
        assert_eq!(
            tree.to_html(tree.root()),
            "<p>The <b>qu<i>ick</i></b> fox</p>"
        );
    }

    #[test]
    fn attributes_and_entities() {
        let tree =
            ViewTree::from_markup("p", r#"<span class="q" data-n='3'>A &amp; B</span>"#).unwrap();
        let span = tree.children(tree.root())[0];
        assert_eq!(tree.attr(span, "class"), Some("q"));
        assert_eq!(tree.attr(span, "data-n"), Some("3"));
        assert_eq!(tree.text_content(span), "A & B");
    }

    #[test]
    fn self_closing_tag_has_no_text() {
        let tree = ViewTree::from_markup("p", "line<br/>next").unwrap();
        assert_eq!(tree.text_content(tree.root()), "linenext");
        assert_eq!(
            tree.snapshot(tree.children(tree.root())[1]),
            ViewSnapshot::Element {
                tag: "br".into(),
                attrs: Default::default(),
                children: vec![],
            }
        );
    }

    #[test]
    fn mismatched_close_is_an_error() {
        let err = ViewTree::from_markup("p", "<b>bold</i>").unwrap_err();
        assert!(matches!(err, MarkupError::MismatchedClose { .. }));
    }

    #[test]
    fn unclosed_tag_is_an_error() {
        assert_eq!(
            ViewTree::from_markup("p", "<b>bold").unwrap_err(),
            MarkupError::Unclosed { tag: "b".into() }
        );
    }

    #[test]
    fn stray_close_is_an_error() {
        assert!(matches!(
            ViewTree::from_markup("p", "text</b>").unwrap_err(),
            MarkupError::UnexpectedClose { .. }
        ));
    }
}

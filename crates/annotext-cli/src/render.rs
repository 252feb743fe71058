use std::str::FromStr;

use annotext_config::Palette;
use annotext_engine::materialize::{ID_ATTR, is_mark};
use annotext_engine::{Annotation, AnnotationId, AnnotationKind, HighlightView, NodeId, Span};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span as TextSpan};

/// Palette entries resolved to terminal colors.
pub struct Styles {
    highlight: Style,
    strike: Style,
    comment: Style,
    suggestion: Style,
}

impl Styles {
    pub fn from_palette(palette: &Palette) -> Self {
        let color = |name: &str, fallback: Color| match Color::from_str(name) {
            Ok(c) => c,
            Err(_) => {
                log::warn!("unknown palette color {name:?}, using {fallback:?}");
                fallback
            }
        };
        Self {
            highlight: Style::default()
                .bg(color(&palette.highlight, Color::Yellow))
                .fg(Color::Black),
            strike: Style::default()
                .fg(color(&palette.strike, Color::Red))
                .add_modifier(Modifier::CROSSED_OUT),
            comment: Style::default()
                .fg(color(&palette.comment, Color::Cyan))
                .add_modifier(Modifier::UNDERLINED),
            suggestion: Style::default()
                .fg(color(&palette.suggestion, Color::Green))
                .add_modifier(Modifier::ITALIC | Modifier::UNDERLINED),
        }
    }

    fn for_kind(&self, kind: AnnotationKind) -> Style {
        match kind {
            AnnotationKind::Highlight => self.highlight,
            AnnotationKind::Strike => self.strike,
            AnnotationKind::Comment => self.comment,
            AnnotationKind::Suggestion => self.suggestion,
        }
    }

    /// Palette style for `annotation`, with a highlight's own color as
    /// background when it names a terminal color.
    fn for_annotation(&self, annotation: &Annotation) -> Style {
        let style = self.for_kind(annotation.kind);
        match (annotation.kind, annotation.payload.color.as_deref()) {
            (AnnotationKind::Highlight, Some(color)) => match Color::from_str(color) {
                Ok(c) => style.bg(c),
                Err(_) => style,
            },
            _ => style,
        }
    }
}

/// The annotation whose mark encloses `node`, read from the view tree.
fn mark_annotation(view: &HighlightView, node: NodeId) -> Option<&Annotation> {
    let tree = view.tree();
    let mut cur = tree.parent(node);
    while let Some(n) = cur {
        if let Some(e) = tree.element(n)
            && is_mark(e)
        {
            let id = e.attrs.get(ID_ATTR)?;
            return view.annotations().get(&AnnotationId::new(id.as_str()));
        }
        if n == view.container() {
            break;
        }
        cur = tree.parent(n);
    }
    None
}

/// Paints the view's text leaves as styled lines, showing the caret and the
/// open selection reversed.
pub fn document_lines(
    view: &HighlightView,
    styles: &Styles,
    caret: usize,
    selection: Option<Span>,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<TextSpan<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();

    let mut push_char = |c: char,
                         style: Style,
                         current: &mut Vec<TextSpan<'static>>,
                         lines: &mut Vec<Line<'static>>| {
        if style != run_style && !run.is_empty() {
            current.push(TextSpan::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        if c == '\n' {
            if !run.is_empty() {
                current.push(TextSpan::styled(std::mem::take(&mut run), run_style));
            }
            lines.push(Line::from(std::mem::take(current)));
        } else {
            run.push(c);
        }
    };

    let caret_style = Style::default().add_modifier(Modifier::REVERSED);
    let tree = view.tree();
    let mut caret_drawn = false;
    for (leaf, leaf_span) in tree.text_leaves(view.container()) {
        let base = mark_annotation(view, leaf)
            .map_or(Style::default(), |a| styles.for_annotation(a));
        let mut offset = leaf_span.start;
        for c in tree.text(leaf).unwrap_or_default().chars() {
            let selected = selection.is_some_and(|s| s.contains(offset));
            let style = if offset == caret || selected {
                base.patch(caret_style)
            } else {
                base
            };
            if offset == caret {
                caret_drawn = true;
                if c == '\n' {
                    // Show the caret as a cell before the line break.
                    push_char(' ', caret_style, &mut current, &mut lines);
                    push_char('\n', base, &mut current, &mut lines);
                    offset += c.len_utf16();
                    continue;
                }
            }
            push_char(c, style, &mut current, &mut lines);
            offset += c.len_utf16();
        }
    }
    if !caret_drawn {
        push_char(' ', caret_style, &mut current, &mut lines);
    }
    if !run.is_empty() {
        current.push(TextSpan::styled(run, run_style));
    }
    lines.push(Line::from(current));
    lines
}

use std::time::Instant;

use anyhow::Result;
use annotext_engine::{
    Annotation, AnnotationId, AnnotationKind, AnnotationStore, DocumentId, HighlightView, JsonFileStore,
    MaterializeError, SaveDebouncer, Selection, Span,
};
use crossterm::event::KeyCode;

pub enum InputMode {
    Normal,
    /// Typing the comment for a freshly created comment annotation.
    Comment { id: AnnotationId, buffer: String },
}

pub struct App {
    pub view: HighlightView,
    pub mode: InputMode,
    doc_id: DocumentId,
    store: JsonFileStore,
    debouncer: SaveDebouncer,
    /// Stored records the restore could not place; written back untouched.
    unplaced: Vec<Annotation>,
    chars: Vec<char>,
    /// UTF-16 offset of each char, plus the document length at the end.
    offsets: Vec<usize>,
    caret: usize,
    anchor: Option<usize>,
    message: Option<String>,
}

impl App {
    pub fn new(
        view: HighlightView,
        unplaced: Vec<Annotation>,
        store: JsonFileStore,
        debouncer: SaveDebouncer,
    ) -> Self {
        let text = view.plain_text();
        let chars: Vec<char> = text.chars().collect();
        let mut offsets = Vec::with_capacity(chars.len() + 1);
        let mut running = 0;
        for c in &chars {
            offsets.push(running);
            running += c.len_utf16();
        }
        offsets.push(running);

        Self {
            doc_id: view.document().id().clone(),
            view,
            mode: InputMode::Normal,
            store,
            debouncer,
            unplaced,
            chars,
            offsets,
            caret: 0,
            anchor: None,
            message: None,
        }
    }

    pub fn caret_offset(&self) -> usize {
        self.offsets[self.caret]
    }

    /// The current drag selection in document offsets, if one is open.
    pub fn selection_span(&self) -> Option<Span> {
        self.anchor
            .map(|a| Span::between(self.offsets[a], self.offsets[self.caret]))
    }

    pub fn status(&self) -> String {
        if let InputMode::Comment { buffer, .. } = &self.mode {
            return format!("comment: {buffer}_");
        }
        if let Some(msg) = &self.message {
            return msg.clone();
        }
        match self.view.annotation_at_offset(self.caret_offset()) {
            Some(a) => {
                let note = a
                    .payload
                    .comment
                    .as_deref()
                    .or(a.payload.suggestion.as_deref())
                    .unwrap_or("");
                format!("{} {} {note}", a.kind, a.span)
            }
            None => String::new(),
        }
    }

    /// Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyCode, now: Instant) -> bool {
        if let InputMode::Comment { .. } = self.mode {
            self.handle_comment_key(key, now);
            return false;
        }
        self.message = None;
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Left => self.caret = self.caret.saturating_sub(1),
            KeyCode::Right => self.caret = (self.caret + 1).min(self.chars.len()),
            KeyCode::Up => self.move_vertical(false),
            KeyCode::Down => self.move_vertical(true),
            KeyCode::Char('v') => {
                self.anchor = match self.anchor {
                    Some(_) => None,
                    None => Some(self.caret),
                };
            }
            KeyCode::Char('h') => self.annotate(AnnotationKind::Highlight, now),
            KeyCode::Char('s') => self.annotate(AnnotationKind::Strike, now),
            KeyCode::Char('c') => self.annotate(AnnotationKind::Comment, now),
            KeyCode::Char('x') => self.delete_at_caret(now),
            KeyCode::Esc => self.anchor = None,
            _ => {}
        }
        false
    }

    fn handle_comment_key(&mut self, key: KeyCode, now: Instant) {
        let InputMode::Comment { id, buffer } = &mut self.mode else {
            return;
        };
        match key {
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Enter => {
                let (id, comment) = (id.clone(), std::mem::take(buffer));
                self.mode = InputMode::Normal;
                match self.view.set_comment(&id, comment) {
                    Ok(()) => self.schedule_save(now),
                    Err(e) => self.message = Some(e.to_string()),
                }
            }
            KeyCode::Esc => self.mode = InputMode::Normal,
            _ => {}
        }
    }

    fn move_vertical(&mut self, down: bool) {
        let line_start = |at: usize| {
            self.chars[..at]
                .iter()
                .rposition(|&c| c == '\n')
                .map_or(0, |i| i + 1)
        };
        let start = line_start(self.caret);
        let column = self.caret - start;

        self.caret = if down {
            match self.chars[self.caret..].iter().position(|&c| c == '\n') {
                Some(i) => {
                    let next = self.caret + i + 1;
                    let next_len = self.chars[next..]
                        .iter()
                        .position(|&c| c == '\n')
                        .unwrap_or(self.chars.len() - next);
                    next + column.min(next_len)
                }
                None => self.caret,
            }
        } else if start == 0 {
            self.caret
        } else {
            let prev = line_start(start - 1);
            prev + column.min(start - 1 - prev)
        };
    }

    fn annotate(&mut self, kind: AnnotationKind, now: Instant) {
        let Some(anchor) = self.anchor else {
            self.message = Some("press v to start a selection first".to_string());
            return;
        };
        let points = (
            self.view.point_at(self.offsets[anchor]),
            self.view.point_at(self.caret_offset()),
        );
        let (Some(a), Some(f)) = points else {
            return;
        };

        match self.view.annotate_selection(Selection::new(a, f), kind) {
            Ok(id) => {
                self.anchor = None;
                self.schedule_save(now);
                if kind == AnnotationKind::Comment {
                    self.mode = InputMode::Comment {
                        id,
                        buffer: String::new(),
                    };
                }
            }
            Err(MaterializeError::Resolve(e)) if e.is_not_applicable() => {
                self.message = Some(e.to_string());
            }
            Err(e) => self.message = Some(format!("rejected: {e}")),
        }
    }

    fn delete_at_caret(&mut self, now: Instant) {
        let Some(id) = self
            .view
            .annotation_at_offset(self.caret_offset())
            .map(|a| a.id.clone())
        else {
            return;
        };
        match self.view.remove(&id) {
            Ok(removed) => {
                self.message = Some(format!("removed {}", removed.kind));
                self.schedule_save(now);
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn schedule_save(&mut self, now: Instant) {
        let mut annotations = self.view.annotations().to_vec();
        annotations.extend(self.unplaced.iter().cloned());
        self.debouncer.schedule(self.doc_id.clone(), annotations, now);
    }

    /// When the next debounced save falls due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    pub fn save_due(&mut self, now: Instant) -> Result<()> {
        for save in self.debouncer.due(now) {
            self.store.save(&save.doc, &save.annotations)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        for save in self.debouncer.flush() {
            self.store.save(&save.doc, &save.annotations)?;
        }
        Ok(())
    }
}

/// Stored records that did not make it into `view`.
///
/// A record whose id is already painted (a duplicate) is not kept, since
/// saving it would collide with the placed one.
pub fn unplaced_records(view: &HighlightView, stored: &[Annotation]) -> Vec<Annotation> {
    stored
        .iter()
        .filter(|a| view.annotations().get(&a.id).is_none())
        .cloned()
        .collect()
}

mod app;
mod render;

use anyhow::{Context, Result};
use annotext_config::Config;
use annotext_engine::{
    AnnotationStore, Document, DocumentId, HighlightView, JsonFileStore, Mode, SaveDebouncer,
};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::{Duration, Instant},
};

use app::{App, InputMode, unplaced_records};
use render::{Styles, document_lines};

struct Args {
    document: PathBuf,
    doc_id: Option<String>,
    read_only: bool,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut document = None;
    let mut doc_id = None;
    let mut read_only = false;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--doc-id" => doc_id = Some(rest.next()?.clone()),
            "--read-only" => read_only = true,
            _ if document.is_none() && !arg.starts_with("--") => {
                document = Some(PathBuf::from(arg));
            }
            _ => return None,
        }
    }
    Some(Args {
        document: document?,
        doc_id,
        read_only,
    })
}

fn program_name(args: &[String]) -> &str {
    args.first().map_or("annotext", String::as_str)
}

fn doc_id_for(path: &Path, explicit: Option<String>) -> DocumentId {
    let id = explicit.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    });
    DocumentId::new(id)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let raw: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&raw) else {
        eprintln!(
            "Usage: {} <document.txt> [--doc-id ID] [--read-only]",
            program_name(&raw)
        );
        process::exit(1);
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };
    log::info!("Annotation store: {}", config.store_path.display());

    let bytes = std::fs::read(&args.document)
        .with_context(|| format!("reading {}", args.document.display()))?;
    let doc_id = doc_id_for(&args.document, args.doc_id);
    let doc = Document::from_bytes(doc_id.clone(), &bytes)?;

    let store = JsonFileStore::new(&config.store_path);
    let stored = store.load(&doc_id)?;
    let mode = if args.read_only { Mode::ReadOnly } else { Mode::Live };
    let restored = HighlightView::restore(doc, &stored, mode);

    for issue in &restored.report.issues {
        eprintln!("skipped: {issue}");
    }
    for r in &restored.report.relocated {
        log::info!("{} moved from {} to {}", r.id, r.from, r.to);
    }
    log::info!(
        "{doc_id}: restored {} of {} annotation(s)",
        restored.report.restored,
        stored.len()
    );

    let styles = Styles::from_palette(&config.palette);
    let debouncer = SaveDebouncer::new(Duration::from_millis(config.debounce_ms));
    let unplaced = unplaced_records(&restored.view, &stored);
    let mut app = App::new(restored.view, unplaced, store, debouncer);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &styles);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Pending edits are written even if the loop failed.
    let flushed = app.flush();
    if let Err(err) = res {
        println!("{err:?}");
    }
    flushed
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    styles: &Styles,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app, styles))?;

        let now = Instant::now();
        let timeout = app
            .next_deadline()
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(Duration::from_millis(250));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.handle_key(key.code, Instant::now())
        {
            return Ok(());
        }
        app.save_due(Instant::now())?;
    }
}

fn ui(f: &mut Frame, app: &App, styles: &Styles) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let title = format!(
        "{}{}",
        app.view.document().id(),
        match app.view.mode() {
            Mode::Live => "",
            Mode::ReadOnly => " (read-only)",
        }
    );
    let text = document_lines(&app.view, styles, app.caret_offset(), app.selection_span());
    let content = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(content, chunks[0]);

    let status = Paragraph::new(Line::from(Span::styled(
        app.status(),
        Style::default().fg(Color::Gray),
    )));
    f.render_widget(status, chunks[1]);

    let help = match app.mode {
        InputMode::Comment { .. } => "Enter: Save comment | Esc: Skip",
        InputMode::Normal => {
            "q: Quit | ←↑↓→: Move | v: Select | h: Highlight | s: Strike | c: Comment | x: Delete"
        }
    };
    f.render_widget(Paragraph::new(Line::from(help)), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("annotext")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_document_and_flags() {
        let parsed = parse_args(&args(&["essay.txt", "--doc-id", "essay-42", "--read-only"])).unwrap();
        assert_eq!(parsed.document, PathBuf::from("essay.txt"));
        assert_eq!(parsed.doc_id.as_deref(), Some("essay-42"));
        assert!(parsed.read_only);
    }

    #[test]
    fn rejects_missing_document_and_unknown_flags() {
        assert!(parse_args(&args(&[])).is_none());
        assert!(parse_args(&args(&["a.txt", "--bogus"])).is_none());
        assert!(parse_args(&args(&["a.txt", "--doc-id"])).is_none());
    }

    #[test]
    fn program_name_survives_empty_argv() {
        assert_eq!(program_name(&[]), "annotext");
        assert_eq!(program_name(&args(&[])), "annotext");
        assert_eq!(program_name(&["/usr/bin/at".to_string()]), "/usr/bin/at");
    }

    #[test]
    fn doc_id_defaults_to_file_stem() {
        assert_eq!(doc_id_for(Path::new("/tmp/passage-3.txt"), None).as_str(), "passage-3");
        assert_eq!(doc_id_for(Path::new("x.txt"), Some("p1".into())).as_str(), "p1");
    }
}

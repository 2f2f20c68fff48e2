use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::*;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use log::{error, info};
use tokio::sync::mpsc;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::controller::{SpecField, UIController};
use crate::error::SpecError;
use crate::orchestrator::{RequestOrchestrator, SpecificationResult};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Actions a key press can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Generate,
    Clear,
    Copy(SpecField),
    Insert(char),
    Newline,
    Backspace,
    /// Move the view by this many lines; negative scrolls up.
    Scroll(isize),
    /// Move the view by one screen, up or down.
    Page(isize),
}

pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') if ctrl => Some(Action::Quit),
        KeyCode::Char('g') if ctrl => Some(Action::Generate),
        KeyCode::Char('l') if ctrl => Some(Action::Clear),
        KeyCode::Char('e') if ctrl => Some(Action::Copy(SpecField::English)),
        KeyCode::Char('r') if ctrl => Some(Action::Copy(SpecField::Arabic)),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(Action::Insert(c)),
        KeyCode::Enter => Some(Action::Newline),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Up => Some(Action::Scroll(-1)),
        KeyCode::Down => Some(Action::Scroll(1)),
        KeyCode::PageUp => Some(Action::Page(-1)),
        KeyCode::PageDown => Some(Action::Page(1)),
        _ => None,
    }
}

/// Puts the terminal back however the UI exits.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Full-screen interactive front end over a `UIController`.
pub struct TerminalUI {
    controller: UIController,
    orchestrator: Arc<RequestOrchestrator>,
    tick: usize,
    /// First composed line shown at the top of the terminal.
    scroll: usize,
    /// Rows available at the last render.
    page_height: usize,
}

impl TerminalUI {
    pub fn new(controller: UIController, orchestrator: Arc<RequestOrchestrator>) -> Self {
        Self {
            controller,
            orchestrator,
            tick: 0,
            scroll: 0,
            page_height: 24,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let _guard = TerminalGuard::enter()?;
        info!("Interactive UI started");

        let mut events = EventStream::new();
        let (tx, mut rx) = mpsc::channel::<Result<SpecificationResult, SpecError>>(1);
        let mut ticker = tokio::time::interval(Duration::from_millis(250));
        let mut stdout = io::stdout();

        loop {
            self.render(&mut stdout)?;

            tokio::select! {
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if let Some(action) = action_for(&key) {
                            if action == Action::Quit {
                                break;
                            }
                            self.apply(action, &tx);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Terminal event error: {}", e);
                        return Err(e.into());
                    }
                    None => break,
                },
                Some(outcome) = rx.recv() => {
                    self.controller.complete_generation(outcome);
                }
                _ = ticker.tick() => {
                    self.tick = self.tick.wrapping_add(1);
                }
            }
        }

        info!("Interactive UI closed");
        Ok(())
    }

    fn apply(&mut self, action: Action, tx: &mpsc::Sender<Result<SpecificationResult, SpecError>>) {
        match action {
            Action::Generate => {
                if let Some(description) = self.controller.begin_generation() {
                    self.scroll = 0;
                    let orchestrator = self.orchestrator.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let outcome = orchestrator.generate(&description).await;
                        let _ = tx.send(outcome).await;
                    });
                }
            }
            Action::Clear => {
                if !self.controller.is_loading() {
                    self.controller.clear();
                    self.scroll = 0;
                }
            }
            Action::Copy(field) => {
                self.controller.copy(field);
            }
            Action::Insert(c) => {
                self.controller.edit_description(|d| d.push(c));
            }
            Action::Newline => {
                self.controller.edit_description(|d| d.push('\n'));
            }
            Action::Backspace => {
                self.controller.edit_description(|d| {
                    d.pop();
                });
            }
            Action::Scroll(delta) => self.scroll_by(delta),
            Action::Page(pages) => {
                let step = self.page_height.saturating_sub(2).max(1) as isize;
                self.scroll_by(pages * step);
            }
            Action::Quit => {}
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta);
    }

    fn render(&mut self, stdout: &mut Stdout) -> Result<()> {
        let (width, height) = terminal::size()?;
        let lines = compose(&self.controller, self.tick, width as usize);
        self.page_height = height as usize;
        self.scroll = clamp_scroll(self.scroll, lines.len(), self.page_height);

        queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
        for (row, line) in viewport(&lines, self.scroll, self.page_height).iter().enumerate() {
            queue!(stdout, MoveTo(0, row as u16), Print(line))?;
        }
        stdout.flush()?;
        Ok(())
    }
}

/// Largest useful offset: the last line sits on the bottom row.
fn clamp_scroll(scroll: usize, total: usize, height: usize) -> usize {
    scroll.min(total.saturating_sub(height))
}

/// The lines visible with the view scrolled down by `scroll`.
pub fn viewport(lines: &[String], scroll: usize, height: usize) -> &[String] {
    let start = clamp_scroll(scroll, lines.len(), height);
    let end = (start + height).min(lines.len());
    &lines[start..end]
}

/// Build the screen as a list of already-styled lines.
pub fn compose(controller: &UIController, tick: usize, width: usize) -> Vec<String> {
    let width = width.max(20);
    let loading = controller.is_loading();
    let mut lines = Vec::new();

    lines.push("═".repeat(width).bright_blue().to_string());
    lines.push(
        "Product Specification Generator"
            .bright_white()
            .bold()
            .to_string(),
    );
    lines.push("═".repeat(width).bright_blue().to_string());
    lines.push(String::new());

    lines.push("Product description:".cyan().bold().to_string());
    let mut input: Vec<String> = controller
        .description()
        .split('\n')
        .flat_map(|l| wrap(l, width - 2))
        .map(|l| format!("│ {}", l))
        .collect();
    if !loading {
        if let Some(last) = input.last_mut() {
            last.push('▏');
        }
    }
    if loading {
        input = input.into_iter().map(|l| l.dimmed().to_string()).collect();
    }
    lines.extend(input);
    lines.push(String::new());

    let generate = if loading {
        format!("[ {} Generating... ]", SPINNER[tick % SPINNER.len()])
            .dimmed()
            .to_string()
    } else {
        "[ Ctrl+G  Generate Specifications ]".bright_green().bold().to_string()
    };
    let clear = if loading {
        "[ Ctrl+L  Clear Data ]".dimmed().to_string()
    } else {
        "[ Ctrl+L  Clear Data ]".yellow().to_string()
    };
    lines.push(format!("{}  {}", generate, clear));

    if let Some(message) = controller.error_message() {
        lines.push(String::new());
        for l in wrap(&format!("✗ {}", message), width) {
            lines.push(l.red().bold().to_string());
        }
    }

    if let Some(result) = controller.result() {
        lines.push(String::new());
        let english_label = if controller.is_copied(SpecField::English) {
            "[ ✓ Copied! ]".green().bold().to_string()
        } else {
            "[ Ctrl+E  Copy ]".cyan().to_string()
        };
        lines.push(format!(
            "{}  {}",
            "English Specifications".bright_white().bold(),
            english_label
        ));
        for l in result.english_specs.lines() {
            lines.extend(wrap(l, width));
        }

        lines.push(String::new());
        let arabic_label = if controller.is_copied(SpecField::Arabic) {
            "[ ✓ تم النسخ ]".green().bold().to_string()
        } else {
            "[ Ctrl+R  نسخ ]".cyan().to_string()
        };
        let title = "المواصفات بالعربية";
        let header = format!("{}  {}", arabic_label, title.bright_white().bold());
        let header_len = visible_len(&arabic_label) + 2 + title.width();
        lines.push(align_right(&header, header_len, width));
        for l in result.arabic_specs.lines() {
            for piece in wrap(l, width) {
                let len = piece.width();
                lines.push(align_right(&piece, len, width));
            }
        }
    }

    lines.push(String::new());
    lines.push("↑/↓ PgUp/PgDn scroll   Esc quit".dimmed().to_string());
    lines
}

/// Split `text` into pieces at most `width` columns wide.
///
/// Breaks only between grapheme clusters, so `▪️` and combining marks stay whole.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w > width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push_str(grapheme);
        used += w;
    }
    pieces.push(current);
    pieces
}

fn align_right(styled: &str, visible: usize, width: usize) -> String {
    let pad = width.saturating_sub(visible);
    format!("{}{}", " ".repeat(pad), styled)
}

/// Display width of `styled`, ignoring ANSI color sequences.
fn visible_len(styled: &str) -> usize {
    let mut plain = String::with_capacity(styled.len());
    let mut in_escape = false;
    for c in styled.chars() {
        match (in_escape, c) {
            (false, '\u{1b}') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => plain.push(c),
        }
    }
    plain.width()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardWriter;
    use crate::generation::{GenerationRequest, TextGenerator};
    use async_trait::async_trait;
    use crossterm::event::KeyEventState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullClipboard;

    impl ClipboardWriter for NullClipboard {
        fn write_text(&mut self, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    /// Counts calls and never answers, so the controller stays `Loading`.
    struct StalledGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for StalledGenerator {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn generate_text(&self, _request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            futures::future::pending::<Result<String>>().await
        }
    }

    fn terminal_ui(generator: Arc<dyn TextGenerator>) -> TerminalUI {
        let orchestrator = Arc::new(RequestOrchestrator::new(generator, "gemini-test"));
        TerminalUI::new(UIController::new(Box::new(NullClipboard)), orchestrator)
    }

    fn long_result(lines: usize) -> SpecificationResult {
        let english_specs = (0..lines)
            .map(|i| format!("▪️ Feature {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        SpecificationResult {
            english_specs,
            arabic_specs: "▪️ ميزة".to_string(),
        }
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(action_for(&key(KeyCode::Char('g'), KeyModifiers::CONTROL)), Some(Action::Generate));
        assert_eq!(action_for(&key(KeyCode::Char('l'), KeyModifiers::CONTROL)), Some(Action::Clear));
        assert_eq!(
            action_for(&key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Action::Copy(SpecField::Arabic))
        );
        assert_eq!(action_for(&key(KeyCode::Char('g'), KeyModifiers::NONE)), Some(Action::Insert('g')));
        assert_eq!(action_for(&key(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
        assert_eq!(action_for(&key(KeyCode::Esc, KeyModifiers::NONE)), Some(Action::Quit));
        assert_eq!(action_for(&key(KeyCode::Up, KeyModifiers::NONE)), Some(Action::Scroll(-1)));
        assert_eq!(action_for(&key(KeyCode::PageDown, KeyModifiers::NONE)), Some(Action::Page(1)));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut release = key(KeyCode::Char('a'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(action_for(&release), None);
    }

    #[test]
    fn test_loading_screen_shows_generating_label() {
        colored::control::set_override(false);
        let mut controller = UIController::new(Box::new(NullClipboard));
        controller.set_description("Smart watch");
        controller.begin_generation();

        let screen = compose(&controller, 0, 80).join("\n");
        assert!(screen.contains("Generating..."));
        assert!(!screen.contains("Generate Specifications"));
    }

    #[test]
    fn test_error_banner_only_when_error_set() {
        colored::control::set_override(false);
        let mut controller = UIController::new(Box::new(NullClipboard));
        assert!(!compose(&controller, 0, 80).iter().any(|l| l.starts_with('✗')));

        controller.begin_generation();
        let screen = compose(&controller, 0, 80);
        assert!(screen.iter().any(|l| l.starts_with("✗ Please enter a product description.")));
    }

    #[test]
    fn test_result_panels_and_rtl_alignment() {
        colored::control::set_override(false);
        let mut controller = UIController::new(Box::new(NullClipboard));
        controller.set_description("Kettle");
        controller.begin_generation();
        controller.complete_generation(Ok(SpecificationResult {
            english_specs: "▪️ Boils fast".to_string(),
            arabic_specs: "▪️ يغلي بسرعة".to_string(),
        }));

        let screen = compose(&controller, 0, 40);
        assert!(screen.iter().any(|l| l == "▪️ Boils fast"));
        let arabic = screen.iter().find(|l| l.ends_with("▪️ يغلي بسرعة")).unwrap();
        assert_eq!(arabic.width(), 40);

        controller.copy(SpecField::English);
        let screen = compose(&controller, 0, 40).join("\n");
        assert!(screen.contains("✓ Copied!"));
        assert!(screen.contains("Ctrl+R  نسخ"));
    }

    #[test]
    fn test_wrap_splits_on_width() {
        assert_eq!(wrap("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap("", 4), vec![""]);
    }

    #[test]
    fn test_wrap_keeps_bullet_and_marks_whole() {
        for width in 1..6 {
            for text in ["a▪️ b", "▪️▪️▪️", "cafe\u{301} au lait"] {
                let pieces = wrap(text, width);
                assert_eq!(pieces.concat(), text);
                for piece in &pieces {
                    assert!(!piece.starts_with('\u{fe0f}'), "{:?} at width {}", pieces, width);
                    assert!(!piece.starts_with('\u{301}'), "{:?} at width {}", pieces, width);
                }
            }
        }
    }

    #[test]
    fn test_viewport_clamps_to_last_page() {
        let lines: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        assert_eq!(viewport(&lines, 0, 10).first().unwrap(), "0");
        assert_eq!(viewport(&lines, 5, 10).first().unwrap(), "5");
        let bottom = viewport(&lines, 1000, 10);
        assert_eq!(bottom.len(), 10);
        assert_eq!(bottom.last().unwrap(), "29");
        assert_eq!(viewport(&lines[..3], 4, 10).len(), 3);
    }

    #[tokio::test]
    async fn test_page_down_reveals_lines_below_the_fold() {
        colored::control::set_override(false);
        let mut ui = terminal_ui(Arc::new(StalledGenerator {
            calls: AtomicUsize::new(0),
        }));
        let (tx, _rx) = mpsc::channel(1);
        ui.controller.set_description("Router");
        ui.controller.begin_generation();
        ui.controller.complete_generation(Ok(long_result(60)));
        ui.page_height = 20;

        let lines = compose(&ui.controller, 0, 40);
        let shown = |ui: &TerminalUI| viewport(&lines, ui.scroll, ui.page_height).join("\n");
        assert!(!shown(&ui).contains("▪️ Feature 59"));

        for _ in 0..5 {
            ui.apply(Action::Page(1), &tx);
        }
        assert!(shown(&ui).contains("▪️ Feature 59"));

        ui.apply(Action::Scroll(-1000), &tx);
        assert_eq!(ui.scroll, 0);
        assert!(shown(&ui).contains("Product description:"));
    }

    #[tokio::test]
    async fn test_generate_while_loading_dispatches_one_call() {
        let generator = Arc::new(StalledGenerator {
            calls: AtomicUsize::new(0),
        });
        let mut ui = terminal_ui(generator.clone());
        let (tx, _rx) = mpsc::channel(1);
        ui.controller.set_description("Standing desk");

        ui.apply(Action::Generate, &tx);
        ui.apply(Action::Generate, &tx);
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        ui.apply(Action::Generate, &tx);
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(ui.controller.is_loading());
        assert_eq!(ui.controller.description(), "Standing desk");
    }

    #[test]
    fn test_visible_len_skips_ansi() {
        assert_eq!(visible_len("\u{1b}[1;32mok\u{1b}[0m"), 2);
    }
}

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::error::AppError;
use crate::ui::{ensure_min_size, Tui};

/// Longest text a [`TextInput`] accepts.
pub const MAX_INPUT_LEN: usize = 2047;

/// A blocking overlay that consumes keys until it produces a value.
pub trait Dialog {
    type Output;

    fn handle_key(&mut self, key: KeyEvent) -> Option<Self::Output>;

    fn render(&self, frame: &mut Frame, area: Rect, borders: border::Set);
}

/// Centered half-width box spanning the middle three fifths of the screen.
pub fn modal_area(screen: Rect) -> Rect {
    let width = screen.width / 2;
    let top = screen.height / 5;
    Rect::new(
        screen.x + width / 2,
        screen.y + top,
        width,
        (top * 3).max(5).min(screen.height.saturating_sub(top)),
    )
}

/// Runs `dialog` until it yields. Geometry is recomputed from the terminal
/// size on every pass, so resizes relayout the box; a terminal below the
/// minimum size is fatal.
pub fn run<D: Dialog>(
    terminal: &mut Tui,
    mut dialog: D,
    borders: border::Set,
) -> Result<D::Output, AppError> {
    loop {
        ensure_min_size(terminal.size()?)?;
        terminal.draw(|f| {
            let screen = f.size();
            f.render_widget(Clear, screen);
            dialog.render(f, modal_area(screen), borders);
        })?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(out) = dialog.handle_key(key) {
                    return Ok(out);
                }
            }
            Event::Resize(..) => terminal.autoresize()?,
            _ => {}
        }
    }
}

/// The three questions the application can ask the operator.
pub trait Prompter {
    fn alert(&mut self, title: &str, text: &str) -> Result<(), AppError>;

    fn confirm(&mut self, title: &str, text: &str) -> Result<bool, AppError>;

    fn input(&mut self, title: &str, prompt: &str, initial: &str)
        -> Result<Option<String>, AppError>;
}

/// Shows dialogs full-screen on the live terminal.
pub struct TerminalPrompter<'a> {
    pub terminal: &'a mut Tui,
    pub borders: border::Set,
}

impl Prompter for TerminalPrompter<'_> {
    fn alert(&mut self, title: &str, text: &str) -> Result<(), AppError> {
        run(self.terminal, Alert::new(title, text), self.borders)
    }

    fn confirm(&mut self, title: &str, text: &str) -> Result<bool, AppError> {
        run(self.terminal, Confirm::new(title, text), self.borders)
    }

    fn input(
        &mut self,
        title: &str,
        prompt: &str,
        initial: &str,
    ) -> Result<Option<String>, AppError> {
        run(self.terminal, TextInput::new(title, prompt, initial), self.borders)
    }
}

pub struct Alert {
    title: String,
    text: String,
}

impl Alert {
    pub fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
        }
    }
}

impl Dialog for Alert {
    type Output = ();

    fn handle_key(&mut self, key: KeyEvent) -> Option<()> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => Some(()),
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, borders: border::Set) {
        let rows = frame_box(frame, area, borders, &self.title, &self.text);
        frame.render_widget(Paragraph::new(button("[ok]", true)), indent(rows, 1));
    }
}

/// Yes/no question, focused on "no" until moved.
pub struct Confirm {
    title: String,
    text: String,
    yes: bool,
}

impl Confirm {
    pub fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
            yes: false,
        }
    }
}

impl Dialog for Confirm {
    type Output = bool;

    fn handle_key(&mut self, key: KeyEvent) -> Option<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.yes = false,
            KeyCode::Right | KeyCode::Char('l') => self.yes = true,
            KeyCode::Tab => self.yes = !self.yes,
            KeyCode::Enter => return Some(self.yes),
            KeyCode::Char('y') => return Some(true),
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => return Some(false),
            _ => {}
        }
        None
    }

    fn render(&self, frame: &mut Frame, area: Rect, borders: border::Set) {
        let rows = frame_box(frame, area, borders, &self.title, &self.text);
        let line = Line::from(vec![
            button("[no]", !self.yes),
            Span::raw("  "),
            button("[yes]", self.yes),
        ]);
        frame.render_widget(Paragraph::new(line), indent(rows, 1));
    }
}

/// Single-line editor with cancel/ok, focused on "ok". Typing always edits
/// the end of the buffer.
pub struct TextInput {
    title: String,
    prompt: String,
    buffer: String,
    ok: bool,
}

impl TextInput {
    pub fn new(title: &str, prompt: &str, initial: &str) -> Self {
        Self {
            title: title.to_string(),
            prompt: prompt.to_string(),
            buffer: initial.to_string(),
            ok: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }
}

impl Dialog for TextInput {
    type Output = Option<String>;

    fn handle_key(&mut self, key: KeyEvent) -> Option<Option<String>> {
        match key.code {
            KeyCode::Tab => self.ok = !self.ok,
            KeyCode::Enter => {
                return Some(self.ok.then(|| std::mem::take(&mut self.buffer)));
            }
            KeyCode::Esc => return Some(None),
            KeyCode::Backspace => {
                self.buffer.pop();
            }
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                if self.buffer.chars().count() < MAX_INPUT_LEN {
                    self.buffer.push(c);
                }
            }
            _ => {}
        }
        None
    }

    fn render(&self, frame: &mut Frame, area: Rect, borders: border::Set) {
        let rows = frame_box(frame, area, borders, &self.title, &self.prompt);
        let row = indent(rows, 1);
        let field = usize::from(row.width).saturating_sub(16);

        // Keep the end of a long value in view.
        let mut shown = self.value();
        while shown.width() > field {
            let mut chars = shown.chars();
            chars.next();
            shown = chars.as_str();
        }
        let pad = field.saturating_sub(shown.width());
        let gap = usize::from(row.width).saturating_sub(field + "[cancel] [ok]".len());

        let line = Line::from(vec![
            Span::styled(shown.to_string(), Style::default().fg(Color::Blue)),
            Span::raw("_".repeat(pad)),
            Span::raw(" ".repeat(gap)),
            button("[cancel]", !self.ok),
            Span::raw(" "),
            button("[ok]", self.ok),
        ]);
        frame.render_widget(Paragraph::new(line), row);
    }
}

fn button(label: &'static str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    Span::styled(label, style)
}

/// Draws the outline and wrapped text, returning the row for the controls.
fn frame_box(frame: &mut Frame, area: Rect, borders: border::Set, title: &str, text: &str) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(borders)
        .title(Span::styled(format!(" {title} "), Style::default().fg(Color::Blue)));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    let body = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: false });
    frame.render_widget(body, chunks[0]);
    chunks[1]
}

fn indent(row: Rect, by: u16) -> Rect {
    Rect {
        x: row.x + by.min(row.width),
        width: row.width.saturating_sub(by),
        ..row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn alert_waits_for_acknowledgement() {
        let mut alert = Alert::new("error", "boom");
        assert_eq!(alert.handle_key(key(KeyCode::Char('x'))), None);
        assert_eq!(alert.handle_key(key(KeyCode::Enter)), Some(()));
        assert_eq!(alert.handle_key(key(KeyCode::Char('q'))), Some(()));
    }

    #[test]
    fn confirm_defaults_to_no() {
        let mut confirm = Confirm::new("sure?", "overwrite");
        assert_eq!(confirm.handle_key(key(KeyCode::Enter)), Some(false));
    }

    #[test]
    fn confirm_navigation_and_shortcuts() {
        let mut confirm = Confirm::new("sure?", "overwrite");
        assert_eq!(confirm.handle_key(key(KeyCode::Right)), None);
        assert_eq!(confirm.handle_key(key(KeyCode::Enter)), Some(true));

        confirm.handle_key(key(KeyCode::Tab));
        assert_eq!(confirm.handle_key(key(KeyCode::Enter)), Some(false));

        confirm.handle_key(key(KeyCode::Char('l')));
        confirm.handle_key(key(KeyCode::Char('h')));
        assert_eq!(confirm.handle_key(key(KeyCode::Enter)), Some(false));

        assert_eq!(confirm.handle_key(key(KeyCode::Char('y'))), Some(true));
        assert_eq!(confirm.handle_key(key(KeyCode::Char('n'))), Some(false));
        assert_eq!(confirm.handle_key(key(KeyCode::Char('q'))), Some(false));
    }

    #[test]
    fn text_input_edits_the_seed() {
        let mut input = TextInput::new("save", "where?", "/home/me");
        input.handle_key(key(KeyCode::Char('/')));
        input.handle_key(key(KeyCode::Char('x')));
        input.handle_key(key(KeyCode::Backspace));
        input.handle_key(key(KeyCode::Left));
        assert_eq!(input.value(), "/home/me/");
        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            Some(Some("/home/me/".to_string()))
        );
    }

    #[test]
    fn backspace_stops_at_the_start() {
        let mut input = TextInput::new("save", "where?", "ab");
        for _ in 0..5 {
            input.handle_key(key(KeyCode::Backspace));
        }
        assert_eq!(input.value(), "");
        input.handle_key(key(KeyCode::Char('c')));
        assert_eq!(input.value(), "c");
    }

    #[test]
    fn text_input_cancel_yields_nothing() {
        let mut input = TextInput::new("save", "where?", "/tmp/list");
        input.handle_key(key(KeyCode::Tab));
        assert_eq!(input.handle_key(key(KeyCode::Enter)), Some(None));

        let mut input = TextInput::new("save", "where?", "/tmp/list");
        assert_eq!(input.handle_key(key(KeyCode::Esc)), Some(None));
    }

    #[test]
    fn control_chords_are_not_typed() {
        let mut input = TextInput::new("save", "where?", "");
        input.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        input.handle_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT));
        assert_eq!(input.value(), "A");
    }

    #[test]
    fn modal_box_is_centered() {
        let area = modal_area(Rect::new(0, 0, 80, 25));
        assert_eq!(area, Rect::new(20, 5, 40, 15));
        let small = modal_area(Rect::new(0, 0, 35, 15));
        assert_eq!(small, Rect::new(8, 3, 17, 9));
    }
}

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::app::{App, Mode};
use crate::error::AppError;
use crate::list::{truncate_label, ScrollableList};
use crate::player::PlayerState;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

pub const MIN_WIDTH: u16 = 35;
pub const MIN_HEIGHT: u16 = 15;

/// `-|-|++++` outlines for terminals without box drawing.
pub const ASCII_BORDERS: border::Set = border::Set {
    top_left: "+",
    top_right: "+",
    bottom_left: "+",
    bottom_right: "+",
    vertical_left: "|",
    vertical_right: "|",
    horizontal_top: "-",
    horizontal_bottom: "-",
};

pub fn borders(ascii: bool) -> border::Set {
    if ascii {
        ASCII_BORDERS
    } else {
        border::ROUNDED
    }
}

pub fn ensure_min_size(size: Rect) -> Result<(), AppError> {
    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        return Err(AppError::TerminalTooSmall {
            width: size.width,
            height: size.height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }
    Ok(())
}

pub fn init() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

pub fn restore() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

/// Leaves raw mode before the default panic report is printed.
pub fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        hook(panic_info);
    }));
}

/// Splits the screen into the explorer (two fifths) and playlist (three fifths).
pub fn pane_areas(screen: Rect) -> (Rect, Rect) {
    let usable = screen.width.saturating_sub(1);
    let explorer = usable * 2 / 5;
    let playlist = usable * 3 / 5;
    (
        Rect::new(screen.x, screen.y, explorer, screen.height),
        Rect::new(screen.x + explorer + 1, screen.y, playlist, screen.height),
    )
}

pub fn draw(f: &mut Frame, app: &mut App, borders: border::Set) {
    let (explorer_area, playlist_area) = pane_areas(f.size());

    let focused = app.mode == Mode::FileExplorer;
    let block = pane_block("add songs to playlist", borders, focused);
    let viewport = block.inner(explorer_area);
    f.render_widget(block, explorer_area);
    app.browser.list_mut().reconcile_scroll(viewport);
    let lines = list_lines(app.browser.list(), viewport, focused, |entry| entry.label(), |_| None);
    f.render_widget(Paragraph::new(lines), viewport);

    let focused = app.mode == Mode::Playlist;
    let block = pane_block("playlist", borders, focused);
    let viewport = block.inner(playlist_area);
    f.render_widget(block, playlist_area);
    let marker = (app.player.state() != PlayerState::Idle).then_some(app.player.current());
    let marker_color = match app.player.state() {
        PlayerState::Playing => Color::Green,
        _ => Color::Red,
    };
    app.playlist.list_mut().reconcile_scroll(viewport);
    let lines = list_lines(
        app.playlist.list(),
        viewport,
        focused,
        |track| {
            track
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| track.display().to_string())
        },
        |index| (Some(index) == marker).then_some(marker_color),
    );
    f.render_widget(Paragraph::new(lines), viewport);
}

fn pane_block(title: &str, borders: border::Set, focused: bool) -> Block<'static> {
    let title_style = if focused {
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_set(borders)
        .title(Span::styled(format!(" {title} "), title_style))
}

/// Visible rows of `list`, cut to the viewport width. `color` picks a
/// foreground for a row; the cursor row is reversed when the pane has focus.
fn list_lines<T>(
    list: &ScrollableList<T>,
    viewport: Rect,
    focused: bool,
    label: impl Fn(&T) -> String,
    color: impl Fn(usize) -> Option<Color>,
) -> Vec<Line<'static>> {
    let width = usize::from(viewport.width);
    list.visible(usize::from(viewport.height))
        .map(|(index, item)| {
            let text = truncate_label(&label(item), width).into_owned();
            let mut style = Style::default();
            if let Some(fg) = color(index) {
                style = style.fg(fg);
            }
            if focused && index == list.cursor() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::from(Span::styled(text, style))
        })
        .collect()
}

use std::borrow::Cow;

use ratatui::layout::Rect;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Ordered items with a clamped cursor and a scroll offset that keeps the
/// cursor row inside the viewport.
#[derive(Debug, Clone)]
pub struct ScrollableList<T> {
    items: Vec<T>,
    cursor: usize,
    scroll: usize,
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            scroll: 0,
        }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: 0,
            scroll: 0,
        }
    }

    /// Swaps in a new item set and resets cursor and scroll.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn jump_first(&mut self) {
        self.cursor = 0;
    }

    pub fn jump_last(&mut self) {
        self.cursor = self.items.len().saturating_sub(1);
    }

    /// Swaps the item under the cursor with its neighbour `delta` rows away
    /// and moves the cursor along. Returns the index the item left, or `None`
    /// when the neighbour is out of bounds.
    pub fn shift_selected(&mut self, delta: isize) -> Option<usize> {
        let from = self.cursor;
        let to = from.checked_add_signed(delta)?;
        if to >= self.items.len() {
            return None;
        }
        self.items.swap(from, to);
        self.cursor = to;
        Some(from)
    }

    /// Adjusts the scroll offset by the smallest amount that puts the cursor
    /// row inside `viewport`.
    pub fn reconcile_scroll(&mut self, viewport: Rect) {
        let rows = usize::from(viewport.height.max(1));
        if self.cursor >= self.scroll + rows {
            self.scroll = self.cursor + 1 - rows;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        }
    }

    /// Items visible in a viewport of `rows` rows, paired with their index.
    pub fn visible(&self, rows: usize) -> impl Iterator<Item = (usize, &T)> {
        self.items.iter().enumerate().skip(self.scroll).take(rows)
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cuts `label` to fit `width` columns, marking the cut with an ellipsis.
pub fn truncate_label(label: &str, width: usize) -> Cow<'_, str> {
    if label.width() <= width {
        return Cow::Borrowed(label);
    }
    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut used = 0;
    let mut out = String::new();
    for ch in label.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(&ELLIPSIS[..ELLIPSIS.len().min(width)]);
    Cow::Owned(out)
}

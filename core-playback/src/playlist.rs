//! # Playlist
//!
//! Ordered sequence with a cursor. Pure data, no I/O.
//!
//! The cursor is always inside `[0, len - 1]` while the playlist is non-empty
//! and is `0` when it is empty. Out-of-range input is clamped, never
//! rejected, so no operation here can fail.

/// Ordered sequence of `T` with a current-position cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist<T> {
    items: Vec<T>,
    index: usize,
}

impl<T> Default for Playlist<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: 0,
        }
    }
}

impl<T> Playlist<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents and reset the cursor to the first item.
    pub fn init_from_list(&mut self, items: impl IntoIterator<Item = T>) {
        self.init_from_list_at(items, 0);
    }

    /// Replace the contents and place the cursor at `index` (clamped).
    pub fn init_from_list_at(&mut self, items: impl IntoIterator<Item = T>, index: usize) {
        self.items = items.into_iter().collect();
        self.set_index(index);
    }

    /// Append `item`. The first item added becomes current.
    pub fn add_to_end(&mut self, item: T) {
        self.items.push(item);
        if self.items.len() == 1 {
            self.index = 0;
        }
    }

    /// Insert `item` right after the cursor, or as the sole item when empty.
    pub fn insert_next(&mut self, item: T) {
        if self.items.is_empty() {
            self.items.push(item);
            self.index = 0;
        } else {
            self.items.insert(self.index + 1, item);
        }
    }

    /// Move the cursor to `index`, clamped into range.
    pub fn set_index(&mut self, index: usize) {
        self.index = match self.items.len() {
            0 => 0,
            len => index.min(len - 1),
        };
    }

    /// Advance the cursor. Returns `false` (and does nothing) at the end.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Step the cursor back. Returns `false` (and does nothing) at the start.
    pub fn previous(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.items.len()
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0 && !self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index = 0;
    }

    /// Item under the cursor, `None` iff the playlist is empty.
    pub fn current(&self) -> Option<&T> {
        self.items.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Clone> Playlist<T> {
    /// Order-preserving copy of the items.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

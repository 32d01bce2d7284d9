//! # Navigable Playlist
//!
//! A [`Playlist`] wrapper that reports when a mutation changed which item is
//! current.
//!
//! ## Overview
//!
//! Every cursor-affecting operation first commits the playlist mutation and
//! then compares the identity of the current item before and after. When it
//! changed, the operation returns a [`TrackChange`] describing what the
//! player has to do next. The caller applies that change after releasing
//! whatever lock guards the playlist, so a slow or failing player can never
//! leave the cursor half-updated.
//!
//! Navigation that does not move the cursor (`next()` on the last item,
//! `set_index` to the current position) reports neither a move nor a change
//! and must not trigger a reload. A move between two entries sharing an id
//! is reported as a move without a change.
//!
//! `init_from_list*` replaces the playlist wholesale and always asks for the
//! new current item to be loaded, even when it has the same id as before.

use crate::playlist::Playlist;
use std::fmt::Debug;

/// Items with a stable identity.
pub trait Identified {
    type Id: PartialEq + Clone + Debug;

    fn id(&self) -> &Self::Id;
}

/// Player action required after the current item changed.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackChange<T> {
    /// Load `T` into the player.
    Load(T),
    /// The playlist became empty; stop the player.
    Stop,
}

/// Result of a cursor navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorMove<T> {
    /// The cursor position changed.
    pub moved: bool,
    /// Set only when the current item's identity changed.
    pub change: Option<TrackChange<T>>,
}

impl<T> CursorMove<T> {
    fn stay() -> Self {
        Self {
            moved: false,
            change: None,
        }
    }
}

/// [`Playlist`] that reports current-item changes.
#[derive(Debug, Clone)]
pub struct NavigablePlaylist<T> {
    inner: Playlist<T>,
}

impl<T> Default for NavigablePlaylist<T> {
    fn default() -> Self {
        Self {
            inner: Playlist::default(),
        }
    }
}

impl<T: Identified + Clone> NavigablePlaylist<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the underlying playlist.
    pub fn playlist(&self) -> &Playlist<T> {
        &self.inner
    }

    pub fn current(&self) -> Option<&T> {
        self.inner.current()
    }

    pub fn init_from_list(&mut self, items: impl IntoIterator<Item = T>) -> Option<TrackChange<T>> {
        self.init_from_list_at(items, 0)
    }

    /// Replace the contents. Returns `Load` for any non-empty list.
    pub fn init_from_list_at(
        &mut self,
        items: impl IntoIterator<Item = T>,
        index: usize,
    ) -> Option<TrackChange<T>> {
        let had_current = self.inner.current().is_some();
        self.inner.init_from_list_at(items, index);

        match self.inner.current() {
            Some(current) => Some(TrackChange::Load(current.clone())),
            None if had_current => Some(TrackChange::Stop),
            None => None,
        }
    }

    pub fn add_to_end(&mut self, item: T) -> Option<TrackChange<T>> {
        self.track(|playlist| playlist.add_to_end(item))
    }

    pub fn insert_next(&mut self, item: T) -> Option<TrackChange<T>> {
        self.track(|playlist| playlist.insert_next(item))
    }

    pub fn set_index(&mut self, index: usize) -> CursorMove<T> {
        let before = self.inner.index();
        let change = self.track(|playlist| playlist.set_index(index));
        self.moved_from(before, change)
    }

    pub fn next(&mut self) -> CursorMove<T> {
        if !self.inner.has_next() {
            return CursorMove::stay();
        }
        let change = self.track(|playlist| {
            playlist.next();
        });
        CursorMove {
            moved: true,
            change,
        }
    }

    pub fn previous(&mut self) -> CursorMove<T> {
        if !self.inner.has_prev() {
            return CursorMove::stay();
        }
        let change = self.track(|playlist| {
            playlist.previous();
        });
        CursorMove {
            moved: true,
            change,
        }
    }

    pub fn clear(&mut self) -> Option<TrackChange<T>> {
        self.track(Playlist::clear)
    }

    fn moved_from(&self, before: usize, change: Option<TrackChange<T>>) -> CursorMove<T> {
        CursorMove {
            moved: self.inner.index() != before,
            change,
        }
    }

    fn track<F>(&mut self, mutate: F) -> Option<TrackChange<T>>
    where
        F: FnOnce(&mut Playlist<T>),
    {
        let before = self.inner.current().map(|item| item.id().clone());
        mutate(&mut self.inner);

        match (before, self.inner.current()) {
            (Some(before), Some(after)) if &before == after.id() => None,
            (_, Some(after)) => Some(TrackChange::Load(after.clone())),
            (Some(_), None) => Some(TrackChange::Stop),
            (None, None) => None,
        }
    }
}

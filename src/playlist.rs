//! Playlist ordering: canonical order, active order and shuffle.
//!
//! The canonical order is the order tracks were loaded in. The active order
//! is what the engine iterates; it equals the canonical order until shuffle
//! is switched on, at which point the current track is anchored at the front
//! and the remainder randomized. Switching shuffle off restores the canonical
//! order verbatim.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

pub struct Playlist<R: Rng = StdRng> {
    canonical: Vec<PathBuf>,
    active: Vec<PathBuf>,
    current: Option<usize>,
    shuffle: bool,
    rng: R,
}

impl<R: Rng> Playlist<R> {
    pub fn new(rng: R) -> Self {
        Self {
            canonical: Vec::new(),
            active: Vec::new(),
            current: None,
            shuffle: false,
            rng,
        }
    }

    /// Rebuild from persisted state.
    ///
    /// An empty `canonical` means the canonical order was never saved; the
    /// active order stands in for it. An out-of-range index falls back to 0.
    pub fn restore(
        &mut self,
        canonical: Vec<PathBuf>,
        active: Vec<PathBuf>,
        index: usize,
        shuffle: bool,
    ) {
        let canonical = if canonical.len() == active.len() {
            canonical
        } else {
            active.clone()
        };
        self.current = if active.is_empty() {
            None
        } else if index < active.len() {
            Some(index)
        } else {
            Some(0)
        };
        self.canonical = canonical;
        self.active = active;
        self.shuffle = shuffle;
    }

    /// Replace the whole playlist. Returns `false` (and changes nothing) for
    /// an empty list. `start` past the end selects the first track.
    pub fn replace(&mut self, tracks: Vec<PathBuf>, start: usize) -> bool {
        if tracks.is_empty() {
            return false;
        }
        self.current = Some(if start < tracks.len() { start } else { 0 });
        self.canonical = tracks.clone();
        self.active = tracks;
        true
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// The active order.
    pub fn tracks(&self) -> &[PathBuf] {
        &self.active
    }

    pub fn canonical(&self) -> &[PathBuf] {
        &self.canonical
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current
            .and_then(|i| self.active.get(i))
            .map(PathBuf::as_path)
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    /// Select `index` directly. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.active.len() {
            return false;
        }
        self.current = Some(index);
        true
    }

    /// Move one step in `dir` and return the new current index.
    ///
    /// Without shuffle this wraps around in both directions. With shuffle it
    /// picks a uniformly random index other than the current one; a single
    /// track simply stays selected.
    pub fn step(&mut self, dir: Direction) -> Option<usize> {
        let len = self.active.len();
        let cur = self.current?;
        let next = if self.shuffle {
            self.random_other(cur)
        } else {
            match dir {
                Direction::Forward => (cur + 1) % len,
                Direction::Backward => (cur + len - 1) % len,
            }
        };
        self.current = Some(next);
        Some(next)
    }

    /// Like `step`, but never lands on an index in `skip`. Returns `None`
    /// (and keeps the selection) when every other track is skipped.
    pub fn step_avoiding(&mut self, dir: Direction, skip: &HashSet<usize>) -> Option<usize> {
        let len = self.active.len();
        let cur = self.current?;
        let next = if self.shuffle {
            let open: Vec<usize> = (0..len)
                .filter(|i| *i != cur && !skip.contains(i))
                .collect();
            open.choose(&mut self.rng).copied()
        } else {
            (1..len)
                .map(|k| match dir {
                    Direction::Forward => (cur + k) % len,
                    Direction::Backward => (cur + len - k) % len,
                })
                .find(|i| !skip.contains(i))
        }?;
        self.current = Some(next);
        Some(next)
    }

    fn random_other(&mut self, cur: usize) -> usize {
        let len = self.active.len();
        if len <= 1 {
            return cur;
        }
        // Draw from len-1 slots and skip over the current one.
        let pick = self.rng.random_range(0..len - 1);
        if pick >= cur { pick + 1 } else { pick }
    }

    /// Switch shuffle on or off.
    ///
    /// On: the current track moves to position 0, everything else is
    /// randomly permuted behind it, and the current index becomes 0.
    /// Off: the canonical order comes back and the current track is located
    /// in it again (index 0 if it cannot be found).
    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
        let Some(cur) = self.current else {
            return;
        };
        let current_track = self.active[cur].clone();

        if enabled {
            let mut rest = self.active.clone();
            rest.remove(cur);
            rest.shuffle(&mut self.rng);
            rest.insert(0, current_track);
            self.active = rest;
            self.current = Some(0);
        } else {
            self.active = self.canonical.clone();
            let pos = self.active.iter().position(|p| *p == current_track);
            self.current = Some(pos.unwrap_or(0));
        }
    }
}

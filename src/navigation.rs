// SPDX-License-Identifier: MPL-2.0
//! Navigation state machine over the playlist.
//!
//! The `Navigator` owns the playlist and is the single place that moves
//! its cursor. Every taken transition re-arms the player with the new
//! entry and recomputes the [`UiState`] snapshot — strictly after the
//! reload succeeds, so the rendered title and label always match the item
//! that is actually looping. Refused moves at either end of the playlist
//! are silent no-ops that trigger no reload.

use crate::error::Result;
use crate::player::VideoPlayer;
use crate::playlist::Playlist;

const APP_NAME: &str = "IcedReel";

/// Derived, read-only snapshot the shell renders after each transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// Window title: file name, 1-based position, total count, app name.
    pub title: String,
    /// Display name of the current entry.
    pub label: String,
    /// Whether the previous button is actionable.
    pub previous_enabled: bool,
    /// Whether the next button is actionable.
    pub next_enabled: bool,
}

/// Drives the playlist cursor and keeps player and UI snapshot in step.
#[derive(Debug)]
pub struct Navigator {
    playlist: Playlist,
}

impl Navigator {
    pub fn new(playlist: Playlist) -> Self {
        Self { playlist }
    }

    /// Enters the initial state: arms the player with the first entry.
    pub fn select_initial(&mut self, player: &mut VideoPlayer) -> Result<UiState> {
        player.load_and_loop(self.playlist.current().source_path())?;
        Ok(self.ui_state())
    }

    /// Moves to the next entry; a no-op at the last one.
    pub fn next(&mut self, player: &mut VideoPlayer) -> Result<UiState> {
        self.shift(1, player)
    }

    /// Moves to the previous entry; a no-op at the first one.
    pub fn previous(&mut self, player: &mut VideoPlayer) -> Result<UiState> {
        self.shift(-1, player)
    }

    fn shift(&mut self, delta: isize, player: &mut VideoPlayer) -> Result<UiState> {
        if !self.playlist.advance(delta) {
            // Out of range: the transition is simply not taken. The
            // enablement flags are how the UI learns a move is unavailable.
            return Ok(self.ui_state());
        }

        let path = self.playlist.current().source_path().to_path_buf();
        match player.load_and_loop(&path) {
            Ok(()) => Ok(self.ui_state()),
            Err(e) => {
                // Roll the cursor back so the snapshot keeps matching the
                // item that is still looping.
                self.playlist.advance(-delta);
                Err(e)
            }
        }
    }

    /// Recomputes the snapshot from the cursor position.
    pub fn ui_state(&self) -> UiState {
        let entry = self.playlist.current();
        UiState {
            title: format!(
                "{} ({}/{}) - {}",
                entry.file_name(),
                self.playlist.index() + 1,
                self.playlist.len(),
                APP_NAME
            ),
            label: entry.display_name().to_string(),
            previous_enabled: self.playlist.has_previous(),
            next_enabled: self.playlist.has_next(),
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }
}

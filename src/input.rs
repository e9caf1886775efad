// SPDX-License-Identifier: MPL-2.0
//! Keyboard routing: one key press maps to at most one playback action.
//!
//! The router is a pure function so the whole shortcut table is testable
//! without a window. Letter commands are case-insensitive and ignored
//! while command/alt modifiers are held, leaving those combinations free
//! for the platform.

use iced::keyboard::{self, key::Named, Key};

/// Actions a key press can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Toggle between playing and paused.
    TogglePlayPause,
    /// Seek backward by the configured step.
    SeekBackward,
    /// Seek forward by the configured step.
    SeekForward,
    /// Move to the next playlist entry.
    Next,
    /// Move to the previous playlist entry.
    Previous,
    /// Raise the audio volume one step.
    VolumeUp,
    /// Lower the audio volume one step.
    VolumeDown,
    /// Toggle audio mute.
    ToggleMute,
    /// Request process termination.
    Quit,
}

/// Maps a key press to its action, or `None` for keys this player ignores.
pub fn route(key: &Key, modifiers: keyboard::Modifiers) -> Option<Action> {
    match key {
        Key::Named(Named::Space) => Some(Action::TogglePlayPause),
        Key::Named(Named::ArrowLeft) => Some(Action::SeekBackward),
        Key::Named(Named::ArrowRight) => Some(Action::SeekForward),
        Key::Named(Named::ArrowUp) => Some(Action::VolumeUp),
        Key::Named(Named::ArrowDown) => Some(Action::VolumeDown),
        Key::Character(c) if !modifiers.command() && !modifiers.alt() => {
            match c.as_str() {
                "n" | "N" => Some(Action::Next),
                "p" | "P" => Some(Action::Previous),
                "m" | "M" => Some(Action::ToggleMute),
                "q" | "Q" => Some(Action::Quit),
                _ => None,
            }
        }
        _ => None,
    }
}

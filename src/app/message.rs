// SPDX-License-Identifier: MPL-2.0
//! Top-level messages and runtime flags for the application.

use crate::player::PlaybackMessage;
use crate::playlist::VideoEntry;
use crate::ui::transport;
use iced::keyboard;

/// Top-level messages consumed by `App::update`. The variants forward
/// lower-level component messages while keeping a single update entrypoint.
#[derive(Debug, Clone)]
pub enum Message {
    /// A transport button was pressed.
    Transport(transport::Message),
    /// A key was pressed somewhere in the window.
    KeyPressed {
        key: keyboard::Key,
        modifiers: keyboard::Modifiers,
        /// Whether a widget already captured the press. Routing captured
        /// presses is a config policy, decided in `update`.
        captured: bool,
    },
    /// An event from the playback engine subscription.
    Playback(PlaybackMessage),
    /// Window close was requested (user clicked X or pressed Alt+F4).
    WindowCloseRequested,
}

/// Startup data passed in from `main` after argument validation.
#[derive(Debug, Default)]
pub struct Flags {
    /// Validated playlist entries, in argument order. Never empty.
    pub entries: Vec<VideoEntry>,
}

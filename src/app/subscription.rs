// SPDX-License-Identifier: MPL-2.0
//! Event subscriptions for the application.
//!
//! Two sources feed the update loop: native window/keyboard events, and
//! the playback engine subscription for whatever item is currently armed.
//! The playback subscription is keyed on the player's session id, so every
//! re-arm restarts it against the new item.

use super::{App, Message};
use crate::player;
use iced::{event, keyboard, window, Subscription};

pub fn subscription(app: &App) -> Subscription<Message> {
    let events = event::listen_with(route_event);

    let playback = match app.player.active_path() {
        Some(path) => player::video_playback(
            path.to_path_buf(),
            app.player.session_id(),
            app.volume,
            app.muted,
        )
        .map(Message::Playback),
        None => Subscription::none(),
    };

    Subscription::batch([events, playback])
}

/// Translates native events into messages.
///
/// Key presses are forwarded regardless of whether a widget captured them;
/// the update loop applies the configured routing policy. Close requests
/// are forwarded for loop teardown.
fn route_event(
    event: event::Event,
    status: event::Status,
    _window: window::Id,
) -> Option<Message> {
    match event {
        event::Event::Window(window::Event::CloseRequested) => {
            Some(Message::WindowCloseRequested)
        }
        event::Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            Some(Message::KeyPressed {
                key,
                modifiers,
                captured: matches!(status, event::Status::Captured),
            })
        }
        _ => None,
    }
}

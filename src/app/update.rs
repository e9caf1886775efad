// SPDX-License-Identifier: MPL-2.0
//! Message handling for the application.

use super::{App, Message};
use crate::error::VideoError;
use crate::input::{self, Action};
use crate::player::PlaybackMessage;
use crate::ui::transport;
use iced::widget::image;
use iced::Task;

pub fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::Transport(transport::Message::Previous) => {
            let result = app.navigator.previous(&mut app.player);
            app.apply_transition(result);
            Task::none()
        }
        Message::Transport(transport::Message::Next) => {
            let result = app.navigator.next(&mut app.player);
            app.apply_transition(result);
            Task::none()
        }
        Message::KeyPressed {
            key,
            modifiers,
            captured,
        } => {
            if captured && app.exclusive_keys {
                return Task::none();
            }
            match input::route(&key, modifiers) {
                Some(action) => apply_action(app, action),
                None => Task::none(),
            }
        }
        Message::Playback(playback) => handle_playback(app, playback),
        Message::WindowCloseRequested => quit(app),
    }
}

fn apply_action(app: &mut App, action: Action) -> Task<Message> {
    match action {
        Action::TogglePlayPause => {
            app.player.toggle_play_pause();
            Task::none()
        }
        Action::SeekBackward => {
            app.player.seek_relative(-app.seek_step_secs);
            Task::none()
        }
        Action::SeekForward => {
            app.player.seek_relative(app.seek_step_secs);
            Task::none()
        }
        Action::Next => {
            let result = app.navigator.next(&mut app.player);
            app.apply_transition(result);
            Task::none()
        }
        Action::Previous => {
            let result = app.navigator.previous(&mut app.player);
            app.apply_transition(result);
            Task::none()
        }
        Action::VolumeUp => {
            app.volume = app.volume.increase();
            app.player.set_volume(app.volume);
            Task::none()
        }
        Action::VolumeDown => {
            app.volume = app.volume.decrease();
            app.player.set_volume(app.volume);
            Task::none()
        }
        Action::ToggleMute => {
            app.muted = !app.muted;
            app.player.set_muted(app.muted);
            Task::none()
        }
        Action::Quit => quit(app),
    }
}

fn handle_playback(app: &mut App, message: PlaybackMessage) -> Task<Message> {
    match message {
        PlaybackMessage::Started(sender) => {
            app.player.engine_attached(sender);
            app.player.set_volume(app.volume);
            app.player.set_muted(app.muted);
        }
        PlaybackMessage::Loaded { duration_secs, .. } => {
            app.player.item_opened(duration_secs);
        }
        PlaybackMessage::FrameReady {
            rgba_data,
            width,
            height,
            pts_secs,
        } => {
            app.frame = Some(image::Handle::from_rgba(
                width,
                height,
                rgba_data.as_ref().clone(),
            ));
            app.player.frame_displayed(pts_secs);
        }
        PlaybackMessage::Looped => {
            app.player.loop_wrapped();
        }
        PlaybackMessage::Error(msg) => {
            // Keep the last-good frame on screen; just report.
            let error = VideoError::from_message(&msg);
            tracing::warn!("playback error: {}", error);
            app.status = Some(error.to_string());
        }
    }
    Task::none()
}

fn quit(app: &mut App) -> Task<Message> {
    app.player.teardown_loop();
    iced::exit()
}

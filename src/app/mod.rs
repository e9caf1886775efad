// SPDX-License-Identifier: MPL-2.0
//! Application root state and orchestration.
//!
//! The `App` struct wires the navigation state machine, the playback
//! controller, and the input router together, and translates messages into
//! transitions. Policy decisions (window sizing, seek step, key routing)
//! stay close to the update loop so user-facing behavior is easy to audit.

mod message;
mod subscription;
mod update;
mod view;

pub use message::{Flags, Message};

use crate::config;
use crate::error::Result;
use crate::navigation::{Navigator, UiState};
use crate::player::{VideoPlayer, Volume};
use crate::playlist::Playlist;
use iced::widget::image;
use iced::{window, Element, Subscription, Task, Theme};
use std::fmt;

pub const WINDOW_DEFAULT_WIDTH: u32 = 960;
pub const WINDOW_DEFAULT_HEIGHT: u32 = 600;
pub const MIN_WINDOW_WIDTH: u32 = 480;
pub const MIN_WINDOW_HEIGHT: u32 = 320;

/// Root Iced application state.
pub struct App {
    /// Navigation state machine; owns the playlist.
    navigator: Navigator,
    /// Playback controller; the long-lived engine handle.
    player: VideoPlayer,
    /// Snapshot rendered by the view, recomputed on every transition.
    ui: UiState,
    /// Last decoded frame; kept across navigation so the surface never
    /// goes blank between items.
    frame: Option<image::Handle>,
    /// Transient error text shown in the transport row.
    status: Option<String>,
    /// Current audio volume.
    volume: Volume,
    /// Whether audio is muted.
    muted: bool,
    /// Arrow-key seek step in seconds.
    seek_step_secs: f64,
    /// Whether widget-captured key presses are withheld from the router.
    exclusive_keys: bool,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("ui", &self.ui)
            .field("has_frame", &self.frame.is_some())
            .finish()
    }
}

/// Builds the window settings.
pub fn window_settings() -> window::Settings {
    window::Settings {
        size: iced::Size::new(WINDOW_DEFAULT_WIDTH as f32, WINDOW_DEFAULT_HEIGHT as f32),
        min_size: Some(iced::Size::new(
            MIN_WINDOW_WIDTH as f32,
            MIN_WINDOW_HEIGHT as f32,
        )),
        ..window::Settings::default()
    }
}

/// Entry point used by `main.rs` to launch the Iced application loop.
pub fn run(flags: Flags) -> iced::Result {
    use std::cell::RefCell;

    // Wrap flags in RefCell<Option<_>> to satisfy the Fn trait requirement
    // while only consuming flags once (iced 0.14 requires Fn, not FnOnce)
    let boot_state = RefCell::new(Some(flags));
    let boot = move || {
        let flags = boot_state
            .borrow_mut()
            .take()
            .expect("Boot function called more than once");
        App::new(flags)
    };

    iced::application(boot, App::update, App::view)
        .title(App::title)
        .theme(App::theme)
        .window(window_settings())
        .subscription(App::subscription)
        .run()
}

impl App {
    /// Initializes the application: builds the playlist, loads user
    /// preferences, and arms the player with the first entry.
    ///
    /// An unplayable first entry is not fatal — the window still opens,
    /// showing the failure in the status line, so the user can navigate to
    /// a working entry.
    fn new(flags: Flags) -> (Self, Task<Message>) {
        let (config, config_error) = match config::load() {
            Ok(config) => (config, None),
            Err(e) => {
                tracing::warn!("failed to load settings: {}", e);
                (config::Config::default(), Some(e))
            }
        };

        let playlist = Playlist::new(flags.entries)
            .expect("argument validation guarantees a non-empty playlist");
        let mut navigator = Navigator::new(playlist);
        let mut player = VideoPlayer::new();

        let (ui, status) = match navigator.select_initial(&mut player) {
            Ok(ui) => (ui, None),
            Err(e) => {
                tracing::warn!("initial load failed: {}", e);
                (navigator.ui_state(), Some(e.to_string()))
            }
        };

        let status = status.or(config_error.map(|e| e.to_string()));

        let app = App {
            navigator,
            player,
            ui,
            frame: None,
            status,
            volume: Volume::new(config.volume()),
            muted: false,
            seek_step_secs: config.seek_step(),
            exclusive_keys: config.exclusive_keys(),
        };

        (app, Task::none())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        update::update(self, message)
    }

    fn view(&self) -> Element<'_, Message> {
        view::view(self)
    }

    fn subscription(&self) -> Subscription<Message> {
        subscription::subscription(self)
    }

    fn title(&self) -> String {
        self.ui.title.clone()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Applies a taken (or refused) navigation transition's outcome.
    fn apply_transition(&mut self, result: Result<UiState>) {
        match result {
            Ok(ui) => {
                self.ui = ui;
                self.status = None;
            }
            Err(e) => {
                // Last-good state is kept; the cursor was already rolled
                // back by the navigator.
                tracing::warn!("navigation failed: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::VideoEntry;
    use crate::ui::transport;
    use iced::keyboard::{Key, Modifiers};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn create_test_video(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"fake video data").expect("failed to write test file");
        path
    }

    fn app_with_playlist(dir: &Path, names: &[(&str, &str)]) -> App {
        let entries = names
            .iter()
            .map(|(label, file)| VideoEntry::new(*label, create_test_video(dir, file)))
            .collect();
        let (app, _task) = App::new(Flags { entries });
        app
    }

    #[test]
    fn new_app_arms_first_entry() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let app = app_with_playlist(temp_dir.path(), &[("Intro", "a.mp4"), ("Main", "b.mp4")]);

        assert_eq!(app.ui.label, "Intro");
        assert!(!app.ui.previous_enabled);
        assert!(app.ui.next_enabled);
        assert_eq!(app.player.load_count(), 1);
        assert_eq!(app.player.rate(), 1.0);
        assert!(app.player.is_looping());
    }

    #[test]
    fn title_reflects_current_entry() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let app = app_with_playlist(temp_dir.path(), &[("Intro", "a.mp4"), ("Main", "b.mp4")]);
        assert_eq!(app.title(), "a.mp4 (1/2) - IcedReel");
    }

    #[test]
    fn transport_next_walks_the_playlist() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("Intro", "a.mp4"), ("Main", "b.mp4")]);

        let _ = app.update(Message::Transport(transport::Message::Next));
        assert_eq!(app.ui.label, "Main");
        assert!(app.ui.previous_enabled);
        assert!(!app.ui.next_enabled);
        assert_eq!(app.player.load_count(), 2);

        // Next at the last entry: no observable change
        let _ = app.update(Message::Transport(transport::Message::Next));
        assert_eq!(app.ui.label, "Main");
        assert_eq!(app.player.load_count(), 2);
    }

    #[test]
    fn previous_from_initial_state_is_load_free() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(
            temp_dir.path(),
            &[("A", "a.mp4"), ("B", "b.mp4"), ("C", "c.mp4")],
        );

        let _ = app.update(Message::Transport(transport::Message::Previous));
        assert_eq!(app.ui.label, "A");
        assert_eq!(app.player.load_count(), 1);
    }

    #[test]
    fn n_and_p_keys_navigate() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("A", "a.mp4"), ("B", "b.mp4")]);

        let _ = app.update(Message::KeyPressed {
            key: Key::Character("n".into()),
            modifiers: Modifiers::empty(),
            captured: false,
        });
        assert_eq!(app.ui.label, "B");

        let _ = app.update(Message::KeyPressed {
            key: Key::Character("P".into()),
            modifiers: Modifiers::empty(),
            captured: false,
        });
        assert_eq!(app.ui.label, "A");
    }

    #[test]
    fn space_toggles_rate() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("A", "a.mp4")]);
        assert_eq!(app.player.rate(), 1.0);

        let _ = app.update(Message::KeyPressed {
            key: Key::Named(iced::keyboard::key::Named::Space),
            modifiers: Modifiers::empty(),
            captured: false,
        });
        assert_eq!(app.player.rate(), 0.0);

        let _ = app.update(Message::KeyPressed {
            key: Key::Named(iced::keyboard::key::Named::Space),
            modifiers: Modifiers::empty(),
            captured: false,
        });
        assert_eq!(app.player.rate(), 1.0);
    }

    #[test]
    fn captured_keys_are_ignored_when_exclusive() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("A", "a.mp4"), ("B", "b.mp4")]);
        app.exclusive_keys = true;

        let _ = app.update(Message::KeyPressed {
            key: Key::Character("n".into()),
            modifiers: Modifiers::empty(),
            captured: true,
        });
        assert_eq!(app.ui.label, "A");

        // Pass-through default routes the same press
        app.exclusive_keys = false;
        let _ = app.update(Message::KeyPressed {
            key: Key::Character("n".into()),
            modifiers: Modifiers::empty(),
            captured: true,
        });
        assert_eq!(app.ui.label, "B");
    }

    #[test]
    fn unknown_keys_are_no_ops() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("A", "a.mp4")]);

        let _ = app.update(Message::KeyPressed {
            key: Key::Character("x".into()),
            modifiers: Modifiers::empty(),
            captured: false,
        });
        assert_eq!(app.ui.label, "A");
        assert_eq!(app.player.load_count(), 1);
    }

    #[test]
    fn engine_error_keeps_last_good_state() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("A", "a.mp4")]);

        let _ = app.update(Message::Playback(crate::player::PlaybackMessage::Error(
            "Decoder h264 not found".to_string(),
        )));

        assert_eq!(app.ui.label, "A");
        assert!(app.status.as_deref().is_some_and(|s| s.contains("H264")));
        // The loop stays armed; the engine may still recover frames
        assert!(app.player.is_looping());
    }

    #[test]
    fn navigating_to_missing_file_reports_and_stays() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let good = create_test_video(temp_dir.path(), "a.mp4");
        let entries = vec![
            VideoEntry::new("Good", good),
            VideoEntry::new("Gone", temp_dir.path().join("missing.mp4")),
        ];
        let (mut app, _task) = App::new(Flags { entries });

        let _ = app.update(Message::Transport(transport::Message::Next));
        assert_eq!(app.ui.label, "Good");
        assert!(app.status.is_some());
        assert_eq!(app.player.load_count(), 1);

        // Any absorbed or successful move drops the stale message
        let _ = app.update(Message::Transport(transport::Message::Previous));
        assert_eq!(app.ui.label, "Good");
        assert!(app.status.is_none());
        assert_eq!(app.player.load_count(), 1);
    }

    #[test]
    fn frame_updates_player_position() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("A", "a.mp4")]);

        let _ = app.update(Message::Playback(crate::player::PlaybackMessage::FrameReady {
            rgba_data: std::sync::Arc::new(vec![0u8; 4]),
            width: 1,
            height: 1,
            pts_secs: 2.5,
        }));

        assert!(app.frame.is_some());
        assert_eq!(app.player.position_secs(), 2.5);
    }

    #[test]
    fn loaded_records_duration() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut app = app_with_playlist(temp_dir.path(), &[("A", "a.mp4")]);

        let _ = app.update(Message::Playback(crate::player::PlaybackMessage::Loaded {
            duration_secs: 42.0,
            width: 640,
            height: 480,
        }));

        assert_eq!(app.player.duration_secs(), 42.0);
    }
}

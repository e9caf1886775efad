// SPDX-License-Identifier: MPL-2.0
//! Playback controller for the looping single-item session.
//!
//! `VideoPlayer` is the one long-lived handle to the playback engine. It is
//! created once and never recreated; re-arming the loop with a different
//! item only swaps the active path and bumps the session id (which restarts
//! the engine subscription), so the video surface survives navigation
//! without flicker. All engine communication is fire-and-forget over the
//! command sender; the controller never blocks on the engine.

use crate::error::{Result, VideoError};
use crate::player::subscription::DecoderCommandSender;
use crate::player::volume::Volume;
use crate::player::DecoderCommand;
use std::path::{Path, PathBuf};

/// Playback state machine.
///
/// Represents the controller's view of the session, ensuring type-safe
/// state transitions via pattern matching. The conceptual playback rate is
/// derived: 1.0 while playing (or seeking with the intent to resume),
/// 0.0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    /// No item armed.
    Stopped,

    /// Item is playing.
    Playing { position_secs: f64 },

    /// Item is paused at a specific position.
    Paused { position_secs: f64 },

    /// A seek is in flight.
    Seeking {
        target_secs: f64,
        resume_playing: bool,
    },
}

impl PlaybackState {
    /// Returns the current playback position in seconds.
    pub fn position(&self) -> f64 {
        match self {
            Self::Stopped => 0.0,
            Self::Playing { position_secs } => *position_secs,
            Self::Paused { position_secs } => *position_secs,
            Self::Seeking { target_secs, .. } => *target_secs,
        }
    }

    /// Returns true if the item is currently playing.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    /// Returns true if playing or a pending seek will resume playback.
    ///
    /// Chained seeks use this to preserve the resume intent across rapid
    /// key repeats.
    pub fn is_playing_or_will_resume(&self) -> bool {
        match self {
            Self::Playing { .. } => true,
            Self::Seeking { resume_playing, .. } => *resume_playing,
            _ => false,
        }
    }
}

/// Owns the single looping playback session.
pub struct VideoPlayer {
    /// Current playback state.
    state: PlaybackState,

    /// Path of the item the loop is armed with.
    active: Option<PathBuf>,

    /// Whether a loop is currently armed. Always true while an item is
    /// active; this player has no one-shot mode.
    looping: bool,

    /// Session counter. Incremented on every load; keys the playback
    /// subscription so a bump supersedes the previous engine tasks.
    /// Doubles as the load counter asserted by tests.
    session: u64,

    /// Duration of the active item, reported by the engine once opened.
    duration_secs: f64,

    /// Command sender into the engine (provided by the subscription).
    command_sender: Option<DecoderCommandSender>,
}

impl VideoPlayer {
    /// Creates the player with no item armed.
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            active: None,
            looping: false,
            session: 0,
            duration_secs: 0.0,
            command_sender: None,
        }
    }

    /// Arms the loop with a new item and starts playback.
    ///
    /// Any previously armed loop is fully disabled first, so exactly one
    /// loop exists afterwards and the old item can never double-output.
    /// Fails when the path is not a readable file; decode problems
    /// discovered later arrive asynchronously as engine error events.
    pub fn load_and_loop(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(VideoError::IoError(format!(
                "No such file: {}",
                path.display()
            ))
            .into());
        }

        self.teardown_loop();

        self.active = Some(path.to_path_buf());
        self.looping = true;
        self.session += 1;
        self.state = PlaybackState::Playing { position_secs: 0.0 };
        Ok(())
    }

    /// Disables the current loop and clears the session state.
    ///
    /// Called at the start of every `load_and_loop` and when the window
    /// closes. Safe to call with nothing armed.
    pub fn teardown_loop(&mut self) {
        if let Some(sender) = self.command_sender.take() {
            let _ = sender.send(DecoderCommand::Stop);
        }
        self.active = None;
        self.looping = false;
        self.duration_secs = 0.0;
        self.state = PlaybackState::Stopped;
    }

    /// Toggles between rate 1 (playing) and rate 0 (paused).
    ///
    /// A pending seek keeps its target; only the resume intent flips.
    pub fn toggle_play_pause(&mut self) {
        if self.active.is_none() {
            return;
        }

        match &self.state {
            PlaybackState::Playing { position_secs } => {
                let pos = *position_secs;
                self.state = PlaybackState::Paused { position_secs: pos };
                self.send(DecoderCommand::Pause);
            }
            PlaybackState::Paused { position_secs } => {
                let pos = *position_secs;
                self.state = PlaybackState::Playing { position_secs: pos };
                let resume_position = if pos > 0.0 { Some(pos) } else { None };
                self.send(DecoderCommand::Play {
                    resume_position_secs: resume_position,
                });
            }
            PlaybackState::Seeking {
                target_secs,
                resume_playing,
            } => {
                let target = *target_secs;
                let now_playing = !*resume_playing;
                self.state = PlaybackState::Seeking {
                    target_secs: target,
                    resume_playing: now_playing,
                };
                if now_playing {
                    self.send(DecoderCommand::Play {
                        resume_position_secs: None,
                    });
                } else {
                    self.send(DecoderCommand::Pause);
                }
            }
            PlaybackState::Stopped => {
                self.state = PlaybackState::Playing { position_secs: 0.0 };
                self.send(DecoderCommand::Play {
                    resume_position_secs: None,
                });
            }
        }
    }

    /// Requests a seek relative to the current position.
    ///
    /// No clamping happens here; the engine clamps the target against the
    /// actual media duration. One seek command per call, serialized by the
    /// engine's command channel.
    pub fn seek_relative(&mut self, delta_secs: f64) {
        if self.active.is_none() {
            return;
        }

        let target = self.state.position() + delta_secs;
        let resume = self.state.is_playing_or_will_resume();
        self.state = PlaybackState::Seeking {
            target_secs: target,
            resume_playing: resume,
        };
        self.send(DecoderCommand::Seek {
            target_secs: target,
        });
    }

    /// Attaches the command sender once the engine subscription is up and
    /// nudges the engine into the state the controller already committed to.
    pub fn engine_attached(&mut self, sender: DecoderCommandSender) {
        if self.state.is_playing_or_will_resume() {
            let _ = sender.send(DecoderCommand::Play {
                resume_position_secs: None,
            });
        }
        self.command_sender = Some(sender);
    }

    /// Records the duration reported by the engine for the active item.
    pub fn item_opened(&mut self, duration_secs: f64) {
        self.duration_secs = duration_secs;
    }

    /// Folds a displayed frame's timestamp into the state. Completes a
    /// pending seek: the first frame after a seek settles the state into
    /// Playing or Paused according to the resume intent.
    pub fn frame_displayed(&mut self, pts_secs: f64) {
        self.state = match &self.state {
            PlaybackState::Playing { .. } => PlaybackState::Playing {
                position_secs: pts_secs,
            },
            PlaybackState::Paused { .. } => PlaybackState::Paused {
                position_secs: pts_secs,
            },
            PlaybackState::Seeking { resume_playing, .. } => {
                if *resume_playing {
                    PlaybackState::Playing {
                        position_secs: pts_secs,
                    }
                } else {
                    PlaybackState::Paused {
                        position_secs: pts_secs,
                    }
                }
            }
            PlaybackState::Stopped => PlaybackState::Stopped,
        };
    }

    /// Resets the position when the engine wraps the loop.
    pub fn loop_wrapped(&mut self) {
        if let PlaybackState::Playing { .. } = self.state {
            self.state = PlaybackState::Playing { position_secs: 0.0 };
        }
    }

    /// Current playback state.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Conceptual playback rate: 1.0 playing, 0.0 paused/stopped.
    pub fn rate(&self) -> f32 {
        if self.state.is_playing_or_will_resume() {
            1.0
        } else {
            0.0
        }
    }

    /// Path of the item the loop is armed with.
    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    /// Whether a loop is armed.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Session id keying the playback subscription.
    pub fn session_id(&self) -> u64 {
        self.session
    }

    /// Number of `load_and_loop` calls that succeeded so far.
    pub fn load_count(&self) -> u64 {
        self.session
    }

    /// Duration of the active item in seconds (0.0 until reported).
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Current position in seconds.
    pub fn position_secs(&self) -> f64 {
        self.state.position()
    }

    /// Forwards a volume change to the audio output, if attached.
    pub fn set_volume(&self, volume: Volume) {
        if let Some(sender) = &self.command_sender {
            let _ = sender.set_volume(volume);
        }
    }

    /// Forwards a mute change to the audio output, if attached.
    pub fn set_muted(&self, muted: bool) {
        if let Some(sender) = &self.command_sender {
            let _ = sender.set_muted(muted);
        }
    }

    fn send(&self, command: DecoderCommand) {
        if let Some(sender) = &self.command_sender {
            let _ = sender.send(command);
        }
    }
}

impl Default for VideoPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn create_test_video(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"fake video data").expect("failed to write test file");
        path
    }

    #[test]
    fn new_player_is_stopped_with_nothing_armed() {
        let player = VideoPlayer::new();
        assert_eq!(*player.state(), PlaybackState::Stopped);
        assert_eq!(player.active_path(), None);
        assert!(!player.is_looping());
        assert_eq!(player.load_count(), 0);
        assert_eq!(player.rate(), 0.0);
    }

    #[test]
    fn load_and_loop_arms_and_starts_playing() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");

        assert_eq!(player.active_path(), Some(video.as_path()));
        assert!(player.is_looping());
        assert_eq!(player.load_count(), 1);
        assert_eq!(player.rate(), 1.0);
        assert_eq!(player.position_secs(), 0.0);
    }

    #[test]
    fn load_and_loop_rejects_missing_file() {
        let mut player = VideoPlayer::new();
        let result = player.load_and_loop(Path::new("/nonexistent/video.mp4"));
        assert!(result.is_err());
        assert_eq!(player.load_count(), 0);
        assert_eq!(*player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn reload_replaces_the_armed_item() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let first = create_test_video(temp_dir.path(), "a.mp4");
        let second = create_test_video(temp_dir.path(), "b.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&first).expect("load failed");
        player.load_and_loop(&second).expect("load failed");

        assert_eq!(player.active_path(), Some(second.as_path()));
        assert_eq!(player.load_count(), 2);
        assert!(player.is_looping());
    }

    #[test]
    fn toggle_play_pause_flips_rate() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");
        assert_eq!(player.rate(), 1.0);

        player.toggle_play_pause();
        assert_eq!(player.rate(), 0.0);

        player.toggle_play_pause();
        assert_eq!(player.rate(), 1.0);
    }

    #[test]
    fn double_toggle_restores_original_rate() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");

        let original = player.rate();
        player.toggle_play_pause();
        player.toggle_play_pause();
        assert_eq!(player.rate(), original);
    }

    #[test]
    fn toggle_without_item_is_a_no_op() {
        let mut player = VideoPlayer::new();
        player.toggle_play_pause();
        assert_eq!(*player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn seek_relative_enters_seeking_with_resume_intent() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");
        player.frame_displayed(30.0);

        player.seek_relative(10.0);
        assert_eq!(
            *player.state(),
            PlaybackState::Seeking {
                target_secs: 40.0,
                resume_playing: true,
            }
        );
        // Still conceptually playing through the seek
        assert_eq!(player.rate(), 1.0);
    }

    #[test]
    fn seek_while_paused_stays_paused_after_frame() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");
        player.frame_displayed(5.0);
        player.toggle_play_pause();

        player.seek_relative(-10.0);
        assert_eq!(player.rate(), 0.0);

        player.frame_displayed(0.0);
        assert_eq!(
            *player.state(),
            PlaybackState::Paused { position_secs: 0.0 }
        );
    }

    #[test]
    fn chained_seeks_preserve_resume_intent() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");
        player.frame_displayed(20.0);

        player.seek_relative(10.0);
        player.seek_relative(10.0);
        assert_eq!(
            *player.state(),
            PlaybackState::Seeking {
                target_secs: 40.0,
                resume_playing: true,
            }
        );
    }

    #[test]
    fn seek_without_item_is_a_no_op() {
        let mut player = VideoPlayer::new();
        player.seek_relative(10.0);
        assert_eq!(*player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn teardown_clears_session_state() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");
        player.item_opened(120.0);

        player.teardown_loop();
        assert_eq!(player.active_path(), None);
        assert!(!player.is_looping());
        assert_eq!(player.duration_secs(), 0.0);
        assert_eq!(*player.state(), PlaybackState::Stopped);
        // The load counter survives teardown; it tracks history, not state.
        assert_eq!(player.load_count(), 1);
    }

    #[test]
    fn frame_updates_position_while_playing() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");

        player.frame_displayed(1.25);
        assert_eq!(player.position_secs(), 1.25);
        assert!(player.state().is_playing());
    }

    #[test]
    fn loop_wrap_resets_position() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let video = create_test_video(temp_dir.path(), "a.mp4");

        let mut player = VideoPlayer::new();
        player.load_and_loop(&video).expect("load failed");
        player.frame_displayed(9.9);

        player.loop_wrapped();
        assert_eq!(player.position_secs(), 0.0);
        assert!(player.state().is_playing());
    }
}

// SPDX-License-Identifier: MPL-2.0
//! Iced subscription for video playback events.
//!
//! Connects the async decoder tasks to the UI event loop, delivering
//! frames and playback events as messages. Each loaded item gets its own
//! subscription keyed by the player's session id; re-arming the loop with
//! a different item means a new session id, which tears this subscription
//! (and its decoder tasks) down and starts a fresh one. That supersession
//! is what guarantees a single active loop — the old tasks observe their
//! closed channels and stop before the new item produces output.

use super::audio::{AudioCommand, AudioDecoder, AudioEvent, AudioOutput};
use super::decoder::{AsyncDecoder, DecoderCommand, DecoderEvent};
use super::volume::Volume;
use iced::futures::SinkExt;
use iced::stream;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Subscription ID for video playback.
/// Each playback session gets a unique ID to ensure subscriptions are recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackSessionId(pub u64);

/// Audio-only adjustments that do not touch the decode loops.
#[derive(Debug, Clone)]
enum AudioControl {
    SetVolume(Volume),
    SetMuted(bool),
}

/// Handle for sending commands to the decoder tasks from the UI.
///
/// Cloneable; stored in the `VideoPlayer` once the subscription reports
/// `Started`. All sends are fire-and-forget.
#[derive(Clone)]
pub struct DecoderCommandSender {
    video_tx: mpsc::UnboundedSender<DecoderCommand>,
    audio_ctrl_tx: Option<mpsc::UnboundedSender<AudioControl>>,
}

impl DecoderCommandSender {
    /// Sends a playback command. The subscription forwards it to the audio
    /// decoder and output internally.
    pub fn send(&self, command: DecoderCommand) -> Result<(), String> {
        self.video_tx
            .send(command)
            .map_err(|_| "Video decoder not running".to_string())
    }

    /// Sets the audio volume.
    pub fn set_volume(&self, volume: Volume) -> Result<(), String> {
        if let Some(ref tx) = self.audio_ctrl_tx {
            tx.send(AudioControl::SetVolume(volume))
                .map_err(|_| "Audio output not running".to_string())?;
        }
        Ok(())
    }

    /// Sets the mute state.
    pub fn set_muted(&self, muted: bool) -> Result<(), String> {
        if let Some(ref tx) = self.audio_ctrl_tx {
            tx.send(AudioControl::SetMuted(muted))
                .map_err(|_| "Audio output not running".to_string())?;
        }
        Ok(())
    }

    /// Returns true if audio is available.
    pub fn has_audio(&self) -> bool {
        self.audio_ctrl_tx.is_some()
    }
}

impl std::fmt::Debug for DecoderCommandSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderCommandSender")
            .field("has_audio", &self.audio_ctrl_tx.is_some())
            .finish()
    }
}

/// Messages emitted by the video playback subscription.
#[derive(Debug, Clone)]
pub enum PlaybackMessage {
    /// Subscription started, provides command sender for pause/play/seek.
    Started(DecoderCommandSender),

    /// The item was opened; reports duration and dimensions.
    Loaded {
        duration_secs: f64,
        width: u32,
        height: u32,
    },

    /// A new frame is ready for display.
    FrameReady {
        /// RGBA pixel data.
        rgba_data: Arc<Vec<u8>>,
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
        /// Presentation timestamp in seconds.
        pts_secs: f64,
    },

    /// The loop wrapped back to the start of the item.
    Looped,

    /// An error occurred.
    Error(String),
}

/// State of the video playback subscription.
enum State {
    /// Waiting to start.
    Idle,

    /// Decoder tasks are active.
    Decoding {
        video_decoder: AsyncDecoder,
        audio_decoder: Option<AudioDecoder>,
        audio_output: Option<AudioOutput>,
        external_cmd_rx: mpsc::UnboundedReceiver<DecoderCommand>,
        audio_ctrl_rx: Option<mpsc::UnboundedReceiver<AudioControl>>,
    },
}

/// Creates a video playback subscription for one looping item.
///
/// The subscription manages the decoder lifecycle and translates decoder
/// events into Iced messages. It first emits `Started` with a
/// `DecoderCommandSender` for pause/play/seek control. Audio playback is
/// integrated automatically when the item has an audio track; items
/// without one simply play silently.
pub fn video_playback(
    video_path: PathBuf,
    session_id: u64,
    initial_volume: Volume,
    initial_muted: bool,
) -> iced::Subscription<PlaybackMessage> {
    iced::Subscription::run_with_id(
        PlaybackSessionId(session_id),
        stream::channel(100, move |mut output| async move {
            let mut state = State::Idle;

            loop {
                match &mut state {
                    State::Idle => {
                        let (external_cmd_tx, external_cmd_rx) = mpsc::unbounded_channel();
                        let (audio_ctrl_tx, audio_ctrl_rx) = mpsc::unbounded_channel();

                        let video_decoder = match AsyncDecoder::new(&video_path) {
                            Ok(decoder) => decoder,
                            Err(e) => {
                                let _ = output.send(PlaybackMessage::Error(e.to_string())).await;
                                break;
                            }
                        };

                        // Audio output first: the decoder resamples to its
                        // device format. Both are optional; playback works
                        // without sound.
                        let audio_output = match AudioOutput::new(initial_volume) {
                            Ok(out) => {
                                out.set_muted(initial_muted);
                                Some(out)
                            }
                            Err(e) => {
                                tracing::warn!("audio output unavailable: {}", e);
                                None
                            }
                        };

                        let audio_decoder = match &audio_output {
                            Some(out) => match AudioDecoder::new(&video_path, out.config()) {
                                Ok(Some(decoder)) => Some(decoder),
                                Ok(None) => None, // no audio stream - fine
                                Err(e) => {
                                    tracing::warn!("audio decoder failed: {}", e);
                                    None
                                }
                            },
                            None => None,
                        };

                        let has_audio = audio_decoder.is_some();
                        let cmd_sender = DecoderCommandSender {
                            video_tx: external_cmd_tx,
                            audio_ctrl_tx: if has_audio { Some(audio_ctrl_tx) } else { None },
                        };
                        let _ = output.send(PlaybackMessage::Started(cmd_sender)).await;

                        state = State::Decoding {
                            video_decoder,
                            audio_decoder,
                            audio_output,
                            external_cmd_rx,
                            audio_ctrl_rx: if has_audio { Some(audio_ctrl_rx) } else { None },
                        };
                    }

                    State::Decoding {
                        video_decoder,
                        audio_decoder,
                        audio_output,
                        external_cmd_rx,
                        audio_ctrl_rx,
                    } => {
                        tokio::select! {
                            // Commands from the UI
                            cmd = external_cmd_rx.recv() => {
                                if let Some(command) = cmd {
                                    if let Some(ref audio_out) = audio_output {
                                        match &command {
                                            DecoderCommand::Pause => audio_out.pause(),
                                            DecoderCommand::Play { .. } => audio_out.resume(),
                                            DecoderCommand::Stop => audio_out.stop(),
                                            // Drop stale audio on seek
                                            DecoderCommand::Seek { .. } => audio_out.clear_buffer(),
                                        }
                                    }

                                    if let Some(ref audio_dec) = audio_decoder {
                                        let audio_cmd = match &command {
                                            DecoderCommand::Play { resume_position_secs } => {
                                                AudioCommand::Play {
                                                    resume_position_secs: *resume_position_secs,
                                                }
                                            }
                                            DecoderCommand::Pause => AudioCommand::Pause,
                                            DecoderCommand::Seek { target_secs } => {
                                                AudioCommand::Seek { target_secs: *target_secs }
                                            }
                                            DecoderCommand::Stop => AudioCommand::Stop,
                                        };
                                        let _ = audio_dec.send_command(audio_cmd);
                                    }

                                    if let Err(e) = video_decoder.send_command(command) {
                                        let _ = output.send(PlaybackMessage::Error(e.to_string())).await;
                                    }
                                }
                            }

                            // Volume/mute adjustments
                            Some(ctrl) = async {
                                if let Some(ref mut rx) = audio_ctrl_rx {
                                    rx.recv().await
                                } else {
                                    std::future::pending::<Option<AudioControl>>().await
                                }
                            } => {
                                if let Some(ref audio_out) = audio_output {
                                    match ctrl {
                                        AudioControl::SetVolume(volume) => audio_out.set_volume(volume),
                                        AudioControl::SetMuted(muted) => audio_out.set_muted(muted),
                                    }
                                }
                            }

                            // Events from the video decoder
                            event = video_decoder.recv_event() => {
                                if let Some(event) = event {
                                    let message = match event {
                                        DecoderEvent::Loaded { duration_secs, width, height } => {
                                            PlaybackMessage::Loaded { duration_secs, width, height }
                                        }
                                        DecoderEvent::FrameReady(frame) => PlaybackMessage::FrameReady {
                                            rgba_data: frame.rgba_data,
                                            width: frame.width,
                                            height: frame.height,
                                            pts_secs: frame.pts_secs,
                                        },
                                        DecoderEvent::Looped => PlaybackMessage::Looped,
                                        DecoderEvent::Error(msg) => PlaybackMessage::Error(msg),
                                    };

                                    let _ = output.send(message).await;
                                } else {
                                    // Decoder closed, exit loop
                                    break;
                                }
                            }

                            // Events from the audio decoder
                            Some(audio_event) = async {
                                if let Some(ref mut audio_dec) = audio_decoder {
                                    audio_dec.recv_event().await
                                } else {
                                    std::future::pending::<Option<AudioEvent>>().await
                                }
                            } => {
                                match audio_event {
                                    AudioEvent::BufferReady(audio) => {
                                        if let Some(ref audio_out) = audio_output {
                                            audio_out.play(&audio.samples);
                                        }
                                    }
                                    AudioEvent::Error(msg) => {
                                        tracing::warn!("audio error: {}", msg);
                                    }
                                }
                            }
                        }
                    }
                }
            }

            // Keep subscription alive but idle
            std::future::pending::<()>().await;
        }),
    )
}

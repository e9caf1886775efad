// SPDX-License-Identifier: MPL-2.0
//! Video playback engine for IcedReel.
//!
//! Playback of a single looping item: FFmpeg decoding on async Tokio
//! tasks, cpal audio output, and a controller (`VideoPlayer`) that the
//! rest of the application talks to. The engine is driven exclusively by
//! fire-and-forget commands; frames and errors come back through an Iced
//! subscription.

pub mod audio;
mod decoder;
mod session;
pub mod subscription;
pub mod volume;

pub use decoder::{init_ffmpeg, AsyncDecoder, DecodedFrame, DecoderCommand, DecoderEvent};
pub use session::{PlaybackState, VideoPlayer};
pub use subscription::{video_playback, DecoderCommandSender, PlaybackMessage, PlaybackSessionId};
pub use volume::Volume;

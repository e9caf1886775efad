// SPDX-License-Identifier: MPL-2.0
//! Async video frame decoder using FFmpeg.
//!
//! The decoder task owns exactly one media item and repeats it
//! indefinitely: when the packet stream runs dry it seeks back to the
//! start, flushes, and keeps decoding. Superseding the loop with a new
//! item is done by dropping the task (closing its command channel) and
//! spawning a fresh decoder — never by mutating a running one.

use crate::error::{Error, Result};
use std::path::Path;
use std::sync::{Arc, Once};
use tokio::sync::mpsc;

/// Static flag to ensure FFmpeg is initialized only once.
static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg with appropriate log level.
///
/// Safe to call multiple times; initialization happens once. The FFmpeg
/// log level is set to ERROR to suppress container warnings.
pub fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(Error::Io(format!("FFmpeg initialization failed: {e}")));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

/// Represents a decoded video frame ready for display.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// RGBA pixel data (width × height × 4 bytes).
    pub rgba_data: Arc<Vec<u8>>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

impl DecodedFrame {
    /// Returns the total size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.rgba_data.len()
    }
}

/// Commands sent to the decoder task.
#[derive(Debug, Clone)]
pub enum DecoderCommand {
    /// Start or resume decoding.
    Play {
        /// Position to resume from; `None` plays from the current position.
        resume_position_secs: Option<f64>,
    },

    /// Pause decoding (stop sending frames).
    Pause,

    /// Seek to a specific timestamp. The target is clamped to the media
    /// duration here, not by the caller.
    Seek { target_secs: f64 },

    /// Stop decoding and clean up resources.
    Stop,
}

/// Events sent from the decoder to the UI.
#[derive(Debug, Clone)]
pub enum DecoderEvent {
    /// The item was opened; reports its duration and dimensions.
    Loaded {
        duration_secs: f64,
        width: u32,
        height: u32,
    },

    /// A new frame is ready for display.
    FrameReady(DecodedFrame),

    /// The loop wrapped back to the start of the item.
    Looped,

    /// An error occurred during decoding.
    Error(String),
}

/// Async video decoder that runs in a Tokio blocking task.
pub struct AsyncDecoder {
    /// Channel for sending commands to the decoder task.
    command_tx: mpsc::UnboundedSender<DecoderCommand>,

    /// Channel for receiving events from the decoder task.
    /// Bounded to prevent memory accumulation during rapid seeks.
    event_rx: mpsc::Receiver<DecoderEvent>,
}

impl AsyncDecoder {
    /// Creates a new looping decoder for the given video file.
    ///
    /// Spawns a Tokio blocking task that handles decoding in the
    /// background and returns the handle with channels for communication.
    pub fn new<P: AsRef<Path>>(video_path: P) -> Result<Self> {
        let path = video_path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(Error::Io(format!("Video file not found: {:?}", path)));
        }

        // Commands: unbounded (UI needs to send without blocking)
        // Events: bounded so the decoder backs off while the UI catches up
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(2);

        // FFmpeg types are not Send, so the whole loop lives on one
        // blocking thread.
        tokio::task::spawn_blocking(move || {
            if let Err(e) = Self::decoder_loop_blocking(path, command_rx, event_tx) {
                tracing::warn!("decoder task failed: {}", e);
            }
        });

        Ok(Self {
            command_tx,
            event_rx,
        })
    }

    /// Sends a command to the decoder task.
    pub fn send_command(&self, command: DecoderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::Io("Decoder task is not running".into()))
    }

    /// Receives the next event from the decoder (non-blocking).
    pub fn try_recv_event(&mut self) -> Option<DecoderEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receives the next event from the decoder (blocking).
    ///
    /// Returns `None` if the decoder task has terminated.
    pub async fn recv_event(&mut self) -> Option<DecoderEvent> {
        self.event_rx.recv().await
    }

    /// Main decoder loop running in a blocking thread.
    ///
    /// Maintains playback state, responds to commands, and re-arms itself
    /// at end of stream so the single item repeats until superseded.
    fn decoder_loop_blocking(
        video_path: std::path::PathBuf,
        mut command_rx: mpsc::UnboundedReceiver<DecoderCommand>,
        event_tx: mpsc::Sender<DecoderEvent>,
    ) -> Result<()> {
        init_ffmpeg()?;

        let mut ictx = ffmpeg_next::format::input(&video_path)
            .map_err(|e| Error::Io(format!("Failed to open video: {}", e)))?;

        let input = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| Error::Io("No video stream found".to_string()))?;
        let video_stream_index = input.index();

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
                .map_err(|e| Error::Io(format!("Failed to create codec context: {}", e)))?;
        let mut decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| Error::Io(format!("Failed to create video decoder: {}", e)))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(Error::Io(format!(
                "Invalid video dimensions: {width}x{height} (possibly unsupported format)"
            )));
        }

        // Setup scaler to convert to RGBA
        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGBA,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| Error::Io(format!("Failed to create scaler: {}", e)))?;

        // Extract time base for PTS calculation
        let time_base = input.time_base();
        let time_base_f64 = f64::from(time_base.numerator()) / f64::from(time_base.denominator());

        let duration_secs = if input.duration() > 0 {
            input.duration() as f64 * time_base_f64
        } else if ictx.duration() > 0 {
            ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        let _ = event_tx.blocking_send(DecoderEvent::Loaded {
            duration_secs,
            width,
            height,
        });

        // Playback state
        let mut is_playing = false;
        let mut playback_start_time: Option<std::time::Instant> = None;
        let mut first_pts: Option<f64> = None;
        let mut current_pts_secs: f64 = 0.0;
        let mut decode_single_frame = false; // decode one frame after seek while paused

        loop {
            // Check for commands (non-blocking)
            match command_rx.try_recv() {
                Ok(DecoderCommand::Play {
                    resume_position_secs,
                }) => {
                    let resume_at = resume_position_secs.unwrap_or(current_pts_secs);
                    if !is_playing && resume_at > 0.0 {
                        // FFmpeg seek uses AV_TIME_BASE (microseconds);
                        // RangeTo allows seeking backward to a keyframe.
                        let timestamp = (resume_at * 1_000_000.0) as i64;
                        if let Err(e) = ictx.seek(timestamp, ..timestamp) {
                            let _ = event_tx.blocking_send(DecoderEvent::Error(format!(
                                "Resume seek failed: {}",
                                e
                            )));
                        } else {
                            decoder.flush();
                        }
                    }
                    is_playing = true;
                    playback_start_time = Some(std::time::Instant::now());
                    first_pts = None;
                }
                Ok(DecoderCommand::Pause) => {
                    // Keep current_pts_secs for resume
                    is_playing = false;
                    playback_start_time = None;
                    first_pts = None;
                }
                Ok(DecoderCommand::Seek { target_secs }) => {
                    // The caller seeks relative without clamping; bounds are
                    // applied here, against the actual media duration.
                    let clamped = if duration_secs > 0.0 {
                        target_secs.clamp(0.0, duration_secs)
                    } else {
                        target_secs.max(0.0)
                    };
                    let timestamp = (clamped * 1_000_000.0) as i64;
                    if let Err(e) = ictx.seek(timestamp, ..timestamp) {
                        let _ = event_tx
                            .blocking_send(DecoderEvent::Error(format!("Seek failed: {}", e)));
                    } else {
                        decoder.flush();
                        current_pts_secs = clamped;
                        playback_start_time = Some(std::time::Instant::now());
                        first_pts = None;
                        if !is_playing {
                            decode_single_frame = true;
                        }
                    }
                }
                Ok(DecoderCommand::Stop) => {
                    break;
                }
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    // Command channel closed: the loop was superseded
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            // If not playing and no single frame needed, yield to avoid busy-waiting
            if !is_playing && !decode_single_frame {
                std::thread::sleep(std::time::Duration::from_millis(10));
                continue;
            }

            // Decode next frame
            let mut frame_decoded = false;
            for (stream, packet) in ictx.packets() {
                if stream.index() != video_stream_index {
                    continue;
                }

                if let Err(e) = decoder.send_packet(&packet) {
                    let _ = event_tx
                        .blocking_send(DecoderEvent::Error(format!("Packet send failed: {}", e)));
                    continue;
                }

                let mut decoded_frame = ffmpeg_next::frame::Video::empty();
                if decoder.receive_frame(&mut decoded_frame).is_ok() {
                    let mut rgba_frame = ffmpeg_next::frame::Video::empty();
                    if let Err(e) = scaler.run(&decoded_frame, &mut rgba_frame) {
                        let _ = event_tx
                            .blocking_send(DecoderEvent::Error(format!("Scaling failed: {}", e)));
                        continue;
                    }

                    let rgba_data = Self::extract_rgba_data(&rgba_frame);

                    let pts_secs = if let Some(pts) = decoded_frame.timestamp() {
                        pts as f64 * time_base_f64
                    } else {
                        0.0
                    };

                    // Frame pacing: wait until the frame should be displayed
                    if let Some(start_time) = playback_start_time {
                        if first_pts.is_none() {
                            first_pts = Some(pts_secs);
                        }

                        if let Some(first) = first_pts {
                            let frame_delay = pts_secs - first;
                            let target_time =
                                start_time + std::time::Duration::from_secs_f64(frame_delay);
                            let now = std::time::Instant::now();

                            if target_time > now {
                                std::thread::sleep(target_time - now);
                            }
                        }
                    }

                    current_pts_secs = pts_secs;

                    let decoded = DecodedFrame {
                        rgba_data: Arc::new(rgba_data),
                        width,
                        height,
                        pts_secs,
                    };

                    if event_tx
                        .blocking_send(DecoderEvent::FrameReady(decoded))
                        .is_err()
                    {
                        // Event channel closed
                        break;
                    }

                    frame_decoded = true;
                    decode_single_frame = false;
                    break;
                }
            }

            // End of stream: re-arm the loop on the same item instead of
            // stopping. The item repeats until this task is superseded.
            if !frame_decoded {
                if let Err(e) = ictx.seek(0, ..0) {
                    let _ = event_tx
                        .blocking_send(DecoderEvent::Error(format!("Loop restart failed: {}", e)));
                    break;
                }
                decoder.flush();
                current_pts_secs = 0.0;
                first_pts = None;
                if is_playing {
                    playback_start_time = Some(std::time::Instant::now());
                }
                decode_single_frame = !is_playing;
                if event_tx.blocking_send(DecoderEvent::Looped).is_err() {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Extracts RGBA data from a decoded frame, handling stride correctly.
    fn extract_rgba_data(frame: &ffmpeg_next::frame::Video) -> Vec<u8> {
        let width = frame.width();
        let height = frame.height();
        let data = frame.data(0);
        let stride = frame.stride(0);

        let mut rgba_bytes = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let row_start = (y * stride as u32) as usize;
            let row_end = row_start + (width * 4) as usize;
            rgba_bytes.extend_from_slice(&data[row_start..row_end]);
        }

        rgba_bytes
    }
}

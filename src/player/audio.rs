// SPDX-License-Identifier: MPL-2.0
//! Audio extraction and playback for video files.
//!
//! Decoding uses FFmpeg with resampling to the output device format;
//! playback goes through cpal. Videos without an audio stream simply get
//! no audio path. Like the video decoder, the audio task loops its single
//! item at end of stream.

use crate::error::{Error, Result};
use crate::player::volume::Volume;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Maximum number of audio frames to skip during precise seeking.
/// Prevents infinite loops on corrupted files or seeks beyond EOF.
const MAX_SEEK_FRAMES: u32 = 1000;

/// Audio look-ahead buffer time in seconds.
/// Samples are queued ~200ms before they need to play for smooth output.
const AUDIO_LOOKAHEAD_SECS: f64 = 0.2;

/// Interleaved f32 samples normalized to [-1.0, 1.0].
pub type AudioSamples = Arc<Vec<f32>>;

/// Represents a decoded audio buffer ready for playback.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved audio samples (f32, normalized to [-1.0, 1.0]).
    pub samples: AudioSamples,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

/// Commands sent to the audio decoder.
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Start or resume decoding.
    Play { resume_position_secs: Option<f64> },

    /// Pause decoding.
    Pause,

    /// Seek to a specific timestamp.
    Seek { target_secs: f64 },

    /// Stop decoding and clean up.
    Stop,
}

/// Events sent from the audio decoder.
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// A decoded audio buffer is ready.
    BufferReady(DecodedAudio),

    /// An error occurred during decoding.
    Error(String),
}

/// Output device configuration the decoder must resample to.
#[derive(Debug, Clone, Copy)]
pub struct AudioOutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Async audio decoder that extracts and decodes audio from video files.
///
/// Runs in a separate blocking thread since FFmpeg operations are not `Send`.
pub struct AudioDecoder {
    command_tx: mpsc::UnboundedSender<AudioCommand>,
    event_rx: mpsc::Receiver<AudioEvent>,
}

impl AudioDecoder {
    /// Creates a new audio decoder for the given video file.
    ///
    /// Returns `None` if the file has no audio stream. The decoder
    /// resamples to `output_config` so samples can be handed to the
    /// output device unchanged.
    pub fn new<P: AsRef<Path>>(
        video_path: P,
        output_config: AudioOutputConfig,
    ) -> Result<Option<Self>> {
        let path = video_path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(Error::Io(format!(
                "Video file not found: {}",
                path.display()
            )));
        }

        if !Self::has_audio_stream(&path)? {
            return Ok(None);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(4);

        tokio::task::spawn_blocking(move || {
            if let Err(e) = Self::decoder_loop(path, command_rx, event_tx, output_config) {
                tracing::warn!("audio decoder task failed: {}", e);
            }
        });

        Ok(Some(Self {
            command_tx,
            event_rx,
        }))
    }

    /// Checks if the video file has an audio stream.
    fn has_audio_stream(path: &Path) -> Result<bool> {
        super::decoder::init_ffmpeg()?;

        let ictx = ffmpeg_next::format::input(path)
            .map_err(|e| Error::Io(format!("Failed to open file: {e}")))?;

        Ok(ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .is_some())
    }

    /// Sends a command to the decoder task.
    pub fn send_command(&self, command: AudioCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::Io("Audio decoder task is not running".into()))
    }

    /// Receives the next event from the decoder (blocking).
    pub async fn recv_event(&mut self) -> Option<AudioEvent> {
        self.event_rx.recv().await
    }

    /// Main audio decoder loop running in a blocking thread.
    fn decoder_loop(
        video_path: std::path::PathBuf,
        mut command_rx: mpsc::UnboundedReceiver<AudioCommand>,
        event_tx: mpsc::Sender<AudioEvent>,
        output_config: AudioOutputConfig,
    ) -> Result<()> {
        super::decoder::init_ffmpeg()?;

        let mut ictx = ffmpeg_next::format::input(&video_path)
            .map_err(|e| Error::Io(format!("Failed to open video: {e}")))?;

        let input = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| Error::Io("No audio stream found".to_string()))?;
        let audio_stream_index = input.index();

        let time_base = input.time_base();
        let time_base_f64 = f64::from(time_base.numerator()) / f64::from(time_base.denominator());

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
                .map_err(|e| Error::Io(format!("Failed to create codec context: {e}")))?;
        let mut decoder = context_decoder
            .decoder()
            .audio()
            .map_err(|e| Error::Io(format!("Failed to create audio decoder: {e}")))?;

        // Resample to f32 interleaved at the device rate and channel count.
        // Without this, audio plays at the wrong speed or channel layout.
        let output_channel_layout = match output_config.channels {
            1 => ffmpeg_next::ChannelLayout::MONO,
            _ => ffmpeg_next::ChannelLayout::STEREO, // downmix anything else to stereo
        };

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Packed),
            output_channel_layout,
            output_config.sample_rate,
        )
        .map_err(|e| Error::Io(format!("Failed to create resampler: {e}")))?;

        let output_sample_rate = output_config.sample_rate;
        let output_channels = output_config.channels.min(2);

        // Playback state
        let mut is_playing = false;
        let mut playback_start_time: Option<std::time::Instant> = None;
        let mut first_pts: Option<f64> = None;
        let mut seek_target_secs: Option<f64> = None;
        let mut seek_frames_skipped: u32 = 0;

        loop {
            match command_rx.try_recv() {
                Ok(AudioCommand::Play {
                    resume_position_secs,
                }) => {
                    if let Some(resume_at) = resume_position_secs {
                        let timestamp = (resume_at * 1_000_000.0) as i64;
                        if ictx.seek(timestamp, ..timestamp).is_ok() {
                            decoder.flush();
                            seek_target_secs = Some(resume_at);
                            seek_frames_skipped = 0;
                        }
                    }
                    is_playing = true;
                    playback_start_time = Some(std::time::Instant::now());
                    first_pts = None;
                }
                Ok(AudioCommand::Pause) => {
                    is_playing = false;
                    playback_start_time = None;
                    first_pts = None;
                    seek_target_secs = None;
                }
                Ok(AudioCommand::Seek { target_secs }) => {
                    let target = target_secs.max(0.0);
                    let timestamp = (target * 1_000_000.0) as i64;
                    if let Err(e) = ictx.seek(timestamp, ..timestamp) {
                        let _ = event_tx
                            .blocking_send(AudioEvent::Error(format!("Audio seek failed: {e}")));
                        seek_target_secs = None;
                    } else {
                        decoder.flush();
                        playback_start_time = Some(std::time::Instant::now());
                        first_pts = None;
                        seek_target_secs = Some(target);
                        seek_frames_skipped = 0;
                    }
                }
                Ok(AudioCommand::Stop) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => break,
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            if !is_playing {
                std::thread::sleep(std::time::Duration::from_millis(10));
                continue;
            }

            // Decode next audio frame
            let mut frame_decoded = false;
            for (stream, packet) in ictx.packets() {
                if stream.index() != audio_stream_index {
                    continue;
                }

                if let Err(e) = decoder.send_packet(&packet) {
                    let _ =
                        event_tx.blocking_send(AudioEvent::Error(format!("Audio packet failed: {e}")));
                    continue;
                }

                let mut decoded_frame = ffmpeg_next::frame::Audio::empty();
                if decoder.receive_frame(&mut decoded_frame).is_ok() {
                    let mut output_audio = ffmpeg_next::frame::Audio::empty();
                    if let Err(e) = resampler.run(&decoded_frame, &mut output_audio) {
                        let _ = event_tx
                            .blocking_send(AudioEvent::Error(format!("Resampling failed: {e}")));
                        continue;
                    }

                    let samples = Self::extract_samples(&output_audio, output_channels);

                    let pts_secs = if let Some(pts) = decoded_frame.timestamp() {
                        pts as f64 * time_base_f64
                    } else {
                        0.0
                    };

                    let frame_duration = samples.len() as f64
                        / (f64::from(output_sample_rate) * f64::from(output_channels));

                    // Precise seeking: skip audio frames before the target PTS
                    if let Some(target) = seek_target_secs {
                        let frame_end_pts = pts_secs + frame_duration;
                        if frame_end_pts < target {
                            seek_frames_skipped += 1;
                            if seek_frames_skipped >= MAX_SEEK_FRAMES {
                                let _ = event_tx.blocking_send(AudioEvent::Error(
                                    "Audio seek timeout: target may be beyond end of file"
                                        .to_string(),
                                ));
                                seek_target_secs = None;
                            }
                            continue;
                        }
                        first_pts = Some(target);
                        seek_target_secs = None;
                    }

                    // Frame pacing with lookahead
                    if let Some(start_time) = playback_start_time {
                        if first_pts.is_none() {
                            first_pts = Some(pts_secs);
                        }
                        if let Some(first) = first_pts {
                            let frame_delay = (pts_secs - first) - AUDIO_LOOKAHEAD_SECS;
                            if frame_delay > 0.0 {
                                let target_time =
                                    start_time + std::time::Duration::from_secs_f64(frame_delay);
                                let now = std::time::Instant::now();
                                if target_time > now {
                                    std::thread::sleep(target_time - now);
                                }
                            }
                        }
                    }

                    let audio = DecodedAudio {
                        samples: Arc::new(samples),
                        pts_secs,
                    };

                    if event_tx.blocking_send(AudioEvent::BufferReady(audio)).is_err() {
                        break;
                    }

                    frame_decoded = true;
                    break;
                }
            }

            // End of stream: wrap to the start, mirroring the video loop.
            if !frame_decoded {
                if ictx.seek(0, ..0).is_err() {
                    break;
                }
                decoder.flush();
                playback_start_time = Some(std::time::Instant::now());
                first_pts = None;
            }
        }

        Ok(())
    }

    /// Extracts f32 samples from a resampled audio frame.
    fn extract_samples(frame: &ffmpeg_next::frame::Audio, channels: u16) -> Vec<f32> {
        let data = frame.data(0);
        let sample_count = frame.samples() * channels as usize;

        let mut samples = Vec::with_capacity(sample_count);
        for i in 0..sample_count {
            let offset = i * 4; // f32 = 4 bytes
            if offset + 4 <= data.len() {
                let bytes = [
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ];
                samples.push(f32::from_le_bytes(bytes));
            }
        }

        samples
    }
}

/// Shared state between the audio callback thread and the main thread.
struct SharedState {
    /// Current volume (stored as u32 bits of f32 for atomic access).
    volume_bits: AtomicU32,

    /// Mute state.
    muted: AtomicBool,

    /// Pause state.
    paused: AtomicBool,
}

impl SharedState {
    fn new(initial_volume: f32) -> Self {
        Self {
            volume_bits: AtomicU32::new(initial_volume.to_bits()),
            muted: AtomicBool::new(false),
            paused: AtomicBool::new(false),
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    fn set_volume(&self, volume: f32) {
        self.volume_bits.store(volume.to_bits(), Ordering::Relaxed);
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }
}

/// Audio output stream manager.
///
/// Plays queued samples through the system's default audio device.
pub struct AudioOutput {
    shared_state: Arc<SharedState>,
    buffer: Arc<Mutex<Vec<f32>>>,
    max_buffer_size: usize,
    sample_rate: u32,
    channels: u16,

    /// The audio stream (kept alive to maintain playback).
    _stream: cpal::Stream,
}

impl AudioOutput {
    /// Creates a new audio output stream on the default device.
    pub fn new(initial_volume: Volume) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Io("No audio output device found".to_string()))?;

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::Io(format!("Failed to get audio config: {e}")))?;

        let sample_rate = supported_config.sample_rate().0;
        let channels = supported_config.channels();

        let shared_state = Arc::new(SharedState::new(initial_volume.value()));

        // Buffer limited to ~0.5 seconds to prevent unbounded growth
        let max_buffer_size = (sample_rate as usize) * (channels as usize) / 2;
        let buffer: Arc<Mutex<Vec<f32>>> =
            Arc::new(Mutex::new(Vec::with_capacity(max_buffer_size)));

        let stream = match supported_config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &supported_config.into(),
                Arc::clone(&buffer),
                Arc::clone(&shared_state),
            )?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &supported_config.into(),
                Arc::clone(&buffer),
                Arc::clone(&shared_state),
            )?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &supported_config.into(),
                Arc::clone(&buffer),
                Arc::clone(&shared_state),
            )?,
            _ => return Err(Error::Io("Unsupported audio sample format".to_string())),
        };

        stream
            .play()
            .map_err(|e| Error::Io(format!("Failed to start audio stream: {e}")))?;

        Ok(Self {
            shared_state,
            buffer,
            max_buffer_size,
            sample_rate,
            channels,
            _stream: stream,
        })
    }

    /// Builds an audio output stream for a specific sample format.
    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        buffer: Arc<Mutex<Vec<f32>>>,
        shared_state: Arc<SharedState>,
    ) -> Result<cpal::Stream> {
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let volume = shared_state.volume();
                    let muted = shared_state.is_muted();
                    let paused = shared_state.is_paused();

                    if muted || paused {
                        for sample in data.iter_mut() {
                            *sample = T::from_sample(0.0f32);
                        }
                        return;
                    }

                    let Ok(mut buf) = buffer.lock() else {
                        // Mutex poisoned, output silence
                        for sample in data.iter_mut() {
                            *sample = T::from_sample(0.0f32);
                        }
                        return;
                    };

                    // Quadratic volume curve: human hearing is logarithmic,
                    // so a linear slider feels wrong. Squaring makes 50%
                    // sound like "half".
                    let perceptual_volume = volume * volume;

                    for (i, sample) in data.iter_mut().enumerate() {
                        if i < buf.len() {
                            // Clamp slightly below 1.0; from_sample overflows
                            // i16 at exactly 1.0.
                            let amplified =
                                (buf[i] * perceptual_volume).clamp(-1.0, 0.999_999_9);
                            *sample = T::from_sample(amplified);
                        } else {
                            *sample = T::from_sample(0.0f32);
                        }
                    }

                    let consumed = data.len().min(buf.len());
                    buf.drain(..consumed);
                },
                |err| {
                    tracing::warn!("audio output error: {err}");
                },
                None,
            )
            .map_err(|e| Error::Io(format!("Failed to build audio stream: {e}")))?;

        Ok(stream)
    }

    /// Queues audio samples for playback, dropping what the buffer cannot
    /// hold rather than growing without bound.
    pub fn play(&self, samples: &AudioSamples) {
        if let Ok(mut buf) = self.buffer.lock() {
            let available_space = self.max_buffer_size.saturating_sub(buf.len());
            if available_space >= samples.len() {
                buf.extend_from_slice(samples);
            } else if available_space > 0 {
                buf.extend_from_slice(&samples[..available_space]);
            }
        }
    }

    /// Pauses output (the callback emits silence).
    pub fn pause(&self) {
        self.shared_state.set_paused(true);
    }

    /// Resumes output.
    pub fn resume(&self) {
        self.shared_state.set_paused(false);
    }

    /// Pauses output and discards any queued samples.
    pub fn stop(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
        self.shared_state.set_paused(true);
    }

    /// Discards queued samples without changing the pause state.
    /// Used during seek to drop stale audio.
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    pub fn set_volume(&self, volume: Volume) {
        self.shared_state.set_volume(volume.value());
    }

    pub fn set_muted(&self, muted: bool) {
        self.shared_state.set_muted(muted);
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        self.shared_state.volume()
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.shared_state.is_muted()
    }

    /// Output device configuration the decoder should resample to.
    #[must_use]
    pub fn config(&self) -> AudioOutputConfig {
        AudioOutputConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_state_volume_operations() {
        let state = SharedState::new(0.8);
        assert!((state.volume() - 0.8).abs() < 0.001);

        state.set_volume(0.5);
        assert!((state.volume() - 0.5).abs() < 0.001);
    }

    #[test]
    fn shared_state_mute_operations() {
        let state = SharedState::new(1.0);
        assert!(!state.is_muted());

        state.set_muted(true);
        assert!(state.is_muted());

        state.set_muted(false);
        assert!(!state.is_muted());
    }

    #[test]
    fn shared_state_pause_operations() {
        let state = SharedState::new(1.0);
        assert!(!state.is_paused());

        state.set_paused(true);
        assert!(state.is_paused());
    }

    #[test]
    fn decoded_audio_is_cloneable() {
        let audio = DecodedAudio {
            samples: Arc::new(vec![0.0f32; 4800]),
            pts_secs: 1.5,
        };
        let cloned = audio.clone();
        assert_eq!(cloned.samples.len(), 4800);
        assert!((cloned.pts_secs - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn audio_decoder_fails_for_nonexistent_file() {
        let config = AudioOutputConfig {
            sample_rate: 48000,
            channels: 2,
        };
        let result = AudioDecoder::new("/nonexistent/video.mp4", config);
        assert!(result.is_err());
    }

    // Tests that create AudioOutput require actual audio hardware and are
    // better suited for manual testing.
    #[tokio::test]
    #[ignore = "requires audio hardware"]
    async fn audio_output_can_be_created() {
        let result = AudioOutput::new(Volume::new(0.8));
        if let Ok(output) = result {
            assert!((output.volume() - 0.8).abs() < 0.001);
            assert!(!output.is_muted());
            assert!(output.config().sample_rate > 0);
            assert!(output.config().channels > 0);
        }
    }
}

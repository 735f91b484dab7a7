//! Real audio capture using CPAL (Cross-Platform Audio Library).
//!
//! The capture callback pushes frames straight into the ingress queue — it
//! never blocks and never prints; queue pressure is reported by the consumer.

use crate::audio::source::FrameSource;
use crate::defaults;
use crate::error::{LavalierError, Result};
use crate::pipeline::queue::FrameSender;
use crate::pipeline::shutdown::CancellationToken;
use crate::pipeline::types::AudioFrame;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Suppress noisy JACK/ALSA error messages that occur during audio backend probing.
///
/// # Safety
/// This modifies environment variables which is safe when called before spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// Preferred device names for GNOME/PipeWire environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns to filter out (not useful for voice input).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

/// Check if a device name should be filtered out.
fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

/// Check if a device is a preferred device.
fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List all available audio input devices with filtering and recommendations.
///
/// # Returns
/// A vector of device names, with preferred devices marked with "\[recommended\]".
/// Filters out obviously unusable devices (surround channels, HDMI, etc.).
///
/// # Errors
/// Returns `LavalierError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| LavalierError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }

            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Get the best default input device, preferring PipeWire/PulseAudio.
///
/// This ensures we respect the desktop's audio device selection.
///
/// # Errors
/// Returns `LavalierError::AudioDeviceNotFound` if no input device is available.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name()
                    && is_preferred_device(&name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| LavalierError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only accessed from a single thread at a time through
/// the Mutex wrapper in CpalFrameSource.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone frame source backed by CPAL.
///
/// Captures mono f32 audio at the pipeline sample rate. Tries the preferred
/// format first (f32/16kHz/mono), then i16 with conversion, then the device's
/// native config with software channel mixing and resampling.
pub struct CpalFrameSource {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    callback_count: Arc<AtomicU64>,
    sequence: Arc<AtomicU64>,
    fatal: Arc<AtomicBool>,
    sample_rate: u32,
}

impl CpalFrameSource {
    /// Create a new CPAL frame source.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name. If None, uses the best default
    ///   input device.
    ///
    /// # Errors
    /// Returns errors if the device is not found or cannot be configured.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host
                    .input_devices()
                    .map_err(|e| LavalierError::AudioCapture {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                let mut found_device = None;
                for dev in devices {
                    if let Ok(dev_name) = dev.name()
                        && dev_name == name
                    {
                        found_device = Some(dev);
                        break;
                    }
                }

                found_device.ok_or_else(|| LavalierError::AudioDeviceNotFound {
                    device: name.to_string(),
                })
            } else {
                get_best_default_device()
            }
        })?;

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            callback_count: Arc::new(AtomicU64::new(0)),
            sequence: Arc::new(AtomicU64::new(0)),
            fatal: Arc::new(AtomicBool::new(false)),
            sample_rate: defaults::SAMPLE_RATE,
        })
    }

    /// Build the audio stream with the configured format.
    ///
    /// Tries in order:
    /// 1. f32/16kHz/mono — preferred, matches the model's input format
    /// 2. i16/16kHz/mono — for devices that only expose integer formats
    /// 3. Device default config — native rate/channels with software conversion
    ///
    /// Step 3 handles PipeWire setups where the ALSA compatibility layer
    /// accepts non-native configs but never fires the data callback.
    fn build_stream(
        &self,
        frames: FrameSender,
        cancel: CancellationToken,
    ) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: self.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        // Try f32/16kHz/mono — PipeWire/PulseAudio convert transparently
        let sender = frames.clone();
        let counter = Arc::clone(&self.callback_count);
        let sequence = Arc::clone(&self.sequence);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                counter.fetch_add(1, Ordering::Relaxed);
                sender.push(AudioFrame::new(
                    data.to_vec(),
                    sequence.fetch_add(1, Ordering::Relaxed),
                ));
            },
            error_callback(Arc::clone(&self.fatal), cancel.clone()),
            None,
        ) {
            return Ok(stream);
        }

        // Try i16/16kHz/mono, converting to f32
        let sender = frames.clone();
        let counter = Arc::clone(&self.callback_count);
        let sequence = Arc::clone(&self.sequence);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                counter.fetch_add(1, Ordering::Relaxed);
                let samples: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                sender.push(AudioFrame::new(
                    samples,
                    sequence.fetch_add(1, Ordering::Relaxed),
                ));
            },
            error_callback(Arc::clone(&self.fatal), cancel.clone()),
            None,
        ) {
            return Ok(stream);
        }

        // Fallback: capture at the device's native config, convert in software
        self.build_stream_native(frames, cancel)
    }

    /// Build a stream using the device's default/native config, with software
    /// channel mixing and resampling down to the pipeline rate.
    fn build_stream_native(
        &self,
        frames: FrameSender,
        cancel: CancellationToken,
    ) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| LavalierError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate();
        let native_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate;

        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "lavalier: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            default_config.sample_format(),
        );

        let counter = Arc::clone(&self.callback_count);
        let sequence = Arc::clone(&self.sequence);

        match default_config.sample_format() {
            SampleFormat::F32 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let converted =
                            convert_to_mono_target_rate(data, native_channels, native_rate, target_rate);
                        frames.push(AudioFrame::new(
                            converted,
                            sequence.fetch_add(1, Ordering::Relaxed),
                        ));
                    },
                    error_callback(Arc::clone(&self.fatal), cancel.clone()),
                    None,
                )
                .map_err(|e| LavalierError::AudioCapture {
                    message: format!("Failed to build native f32 stream: {}", e),
                }),
            SampleFormat::I16 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let f32_data: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        let converted = convert_to_mono_target_rate(
                            &f32_data,
                            native_channels,
                            native_rate,
                            target_rate,
                        );
                        frames.push(AudioFrame::new(
                            converted,
                            sequence.fetch_add(1, Ordering::Relaxed),
                        ));
                    },
                    error_callback(Arc::clone(&self.fatal), cancel.clone()),
                    None,
                )
                .map_err(|e| LavalierError::AudioCapture {
                    message: format!("Failed to build native i16 stream: {}", e),
                }),
            fmt => Err(LavalierError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. \
                     Try specifying a device with --device.",
                    fmt
                ),
            }),
        }
    }
}

/// Stream error callback: device warnings are surfaced and capture continues;
/// a vanished device is capture-fatal and trips the stop signal.
fn error_callback(
    fatal: Arc<AtomicBool>,
    cancel: CancellationToken,
) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| match err {
        cpal::StreamError::DeviceNotAvailable => {
            eprintln!("lavalier: audio device disappeared, stopping capture");
            fatal.store(true, Ordering::SeqCst);
            cancel.cancel();
        }
        other => {
            eprintln!("lavalier: audio stream warning: {}", other);
        }
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono_target_rate(
    samples: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let mono: Vec<f32> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if source_rate == target_rate {
        mono
    } else {
        resample(&mono, source_rate, target_rate)
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as f32
            }
        })
        .collect()
}

impl FrameSource for CpalFrameSource {
    fn start(&mut self, frames: FrameSender, cancel: CancellationToken) -> Result<()> {
        {
            let stream_guard = self.stream.lock().map_err(|e| LavalierError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if stream_guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let stream = self.build_stream(frames.clone(), cancel.clone())?;
        stream.play().map_err(|e| LavalierError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        // Wait briefly to check if the CPAL callback actually fires.
        // Some PipeWire-ALSA setups accept non-native configs but never deliver data.
        std::thread::sleep(std::time::Duration::from_millis(200));

        let final_stream = if self.callback_count.load(Ordering::Relaxed) == 0 {
            // Preferred config didn't deliver data — stop it, try native
            drop(stream);

            let native_stream = self.build_stream_native(frames, cancel)?;
            native_stream
                .play()
                .map_err(|e| LavalierError::AudioCapture {
                    message: format!("Failed to start native audio stream: {}", e),
                })?;
            native_stream
        } else {
            stream
        };

        let mut stream_guard = self.stream.lock().map_err(|e| LavalierError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *stream_guard = Some(SendableStream(final_stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| LavalierError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        if let Some(sendable_stream) = stream_guard.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| LavalierError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
        }
        Ok(())
    }

    fn had_fatal_error(&self) -> bool {
        self.fatal.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_unusable_devices() {
        assert!(should_filter_device("surround51"));
        assert!(should_filter_device("front:CARD=PCH"));
        assert!(should_filter_device("HDMI Output"));
        assert!(should_filter_device("Digital Output S/PDIF"));
        assert!(!should_filter_device("pipewire"));
        assert!(!should_filter_device("Built-in Audio"));
    }

    #[test]
    fn prefers_desktop_audio_servers() {
        assert!(is_preferred_device("pipewire"));
        assert!(is_preferred_device("PipeWire"));
        assert!(is_preferred_device("pulse"));
        assert!(is_preferred_device("PulseAudio"));
        assert!(!is_preferred_device("hw:0,0"));
        assert!(!is_preferred_device("default"));
    }

    #[test]
    fn downmix_averages_channels() {
        let stereo = [0.2, 0.4, -0.6, -0.2];
        let mono = convert_to_mono_target_rate(&stereo, 2, 16000, 16000);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] + 0.4).abs() < 1e-6);
    }

    #[test]
    fn resample_identity_at_same_rate() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_halves_sample_count() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
        let out = resample(&samples, 32000, 16000);
        assert_eq!(out.len(), 500);
        // Values stay within the source range
        assert!(out.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn resample_output_length_matches_ratio() {
        let samples = vec![0.0f32; 48000];
        let out = resample(&samples, 48000, 16000);
        assert_eq!(out.len(), 16000);
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn list_devices_returns_at_least_one_device() {
        let devices = list_devices().unwrap();
        assert!(!devices.is_empty(), "Expected at least one audio device");
    }

    #[test]
    fn create_with_invalid_device_name() {
        let source = CpalFrameSource::new(Some("NonExistentDevice12345"));
        match source {
            Err(LavalierError::AudioDeviceNotFound { device }) => {
                assert_eq!(device, "NonExistentDevice12345");
            }
            Err(LavalierError::AudioCapture { .. }) => {
                // Acceptable on hosts with no audio backend at all
            }
            other => panic!("Expected device error, got {:?}", other.is_ok()),
        }
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn start_stop_roundtrip() {
        use crate::pipeline::queue::frame_queue;

        let mut source = CpalFrameSource::new(None).expect("Failed to create frame source");
        let (tx, _rx) = frame_queue(64);
        let cancel = CancellationToken::new();

        source.start(tx, cancel).expect("Failed to start");
        std::thread::sleep(std::time::Duration::from_millis(100));
        source.stop().expect("Failed to stop");
        assert!(!source.had_fatal_error());
    }
}

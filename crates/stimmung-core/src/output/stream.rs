//! CPAL audio output.

use super::{AudioSink, FinishedCallback, OutputBackend};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use stimmung_synth::Replayer;
use tracing::{debug, info, warn};

/// Opens one CPAL output stream per session.
///
/// The stream runs at the replayer's sample rate on the default output
/// device, or on the device at `output_device_index` when set. A rate the
/// device cannot open is refused before any stream is built.
#[derive(Debug, Clone, Default)]
pub struct CpalOutput {
    output_device_index: Option<usize>,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(index: usize) -> Self {
        Self {
            output_device_index: Some(index),
        }
    }

    /// List available output devices.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices: Result<Vec<String>> = host
            .output_devices()?
            .enumerate()
            .map(|(idx, device)| Ok(format!("{}: {}", idx, device.name()?)))
            .collect();
        devices
    }

    /// Native rate of the selected device, for callers that want to match it.
    pub fn default_sample_rate(&self) -> Result<u32> {
        Ok(self.device()?.default_output_config()?.sample_rate().0)
    }

    fn device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();
        match self.output_device_index {
            Some(index) => host.output_devices()?.nth(index).ok_or_else(|| {
                Error::InvalidDevice(format!("no output device at index {}", index))
            }),
            None => host
                .default_output_device()
                .ok_or_else(|| Error::InvalidDevice("no default output device".to_string())),
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut state: RenderState,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    let frames = data.len() / channels;
                    state.process(frames);

                    for (i, sample) in data.iter_mut().enumerate() {
                        let channel = i % channels;
                        let frame = i / channels;
                        let value = match channel {
                            0 => state.left[frame],
                            1 => state.right[frame],
                            _ => 0.0,
                        };
                        *sample = T::from_sample(value);
                    }
                }));

                if result.is_err() {
                    // Panic in callback - output silence
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0);
                    }
                }
            },
            |err| warn!("Audio stream error: {}", err),
            None,
        )?;

        Ok(stream)
    }
}

impl OutputBackend for CpalOutput {
    fn open(
        &mut self,
        replayer: Replayer,
        on_finished: FinishedCallback,
    ) -> Result<Box<dyn AudioSink>> {
        let device = self.device()?;
        let supported = select_config(
            device.default_output_config()?,
            device.supported_output_configs()?.collect(),
            replayer.sample_rate(),
        )?;

        let config = supported.config();
        let state = RenderState::new(replayer, on_finished);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, state)?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, state)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, state)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {:?}",
                    format
                )));
            }
        };

        stream.play()?;

        info!(
            "Output stream started: {} channels at {} Hz",
            config.channels, config.sample_rate.0
        );

        Ok(Box::new(CpalSink {
            stream: Some(stream),
        }))
    }
}

fn is_renderable(format: cpal::SampleFormat) -> bool {
    matches!(
        format,
        cpal::SampleFormat::F32 | cpal::SampleFormat::I16 | cpal::SampleFormat::U16
    )
}

/// Pick a device configuration running at exactly `sample_rate`.
///
/// The default configuration wins when its rate already matches. Otherwise the
/// supported ranges are searched, preferring the default's sample format and
/// then its channel count.
fn select_config(
    default: cpal::SupportedStreamConfig,
    ranges: Vec<cpal::SupportedStreamConfigRange>,
    sample_rate: u32,
) -> Result<cpal::SupportedStreamConfig> {
    if default.sample_rate().0 == sample_rate && is_renderable(default.sample_format()) {
        return Ok(default);
    }

    let rate = cpal::SampleRate(sample_rate);
    let best = ranges
        .iter()
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .filter(|range| is_renderable(range.sample_format()))
        .max_by_key(|range| {
            (
                range.sample_format() == default.sample_format(),
                range.channels() == default.channels(),
            )
        });

    if let Some(range) = best {
        debug!(
            "Device default is {} Hz, using {:?} with {} channels at {} Hz",
            default.sample_rate().0,
            range.sample_format(),
            range.channels(),
            sample_rate
        );
        return Ok(range.clone().with_sample_rate(rate));
    }

    let supported: Vec<String> = ranges
        .iter()
        .map(|range| {
            format!(
                "{}-{} Hz",
                range.min_sample_rate().0,
                range.max_sample_rate().0
            )
        })
        .collect();
    Err(Error::InvalidConfig(format!(
        "output device cannot run at {} Hz (default {} Hz, supported: {})",
        sample_rate,
        default.sample_rate().0,
        if supported.is_empty() {
            "none reported".to_string()
        } else {
            supported.join(", ")
        }
    )))
}

/// A playing CPAL stream. Dropping it also stops playback.
pub struct CpalSink {
    stream: Option<cpal::Stream>,
}

impl AudioSink for CpalSink {
    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Failed to pause output stream: {}", e);
            }
            debug!("Output stream closed");
        }
    }
}

/// Everything the audio callback owns.
struct RenderState {
    replayer: Replayer,
    on_finished: Option<FinishedCallback>,
    finished: bool,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl RenderState {
    fn new(replayer: Replayer, on_finished: FinishedCallback) -> Self {
        Self {
            replayer,
            on_finished: Some(on_finished),
            finished: false,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Fill the first `frames` samples of `left`/`right`.
    fn process(&mut self, frames: usize) {
        if self.left.len() < frames {
            self.left.resize(frames, 0.0);
            self.right.resize(frames, 0.0);
        }

        let left = &mut self.left[..frames];
        let right = &mut self.right[..frames];

        if self.finished {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        if !self.replayer.render(left, right) {
            self.finished = true;
            if let Some(on_finished) = self.on_finished.take() {
                on_finished();
            }
        }
    }
}

//! Left-channel test tone, so a working channel swap is audible.

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use std::f32::consts::TAU;
use std::sync::Arc;

use scene_mirror::{AudioFilter, AudioListener, ListenerId, MirrorError, MirrorResult, Resource};

const TONE_HZ: f32 = 440.0;
const TONE_GAIN: f32 = 0.15;
/// The beep sounds for the first fifth of every second.
const DUTY: f32 = 0.2;
const MAX_FILTERS: usize = 4;

/// Output stream that plays a beep on the left channel only.
///
/// Filters are handed to the audio thread over a channel and run after the
/// tone is written, in attach order.
pub struct ToneListener {
    _stream: Stream,
    filters: Sender<Arc<dyn AudioFilter>>,
}

impl ToneListener {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device available")?;

        let supported = device.default_output_config()?;
        if supported.sample_format() != SampleFormat::F32 {
            bail!("Output device wants {:?} samples, only f32 is supported", supported.sample_format());
        }
        let config: StreamConfig = supported.into();

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "test tone output"
        );

        let (filters, filter_rx) = crossbeam_channel::bounded(MAX_FILTERS);
        let stream = device.build_output_stream(
            &config,
            tone_callback(&config, filter_rx),
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;
        stream.play().context("Failed to start audio stream")?;

        Ok(Self {
            _stream: stream,
            filters,
        })
    }
}

fn tone_callback(
    config: &StreamConfig,
    filter_rx: Receiver<Arc<dyn AudioFilter>>,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    let channels = usize::from(config.channels).max(1);
    let rate = config.sample_rate.0 as f32;
    let mut filters: Vec<Arc<dyn AudioFilter>> = Vec::with_capacity(MAX_FILTERS);
    let mut phase = 0.0f32;
    let mut clock = 0.0f32;

    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        while filters.len() < MAX_FILTERS {
            match filter_rx.try_recv() {
                Ok(filter) => filters.push(filter),
                Err(_) => break,
            }
        }

        for frame in data.chunks_mut(channels) {
            let sample = if clock < DUTY {
                (phase * TAU).sin() * TONE_GAIN
            } else {
                0.0
            };
            phase = (phase + TONE_HZ / rate).fract();
            clock = (clock + 1.0 / rate).fract();

            for (channel, out) in frame.iter_mut().enumerate() {
                *out = if channel == 0 { sample } else { 0.0 };
            }
        }

        for filter in &filters {
            filter.process(data, channels);
        }
    }
}

impl AudioListener for ToneListener {
    fn id(&self) -> ListenerId {
        ListenerId(1)
    }

    fn attach_filter(&mut self, filter: Arc<dyn AudioFilter>) -> MirrorResult<()> {
        self.filters
            .try_send(filter)
            .map_err(|_| MirrorError::ResourceUnavailable(Resource::AudioListener))
    }
}

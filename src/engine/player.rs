//! Real-time audio output using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use super::Engine;
use crate::config::AudioConfig;
use crate::error::{Error, Result};

/// An opened output device that renders an [`Engine`] in its callback
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Open the configured (or default) output device
    pub fn open(settings: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let device = match settings.device.as_deref() {
            Some(name) => host
                .output_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| Error::EngineInit(format!("output device '{}' not found", name)))?,
            None => host
                .default_output_device()
                .ok_or_else(|| Error::EngineInit("no output device available".to_string()))?,
        };

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let mut config: StreamConfig = supported.into();
        if let Some(rate) = settings.sample_rate {
            config.sample_rate = cpal::SampleRate(rate);
        }
        if let Some(frames) = settings.buffer_size {
            config.buffer_size = cpal::BufferSize::Fixed(frames);
        }

        info!(
            "Audio device: {} ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_default(),
            config.sample_rate.0,
            config.channels,
            sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Sample rate the stream will run at
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start rendering `engine` to the device
    pub fn start(&mut self, engine: Arc<Mutex<Engine>>) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(engine, running)?,
            SampleFormat::I16 => self.build_stream::<i16>(engine, running)?,
            SampleFormat::U16 => self.build_stream::<u16>(engine, running)?,
            other => {
                self.running.store(false, Ordering::SeqCst);
                return Err(Error::EngineInit(format!("unsupported sample format {:?}", other)));
            }
        };

        stream.play()?;
        self.stream = Some(stream);
        info!("Audio stream started at {} Hz", self.sample_rate());

        Ok(())
    }

    /// Stop playback and close the stream
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        engine: Arc<Mutex<Engine>>,
        running: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let channels = self.config.channels as usize;

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !running.load(Ordering::Relaxed) {
                    data.fill(T::from_sample(0.0f32));
                    return;
                }

                // Never wait on the control thread; a missed lock is one silent buffer
                match engine.try_lock() {
                    Ok(mut eng) => {
                        for frame in data.chunks_mut(channels) {
                            let sample = eng.process().clamp(-1.0, 1.0);
                            for channel_sample in frame.iter_mut() {
                                *channel_sample = T::from_sample(sample);
                            }
                        }
                    }
                    Err(_) => data.fill(T::from_sample(0.0f32)),
                }
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device()
        .and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}

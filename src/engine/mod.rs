//! Audio engine for tonescope
//!
//! Renders the channel graph one sample at a time:
//!
//! ```text
//! osc 0 -> gain 0 --\
//! osc 1 -> gain 1 ---+-> low-pass -> analyser -> output
//!   ...              |
//! osc N -> gain N --/
//! ```
//!
//! The engine also owns the sample clock that every parameter change is
//! scheduled against. Control code reaches it through [`SignalGraph`].

mod graph;
mod player;

pub use graph::{Channel, FilterState, GraphSettings, SignalGraph, FALLBACK_FREQUENCY, SMOOTHING_TIME_CONSTANT};
pub use player::{default_device_name, list_output_devices, AudioOutput};

use crate::synth::{AnalysisBuffer, Analyser, AudioParam, Filter, Oscillator, Waveform, MAX_RESONANCE, MIN_RESONANCE};

/// Samples between analysis buffer refreshes
pub const RENDER_QUANTUM: u64 = 128;

/// Oscillator and gain node of one channel
struct Voice {
    oscillator: Oscillator,
    frequency: AudioParam,
    gain: AudioParam,
}

/// The sample-rendering side of the signal graph
pub struct Engine {
    sample_rate: f64,
    frames: u64,
    voices: Vec<Voice>,
    filter: Filter,
    cutoff: AudioParam,
    resonance: AudioParam,
    analyser: Analyser,
}

impl Engine {
    /// Create an engine with `channels` silent voices and an analysis window of `window` samples
    pub fn new(sample_rate: f64, channels: usize, window: usize) -> Self {
        let nyquist = sample_rate / 2.0;
        let voices = (0..channels)
            .map(|_| Voice {
                oscillator: Oscillator::new(Waveform::Sine, FALLBACK_FREQUENCY, sample_rate),
                frequency: AudioParam::new(FALLBACK_FREQUENCY, 0.0, nyquist, sample_rate),
                gain: AudioParam::new(0.0, 0.0, 1.0, sample_rate),
            })
            .collect();

        Self {
            sample_rate,
            frames: 0,
            voices,
            filter: Filter::new(sample_rate),
            cutoff: AudioParam::new(1000.0, 0.0, Filter::max_cutoff(sample_rate), sample_rate),
            resonance: AudioParam::new(1.0, MIN_RESONANCE, MAX_RESONANCE, sample_rate),
            analyser: Analyser::new(window),
        }
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.voices.len()
    }

    /// Clock time in seconds: samples rendered so far over the sample rate
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate
    }

    pub fn frequency(&self, channel: usize) -> Option<&AudioParam> {
        self.voices.get(channel).map(|v| &v.frequency)
    }

    pub fn frequency_mut(&mut self, channel: usize) -> Option<&mut AudioParam> {
        self.voices.get_mut(channel).map(|v| &mut v.frequency)
    }

    pub fn gain(&self, channel: usize) -> Option<&AudioParam> {
        self.voices.get(channel).map(|v| &v.gain)
    }

    pub fn gain_mut(&mut self, channel: usize) -> Option<&mut AudioParam> {
        self.voices.get_mut(channel).map(|v| &mut v.gain)
    }

    pub fn cutoff(&self) -> &AudioParam {
        &self.cutoff
    }

    pub fn cutoff_mut(&mut self) -> &mut AudioParam {
        &mut self.cutoff
    }

    pub fn resonance(&self) -> &AudioParam {
        &self.resonance
    }

    pub fn resonance_mut(&mut self) -> &mut AudioParam {
        &mut self.resonance
    }

    /// Change the shape of every oscillator; the next rendered sample uses it
    pub fn set_waveform(&mut self, waveform: Waveform) {
        for voice in &mut self.voices {
            voice.oscillator.set_waveform(waveform);
        }
    }

    pub fn waveform(&self, channel: usize) -> Option<Waveform> {
        self.voices.get(channel).map(|v| v.oscillator.waveform())
    }

    /// Reader handle for the analysis tap
    pub fn analysis(&self) -> AnalysisBuffer {
        self.analyser.buffer()
    }

    /// Generate the next output sample
    pub fn process(&mut self) -> f32 {
        let now = self.current_time();

        let mut mix = 0.0;
        for voice in &mut self.voices {
            let hz = voice.frequency.advance(now);
            voice.oscillator.set_frequency(hz);
            let level = voice.gain.advance(now);
            mix += voice.oscillator.generate() * level;
        }

        let cutoff = self.cutoff.advance(now);
        let q = self.resonance.advance(now);
        self.filter.set_parameters(cutoff, q);

        let output = self.analyser.process(self.filter.process(mix) as f32);

        self.frames += 1;
        if self.frames % RENDER_QUANTUM == 0 {
            self.analyser.publish();
        }

        output
    }

    /// Fill a buffer with samples
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
    }
}

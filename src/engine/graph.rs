//! Signal graph control
//!
//! [`SignalGraph`] is the single owner of channel and filter state. Every
//! set-operation returns immediately: it records the new control value and
//! schedules the change on the engine at the engine's current clock time.
//! Pitch changes are stepped; gain and filter changes approach their target
//! exponentially with [`SMOOTHING_TIME_CONSTANT`] so live changes do not click.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::Engine;
use crate::config::ToneConfig;
use crate::error::{Error, Result};
use crate::pitch;
use crate::synth::{AnalysisBuffer, Filter, Waveform, MAX_RESONANCE, MIN_RESONANCE};

/// Time constant in seconds for gain and filter transitions
pub const SMOOTHING_TIME_CONSTANT: f64 = 0.015;

/// Frequency used when a channel's initial pitch cannot be resolved
pub const FALLBACK_FREQUENCY: f64 = 440.0;

/// Control-side view of one oscillator channel
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: usize,
    pub frequency_hz: f64,
    pub shape: Waveform,
    /// Level the channel gain is heading to (0 while stopped)
    pub gain_target: f64,
}

/// Shared low-pass filter settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// `0..=0.45 * sample_rate`; 0 is silence
    pub cutoff_hz: f64,
    pub resonance_q: f64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            cutoff_hz: 1000.0,
            resonance_q: 1.0,
        }
    }
}

/// Everything needed to build a graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSettings {
    pub frequencies: Vec<f64>,
    pub shape: Waveform,
    pub filter: FilterState,
    pub master_gain: f64,
    pub window_size: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            frequencies: vec![FALLBACK_FREQUENCY; 4],
            shape: Waveform::Sine,
            filter: FilterState::default(),
            master_gain: 0.5,
            window_size: 1024,
        }
    }
}

impl GraphSettings {
    /// Resolve channel pitches; unresolvable ones fall back to 440 Hz
    pub fn from_config(config: &ToneConfig) -> Self {
        let frequencies = config
            .channels
            .iter()
            .enumerate()
            .map(|(id, text)| {
                pitch::resolve(text).unwrap_or_else(|err| {
                    warn!(channel = id, "{}, using {} Hz", err, FALLBACK_FREQUENCY);
                    FALLBACK_FREQUENCY
                })
            })
            .collect();

        Self {
            frequencies,
            shape: config.master.waveform,
            filter: FilterState {
                cutoff_hz: config.filter.cutoff_hz(),
                resonance_q: config.filter.resonance,
            },
            master_gain: config.master.gain_level(),
            window_size: config.scope.window_size,
        }
    }
}

/// Oscillator channels, shared filter and analysis tap, with their control API
pub struct SignalGraph {
    engine: Arc<Mutex<Engine>>,
    analysis: AnalysisBuffer,
    channels: Vec<Channel>,
    filter: FilterState,
    master_gain: f64,
    shape: Waveform,
    playing: bool,
    nyquist: f64,
    max_cutoff: f64,
}

impl SignalGraph {
    /// Build the graph described by a configuration
    pub fn new(sample_rate: f64, config: &ToneConfig) -> Self {
        Self::build(sample_rate, GraphSettings::from_config(config))
    }

    /// Build the graph; every channel starts silent
    pub fn build(sample_rate: f64, settings: GraphSettings) -> Self {
        let nyquist = sample_rate / 2.0;
        let max_cutoff = Filter::max_cutoff(sample_rate);
        let mut engine = Engine::new(sample_rate, settings.frequencies.len(), settings.window_size);

        let channels: Vec<Channel> = settings
            .frequencies
            .iter()
            .enumerate()
            .map(|(id, &hz)| {
                let hz = sanitize(hz, 0.0, nyquist, FALLBACK_FREQUENCY.min(nyquist));
                if let Some(frequency) = engine.frequency_mut(id) {
                    frequency.set_value(hz);
                }
                Channel {
                    id,
                    frequency_hz: hz,
                    shape: settings.shape,
                    gain_target: 0.0,
                }
            })
            .collect();

        let filter = FilterState {
            cutoff_hz: sanitize(settings.filter.cutoff_hz, 0.0, max_cutoff, 1000.0_f64.min(max_cutoff)),
            resonance_q: sanitize(settings.filter.resonance_q, MIN_RESONANCE, MAX_RESONANCE, 1.0),
        };
        engine.cutoff_mut().set_value(filter.cutoff_hz);
        engine.resonance_mut().set_value(filter.resonance_q);
        engine.set_waveform(settings.shape);

        let analysis = engine.analysis();

        info!(
            channels = channels.len(),
            sample_rate,
            cutoff = filter.cutoff_hz,
            resonance = filter.resonance_q,
            "signal graph built"
        );

        Self {
            engine: Arc::new(Mutex::new(engine)),
            analysis,
            channels,
            filter,
            master_gain: sanitize(settings.master_gain, 0.0, 1.0, 0.0),
            shape: settings.shape,
            playing: false,
            nyquist,
            max_cutoff,
        }
    }

    /// Shared engine handle for the audio output stream
    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }

    /// Reader handle for the analysis tap
    pub fn analysis(&self) -> AnalysisBuffer {
        self.analysis.clone()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, id: usize) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn filter(&self) -> FilterState {
        self.filter
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    pub fn wave_shape(&self) -> Waveform {
        self.shape
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current (smoothed) gain of a channel as rendered by the engine
    pub fn channel_gain(&self, id: usize) -> Option<f64> {
        lock(&self.engine).gain(id).map(|gain| gain.value())
    }

    /// Retune one channel, stepping straight to the new frequency
    pub fn set_channel_frequency(&mut self, id: usize, hz: f64) -> Result<()> {
        let hz = bounded("frequency", hz, 0.0, self.nyquist)?;
        let channel = self.channels.get_mut(id).ok_or(Error::UnknownChannel(id))?;

        if channel.frequency_hz == hz {
            return Ok(());
        }

        let mut engine = lock(&self.engine);
        let now = engine.current_time();
        if let Some(frequency) = engine.frequency_mut(id) {
            frequency.set_value_at_time(hz, now);
        }
        channel.frequency_hz = hz;

        debug!(channel = id, hz, at = now, "frequency scheduled");
        Ok(())
    }

    pub fn set_filter_cutoff(&mut self, hz: f64) -> Result<()> {
        let hz = bounded("cutoff", hz, 0.0, self.max_cutoff)?;

        let mut engine = lock(&self.engine);
        let now = engine.current_time();
        engine.cutoff_mut().set_target_at_time(hz, now, SMOOTHING_TIME_CONSTANT);
        self.filter.cutoff_hz = hz;

        debug!(hz, at = now, "cutoff scheduled");
        Ok(())
    }

    pub fn set_filter_resonance(&mut self, q: f64) -> Result<()> {
        let q = bounded("resonance", q, MIN_RESONANCE, MAX_RESONANCE)?;

        let mut engine = lock(&self.engine);
        let now = engine.current_time();
        engine.resonance_mut().set_target_at_time(q, now, SMOOTHING_TIME_CONSTANT);
        self.filter.resonance_q = q;

        debug!(q, at = now, "resonance scheduled");
        Ok(())
    }

    /// Set the level channels play at; applied right away while playing
    pub fn set_master_gain(&mut self, level: f64) -> Result<()> {
        self.master_gain = bounded("gain", level, 0.0, 1.0)?;
        if self.playing {
            self.ramp_channels(self.master_gain);
        }
        Ok(())
    }

    /// Fade every channel in to the master gain
    pub fn play(&mut self) {
        self.playing = true;
        self.ramp_channels(self.master_gain);
        info!(gain = self.master_gain, "play");
    }

    /// Fade every channel out to silence
    pub fn stop(&mut self) {
        self.playing = false;
        self.ramp_channels(0.0);
        info!("stop");
    }

    /// Switch every oscillator to `shape` at once
    pub fn set_wave_shape(&mut self, shape: Waveform) {
        lock(&self.engine).set_waveform(shape);
        for channel in &mut self.channels {
            channel.shape = shape;
        }
        self.shape = shape;
        debug!(%shape, "wave shape set");
    }

    /// Render samples on the calling thread (for headless use and tests)
    pub fn render(&self, buffer: &mut [f32]) {
        lock(&self.engine).fill_buffer(buffer);
    }

    fn ramp_channels(&mut self, level: f64) {
        let mut engine = lock(&self.engine);
        let now = engine.current_time();
        for channel in &mut self.channels {
            if let Some(gain) = engine.gain_mut(channel.id) {
                gain.set_target_at_time(level, now, SMOOTHING_TIME_CONSTANT);
            }
            channel.gain_target = level;
        }
        debug!(level, at = now, "channel gains scheduled");
    }
}

fn lock(engine: &Mutex<Engine>) -> MutexGuard<'_, Engine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reject non-finite values and clamp the rest into range
fn bounded(name: &'static str, value: f64, min: f64, max: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::InvalidParameter { name, value });
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        debug!(parameter = name, value, clamped, "value out of range, clamped");
    }
    Ok(clamped)
}

fn sanitize(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn test_graph() -> SignalGraph {
        SignalGraph::new(SR, &ToneConfig::default())
    }

    fn render_seconds(graph: &SignalGraph, seconds: f64) {
        let mut remaining = (seconds * SR).ceil() as usize;
        let mut buffer = vec![0.0f32; 512];
        while remaining > 0 {
            let n = remaining.min(buffer.len());
            graph.render(&mut buffer[..n]);
            remaining -= n;
        }
    }

    #[test]
    fn test_graph_from_config() {
        let graph = test_graph();
        assert_eq!(graph.channel_count(), 4);
        assert_eq!(graph.channel(0).unwrap().frequency_hz, 220.0);
        assert_eq!(graph.channel(3).unwrap().frequency_hz, 440.0);
        assert_eq!(graph.filter().cutoff_hz, 1000.0);
        assert_eq!(graph.master_gain(), 0.5);
        assert!(!graph.is_playing());
    }

    #[test]
    fn test_channels_start_silent() {
        let graph = test_graph();
        for id in 0..graph.channel_count() {
            assert_eq!(graph.channel_gain(id), Some(0.0));
            assert_eq!(graph.channel(id).unwrap().gain_target, 0.0);
        }

        let mut buffer = vec![1.0f32; 1024];
        graph.render(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_unresolvable_initial_pitch_falls_back() {
        let config = ToneConfig {
            channels: vec!["h9".to_string(), "c4".to_string()],
            ..ToneConfig::default()
        };
        let graph = SignalGraph::new(SR, &config);
        assert_eq!(graph.channel(0).unwrap().frequency_hz, FALLBACK_FREQUENCY);
        assert!((graph.channel(1).unwrap().frequency_hz - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn test_set_channel_frequency_is_immediate() {
        let mut graph = test_graph();
        graph.set_channel_frequency(1, 330.0).unwrap();
        assert_eq!(graph.channel(1).unwrap().frequency_hz, 330.0);

        let mut buffer = vec![0.0f32; 1];
        graph.render(&mut buffer);

        let engine = graph.engine();
        let engine = engine.lock().unwrap();
        assert_eq!(engine.frequency(1).unwrap().value(), 330.0);
        assert!(!engine.frequency(1).unwrap().is_ramping());
    }

    #[test]
    fn test_same_frequency_twice_schedules_once() {
        let mut graph = test_graph();
        graph.set_channel_frequency(0, 500.0).unwrap();
        graph.set_channel_frequency(0, 500.0).unwrap();

        let engine = graph.engine();
        let engine = engine.lock().unwrap();
        let frequency = engine.frequency(0).unwrap();
        assert_eq!(frequency.pending_events(), 1);
        assert_eq!(frequency.target(), 500.0);
    }

    #[test]
    fn test_frequency_calls_apply_in_order() {
        let mut graph = test_graph();
        graph.set_channel_frequency(2, 300.0).unwrap();
        graph.set_channel_frequency(2, 600.0).unwrap();

        let mut buffer = vec![0.0f32; 1];
        graph.render(&mut buffer);

        let engine = graph.engine();
        let engine = engine.lock().unwrap();
        assert_eq!(engine.frequency(2).unwrap().value(), 600.0);
    }

    #[test]
    fn test_frequency_bounds() {
        let mut graph = test_graph();

        graph.set_channel_frequency(0, -10.0).unwrap();
        assert_eq!(graph.channel(0).unwrap().frequency_hz, 0.0);

        graph.set_channel_frequency(0, 1e9).unwrap();
        assert_eq!(graph.channel(0).unwrap().frequency_hz, SR / 2.0);

        assert!(matches!(
            graph.set_channel_frequency(0, f64::NAN),
            Err(Error::InvalidParameter { name: "frequency", .. })
        ));
        assert!(matches!(
            graph.set_channel_frequency(9, 440.0),
            Err(Error::UnknownChannel(9))
        ));
    }

    #[test]
    fn test_bad_channel_leaves_others_alone() {
        let mut graph = test_graph();
        let before: Vec<f64> = graph.channels().iter().map(|c| c.frequency_hz).collect();
        assert!(graph.set_channel_frequency(7, 100.0).is_err());
        let after: Vec<f64> = graph.channels().iter().map(|c| c.frequency_hz).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_play_ramps_toward_master_gain() {
        let mut graph = test_graph();
        graph.play();
        assert!(graph.is_playing());

        render_seconds(&graph, SMOOTHING_TIME_CONSTANT);
        let expected = 0.5 * (1.0 - (-1.0f64).exp());
        for id in 0..graph.channel_count() {
            let gain = graph.channel_gain(id).unwrap();
            assert!((gain - expected).abs() < 0.01, "channel {} gain {}", id, gain);
            assert_eq!(graph.channel(id).unwrap().gain_target, 0.5);
        }
    }

    #[test]
    fn test_stop_fades_every_channel_to_zero() {
        let mut graph = test_graph();
        graph.set_master_gain(1.0).unwrap();
        graph.play();
        render_seconds(&graph, 0.2);

        graph.stop();
        render_seconds(&graph, SMOOTHING_TIME_CONSTANT * 10.0);

        for id in 0..graph.channel_count() {
            let gain = graph.channel_gain(id).unwrap();
            assert!(gain < 1e-3, "channel {} gain {}", id, gain);
        }
        assert!(!graph.is_playing());
    }

    #[test]
    fn test_stop_without_play_stays_silent() {
        let mut graph = test_graph();
        graph.stop();
        render_seconds(&graph, 0.05);
        for id in 0..graph.channel_count() {
            assert_eq!(graph.channel_gain(id), Some(0.0));
        }
    }

    #[test]
    fn test_master_gain_while_stopped_is_remembered() {
        let mut graph = test_graph();
        graph.set_master_gain(0.8).unwrap();
        render_seconds(&graph, 0.05);
        assert_eq!(graph.channel_gain(0), Some(0.0));

        graph.play();
        render_seconds(&graph, 0.5);
        assert!((graph.channel_gain(0).unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_master_gain_while_playing_ramps() {
        let mut graph = test_graph();
        graph.play();
        render_seconds(&graph, 0.5);

        graph.set_master_gain(0.2).unwrap();
        assert_eq!(graph.channel(0).unwrap().gain_target, 0.2);
        render_seconds(&graph, 0.5);
        assert!((graph.channel_gain(0).unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_master_gain_is_clamped() {
        let mut graph = test_graph();
        graph.set_master_gain(3.0).unwrap();
        assert_eq!(graph.master_gain(), 1.0);
        graph.set_master_gain(-1.0).unwrap();
        assert_eq!(graph.master_gain(), 0.0);
    }

    #[test]
    fn test_filter_changes_are_smoothed() {
        let mut graph = test_graph();
        graph.set_filter_cutoff(1800.0).unwrap();
        graph.set_filter_resonance(5.0).unwrap();
        assert_eq!(graph.filter(), FilterState { cutoff_hz: 1800.0, resonance_q: 5.0 });

        render_seconds(&graph, 0.001);
        {
            let engine = graph.engine();
            let engine = engine.lock().unwrap();
            let cutoff = engine.cutoff().value();
            assert!(cutoff > 1000.0 && cutoff < 1800.0, "cutoff jumped to {}", cutoff);
            assert!(engine.cutoff().is_ramping());
        }

        render_seconds(&graph, 0.5);
        let engine = graph.engine();
        let engine = engine.lock().unwrap();
        assert!((engine.cutoff().value() - 1800.0).abs() < 1e-6);
        assert!((engine.resonance().value() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_filter_bounds() {
        let mut graph = test_graph();
        graph.set_filter_resonance(0.0).unwrap();
        assert_eq!(graph.filter().resonance_q, MIN_RESONANCE);
        assert!(graph.set_filter_cutoff(f64::INFINITY).is_err());
        assert_eq!(graph.filter().cutoff_hz, 1000.0);
    }

    #[test]
    fn test_wave_shape_applies_to_every_channel() {
        let mut graph = test_graph();
        graph.set_wave_shape(Waveform::Sawtooth);
        assert_eq!(graph.wave_shape(), Waveform::Sawtooth);

        let engine = graph.engine();
        let engine = engine.lock().unwrap();
        for channel in graph.channels() {
            assert_eq!(channel.shape, Waveform::Sawtooth);
            assert_eq!(engine.waveform(channel.id), Some(Waveform::Sawtooth));
        }
    }

    #[test]
    fn test_playing_graph_feeds_analysis() {
        let mut graph = test_graph();
        let analysis = graph.analysis();
        graph.play();
        render_seconds(&graph, 0.1);

        assert!(analysis.generation() > 0);
        assert!(analysis.snapshot().iter().any(|&b| b != crate::synth::SILENCE));
    }

    fn peak_after_settling(cutoff_hz: f64) -> f32 {
        let settings = GraphSettings {
            frequencies: vec![5000.0],
            filter: FilterState {
                cutoff_hz,
                resonance_q: 1.0,
            },
            master_gain: 1.0,
            ..GraphSettings::default()
        };
        let mut graph = SignalGraph::build(SR, settings);
        graph.play();
        render_seconds(&graph, 0.5);

        let mut buffer = vec![0.0f32; 4410];
        graph.render(&mut buffer);
        buffer.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    #[test]
    fn test_cutoff_shapes_rendered_output() {
        let open = peak_after_settling(8000.0);
        let closed = peak_after_settling(200.0);
        assert!(open > 0.5, "open filter peak {}", open);
        assert!(closed < open * 0.05, "closed {} vs open {}", closed, open);
    }

    #[test]
    fn test_zero_cutoff_renders_silence() {
        let mut graph = test_graph();
        graph.set_master_gain(1.0).unwrap();
        graph.play();
        graph.set_filter_cutoff(0.0).unwrap();
        assert_eq!(graph.filter().cutoff_hz, 0.0);
        render_seconds(&graph, 0.5);

        let mut buffer = vec![1.0f32; 2048];
        graph.render(&mut buffer);
        assert!(buffer.iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_cutoff_ceiling_matches_filter() {
        let mut graph = test_graph();
        graph.set_filter_cutoff(SR).unwrap();
        assert_eq!(graph.filter().cutoff_hz, Filter::max_cutoff(SR));

        render_seconds(&graph, 0.5);
        let engine = graph.engine();
        let engine = engine.lock().unwrap();
        assert!((engine.cutoff().value() - Filter::max_cutoff(SR)).abs() < 1e-6);
    }
}

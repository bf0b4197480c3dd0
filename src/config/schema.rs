//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::synth::{Waveform, MAX_RESONANCE, MIN_RESONANCE};

/// Most channels a graph may be built with
pub const MAX_CHANNELS: usize = 16;

/// Filter cutoff in Hz for a slider position 0-100 (0-2000 Hz)
pub fn slider_to_cutoff_hz(position: u8) -> f64 {
    f64::from(position.min(100)) * 20.0
}

/// Master gain level for a slider position 0-100 (0.0-1.0)
pub fn slider_to_gain(position: u8) -> f64 {
    f64::from(position.min(100)) / 100.0
}

/// Main configuration for tonescope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Initial pitch text per channel; the list length is the channel count
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    /// Shared low-pass filter
    #[serde(default)]
    pub filter: FilterConfig,

    /// Master gain and waveform
    #[serde(default)]
    pub master: MasterConfig,

    /// Scope display
    #[serde(default)]
    pub scope: ScopeConfig,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            channels: default_channels(),
            filter: FilterConfig::default(),
            master: MasterConfig::default(),
            scope: ScopeConfig::default(),
        }
    }
}

impl ToneConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.audio.sample_rate {
            if !(8000..=192000).contains(&rate) {
                bail!("Sample rate must be between 8000 and 192000");
            }
        }
        if let Some(frames) = self.audio.buffer_size {
            if !(16..=8192).contains(&frames) {
                bail!("Buffer size must be between 16 and 8192");
            }
        }

        if self.channels.is_empty() || self.channels.len() > MAX_CHANNELS {
            bail!("Channel count must be between 1 and {}", MAX_CHANNELS);
        }

        if self.filter.cutoff > 100 {
            bail!("Filter cutoff must be between 0 and 100");
        }
        if !(MIN_RESONANCE..=MAX_RESONANCE).contains(&self.filter.resonance) {
            bail!("Filter resonance must be between {} and {}", MIN_RESONANCE, MAX_RESONANCE);
        }

        if self.master.gain > 100 {
            bail!("Master gain must be between 0 and 100");
        }

        let window = self.scope.window_size;
        if !window.is_power_of_two() || !(32..=32768).contains(&window) {
            bail!("Scope window size must be a power of two between 32 and 32768");
        }
        if !(1..=240).contains(&self.scope.fps) {
            bail!("Scope frame rate must be between 1 and 240");
        }

        Ok(())
    }
}

fn default_channels() -> Vec<String> {
    ["a3", "c#4", "e4", "a4"].iter().map(|s| s.to_string()).collect()
}

/// Audio output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (None = device default)
    pub sample_rate: Option<u32>,

    /// Buffer size in frames (None = device default)
    pub buffer_size: Option<u32>,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

/// Filter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Cutoff slider position 0-100 (default: 50, 1000 Hz)
    #[serde(default = "default_cutoff")]
    pub cutoff: u8,

    /// Resonance Q (default: 1.0)
    #[serde(default = "default_resonance")]
    pub resonance: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            resonance: default_resonance(),
        }
    }
}

impl FilterConfig {
    pub fn cutoff_hz(&self) -> f64 {
        slider_to_cutoff_hz(self.cutoff)
    }
}

fn default_cutoff() -> u8 { 50 }
fn default_resonance() -> f64 { 1.0 }

/// Master settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Gain slider position 0-100 (default: 50)
    #[serde(default = "default_gain")]
    pub gain: u8,

    /// Waveform shared by all channels (default: sine)
    #[serde(default)]
    pub waveform: Waveform,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            gain: default_gain(),
            waveform: Waveform::default(),
        }
    }
}

impl MasterConfig {
    pub fn gain_level(&self) -> f64 {
        slider_to_gain(self.gain)
    }
}

fn default_gain() -> u8 { 50 }

/// Scope display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Samples in the analysis window, a power of two (default: 1024)
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Display refresh rate (default: 30)
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            fps: default_fps(),
        }
    }
}

fn default_window_size() -> usize { 1024 }
fn default_fps() -> u32 { 30 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ToneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channels.len(), 4);
        assert_eq!(config.scope.window_size, 1024);
    }

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, Some(48000));
        assert_eq!(config.buffer_size, None);
        assert!(config.device.is_none());
    }

    #[test]
    fn test_master_config() {
        let yaml = "gain: 80\nwaveform: sawtooth";
        let config: MasterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.waveform, Waveform::Sawtooth);
        assert_eq!(config.gain_level(), 0.8);
    }

    #[test]
    fn test_unknown_waveform_rejected() {
        let yaml = "waveform: noise";
        assert!(serde_yaml::from_str::<MasterConfig>(yaml).is_err());
    }

    #[test]
    fn test_slider_mappings() {
        assert_eq!(slider_to_cutoff_hz(0), 0.0);
        assert_eq!(slider_to_cutoff_hz(50), 1000.0);
        assert_eq!(slider_to_cutoff_hz(100), 2000.0);
        assert_eq!(slider_to_cutoff_hz(250), 2000.0);
        assert_eq!(slider_to_gain(25), 0.25);
        assert_eq!(slider_to_gain(200), 1.0);
    }

    #[test]
    fn test_invalid_channel_count() {
        let mut config = ToneConfig::default();
        config.channels.clear();
        assert!(config.validate().is_err());

        config.channels = vec!["a4".to_string(); MAX_CHANNELS + 1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_scope_window() {
        let mut config = ToneConfig::default();
        config.scope.window_size = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_ranges() {
        let mut config = ToneConfig::default();
        config.filter.cutoff = 101;
        assert!(config.validate().is_err());

        let mut config = ToneConfig::default();
        config.filter.resonance = 50.0;
        assert!(config.validate().is_err());

        let mut config = ToneConfig::default();
        config.audio.sample_rate = Some(1000);
        assert!(config.validate().is_err());
    }
}

//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<ToneConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let config: ToneConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {:?}", path))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path` if given, otherwise use the defaults
pub fn load_or_default(path: Option<&Path>) -> Result<ToneConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(ToneConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Waveform;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
channels: ["a4", "e5"]

master:
  gain: 70
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.channels, vec!["a4", "e5"]);
        assert_eq!(config.master.gain, 70);
        assert_eq!(config.master.waveform, Waveform::Sine);
        assert_eq!(config.filter.cutoff, 50);
    }

    #[test]
    fn test_load_full_config() {
        let yaml = r#"
audio:
  sample_rate: 48000
  buffer_size: 256
  device: null

channels: ["c3", "eb3", "g3"]

filter:
  cutoff: 80
  resonance: 4.5

master:
  gain: 40
  waveform: square

scope:
  window_size: 2048
  fps: 60
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, Some(48000));
        assert_eq!(config.channels.len(), 3);
        assert_eq!(config.filter.cutoff_hz(), 1600.0);
        assert_eq!(config.filter.resonance, 4.5);
        assert_eq!(config.master.waveform, Waveform::Square);
        assert_eq!(config.scope.fps, 60);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let yaml = "scope:\n  window_size: 100\n";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/nonexistent/tonescope.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: ToneConfig =
            serde_yaml::from_str(include_str!("../../tonescope.example.yaml")).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.channels.len(), 4);
    }
}

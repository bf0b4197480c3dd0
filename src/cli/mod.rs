//! CLI interface for tonescope

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tonescope::synth::Waveform;

/// Multi-channel tone synthesizer with a live oscilloscope
#[derive(Parser)]
#[command(name = "tonescope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Write log output to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the live synthesizer and oscilloscope
    Play {
        /// Configuration file path (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Play one or more pitches without the UI
    Tone {
        /// Note names or frequencies, e.g. a4 c#5 440
        #[arg(required = true)]
        pitches: Vec<String>,

        /// Duration in seconds
        #[arg(short, long, default_value = "2.0")]
        duration: f64,

        /// Wave shape
        #[arg(short, long, default_value = "sine")]
        waveform: Waveform,

        /// Master gain slider position (0-100)
        #[arg(short, long, default_value = "50", value_parser = clap::value_parser!(u8).range(0..=100))]
        gain: u8,
    },

    /// Print the frequency of each note name or number
    Resolve {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List available audio output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "tonescope.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}

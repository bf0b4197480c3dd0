//! tonescope - Multi-channel tone synthesizer with a live oscilloscope
//!
//! A handful of oscillators, each tuned from a note name or a number, mix
//! through one resonant low-pass filter. Gain and filter changes glide; the
//! mixed signal is tapped for a terminal scope.

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod pitch;
pub mod synth;
pub mod viz;

pub use config::ToneConfig;
pub use engine::SignalGraph;
pub use error::{Error, Result};
pub use pitch::resolve;

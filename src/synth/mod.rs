//! Signal-processing primitives
//!
//! Oscillators, the low-pass filter, the analysis tap and scheduled
//! parameters that the engine wires into a graph.

mod analyser;
mod filter;
mod oscillator;
mod param;

pub use analyser::{sample_to_byte, AnalysisBuffer, Analyser, SILENCE};
pub use filter::{Filter, MAX_CUTOFF_RATIO, MAX_RESONANCE, MIN_CUTOFF, MIN_RESONANCE};
pub use oscillator::{Oscillator, Waveform};
pub use param::{AudioParam, ParamEvent};

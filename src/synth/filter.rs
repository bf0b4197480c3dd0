//! Biquad low-pass filter
//!
//! Digital resonant low-pass used as the shared filter stage.

use std::f64::consts::PI;

/// Lowest cutoff the biquad runs at; below it the output is faded toward silence
pub const MIN_CUTOFF: f64 = 10.0;
/// Highest cutoff as a fraction of the sample rate
pub const MAX_CUTOFF_RATIO: f64 = 0.45;
/// Resonance range that keeps the filter stable
pub const MIN_RESONANCE: f64 = 0.1;
pub const MAX_RESONANCE: f64 = 20.0;

/// Biquad filter coefficients
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

/// Resonant low-pass biquad
pub struct Filter {
    sample_rate: f64,
    cutoff: f64,
    resonance: f64, // Q factor

    coeffs: Coefficients,
    // Output scale for cutoffs under MIN_CUTOFF
    level: f64,

    // Filter state (Direct Form II transposed)
    z1: f64,
    z2: f64,
}

impl Filter {
    /// Create a new low-pass filter
    pub fn new(sample_rate: f64) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.707, // Butterworth Q
            coeffs: Coefficients::default(),
            level: 1.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.calculate_coefficients();
        filter
    }

    /// Highest cutoff the filter accepts at `sample_rate`
    pub fn max_cutoff(sample_rate: f64) -> f64 {
        sample_rate * MAX_CUTOFF_RATIO
    }

    /// Set cutoff frequency in Hz; 0 silences the output
    pub fn set_cutoff(&mut self, hz: f64) {
        self.set_parameters(hz, self.resonance);
    }

    /// Get cutoff frequency
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Set resonance (Q factor)
    /// 0.707 = Butterworth (flat response)
    /// > 1.0 = resonant peak
    pub fn set_resonance(&mut self, q: f64) {
        self.set_parameters(self.cutoff, q);
    }

    /// Get resonance
    pub fn resonance(&self) -> f64 {
        self.resonance
    }

    /// Set cutoff and resonance together; coefficients are only recomputed on change
    pub fn set_parameters(&mut self, cutoff: f64, q: f64) {
        let cutoff = cutoff.clamp(0.0, Self::max_cutoff(self.sample_rate));
        let q = q.clamp(MIN_RESONANCE, MAX_RESONANCE);
        if cutoff == self.cutoff && q == self.resonance {
            return;
        }
        self.cutoff = cutoff;
        self.resonance = q;
        self.calculate_coefficients();
    }

    fn calculate_coefficients(&mut self) {
        let running = self.cutoff.max(MIN_CUTOFF);
        self.level = self.cutoff / running;

        let omega = 2.0 * PI * running / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.resonance);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        // Normalize by a0
        self.coeffs = Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        };
    }

    /// Process a single sample through the filter
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.z1;

        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;

        output * self.level
    }
}

//! Analysis tap
//!
//! Passes audio through unchanged while keeping the most recent window of
//! samples. On every [`Analyser::publish`] the window is copied, oldest first,
//! into a shared byte buffer that a display thread can read at any time.
//!
//! Bytes encode amplitude around a silence midpoint of 128: -1.0 maps to 0,
//! 0.0 to 128 and +1.0 (and above) to 255.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Byte value of a silent sample
pub const SILENCE: u8 = 128;

/// Convert an amplitude sample to its byte encoding
pub fn sample_to_byte(sample: f32) -> u8 {
    let scaled = (128.0 * (sample + 1.0)).floor();
    scaled.clamp(0.0, 255.0) as u8
}

/// Time-domain bytes shared between the audio thread (writer) and the display (reader)
///
/// Reads are not synchronized with writes: a reader may see a window that is
/// partly from one publish and partly from the next.
#[derive(Clone, Debug)]
pub struct AnalysisBuffer {
    bytes: Arc<[AtomicU8]>,
    generation: Arc<AtomicU64>,
}

impl AnalysisBuffer {
    /// Create a silent buffer of `len` bytes
    pub fn new(len: usize) -> Self {
        Self {
            bytes: (0..len).map(|_| AtomicU8::new(SILENCE)).collect(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of publishes so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Copy the current contents into `out` (up to the shorter of the two lengths)
    pub fn read_into(&self, out: &mut [u8]) {
        for (dst, src) in out.iter_mut().zip(self.bytes.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
    }

    /// Copy the current contents into a new vector
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }

    pub(crate) fn write<I: IntoIterator<Item = u8>>(&self, samples: I) {
        for (dst, byte) in self.bytes.iter().zip(samples) {
            dst.store(byte, Ordering::Relaxed);
        }
        self.generation.fetch_add(1, Ordering::Release);
    }
}

/// Pass-through node recording the last window of samples
pub struct Analyser {
    history: Vec<f32>,
    write_pos: usize,
    shared: AnalysisBuffer,
}

impl Analyser {
    /// `window` is the number of samples exposed to readers
    pub fn new(window: usize) -> Self {
        Self {
            history: vec![0.0; window],
            write_pos: 0,
            shared: AnalysisBuffer::new(window),
        }
    }

    /// Handle for readers
    pub fn buffer(&self) -> AnalysisBuffer {
        self.shared.clone()
    }

    /// Record a sample and pass it through
    pub fn process(&mut self, sample: f32) -> f32 {
        if !self.history.is_empty() {
            self.history[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.history.len();
        }
        sample
    }

    /// Publish the recorded window to readers
    pub fn publish(&self) {
        let (newer, older) = self.history.split_at(self.write_pos);
        self.shared
            .write(older.iter().chain(newer).map(|&s| sample_to_byte(s)));
    }
}

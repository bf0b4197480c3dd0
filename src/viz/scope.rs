//! Scope sampling
//!
//! Turns the analysis tap into polyline frames for the renderer. Sampling is
//! pull-based: the display loop asks for a frame on every tick and the
//! sampler reads whatever the engine last published.

use crate::synth::{AnalysisBuffer, SILENCE};

/// One tick's worth of scope geometry, in abstract units `0..width` x `0..height`
///
/// `y` grows downward from the top edge; silence sits at `height / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFrame {
    points: Vec<(f64, f64)>,
    width: f64,
    height: f64,
}

impl ScopeFrame {
    /// Build a frame from time-domain bytes
    ///
    /// Sample `i` sits at `x = i * width / len`; the line closes at the
    /// vertical center of the right edge.
    pub fn from_bytes(bytes: &[u8], width: f64, height: f64) -> Self {
        let center = height / 2.0;
        let midpoint = f64::from(SILENCE);
        let mut points = Vec::with_capacity(bytes.len() + 1);

        if bytes.is_empty() {
            points.push((0.0, center));
        } else {
            let slice_width = width / bytes.len() as f64;
            for (i, &byte) in bytes.iter().enumerate() {
                let offset = (f64::from(byte) - midpoint) / midpoint;
                points.push((i as f64 * slice_width, center + offset * center));
            }
        }
        points.push((width, center));

        Self {
            points,
            width,
            height,
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Consecutive point pairs making up the polyline
    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Reads the analysis tap once per display tick
pub struct ScopeSampler {
    buffer: AnalysisBuffer,
    scratch: Vec<u8>,
    width: f64,
    height: f64,
}

impl ScopeSampler {
    pub fn new(buffer: AnalysisBuffer, width: f64, height: f64) -> Self {
        let scratch = vec![SILENCE; buffer.len()];
        Self {
            buffer,
            scratch,
            width,
            height,
        }
    }

    /// Change the drawing extent used for subsequent frames
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Sample the current buffer contents; does not modify the buffer
    pub fn next_frame(&mut self) -> ScopeFrame {
        self.buffer.read_into(&mut self.scratch);
        ScopeFrame::from_bytes(&self.scratch, self.width, self.height)
    }

    /// An endless sequence of frames; calling again starts a fresh sequence
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { sampler: self }
    }
}

/// Iterator over scope frames; never returns `None`
pub struct Frames<'a> {
    sampler: &'a mut ScopeSampler,
}

impl Iterator for Frames<'_> {
    type Item = ScopeFrame;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sampler.next_frame())
    }
}

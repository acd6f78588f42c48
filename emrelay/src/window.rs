//! Fixed-window fundamental phasor extraction
//!
//! A completed sample window is correlated against precomputed cosine and negative-sine
//! references of the fundamental frequency. With the window spanning exactly one AC
//! cycle this is a single-bin DFT evaluated once per window, not a sliding update: the
//! fundamental of a pure tone is recovered exactly and all other harmonics the window
//! can represent fall into orthogonal bins.

use core::f32::consts::PI;

use crate::core::{Phasor, SAMPLES_PER_CYCLE, SampleWindow};

/// Precomputed correlation references, one entry per sample position.
///
/// Construction fixes the table length to [`SAMPLES_PER_CYCLE`], so window and table
/// lengths cannot disagree.
pub struct ReferenceTable {
    cos: [f32; SAMPLES_PER_CYCLE],
    sin: [f32; SAMPLES_PER_CYCLE],
}

impl ReferenceTable {
    pub fn new() -> Self {
        let mut cos = [0.0; SAMPLES_PER_CYCLE];
        let mut sin = [0.0; SAMPLES_PER_CYCLE];
        for k in 0..SAMPLES_PER_CYCLE {
            let angle = 2.0 * PI * k as f32 / SAMPLES_PER_CYCLE as f32;
            cos[k] = libm::cosf(angle);
            sin[k] = libm::sinf(angle);
        }
        Self { cos, sin }
    }

    /// Complex fundamental estimate of one window.
    ///
    /// `re = (2/N) Σ s[k]·cos(2πk/N)`, `im = (2/N) Σ s[k]·(-sin(2πk/N))`.
    pub fn fundamental(&self, window: &SampleWindow) -> Phasor {
        let mut re = 0.0f64;
        let mut im = 0.0f64;
        for (k, sample) in window.iter().enumerate() {
            re += f64::from(sample * self.cos[k]);
            im += f64::from(sample * -self.sin[k]);
        }
        let scale = 2.0 / SAMPLES_PER_CYCLE as f64;
        Phasor {
            re: re * scale,
            im: im * scale,
        }
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::new()
    }
}

//! Signed sample to PWM compare code.
//!
//! A sample in `[-1, 1]` maps to `[0, top]`:
//!
//! ```text
//! code = trunc((0.5 + 0.5 · amplitude · sample) · top + 0.5 + dither)
//! ```
//!
//! The `+ 0.5` makes truncation round to nearest when dither is off. Dither
//! is measured in output codes, so it is added directly. The result is
//! clamped to `[0, top]`.

use core::num::NonZeroU64;

use super::noise::TriangularDither;

/// Maps oscillator samples to output codes.
#[derive(Debug, Clone)]
pub struct Quantizer {
    top: u16,
    amplitude: f32,
    dither: Option<TriangularDither>,
}

impl Quantizer {
    /// Quantizer without dither.
    pub const fn new(top: u16, amplitude: f32) -> Self {
        Quantizer {
            top,
            amplitude,
            dither: None,
        }
    }

    /// Quantizer adding triangular dither seeded from `seed`.
    pub const fn with_dither(top: u16, amplitude: f32, seed: NonZeroU64) -> Self {
        Quantizer {
            top,
            amplitude,
            dither: Some(TriangularDither::new(seed)),
        }
    }

    pub fn top(&self) -> u16 {
        self.top
    }

    pub fn is_dithered(&self) -> bool {
        self.dither.is_some()
    }

    /// Convert one sample to a code in `0..=top`.
    #[inline]
    pub fn quantize(&mut self, sample: f32) -> u16 {
        let mut level = (0.5 + 0.5 * sample * self.amplitude) * self.top as f32 + 0.5;
        if let Some(dither) = self.dither.as_mut() {
            level += dither.next_dither();
        }
        // Float-to-int `as` saturates: anything below zero becomes 0.
        (level as u16).min(self.top)
    }
}

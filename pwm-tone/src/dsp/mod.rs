//! Waveform generation: oscillator, dither source and quantizer.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Oscillator`] | Renormalized complex rotor, one `f32` sample per step |
//! | [`TriangularDither`] | xorshift64* driven TPDF dither in `(-1, 1)` |
//! | [`Quantizer`] | Sample + dither → PWM compare code in `[0, top]` |

pub mod noise;
pub mod oscillator;
pub mod quantize;

pub use noise::{TriangularDither, Xorshift64Star};
pub use oscillator::{Oscillator, Rotor};
pub use quantize::Quantizer;

#[cfg(test)]
mod verification_tests;

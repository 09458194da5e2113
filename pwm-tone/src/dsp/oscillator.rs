//! Sine oscillator built on a rotating unit complex number.
//!
//! Each sample the carrier is multiplied by `exp(i·2π·f/fs)`. The only
//! transcendental call happens once, when the advance factor is computed.
//! Repeated multiplication lets the magnitude drift, so every step applies a
//! first-order Newton correction toward unit magnitude:
//!
//! ```text
//! carrier = carrier * advance
//! carrier = carrier * (3 - |carrier|²) / 2
//! ```
//!
//! The correction runs on every sample. Phase lives in the rotor itself, so
//! any frequency in `(0, fs/2)` works without a wavetable or index wrap.

use core::f32::consts::PI;
use core::ops::Mul;

/// Complex number in rectangular form, used as a phase rotor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotor {
    pub re: f32,
    pub im: f32,
}

impl Rotor {
    pub const fn new(re: f32, im: f32) -> Self {
        Rotor { re, im }
    }

    /// Unit rotor at `radians`: `exp(i·radians)`.
    pub fn from_angle(radians: f32) -> Self {
        let (sin, cos) = libm::sincosf(radians);
        Rotor { re: cos, im: sin }
    }

    /// `|z|²`.
    #[inline(always)]
    pub fn norm_sqr(self) -> f32 {
        self.re * self.re + self.im * self.im
    }

    #[inline(always)]
    pub fn scale(self, k: f32) -> Self {
        Rotor {
            re: self.re * k,
            im: self.im * k,
        }
    }

    /// Pull the magnitude toward 1 without a square root.
    ///
    /// One Newton step for `1/sqrt(m)` evaluated at `m = |z|²` around 1.
    #[inline(always)]
    pub fn renormalized(self) -> Self {
        self.scale((3.0 - self.norm_sqr()) * 0.5)
    }
}

impl Mul for Rotor {
    type Output = Rotor;

    #[inline(always)]
    fn mul(self, rhs: Rotor) -> Rotor {
        Rotor {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

/// Fixed-frequency sine generator.
///
/// The carrier starts at `-1 + 0i`, so the first sample is the negative peak.
#[derive(Debug, Clone)]
pub struct Oscillator {
    carrier: Rotor,
    advance: Rotor,
}

impl Oscillator {
    /// Create an oscillator at `frequency` Hz for a stream at `sample_rate` Hz.
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self::with_advance(Rotor::from_angle(2.0 * PI * frequency / sample_rate))
    }

    /// Create an oscillator from a precomputed per-sample advance factor.
    pub const fn with_advance(advance: Rotor) -> Self {
        Oscillator {
            carrier: Rotor::new(-1.0, 0.0),
            advance,
        }
    }

    /// Return the current sample in `[-1, 1]` and step the carrier once.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let sample = self.carrier.re;
        self.carrier = (self.carrier * self.advance).renormalized();
        sample
    }

    /// Current carrier.
    pub fn rotor(&self) -> Rotor {
        self.carrier
    }

    /// Per-sample advance factor.
    pub fn advance_factor(&self) -> Rotor {
        self.advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f32 = 48_000_000.0 / 1025.0;

    #[test]
    fn first_sample_is_negative_peak() {
        let mut osc = Oscillator::new(900.0, FS);
        assert_eq!(osc.advance(), -1.0);
    }

    #[test]
    fn advance_factor_is_unit() {
        for &f in &[1.0f32, 900.0, 1234.5, 20_000.0, FS * 0.499] {
            let osc = Oscillator::new(f, FS);
            let m = osc.advance_factor().norm_sqr();
            assert!((m - 1.0).abs() < 1e-6, "f={f}: |advance|² = {m}");
        }
    }

    #[test]
    fn magnitude_stays_unit_over_long_run() {
        for &f in &[900.0f32, 1.0, 13_337.7, FS * 0.49] {
            let mut osc = Oscillator::new(f, FS);
            for step in 0..1_000_000u32 {
                osc.advance();
                let mag = libm::sqrtf(osc.rotor().norm_sqr());
                assert!(
                    (mag - 1.0).abs() < 1e-4,
                    "f={f}: |rotor| = {mag} after {step} steps"
                );
            }
        }
    }

    #[test]
    fn renormalization_recovers_from_drift() {
        let mut z = Rotor::new(1.05, 0.0);
        for _ in 0..8 {
            z = z.renormalized();
        }
        assert!((z.norm_sqr() - 1.0).abs() < 1e-6, "|z|² = {}", z.norm_sqr());
    }

    #[test]
    fn samples_stay_in_range() {
        let mut osc = Oscillator::new(4321.0, FS);
        for _ in 0..100_000 {
            let s = osc.advance();
            assert!(s.abs() <= 1.0 + 1e-4, "sample {s}");
        }
    }

    #[test]
    fn tracks_reference_phase() {
        // Compare against direct evaluation of cos(π + 2π·f·n/fs).
        use core::f64::consts::PI as PI64;

        let f = 900.0f64;
        let fs = FS as f64;
        let mut osc = Oscillator::new(f as f32, FS);
        for n in 0..10_000u32 {
            let expected = libm::cos(PI64 + 2.0 * PI64 * f * n as f64 / fs);
            let got = osc.advance() as f64;
            assert!((got - expected).abs() < 5e-3, "n={n}: {got} vs {expected}");
        }
    }

    #[test]
    fn period_matches_frequency() {
        // 1 kHz at 48 kHz: exactly 48 samples per period, so the carrier
        // returns to the negative peak after each period.
        let mut osc = Oscillator::new(1000.0, 48_000.0);
        for _ in 0..48 * 10 {
            osc.advance();
        }
        let z = osc.rotor();
        assert!((z.re + 1.0).abs() < 1e-3, "re = {}", z.re);
        assert!(z.im.abs() < 5e-2, "im = {}", z.im);
    }
}

//! Start-time configuration of the tone stream.
//!
//! [`ToneConfig`] is built with `const fn` methods so that a configuration
//! declared as a `const` item is range-checked at compile time:
//!
//! ```ignore
//! const TONE: ToneConfig = ToneConfig::new(900.0).with_amplitude(0.8).with_dither(true);
//! ```
//!
//! An out-of-range value in a `const` configuration is a build error. The same
//! methods called at run time panic.

use core::num::NonZeroU64;

use crate::constants::{DITHER_SEED, PWM_PIN, PWM_TOP, SYSTEM_CLOCK_HZ, TONE_FREQUENCY};
use crate::dsp::{Oscillator, Quantizer};

/// Which half of a PWM slice's compare register drives the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmChannel {
    /// Even GPIO, low half of the compare register.
    A,
    /// Odd GPIO, high half of the compare register.
    B,
}

impl PwmChannel {
    /// Channel wired to `pin`.
    pub const fn for_pin(pin: u8) -> Self {
        if pin % 2 == 0 {
            PwmChannel::A
        } else {
            PwmChannel::B
        }
    }

    /// Offset of this channel's `u16` lane inside the 32-bit compare register.
    pub const fn lane(self) -> usize {
        match self {
            PwmChannel::A => 0,
            PwmChannel::B => 1,
        }
    }
}

/// Tone stream parameters. Fixed for the lifetime of the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneConfig {
    output_pin: u8,
    clock_hz: u32,
    clock_divisor: u8,
    top: u16,
    tone_frequency: f32,
    tone_amplitude: f32,
    dither: bool,
    dither_seed: NonZeroU64,
}

impl ToneConfig {
    /// Defaults: pin 3, 48 MHz, divisor 1, TOP 1024, 900 Hz, full scale, no dither.
    pub const DEFAULT: ToneConfig = ToneConfig::new(TONE_FREQUENCY);

    /// Configuration for a tone at `frequency` Hz with default hardware parameters.
    ///
    /// # Panics
    ///
    /// If `frequency` is not strictly between 0 and half the sample rate.
    pub const fn new(frequency: f32) -> Self {
        let seed = match NonZeroU64::new(DITHER_SEED) {
            Some(seed) => seed,
            None => panic!("dither seed must be nonzero"),
        };
        ToneConfig {
            output_pin: PWM_PIN,
            clock_hz: SYSTEM_CLOCK_HZ,
            clock_divisor: 1,
            top: PWM_TOP,
            tone_frequency: frequency,
            tone_amplitude: 1.0,
            dither: false,
            dither_seed: seed,
        }
        .checked()
    }

    /// GPIO driven by the PWM output; its parity selects the channel.
    pub const fn with_output_pin(mut self, pin: u8) -> Self {
        self.output_pin = pin;
        self
    }

    /// PWM counter clock and integer divisor.
    pub const fn with_clock(mut self, clock_hz: u32, divisor: u8) -> Self {
        self.clock_hz = clock_hz;
        self.clock_divisor = divisor;
        self.checked()
    }

    /// PWM wrap value; codes range over `0..=top`.
    pub const fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self.checked()
    }

    /// Tone amplitude relative to full scale, `0.0..=1.0`.
    pub const fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.tone_amplitude = amplitude;
        self.checked()
    }

    /// Add triangular dither before quantizing.
    pub const fn with_dither(mut self, enabled: bool) -> Self {
        self.dither = enabled;
        self
    }

    /// Seed for the dither generator.
    pub const fn with_dither_seed(mut self, seed: NonZeroU64) -> Self {
        self.dither_seed = seed;
        self
    }

    const fn checked(self) -> Self {
        assert!(self.clock_hz > 0, "clock rate must be nonzero");
        assert!(self.clock_divisor > 0, "clock divisor must be nonzero");
        assert!(self.top > 0, "PWM top must be nonzero");
        assert!(
            self.tone_amplitude >= 0.0 && self.tone_amplitude <= 1.0,
            "tone amplitude must lie in 0.0..=1.0"
        );
        assert!(
            self.tone_frequency > 0.0 && self.tone_frequency < 0.5 * self.sample_rate(),
            "tone frequency must lie strictly between 0 and half the sample rate"
        );
        self
    }

    /// GPIO driven by the PWM output.
    pub const fn output_pin(&self) -> u8 {
        self.output_pin
    }

    /// Compare channel wired to the output pin.
    pub const fn channel(&self) -> PwmChannel {
        PwmChannel::for_pin(self.output_pin)
    }

    /// PWM counter clock in Hz, before the divisor.
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Integer divisor applied to the counter clock.
    pub const fn clock_divisor(&self) -> u8 {
        self.clock_divisor
    }

    /// PWM wrap value; the largest output code.
    pub const fn top(&self) -> u16 {
        self.top
    }

    /// Tone frequency in Hz.
    pub const fn tone_frequency(&self) -> f32 {
        self.tone_frequency
    }

    /// Tone amplitude relative to full scale.
    pub const fn tone_amplitude(&self) -> f32 {
        self.tone_amplitude
    }

    /// Whether dither is added before quantizing.
    pub const fn dither(&self) -> bool {
        self.dither
    }

    /// Seed for the dither generator.
    pub const fn dither_seed(&self) -> NonZeroU64 {
        self.dither_seed
    }

    /// Output sample rate in Hz: one sample per PWM period of `top + 1` counter ticks.
    pub const fn sample_rate(&self) -> f32 {
        self.clock_hz as f32 / self.clock_divisor as f32 / (self.top as f32 + 1.0)
    }

    /// Duration of one chunk of `samples` codes, in microseconds.
    pub fn chunk_period_us(&self, samples: usize) -> u32 {
        (samples as f32 * 1_000_000.0 / self.sample_rate()) as u32
    }

    /// Oscillator producing this configuration's tone.
    pub fn oscillator(&self) -> Oscillator {
        Oscillator::new(self.tone_frequency, self.sample_rate())
    }

    /// Quantizer for this configuration's range, amplitude and dither setting.
    pub fn quantizer(&self) -> Quantizer {
        if self.dither {
            Quantizer::with_dither(self.top, self.tone_amplitude, self.dither_seed)
        } else {
            Quantizer::new(self.top, self.tone_amplitude)
        }
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sample_rate() {
        let config = ToneConfig::default();
        assert_eq!(config.top(), 1024);
        assert_eq!(config.tone_frequency(), 900.0);
        assert!((config.sample_rate() - 46_829.27).abs() < 0.1);
    }

    #[test]
    fn divisor_scales_sample_rate() {
        let config = ToneConfig::new(440.0).with_clock(48_000_000, 4);
        let base = ToneConfig::new(440.0);
        assert!((config.sample_rate() * 4.0 - base.sample_rate()).abs() < 0.5);
    }

    #[test]
    fn const_configuration_builds() {
        const TONE: ToneConfig = ToneConfig::new(1000.0)
            .with_top(4095)
            .with_amplitude(0.25)
            .with_dither(true)
            .with_output_pin(8);
        assert_eq!(TONE.top(), 4095);
        assert_eq!(TONE.channel(), PwmChannel::A);
        assert!(TONE.dither());
        assert!(TONE.quantizer().is_dithered());
    }

    #[test]
    fn channel_follows_pin_parity() {
        assert_eq!(PwmChannel::for_pin(3), PwmChannel::B);
        assert_eq!(PwmChannel::for_pin(3).lane(), 1);
        assert_eq!(PwmChannel::for_pin(0).lane(), 0);
    }

    #[test]
    fn chunk_period() {
        let config = ToneConfig::default();
        // 1024 samples at ~46.8 kHz
        assert_eq!(config.chunk_period_us(1024) / 100, 218);
    }

    #[test]
    #[should_panic(expected = "tone frequency")]
    fn rejects_frequency_above_nyquist() {
        let _ = ToneConfig::new(30_000.0);
    }

    #[test]
    #[should_panic(expected = "tone frequency")]
    fn rejects_zero_frequency() {
        let _ = ToneConfig::new(0.0);
    }

    #[test]
    #[should_panic(expected = "tone amplitude")]
    fn rejects_amplitude_above_full_scale() {
        let _ = ToneConfig::DEFAULT.with_amplitude(1.5);
    }
}

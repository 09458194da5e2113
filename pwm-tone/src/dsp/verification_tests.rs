//! End-to-end verification of the generated tone.
//!
//! Runs the oscillator and quantizer exactly as the fill loop does and
//! inspects the resulting code stream in the frequency domain:
//!
//! - **Tone placement:** the dominant bin sits within one bin of the
//!   configured frequency
//! - **Spectral purity:** nothing outside the tone's main lobe reaches
//!   −40 dB relative to full scale
//! - **Long-run stability:** the same holds after millions of samples

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use core::f64::consts::PI;

    use crate::config::ToneConfig;
    use crate::dsp::{Oscillator, Quantizer};

    /// Analysis length: one nominal chunk.
    const N: usize = 1024;

    /// Bins on each side of the peak covered by the Blackman main lobe.
    const MAIN_LOBE: usize = 4;

    /// Next `N` codes from `oscillator` through `quantizer`, centered and
    /// scaled so that a full-scale sine has amplitude 1.
    fn capture_from(
        oscillator: &mut Oscillator,
        quantizer: &mut Quantizer,
        skip: usize,
    ) -> Vec<f64> {
        for _ in 0..skip {
            quantizer.quantize(oscillator.advance());
        }

        let top = quantizer.top() as f64;
        let codes: Vec<f64> = (0..N)
            .map(|_| quantizer.quantize(oscillator.advance()) as f64)
            .collect();
        assert!(codes.iter().all(|&code| code <= top));

        let half_scale = top / 2.0;
        let mean = codes.iter().sum::<f64>() / N as f64;
        codes.iter().map(|&code| (code - mean) / half_scale).collect()
    }

    fn capture(config: &ToneConfig, skip: usize) -> Vec<f64> {
        capture_from(&mut config.oscillator(), &mut config.quantizer(), skip)
    }

    fn blackman(n: usize) -> f64 {
        let x = 2.0 * PI * n as f64 / (N - 1) as f64;
        0.42 - 0.5 * libm::cos(x) + 0.08 * libm::cos(2.0 * x)
    }

    /// Amplitude spectrum of bins `0..=N/2`, scaled so that a full-scale sine
    /// centered on a bin reads 1.0.
    fn amplitude_spectrum(signal: &[f64]) -> Vec<f64> {
        let window: Vec<f64> = (0..N).map(blackman).collect();
        let gain: f64 = window.iter().sum::<f64>() / 2.0;
        let twiddle: Vec<(f64, f64)> = (0..N)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / N as f64;
                (libm::cos(angle), libm::sin(angle))
            })
            .collect();

        (0..=N / 2)
            .map(|k| {
                let (mut re, mut im) = (0.0, 0.0);
                for (n, (&x, &w)) in signal.iter().zip(&window).enumerate() {
                    let (c, s) = twiddle[(k * n) % N];
                    re += x * w * c;
                    im -= x * w * s;
                }
                libm::sqrt(re * re + im * im) / gain
            })
            .collect()
    }

    fn db(amplitude: f64) -> f64 {
        20.0 * libm::log10(amplitude.max(1e-12))
    }

    fn verify_tone(config: &ToneConfig, skip: usize) {
        verify_spectrum(
            &capture(config, skip),
            config.sample_rate() as f64,
            config.tone_frequency() as f64,
            config.tone_amplitude() as f64,
        );
    }

    /// Assert the tone sits at `frequency` and every other bin stays below
    /// −40 dB full scale.
    fn verify_spectrum(signal: &[f64], sample_rate: f64, frequency: f64, amplitude: f64) {
        let spectrum = amplitude_spectrum(signal);
        let bin_width = sample_rate / N as f64;
        let expected_bin = frequency / bin_width;

        let (peak_bin, &peak) = spectrum
            .iter()
            .enumerate()
            .skip(MAIN_LOBE)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();

        assert!(
            (peak_bin as f64 - expected_bin).abs() <= 1.0,
            "peak at bin {} ({:.1} Hz), expected bin {:.2} ({} Hz)",
            peak_bin,
            peak_bin as f64 * bin_width,
            expected_bin,
            frequency
        );
        // Blackman scalloping costs at most ~1.1 dB.
        let expected_level = amplitude;
        assert!(
            db(peak) > db(expected_level) - 1.5,
            "tone level {:.1} dBFS, expected {:.1} dBFS",
            db(peak),
            db(expected_level)
        );

        for (bin, &level) in spectrum.iter().enumerate() {
            let near_dc = bin < MAIN_LOBE;
            let near_tone = bin.abs_diff(peak_bin) <= MAIN_LOBE;
            if near_dc || near_tone {
                continue;
            }
            assert!(
                db(level) < -40.0,
                "bin {} ({:.1} Hz) at {:.1} dBFS",
                bin,
                bin as f64 * bin_width,
                db(level)
            );
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Default stream: 48 MHz, TOP 1024, 900 Hz
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_default_tone_without_dither() {
        let config = ToneConfig::DEFAULT;
        assert!(!config.dither());
        verify_tone(&config, 0);
    }

    #[test]
    fn verify_default_tone_with_dither() {
        verify_tone(&ToneConfig::DEFAULT.with_dither(true), 0);
    }

    #[test]
    fn verify_tone_at_clock_over_top_rate() {
        // 48 MHz / 1024 = 46 875 Hz, counting TOP states per period.
        let sample_rate = 48e6 / 1024.0;
        for dithered in [false, true] {
            let mut oscillator = Oscillator::new(900.0, sample_rate);
            let mut quantizer = if dithered {
                ToneConfig::DEFAULT.with_dither(true).quantizer()
            } else {
                Quantizer::new(1024, 1.0)
            };
            let signal = capture_from(&mut oscillator, &mut quantizer, 0);
            verify_spectrum(&signal, sample_rate as f64, 900.0, 1.0);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Variations
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_tone_after_long_run() {
        // ~45 s of output: renormalization keeps the rotor on the unit circle.
        verify_tone(&ToneConfig::DEFAULT.with_dither(true), 2_000_000);
    }

    #[test]
    fn verify_reduced_amplitude() {
        verify_tone(
            &ToneConfig::DEFAULT.with_amplitude(0.5).with_dither(true),
            0,
        );
    }

    #[test]
    fn verify_other_frequency_and_range() {
        let config = ToneConfig::new(2_500.0).with_top(511).with_dither(true);
        verify_tone(&config, 0);
    }

    #[test]
    fn dither_changes_codes_but_not_tone() {
        let plain = capture(&ToneConfig::DEFAULT, 0);
        let dithered = capture(&ToneConfig::DEFAULT.with_dither(true), 0);
        assert_ne!(plain, dithered);

        // Codes differ by at most the dither span plus rounding.
        let half_scale = ToneConfig::DEFAULT.top() as f64 / 2.0;
        let worst = plain
            .iter()
            .zip(&dithered)
            .map(|(a, b)| (a - b).abs() * half_scale)
            .fold(0.0, f64::max);
        assert!(worst <= 2.5, "dither moved a code by {worst}");
    }
}

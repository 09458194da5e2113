//! # pwm-tone
//!
//! A `no_std`, zero-allocation tone generator that streams a pure sine wave
//! to a PWM output through a double-buffered, DMA-paced ring. One PWM period
//! is one sample: the transfer engine writes the next compare code into the
//! output every time the counter wraps, and the CPU refills whichever half of
//! the ring the engine has just finished.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Parameters | [`constants`] / [`config`] | Chunk geometry, clock, TOP, tone frequency |
//! | Trait | [`control`] / [`idle`] | Output, transfer engine and interrupt capabilities; idle hint |
//! | DSP | [`dsp`] | Renormalized rotor oscillator, TPDF dither, quantizer |
//! | I/O | [`io`] | Chunk ring, fill/drain counters, fill loop, simulated hardware |
//! | Errors | [`error`] | Capability failures during bring-up |
//!
//! ## Quick start
//!
//! ```ignore
//! use pwm_tone::config::ToneConfig;
//! use pwm_tone::io::{start_transfer, ChunkCounter, DmaRing, FillLoop, PolledDrain};
//! use pwm_tone::idle::WaitForEvent;
//!
//! const TONE: ToneConfig = ToneConfig::DEFAULT.with_dither(true);
//! static RING: DmaRing = DmaRing::new();
//! static FILLED: ChunkCounter = ChunkCounter::new();
//!
//! start_transfer(&TONE, &RING, &mut pwm, &mut dma)?;
//! let drain = PolledDrain::new(dma, WaitForEvent::new(&mut cp.SCB));
//! FillLoop::new(&TONE, &RING, &FILLED, pwm, drain).run_forever()?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `cortex-m` | no | [`idle::WaitForEvent`] sleeping with `wfe` |
//! | `sim` | no | [`io::sim`] software output and transfer engine |
//!
//! ## Stream parameters
//!
//! - **Chunk:** 1024 codes, 2048 bytes ([`constants::SAMPLES_PER_CHUNK`])
//! - **Ring:** 2 chunks, 4096-byte aligned ([`io::DmaRing`])
//! - **Sample rate:** 48 MHz / 1025 ≈ 46 829 Hz ([`config::ToneConfig::sample_rate`])
//! - **Code range:** `0..=1024` ([`constants::PWM_TOP`])

#![no_std]

pub mod constants;
pub mod config;
pub mod control;
pub mod dsp;
pub mod error;
pub mod idle;
pub mod io;

pub use config::ToneConfig;
pub use error::Error;

//! The producer: fills chunks as fast as the transfer engine frees them.
//!
//! ## Cycle
//!
//! ```text
//! ┌──────────────────────── fill_cycle() ────────────────────────┐
//! │ wait while fill − drain ≥ 2     (skipped on the first cycle) │
//! │ chunk[fill % 2] ← quantize(oscillator) × N                   │
//! │ fill += 1, publish (release)                                 │
//! │ first cycle only: enable the output                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! With the drain index `d`, the engine is reading chunk `d` from slot
//! `d % 2`. The loop may write chunk `f` only when `f == d + 1`: the slot is
//! then the one the engine is not reading. It may also write chunk `d + 2`'s
//! slot only after chunk `d` completes, which is what the wait enforces.
//!
//! ## Underrun
//!
//! If the loop falls behind, the engine keeps wrapping around the ring and
//! replays stale chunks. The drain index then reaches or passes the fill
//! index, and the slot `fill % 2` may be the one being read. The loop skips
//! ahead to `drain + 1`, counts an underrun and carries on. The waveform stays
//! phase-continuous across the skip; only the replayed chunk is audible.
//!
//! ## Arming
//!
//! The transfer engine is started before the first fill but moves nothing
//! until the output runs. The output is enabled once, after the first chunk
//! is complete, so no uninitialized codes reach the pin.

use core::convert::Infallible;

use crate::config::ToneConfig;
use crate::constants::CHUNK_COUNT;
use crate::control::{OutputChannel, RingTransfer, TransferEngine};
use crate::dsp::{Oscillator, Quantizer};
use crate::error::Error;

use super::counter::{ChunkCounter, StopSignal};
use super::drain::DrainTracker;
use super::ring::ChunkRing;

/// Configure the output and start the transfer engine over `ring`.
///
/// Leaves the output disabled; [`FillLoop`] enables it after the first chunk.
/// Fails with [`Error::MisalignedRing`] before touching the hardware if `ring`
/// is not aligned to its own size; use a [`DmaRing`](super::ring::DmaRing).
pub fn start_transfer<const N: usize, O, T>(
    config: &ToneConfig,
    ring: &ChunkRing<N>,
    output: &mut O,
    engine: &mut T,
) -> Result<(), Error<O::Error, T::Error>>
where
    O: OutputChannel,
    T: TransferEngine,
{
    if !ring.is_wrap_aligned() {
        return Err(Error::MisalignedRing {
            address: ring.as_ptr() as usize,
            size: ChunkRing::<N>::BYTES,
        });
    }

    output
        .configure(config.top(), config.clock_divisor())
        .map_err(Error::Output)?;

    let transfer = RingTransfer {
        source: ring.as_ptr(),
        destination: output.sample_register(),
        transfer_count: N as u32,
        wrap_bits: ChunkRing::<N>::WRAP_BITS,
        endless: true,
    };
    engine.configure(transfer).map_err(Error::Transfer)?;
    engine.start().map_err(Error::Transfer)?;

    log::info!(
        "tone stream: {} Hz at {} Hz sample rate, {} x {} codes, top {}",
        config.tone_frequency(),
        config.sample_rate(),
        CHUNK_COUNT,
        N,
        config.top()
    );
    Ok(())
}

/// Chunk producer driving one output channel.
pub struct FillLoop<'a, const N: usize, O, D> {
    ring: &'a ChunkRing<N>,
    filled: &'a ChunkCounter,
    oscillator: Oscillator,
    quantizer: Quantizer,
    output: O,
    drain: D,
    fill_index: usize,
    armed: bool,
    underruns: u32,
}

impl<'a, const N: usize, O, D> FillLoop<'a, N, O, D>
where
    O: OutputChannel,
    D: DrainTracker,
{
    /// Create the producer.
    ///
    /// `filled` is published after every chunk so that other contexts can see
    /// how far the loop has got. It must start at zero.
    pub fn new(
        config: &ToneConfig,
        ring: &'a ChunkRing<N>,
        filled: &'a ChunkCounter,
        output: O,
        drain: D,
    ) -> Self {
        debug_assert_eq!(filled.load(), 0, "fill counter must start at zero");
        FillLoop {
            ring,
            filled,
            oscillator: config.oscillator(),
            quantizer: config.quantizer(),
            output,
            drain,
            fill_index: 0,
            armed: false,
            underruns: 0,
        }
    }

    /// Fill one chunk, waiting first if both chunks are owned by the engine.
    pub fn fill_cycle(&mut self) -> Result<(), O::Error> {
        if self.armed {
            self.wait_for_free_chunk();
        }

        let slot = ChunkRing::<N>::slot(self.fill_index);
        // SAFETY: We are the only writer. Either the output is not running yet
        // (nothing is read) or the wait above established that the engine is
        // reading chunk `fill_index - 1`, which lives in the other slot.
        let chunk = unsafe { self.ring.chunk_mut(slot) };
        for code in chunk.iter_mut() {
            *code = self.quantizer.quantize(self.oscillator.advance());
        }

        self.fill_index = self.fill_index.wrapping_add(1);
        self.filled.publish(self.fill_index);

        if !self.armed {
            self.arm()?;
        }
        Ok(())
    }

    /// Fill chunks until `stop` is requested.
    pub fn run(&mut self, stop: &StopSignal) -> Result<(), O::Error> {
        while !stop.is_requested() {
            self.fill_cycle()?;
        }
        log::debug!("fill loop stopped after {} chunks", self.fill_index);
        Ok(())
    }

    /// Fill chunks forever. Returns only if enabling the output fails.
    pub fn run_forever(&mut self) -> Result<Infallible, O::Error> {
        loop {
            self.fill_cycle()?;
        }
    }

    fn wait_for_free_chunk(&mut self) {
        loop {
            let drained = self.drain.drained();
            let backlog = self.fill_index.wrapping_sub(drained);
            if backlog == 0 || backlog > CHUNK_COUNT {
                self.recover_underrun(drained);
                return;
            }
            if backlog < CHUNK_COUNT {
                return;
            }
            self.drain.wait();
        }
    }

    fn recover_underrun(&mut self, drained: usize) {
        self.underruns = self.underruns.wrapping_add(1);
        log::warn!(
            "underrun: engine drained {} chunks, only {} filled; skipping ahead",
            drained,
            self.fill_index
        );
        // The engine is reading chunk `drained`; write the one after it.
        self.fill_index = drained.wrapping_add(1);
    }

    fn arm(&mut self) -> Result<(), O::Error> {
        if !self.output.is_enabled() {
            self.output.enable()?;
            log::debug!("output enabled after first chunk");
        }
        self.armed = true;
        Ok(())
    }

    /// Chunks filled so far, including chunks skipped by underrun recovery.
    pub fn fill_index(&self) -> usize {
        self.fill_index
    }

    /// Drain index as currently reported by the tracker.
    pub fn drain_index(&mut self) -> usize {
        self.drain.drained()
    }

    /// Whether the first chunk has been filled and the output enabled.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of underruns recovered from.
    pub fn underruns(&self) -> u32 {
        self.underruns
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn drain(&self) -> &D {
        &self.drain
    }

    /// Take back the output channel and drain tracker.
    pub fn into_parts(self) -> (O, D) {
        (self.output, self.drain)
    }
}

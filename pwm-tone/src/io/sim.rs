//! Software models of the PWM output and transfer engine.
//!
//! Used by the test suite and host demos to run the real fill loop without
//! hardware. Both models use interior mutability so that the engine can be
//! stepped from an idle closure, a second thread, or a test body while the
//! fill loop holds its own reference.
//!
//! [`SimTransfer::transfer_chunk`] models one chunk period: if the output is
//! running and a published chunk is due, it copies that chunk out of the ring
//! and raises the completion flag. [`SimTransfer::replay_chunk`] models an
//! underrun, where the hardware wraps around and re-reads a stale chunk.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, AtomicUsize, Ordering};

use crate::constants::CHUNK_COUNT;
use crate::control::{OutputChannel, RingTransfer, TransferEngine};

use super::counter::ChunkCounter;
use super::ring::ChunkRing;

/// Simulated PWM slice.
#[derive(Debug, Default)]
pub struct SimOutput {
    enabled: AtomicBool,
    enables: AtomicU32,
    wrap: AtomicU16,
    clock_divisor: AtomicU8,
}

impl SimOutput {
    pub const fn new() -> Self {
        SimOutput {
            enabled: AtomicBool::new(false),
            enables: AtomicU32::new(0),
            wrap: AtomicU16::new(0),
            clock_divisor: AtomicU8::new(0),
        }
    }

    /// How many times `enable` has been called.
    pub fn enable_count(&self) -> u32 {
        self.enables.load(Ordering::Acquire)
    }

    /// Whether `enable` has been called.
    pub fn running(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Wrap value from the last `configure`.
    pub fn wrap(&self) -> u16 {
        self.wrap.load(Ordering::Acquire)
    }

    /// Clock divisor from the last `configure`.
    pub fn clock_divisor(&self) -> u8 {
        self.clock_divisor.load(Ordering::Acquire)
    }
}

impl OutputChannel for &SimOutput {
    type Error = core::convert::Infallible;

    fn configure(&mut self, wrap: u16, clock_divisor: u8) -> Result<(), Self::Error> {
        self.wrap.store(wrap, Ordering::Release);
        self.clock_divisor.store(clock_divisor, Ordering::Release);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.enables.fetch_add(1, Ordering::AcqRel);
        self.enabled.store(true, Ordering::Release);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.running()
    }

    fn sample_register(&self) -> *mut u16 {
        core::ptr::null_mut()
    }
}

/// Simulated DMA channel reading a [`ChunkRing`] in wrap mode.
pub struct SimTransfer<'a, const N: usize> {
    ring: &'a ChunkRing<N>,
    filled: &'a ChunkCounter,
    output: &'a SimOutput,
    configured: AtomicBool,
    started: AtomicBool,
    pending: AtomicBool,
    /// Chunks read out of the ring, replays included.
    position: AtomicUsize,
    replays: AtomicUsize,
}

impl<'a, const N: usize> SimTransfer<'a, N> {
    /// Engine over `ring`, paced by `output` and only reading chunks `filled` has published.
    pub const fn new(
        ring: &'a ChunkRing<N>,
        filled: &'a ChunkCounter,
        output: &'a SimOutput,
    ) -> Self {
        SimTransfer {
            ring,
            filled,
            output,
            configured: AtomicBool::new(false),
            started: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            position: AtomicUsize::new(0),
            replays: AtomicUsize::new(0),
        }
    }

    fn running(&self) -> bool {
        self.started.load(Ordering::Acquire) && self.output.running()
    }

    /// Run one chunk period: copy the next published chunk into `sink` and
    /// raise the completion flag.
    ///
    /// Returns `false` without moving anything if the output is not running
    /// or the next chunk has not been published.
    pub fn transfer_chunk(&self, sink: &mut [u16; N]) -> bool {
        if !self.running() {
            return false;
        }
        let position = self.position.load(Ordering::Relaxed);
        let published = self.filled.load().wrapping_sub(position);
        if published == 0 || published > CHUNK_COUNT {
            return false;
        }
        // SAFETY: `filled` published this chunk with release ordering and we
        // observed it with acquire. The fill loop will not rewrite the slot
        // until the drain counter passes `position`, which only happens after
        // this copy returns and the completion is handled.
        let chunk = unsafe { self.ring.chunk(ChunkRing::<N>::slot(position)) };
        sink.copy_from_slice(chunk);
        self.position.store(position.wrapping_add(1), Ordering::Release);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Run one chunk period without fresh data: the ring wraps onto a stale
    /// chunk. Raises the completion flag like a normal transfer.
    pub fn replay_chunk(&self) -> bool {
        if !self.running() {
            return false;
        }
        self.position.fetch_add(1, Ordering::AcqRel);
        self.replays.fetch_add(1, Ordering::AcqRel);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Chunks read so far, replays included.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Stale chunks replayed so far.
    pub fn replays(&self) -> usize {
        self.replays.load(Ordering::Acquire)
    }

    /// Whether the ring transfer has been configured.
    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }

    /// Whether `start` has been called.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl<const N: usize> TransferEngine for &SimTransfer<'_, N> {
    type Error = core::convert::Infallible;

    fn configure(&mut self, transfer: RingTransfer) -> Result<(), Self::Error> {
        debug_assert_eq!(transfer.source, self.ring.as_ptr());
        debug_assert_eq!(transfer.transfer_count as usize, N);
        self.configured.store(true, Ordering::Release);
        Ok(())
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    fn completion_pending(&mut self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    fn acknowledge_completion(&mut self) {
        self.pending.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_idle_until_output_runs() {
        let ring = ChunkRing::<8>::new();
        let filled = ChunkCounter::new();
        let output = SimOutput::new();
        let engine = SimTransfer::new(&ring, &filled, &output);
        let mut sink = [0u16; 8];

        (&engine).start().unwrap();
        filled.increment();
        assert!(!engine.transfer_chunk(&mut sink));

        (&output).enable().unwrap();
        assert!(engine.transfer_chunk(&mut sink));
        assert!((&engine).completion_pending());
    }

    #[test]
    fn engine_never_reads_unpublished_chunks() {
        let ring = ChunkRing::<8>::new();
        let filled = ChunkCounter::new();
        let output = SimOutput::new();
        let engine = SimTransfer::new(&ring, &filled, &output);
        let mut sink = [0u16; 8];
        (&engine).start().unwrap();
        (&output).enable().unwrap();

        assert!(!engine.transfer_chunk(&mut sink));
        filled.increment();
        assert!(engine.transfer_chunk(&mut sink));
        assert!(!engine.transfer_chunk(&mut sink));
        assert_eq!(engine.position(), 1);
    }

    #[test]
    fn replay_advances_position() {
        let ring = ChunkRing::<8>::new();
        let filled = ChunkCounter::new();
        let output = SimOutput::new();
        let engine = SimTransfer::new(&ring, &filled, &output);
        (&engine).start().unwrap();
        (&output).enable().unwrap();

        assert!(engine.replay_chunk());
        assert_eq!(engine.position(), 1);
        assert_eq!(engine.replays(), 1);
    }
}

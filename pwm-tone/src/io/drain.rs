//! Observing chunk completions from the transfer engine.
//!
//! Two interchangeable [`DrainTracker`]s:
//!
//! | Tracker | Completion source | Counter |
//! |---------|-------------------|---------|
//! | [`PolledDrain`] | Engine's completion flag, checked by the fill loop | Private to the tracker |
//! | [`InterruptDrain`] | [`on_completion`] called from the engine's ISR | Shared [`ChunkCounter`] |
//!
//! The polling variant needs no interrupt handler: the flag stays set until
//! acknowledged, and `WaitForEvent` wakes on it.
//! It can count at most one completion per poll, so it relies on the fill loop
//! polling at least once per chunk period.
//!
//! The interrupt variant decouples counting from the fill loop. The handler
//! only acknowledges and increments; the fill loop only reads.

use crate::control::{CompletionInterrupt, TransferEngine};
use crate::idle::Idle;

use super::counter::ChunkCounter;

/// Source of the drain index.
pub trait DrainTracker {
    /// Total chunks the transfer engine has finished reading.
    fn drained(&mut self) -> usize;

    /// Suspend until something may have changed.
    fn wait(&mut self);
}

/// Completion handler body for the interrupt variant.
///
/// Acknowledges the engine's completion condition and counts one drained chunk.
/// Bounded work only; call it from the transfer engine's interrupt.
#[inline]
pub fn on_completion<T: TransferEngine>(engine: &mut T, drained: &ChunkCounter) {
    engine.acknowledge_completion();
    drained.increment();
}

/// Drain tracker reading a counter maintained by [`on_completion`].
pub struct InterruptDrain<'a, I> {
    counter: &'a ChunkCounter,
    idle: I,
}

impl<'a, I: Idle> InterruptDrain<'a, I> {
    pub fn new(counter: &'a ChunkCounter, idle: I) -> Self {
        InterruptDrain { counter, idle }
    }

    /// Unmask `interrupt` and track the counter its handler maintains.
    ///
    /// The handler must already be bound and must call [`on_completion`]
    /// with `counter`.
    pub fn attach<C: CompletionInterrupt>(
        counter: &'a ChunkCounter,
        interrupt: &mut C,
        idle: I,
    ) -> Self {
        interrupt.enable();
        Self::new(counter, idle)
    }

    /// Mask `interrupt` again. The counter stops advancing.
    pub fn detach<C: CompletionInterrupt>(self, interrupt: &mut C) -> I {
        interrupt.disable();
        self.idle
    }
}

impl<I: Idle> DrainTracker for InterruptDrain<'_, I> {
    #[inline]
    fn drained(&mut self) -> usize {
        self.counter.load()
    }

    #[inline]
    fn wait(&mut self) {
        self.idle.idle();
    }
}

/// Drain tracker polling the engine's completion flag.
pub struct PolledDrain<T, I> {
    engine: T,
    idle: I,
    drained: usize,
}

impl<T: TransferEngine, I: Idle> PolledDrain<T, I> {
    pub fn new(engine: T, idle: I) -> Self {
        PolledDrain {
            engine,
            idle,
            drained: 0,
        }
    }

    pub fn engine(&self) -> &T {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut T {
        &mut self.engine
    }

    pub fn into_engine(self) -> T {
        self.engine
    }
}

impl<T: TransferEngine, I: Idle> DrainTracker for PolledDrain<T, I> {
    fn drained(&mut self) -> usize {
        if self.engine.completion_pending() {
            self.engine.acknowledge_completion();
            self.drained = self.drained.wrapping_add(1);
        }
        self.drained
    }

    #[inline]
    fn wait(&mut self) {
        self.idle.idle();
    }
}

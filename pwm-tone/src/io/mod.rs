//! The producer/consumer protocol between the fill loop and the transfer engine.
//!
//! ## Components
//!
//! | Item | Role |
//! |------|------|
//! | [`ChunkRing`] / [`DmaRing`] | Two chunks of output codes read by the engine in wrap mode |
//! | [`ChunkCounter`] | Fill and drain indices shared across the interrupt boundary |
//! | [`DrainTracker`] | Drain index source: [`PolledDrain`] or [`InterruptDrain`] |
//! | [`FillLoop`] | Producer: backpressure wait, chunk fill, first-chunk arming |
//!
//! ## Invariant
//!
//! At every observation `drain <= fill <= drain + 2`. The fill loop blocks
//! while `fill − drain == 2`, so it never writes a chunk the engine still owns.
//!
//! ## Usage with an interrupt
//!
//! ```ignore
//! static RING: DmaRing = DmaRing::new();
//! static FILLED: ChunkCounter = ChunkCounter::new();
//! static DRAINED: ChunkCounter = ChunkCounter::new();
//!
//! start_transfer(&TONE, &RING, &mut pwm, &mut dma)?;
//!
//! // In the DMA ISR:
//! on_completion(&mut dma, &DRAINED);
//!
//! // In main:
//! let drain = InterruptDrain::attach(&DRAINED, &mut dma_irq, WaitForEvent::new(&mut cp.SCB));
//! FillLoop::new(&TONE, &RING, &FILLED, pwm, drain).run_forever()?;
//! ```

pub mod counter;
pub mod drain;
pub mod fill;
pub mod ring;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use counter::{ChunkCounter, StopSignal};
pub use drain::{on_completion, DrainTracker, InterruptDrain, PolledDrain};
pub use fill::{start_transfer, FillLoop};
pub use ring::{ChunkRing, DmaRing};

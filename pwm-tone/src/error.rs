//! Errors surfaced while bringing the stream up.
//!
//! The streaming protocol itself has no runtime failures: backpressure is a
//! blocking wait and oscillator drift is corrected every sample. Bring-up
//! fails if a hardware capability fails, with its error passed through, or if
//! the ring is not aligned for wrap addressing.

/// Failure while starting the stream.
#[derive(Debug, thiserror::Error)]
pub enum Error<O, T> {
    #[error("output channel: {0:?}")]
    Output(O),
    #[error("transfer engine: {0:?}")]
    Transfer(T),
    /// The ring does not start on its own size, so wrap addressing would
    /// leave it.
    #[error("ring at {address:#x} is not aligned to its {size}-byte wrap")]
    MisalignedRing { address: usize, size: usize },
}

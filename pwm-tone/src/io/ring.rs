//! Two-chunk sample ring shared with the transfer engine.
//!
//! ```text
//!   fill loop                      ChunkRing (wrap = 2 × chunk bytes)          PWM CC
//! ┌──────────┐  chunk f % 2   ┌───────────────┬───────────────┐   DMA    ┌────────┐
//! │ oscillator├──────────────►│   chunk 0     │   chunk 1     ├────────►│ lane A/B│
//! └──────────┘                └───────────────┴───────────────┘ wraps   └────────┘
//! ```
//!
//! The engine reads the ring linearly and wraps back to chunk 0 in hardware.
//! Software never locks the ring: ownership of each chunk alternates in time.
//! The fill loop owns chunk `fill % 2` while the engine reads chunk
//! `drain % 2`, and the backpressure wait keeps those two distinct.
//!
//! Ring wrap addressing requires the ring's byte size to be a power of two and
//! the ring to be aligned to its own size. The size is checked at compile time
//! by [`ChunkRing::WRAP_BITS`]. [`DmaRing`] carries the alignment for any
//! chunk size up to the default, and `start_transfer` refuses a ring that is
//! not on its wrap boundary.

use core::cell::UnsafeCell;
use core::ops::Deref;

use crate::constants::{CHUNK_COUNT, RING_WRAP_BITS, SAMPLES_PER_CHUNK};

/// `CHUNK_COUNT` chunks of `N` output codes, laid out back to back.
#[repr(C)]
pub struct ChunkRing<const N: usize> {
    chunks: [UnsafeCell<[u16; N]>; CHUNK_COUNT],
}

// SAFETY: Each chunk is accessed by one party at a time. The fill loop writes
// chunk `fill % CHUNK_COUNT` only while the drain counter shows the engine is
// not reading it, and readers only touch chunks the fill counter has published.
// Both counters are atomics with acquire/release ordering.
unsafe impl<const N: usize> Sync for ChunkRing<N> {}

impl<const N: usize> ChunkRing<N> {
    /// Size of the whole ring in bytes.
    pub const BYTES: usize = CHUNK_COUNT * N * core::mem::size_of::<u16>();

    /// Ring wrap size as a bit count, `1 << WRAP_BITS == BYTES`.
    ///
    /// Evaluating this constant fails the build if `BYTES` is not a power of two.
    pub const WRAP_BITS: u32 = {
        assert!(N > 0, "chunk must hold at least one sample");
        assert!(
            Self::BYTES.is_power_of_two(),
            "ring byte size must be a power of two for wrap addressing"
        );
        Self::BYTES.trailing_zeros()
    };

    /// Number of codes per chunk.
    pub const SAMPLES: usize = N;

    /// Create a ring with every code at 0.
    pub const fn new() -> Self {
        let _ = Self::WRAP_BITS;
        ChunkRing {
            chunks: [const { UnsafeCell::new([0u16; N]) }; CHUNK_COUNT],
        }
    }

    /// Slot index for chunk number `index`.
    #[inline(always)]
    pub const fn slot(index: usize) -> usize {
        index % CHUNK_COUNT
    }

    /// First code of the ring: the transfer engine's source address.
    pub fn as_ptr(&self) -> *const u16 {
        self.chunks[0].get() as *const u16
    }

    /// Whether the ring starts on a `BYTES` boundary, as wrap addressing needs.
    pub fn is_wrap_aligned(&self) -> bool {
        self.as_ptr() as usize % Self::BYTES == 0
    }

    /// Exclusive access to a chunk for filling.
    ///
    /// # Safety
    ///
    /// The caller must be the only writer and the transfer engine must not be
    /// reading `slot` for the lifetime of the returned reference.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn chunk_mut(&self, slot: usize) -> &mut [u16; N] {
        &mut *self.chunks[slot].get()
    }

    /// Shared access to a chunk, as the transfer engine reads it.
    ///
    /// # Safety
    ///
    /// The chunk must have been published by the fill counter and must not be
    /// refilled while the returned reference lives, which the drain counter
    /// guarantees as long as it is incremented only after the read finishes.
    #[inline]
    pub unsafe fn chunk(&self, slot: usize) -> &[u16; N] {
        &*self.chunks[slot].get()
    }
}

impl<const N: usize> Default for ChunkRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest ring [`DmaRing`] can align: two chunks of [`SAMPLES_PER_CHUNK`] codes.
pub const MAX_RING_BYTES: usize = 1 << RING_WRAP_BITS;

/// Ring aligned for wrap addressing, for any chunk size up to the default.
///
/// The alignment is fixed at [`MAX_RING_BYTES`]. Ring sizes are powers of two
/// no larger than that, so the ring always starts on its own wrap boundary.
/// Place it in a `static`:
///
/// ```ignore
/// static RING: DmaRing = DmaRing::new();
/// ```
#[repr(C, align(4096))]
pub struct DmaRing<const N: usize = SAMPLES_PER_CHUNK>(ChunkRing<N>);

const _: () = assert!(
    core::mem::align_of::<DmaRing>() == MAX_RING_BYTES,
    "ring alignment must equal the largest ring size"
);
const _: () = assert!(
    ChunkRing::<SAMPLES_PER_CHUNK>::WRAP_BITS == RING_WRAP_BITS,
    "ring size does not match the transfer engine wrap"
);

impl<const N: usize> DmaRing<N> {
    const FITS: () = assert!(
        ChunkRing::<N>::BYTES <= MAX_RING_BYTES,
        "ring larger than its alignment"
    );

    pub const fn new() -> Self {
        let () = Self::FITS;
        DmaRing(ChunkRing::new())
    }
}

impl<const N: usize> Default for DmaRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for DmaRing<N> {
    type Target = ChunkRing<N>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

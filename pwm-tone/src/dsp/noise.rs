//! Triangular dither from a xorshift64* generator.
//!
//! One 64-bit draw yields two independent 23-bit mantissas. Each mantissa is
//! placed under the exponent of `1.0f32`, giving a float uniformly distributed
//! on `[1.0, 2.0)`. The difference of the two uniforms has a triangular
//! density on `(-1.0, 1.0)` with zero mean, which is the dither added before
//! truncation in the quantizer.
//!
//! The bit ranges and the output multiplier are part of the contract: a given
//! seed always produces the same sequence on every target.

use core::num::NonZeroU64;

/// Bit pattern of `1.0f32`: sign 0, biased exponent 127, mantissa 0.
const ONE_BITS: u32 = 0x3F80_0000;

/// Mask of the 23 mantissa bits of an `f32`.
const MANTISSA_MASK: u64 = 0x7F_FFFF;

/// Output multiplier of xorshift64*.
const MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

/// Marsaglia xorshift64* generator.
///
/// The state is never zero: the xorshift step is a bijection on nonzero
/// 64-bit values, and construction requires a [`NonZeroU64`].
#[derive(Debug, Clone)]
pub struct Xorshift64Star {
    state: u64,
}

impl Xorshift64Star {
    /// Create a generator from a nonzero seed.
    pub const fn new(seed: NonZeroU64) -> Self {
        Xorshift64Star { state: seed.get() }
    }

    /// Advance the state and return 64 bits. The high bits are the most random.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(MULTIPLIER)
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.state
    }
}

/// Float uniformly distributed on `[1.0, 2.0)` from the low 23 bits of `mantissa`.
#[inline(always)]
fn unit_interval_from_mantissa(mantissa: u64) -> f32 {
    f32::from_bits(ONE_BITS | (mantissa & MANTISSA_MASK) as u32)
}

/// Triangular-PDF dither source.
#[derive(Debug, Clone)]
pub struct TriangularDither {
    rng: Xorshift64Star,
}

impl TriangularDither {
    /// Create a dither source from a nonzero seed.
    pub const fn new(seed: NonZeroU64) -> Self {
        TriangularDither {
            rng: Xorshift64Star::new(seed),
        }
    }

    /// Next dither value, strictly inside `(-1.0, 1.0)`, in units of one output code.
    #[inline]
    pub fn next_dither(&mut self) -> f32 {
        let bits = self.rng.next_u64();

        // Bits 41..64 and 18..41: the 46 most significant bits, split in two.
        let x = unit_interval_from_mantissa(bits >> 41);
        let y = unit_interval_from_mantissa(bits >> 18);

        // Exact: both operands share the same exponent.
        x - y
    }
}

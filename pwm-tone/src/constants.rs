/// Number of chunks in the transfer ring (front and back).
pub const CHUNK_COUNT: usize = 2;

/// Size of one chunk in bytes.
pub const BYTES_PER_CHUNK: usize = 2048;

/// Number of 16-bit output codes per chunk.
pub const SAMPLES_PER_CHUNK: usize = BYTES_PER_CHUNK / core::mem::size_of::<u16>();

/// Transfer engine ring wrap: the source address wraps on a `1 << RING_WRAP_BITS` byte boundary.
pub const RING_WRAP_BITS: u32 = 12;

/// System clock feeding the PWM counter, in Hz.
pub const SYSTEM_CLOCK_HZ: u32 = 48_000_000;

/// PWM wrap value. Output codes lie in `0..=PWM_TOP`.
pub const PWM_TOP: u16 = 1024;

/// GPIO carrying the PWM output.
pub const PWM_PIN: u8 = 3;

/// Default tone frequency in Hz.
pub const TONE_FREQUENCY: f32 = 900.0;

/// Default dither generator seed. Must be nonzero.
pub const DITHER_SEED: u64 = 1;

const _: () = assert!(
    1usize << RING_WRAP_BITS == CHUNK_COUNT * BYTES_PER_CHUNK,
    "ring wrap must cover exactly both chunks"
);

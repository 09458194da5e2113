//! Hardware capabilities consumed by the stream.
//!
//! The crate never touches registers itself. A board support layer implements
//! these traits over its PWM slice, DMA channel and interrupt controller.

/// Where and how the transfer engine moves the ring into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingTransfer {
    /// First code of the ring.
    pub source: *const u16,
    /// Output compare register lane receiving each code.
    pub destination: *mut u16,
    /// Codes per completion event (one chunk).
    pub transfer_count: u32,
    /// Source address wraps every `1 << wrap_bits` bytes.
    pub wrap_bits: u32,
    /// Reload `transfer_count` after each completion instead of stopping.
    pub endless: bool,
}

/// PWM output channel.
pub trait OutputChannel {
    /// Error type for channel operations.
    type Error;

    /// Set the wrap value (codes range over `0..=wrap`) and integer clock divisor.
    fn configure(&mut self, wrap: u16, clock_divisor: u8) -> Result<(), Self::Error>;

    /// Start the PWM counter. Paces the transfer engine from then on.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Whether the PWM counter is running.
    fn is_enabled(&self) -> bool;

    /// Address the transfer engine writes each code to.
    fn sample_register(&self) -> *mut u16;
}

/// DMA-like engine draining the ring into the output, one code per PWM period.
pub trait TransferEngine {
    /// Error type for setup operations.
    type Error;

    /// Program source, destination, count and ring wrap. Does not start.
    fn configure(&mut self, transfer: RingTransfer) -> Result<(), Self::Error>;

    /// Begin transferring. Codes move only once the output paces the engine.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// A chunk has been fully transferred and not yet acknowledged.
    fn completion_pending(&mut self) -> bool;

    /// Clear the completion condition.
    fn acknowledge_completion(&mut self);
}

/// Interrupt line raised on each transfer completion.
///
/// The handler itself is bound statically (`#[interrupt]`, RTIC `binds`); its
/// body should be [`on_completion`](crate::io::drain::on_completion).
pub trait CompletionInterrupt {
    /// Unmask the completion interrupt.
    fn enable(&mut self);

    /// Mask the completion interrupt.
    fn disable(&mut self);
}

//! Suspension hint for the backpressure wait.
//!
//! The fill loop calls [`Idle::idle`] while both chunks belong to the transfer
//! engine. What happens there only affects power and scheduling, never the
//! waveform: sleep until the next hardware event, spin, yield a thread, or run
//! a simulation step.

/// Something to do while waiting for the transfer engine.
pub trait Idle {
    fn idle(&mut self);
}

impl<F: FnMut()> Idle for F {
    #[inline]
    fn idle(&mut self) {
        self()
    }
}

/// Busy-wait with a spin-loop hint.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinIdle;

impl Idle for SpinIdle {
    #[inline]
    fn idle(&mut self) {
        core::hint::spin_loop();
    }
}

/// Sleep until the next event on Cortex-M.
///
/// Completes outstanding memory accesses, then executes `WFE`. With
/// SEVONPEND set in the system control register, a pending completion
/// interrupt wakes the core even while the interrupt is masked, so the
/// polling variant needs no interrupt handler at all.
#[cfg(feature = "cortex-m")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WaitForEvent;

#[cfg(feature = "cortex-m")]
impl WaitForEvent {
    /// Set SEVONPEND so that pending interrupts generate wake-up events.
    pub fn new(scb: &mut cortex_m::peripheral::SCB) -> Self {
        scb.set_sevonpend();
        WaitForEvent
    }
}

#[cfg(feature = "cortex-m")]
impl Idle for WaitForEvent {
    #[inline]
    fn idle(&mut self) {
        cortex_m::asm::dsb();
        cortex_m::asm::wfe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_idle_hints() {
        let mut calls = 0;
        {
            let mut hint = || calls += 1;
            hint.idle();
            hint.idle();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn spin_idle_returns() {
        SpinIdle.idle();
    }
}

//! # Hosted Port
//!
//! Services the kernel's hardware contract with process-local state so the
//! kernel core builds and runs on a development host — for the unit tests,
//! and for embedding the kernel in an emulator harness.
//!
//! There is no machine context to switch on a host, so `init_stack` only
//! clears the anchor, and the forced-reschedule signal becomes an atomic
//! latch the embedding harness drains at its own cadence with
//! [`take_forced_schedule`].

use core::sync::atomic::{AtomicBool, Ordering};

use crate::task::TaskDescriptor;

/// Latched by [`force_schedule`]; drained by the embedding harness.
static SCHEDULE_PENDING: AtomicBool = AtomicBool::new(false);

/// Request that the scheduler run at the harness's earliest opportunity.
#[inline]
pub fn force_schedule() {
    SCHEDULE_PENDING.store(true, Ordering::Release);
}

/// Drain the forced-reschedule latch. Returns whether a request was
/// pending. Harness-side counterpart of [`force_schedule`].
pub fn take_forced_schedule() -> bool {
    SCHEDULE_PENDING.swap(false, Ordering::AcqRel)
}

/// No tick source on the host; the harness drives ticks explicitly.
pub fn start_tick() {}

/// Interrupt masking is meaningless on the host; the `critical-section`
/// `std` implementation provides the real mutual exclusion.
#[inline]
pub fn enable_all_interrupts() {}

/// See [`enable_all_interrupts`].
#[inline]
pub fn disable_all_interrupts() {}

/// Yield to the host scheduler's mercy.
#[inline]
pub fn wait_for_interrupt() {
    core::hint::spin_loop();
}

/// Hosted tasks carry no machine context; the anchor stays empty.
pub fn init_stack(
    task: &mut TaskDescriptor,
    _entry: extern "C" fn() -> !,
    _stack: &'static mut [u8],
) {
    task.saved_sp = core::ptr::null_mut();
}

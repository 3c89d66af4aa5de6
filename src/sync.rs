//! # Critical Sections
//!
//! Every kernel service body runs with global interrupts masked so its state
//! mutations are atomic with respect to ISRs and other tasks. The masking
//! itself is delegated to the `critical-section` crate: on bare metal the
//! implementation comes from `cortex-m`'s single-core PRIMASK acquire, and
//! the host test build links the crate's `std` implementation instead.
//!
//! Keep critical sections short — the scheduler tick and every event post
//! queue up behind them.

use critical_section::CriticalSection;

/// Execute `f` with the kernel critical section held.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

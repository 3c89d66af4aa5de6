//! # Osprey Configuration
//!
//! Compile-time constants governing the kernel tick and the fixed widths of
//! the event and resource bitmaps. Everything is fixed at compile time — no
//! dynamic allocation anywhere in the system.

/// System core clock frequency in Hz (STM32F4 running from the 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Kernel tick frequency in Hz. One tick drives both the scheduler and the
/// countdown timers. 20 Hz gives the 50 ms tick the services are tuned for;
/// raise it for finer timer granularity at the cost of more interrupt
/// overhead.
pub const TICK_HZ: u32 = 20;

/// Width of the per-task event bitmap. Each task owns at most this many
/// distinct event bits.
pub const EVENT_BITS: u32 = 8;

/// Width of the system-wide resource bitmap. At most this many resources
/// can exist per system.
pub const RESOURCE_BITS: u32 = 8;

//! # Architecture Ports
//!
//! Hardware abstraction boundary for the kernel. The kernel core never
//! touches registers directly; everything goes through the `port` alias
//! selected here at compile time.
//!
//! - Bare-metal ARM builds get the Cortex-M4 port: SysTick tick source,
//!   PendSV context switch, PRIMASK interrupt control.
//! - Every other target gets the hosted port, which services the same
//!   contract with process-local state so the kernel core runs under the
//!   host test harness or an emulator.

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m4;
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use cortex_m4 as port;

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub mod hosted;
#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub use hosted as port;

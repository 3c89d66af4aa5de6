//! # Osprey — a statically-configured real-time kernel
//!
//! A small RTOS kernel in the OSEK/VDX tradition for single-core
//! microcontrollers: fixed-priority fully-preemptive multitasking,
//! event-driven task synchronization, shared-resource serialization with
//! priority-ceiling semantics, and countdown timers that emit events on
//! expiry.
//!
//! ## Overview
//!
//! Everything is configured statically. The application declares its task
//! table, timer table, and per-task stacks as statics, prepares each stack
//! once, and hands the tables to [`kernel::start_os`] — which never returns.
//! From then on a periodic tick drives the scheduler from interrupt context,
//! and the task-level services (`set_event`, `wait_events`, `get_resources`,
//! `set_timer`, …) do the rest. No tasks are ever created, terminated, or
//! suspended; no memory is ever allocated.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Application Tasks                      │
//! ├──────────────────────────────────────────────────────────┤
//! │               Kernel API (kernel.rs)                     │
//! │   start_os · set_event · wait_events · get_resources ·   │
//! │   release_resources · set_timer · shutdown_os            │
//! ├───────────────┬──────────────┬──────────────┬────────────┤
//! │  Scheduler    │   Events     │  Resources   │  Timers    │
//! │  scheduler.rs │   event.rs   │  resource.rs │  timer.rs  │
//! │  ─ schedule() │  ─ set/wait  │  ─ ceiling   │  ─ tick    │
//! ├───────────────┴──────────────┴──────────────┴────────────┤
//! │              Task Model (task.rs)                        │
//! │    TaskDescriptor · TaskState · event/resource masks     │
//! ├──────────────────────────────────────────────────────────┤
//! │         Port (arch/cortex_m4.rs │ arch/hosted.rs)        │
//! │    SysTick · PendSV · stack init · forced reschedule     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling Model
//!
//! One task runs at a time. The scheduler always dispatches the
//! highest-priority `Ready` task whose declared resources are all free —
//! that single eligibility test is the whole priority-ceiling protocol, and
//! it is why resources are a single global bitmap with no per-task
//! ownership. Priorities are unique; slot 0 is the idle task (priority 0,
//! no resources), so the scheduler always has a fallback.
//!
//! ## Memory Model
//!
//! - **No heap, no `alloc`**: pure `core`.
//! - **Descriptor tables owned by the application**: the kernel borrows
//!   them for `'static` at `start_os` and never gives them back.
//! - **Per-task stacks**: fixed `[u8; N]` statics, pre-populated with a
//!   virtual saved context so the first dispatch lands in the entry
//!   function.
//! - **Critical sections**: every service body runs under
//!   `critical_section::with`, so its state mutations are atomic against
//!   interrupts and other tasks.

#![no_std]

pub mod arch;
pub mod config;
pub mod event;
pub mod kernel;
pub mod resource;
pub mod scheduler;
pub mod sync;
pub mod task;
pub mod timer;

//! # Kernel
//!
//! The kernel instance and the task-level system services.
//!
//! [`start_os`] wires the application's statically-declared descriptor
//! tables into the one [`Kernel`] instance, starts the tick source, and
//! parks the startup context in an idle loop; the first tick dispatches the
//! highest-priority task and multitasking is on. Everything after that goes
//! through the service wrappers in this module, each of which runs its body
//! inside the kernel critical section and converts the reschedule latch into
//! the port's forced-reschedule signal.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset → main()
//!   ├─► declare task/timer tables and stacks (statics)
//!   ├─► arch::port::init_stack() per task   ← virtual context, entry in PC
//!   └─► kernel::start_os(tasks, timers)     ← never returns
//!         ├─► wire tables into KERNEL, current = bootstrap descriptor
//!         ├─► port::start_tick()            ← periodic tick + switch ISRs
//!         ├─► port::enable_all_interrupts()
//!         └─► wait-for-interrupt loop       ← preempted by the first tick
//! ```

use crate::arch::port;
use crate::scheduler::Kernel;
use crate::sync;
use crate::task::{EventMask, ResourceMask, TaskDescriptor, TaskId};
use crate::timer::{TimerDescriptor, TimerId};
use core::ptr;

// ---------------------------------------------------------------------------
// Kernel globals
// ---------------------------------------------------------------------------

/// Stand-in descriptor for the startup context. The first context switch
/// parks the startup stack pointer in its anchor; nothing ever restores it.
static mut BOOT_TASK: TaskDescriptor = TaskDescriptor::bootstrap();

/// The kernel instance. Populated once by `start_os`, never torn down.
static mut KERNEL: Option<Kernel<'static>> = None;

/// Raw pointer to the kernel instance for the tick and context-switch
/// handlers, which run before borrow scopes can help them.
///
/// # Safety
/// Written once during `start_os` (with interrupts masked), read from ISR
/// context and from the service wrappers below, always inside a critical
/// section or a non-nesting handler.
pub static mut KERNEL_PTR: *mut Kernel<'static> = ptr::null_mut();

// ---------------------------------------------------------------------------
// Startup / shutdown
// ---------------------------------------------------------------------------

/// Boot the operating system. Does not return.
///
/// Wires the descriptor tables into the kernel, enables the tick source and
/// global interrupts, and sleeps until the first tick dispatches the
/// highest-priority task. The startup context is absorbed by the bootstrap
/// descriptor (priority 0, `Ready`), so any real task wins the first
/// scheduler pass.
///
/// Every task descriptor must have had its stack prepared with
/// [`crate::arch::port::init_stack`] first. Slot 0 must be the idle task:
/// priority 0, no required resources, a body that never blocks.
pub fn start_os(
    tasks: &'static mut [TaskDescriptor],
    timers: &'static mut [TimerDescriptor],
) -> ! {
    sync::critical_section(|_cs| unsafe {
        let kernel = &mut *ptr::addr_of_mut!(KERNEL);
        *kernel = Some(Kernel::new(tasks, timers));
        if let Some(kernel) = kernel.as_mut() {
            kernel.current_task = ptr::addr_of_mut!(BOOT_TASK);
            KERNEL_PTR = kernel;
        }
    });

    port::start_tick();
    port::enable_all_interrupts();

    // Bootstrap idle loop. The first tick saves this context into the
    // bootstrap descriptor and never comes back.
    loop {
        port::wait_for_interrupt();
    }
}

/// Halt the system (emergency off). Disables all interrupts and sleeps
/// forever; only a reset brings the system back.
pub fn shutdown_os() -> ! {
    port::disable_all_interrupts();

    loop {
        port::wait_for_interrupt();
    }
}

// ---------------------------------------------------------------------------
// Event services
// ---------------------------------------------------------------------------

/// Post the events in `mask` to `task`, waking it if it waits on any of
/// them. Callable from any task and from interrupt handlers.
pub fn set_event(task: TaskId, mask: EventMask) {
    let resched = sync::critical_section(|_cs| unsafe {
        let kernel = &mut *KERNEL_PTR;
        kernel.set_event(task, mask);
        kernel.take_needs_reschedule()
    });

    if resched {
        port::force_schedule();
    }
}

/// Clear the events in `mask` from the calling task.
pub fn clear_events(mask: EventMask) {
    sync::critical_section(|_cs| unsafe {
        (*KERNEL_PTR).clear_events(mask);
    });
}

/// Read the calling task's pending events.
pub fn get_events() -> EventMask {
    sync::critical_section(|_cs| unsafe { (*KERNEL_PTR).get_events() })
}

/// Block the calling task until any event in `mask` is pending on it.
///
/// Returns immediately when one already is. Satisfied bits stay set; call
/// [`clear_events`] after waking or the next wait on the same mask falls
/// straight through. Must not be called while holding resources.
pub fn wait_events(mask: EventMask) {
    let blocked = sync::critical_section(|_cs| unsafe {
        let kernel = &mut *KERNEL_PTR;
        let blocked = kernel.wait_events(mask);
        if blocked {
            kernel.take_needs_reschedule();
        }
        blocked
    });

    if !blocked {
        return;
    }

    port::force_schedule();

    // The context switch is the actual resumption point: by the time this
    // task executes again, a post has moved it through Ready and the check
    // below passes. The volatile re-read keeps the poll honest on ports
    // where the forced reschedule lands on the next tick instead.
    loop {
        if unsafe { pending_events() } & mask != 0 {
            break;
        }
    }
}

/// Volatile read of the current task's pending events, outside any critical
/// section. The current-task index is re-read on every call because a
/// context switch may occur between polls.
unsafe fn pending_events() -> EventMask {
    let kernel = KERNEL_PTR;
    let index = ptr::read_volatile(ptr::addr_of!((*kernel).current_task_index));
    let task = (*kernel).tasks.as_ptr().add(index);
    ptr::read_volatile(ptr::addr_of!((*task).events))
}

// ---------------------------------------------------------------------------
// Resource services
// ---------------------------------------------------------------------------

/// Occupy the resources in `mask`. Never blocks; competing tasks are held
/// off by the scheduler's ceiling test until release. Pair every call with
/// a [`release_resources`] in the same task, strictly nested.
pub fn get_resources(mask: ResourceMask) {
    sync::critical_section(|_cs| unsafe {
        (*KERNEL_PTR).get_resources(mask);
    });
}

/// Free the resources in `mask` and force a reschedule — a task fenced out
/// by the ceiling may now be the highest-priority candidate.
pub fn release_resources(mask: ResourceMask) {
    let resched = sync::critical_section(|_cs| unsafe {
        let kernel = &mut *KERNEL_PTR;
        kernel.release_resources(mask);
        kernel.take_needs_reschedule()
    });

    if resched {
        port::force_schedule();
    }
}

// ---------------------------------------------------------------------------
// Timer services
// ---------------------------------------------------------------------------

/// Arm a timer with `value` ticks, or disarm it with 0.
pub fn set_timer(timer: TimerId, value: u8) {
    sync::critical_section(|_cs| unsafe {
        (*KERNEL_PTR).set_timer(timer, value);
    });
}

/// Advance one timer by one tick, posting its expiry event at zero.
///
/// The port's periodic interrupt normally drives every timer; this entry
/// point exists so an alternate tick source can drive an individual timer.
pub fn tick_timer(timer: TimerId) {
    let resched = sync::critical_section(|_cs| unsafe {
        let kernel = &mut *KERNEL_PTR;
        kernel.tick_timer(timer);
        kernel.take_needs_reschedule()
    });

    if resched {
        port::force_schedule();
    }
}

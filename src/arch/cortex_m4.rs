//! # Cortex-M4 Port
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2): the SysTick tick
//! source, PendSV context switching, interrupt control, and task-stack
//! preparation.
//!
//! ## Context Switch Mechanism
//!
//! Tasks run in Thread mode on the process stack (PSP); handlers run on the
//! main stack (MSP). On exception entry the hardware stacks r0–r3, r12, lr,
//! pc and xPSR onto the process stack; the PendSV handler pushes r4–r11 on
//! top, parks the resulting PSP in the current task's stack anchor, runs the
//! scheduler, loads the new current task's saved PSP, pops r4–r11 and
//! returns to Thread mode with `EXC_RETURN = 0xFFFFFFFD`.
//!
//! PSP == 0 marks the bootstrap context (the startup code runs on MSP and
//! never sets PSP): the first PendSV skips the register save and the startup
//! context is simply abandoned.
//!
//! ## Interrupt Priorities
//!
//! SysTick and PendSV both run at the lowest priority (0xFF), so the switch
//! never preempts another handler and tail-chains behind whatever interrupt
//! made it pending.

use cortex_m::peripheral::syst::SystClkSource;
use core::arch::naked_asm;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::task::TaskDescriptor;

/// Words in a full saved context: 8 hardware-stacked registers plus r4–r11.
pub const CONTEXT_FRAME_WORDS: usize = 16;

/// Smallest stack a task can live with: one full context frame plus slack
/// for the deepest call chain. Sizing beyond this is an application-level
/// guessing game, as ever.
pub const TASK_STACK_MIN: usize = CONTEXT_FRAME_WORDS * 4;

// ---------------------------------------------------------------------------
// Tick source
// ---------------------------------------------------------------------------

/// Start the kernel tick: configure SysTick at [`TICK_HZ`], drop SysTick and
/// PendSV to the lowest priority, and zero PSP so the first context switch
/// recognizes the bootstrap context.
///
/// Called once by `start_os`, from the reset context, before interrupts are
/// enabled.
pub fn start_tick() {
    // SAFETY: single use from the reset context; only SYST and the system
    // handler priority registers are touched.
    let mut peripherals = unsafe { cortex_m::Peripherals::steal() };

    configure_systick(&mut peripherals.SYST);
    set_interrupt_priorities();

    unsafe { cortex_m::register::psp::write(0) };
}

/// Configure the SysTick timer to fire at [`TICK_HZ`] from the core clock.
fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Set PendSV and SysTick to the lowest interrupt priority so the context
/// switch never preempts another handler.
fn set_interrupt_priorities() {
    // System Handler Priority Register 3 (SHPR3): 0xE000_ED20
    // Bits [23:16] = PendSV priority, bits [31:24] = SysTick priority.
    const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;
    unsafe {
        let value = core::ptr::read_volatile(SHPR3);
        core::ptr::write_volatile(SHPR3, value | (0xFF << 16) | (0xFF << 24));
    }
}

// ---------------------------------------------------------------------------
// Interrupt control
// ---------------------------------------------------------------------------

/// Enable all maskable interrupts (clear PRIMASK).
#[inline]
pub fn enable_all_interrupts() {
    // SAFETY: re-enabling interrupts cannot break a critical section — the
    // kernel only calls this from startup, outside any.
    unsafe { cortex_m::interrupt::enable() }
}

/// Disable all maskable interrupts (set PRIMASK).
#[inline]
pub fn disable_all_interrupts() {
    cortex_m::interrupt::disable();
}

/// Sleep until the next interrupt.
#[inline]
pub fn wait_for_interrupt() {
    cortex_m::asm::wfi();
}

/// Make the scheduler run at the earliest possible instant by pending the
/// PendSV exception. It fires as soon as no other handler is active —
/// immediately, when called from Thread mode with interrupts enabled.
#[inline]
pub fn force_schedule() {
    // ICSR address: 0xE000_ED04, PENDSVSET = bit 28
    const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
    unsafe {
        core::ptr::write_volatile(ICSR, 1 << 28);
    }
}

// ---------------------------------------------------------------------------
// Task stack preparation
// ---------------------------------------------------------------------------

/// Pre-populate a task's stack with a virtual saved context and park the
/// resulting frame pointer in the descriptor's stack anchor.
///
/// The first time the scheduler picks the task, the context restore pops
/// this frame and execution enters `entry` with a zeroed register file.
///
/// ## Stack Layout (top = high address, growing down)
///
/// ```text
/// [Hardware-stacked frame]
///   xPSR  (Thumb bit set)
///   PC    (task entry point)
///   LR    (task_exit trap)
///   R12, R3, R2, R1, R0   (0)
/// [Software-saved context]
///   R11 … R4              (0)   <- saved_sp after init
/// ```
pub fn init_stack(
    task: &mut TaskDescriptor,
    entry: extern "C" fn() -> !,
    stack: &'static mut [u8],
) {
    let stack_top = stack.as_mut_ptr() as usize + stack.len();
    // Align down to 8 bytes (AAPCS requirement).
    let aligned_top = stack_top & !0x07;

    let frame = (aligned_top - CONTEXT_FRAME_WORDS * 4) as *mut u32;

    unsafe {
        // Software-saved registers r4–r11.
        for word in 0..8 {
            frame.add(word).write(0);
        }

        // Hardware-stacked frame: r0–r3, r12, lr, pc, xPSR.
        for word in 8..13 {
            frame.add(word).write(0);
        }
        frame.add(13).write(task_exit as u32); // LR: trap a returning task
        frame.add(14).write(entry as u32); // PC: task entry point
        frame.add(15).write(0x0100_0000); // xPSR: Thumb bit
    }

    task.saved_sp = frame;
}

/// Trap for tasks that return. Entry functions never return by type, but a
/// corrupted stack could get here; parking on `wfi` beats executing noise.
extern "C" fn task_exit() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

// ---------------------------------------------------------------------------
// PendSV handler (context switch)
// ---------------------------------------------------------------------------

/// PendSV exception handler — the context switch itself.
///
/// 1. Push r4–r11 onto the outgoing task's process stack (skipped for the
///    bootstrap context, which has PSP == 0).
/// 2. Park the resulting PSP in the current task's stack anchor.
/// 3. Run the scheduler; `current_task` may move.
/// 4. Load the new current task's saved PSP, pop r4–r11.
/// 5. Return to Thread mode on PSP; the hardware pops the rest.
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "mrs r0, psp",
        "cbz r0, 1f", // bootstrap context: nothing worth saving
        "stmdb r0!, {{r4-r11}}",
        "1:",
        "bl {park}",
        "bl {switch}",
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",
        "ldr r0, =0xFFFFFFFD", // EXC_RETURN: Thread mode, PSP
        "bx r0",
        park = sym park_current_context,
        switch = sym switch_context,
    );
}

/// Park the outgoing context's stack pointer in the current task's anchor.
/// `psp` is null for the bootstrap context; the write is still harmless.
unsafe extern "C" fn park_current_context(psp: *mut u32) {
    let kernel = crate::kernel::KERNEL_PTR;
    if kernel.is_null() {
        return;
    }
    let current = (*kernel).current_task;
    if !current.is_null() {
        *(*current).stack_anchor() = psp;
    }
}

/// Run the scheduler and hand the new current task's saved stack pointer
/// back to the assembly above (in r0).
unsafe extern "C" fn switch_context() -> *mut u32 {
    let kernel = &mut *crate::kernel::KERNEL_PTR;
    crate::sync::critical_section(|_cs| kernel.schedule());
    (*kernel.current_task).saved_sp
}

// ---------------------------------------------------------------------------
// SysTick handler (kernel tick)
// ---------------------------------------------------------------------------

/// SysTick exception handler — the kernel tick.
///
/// Advances every countdown timer, then pends PendSV so the scheduler runs
/// on the way out of the exception.
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    if crate::kernel::KERNEL_PTR.is_null() {
        return;
    }

    crate::sync::critical_section(|_cs| unsafe {
        let kernel = &mut *crate::kernel::KERNEL_PTR;
        for timer in 0..kernel.timers.len() {
            kernel.tick_timer(timer as u8);
        }
        // The unconditional PendSV below covers any latched request.
        kernel.take_needs_reschedule();
    });

    force_schedule();
}

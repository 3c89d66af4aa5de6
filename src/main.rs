//! # Osprey Demo Firmware
//!
//! A three-task demonstration of the kernel services, in the classic
//! model/view split: a timer-paced sampler produces readings into a shared
//! journal, a reporter consumes them, and the idle task sleeps whenever
//! neither has work.
//!
//! | Task | Slot | Priority | Resources | Role |
//! |------|------|----------|-----------|------|
//! | `idle_task`     | 0 | 0 | —       | sleep until the next interrupt |
//! | `reporter_task` | 1 | 2 | journal | digest journal entries on demand |
//! | `sampler_task`  | 2 | 3 | journal | take a reading every timer expiry |
//!
//! The sampler arms the countdown timer, waits for its expiry event, writes
//! a reading into the journal under the journal resource, and posts an
//! event to the reporter. The reporter waits on that event and folds the
//! new entries into a running digest, again under the journal resource —
//! the priority ceiling guarantees the two never interleave inside the
//! journal even though the sampler out-prioritizes the reporter.
//!
//! The firmware builds for bare-metal ARM targets; on any other target this
//! binary is a stub so the package still compiles.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::ptr::addr_of_mut;

    use cortex_m_rt::entry;
    use panic_halt as _;

    use osprey::arch::port;
    use osprey::kernel;
    use osprey::task::{EventMask, ResourceMask, TaskDescriptor, TaskId, RESOURCE_NONE};
    use osprey::timer::TimerDescriptor;

    // -----------------------------------------------------------------------
    // System configuration
    // -----------------------------------------------------------------------

    const TASK_IDLE: usize = 0;
    const TASK_REPORTER: usize = 1;
    const TASK_SAMPLER: usize = 2;

    const PRIORITY_IDLE: u8 = 0;
    const PRIORITY_REPORTER: u8 = 2;
    const PRIORITY_SAMPLER: u8 = 3;

    /// Serializes access to `JOURNAL` between sampler and reporter.
    const RESOURCE_JOURNAL: ResourceMask = 0x01;

    /// Posted to the sampler by its countdown timer.
    const EVENT_SAMPLE: EventMask = 0x01;
    /// Posted to the reporter when fresh readings are in the journal.
    const EVENT_REPORT: EventMask = 0x02;

    const TIMER_SAMPLE: u8 = 0;
    /// Sampling period in kernel ticks (20 Hz tick → 500 ms).
    const SAMPLE_PERIOD_TICKS: u8 = 10;

    /// Stack sizing is the usual educated guess: context frame plus call
    /// depth plus slack. Increase first when a task misbehaves mysteriously.
    const STACK_SIZE: usize = 512;

    // -----------------------------------------------------------------------
    // Descriptor tables and stacks
    // -----------------------------------------------------------------------

    static mut TASKS: [TaskDescriptor; 3] = [
        TaskDescriptor::new(PRIORITY_IDLE, RESOURCE_NONE),
        TaskDescriptor::new(PRIORITY_REPORTER, RESOURCE_JOURNAL),
        TaskDescriptor::new(PRIORITY_SAMPLER, RESOURCE_JOURNAL),
    ];

    static mut TIMERS: [TimerDescriptor; 1] =
        [TimerDescriptor::new(TASK_SAMPLER as TaskId, EVENT_SAMPLE)];

    static mut IDLE_STACK: [u8; STACK_SIZE] = [0; STACK_SIZE];
    static mut REPORTER_STACK: [u8; STACK_SIZE] = [0; STACK_SIZE];
    static mut SAMPLER_STACK: [u8; STACK_SIZE] = [0; STACK_SIZE];

    // -----------------------------------------------------------------------
    // Shared journal (guarded by RESOURCE_JOURNAL)
    // -----------------------------------------------------------------------

    struct Journal {
        readings: [u8; 8],
        head: usize,
        digest: u32,
    }

    static mut JOURNAL: Journal = Journal {
        readings: [0; 8],
        head: 0,
        digest: 0,
    };

    // -----------------------------------------------------------------------
    // Task bodies
    // -----------------------------------------------------------------------

    /// Takes one synthetic reading per timer expiry and hands it to the
    /// reporter. Owns the pacing timer.
    extern "C" fn sampler_task() -> ! {
        let mut reading: u8 = 0;

        loop {
            kernel::set_timer(TIMER_SAMPLE, SAMPLE_PERIOD_TICKS);
            kernel::wait_events(EVENT_SAMPLE);
            kernel::clear_events(EVENT_SAMPLE);

            // Stand-in for a real sensor reading.
            reading = reading.wrapping_add(7);

            kernel::get_resources(RESOURCE_JOURNAL);
            // SAFETY: RESOURCE_JOURNAL is held; every task touching JOURNAL
            // declares it, so the scheduler keeps them off the CPU.
            unsafe {
                let journal = &mut *addr_of_mut!(JOURNAL);
                journal.readings[journal.head % journal.readings.len()] = reading;
                journal.head = journal.head.wrapping_add(1);
            }
            kernel::release_resources(RESOURCE_JOURNAL);

            kernel::set_event(TASK_REPORTER as TaskId, EVENT_REPORT);
        }
    }

    /// Folds new readings into a running digest whenever the sampler says
    /// there are some.
    extern "C" fn reporter_task() -> ! {
        loop {
            kernel::wait_events(EVENT_REPORT);
            kernel::clear_events(EVENT_REPORT);

            kernel::get_resources(RESOURCE_JOURNAL);
            // SAFETY: RESOURCE_JOURNAL is held, as above.
            unsafe {
                let journal = &mut *addr_of_mut!(JOURNAL);
                let mut digest = journal.digest;
                for &reading in journal.readings.iter() {
                    digest = digest.rotate_left(3) ^ u32::from(reading);
                }
                journal.digest = digest;
            }
            kernel::release_resources(RESOURCE_JOURNAL);
        }
    }

    /// Runs when nothing else can. Keeps the core asleep between ticks.
    extern "C" fn idle_task() -> ! {
        loop {
            port::wait_for_interrupt();
        }
    }

    // -----------------------------------------------------------------------
    // Entry point
    // -----------------------------------------------------------------------

    #[entry]
    fn main() -> ! {
        // SAFETY: single-threaded reset context; interrupts are not enabled
        // until start_os, so nothing else can observe these statics yet.
        unsafe {
            let tasks = &mut *addr_of_mut!(TASKS);

            port::init_stack(
                &mut tasks[TASK_IDLE],
                idle_task,
                &mut *addr_of_mut!(IDLE_STACK),
            );
            port::init_stack(
                &mut tasks[TASK_REPORTER],
                reporter_task,
                &mut *addr_of_mut!(REPORTER_STACK),
            );
            port::init_stack(
                &mut tasks[TASK_SAMPLER],
                sampler_task,
                &mut *addr_of_mut!(SAMPLER_STACK),
            );
        }

        let tasks = unsafe { &mut (*addr_of_mut!(TASKS))[..] };
        let timers = unsafe { &mut (*addr_of_mut!(TIMERS))[..] };

        kernel::start_os(tasks, timers)
    }
}

/// The firmware only makes sense on a bare-metal target; build with e.g.
/// `--target thumbv7em-none-eabihf` for a flashable image.
#[cfg(not(target_os = "none"))]
fn main() {}

//! # Timer Service
//!
//! A fixed table of countdown timers. Arming a timer writes its tick count;
//! the periodic kernel tick decrements every active timer, and a timer that
//! reaches zero posts its configured event to its configured owner task.
//! Expired timers stay inert until re-armed; arming with zero disarms.
//!
//! The kernel assumes nothing about absolute time — a tick is whatever
//! cadence the port's periodic interrupt delivers.

use crate::scheduler::Kernel;
use crate::task::{EventMask, TaskId};

/// Timer identifier: the timer's index in the table handed to `start_os`.
pub type TimerId = u8;

/// Descriptor of a single countdown timer. One per timer, fixed at startup.
pub struct TimerDescriptor {
    /// Remaining ticks until expiry. Zero means inactive. Mutable from both
    /// interrupt and task contexts (always under the kernel critical
    /// section).
    pub value: u8,

    /// Task the expiry event is delivered to. Immutable.
    pub owner_task: TaskId,

    /// Event bit posted to the owner on expiry. Immutable.
    pub event: EventMask,
}

impl TimerDescriptor {
    /// An inactive timer delivering `event` to `owner_task` on expiry.
    pub const fn new(owner_task: TaskId, event: EventMask) -> Self {
        Self {
            value: 0,
            owner_task,
            event,
        }
    }
}

impl<'k> Kernel<'k> {
    /// Arm (or, with 0, disarm) a timer.
    pub fn set_timer(&mut self, timer: TimerId, value: u8) {
        self.timers[timer as usize].value = value;
    }

    /// Advance one timer by one tick. Inactive timers are ignored; a timer
    /// that reaches zero posts its expiry event.
    pub fn tick_timer(&mut self, timer: TimerId) {
        let index = timer as usize;

        if self.timers[index].value == 0 {
            return;
        }

        self.timers[index].value -= 1;

        if self.timers[index].value == 0 {
            let owner = self.timers[index].owner_task;
            let event = self.timers[index].event;
            self.set_event(owner, event);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskDescriptor, TaskState, RESOURCE_NONE};

    fn kernel_with<'k>(
        tasks: &'k mut [TaskDescriptor],
        timers: &'k mut [TimerDescriptor],
    ) -> Kernel<'k> {
        let mut kernel = Kernel::new(tasks, timers);
        kernel.schedule();
        kernel
    }

    #[test]
    fn test_expiry_posts_event_then_goes_inert() {
        let mut tasks = [
            TaskDescriptor::new(0, RESOURCE_NONE),
            TaskDescriptor::new(1, RESOURCE_NONE),
        ];
        let mut timers = [TimerDescriptor::new(1, 0x02)];
        let mut kernel = kernel_with(&mut tasks, &mut timers);

        kernel.set_timer(0, 3);

        kernel.tick_timer(0);
        kernel.tick_timer(0);
        assert_eq!(kernel.tasks[1].events, 0);

        kernel.tick_timer(0);
        assert_eq!(kernel.tasks[1].events & 0x02, 0x02);

        // A further tick on the expired timer posts nothing new.
        kernel.tasks[1].events = 0;
        kernel.tick_timer(0);
        assert_eq!(kernel.tasks[1].events, 0);
    }

    #[test]
    fn test_arming_with_zero_disarms() {
        let mut tasks = [
            TaskDescriptor::new(0, RESOURCE_NONE),
            TaskDescriptor::new(1, RESOURCE_NONE),
        ];
        let mut timers = [TimerDescriptor::new(1, 0x01)];
        let mut kernel = kernel_with(&mut tasks, &mut timers);

        kernel.set_timer(0, 5);
        kernel.set_timer(0, 0);

        for _ in 0..8 {
            kernel.tick_timer(0);
        }
        assert_eq!(kernel.tasks[1].events, 0);
    }

    #[test]
    fn test_expiry_wakes_waiting_owner() {
        let mut tasks = [
            TaskDescriptor::new(0, RESOURCE_NONE),
            TaskDescriptor::new(2, RESOURCE_NONE),
        ];
        let mut timers = [TimerDescriptor::new(1, 0x04)];
        let mut kernel = kernel_with(&mut tasks, &mut timers);
        assert_eq!(kernel.current_task_index, 1);

        kernel.set_timer(0, 2);
        assert!(kernel.wait_events(0x04));
        assert!(kernel.take_needs_reschedule());
        kernel.schedule();
        assert_eq!(kernel.current_task_index, 0);

        kernel.tick_timer(0);
        assert_eq!(kernel.tasks[1].state, TaskState::Waiting);

        kernel.tick_timer(0);
        assert_eq!(kernel.tasks[1].state, TaskState::Ready);
        assert!(kernel.take_needs_reschedule());

        kernel.schedule();
        assert_eq!(kernel.current_task_index, 1);
        assert_eq!(kernel.get_events() & 0x04, 0x04);
    }

    #[test]
    fn test_one_tick_timer_fires_immediately() {
        let mut tasks = [
            TaskDescriptor::new(0, RESOURCE_NONE),
            TaskDescriptor::new(1, RESOURCE_NONE),
        ];
        let mut timers = [TimerDescriptor::new(1, 0x01)];
        let mut kernel = kernel_with(&mut tasks, &mut timers);

        kernel.set_timer(0, 1);
        kernel.tick_timer(0);
        assert_eq!(kernel.tasks[1].events & 0x01, 0x01);
    }
}

//! # Event Service
//!
//! Per-task event flags: eight bits per task, owned by that task. Any task
//! or interrupt may post events to any task; clearing, reading, and waiting
//! are restricted to the owner (the current task).
//!
//! Posting an event to a task whose wait mask it satisfies moves that task
//! to `Ready`; if the woken task out-prioritizes the caller, the reschedule
//! latch is set so the switch happens on the earliest possible tick.
//!
//! Waiting does not clear satisfied bits. A woken task must `clear_events`
//! explicitly, or its next wait on the same mask returns immediately.

use crate::scheduler::Kernel;
use crate::task::{EventMask, TaskId, TaskState};

impl<'k> Kernel<'k> {
    /// Post the events in `mask` to `task`.
    ///
    /// If the target's accumulated wait mask now intersects its pending
    /// events it is moved to `Ready`; a wake of a task with higher priority
    /// than the caller latches a reschedule.
    pub fn set_event(&mut self, task: TaskId, mask: EventMask) {
        let target = task as usize;

        self.tasks[target].events |= mask;

        // Wake on any overlap between pending events and the wait mask, not
        // just the bits posted right now — the wait mask accumulates.
        if self.tasks[target].wait_mask & self.tasks[target].events != 0 {
            self.tasks[target].state = TaskState::Ready;

            if self.tasks[target].priority
                > self.tasks[self.current_task_index].priority
            {
                self.needs_reschedule = true;
            }
        }
    }

    /// Clear the events in `mask` from the current task. Owner-only.
    pub fn clear_events(&mut self, mask: EventMask) {
        self.current_mut().events &= !mask;
    }

    /// Pending events of the current task. Owner-only.
    pub fn get_events(&self) -> EventMask {
        self.current().events
    }

    /// Mark the current task as waiting for any bit in `mask`.
    ///
    /// Returns `true` when none of the awaited bits is pending yet: the task
    /// has been moved to `Waiting` and a reschedule latched, and the caller
    /// must block until a post makes it `Ready` again. Returns `false` when
    /// at least one awaited bit is already set — the caller continues
    /// immediately.
    pub fn wait_events(&mut self, mask: EventMask) -> bool {
        let current = self.current_mut();

        current.wait_mask |= mask;

        if current.events & mask == 0 {
            current.state = TaskState::Waiting;
            self.needs_reschedule = true;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

//! # Scheduler
//!
//! The scheduling core: the [`Kernel`] state record and the task-selection
//! pass that runs on every kernel tick (and on every forced reschedule).
//!
//! ## Scheduling Algorithm
//!
//! `schedule()` runs to completion with interrupts implicitly masked (it is
//! only ever invoked from the context-switch handler or with the kernel
//! critical section held):
//!
//! 1. Scan the task table for the highest-priority task that is `Ready` and
//!    whose declared resources are all free. Priorities are unique, so there
//!    are no ties to break. If nothing qualifies the idle task (slot 0,
//!    priority 0, no resources) is the candidate.
//! 2. If the current task left the `Running` state on its own (yielded into
//!    a wait, or was marked `Ready` by an event post), hand over without
//!    touching its state — whoever moved it owns that transition.
//! 3. If the current task is still `Running`, preempt it only when the
//!    candidate's priority is strictly higher.
//!
//! ## Priority Ceiling
//!
//! The eligibility test in step 1 is the whole priority-ceiling protocol:
//! a task whose `required_resources` intersect the occupied bitmap is never
//! dispatched, so the holder of a resource can never be preempted by a
//! competitor for it, regardless of priority. No per-task ownership is
//! tracked anywhere — the single global bitmap is load-bearing.

use crate::task::{ResourceMask, TaskDescriptor, TaskState, RESOURCE_NONE};
use crate::timer::TimerDescriptor;
use core::ptr;

/// Index of the idle task in the task table, by convention.
pub const IDLE_TASK: usize = 0;

// ---------------------------------------------------------------------------
// Kernel state
// ---------------------------------------------------------------------------

/// The entire mutable kernel state: the application's descriptor tables plus
/// the three scheduling globals. A single instance lives in `kernel.rs` for
/// the lifetime of the system; tests build short-lived instances over local
/// tables.
pub struct Kernel<'k> {
    /// Task table, indexed by task id. Slot 0 is the idle task.
    pub tasks: &'k mut [TaskDescriptor],

    /// Countdown timer table, indexed by timer id.
    pub timers: &'k mut [TimerDescriptor],

    /// Descriptor whose stack anchor the context switch reads and writes.
    /// Points at the bootstrap descriptor until the first scheduler pass.
    pub current_task: *mut TaskDescriptor,

    /// Index of the current task in `tasks`. Kept alongside the pointer so
    /// services never rescan the table to identify the caller.
    pub current_task_index: usize,

    /// Bitmap of all currently-held resources, across all tasks combined.
    pub resources_occupied: ResourceMask,

    /// Latched by services whenever a higher-priority task may have become
    /// eligible. The API layer drains it into `arch::port::force_schedule`.
    pub needs_reschedule: bool,
}

// Safety: the embedded pointer refers to a descriptor with static lifetime
// (the bootstrap descriptor or a table entry). All access happens inside
// critical sections or from non-nesting interrupt handlers.
unsafe impl<'k> Send for Kernel<'k> {}

impl<'k> Kernel<'k> {
    /// Wire the application's descriptor tables into a kernel instance.
    ///
    /// `current_task` starts null; `start_os` points it at the bootstrap
    /// descriptor before the tick source is started.
    pub fn new(
        tasks: &'k mut [TaskDescriptor],
        timers: &'k mut [TimerDescriptor],
    ) -> Self {
        Self {
            tasks,
            timers,
            current_task: ptr::null_mut(),
            current_task_index: IDLE_TASK,
            resources_occupied: RESOURCE_NONE,
            needs_reschedule: false,
        }
    }

    /// Shared view of the current task's descriptor.
    #[inline]
    pub fn current(&self) -> &TaskDescriptor {
        &self.tasks[self.current_task_index]
    }

    /// Mutable view of the current task's descriptor.
    #[inline]
    pub fn current_mut(&mut self) -> &mut TaskDescriptor {
        &mut self.tasks[self.current_task_index]
    }

    /// Drain the reschedule latch.
    #[inline]
    pub fn take_needs_reschedule(&mut self) -> bool {
        core::mem::take(&mut self.needs_reschedule)
    }

    /// Candidate scan: highest-priority `Ready` task whose declared
    /// resources are all free.
    ///
    /// The scan starts from no candidate rather than from "priority 0" so an
    /// ineligible priority-0 slot can never shadow the search; the idle task
    /// always qualifies and is the fallback. Among equal priorities (a
    /// configuration error) the lowest index wins, deterministically.
    fn pick_next(&self) -> usize {
        let mut best: Option<usize> = None;

        for (index, task) in self.tasks.iter().enumerate() {
            if !task.is_dispatchable(self.resources_occupied) {
                continue;
            }
            match best {
                Some(found) if self.tasks[found].priority >= task.priority => {}
                _ => best = Some(index),
            }
        }

        best.unwrap_or(IDLE_TASK)
    }

    /// Select the next task to run and update the current-task globals.
    ///
    /// Must run with interrupts masked or from interrupt context. Reads the
    /// task table and the occupied-resource bitmap; writes task states and
    /// the current-task pointer/index. Never blocks.
    pub fn schedule(&mut self) {
        let next = self.pick_next();

        match self.tasks[self.current_task_index].state {
            // The current task already left Running (blocked on a wait, or
            // was flipped to Ready by an event post): hand over. Its state
            // belongs to whoever moved it.
            TaskState::Ready | TaskState::Waiting => self.dispatch(next),

            TaskState::Running => {
                if self.tasks[next].priority
                    > self.tasks[self.current_task_index].priority
                {
                    // Preemption.
                    self.tasks[self.current_task_index].state = TaskState::Ready;
                    self.dispatch(next);
                }
                // Otherwise the current task keeps the CPU.
            }
        }
    }

    fn dispatch(&mut self, next: usize) {
        self.tasks[next].state = TaskState::Running;
        self.current_task_index = next;
        self.current_task = &mut self.tasks[next];
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDescriptor;

    fn table<const N: usize>(priorities: [u8; N]) -> [TaskDescriptor; N] {
        priorities.map(|priority| TaskDescriptor::new(priority, RESOURCE_NONE))
    }

    fn running_count(kernel: &Kernel<'_>) -> usize {
        kernel
            .tasks
            .iter()
            .filter(|task| task.state == TaskState::Running)
            .count()
    }

    #[test]
    fn test_first_pass_dispatches_highest_priority() {
        let mut tasks = table([0, 1, 2]);
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        kernel.schedule();

        assert_eq!(kernel.current_task_index, 2);
        assert_eq!(kernel.tasks[2].state, TaskState::Running);
        // The idle task was never Running, so its state is untouched.
        assert_eq!(kernel.tasks[0].state, TaskState::Ready);
        assert_eq!(running_count(&kernel), 1);
        assert!(core::ptr::eq(
            kernel.current_task as *const _,
            &kernel.tasks[2],
        ));
    }

    #[test]
    fn test_higher_priority_ready_preempts() {
        let mut tasks = table([0, 1, 2]);
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        // Only the low-priority task is runnable at first.
        kernel.tasks[2].state = TaskState::Waiting;
        kernel.schedule();
        assert_eq!(kernel.current_task_index, 1);

        // The high-priority task becomes Ready: next pass preempts.
        kernel.tasks[2].state = TaskState::Ready;
        kernel.schedule();
        assert_eq!(kernel.current_task_index, 2);
        assert_eq!(kernel.tasks[1].state, TaskState::Ready);
        assert_eq!(running_count(&kernel), 1);
    }

    #[test]
    fn test_lower_priority_never_preempts() {
        // Scenario: A (prio 1) and B (prio 2) both Ready. One pass picks B;
        // further passes leave B running.
        let mut tasks = table([0, 1, 2]);
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        kernel.schedule();
        assert_eq!(kernel.current_task_index, 2);

        kernel.schedule();
        assert_eq!(kernel.current_task_index, 2);
        assert_eq!(kernel.tasks[2].state, TaskState::Running);
        assert_eq!(kernel.tasks[1].state, TaskState::Ready);
    }

    #[test]
    fn test_waiting_task_is_never_selected() {
        let mut tasks = table([0, 1, 3]);
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        kernel.tasks[2].state = TaskState::Waiting;
        kernel.schedule();

        assert_eq!(kernel.current_task_index, 1);
        assert_eq!(kernel.tasks[2].state, TaskState::Waiting);
    }

    #[test]
    fn test_idle_fallback_when_everything_waits() {
        let mut tasks = table([0, 1, 2]);
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        kernel.tasks[1].state = TaskState::Waiting;
        kernel.tasks[2].state = TaskState::Waiting;
        kernel.schedule();

        assert_eq!(kernel.current_task_index, IDLE_TASK);
        assert_eq!(kernel.tasks[IDLE_TASK].state, TaskState::Running);
    }

    #[test]
    fn test_ceiling_fences_out_competitor() {
        // L (prio 1) holds a resource that H (prio 3) also declares; M
        // (prio 2) declares nothing. H must not be dispatched while the
        // resource is held, M runs instead.
        let mut tasks = [
            TaskDescriptor::new(0, RESOURCE_NONE),
            TaskDescriptor::new(1, 0x01), // L
            TaskDescriptor::new(2, RESOURCE_NONE), // M
            TaskDescriptor::new(3, 0x01), // H
        ];
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        // L is running and holds the resource; H and M are Ready.
        kernel.tasks[3].state = TaskState::Waiting;
        kernel.tasks[2].state = TaskState::Waiting;
        kernel.schedule();
        assert_eq!(kernel.current_task_index, 1);
        kernel.get_resources(0x01);

        kernel.tasks[3].state = TaskState::Ready;
        kernel.tasks[2].state = TaskState::Ready;
        kernel.schedule();
        assert_eq!(kernel.current_task_index, 2);

        // Release: the ceiling lifts and H preempts on the next pass.
        kernel.release_resources(0x01);
        kernel.schedule();
        assert_eq!(kernel.current_task_index, 3);
        assert_eq!(running_count(&kernel), 1);
    }

    #[test]
    fn test_ineligible_priority_zero_slot_never_shadows() {
        // An idle-priority task fenced out by a held resource must not be
        // treated as a provisional candidate.
        let mut tasks = [
            TaskDescriptor::new(0, 0x01),
            TaskDescriptor::new(1, RESOURCE_NONE),
        ];
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);
        kernel.resources_occupied = 0x01;

        kernel.schedule();
        assert_eq!(kernel.current_task_index, 1);
    }

    #[test]
    fn test_equal_priorities_pick_lowest_index() {
        // Unique priorities are a configuration contract; when violated the
        // scheduler is still deterministic and favors the lowest index.
        let mut tasks = table([0, 2, 2]);
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        kernel.schedule();
        assert_eq!(kernel.current_task_index, 1);
    }
}

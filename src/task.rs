//! # Task Model
//!
//! Defines the task descriptor and the three-state task machine. Every task
//! in the system is described by one statically-declared [`TaskDescriptor`];
//! the application hands the whole table to [`crate::kernel::start_os`] once
//! and the set of tasks never changes afterwards.
//!
//! Tasks are identified by their index in that table. Priorities are
//! configured once, must be unique, and slot 0 is the idle task by
//! convention: priority 0, no required resources, so the scheduler can
//! always fall back to it.

use core::ptr;

/// Task identifier: the task's index in the table handed to `start_os`.
pub type TaskId = u8;

/// Bitmask of events. Each task owns up to eight event bits.
pub type EventMask = u8;

/// Bitmask of shared resources. Up to eight resources per system.
pub type ResourceMask = u8;

/// The empty event mask.
pub const EVENT_NONE: EventMask = 0;

/// The empty resource mask.
pub const RESOURCE_NONE: ResourceMask = 0;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Execution state of a task.
///
/// ```text
///   ┌─────────┐      scheduler selects      ┌─────────┐
///   │  Ready  │ ──────────────────────────► │ Running │
///   └─────────┘ ◄────────────────────────── └─────────┘
///        ▲         preempted by higher prio      │
///        │                                       │ wait_events()
///        │      set_event() hits wait_mask       ▼ (no awaited bit set)
///        │                                  ┌─────────┐
///        └───────────────────────────────── │ Waiting │
///                                           └─────────┘
/// ```
///
/// A task never goes `Waiting → Running` directly; it passes through `Ready`
/// and is picked up by the scheduler like any other candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Runnable, waiting for the scheduler to select it.
    Ready,
    /// Currently executing. At most one task is in this state.
    Running,
    /// Blocked in `wait_events` until another context posts an awaited bit.
    Waiting,
}

// ---------------------------------------------------------------------------
// Task descriptor
// ---------------------------------------------------------------------------

/// Descriptor of a single task. One per task, fixed at startup.
///
/// `saved_sp` MUST stay the first field: the context-switch primitives
/// locate the saved-stack-pointer slot through the descriptor address alone,
/// hence the `#[repr(C)]`. [`TaskDescriptor::stack_anchor`] exposes the slot
/// explicitly for the port layer.
#[repr(C)]
pub struct TaskDescriptor {
    /// Saved stack pointer, parked here whenever the task is switched out.
    /// Before the first dispatch it points at the virtual context built by
    /// `arch::port::init_stack`.
    pub saved_sp: *mut u32,

    /// Current state in the task machine.
    pub state: TaskState,

    /// Currently-set events owned by this task.
    pub events: EventMask,

    /// Events this task is waiting on. Accumulates across waits; satisfied
    /// bits are not cleared automatically.
    pub wait_mask: EventMask,

    /// Every resource this task may ever acquire. Immutable; the scheduler
    /// uses it for the priority-ceiling eligibility test.
    pub required_resources: ResourceMask,

    /// Configured priority. Must be unique across all tasks; higher wins.
    pub priority: u8,
}

// Safety: the raw pointer is the task's own saved-stack-pointer slot value.
// Descriptors are only ever mutated inside critical sections or from the
// tick/switch interrupt handlers, which cannot nest.
unsafe impl Send for TaskDescriptor {}
unsafe impl Sync for TaskDescriptor {}

impl TaskDescriptor {
    /// Descriptor for a task with the given priority and declared resource
    /// needs. Starts `Ready` with no events pending; the stack anchor is
    /// filled in by `arch::port::init_stack` before `start_os`.
    pub const fn new(priority: u8, required_resources: ResourceMask) -> Self {
        Self {
            saved_sp: ptr::null_mut(),
            state: TaskState::Ready,
            events: EVENT_NONE,
            wait_mask: EVENT_NONE,
            required_resources,
            priority,
        }
    }

    /// Descriptor standing in for the pre-multitasking startup context.
    ///
    /// Priority 0 and `Ready`, so the first scheduler pass hands the CPU to
    /// any real task. Its anchor receives the startup stack pointer on the
    /// first switch and is never restored.
    pub const fn bootstrap() -> Self {
        Self::new(0, RESOURCE_NONE)
    }

    /// Address of the slot holding this task's saved stack pointer.
    ///
    /// O(1) from the descriptor — the invariant the context-switch protocol
    /// relies on.
    #[inline]
    pub fn stack_anchor(&mut self) -> *mut *mut u32 {
        &mut self.saved_sp
    }

    /// Ready and not fenced out by the resource ceiling: the scheduler may
    /// dispatch this task while `occupied` resources are held.
    #[inline]
    pub fn is_dispatchable(&self, occupied: ResourceMask) -> bool {
        self.state == TaskState::Ready && self.required_resources & occupied == 0
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_descriptor_defaults() {
        let task = TaskDescriptor::new(3, 0x05);
        assert!(task.saved_sp.is_null());
        assert_eq!(task.state, TaskState::Ready);
        assert_eq!(task.events, EVENT_NONE);
        assert_eq!(task.wait_mask, EVENT_NONE);
        assert_eq!(task.required_resources, 0x05);
        assert_eq!(task.priority, 3);
    }

    #[test]
    fn test_bootstrap_descriptor() {
        let boot = TaskDescriptor::bootstrap();
        assert_eq!(boot.priority, 0);
        assert_eq!(boot.state, TaskState::Ready);
        assert_eq!(boot.required_resources, RESOURCE_NONE);
    }

    #[test]
    fn test_stack_anchor_is_first_field() {
        // The context switch finds the saved-SP slot at offset 0 of the
        // descriptor; a layout change here breaks every port.
        assert_eq!(core::mem::offset_of!(TaskDescriptor, saved_sp), 0);

        let mut task = TaskDescriptor::new(1, RESOURCE_NONE);
        let anchor = task.stack_anchor();
        assert_eq!(anchor as usize, &task as *const _ as usize);
    }

    #[test]
    fn test_dispatchability_under_ceiling() {
        let mut task = TaskDescriptor::new(2, 0x03);

        assert!(task.is_dispatchable(RESOURCE_NONE));
        // Any overlap with held resources fences the task out.
        assert!(!task.is_dispatchable(0x01));
        assert!(!task.is_dispatchable(0x02));
        // Held resources the task never declared do not affect it.
        assert!(task.is_dispatchable(0x04));

        task.state = TaskState::Waiting;
        assert!(!task.is_dispatchable(RESOURCE_NONE));
        task.state = TaskState::Running;
        assert!(!task.is_dispatchable(RESOURCE_NONE));
    }
}

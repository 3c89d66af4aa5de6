//! # Resource Service
//!
//! Shared-resource serialization without blocking: resources are abstract
//! labels packed into one system-wide bitmap, and acquiring one simply sets
//! its bit. Mutual exclusion falls out of the scheduler's eligibility test —
//! no task whose declared `required_resources` intersect the occupied bitmap
//! is ever dispatched while the bits are set (the priority ceiling).
//!
//! The kernel tracks no per-task ownership, and that is deliberate: the
//! single bitmap plus the declaration-time `required_resources` masks are
//! what makes the ceiling work. Correctness therefore rests on two
//! configuration-time contracts the kernel does not verify:
//!
//! - every task that may ever touch the protected data declares the
//!   corresponding bits in its descriptor;
//! - acquire/release pairs nest strictly (LIFO), and a task never waits on
//!   events while holding a resource.

use crate::scheduler::Kernel;
use crate::task::ResourceMask;

impl<'k> Kernel<'k> {
    /// Mark the resources in `mask` as held. Never blocks; the scheduler
    /// refuses to dispatch competitors while the bits are set.
    pub fn get_resources(&mut self, mask: ResourceMask) {
        self.resources_occupied |= mask;
    }

    /// Mark the resources in `mask` as free and latch a reschedule — a task
    /// fenced out by the ceiling may now be the highest-priority candidate.
    pub fn release_resources(&mut self, mask: ResourceMask) {
        self.resources_occupied &= !mask;
        self.needs_reschedule = true;
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskDescriptor, RESOURCE_NONE};
    use crate::timer::TimerDescriptor;

    #[test]
    fn test_acquire_release_round_trip() {
        let mut tasks = [TaskDescriptor::new(0, RESOURCE_NONE)];
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);
        kernel.resources_occupied = 0x10;

        kernel.get_resources(0x03);
        assert_eq!(kernel.resources_occupied, 0x13);

        kernel.release_resources(0x03);
        assert_eq!(kernel.resources_occupied, 0x10);
    }

    #[test]
    fn test_release_clears_only_named_bits() {
        let mut tasks = [TaskDescriptor::new(0, RESOURCE_NONE)];
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        kernel.get_resources(0x07);
        kernel.release_resources(0x02);
        assert_eq!(kernel.resources_occupied, 0x05);
        assert_eq!(kernel.resources_occupied & 0x02, 0);
    }

    #[test]
    fn test_release_latches_reschedule() {
        let mut tasks = [TaskDescriptor::new(0, RESOURCE_NONE)];
        let mut timers: [TimerDescriptor; 0] = [];
        let mut kernel = Kernel::new(&mut tasks, &mut timers);

        kernel.get_resources(0x01);
        assert!(!kernel.needs_reschedule);

        kernel.release_resources(0x01);
        assert!(kernel.take_needs_reschedule());
    }
}

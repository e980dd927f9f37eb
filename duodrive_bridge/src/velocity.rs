//! Velocity change detection.
//!
//! Each axis keeps the value it was last commanded (written by the
//! application) and the value it last published on the bus. A check swaps
//! the candidate into the published slot and reports whether it differed,
//! so one change yields exactly one transmission request.

use duodrive_common::axis::AxisId;
use duodrive_common::consts::AXIS_COUNT;
use duodrive_common::od::EventHandle;
use std::sync::atomic::{AtomicI32, Ordering};

/// Requests an immediate, out-of-schedule transmission of the frame carrying
/// a dictionary entry.
pub trait EventTrigger {
    /// Ask the transport to send the frame mapping `handle`/`sub_index` now.
    fn request_event_transmission(&self, handle: EventHandle, sub_index: u8);
}

impl<T: EventTrigger + ?Sized> EventTrigger for &T {
    fn request_event_transmission(&self, handle: EventHandle, sub_index: u8) {
        (**self).request_event_transmission(handle, sub_index);
    }
}

/// Per-axis commanded and last-published velocities.
#[derive(Debug, Default)]
pub struct VelocityStore {
    commanded: [AtomicI32; AXIS_COUNT],
    published: [AtomicI32; AXIS_COUNT],
}

impl VelocityStore {
    /// All values start at zero.
    pub const fn new() -> Self {
        Self {
            commanded: [const { AtomicI32::new(0) }; AXIS_COUNT],
            published: [const { AtomicI32::new(0) }; AXIS_COUNT],
        }
    }

    /// Store `candidate` as last published; `true` when it differs from the
    /// previous value.
    #[inline]
    pub fn check(&self, axis: AxisId, candidate: i32) -> bool {
        self.published[axis.index()].swap(candidate, Ordering::AcqRel) != candidate
    }

    /// Last value that passed through [`check`](Self::check).
    #[inline]
    pub fn published(&self, axis: AxisId) -> i32 {
        self.published[axis.index()].load(Ordering::Acquire)
    }

    /// Set the velocity the application wants on the bus.
    #[inline]
    pub fn set_commanded(&self, axis: AxisId, velocity: i32) {
        self.commanded[axis.index()].store(velocity, Ordering::Release);
    }

    /// Velocity the application last commanded.
    #[inline]
    pub fn commanded(&self, axis: AxisId) -> i32 {
        self.commanded[axis.index()].load(Ordering::Acquire)
    }
}

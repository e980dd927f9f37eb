//! Statusword decoding and per-axis status storage.
//!
//! The statusword is stored bit-exact (reserved and manufacturer bits
//! included) and the lifecycle state derived from it is stored next to it.
//! Both are overwritten on every report; nothing survives the process.

use bitflags::bitflags;
use duodrive_common::axis::AxisId;
use duodrive_common::consts::AXIS_COUNT;
use static_assertions::const_assert_eq;
use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};

bitflags! {
    /// CiA 402 statusword (6041h).
    ///
    /// Bits 12-13 (operation-mode specific) and 14-15 (manufacturer specific)
    /// are 2-bit groups read through accessors rather than flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DriveStatus: u16 {
        /// bit 0: Ready to switch on.
        const READY_TO_SWITCH_ON    = 0x0001;
        /// bit 1: Switched on.
        const SWITCHED_ON           = 0x0002;
        /// bit 2: Operation enabled.
        const OPERATION_ENABLED     = 0x0004;
        /// bit 3: Fault.
        const FAULT                 = 0x0008;
        /// bit 4: Voltage enabled.
        const VOLTAGE_ENABLED       = 0x0010;
        /// bit 5: Quick stop.
        const QUICK_STOP            = 0x0020;
        /// bit 6: Switch on disabled.
        const SWITCH_ON_DISABLED    = 0x0040;
        /// bit 7: Warning.
        const WARNING               = 0x0080;
        /// bit 8: Manufacturer specific.
        const MANUFACTURER_SPECIFIC = 0x0100;
        /// bit 9: Remote.
        const REMOTE                = 0x0200;
        /// bit 10: Target reached.
        const TARGET_REACHED        = 0x0400;
        /// bit 11: Internal limit active.
        const INTERNAL_LIMIT_ACTIVE = 0x0800;
    }
}

const_assert_eq!(core::mem::size_of::<DriveStatus>(), 2);

impl DriveStatus {
    /// Keep every received bit, named or not.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Operation-mode specific group (bits 12-13).
    #[inline]
    pub const fn operation_mode_specific(&self) -> u8 {
        ((self.bits() >> 12) & 0b11) as u8
    }

    /// Manufacturer specific group (bits 14-15).
    #[inline]
    pub const fn manufacturer_group(&self) -> u8 {
        ((self.bits() >> 14) & 0b11) as u8
    }
}

impl Default for DriveStatus {
    fn default() -> Self {
        Self::empty()
    }
}

/// Lifecycle state of a drive as reported by its statusword.
///
/// Only the bring-up path is modeled; fault and quick-stop states fall into
/// `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DriveLifecycleState {
    /// No relevant bit set (initial value before the first report).
    #[default]
    Unknown = 0,
    /// Switch on disabled.
    SwitchOnDisabled = 1,
    /// Ready to switch on.
    ReadyToSwitchOn = 2,
    /// Switched on.
    SwitchedOn = 3,
    /// Operation enabled.
    OperationEnabled = 4,
}

impl DriveLifecycleState {
    /// Derive the state from a statusword, most advanced bit first.
    pub const fn from_status(status: DriveStatus) -> Self {
        if status.contains(DriveStatus::OPERATION_ENABLED) {
            Self::OperationEnabled
        } else if status.contains(DriveStatus::SWITCHED_ON) {
            Self::SwitchedOn
        } else if status.contains(DriveStatus::READY_TO_SWITCH_ON) {
            Self::ReadyToSwitchOn
        } else if status.contains(DriveStatus::SWITCH_ON_DISABLED) {
            Self::SwitchOnDisabled
        } else {
            Self::Unknown
        }
    }

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::SwitchOnDisabled),
            2 => Some(Self::ReadyToSwitchOn),
            3 => Some(Self::SwitchedOn),
            4 => Some(Self::OperationEnabled),
            _ => None,
        }
    }
}

/// Per-axis storage of the last received statusword and its decoded state.
///
/// Written only from the receive path; reads may happen from anywhere.
#[derive(Debug, Default)]
pub struct StatusStore {
    raw: [AtomicU16; AXIS_COUNT],
    lifecycle: [AtomicU8; AXIS_COUNT],
}

impl StatusStore {
    /// Empty store: all statuswords zero, all states `Unknown`.
    pub const fn new() -> Self {
        Self {
            raw: [const { AtomicU16::new(0) }; AXIS_COUNT],
            lifecycle: [const { AtomicU8::new(DriveLifecycleState::Unknown as u8) }; AXIS_COUNT],
        }
    }

    /// Overwrite the axis' statusword and return the decoded state.
    #[inline]
    pub fn store(&self, axis: AxisId, status: DriveStatus) -> DriveLifecycleState {
        let state = DriveLifecycleState::from_status(status);
        let i = axis.index();
        self.raw[i].store(status.bits(), Ordering::Release);
        self.lifecycle[i].store(state as u8, Ordering::Release);
        state
    }

    /// Most recent statusword of the axis.
    #[inline]
    pub fn status(&self, axis: AxisId) -> DriveStatus {
        DriveStatus::from_raw(self.raw[axis.index()].load(Ordering::Acquire))
    }

    /// Most recent decoded state of the axis.
    #[inline]
    pub fn lifecycle(&self, axis: AxisId) -> DriveLifecycleState {
        DriveLifecycleState::from_u8(self.lifecycle[axis.index()].load(Ordering::Acquire))
            .unwrap_or_default()
    }
}

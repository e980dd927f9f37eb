//! Object dictionary addressing and hook status codes.
//!
//! This module defines:
//! - Communication-profile indices used during network start-up
//! - `DriveEntry` - the four drive-profile entries the bridge hooks into
//! - `EntryContext` - the per-entry identity handed to every hook call
//! - `PdoMapping` - the 32-bit PDO mapping word encoding
//! - `OdStatus` - status code returned from hooks and setters to the transport

use crate::axis::{AxisId, NodeId};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::fmt;

// ─── Communication Profile Indices ──────────────────────────────────

/// COB-ID of the SYNC message.
pub const IDX_SYNC_COB_ID: u16 = 0x1005;
/// Communication cycle period (µs).
pub const IDX_COMM_CYCLE_PERIOD: u16 = 0x1006;
/// First RPDO communication parameter record.
pub const IDX_RPDO_COMM_BASE: u16 = 0x1400;
/// First RPDO mapping parameter record.
pub const IDX_RPDO_MAP_BASE: u16 = 0x1600;
/// First TPDO communication parameter record.
pub const IDX_TPDO_COMM_BASE: u16 = 0x1800;
/// First TPDO mapping parameter record.
pub const IDX_TPDO_MAP_BASE: u16 = 0x1A00;
/// Manufacturer entry holding the commanded velocity per axis (sub 1 = right, 2 = left).
pub const IDX_VELOCITY_COMMAND: u16 = 0x2000;

/// Sub-index of `axis` in the velocity command entry.
#[inline]
pub const fn velocity_command_sub(axis: AxisId) -> u8 {
    axis.index() as u8 + 1
}

/// PDO communication record sub-indices.
pub mod pdo_sub {
    /// Number of mapped objects (mapping records only).
    pub const COUNT: u8 = 0;
    /// COB-ID used by the PDO.
    pub const COB_ID: u8 = 1;
    /// Transmission type.
    pub const TRANSMISSION_TYPE: u8 = 2;
    /// Inhibit time (100 µs units).
    pub const INHIBIT_TIME: u8 = 3;
    /// Event timer (ms).
    pub const EVENT_TIMER: u8 = 5;
}

// ─── Drive Profile Entries ──────────────────────────────────────────

/// Drive-profile entries the bridge attaches extensions to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum DriveEntry {
    /// Controlword (u16), read by the transport when assembling a command frame.
    ControlWord = 0x6040,
    /// Statusword (u16), written by the transport on frame arrival.
    StatusWord = 0x6041,
    /// Position actual value (i32), written by the transport on frame arrival.
    PositionActual = 0x6064,
    /// Target velocity (i32), read by the transport when assembling a command frame.
    TargetVelocity = 0x60FF,
}

impl DriveEntry {
    /// All hooked entries, in start-up attach order.
    pub const ALL: [DriveEntry; 4] = [
        DriveEntry::StatusWord,
        DriveEntry::PositionActual,
        DriveEntry::ControlWord,
        DriveEntry::TargetVelocity,
    ];

    /// Index of the first-axis entry.
    #[inline]
    pub const fn base_index(self) -> u16 {
        self as u16
    }

    /// Index of this entry for an axis whose profile starts at `profile_offset`.
    ///
    /// Wraps on overflow; configurations are checked with
    /// [`checked_index`](Self::checked_index) before use.
    #[inline]
    pub const fn index(self, profile_offset: u16) -> u16 {
        self.base_index().wrapping_add(profile_offset)
    }

    /// Index of this entry at `profile_offset`, or `None` past the end of
    /// the dictionary.
    #[inline]
    pub const fn checked_index(self, profile_offset: u16) -> Option<u16> {
        self.base_index().checked_add(profile_offset)
    }

    /// Width of the entry value in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::ControlWord | Self::StatusWord => 2,
            Self::PositionActual | Self::TargetVelocity => 4,
        }
    }

    /// Width of the entry value in bits (as used in PDO mapping words).
    #[inline]
    pub const fn bit_len(self) -> u8 {
        (self.width() * 8) as u8
    }

    /// Mapping word for sub-index 0 of this entry.
    #[inline]
    pub const fn mapping(self, profile_offset: u16) -> PdoMapping {
        PdoMapping::new(self.index(profile_offset), 0, self.bit_len())
    }
}

impl fmt::Display for DriveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ControlWord => "controlword",
            Self::StatusWord => "statusword",
            Self::PositionActual => "position_actual",
            Self::TargetVelocity => "target_velocity",
        };
        write!(f, "{name}({:04X}h)", self.base_index())
    }
}

/// Opaque per-entry context a transport passes with every hook call.
///
/// Carries the bus identity of the drive the entry belongs to; the bridge
/// resolves it to an axis slot on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryContext {
    /// Bus address of the drive owning the entry.
    pub identity: NodeId,
    /// Which entry this context is attached to.
    pub entry: DriveEntry,
}

impl EntryContext {
    /// Create a context for `entry` of the drive at `identity`.
    pub const fn new(identity: NodeId, entry: DriveEntry) -> Self {
        Self { identity, entry }
    }
}

/// Handle of a dictionary entry whose PDO can be sent on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    /// Dictionary index of the watched entry.
    pub index: u16,
}

// ─── PDO Mapping ────────────────────────────────────────────────────

/// One PDO mapping entry: `index << 16 | sub << 8 | bit_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdoMapping {
    /// Mapped object index.
    pub index: u16,
    /// Mapped object sub-index.
    pub sub: u8,
    /// Mapped length in bits.
    pub bits: u8,
}

impl PdoMapping {
    /// Create a mapping entry.
    pub const fn new(index: u16, sub: u8, bits: u8) -> Self {
        Self { index, sub, bits }
    }

    /// Encode as the 32-bit value stored in a mapping record.
    #[inline]
    pub const fn encode(self) -> u32 {
        ((self.index as u32) << 16) | ((self.sub as u32) << 8) | self.bits as u32
    }

    /// Decode a 32-bit mapping record value.
    #[inline]
    pub const fn decode(raw: u32) -> Self {
        Self {
            index: (raw >> 16) as u16,
            sub: (raw >> 8) as u8,
            bits: raw as u8,
        }
    }
}

// ─── Status Codes ───────────────────────────────────────────────────

/// Result code of a dictionary access, as reported back to the transport.
///
/// Discriminants follow the CANopenNode `ODR_t` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OdStatus {
    /// Access succeeded.
    Ok = 0,
    /// Access type not supported by this entry or hook.
    UnsupportedAccess = 2,
    /// Attempt to write a read-only entry.
    ReadOnly = 4,
    /// Index does not exist in the dictionary.
    NoObject = 5,
    /// Value incompatible with other parameters.
    ParameterIncompatible = 8,
    /// General device incompatibility (unknown identity, missing argument).
    DevIncompat = 9,
    /// Data length does not match the entry width.
    TypeMismatch = 11,
    /// Sub-index does not exist.
    SubNotExist = 14,
}

const_assert_eq!(core::mem::size_of::<OdStatus>(), 1);

impl OdStatus {
    /// Whether the access succeeded.
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for OdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PROFILE_AXIS_STRIDE;

    #[test]
    fn mapping_words_match_drive_profile_layout() {
        assert_eq!(DriveEntry::StatusWord.mapping(0).encode(), 0x6041_0010);
        assert_eq!(DriveEntry::PositionActual.mapping(0).encode(), 0x6064_0020);
        assert_eq!(DriveEntry::ControlWord.mapping(0).encode(), 0x6040_0010);
        assert_eq!(DriveEntry::TargetVelocity.mapping(0).encode(), 0x60FF_0020);
    }

    #[test]
    fn second_axis_profile_is_offset() {
        assert_eq!(DriveEntry::StatusWord.index(PROFILE_AXIS_STRIDE), 0x6841);
        assert_eq!(
            DriveEntry::TargetVelocity.mapping(PROFILE_AXIS_STRIDE).encode(),
            0x68FF_0020
        );
    }

    #[test]
    fn index_past_dictionary_end() {
        assert_eq!(DriveEntry::TargetVelocity.checked_index(0xA000), None);
        assert_eq!(DriveEntry::TargetVelocity.checked_index(0x9800), Some(0xF8FF));
        // Unchecked lookup wraps instead of panicking.
        assert_eq!(DriveEntry::TargetVelocity.index(0xA000), 0x00FF);
    }

    #[test]
    fn velocity_command_subs_follow_axis_order() {
        assert_eq!(velocity_command_sub(AxisId::Right), 1);
        assert_eq!(velocity_command_sub(AxisId::Left), 2);
    }

    #[test]
    fn mapping_decode_inverts_encode() {
        let m = PdoMapping::new(0x2000, 2, 32);
        assert_eq!(PdoMapping::decode(m.encode()), m);
    }

    #[test]
    fn status_codes_use_canopennode_numbering() {
        assert_eq!(OdStatus::Ok as u8, 0);
        assert_eq!(OdStatus::DevIncompat as u8, 9);
        assert!(OdStatus::Ok.is_ok());
        assert!(!OdStatus::DevIncompat.is_ok());
    }

    #[test]
    fn entry_widths() {
        assert_eq!(DriveEntry::StatusWord.width(), 2);
        assert_eq!(DriveEntry::TargetVelocity.bit_len(), 32);
    }
}

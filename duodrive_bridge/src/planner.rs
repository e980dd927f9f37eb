//! Next controlword selection from the stored statusword.
//!
//! Walks a drive along the bring-up path one step per command frame:
//! shutdown, switch on, enable operation. Evaluated on the raw status bits,
//! first match wins.

use crate::status::DriveStatus;
use std::fmt;

/// CiA 402 controlword (6040h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlWord(u16);

impl ControlWord {
    /// Shutdown: switch on disabled → ready to switch on.
    pub const SHUTDOWN: Self = Self(0x0006);
    /// Switch on: ready to switch on → switched on.
    pub const SWITCH_ON: Self = Self(0x0007);
    /// Enable operation: switched on → operation enabled.
    pub const ENABLE_OPERATION: Self = Self(0x000F);

    /// Raw value written to the command frame.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Controlword to send given the last reported status.
///
/// `None` means "leave the outgoing value as it is".
#[inline]
pub const fn plan_control_word(status: DriveStatus) -> Option<ControlWord> {
    if status.contains(DriveStatus::SWITCHED_ON) {
        Some(ControlWord::ENABLE_OPERATION)
    } else if status.contains(DriveStatus::READY_TO_SWITCH_ON) {
        Some(ControlWord::SWITCH_ON)
    } else if status.contains(DriveStatus::SWITCH_ON_DISABLED) {
        Some(ControlWord::SHUTDOWN)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(raw: u16) -> Option<u16> {
        plan_control_word(DriveStatus::from_raw(raw)).map(ControlWord::raw)
    }

    #[test]
    fn decision_table_over_the_low_seven_bits() {
        for raw in 0u16..0x80 {
            let expected = if raw & 0x02 != 0 {
                Some(0x0F)
            } else if raw & 0x01 != 0 {
                Some(0x07)
            } else if raw & 0x40 != 0 {
                Some(0x06)
            } else {
                None
            };
            assert_eq!(plan(raw), expected, "status 0x{raw:04X}");
        }
    }

    #[test]
    fn switched_on_wins_over_everything() {
        assert_eq!(plan(0x0043), Some(0x0F));
        assert_eq!(plan(0xFFFF), Some(0x0F));
    }

    #[test]
    fn operation_enabled_alone_holds() {
        // OE without SO is not a bring-up state; keep the last command.
        assert_eq!(plan(0x0004), None);
    }

    #[test]
    fn high_bits_do_not_influence_the_plan() {
        assert_eq!(plan(0xF000 | 0x0040), Some(0x06));
        assert_eq!(plan(0x0F80), None);
    }

    #[test]
    fn controlword_displays_as_hex() {
        assert_eq!(ControlWord::ENABLE_OPERATION.to_string(), "0x000F");
    }
}

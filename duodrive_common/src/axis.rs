//! Axis slot identity and bus address tokens.
//!
//! `AxisId` names one of the two statically allocated axis slots. `NodeId` is
//! the opaque bus identity a transport hands to the bridge; it only becomes an
//! `AxisId` after resolution through the bridge's registry.

use crate::consts::{AXIS_COUNT, MAX_NODE_ID};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two axis slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum AxisId {
    /// Right drive (slot 0).
    Right = 0,
    /// Left drive (slot 1).
    Left = 1,
}

impl AxisId {
    /// All slots in index order.
    pub const ALL: [AxisId; AXIS_COUNT] = [AxisId::Right, AxisId::Left];

    /// Slot index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert from a slot index. Returns `None` for out-of-range values.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Right),
            1 => Some(Self::Left),
            _ => None,
        }
    }

    /// Lowercase name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
        }
    }

    /// The other slot.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
        }
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bus address of a drive as presented by the transport.
///
/// Any `u8` can be carried; [`NodeId::is_valid`] tells whether it is a
/// legal CANopen node id (1..=127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u8);

impl NodeId {
    /// Wrap a raw bus address.
    #[inline]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw bus address.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Whether this is a configurable node id (1..=127).
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 1 && self.0 <= MAX_NODE_ID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_for_every_slot() {
        for axis in AxisId::ALL {
            assert_eq!(AxisId::from_index(axis.index()), Some(axis));
        }
        assert_eq!(AxisId::from_index(AXIS_COUNT), None);
    }

    #[test]
    fn other_is_an_involution() {
        assert_eq!(AxisId::Right.other(), AxisId::Left);
        assert_eq!(AxisId::Left.other().other(), AxisId::Left);
    }

    #[test]
    fn axis_deserializes_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            axis: AxisId,
        }
        let w: Wrapper = toml::from_str("axis = \"left\"").unwrap();
        assert_eq!(w.axis, AxisId::Left);
        assert!(toml::from_str::<Wrapper>("axis = \"middle\"").is_err());
    }

    #[test]
    fn node_id_validity_bounds() {
        assert!(!NodeId::new(0).is_valid());
        assert!(NodeId::new(1).is_valid());
        assert!(NodeId::new(0x7F).is_valid());
        assert!(!NodeId::new(0x80).is_valid());
    }

    #[test]
    fn node_id_displays_as_hex() {
        assert_eq!(NodeId::new(0x0A).to_string(), "0x0A");
        assert_eq!(AxisId::Right.to_string(), "right");
    }
}

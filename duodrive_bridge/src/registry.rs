//! Bus identity → axis slot resolution.
//!
//! The registry is the only place raw bus addresses are compared. Everything
//! downstream works with [`AxisId`].

use duodrive_common::axis::{AxisId, NodeId};
use duodrive_common::config::BridgeConfig;
use duodrive_common::consts::{AXIS_COUNT, NODE_ID_LEFT, NODE_ID_RIGHT};

use crate::error::{BridgeError, BridgeResult, InvalidArgument};

/// Maps the two configured bus identities onto the two axis slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRegistry {
    /// Bus identity per slot, indexed by `AxisId::index()`.
    nodes: [NodeId; AXIS_COUNT],
}

impl AxisRegistry {
    /// Create a registry from the right and left bus identities.
    ///
    /// # Errors
    /// `InvalidArgument::DuplicateIdentity` if both are equal.
    pub fn new(right: NodeId, left: NodeId) -> BridgeResult<Self> {
        if right == left {
            return Err(InvalidArgument::DuplicateIdentity(right).into());
        }
        Ok(Self {
            nodes: [right, left],
        })
    }

    /// Registry for the stock node ids (right 0x0A, left 0x0B).
    pub const fn stock() -> Self {
        Self {
            nodes: [NodeId::new(NODE_ID_RIGHT), NodeId::new(NODE_ID_LEFT)],
        }
    }

    /// Build from a bridge configuration.
    ///
    /// Slots missing from the configuration keep their stock node id.
    pub fn from_config(config: &BridgeConfig) -> BridgeResult<Self> {
        let stock = Self::stock();
        let node = |axis: AxisId| {
            config
                .axis(axis)
                .map_or(stock.node_id(axis), |a| a.node_id)
        };
        Self::new(node(AxisId::Right), node(AxisId::Left))
    }

    /// Resolve a bus identity to its slot.
    ///
    /// # Errors
    /// `UnknownAxis` if the identity matches neither slot.
    #[inline]
    pub fn resolve(&self, identity: NodeId) -> BridgeResult<AxisId> {
        AxisId::ALL
            .into_iter()
            .find(|axis| self.nodes[axis.index()] == identity)
            .ok_or(BridgeError::UnknownAxis(identity))
    }

    /// Bus identity configured for a slot.
    #[inline]
    pub const fn node_id(&self, axis: AxisId) -> NodeId {
        self.nodes[axis.index()]
    }
}

impl Default for AxisRegistry {
    fn default() -> Self {
        Self::stock()
    }
}

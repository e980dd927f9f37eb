//! Observation channel for bridge activity.
//!
//! The bridge reports what it decoded, planned, relayed and published
//! through an [`EventSink`]. The default sink writes structured `tracing`
//! events; tests substitute a recording sink.

use duodrive_common::axis::{AxisId, NodeId};
use duodrive_common::od::DriveEntry;
use tracing::{debug, info, trace, warn};

use crate::error::BridgeError;
use crate::planner::ControlWord;
use crate::status::{DriveLifecycleState, DriveStatus};

/// Something the bridge did or refused to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEvent {
    /// A statusword was stored for an axis.
    StatusDecoded {
        /// Axis the statusword belongs to.
        axis: AxisId,
        /// Statusword as reported, every bit kept.
        status: DriveStatus,
        /// Lifecycle state derived from it.
        state: DriveLifecycleState,
    },
    /// A controlword was planned (`None` = outgoing value left alone).
    ControlPlanned {
        /// Axis the controlword is for.
        axis: AxisId,
        /// Planned controlword.
        word: Option<ControlWord>,
    },
    /// Position feedback arrived for an axis.
    PositionRelayed {
        /// Axis the position belongs to.
        axis: AxisId,
        /// Position actual value.
        position: i32,
    },
    /// A velocity change was detected and a transmission requested.
    VelocityPublished {
        /// Axis whose velocity changed.
        axis: AxisId,
        /// Newly published velocity.
        velocity: i32,
    },
    /// A supervisory poll found at least one change; published values after it.
    VelocityPoll {
        /// Published velocity of the right axis.
        right: i32,
        /// Published velocity of the left axis.
        left: i32,
    },
    /// An input was rejected; no state was touched.
    Rejected {
        /// Bus identity of the call, when one was supplied.
        identity: Option<NodeId>,
        /// Entry the call was for, when known.
        entry: Option<DriveEntry>,
        /// Why it was rejected.
        error: BridgeError,
    },
}

/// Receiver of [`BridgeEvent`]s.
///
/// Called from the transport's callbacks, so implementations must not block.
pub trait EventSink: Send + Sync {
    /// Record one event.
    fn emit(&self, event: &BridgeEvent);
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: &BridgeEvent) {
        (**self).emit(event);
    }
}

/// Writes events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &BridgeEvent) {
        match *event {
            BridgeEvent::StatusDecoded {
                axis,
                status,
                state,
            } => {
                debug!(%axis, status = format_args!("0x{:04X}", status.bits()), ?state, "statusword");
            }
            BridgeEvent::ControlPlanned { axis, word: Some(word) } => {
                debug!(%axis, %word, "controlword");
            }
            BridgeEvent::ControlPlanned { axis, word: None } => {
                trace!(%axis, "controlword held");
            }
            BridgeEvent::PositionRelayed { axis, position } => {
                trace!(%axis, position, "position");
            }
            BridgeEvent::VelocityPublished { axis, velocity } => {
                debug!(%axis, velocity, "velocity changed");
            }
            BridgeEvent::VelocityPoll { right, left } => {
                info!(right, left, "velocity");
            }
            BridgeEvent::Rejected {
                identity,
                entry,
                error,
            } => {
                warn!(identity = ?identity, entry = ?entry, %error, "rejected");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    #[inline]
    fn emit(&self, _event: &BridgeEvent) {}
}

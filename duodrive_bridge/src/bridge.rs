//! The bridge: two axis slots and the operations on them.
//!
//! All operations take `&self`. Per-axis state is atomics, so one
//! `Arc<DriveBridge>` can serve the transport's receive path and the
//! supervisory poll task at the same time without locking.

use duodrive_common::axis::{AxisId, NodeId};
use duodrive_common::config::BridgeConfig;
use duodrive_common::consts::{AXIS_COUNT, PROFILE_AXIS_STRIDE};
use duodrive_common::od::{DriveEntry, EventHandle};
use heapless::Vec;

use crate::error::{BridgeError, BridgeResult};
use crate::planner::{ControlWord, plan_control_word};
use crate::registry::AxisRegistry;
use crate::sink::{BridgeEvent, EventSink, TracingSink};
use crate::status::{DriveLifecycleState, DriveStatus, StatusStore};
use crate::velocity::{EventTrigger, VelocityStore};

/// Sub-index of the target velocity entry passed with transmission requests.
const TARGET_VELOCITY_SUB: u8 = 0;

/// Coordination state for a right/left drive pair.
#[derive(Debug)]
pub struct DriveBridge<S: EventSink = TracingSink> {
    registry: AxisRegistry,
    status: StatusStore,
    velocity: VelocityStore,
    /// Target velocity entry per slot, for transmission requests.
    event_handles: [EventHandle; AXIS_COUNT],
    sink: S,
}

impl<S: EventSink> DriveBridge<S> {
    /// Build from a validated configuration.
    ///
    /// # Errors
    /// `InvalidArgument::DuplicateIdentity` if both axes share a node id.
    pub fn from_config(config: &BridgeConfig, sink: S) -> BridgeResult<Self> {
        let registry = AxisRegistry::from_config(config)?;
        let handle = |axis: AxisId| {
            let offset = config
                .axis(axis)
                .map_or(axis.index() as u16 * PROFILE_AXIS_STRIDE, |a| a.profile_offset);
            EventHandle {
                index: DriveEntry::TargetVelocity.index(offset),
            }
        };
        Ok(Self::assemble(
            registry,
            [handle(AxisId::Right), handle(AxisId::Left)],
            sink,
        ))
    }

    /// Build for two node ids with the stock dictionary layout.
    ///
    /// # Errors
    /// `InvalidArgument::DuplicateIdentity` if `right == left`.
    pub fn with_nodes(right: NodeId, left: NodeId, sink: S) -> BridgeResult<Self> {
        let registry = AxisRegistry::new(right, left)?;
        let handles = AxisId::ALL.map(|axis| EventHandle {
            index: DriveEntry::TargetVelocity.index(axis.index() as u16 * PROFILE_AXIS_STRIDE),
        });
        Ok(Self::assemble(registry, handles, sink))
    }

    fn assemble(registry: AxisRegistry, event_handles: [EventHandle; AXIS_COUNT], sink: S) -> Self {
        Self {
            registry,
            status: StatusStore::new(),
            velocity: VelocityStore::new(),
            event_handles,
            sink,
        }
    }

    // ─── Identity ───────────────────────────────────────────────────

    /// Registry used to resolve identities.
    #[inline]
    pub fn registry(&self) -> &AxisRegistry {
        &self.registry
    }

    /// Resolve a bus identity to its slot.
    #[inline]
    pub fn resolve(&self, identity: NodeId) -> BridgeResult<AxisId> {
        self.registry.resolve(identity)
    }

    /// Transmission handle of an axis' target velocity entry.
    #[inline]
    pub fn event_handle(&self, axis: AxisId) -> EventHandle {
        self.event_handles[axis.index()]
    }

    /// The sink events are reported to.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ─── StatusDecoder ──────────────────────────────────────────────

    /// Store a reported statusword for the drive at `identity`.
    ///
    /// # Errors
    /// `UnknownAxis` if the identity resolves to neither slot; nothing is
    /// stored in that case.
    pub fn decode(&self, identity: NodeId, raw: u16) -> BridgeResult<(AxisId, DriveLifecycleState)> {
        let axis = self.resolve_or_reject(identity, DriveEntry::StatusWord)?;
        let status = DriveStatus::from_raw(raw);
        let state = self.status.store(axis, status);
        self.sink.emit(&BridgeEvent::StatusDecoded {
            axis,
            status,
            state,
        });
        Ok((axis, state))
    }

    /// Last statusword stored for an axis (zero before the first report).
    #[inline]
    pub fn status(&self, axis: AxisId) -> DriveStatus {
        self.status.status(axis)
    }

    /// Lifecycle state derived from the last statusword.
    #[inline]
    pub fn lifecycle(&self, axis: AxisId) -> DriveLifecycleState {
        self.status.lifecycle(axis)
    }

    // ─── ControlWordPlanner ─────────────────────────────────────────

    /// Next controlword for an axis, from its stored status.
    ///
    /// Pure with respect to bridge state.
    pub fn plan(&self, axis: AxisId) -> Option<ControlWord> {
        let word = plan_control_word(self.status.status(axis));
        self.sink.emit(&BridgeEvent::ControlPlanned { axis, word });
        word
    }

    // ─── VelocityChangeDetector ─────────────────────────────────────

    /// Record `candidate` as the published velocity of `axis`; `true` when
    /// it changed.
    #[inline]
    pub fn check(&self, axis: AxisId, candidate: i32) -> bool {
        self.velocity.check(axis, candidate)
    }

    /// Last velocity value that went through [`check`](Self::check).
    #[inline]
    pub fn last_published_velocity(&self, axis: AxisId) -> i32 {
        self.velocity.published(axis)
    }

    /// Set the velocity the application wants sent to an axis.
    #[inline]
    pub fn set_commanded_velocity(&self, axis: AxisId, velocity: i32) {
        self.velocity.set_commanded(axis, velocity);
    }

    /// Velocity the application last commanded for an axis.
    #[inline]
    pub fn commanded_velocity(&self, axis: AxisId) -> i32 {
        self.velocity.commanded(axis)
    }

    /// One supervisory poll: check each axis' commanded velocity and request
    /// a transmission for every axis whose value changed. A summary event
    /// follows when at least one axis changed.
    ///
    /// Returns the axes a transmission was requested for.
    pub fn poll_velocities<T: EventTrigger + ?Sized>(&self, trigger: &T) -> Vec<AxisId, AXIS_COUNT> {
        let mut changed = Vec::new();
        for axis in AxisId::ALL {
            let velocity = self.velocity.commanded(axis);
            if self.velocity.check(axis, velocity) {
                trigger.request_event_transmission(self.event_handle(axis), TARGET_VELOCITY_SUB);
                self.sink
                    .emit(&BridgeEvent::VelocityPublished { axis, velocity });
                let pushed = changed.push(axis);
                debug_assert!(pushed.is_ok(), "one entry per axis slot");
            }
        }
        if !changed.is_empty() {
            self.sink.emit(&BridgeEvent::VelocityPoll {
                right: self.velocity.published(AxisId::Right),
                left: self.velocity.published(AxisId::Left),
            });
        }
        changed
    }

    // ─── PositionRelay ──────────────────────────────────────────────

    /// Forward position feedback of the drive at `identity` to the sink.
    ///
    /// # Errors
    /// `UnknownAxis` if the identity resolves to neither slot.
    pub fn relay(&self, identity: NodeId, position: i32) -> BridgeResult<()> {
        let axis = self.resolve_or_reject(identity, DriveEntry::PositionActual)?;
        self.sink
            .emit(&BridgeEvent::PositionRelayed { axis, position });
        Ok(())
    }

    // ─── Helpers ────────────────────────────────────────────────────

    pub(crate) fn resolve_or_reject(&self, identity: NodeId, entry: DriveEntry) -> BridgeResult<AxisId> {
        self.registry.resolve(identity).inspect_err(|&error| {
            self.reject(Some(identity), Some(entry), error);
        })
    }

    pub(crate) fn reject(&self, identity: Option<NodeId>, entry: Option<DriveEntry>, error: BridgeError) {
        self.sink.emit(&BridgeEvent::Rejected {
            identity,
            entry,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use std::cell::RefCell;

    fn bridge() -> DriveBridge<NullSink> {
        DriveBridge::with_nodes(NodeId::new(0x0A), NodeId::new(0x0B), NullSink).unwrap()
    }

    #[derive(Default)]
    struct Requests(RefCell<std::vec::Vec<(EventHandle, u8)>>);

    impl EventTrigger for Requests {
        fn request_event_transmission(&self, handle: EventHandle, sub_index: u8) {
            self.0.borrow_mut().push((handle, sub_index));
        }
    }

    #[test]
    fn decode_then_plan_walks_bring_up() {
        let b = bridge();
        let right = NodeId::new(0x0A);

        b.decode(right, 0x0040).unwrap();
        assert_eq!(b.plan(AxisId::Right), Some(ControlWord::SHUTDOWN));
        b.decode(right, 0x0021).unwrap();
        assert_eq!(b.plan(AxisId::Right), Some(ControlWord::SWITCH_ON));
        b.decode(right, 0x0023).unwrap();
        assert_eq!(b.plan(AxisId::Right), Some(ControlWord::ENABLE_OPERATION));
        assert_eq!(b.lifecycle(AxisId::Right), DriveLifecycleState::SwitchedOn);
    }

    #[test]
    fn decode_unknown_identity_changes_nothing() {
        let b = bridge();
        b.decode(NodeId::new(0x0B), 0x0040).unwrap();
        let err = b.decode(NodeId::new(0x0C), 0x0023).unwrap_err();
        assert_eq!(err, BridgeError::UnknownAxis(NodeId::new(0x0C)));
        assert_eq!(b.status(AxisId::Left).bits(), 0x0040);
        assert_eq!(b.status(AxisId::Right).bits(), 0);
    }

    #[test]
    fn plan_before_any_report_holds() {
        assert_eq!(bridge().plan(AxisId::Left), None);
    }

    #[test]
    fn relay_resolves_identity() {
        let b = bridge();
        assert_eq!(b.relay(NodeId::new(0x0B), -5), Ok(()));
        assert!(b.relay(NodeId::new(0x01), 0).is_err());
    }

    #[test]
    fn poll_requests_transmission_once_per_change() {
        let b = bridge();
        let requests = Requests::default();

        assert!(b.poll_velocities(&requests).is_empty());

        b.set_commanded_velocity(AxisId::Left, 300);
        let changed = b.poll_velocities(&requests);
        assert_eq!(changed.as_slice(), &[AxisId::Left]);
        assert!(b.poll_velocities(&requests).is_empty());

        let sent = requests.0.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], (EventHandle { index: 0x68FF }, 0));
        assert_eq!(b.last_published_velocity(AxisId::Left), 300);
    }

    #[test]
    fn event_handles_follow_configured_offsets() {
        let mut config = BridgeConfig::default();
        config.axes[1].profile_offset = 0x1000;
        let b = DriveBridge::from_config(&config, NullSink).unwrap();
        assert_eq!(b.event_handle(AxisId::Right).index, 0x60FF);
        assert_eq!(b.event_handle(AxisId::Left).index, 0x70FF);
    }

    #[test]
    fn out_of_range_offset_does_not_panic() {
        let mut config = BridgeConfig::default();
        config.axes[1].profile_offset = 0xA000;
        let b = DriveBridge::from_config(&config, NullSink).unwrap();
        assert_eq!(b.event_handle(AxisId::Left).index, 0x00FF);
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        assert!(DriveBridge::with_nodes(NodeId::new(3), NodeId::new(3), NullSink).is_err());
    }
}

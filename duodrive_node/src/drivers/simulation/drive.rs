//! Simulated CiA 402 velocity drive.
//!
//! Follows the bring-up controlwords one transition at a time and
//! integrates position from the target velocity while operation is enabled.
//! Fault handling and quick stop are not simulated.

use duodrive_bridge::{ControlWord, DriveLifecycleState};
use duodrive_common::config::AxisConfig;
use std::time::Duration;
use tracing::debug;

use super::frame::Frame;

/// Statusword reported in each state (remote bit set).
const fn statusword(state: DriveLifecycleState) -> u16 {
    match state {
        DriveLifecycleState::SwitchOnDisabled | DriveLifecycleState::Unknown => 0x0240,
        DriveLifecycleState::ReadyToSwitchOn => 0x0221,
        DriveLifecycleState::SwitchedOn => 0x0233,
        DriveLifecycleState::OperationEnabled => 0x0237,
    }
}

/// Controlword "disable voltage".
const DISABLE_VOLTAGE: u16 = 0x0000;

/// Velocity drive at one node.
#[derive(Debug, Clone)]
pub struct SimulatedDrive {
    /// COB-ID the drive sends its feedback on.
    tx_cob_id: u16,
    /// COB-ID the drive listens to for commands.
    rx_cob_id: u16,
    state: DriveLifecycleState,
    target_velocity: i32,
    /// Position in counts × 1e6 (velocity is counts/s, time in µs).
    position_micro: i64,
}

impl SimulatedDrive {
    /// Drive wired to the COB-IDs of `axis`, powered up in switch on disabled.
    pub fn new(axis: &AxisConfig) -> Self {
        Self {
            tx_cob_id: axis.rpdo_cob_id() as u16,
            rx_cob_id: axis.tpdo_cob_id() as u16,
            state: DriveLifecycleState::SwitchOnDisabled,
            target_velocity: 0,
            position_micro: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> DriveLifecycleState {
        self.state
    }

    /// Current statusword.
    pub fn statusword(&self) -> u16 {
        statusword(self.state)
    }

    /// Actual position in counts.
    pub fn position(&self) -> i32 {
        (self.position_micro / 1_000_000) as i32
    }

    /// Velocity the drive was last commanded.
    pub fn target_velocity(&self) -> i32 {
        self.target_velocity
    }

    /// Apply a controlword.
    pub fn apply_control_word(&mut self, word: u16) {
        use DriveLifecycleState::*;
        let next = match (self.state, word) {
            (_, DISABLE_VOLTAGE) => SwitchOnDisabled,
            (SwitchOnDisabled | SwitchedOn | OperationEnabled, w) if w == ControlWord::SHUTDOWN.raw() => {
                ReadyToSwitchOn
            }
            (ReadyToSwitchOn | OperationEnabled, w) if w == ControlWord::SWITCH_ON.raw() => SwitchedOn,
            (SwitchedOn, w) if w == ControlWord::ENABLE_OPERATION.raw() => OperationEnabled,
            (state, _) => state,
        };
        if next != self.state {
            debug!(cob = format_args!("0x{:03X}", self.rx_cob_id), from = ?self.state, to = ?next, "drive transition");
            self.state = next;
        }
    }

    /// Advance the motion by `dt`.
    pub fn integrate(&mut self, dt: Duration) {
        if self.state == DriveLifecycleState::OperationEnabled {
            let micros = dt.as_micros().min(i64::MAX as u128) as i64;
            self.position_micro = self
                .position_micro
                .wrapping_add((self.target_velocity as i64).wrapping_mul(micros));
        }
    }

    /// Feedback frame: statusword and position actual.
    pub fn feedback(&self) -> Frame {
        let mut frame = Frame::new(self.tx_cob_id);
        frame.push(&self.statusword().to_le_bytes());
        frame.push(&self.position().to_le_bytes());
        frame
    }

    /// Consume a command frame (controlword, target velocity) addressed to
    /// this drive. Returns whether the frame was for this drive.
    pub fn receive(&mut self, frame: &Frame) -> bool {
        if frame.cob_id != self.rx_cob_id {
            return false;
        }
        let data = frame.data();
        if let Some(word) = data.get(..2) {
            self.apply_control_word(u16::from_le_bytes([word[0], word[1]]));
        }
        if let Some(v) = data.get(2..6) {
            self.target_velocity = i32::from_le_bytes([v[0], v[1], v[2], v[3]]);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duodrive_common::axis::AxisId;
    use DriveLifecycleState::*;

    fn drive() -> SimulatedDrive {
        SimulatedDrive::new(&AxisConfig::for_axis(AxisId::Right))
    }

    #[test]
    fn bring_up_sequence_reaches_operation_enabled() {
        let mut d = drive();
        assert_eq!(d.statusword(), 0x0240);
        d.apply_control_word(0x0006);
        assert_eq!(d.state(), ReadyToSwitchOn);
        d.apply_control_word(0x0007);
        assert_eq!(d.state(), SwitchedOn);
        d.apply_control_word(0x000F);
        assert_eq!(d.state(), OperationEnabled);
        assert_eq!(d.statusword(), 0x0237);
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let mut d = drive();
        d.apply_control_word(0x000F);
        assert_eq!(d.state(), SwitchOnDisabled);
        d.apply_control_word(0x0007);
        assert_eq!(d.state(), SwitchOnDisabled);
    }

    #[test]
    fn disable_voltage_always_drops_out() {
        let mut d = drive();
        for w in [0x6, 0x7, 0xF] {
            d.apply_control_word(w);
        }
        d.apply_control_word(0x0000);
        assert_eq!(d.state(), SwitchOnDisabled);
    }

    #[test]
    fn position_integrates_only_when_enabled() {
        let mut d = drive();
        d.target_velocity = 1000;
        d.integrate(Duration::from_secs(1));
        assert_eq!(d.position(), 0);

        for w in [0x6, 0x7, 0xF] {
            d.apply_control_word(w);
        }
        d.integrate(Duration::from_millis(500));
        assert_eq!(d.position(), 500);
        d.target_velocity = -2000;
        d.integrate(Duration::from_secs(1));
        assert_eq!(d.position(), -1500);
    }

    #[test]
    fn frames_use_configured_cob_ids() {
        let mut d = drive();
        let fb = d.feedback();
        assert_eq!(fb.cob_id, 0x38A);
        assert_eq!(fb.data(), &[0x40, 0x02, 0, 0, 0, 0]);

        let mut cmd = Frame::new(0x50B);
        cmd.push(&[0x06, 0x00]);
        assert!(!d.receive(&cmd));

        let mut cmd = Frame::new(0x50A);
        cmd.push(&[0x06, 0x00]);
        cmd.push(&250i32.to_le_bytes());
        assert!(d.receive(&cmd));
        assert_eq!(d.state(), ReadyToSwitchOn);
        assert_eq!(d.target_velocity(), 250);
    }
}

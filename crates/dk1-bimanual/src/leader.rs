//! [`BiLeader`] – two leader arms read as one namespaced action source.

use std::sync::OnceLock;

use dk1_hal::{DeviceFactory, LeaderArm};
use dk1_types::{BiLeaderConfig, Dk1Error, Features, MotorMap, Side};
use tracing::info;

use crate::paired::{PairedArms, Teardown};

/// Bimanual DK1 leader (teleoperation input).
pub struct BiLeader {
    config: BiLeaderConfig,
    arms: PairedArms<dyn LeaderArm>,
    action_features: OnceLock<Features>,
}

impl BiLeader {
    pub const NAME: &'static str = "bi_dk1_leader";

    pub fn new(config: BiLeaderConfig, factory: &dyn DeviceFactory) -> Result<Self, Dk1Error> {
        config.validate()?;
        let left = factory.leader_arm(&config.arm_config(Side::Left))?;
        let right = factory.leader_arm(&config.arm_config(Side::Right))?;
        Ok(Self::from_parts(config, left, right))
    }

    pub fn from_parts(
        config: BiLeaderConfig,
        left: Box<dyn LeaderArm>,
        right: Box<dyn LeaderArm>,
    ) -> Self {
        Self {
            config,
            arms: PairedArms::new(left, right),
            action_features: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &BiLeaderConfig {
        &self.config
    }

    pub fn arm(&self, side: Side) -> &dyn LeaderArm {
        self.arms.arm(side)
    }

    pub fn action_features(&self) -> &Features {
        self.action_features.get_or_init(|| self.arms.motor_features())
    }

    /// Always empty: the leader accepts no feedback channel.
    pub fn feedback_features(&self) -> Features {
        Features::new()
    }

    pub fn is_connected(&self) -> bool {
        self.arms.is_connected()
    }

    pub fn connect(&mut self) -> Result<(), Dk1Error> {
        self.arms.connect()?;
        info!(device = Self::NAME, "connected");
        Ok(())
    }

    /// Always true; calibration is owned by the arm drivers.
    pub fn is_calibrated(&self) -> bool {
        true
    }

    pub fn calibrate(&mut self) -> Result<(), Dk1Error> {
        Ok(())
    }

    pub fn configure(&mut self) -> Result<(), Dk1Error> {
        self.arms.configure()
    }

    /// Run motor id assignment on the left bus, then the right bus.
    pub fn setup_motors(&mut self) -> Result<(), Dk1Error> {
        self.arms.try_each(|_, arm| arm.setup_motors())?;
        Ok(())
    }

    pub fn get_action(&mut self) -> Result<MotorMap, Dk1Error> {
        self.arms.read_prefixed(|arm| arm.get_action())
    }

    /// Force/haptic feedback is not supported by the DK1 leader.
    ///
    /// # Errors
    ///
    /// Always returns [`Dk1Error::NotImplemented`].
    pub fn send_feedback(&mut self, _feedback: &MotorMap) -> Result<(), Dk1Error> {
        Err(Dk1Error::NotImplemented(format!(
            "force feedback for {}",
            Self::NAME
        )))
    }

    pub fn disconnect(&mut self) -> Result<(), Dk1Error> {
        let mut teardown = Teardown::new();
        self.arms.disconnect(&mut teardown);
        info!(device = Self::NAME, failures = teardown.failures(), "disconnected");
        teardown.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{calls, new_log, MockArm};
    use dk1_hal::{ArmUnit, SimFactory, SimLeaderArm};
    use dk1_types::position_key;

    fn leader(left: MockArm, right: MockArm) -> BiLeader {
        BiLeader::from_parts(BiLeaderConfig::new("l", "r"), Box::new(left), Box::new(right))
    }

    #[test]
    fn action_features_are_namespaced_motors() {
        let log = new_log();
        let l = leader(MockArm::new("l", &log), MockArm::new("r", &log));
        let keys: Vec<&str> = l.action_features().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["left_gripper.pos", "left_joint_1.pos", "right_gripper.pos", "right_joint_1.pos"]
        );
        assert!(l.feedback_features().is_empty());
    }

    #[test]
    fn get_action_prefixes_left_then_right() {
        let log = new_log();
        let mut l = leader(
            MockArm::new("l", &log).reading(MotorMap::from([("joint_1.pos".to_string(), 0.4)])),
            MockArm::new("r", &log).reading(MotorMap::from([("joint_1.pos".to_string(), -0.4)])),
        );
        let action = l.get_action().unwrap();
        assert_eq!(action["left_joint_1.pos"], 0.4);
        assert_eq!(action["right_joint_1.pos"], -0.4);
        assert_eq!(calls(&log), vec!["l.get_action", "r.get_action"]);
    }

    #[test]
    fn send_feedback_always_fails() {
        let log = new_log();
        let mut l = leader(MockArm::new("l", &log), MockArm::new("r", &log));
        for feedback in [MotorMap::new(), MotorMap::from([("left_joint_1.pos".to_string(), 1.0)])] {
            assert!(matches!(l.send_feedback(&feedback), Err(Dk1Error::NotImplemented(_))));
        }
        l.connect().unwrap();
        assert!(matches!(l.send_feedback(&MotorMap::new()), Err(Dk1Error::NotImplemented(_))));
    }

    #[test]
    fn connectivity_depends_only_on_arms() {
        let log = new_log();
        let mut l = leader(MockArm::new("l", &log), MockArm::new("r", &log));
        assert!(!l.is_connected());
        l.connect().unwrap();
        assert!(l.is_connected());
        l.disconnect().unwrap();
        assert!(!l.is_connected());
        assert_eq!(
            calls(&log),
            vec!["l.connect", "r.connect", "l.disconnect", "r.disconnect"]
        );
    }

    #[test]
    fn lifecycle_helpers_visit_left_first() {
        let log = new_log();
        let mut l = leader(MockArm::new("l", &log), MockArm::new("r", &log));
        assert!(l.is_calibrated());
        l.calibrate().unwrap();
        l.setup_motors().unwrap();
        l.configure().unwrap();
        assert_eq!(
            calls(&log),
            vec!["l.setup_motors", "r.setup_motors", "l.configure", "r.configure"]
        );
    }

    #[test]
    fn disconnect_before_connect_is_attempted_on_both() {
        let log = new_log();
        let mut l = leader(
            MockArm::new("l", &log),
            MockArm::new("r", &log).failing_on("disconnect"),
        );
        assert!(l.disconnect().is_err());
        assert_eq!(calls(&log), vec!["l.disconnect", "r.disconnect"]);
    }

    #[test]
    fn sim_leader_drives_normalised_gripper() {
        let cfg = BiLeaderConfig::new("/dev/l", "/dev/r");
        let mut left = SimLeaderArm::new(cfg.arm_config(Side::Left));
        left.set_positions(&MotorMap::from([(position_key("gripper"), 2280.0)]));
        let right = SimLeaderArm::new(cfg.arm_config(Side::Right));
        let mut l = BiLeader::from_parts(cfg, Box::new(left), Box::new(right));

        l.connect().unwrap();
        let action = l.get_action().unwrap();
        assert_eq!(action.len(), 14);
        assert!((action["left_gripper.pos"] - 1.0).abs() < 1e-6);
        assert!((action["right_gripper.pos"] - 0.0).abs() < 1e-6);
        assert!(l.arm(Side::Right).is_connected());
    }

    #[test]
    fn new_uses_factory() {
        let l = BiLeader::new(BiLeaderConfig::new("/dev/l", "/dev/r"), &SimFactory).unwrap();
        assert_eq!(l.arm(Side::Left).name(), "dk1_leader(/dev/l)");
        assert_eq!(l.action_features().len(), 14);
    }
}

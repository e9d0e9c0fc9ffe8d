//! Single-arm driver traits.
//!
//! An arm driver owns one actuator bus (and its gripper) and speaks in its
//! native namespace: motor names and `<motor>.pos` keys without any side
//! prefix. Followers accept actions and report observations; leaders are
//! read by a human operator and only produce actions.

use dk1_types::{Dk1Error, MotorMap};

/// Motor set of a DK1 arm, in bus order.
pub const DK1_MOTORS: [&str; 7] = [
    "joint_1", "joint_2", "joint_3", "joint_4", "joint_5", "joint_6", "gripper",
];

/// Lifecycle surface shared by every arm driver.
pub trait ArmUnit: Send {
    /// Human readable identifier used in logs, e.g. `"dk1_follower(/dev/ttyACM0)"`.
    fn name(&self) -> &str;

    /// Native motor names. Fixed after construction.
    fn motors(&self) -> &[String];

    /// Open the bus and bring the arm online.
    ///
    /// # Errors
    ///
    /// Returns [`Dk1Error::AlreadyConnected`] or a driver specific
    /// [`Dk1Error::HardwareFault`].
    fn connect(&mut self) -> Result<(), Dk1Error>;

    /// Release the bus. Calling this on a disconnected arm is driver defined.
    fn disconnect(&mut self) -> Result<(), Dk1Error>;

    /// Push runtime settings (gains, limits, operating mode) to the motors.
    fn configure(&mut self) -> Result<(), Dk1Error>;

    fn calibrate(&mut self) -> Result<(), Dk1Error>;

    fn is_connected(&self) -> bool;

    fn is_calibrated(&self) -> bool;
}

/// An arm that follows commanded joint positions.
pub trait FollowerArm: ArmUnit {
    /// Present joint positions keyed by `<motor>.pos`.
    fn get_observation(&mut self) -> Result<MotorMap, Dk1Error>;

    /// Command joint positions and return what was actually applied after
    /// the driver's own clamping and safety limiting.
    fn send_action(&mut self, action: MotorMap) -> Result<MotorMap, Dk1Error>;
}

/// An arm moved by hand whose joint readings become actions.
pub trait LeaderArm: ArmUnit {
    fn get_action(&mut self) -> Result<MotorMap, Dk1Error>;

    /// One-off motor id/baudrate assignment on a fresh bus.
    fn setup_motors(&mut self) -> Result<(), Dk1Error>;
}

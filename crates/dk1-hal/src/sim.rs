//! In-process simulated drivers for testing without physical hardware.
//!
//! [`SimFactory`] builds [`SimFollowerArm`], [`SimLeaderArm`] and
//! [`SimCamera`] instances that keep their state in memory. They follow the
//! same lifecycle rules as the real drivers (double connect fails, I/O
//! requires a connection) so composites can be exercised end to end in CI.
//!
//! # Example
//!
//! ```rust
//! use dk1_hal::{ArmUnit, DeviceFactory, FollowerArm, SimFactory};
//! use dk1_types::{BiFollowerConfig, Side};
//!
//! let cfg = BiFollowerConfig::new("/dev/sim0", "/dev/sim1");
//! let mut arm = SimFactory.follower_arm(&cfg.arm_config(Side::Left)).unwrap();
//! arm.connect().unwrap();
//! let obs = arm.get_observation().unwrap();
//! assert_eq!(obs.len(), 7);
//! ```

use dk1_types::{
    position_key, CameraConfig, CameraFrame, Dk1Error, FollowerArmConfig, LeaderArmConfig,
    MotorMap, CAMERA_CHANNELS,
};
use tracing::{debug, info, trace};

use crate::arm::{ArmUnit, FollowerArm, LeaderArm, DK1_MOTORS};
use crate::camera::Camera;
use crate::factory::DeviceFactory;

fn dk1_motor_names() -> Vec<String> {
    DK1_MOTORS.iter().map(|m| m.to_string()).collect()
}

fn zero_positions(motors: &[String]) -> MotorMap {
    motors.iter().map(|m| (position_key(m), 0.0)).collect()
}

fn require_connected(connected: bool, name: &str) -> Result<(), Dk1Error> {
    if connected {
        Ok(())
    } else {
        Err(Dk1Error::NotConnected(name.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Follower arm
// ────────────────────────────────────────────────────────────────────────────

/// A simulated follower arm.
///
/// `send_action` moves each joint at most `joint_velocity_scaling` radians
/// per call towards its target and clamps the gripper to `[0, 1]`; the
/// returned map is what was applied.
pub struct SimFollowerArm {
    name: String,
    config: FollowerArmConfig,
    motors: Vec<String>,
    positions: MotorMap,
    connected: bool,
    configured: bool,
    torque_enabled: bool,
}

impl SimFollowerArm {
    pub fn new(config: FollowerArmConfig) -> Self {
        let motors = dk1_motor_names();
        Self {
            name: format!("dk1_follower({})", config.port),
            positions: zero_positions(&motors),
            motors,
            config,
            connected: false,
            configured: false,
            torque_enabled: false,
        }
    }

    pub fn config(&self) -> &FollowerArmConfig {
        &self.config
    }

    /// Present joint positions keyed by `<motor>.pos`.
    pub fn positions(&self) -> &MotorMap {
        &self.positions
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn torque_enabled(&self) -> bool {
        self.torque_enabled
    }

    fn apply(&self, key: &str, present: f32, target: f32) -> f32 {
        if key == "gripper.pos" {
            target.clamp(0.0, 1.0)
        } else {
            let step = self.config.joint_velocity_scaling;
            present + (target - present).clamp(-step, step)
        }
    }
}

impl ArmUnit for SimFollowerArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn motors(&self) -> &[String] {
        &self.motors
    }

    fn connect(&mut self) -> Result<(), Dk1Error> {
        if self.connected {
            return Err(Dk1Error::AlreadyConnected(self.name.clone()));
        }
        self.connected = true;
        self.torque_enabled = true;
        info!(arm = %self.name, "connected");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Dk1Error> {
        if !self.connected {
            debug!(arm = %self.name, "disconnect on a disconnected arm");
            return Ok(());
        }
        if self.config.disable_torque_on_disconnect {
            self.torque_enabled = false;
        }
        self.connected = false;
        self.configured = false;
        info!(arm = %self.name, torque_enabled = self.torque_enabled, "disconnected");
        Ok(())
    }

    fn configure(&mut self) -> Result<(), Dk1Error> {
        require_connected(self.connected, &self.name)?;
        self.configured = true;
        Ok(())
    }

    fn calibrate(&mut self) -> Result<(), Dk1Error> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_calibrated(&self) -> bool {
        true
    }
}

impl FollowerArm for SimFollowerArm {
    fn get_observation(&mut self) -> Result<MotorMap, Dk1Error> {
        require_connected(self.connected, &self.name)?;
        Ok(self.positions.clone())
    }

    fn send_action(&mut self, action: MotorMap) -> Result<MotorMap, Dk1Error> {
        require_connected(self.connected, &self.name)?;
        // Reject the whole action before any joint moves.
        if let Some((key, target)) = action
            .iter()
            .find(|(key, target)| self.positions.contains_key(*key) && !target.is_finite())
        {
            return Err(Dk1Error::HardwareFault {
                component: self.name.clone(),
                details: format!("non-finite target {target} for '{key}'"),
            });
        }
        let mut applied = MotorMap::new();
        for (key, target) in action {
            let Some(&present) = self.positions.get(&key) else {
                trace!(arm = %self.name, key = %key, "ignoring unknown motor key");
                continue;
            };
            let value = self.apply(&key, present, target);
            self.positions.insert(key.clone(), value);
            applied.insert(key, value);
        }
        Ok(applied)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Leader arm
// ────────────────────────────────────────────────────────────────────────────

/// A simulated leader arm whose joint readings are scripted with
/// [`SimLeaderArm::set_positions`].
///
/// Joints are reported as given. The gripper is set in raw encoder ticks and
/// reported normalised to `[0, 1]` between `gripper_closed_pos` and
/// `gripper_open_pos`.
pub struct SimLeaderArm {
    name: String,
    config: LeaderArmConfig,
    motors: Vec<String>,
    raw: MotorMap,
    connected: bool,
    motors_setup: bool,
}

impl SimLeaderArm {
    pub fn new(config: LeaderArmConfig) -> Self {
        let motors = dk1_motor_names();
        let mut raw = zero_positions(&motors);
        raw.insert(position_key("gripper"), config.gripper_closed_pos as f32);
        Self {
            name: format!("dk1_leader({})", config.port),
            motors,
            raw,
            config,
            connected: false,
            motors_setup: false,
        }
    }

    /// Overwrite the raw readings of the given keys. Unknown keys are ignored.
    pub fn set_positions(&mut self, positions: &MotorMap) {
        for (key, value) in positions {
            if let Some(slot) = self.raw.get_mut(key) {
                *slot = *value;
            }
        }
    }

    pub fn motors_setup(&self) -> bool {
        self.motors_setup
    }

    fn normalise_gripper(&self, ticks: f32) -> f32 {
        let closed = self.config.gripper_closed_pos as f32;
        let open = self.config.gripper_open_pos as f32;
        ((ticks - closed) / (open - closed)).clamp(0.0, 1.0)
    }
}

impl ArmUnit for SimLeaderArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn motors(&self) -> &[String] {
        &self.motors
    }

    fn connect(&mut self) -> Result<(), Dk1Error> {
        if self.connected {
            return Err(Dk1Error::AlreadyConnected(self.name.clone()));
        }
        self.connected = true;
        info!(arm = %self.name, "connected");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Dk1Error> {
        if self.connected {
            self.connected = false;
            info!(arm = %self.name, "disconnected");
        }
        Ok(())
    }

    fn configure(&mut self) -> Result<(), Dk1Error> {
        require_connected(self.connected, &self.name)
    }

    fn calibrate(&mut self) -> Result<(), Dk1Error> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_calibrated(&self) -> bool {
        true
    }
}

impl LeaderArm for SimLeaderArm {
    fn get_action(&mut self) -> Result<MotorMap, Dk1Error> {
        require_connected(self.connected, &self.name)?;
        Ok(self
            .raw
            .iter()
            .map(|(key, &value)| {
                let value = if key == "gripper.pos" {
                    self.normalise_gripper(value)
                } else {
                    value
                };
                (key.clone(), value)
            })
            .collect())
    }

    fn setup_motors(&mut self) -> Result<(), Dk1Error> {
        self.motors_setup = true;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Camera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated camera that returns blank frames of its configured shape.
pub struct SimCamera {
    id: String,
    height: u32,
    width: u32,
    connected: bool,
    frames_read: u64,
}

impl SimCamera {
    pub fn new(id: impl Into<String>, config: &CameraConfig) -> Self {
        Self {
            id: id.into(),
            height: config.height,
            width: config.width,
            connected: false,
            frames_read: 0,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn connect(&mut self) -> Result<(), Dk1Error> {
        if self.connected {
            return Err(Dk1Error::AlreadyConnected(self.id.clone()));
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Dk1Error> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn read(&mut self) -> Result<CameraFrame, Dk1Error> {
        require_connected(self.connected, &self.id)?;
        self.frames_read += 1;
        Ok(CameraFrame::blank(self.height, self.width, CAMERA_CHANNELS))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Factory
// ────────────────────────────────────────────────────────────────────────────

/// [`DeviceFactory`] backed entirely by simulated drivers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimFactory;

impl DeviceFactory for SimFactory {
    fn follower_arm(&self, config: &FollowerArmConfig) -> Result<Box<dyn FollowerArm>, Dk1Error> {
        Ok(Box::new(SimFollowerArm::new(config.clone())))
    }

    fn leader_arm(&self, config: &LeaderArmConfig) -> Result<Box<dyn LeaderArm>, Dk1Error> {
        Ok(Box::new(SimLeaderArm::new(config.clone())))
    }

    fn camera(&self, name: &str, config: &CameraConfig) -> Result<Box<dyn Camera>, Dk1Error> {
        Ok(Box::new(SimCamera::new(name, config)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Configuration values for single arms, bimanual composites and cameras.
//!
//! The bimanual configs hold one endpoint per side plus tuning parameters
//! shared by both arms. [`BiFollowerConfig::arm_config`] and
//! [`BiLeaderConfig::arm_config`] expand them into per-arm configs; there is
//! no per-arm override, both sides always receive identical tuning.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Dk1Error, Side};

// ────────────────────────────────────────────────────────────────────────────
// Defaults
// ────────────────────────────────────────────────────────────────────────────

fn default_joint_velocity_scaling() -> f32 {
    0.2
}
fn default_max_gripper_torque() -> f32 {
    // Nm; ~114 N of gripper force through the 8.75 mm spur gear.
    1.0
}
fn default_gripper_open_pos() -> i32 {
    2280
}
fn default_gripper_closed_pos() -> i32 {
    1670
}

// ────────────────────────────────────────────────────────────────────────────
// Cameras
// ────────────────────────────────────────────────────────────────────────────

/// Camera stream settings. Frames are always delivered as
/// `height × width × 3`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CameraConfig {
    /// Opaque device identifier (index, path or serial number).
    #[serde(default)]
    pub device: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Routing policy
// ────────────────────────────────────────────────────────────────────────────

/// What `send_action` does with keys that carry neither side prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoutingPolicy {
    /// Exclude the key from both sub-actions.
    #[default]
    Ignore,
    /// Fail the whole call before anything is dispatched.
    Reject,
}

// ────────────────────────────────────────────────────────────────────────────
// Single-arm configs
// ────────────────────────────────────────────────────────────────────────────

/// Config for one follower arm driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FollowerArmConfig {
    pub port: String,
    pub disable_torque_on_disconnect: bool,
    pub joint_velocity_scaling: f32,
    pub max_gripper_torque: f32,
}

/// Config for one leader arm driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeaderArmConfig {
    pub port: String,
    pub gripper_open_pos: i32,
    pub gripper_closed_pos: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Bimanual configs
// ────────────────────────────────────────────────────────────────────────────

/// Bimanual follower: two follower arms plus named cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BiFollowerConfig {
    pub left_arm_port: String,
    pub right_arm_port: String,
    #[serde(default)]
    pub disable_torque_on_disconnect: bool,
    #[serde(default = "default_joint_velocity_scaling")]
    pub joint_velocity_scaling: f32,
    #[serde(default = "default_max_gripper_torque")]
    pub max_gripper_torque: f32,
    /// Cameras in the order they are connected and read.
    #[serde(default)]
    pub cameras: IndexMap<String, CameraConfig>,
    #[serde(default)]
    pub unknown_action_keys: RoutingPolicy,
}

impl BiFollowerConfig {
    /// Minimal config with default tuning and no cameras.
    pub fn new(left_arm_port: impl Into<String>, right_arm_port: impl Into<String>) -> Self {
        Self {
            left_arm_port: left_arm_port.into(),
            right_arm_port: right_arm_port.into(),
            disable_torque_on_disconnect: false,
            joint_velocity_scaling: default_joint_velocity_scaling(),
            max_gripper_torque: default_max_gripper_torque(),
            cameras: IndexMap::new(),
            unknown_action_keys: RoutingPolicy::default(),
        }
    }

    pub fn with_camera(mut self, name: impl Into<String>, camera: CameraConfig) -> Self {
        self.cameras.insert(name.into(), camera);
        self
    }

    pub fn port(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_arm_port,
            Side::Right => &self.right_arm_port,
        }
    }

    /// Expand into the config for one arm. Only the endpoint differs
    /// between sides.
    pub fn arm_config(&self, side: Side) -> FollowerArmConfig {
        FollowerArmConfig {
            port: self.port(side).to_string(),
            disable_torque_on_disconnect: self.disable_torque_on_disconnect,
            joint_velocity_scaling: self.joint_velocity_scaling,
            max_gripper_torque: self.max_gripper_torque,
        }
    }

    /// Reject values no driver could honour.
    ///
    /// # Errors
    ///
    /// Returns [`Dk1Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), Dk1Error> {
        validate_ports(&self.left_arm_port, &self.right_arm_port)?;
        if self.joint_velocity_scaling.is_nan() || self.joint_velocity_scaling <= 0.0 {
            return Err(Dk1Error::Config(format!(
                "joint_velocity_scaling must be positive, got {}",
                self.joint_velocity_scaling
            )));
        }
        if self.max_gripper_torque.is_nan() || self.max_gripper_torque < 0.0 {
            return Err(Dk1Error::Config(format!(
                "max_gripper_torque must not be negative, got {}",
                self.max_gripper_torque
            )));
        }
        for (name, cam) in &self.cameras {
            if cam.width == 0 || cam.height == 0 {
                return Err(Dk1Error::Config(format!(
                    "camera '{name}' has an empty resolution ({}x{})",
                    cam.width, cam.height
                )));
            }
        }
        Ok(())
    }
}

/// Bimanual leader: two leader arms, no cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BiLeaderConfig {
    pub left_arm_port: String,
    pub right_arm_port: String,
    #[serde(default = "default_gripper_open_pos")]
    pub gripper_open_pos: i32,
    #[serde(default = "default_gripper_closed_pos")]
    pub gripper_closed_pos: i32,
}

impl BiLeaderConfig {
    pub fn new(left_arm_port: impl Into<String>, right_arm_port: impl Into<String>) -> Self {
        Self {
            left_arm_port: left_arm_port.into(),
            right_arm_port: right_arm_port.into(),
            gripper_open_pos: default_gripper_open_pos(),
            gripper_closed_pos: default_gripper_closed_pos(),
        }
    }

    pub fn port(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_arm_port,
            Side::Right => &self.right_arm_port,
        }
    }

    pub fn arm_config(&self, side: Side) -> LeaderArmConfig {
        LeaderArmConfig {
            port: self.port(side).to_string(),
            gripper_open_pos: self.gripper_open_pos,
            gripper_closed_pos: self.gripper_closed_pos,
        }
    }

    /// # Errors
    ///
    /// Returns [`Dk1Error::Config`] when a port is empty or the gripper
    /// range is degenerate.
    pub fn validate(&self) -> Result<(), Dk1Error> {
        validate_ports(&self.left_arm_port, &self.right_arm_port)?;
        if self.gripper_open_pos == self.gripper_closed_pos {
            return Err(Dk1Error::Config(format!(
                "gripper_open_pos and gripper_closed_pos are both {}",
                self.gripper_open_pos
            )));
        }
        Ok(())
    }
}

fn validate_ports(left: &str, right: &str) -> Result<(), Dk1Error> {
    if left.trim().is_empty() || right.trim().is_empty() {
        return Err(Dk1Error::Config("arm ports must not be empty".to_string()));
    }
    if left == right {
        return Err(Dk1Error::Config(format!(
            "left and right arms share the same port '{left}'"
        )));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Device enumeration
// ────────────────────────────────────────────────────────────────────────────

/// Every composite device type this workspace can build, tagged by its
/// stable type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum DeviceConfig {
    #[serde(rename = "bi_dk1_follower")]
    BiFollower(BiFollowerConfig),
    #[serde(rename = "bi_dk1_leader")]
    BiLeader(BiLeaderConfig),
}

impl DeviceConfig {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceConfig::BiFollower(_) => "bi_dk1_follower",
            DeviceConfig::BiLeader(_) => "bi_dk1_leader",
        }
    }

    pub fn validate(&self) -> Result<(), Dk1Error> {
        match self {
            DeviceConfig::BiFollower(cfg) => cfg.validate(),
            DeviceConfig::BiLeader(cfg) => cfg.validate(),
        }
    }
}

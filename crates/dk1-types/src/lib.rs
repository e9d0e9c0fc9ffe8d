//! `dk1-types` – shared value types for the bimanual DK1 stack.
//!
//! Everything that crosses a crate boundary lives here: the global
//! [`Dk1Error`], the [`Side`] namespacing helpers, feature schema
//! descriptors, camera frames, and the configuration values in [`config`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;

pub use config::{
    BiFollowerConfig, BiLeaderConfig, CameraConfig, DeviceConfig, FollowerArmConfig,
    LeaderArmConfig, RoutingPolicy,
};

/// Native (un-namespaced) joint values keyed by `<motor>.pos`.
pub type MotorMap = BTreeMap<String, f32>;

/// Externally visible schema: namespaced key → semantic type.
pub type Features = BTreeMap<String, FeatureType>;

/// A unified observation: namespaced motor scalars plus camera frames.
pub type Observation = BTreeMap<String, ObservationValue>;

/// Channel depth of every camera frame.
pub const CAMERA_CHANNELS: u32 = 3;

/// Suffix appended to a motor name to form its position key.
pub const POSITION_SUFFIX: &str = ".pos";

/// Build the native position key for `motor`, e.g. `"joint_1.pos"`.
pub fn position_key(motor: &str) -> String {
    format!("{motor}{POSITION_SUFFIX}")
}

// ────────────────────────────────────────────────────────────────────────────
// Side
// ────────────────────────────────────────────────────────────────────────────

/// Which arm of the pair a key or driver belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in dispatch order. Left is always issued before right.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Namespace prefix including the separator.
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Left => "left_",
            Side::Right => "right_",
        }
    }

    /// Prepend this side's prefix to a native key.
    pub fn namespace(self, key: &str) -> String {
        format!("{}{key}", self.prefix())
    }

    /// Strip this side's prefix, returning the native key, or `None` when the
    /// key belongs to the other side or to no side at all.
    pub fn strip(self, key: &str) -> Option<&str> {
        key.strip_prefix(self.prefix())
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Schema and observation values
// ────────────────────────────────────────────────────────────────────────────

/// Semantic type of one entry in a feature schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureType {
    /// Scalar motor position.
    Float,
    /// Fixed-shape image buffer (height × width × channels).
    Image {
        height: u32,
        width: u32,
        channels: u32,
    },
}

/// A raw image frame returned by a camera driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
    /// Row-major interleaved pixel data, `height * width * channels` bytes.
    pub data: Vec<u8>,
}

impl CameraFrame {
    /// An all-zero frame of the given shape.
    pub fn blank(height: u32, width: u32, channels: u32) -> Self {
        let len = height as usize * width as usize * channels as usize;
        Self {
            height,
            width,
            channels,
            data: vec![0u8; len],
        }
    }

    pub fn shape(&self) -> (u32, u32, u32) {
        (self.height, self.width, self.channels)
    }
}

/// One value of a unified observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservationValue {
    Scalar(f32),
    Frame(CameraFrame),
}

impl ObservationValue {
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            ObservationValue::Scalar(v) => Some(*v),
            ObservationValue::Frame(_) => None,
        }
    }

    pub fn as_frame(&self) -> Option<&CameraFrame> {
        match self {
            ObservationValue::Frame(frame) => Some(frame),
            ObservationValue::Scalar(_) => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Global error type spanning driver faults, lifecycle misuse, routing and
/// configuration problems.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dk1Error {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("{0} is not connected")]
    NotConnected(String),

    #[error("{0} is already connected")]
    AlreadyConnected(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Action key '{0}' carries neither the 'left_' nor the 'right_' prefix")]
    UnroutedActionKey(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_prefix_and_strip() {
        assert_eq!(Side::Left.namespace("joint_1.pos"), "left_joint_1.pos");
        assert_eq!(Side::Right.namespace("joint_1.pos"), "right_joint_1.pos");
        assert_eq!(Side::Left.strip("left_gripper.pos"), Some("gripper.pos"));
        assert_eq!(Side::Left.strip("right_gripper.pos"), None);
        assert_eq!(Side::Right.strip("gripper.pos"), None);
    }

    #[test]
    fn side_order_is_left_then_right() {
        assert_eq!(Side::BOTH, [Side::Left, Side::Right]);
        assert_eq!(Side::Left.to_string(), "left");
    }

    #[test]
    fn blank_frame_has_expected_size() {
        let frame = CameraFrame::blank(4, 6, CAMERA_CHANNELS);
        assert_eq!(frame.shape(), (4, 6, 3));
        assert_eq!(frame.data.len(), 72);
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn observation_value_accessors() {
        let scalar = ObservationValue::Scalar(0.25);
        assert_eq!(scalar.as_scalar(), Some(0.25));
        assert!(scalar.as_frame().is_none());

        let frame = ObservationValue::Frame(CameraFrame::blank(1, 1, 3));
        assert!(frame.as_scalar().is_none());
        assert_eq!(frame.as_frame().map(CameraFrame::shape), Some((1, 1, 3)));
    }

    #[test]
    fn feature_type_serializes_with_kind_tag() {
        let json = serde_json::to_string(&FeatureType::Image {
            height: 480,
            width: 640,
            channels: 3,
        })
        .unwrap();
        assert!(json.contains("\"kind\":\"image\""));
        assert_eq!(serde_json::to_string(&FeatureType::Float).unwrap(), "{\"kind\":\"float\"}");
    }

    #[test]
    fn dk1_error_display() {
        let err = Dk1Error::HardwareFault {
            component: "left_arm".to_string(),
            details: "bus timeout".to_string(),
        };
        assert!(err.to_string().contains("left_arm"));

        let err = Dk1Error::NotImplemented("force feedback".to_string());
        assert!(err.to_string().contains("Not implemented"));
    }
}

//! Feature schema composition.
//!
//! Motor features are namespaced per side (`left_joint_1.pos`); camera
//! features keep the camera name as-is since names are already unique in
//! the composite's camera mapping. All functions are pure.

use dk1_types::{position_key, FeatureType, Features, Side, CAMERA_CHANNELS};

/// Namespaced position features for one arm.
pub fn side_motor_features(side: Side, motors: &[String]) -> Features {
    motors
        .iter()
        .map(|motor| (side.namespace(&position_key(motor)), FeatureType::Float))
        .collect()
}

/// `{left_<m>.pos} ∪ {right_<m>.pos}` over both arms' motor sets.
pub fn motor_features(left: &[String], right: &[String]) -> Features {
    let mut features = side_motor_features(Side::Left, left);
    features.extend(side_motor_features(Side::Right, right));
    features
}

/// Image features keyed by camera name, shaped `height × width × 3`.
pub fn camera_features<'a, I>(cameras: I) -> Features
where
    I: IntoIterator<Item = (&'a str, u32, u32)>,
{
    cameras
        .into_iter()
        .map(|(name, height, width)| {
            (
                name.to_string(),
                FeatureType::Image {
                    height,
                    width,
                    channels: CAMERA_CHANNELS,
                },
            )
        })
        .collect()
}

/// Union of motor and camera features. Composites reject overlapping keys
/// at construction (see [`colliding_keys`]).
pub fn observation_features(motors: &Features, cameras: &Features) -> Features {
    let mut features = motors.clone();
    features.extend(cameras.iter().map(|(k, v)| (k.clone(), *v)));
    features
}

/// Keys present in both schemas.
pub fn colliding_keys(a: &Features, b: &Features) -> Vec<String> {
    a.keys().filter(|k| b.contains_key(*k)).cloned().collect()
}

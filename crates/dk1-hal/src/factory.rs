//! [`DeviceFactory`] – builds boxed drivers from per-device configs.
//!
//! Composites receive a factory at construction time instead of looking
//! drivers up in a global registry. Swapping the factory swaps the hardware
//! backend without touching composition logic.

use dk1_types::{CameraConfig, Dk1Error, FollowerArmConfig, LeaderArmConfig};

use crate::arm::{FollowerArm, LeaderArm};
use crate::camera::Camera;

/// Constructor table for every driver kind a composite may own.
pub trait DeviceFactory {
    /// # Errors
    ///
    /// Returns [`Dk1Error::Config`] when the config cannot be honoured by
    /// this backend.
    fn follower_arm(&self, config: &FollowerArmConfig) -> Result<Box<dyn FollowerArm>, Dk1Error>;

    fn leader_arm(&self, config: &LeaderArmConfig) -> Result<Box<dyn LeaderArm>, Dk1Error>;

    /// Build the camera registered under `name` in the composite config.
    fn camera(&self, name: &str, config: &CameraConfig) -> Result<Box<dyn Camera>, Dk1Error>;
}

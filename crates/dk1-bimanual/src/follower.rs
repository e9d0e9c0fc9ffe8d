//! [`BiFollower`] – two follower arms plus named cameras behind one
//! namespaced observation/action surface.
//!
//! # Ordering
//!
//! Every operation runs left arm, right arm, then cameras in config order.
//! Each step completes before the next one starts.
//!
//! # Failure policy
//!
//! - `connect` stops at the first failure and does not roll back; whatever
//!   connected stays connected until [`BiFollower::disconnect`] is called.
//! - `disconnect` attempts every owned device, logs each failure and returns
//!   the first one.
//! - Reads and writes propagate driver errors unchanged.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use dk1_hal::{Camera, DeviceFactory, FollowerArm};
use indexmap::IndexMap;
use dk1_types::{
    BiFollowerConfig, Dk1Error, Features, MotorMap, Observation, ObservationValue, Side,
};
use tracing::{debug, info};

use crate::paired::{PairedArms, Teardown};
use crate::routing;
use crate::schema;

/// Bimanual DK1 follower.
pub struct BiFollower {
    config: BiFollowerConfig,
    arms: PairedArms<dyn FollowerArm>,
    cameras: IndexMap<String, Box<dyn Camera>>,
    camera_latency: BTreeMap<String, Duration>,
    observation_features: OnceLock<Features>,
    action_features: OnceLock<Features>,
}

impl BiFollower {
    pub const NAME: &'static str = "bi_dk1_follower";

    /// Build both arms and every configured camera through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`Dk1Error::Config`] for an invalid config or a camera name
    /// that shadows a namespaced motor key, and any factory error.
    pub fn new(config: BiFollowerConfig, factory: &dyn DeviceFactory) -> Result<Self, Dk1Error> {
        config.validate()?;
        let left = factory.follower_arm(&config.arm_config(Side::Left))?;
        let right = factory.follower_arm(&config.arm_config(Side::Right))?;
        let mut cameras = IndexMap::new();
        for (name, cam_config) in &config.cameras {
            cameras.insert(name.clone(), factory.camera(name, cam_config)?);
        }
        Self::from_parts(config, left, right, cameras)
    }

    /// Assemble a follower from already built drivers.
    ///
    /// # Errors
    ///
    /// Returns [`Dk1Error::Config`] when a camera name collides with a
    /// namespaced motor key.
    pub fn from_parts(
        config: BiFollowerConfig,
        left: Box<dyn FollowerArm>,
        right: Box<dyn FollowerArm>,
        cameras: IndexMap<String, Box<dyn Camera>>,
    ) -> Result<Self, Dk1Error> {
        let follower = Self {
            config,
            arms: PairedArms::new(left, right),
            cameras,
            camera_latency: BTreeMap::new(),
            observation_features: OnceLock::new(),
            action_features: OnceLock::new(),
        };
        let clashes = schema::colliding_keys(follower.action_features(), &follower.camera_features());
        if !clashes.is_empty() {
            return Err(Dk1Error::Config(format!(
                "camera names collide with motor keys: {}",
                clashes.join(", ")
            )));
        }
        Ok(follower)
    }

    pub fn config(&self) -> &BiFollowerConfig {
        &self.config
    }

    pub fn arm(&self, side: Side) -> &dyn FollowerArm {
        self.arms.arm(side)
    }

    pub fn camera(&self, name: &str) -> Option<&dyn Camera> {
        self.cameras.get(name).map(|cam| &**cam)
    }

    pub fn camera_names(&self) -> impl Iterator<Item = &str> {
        self.cameras.keys().map(String::as_str)
    }

    /// Duration of the most recent `read` of `camera`, if any.
    pub fn last_camera_latency(&self, camera: &str) -> Option<Duration> {
        self.camera_latency.get(camera).copied()
    }

    fn camera_features(&self) -> Features {
        schema::camera_features(
            self.cameras
                .iter()
                .map(|(name, cam)| (name.as_str(), cam.height(), cam.width())),
        )
    }

    // ── Schema ────────────────────────────────────────────────────────────

    /// Namespaced motor positions plus one image entry per camera.
    pub fn observation_features(&self) -> &Features {
        self.observation_features.get_or_init(|| {
            schema::observation_features(self.action_features(), &self.camera_features())
        })
    }

    /// Namespaced motor positions of both arms.
    pub fn action_features(&self) -> &Features {
        self.action_features.get_or_init(|| self.arms.motor_features())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// True iff both arms and every camera report connected.
    pub fn is_connected(&self) -> bool {
        self.arms.is_connected() && self.cameras.values().all(|cam| cam.is_connected())
    }

    pub fn connect(&mut self) -> Result<(), Dk1Error> {
        self.arms.connect()?;
        for cam in self.cameras.values_mut() {
            cam.connect()?;
        }
        info!(device = Self::NAME, cameras = self.cameras.len(), "connected");
        Ok(())
    }

    /// Always true. Calibration lives inside each arm driver's own
    /// connect/configure path; the composite holds no calibration state.
    pub fn is_calibrated(&self) -> bool {
        true
    }

    /// No-op, see [`BiFollower::is_calibrated`].
    pub fn calibrate(&mut self) -> Result<(), Dk1Error> {
        Ok(())
    }

    /// Configure left then right arm. Cameras have no configure step.
    pub fn configure(&mut self) -> Result<(), Dk1Error> {
        self.arms.configure()
    }

    pub fn disconnect(&mut self) -> Result<(), Dk1Error> {
        let mut teardown = Teardown::new();
        self.arms.disconnect(&mut teardown);
        for (name, cam) in self.cameras.iter_mut() {
            teardown.record(name, cam.disconnect());
        }
        info!(device = Self::NAME, failures = teardown.failures(), "disconnected");
        teardown.finish()
    }

    // ── Data path ─────────────────────────────────────────────────────────

    /// Read both arms, then every camera, into one namespaced observation.
    pub fn get_observation(&mut self) -> Result<Observation, Dk1Error> {
        let motors = self.arms.read_prefixed(|arm| arm.get_observation())?;
        let mut observation: Observation = motors
            .into_iter()
            .map(|(key, value)| (key, ObservationValue::Scalar(value)))
            .collect();

        for (name, cam) in self.cameras.iter_mut() {
            let start = Instant::now();
            let frame = cam.read()?;
            let elapsed = start.elapsed();
            debug!(
                camera = %name,
                elapsed_ms = elapsed.as_secs_f64() * 1e3,
                "camera read"
            );
            self.camera_latency.insert(name.clone(), elapsed);
            observation.insert(name.clone(), ObservationValue::Frame(frame));
        }
        Ok(observation)
    }

    /// Split `action` by side, send each half to its arm and return the
    /// namespaced action the arms actually applied.
    ///
    /// Keys without a `left_`/`right_` prefix are handled per
    /// [`BiFollowerConfig::unknown_action_keys`].
    pub fn send_action(&mut self, action: &MotorMap) -> Result<MotorMap, Dk1Error> {
        let mut split = routing::partition_action(action, self.config.unknown_action_keys)?;
        let [left, right] = self
            .arms
            .try_each(|side, arm| arm.send_action(split.take(side)))?;
        Ok(routing::merge_prefixed(left, right))
    }
}

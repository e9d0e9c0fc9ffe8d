//! [`BimanualDevice`] and the [`make_device`] factory table.
//!
//! [`DeviceConfig`] enumerates every composite type; `make_device` maps each
//! variant to its constructor. There is no string-keyed global registry.

use dk1_hal::DeviceFactory;
use dk1_types::{DeviceConfig, Dk1Error, Features};

use crate::follower::BiFollower;
use crate::leader::BiLeader;

/// Lifecycle and schema surface common to both composites.
pub trait BimanualDevice {
    fn name(&self) -> &'static str;
    fn action_features(&self) -> &Features;
    fn is_connected(&self) -> bool;
    fn is_calibrated(&self) -> bool;
    fn connect(&mut self) -> Result<(), Dk1Error>;
    fn configure(&mut self) -> Result<(), Dk1Error>;
    fn calibrate(&mut self) -> Result<(), Dk1Error>;
    fn disconnect(&mut self) -> Result<(), Dk1Error>;
}

macro_rules! impl_bimanual_device {
    ($ty:ty) => {
        impl BimanualDevice for $ty {
            fn name(&self) -> &'static str {
                <$ty>::NAME
            }
            fn action_features(&self) -> &Features {
                <$ty>::action_features(self)
            }
            fn is_connected(&self) -> bool {
                <$ty>::is_connected(self)
            }
            fn is_calibrated(&self) -> bool {
                <$ty>::is_calibrated(self)
            }
            fn connect(&mut self) -> Result<(), Dk1Error> {
                <$ty>::connect(self)
            }
            fn configure(&mut self) -> Result<(), Dk1Error> {
                <$ty>::configure(self)
            }
            fn calibrate(&mut self) -> Result<(), Dk1Error> {
                <$ty>::calibrate(self)
            }
            fn disconnect(&mut self) -> Result<(), Dk1Error> {
                <$ty>::disconnect(self)
            }
        }
    };
}

impl_bimanual_device!(BiFollower);
impl_bimanual_device!(BiLeader);

/// A constructed composite of either kind.
pub enum Device {
    Follower(BiFollower),
    Leader(BiLeader),
}

impl Device {
    pub fn as_device(&self) -> &dyn BimanualDevice {
        match self {
            Device::Follower(f) => f,
            Device::Leader(l) => l,
        }
    }

    pub fn as_device_mut(&mut self) -> &mut dyn BimanualDevice {
        match self {
            Device::Follower(f) => f,
            Device::Leader(l) => l,
        }
    }

    /// Observation schema for followers, `None` for leaders.
    pub fn observation_features(&self) -> Option<&Features> {
        match self {
            Device::Follower(f) => Some(f.observation_features()),
            Device::Leader(_) => None,
        }
    }

    pub fn into_follower(self) -> Result<BiFollower, Dk1Error> {
        match self {
            Device::Follower(f) => Ok(f),
            Device::Leader(_) => Err(Dk1Error::Config(format!(
                "expected {}, got {}",
                BiFollower::NAME,
                BiLeader::NAME
            ))),
        }
    }

    pub fn into_leader(self) -> Result<BiLeader, Dk1Error> {
        match self {
            Device::Leader(l) => Ok(l),
            Device::Follower(_) => Err(Dk1Error::Config(format!(
                "expected {}, got {}",
                BiLeader::NAME,
                BiFollower::NAME
            ))),
        }
    }
}

/// Build the composite described by `config` with drivers from `factory`.
pub fn make_device(config: &DeviceConfig, factory: &dyn DeviceFactory) -> Result<Device, Dk1Error> {
    match config {
        DeviceConfig::BiFollower(cfg) => BiFollower::new(cfg.clone(), factory).map(Device::Follower),
        DeviceConfig::BiLeader(cfg) => BiLeader::new(cfg.clone(), factory).map(Device::Leader),
    }
}

//! `dk1-hal` – driver interfaces for single arms and cameras.
//!
//! The bimanual composites in `dk1-bimanual` never touch hardware; they talk
//! to the traits defined here and own boxed drivers built by a
//! [`DeviceFactory`].
//!
//! # Modules
//!
//! - [`arm`] – [`ArmUnit`], [`FollowerArm`] and [`LeaderArm`]: the lifecycle
//!   and data interface of one manipulator.
//! - [`camera`] – [`Camera`]: a frame source with a fixed resolution.
//! - [`factory`] – [`DeviceFactory`]: builds drivers from per-device configs.
//! - [`sim`] – in-process simulated drivers and [`SimFactory`], used by
//!   tests and the `dk1` CLI when no hardware is attached.

pub mod arm;
pub mod camera;
pub mod factory;
pub mod sim;

pub use arm::{ArmUnit, FollowerArm, LeaderArm, DK1_MOTORS};
pub use camera::Camera;
pub use factory::DeviceFactory;
pub use sim::{SimCamera, SimFactory, SimFollowerArm, SimLeaderArm};

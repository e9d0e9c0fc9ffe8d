//! `dk1-bimanual` – Bimanual composition layer.
//!
//! Composes two single-arm drivers (and, for followers, named cameras) into
//! one device with a unified, side-namespaced control surface. The
//! composites never touch hardware; every physical operation is delegated to
//! the owned drivers, left arm first, then right arm, then cameras.
//!
//! # Modules
//!
//! - [`schema`] – derives namespaced feature schemas from native motor sets
//!   and camera resolutions.
//! - [`routing`] – prefixes outbound keys and partitions inbound actions by
//!   side.
//! - [`paired`] – [`PairedArms`][paired::PairedArms]: left/right lifecycle
//!   aggregation, generic over the arm capability set.
//! - [`follower`] – [`BiFollower`]: observations, actions and cameras.
//! - [`leader`] – [`BiLeader`]: actions only; feedback is unsupported.
//! - [`device`] – [`BimanualDevice`] and the [`make_device`] factory table.

pub mod device;
pub mod follower;
pub mod leader;
pub mod paired;
pub mod routing;
pub mod schema;

#[cfg(test)]
mod testing;

pub use device::{make_device, BimanualDevice, Device};
pub use follower::BiFollower;
pub use leader::BiLeader;
pub use paired::PairedArms;

//! Leader → follower teleoperation loop.
//!
//! Each tick reads the follower's observation, reads the leader's action,
//! sends it to the follower and compares the realized echo against what was
//! commanded. The loop sleeps out the rest of each period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dk1_bimanual::{BiFollower, BiLeader};
use dk1_types::{Dk1Error, MotorMap};
use tracing::{debug, info};

/// Loop bounds.
#[derive(Debug, Clone, Copy)]
pub struct TeleopOptions {
    pub fps: u32,
    /// Stop after this many ticks; `None` runs until `shutdown` is set.
    pub max_steps: Option<u64>,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeleopStats {
    pub steps: u64,
    /// Commanded values the follower did not apply as sent.
    pub limited_values: u64,
    pub slowest_tick: Duration,
}

/// Count entries whose realized value differs from the commanded one,
/// including commanded keys the follower dropped.
pub fn count_limited(commanded: &MotorMap, realized: &MotorMap) -> u64 {
    commanded
        .iter()
        .filter(|(key, value)| {
            realized
                .get(*key)
                .is_none_or(|applied| (applied - *value).abs() > 1e-6)
        })
        .count() as u64
}

/// Drive `follower` from `leader` until `max_steps` or `shutdown`.
///
/// Both devices must already be connected.
pub fn run(
    leader: &mut BiLeader,
    follower: &mut BiFollower,
    options: TeleopOptions,
    shutdown: &AtomicBool,
) -> Result<TeleopStats, Dk1Error> {
    if !leader.is_connected() {
        return Err(Dk1Error::NotConnected(BiLeader::NAME.to_string()));
    }
    if !follower.is_connected() {
        return Err(Dk1Error::NotConnected(BiFollower::NAME.to_string()));
    }

    let period = Duration::from_secs_f64(1.0 / f64::from(options.fps.max(1)));
    let mut stats = TeleopStats::default();
    info!(fps = options.fps, max_steps = ?options.max_steps, "teleoperation started");

    while !shutdown.load(Ordering::SeqCst) && options.max_steps.is_none_or(|max| stats.steps < max) {
        let start = Instant::now();

        let observation = follower.get_observation()?;
        let action = leader.get_action()?;
        let realized = follower.send_action(&action)?;

        let limited = count_limited(&action, &realized);
        stats.limited_values += limited;
        stats.steps += 1;

        let elapsed = start.elapsed();
        stats.slowest_tick = stats.slowest_tick.max(elapsed);
        debug!(
            step = stats.steps,
            observed = observation.len(),
            limited,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "tick"
        );

        if let Some(rest) = period.checked_sub(elapsed) {
            std::thread::sleep(rest);
        }
    }

    info!(steps = stats.steps, limited = stats.limited_values, "teleoperation stopped");
    Ok(stats)
}

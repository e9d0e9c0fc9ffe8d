//! [`PairedArms`] – the left/right aggregation shared by every composite.
//!
//! Generic over the arm capability set (`dyn FollowerArm` or
//! `dyn LeaderArm`), so the lifecycle and namespacing rules are written once.
//! Every operation visits the left arm and completes it before the right arm
//! is touched.

use dk1_hal::ArmUnit;
use dk1_types::{Dk1Error, Features, MotorMap, Side};
use tracing::warn;

use crate::routing;
use crate::schema;

/// Exclusive owner of a left and a right arm driver.
pub struct PairedArms<A: ArmUnit + ?Sized> {
    left: Box<A>,
    right: Box<A>,
}

impl<A: ArmUnit + ?Sized> PairedArms<A> {
    pub fn new(left: Box<A>, right: Box<A>) -> Self {
        Self { left, right }
    }

    pub fn arm(&self, side: Side) -> &A {
        match side {
            Side::Left => &*self.left,
            Side::Right => &*self.right,
        }
    }

    pub fn arm_mut(&mut self, side: Side) -> &mut A {
        match side {
            Side::Left => &mut *self.left,
            Side::Right => &mut *self.right,
        }
    }

    /// True iff both arms report connected.
    pub fn is_connected(&self) -> bool {
        self.left.is_connected() && self.right.is_connected()
    }

    /// Run `op` on the left arm, then on the right arm. The first failure is
    /// returned immediately and the right arm is not visited.
    pub fn try_each<T, F>(&mut self, mut op: F) -> Result<[T; 2], Dk1Error>
    where
        F: FnMut(Side, &mut A) -> Result<T, Dk1Error>,
    {
        let left = op(Side::Left, &mut *self.left)?;
        let right = op(Side::Right, &mut *self.right)?;
        Ok([left, right])
    }

    /// Connect left then right. No rollback: a right-arm failure leaves the
    /// left arm connected.
    pub fn connect(&mut self) -> Result<(), Dk1Error> {
        self.try_each(|_, arm| arm.connect())?;
        Ok(())
    }

    pub fn configure(&mut self) -> Result<(), Dk1Error> {
        self.try_each(|_, arm| arm.configure())?;
        Ok(())
    }

    /// Attempt to disconnect both arms regardless of earlier failures.
    pub fn disconnect(&mut self, teardown: &mut Teardown) {
        for side in Side::BOTH {
            let arm = self.arm_mut(side);
            let result = arm.disconnect();
            teardown.record(arm.name(), result);
        }
    }

    /// Call `read` on each arm and merge the namespaced results.
    pub fn read_prefixed<F>(&mut self, mut read: F) -> Result<MotorMap, Dk1Error>
    where
        F: FnMut(&mut A) -> Result<MotorMap, Dk1Error>,
    {
        let [left, right] = self.try_each(|_, arm| read(arm))?;
        Ok(routing::merge_prefixed(left, right))
    }

    /// Namespaced position features over both arms' motor sets.
    pub fn motor_features(&self) -> Features {
        schema::motor_features(self.left.motors(), self.right.motors())
    }
}

/// Best-effort teardown accumulator.
///
/// Every failure is logged; the first one is kept and returned by
/// [`Teardown::finish`] once all sub-devices have been attempted.
#[derive(Debug, Default)]
pub struct Teardown {
    first_error: Option<Dk1Error>,
    failures: usize,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, component: &str, result: Result<(), Dk1Error>) {
        if let Err(e) = result {
            warn!(component = %component, error = %e, "disconnect failed");
            self.failures += 1;
            self.first_error.get_or_insert(e);
        }
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn finish(self) -> Result<(), Dk1Error> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{calls, new_log, MockArm};
    use dk1_hal::FollowerArm;

    fn pair(left: MockArm, right: MockArm) -> PairedArms<dyn FollowerArm> {
        PairedArms::new(Box::new(left), Box::new(right))
    }

    #[test]
    fn connect_visits_left_then_right() {
        let log = new_log();
        let mut arms = pair(MockArm::new("left", &log), MockArm::new("right", &log));
        arms.connect().unwrap();
        assert!(arms.is_connected());
        assert_eq!(calls(&log), vec!["left.connect", "right.connect"]);
    }

    #[test]
    fn left_failure_skips_right() {
        let log = new_log();
        let mut arms = pair(
            MockArm::new("left", &log).failing_on("configure"),
            MockArm::new("right", &log),
        );
        assert!(arms.configure().is_err());
        assert_eq!(calls(&log), vec!["left.configure"]);
    }

    #[test]
    fn disconnect_attempts_both_and_keeps_first_error() {
        let log = new_log();
        let mut arms = pair(
            MockArm::new("left", &log).failing_on("disconnect"),
            MockArm::new("right", &log).failing_on("disconnect"),
        );
        let mut teardown = Teardown::new();
        arms.disconnect(&mut teardown);
        assert_eq!(teardown.failures(), 2);
        assert_eq!(calls(&log), vec!["left.disconnect", "right.disconnect"]);

        match teardown.finish() {
            Err(Dk1Error::HardwareFault { component, .. }) => assert_eq!(component, "left"),
            other => panic!("expected left fault, got {other:?}"),
        }
    }

    #[test]
    fn read_prefixed_namespaces_each_side() {
        let log = new_log();
        let mut arms = pair(
            MockArm::new("left", &log).reading(MotorMap::from([("j.pos".to_string(), 1.0)])),
            MockArm::new("right", &log).reading(MotorMap::from([("j.pos".to_string(), 2.0)])),
        );
        let merged = arms.read_prefixed(|arm| arm.get_observation()).unwrap();
        assert_eq!(merged["left_j.pos"], 1.0);
        assert_eq!(merged["right_j.pos"], 2.0);
        assert_eq!(merged.len(), 2);
    }
}

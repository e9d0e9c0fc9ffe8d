//! Recording test doubles shared by the composite tests.
//!
//! Every driver appends `"<label>.<op>"` to a shared [`CallLog`] so tests can
//! assert on cross-device ordering after ownership moved into a composite.

use std::sync::{Arc, Mutex};

use dk1_hal::{ArmUnit, Camera, FollowerArm, LeaderArm};
use dk1_types::{position_key, CameraFrame, Dk1Error, MotorMap, CAMERA_CHANNELS};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn fault(label: &str, op: &str) -> Dk1Error {
    Dk1Error::HardwareFault {
        component: label.to_string(),
        details: format!("{op} failed"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Arm
// ────────────────────────────────────────────────────────────────────────────

pub struct MockArm {
    label: String,
    log: CallLog,
    motors: Vec<String>,
    connected: bool,
    fail_on: Option<&'static str>,
    reading: MotorMap,
    clamp: Option<f32>,
    received: Arc<Mutex<Vec<MotorMap>>>,
}

impl MockArm {
    pub fn new(label: &str, log: &CallLog) -> Self {
        Self::with_motors(label, log, &["joint_1", "gripper"])
    }

    pub fn with_motors(label: &str, log: &CallLog, motors: &[&str]) -> Self {
        let motors: Vec<String> = motors.iter().map(|m| m.to_string()).collect();
        Self {
            reading: motors.iter().map(|m| (position_key(m), 0.0)).collect(),
            motors,
            label: label.to_string(),
            log: log.clone(),
            connected: false,
            fail_on: None,
            clamp: None,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make `op` fail with a hardware fault.
    pub fn failing_on(mut self, op: &'static str) -> Self {
        self.fail_on = Some(op);
        self
    }

    /// Clamp every commanded value to `[-limit, limit]`.
    pub fn clamping(mut self, limit: f32) -> Self {
        self.clamp = Some(limit);
        self
    }

    pub fn reading(mut self, reading: MotorMap) -> Self {
        self.reading = reading;
        self
    }

    /// Handle on every action this arm received, in order.
    pub fn received(&self) -> Arc<Mutex<Vec<MotorMap>>> {
        self.received.clone()
    }

    fn record(&self, op: &str) -> Result<(), Dk1Error> {
        self.log.lock().unwrap().push(format!("{}.{op}", self.label));
        if self.fail_on == Some(op) {
            return Err(fault(&self.label, op));
        }
        Ok(())
    }
}

impl ArmUnit for MockArm {
    fn name(&self) -> &str {
        &self.label
    }
    fn motors(&self) -> &[String] {
        &self.motors
    }
    fn connect(&mut self) -> Result<(), Dk1Error> {
        self.record("connect")?;
        self.connected = true;
        Ok(())
    }
    fn disconnect(&mut self) -> Result<(), Dk1Error> {
        self.record("disconnect")?;
        self.connected = false;
        Ok(())
    }
    fn configure(&mut self) -> Result<(), Dk1Error> {
        self.record("configure")
    }
    fn calibrate(&mut self) -> Result<(), Dk1Error> {
        self.record("calibrate")
    }
    fn is_connected(&self) -> bool {
        self.connected
    }
    fn is_calibrated(&self) -> bool {
        false
    }
}

impl FollowerArm for MockArm {
    fn get_observation(&mut self) -> Result<MotorMap, Dk1Error> {
        self.record("get_observation")?;
        Ok(self.reading.clone())
    }

    fn send_action(&mut self, action: MotorMap) -> Result<MotorMap, Dk1Error> {
        self.record("send_action")?;
        self.received.lock().unwrap().push(action.clone());
        Ok(match self.clamp {
            Some(limit) => action
                .into_iter()
                .map(|(k, v)| (k, v.clamp(-limit, limit)))
                .collect(),
            None => action,
        })
    }
}

impl LeaderArm for MockArm {
    fn get_action(&mut self) -> Result<MotorMap, Dk1Error> {
        self.record("get_action")?;
        Ok(self.reading.clone())
    }

    fn setup_motors(&mut self) -> Result<(), Dk1Error> {
        self.record("setup_motors")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Camera
// ────────────────────────────────────────────────────────────────────────────

pub struct MockCamera {
    id: String,
    log: CallLog,
    height: u32,
    width: u32,
    connected: bool,
    fail_on: Option<&'static str>,
}

impl MockCamera {
    pub fn new(id: &str, log: &CallLog, height: u32, width: u32) -> Self {
        Self {
            id: id.to_string(),
            log: log.clone(),
            height,
            width,
            connected: false,
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, op: &'static str) -> Self {
        self.fail_on = Some(op);
        self
    }

    fn record(&self, op: &str) -> Result<(), Dk1Error> {
        self.log.lock().unwrap().push(format!("{}.{op}", self.id));
        if self.fail_on == Some(op) {
            return Err(fault(&self.id, op));
        }
        Ok(())
    }
}

impl Camera for MockCamera {
    fn id(&self) -> &str {
        &self.id
    }
    fn connect(&mut self) -> Result<(), Dk1Error> {
        self.record("connect")?;
        self.connected = true;
        Ok(())
    }
    fn disconnect(&mut self) -> Result<(), Dk1Error> {
        self.record("disconnect")?;
        self.connected = false;
        Ok(())
    }
    fn is_connected(&self) -> bool {
        self.connected
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn width(&self) -> u32 {
        self.width
    }
    fn read(&mut self) -> Result<CameraFrame, Dk1Error> {
        self.record("read")?;
        Ok(CameraFrame::blank(self.height, self.width, CAMERA_CHANNELS))
    }
}

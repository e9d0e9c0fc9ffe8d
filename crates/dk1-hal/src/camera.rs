//! Generic `Camera` trait for image-capture hardware.

use dk1_types::{CameraFrame, Dk1Error};

/// A camera or image-capture device with a fixed configured resolution.
///
/// `read` may be backed by an asynchronous capture thread inside the driver;
/// callers treat it as a blocking call returning the latest frame.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"wrist_left"`.
    fn id(&self) -> &str;

    fn connect(&mut self) -> Result<(), Dk1Error>;

    fn disconnect(&mut self) -> Result<(), Dk1Error>;

    fn is_connected(&self) -> bool;

    fn height(&self) -> u32;

    fn width(&self) -> u32;

    /// Return the latest `height × width × 3` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Dk1Error::NotConnected`] before `connect`, or
    /// [`Dk1Error::HardwareFault`] if the frame cannot be captured.
    fn read(&mut self) -> Result<CameraFrame, Dk1Error>;
}

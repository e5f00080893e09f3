//! Interfaces to the sensing collaborators the mission consumes.
//!
//! The camera/reflectance hardware and the IMU driver live with the board;
//! the mission only sees these traits.

pub mod dead_reckoning;
pub mod line;

pub use dead_reckoning::DeadReckoning;
pub use line::Line;

/// Line-tracking collaborator.
pub trait LineTracker {
    /// Begin continuous sensing.
    fn start(&mut self);

    /// Run one detection pass and return the steering command.
    fn calculate(&mut self) -> i16;

    /// Geometry from the last `calculate`, `None` when no line was seen.
    fn line(&self) -> Option<Line>;

    /// Heading error in degrees from the last `calculate`.
    fn theta_err(&self) -> f32;
}

/// One linear-acceleration sample, gravity removed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    /// m/s², sensor frame
    pub accel: [f32; 3],
    pub timestamp_us: u64,
}

/// Inertial collaborator feeding dead reckoning.
#[allow(async_fn_in_trait)]
pub trait Imu {
    type Error: core::fmt::Debug;

    async fn read(&mut self) -> Result<ImuSample, Self::Error>;
}

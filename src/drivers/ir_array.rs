use embassy_stm32::gpio::{AnyPin, Input};

use patio_controller::sensing::line::{line_from_array, steering_command};
use patio_controller::sensing::{Line, LineTracker};

pub const SENSOR_COUNT: usize = 5;

const SENSOR_SPACING_MM: f32 = 12.0;
/// Distance ahead of the array the centroid is projected to.
const LOOKAHEAD_MM: f32 = 40.0;
const STEERING_GAIN: f32 = 2.0;

/// Row of digital reflectance sensors. A sensor over the line pulls low.
pub struct IrLineArray<'d> {
    sensors: [Input<'d, AnyPin>; SENSOR_COUNT],
    running: bool,
    line: Option<Line>,
    theta_err: f32,
}

impl<'d> IrLineArray<'d> {
    pub fn new(sensors: [Input<'d, AnyPin>; SENSOR_COUNT]) -> Self {
        Self {
            sensors,
            running: false,
            line: None,
            theta_err: 0.0,
        }
    }
}

impl<'d> LineTracker for IrLineArray<'d> {
    fn start(&mut self) {
        self.running = true;
    }

    fn calculate(&mut self) -> i16 {
        if !self.running {
            return 0;
        }

        let active: [bool; SENSOR_COUNT] = core::array::from_fn(|i| self.sensors[i].is_low());
        self.line = line_from_array(&active, SENSOR_SPACING_MM, LOOKAHEAD_MM);

        match self.line {
            Some(line) => {
                self.theta_err = line.heading_error_deg();
                steering_command(self.theta_err, STEERING_GAIN)
            }
            // Lost: go straight, keep the last heading error for the host
            None => 0,
        }
    }

    fn line(&self) -> Option<Line> {
        self.line
    }

    fn theta_err(&self) -> f32 {
        self.theta_err
    }
}

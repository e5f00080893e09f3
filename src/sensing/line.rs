#[cfg_attr(test, allow(unused_imports))]
use micromath::F32Ext;

/// Steering command saturation.
pub const MAX_STEERING: i16 = 100;

/// Detected line as a segment in the vehicle frame (mm).
/// `x` is lateral (positive right), `y` is forward; `(x0, y0)` is the end
/// nearest to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Line {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Line {
    /// Angle between the line and the forward axis, degrees.
    /// Positive when the line bends to the right.
    pub fn heading_error_deg(&self) -> f32 {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        dx.atan2(dy).to_degrees()
    }
}

/// Proportional steering, saturated to ±`MAX_STEERING`.
pub fn steering_command(theta_err_deg: f32, gain: f32) -> i16 {
    let max = MAX_STEERING as f32;
    (theta_err_deg * gain).clamp(-max, max) as i16
}

/// Build a line from a row of reflectance sensors.
///
/// The row sits at the vehicle origin, sensors `spacing_mm` apart and centred
/// on the forward axis. The line runs from the origin to the centroid of the
/// active sensors projected `lookahead_mm` ahead. `None` if nothing is active.
pub fn line_from_array(active: &[bool], spacing_mm: f32, lookahead_mm: f32) -> Option<Line> {
    let centre = (active.len() as f32 - 1.0) / 2.0;

    let mut sum = 0.0f32;
    let mut hits = 0u32;
    for (i, _) in active.iter().enumerate().filter(|(_, on)| **on) {
        sum += (i as f32 - centre) * spacing_mm;
        hits += 1;
    }
    if hits == 0 {
        return None;
    }

    Some(Line {
        x0: 0.0,
        y0: 0.0,
        x1: sum / hits as f32,
        y1: lookahead_mm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.5
    }

    #[test]
    fn straight_line_has_no_heading_error() {
        let line = Line { x0: 0.0, y0: 0.0, x1: 0.0, y1: 50.0 };
        assert!(close(line.heading_error_deg(), 0.0));
    }

    #[test]
    fn diagonal_line_is_45_degrees() {
        let right = Line { x0: 0.0, y0: 0.0, x1: 30.0, y1: 30.0 };
        let left = Line { x0: 0.0, y0: 0.0, x1: -30.0, y1: 30.0 };
        assert!(close(right.heading_error_deg(), 45.0));
        assert!(close(left.heading_error_deg(), -45.0));
    }

    #[test]
    fn steering_saturates() {
        assert_eq!(steering_command(10.0, 2.0), 20);
        assert_eq!(steering_command(90.0, 2.0), MAX_STEERING);
        assert_eq!(steering_command(-90.0, 2.0), -MAX_STEERING);
    }

    #[test]
    fn centred_array_gives_straight_line() {
        let line = line_from_array(&[false, false, true, false, false], 10.0, 40.0).unwrap();
        assert_eq!(line.x1, 0.0);
        assert_eq!(line.y1, 40.0);
    }

    #[test]
    fn offset_array_leans_towards_active_side() {
        let line = line_from_array(&[false, false, false, true, true], 10.0, 40.0).unwrap();
        // sensors 3 and 4 sit at +10 and +20 mm
        assert_eq!(line.x1, 15.0);
        assert!(line.heading_error_deg() > 0.0);
    }

    #[test]
    fn empty_array_has_no_line() {
        assert_eq!(line_from_array(&[false; 5], 10.0, 40.0), None);
    }
}

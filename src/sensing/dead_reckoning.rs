use super::{Imu, ImuSample};

/// Longest step integrated in one go. Anything slower is a stall, not motion.
const MAX_DT_S: f32 = 0.05;

/// Position/velocity estimate integrated from linear acceleration.
#[derive(Debug, Default)]
pub struct DeadReckoning {
    pub velocity: [f32; 3],
    pub position: [f32; 3],
    last_timestamp_us: Option<u64>,
    samples: u32,
    read_errors: u32,
}

impl DeadReckoning {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one sample from the IMU and integrate it. Read errors are counted
    /// and the sample is skipped.
    pub async fn dead_reckoning<I: Imu>(&mut self, imu: &mut I) {
        match imu.read().await {
            Ok(sample) => self.integrate(sample),
            Err(_e) => {
                self.read_errors = self.read_errors.wrapping_add(1);
                crate::log_warn!("imu read failed ({} so far)", self.read_errors);
            }
        }
    }

    pub fn integrate(&mut self, sample: ImuSample) {
        let Some(last) = self.last_timestamp_us.replace(sample.timestamp_us) else {
            // first sample only starts the clock
            return;
        };
        if sample.timestamp_us <= last {
            return;
        }

        let dt = ((sample.timestamp_us - last) as f32 / 1_000_000.0).min(MAX_DT_S);
        let half_dt2 = 0.5 * dt * dt;
        for axis in 0..3 {
            let a = sample.accel[axis];
            self.position[axis] += self.velocity[axis] * dt + a * half_dt2;
            self.velocity[axis] += a * dt;
        }
        self.samples = self.samples.wrapping_add(1);
    }

    /// Samples actually integrated.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ax: f32, t_us: u64) -> ImuSample {
        ImuSample {
            accel: [ax, 0.0, 0.0],
            timestamp_us: t_us,
        }
    }

    #[test]
    fn first_sample_only_seeds_clock() {
        let mut dr = DeadReckoning::new();
        dr.integrate(sample(5.0, 1_000));
        assert_eq!(dr.samples(), 0);
        assert_eq!(dr.velocity, [0.0; 3]);
    }

    #[test]
    fn constant_acceleration_integrates() {
        let mut dr = DeadReckoning::new();
        // 1 m/s² for 10 × 10 ms = 0.1 s
        for i in 0..=10u64 {
            dr.integrate(sample(1.0, i * 10_000));
        }
        assert_eq!(dr.samples(), 10);
        assert!((dr.velocity[0] - 0.1).abs() < 1e-4);
        // x = ½at² = 0.005 m
        assert!((dr.position[0] - 0.005).abs() < 1e-4);
        assert_eq!(dr.velocity[1], 0.0);
    }

    #[test]
    fn stale_and_long_gaps_are_bounded() {
        let mut dr = DeadReckoning::new();
        dr.integrate(sample(1.0, 1_000_000));
        dr.integrate(sample(1.0, 1_000_000)); // same timestamp, skipped
        assert_eq!(dr.samples(), 0);

        dr.integrate(sample(1.0, 3_000_000)); // 2 s gap capped at 50 ms
        assert!((dr.velocity[0] - MAX_DT_S).abs() < 1e-6);
    }
}

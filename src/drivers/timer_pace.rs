use embassy_time::{Duration, Timer};

use patio_controller::scheduler::Pace;

/// Sleeps for a fixed period at every suspension point.
pub struct TimerPace {
    period: Duration,
}

impl TimerPace {
    pub const fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Pace for TimerPace {
    async fn pause(&mut self) {
        Timer::after(self.period).await;
    }
}

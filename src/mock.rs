//! Test doubles for the host link and the sensing collaborators.

use core::convert::Infallible;

use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

use crate::scheduler::Pace;
use crate::sensing::{Imu, ImuSample, Line, LineTracker};
use crate::state::TaskPhase;
use crate::tasks::mission_task::StopSignal;

/// Serial receiver fed from a script of `(delay_turns, byte)` pairs.
/// Pends forever once the script runs out, like an idle UART.
pub struct ScriptedRx {
    script: Vec<(u32, u8)>,
    pos: usize,
}

impl ScriptedRx {
    pub fn new(script: &[(u32, u8)]) -> Self {
        Self {
            script: script.to_vec(),
            pos: 0,
        }
    }
}

impl ErrorType for ScriptedRx {
    type Error = Infallible;
}

impl Read for ScriptedRx {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(&(delay, byte)) = self.script.get(self.pos) else {
            return core::future::pending().await;
        };
        for _ in 0..delay {
            embassy_futures::yield_now().await;
        }
        self.pos += 1;
        buf[0] = byte;
        Ok(1)
    }
}

/// Serial transmitter that keeps every write separately.
#[derive(Default)]
pub struct RecordingTx {
    pub writes: Vec<Vec<u8>>,
}

impl ErrorType for RecordingTx {
    type Error = Infallible;
}

impl Write for RecordingTx {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.writes.push(buf.to_vec());
        Ok(buf.len())
    }
}

/// Link fault reported by the failing transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFault;

impl embedded_io_async::Error for LinkFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Receiver that fails wherever the script holds `None`. Pends forever once
/// the script runs out.
pub struct FlakyRx {
    script: Vec<Option<u8>>,
    pos: usize,
}

impl FlakyRx {
    pub fn new(script: &[Option<u8>]) -> Self {
        Self {
            script: script.to_vec(),
            pos: 0,
        }
    }
}

impl ErrorType for FlakyRx {
    type Error = LinkFault;
}

impl Read for FlakyRx {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(&entry) = self.script.get(self.pos) else {
            return core::future::pending().await;
        };
        self.pos += 1;
        let byte = entry.ok_or(LinkFault)?;
        buf[0] = byte;
        Ok(1)
    }
}

/// Transmitter whose every write fails.
#[derive(Default)]
pub struct FailingTx {
    pub attempts: u32,
}

impl ErrorType for FailingTx {
    type Error = LinkFault;
}

impl Write for FailingTx {
    async fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
        self.attempts += 1;
        Err(LinkFault)
    }
}

/// Counts pauses without yielding.
#[derive(Default)]
pub struct CountingPace {
    pub pauses: u32,
}

impl Pace for CountingPace {
    async fn pause(&mut self) {
        self.pauses += 1;
    }
}

/// Line tracker returning a fixed command and heading error.
pub struct FakeTracker {
    command: i16,
    theta: f32,
    pub started: u32,
    pub calculated: u32,
}

impl FakeTracker {
    pub fn new(command: i16, theta: f32) -> Self {
        Self {
            command,
            theta,
            started: 0,
            calculated: 0,
        }
    }
}

impl LineTracker for FakeTracker {
    fn start(&mut self) {
        self.started += 1;
    }

    fn calculate(&mut self) -> i16 {
        self.calculated += 1;
        self.command
    }

    fn line(&self) -> Option<Line> {
        Some(Line {
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 40.0,
        })
    }

    fn theta_err(&self) -> f32 {
        self.theta
    }
}

/// IMU reporting constant forward acceleration at a 10 ms cadence.
pub struct FakeImu {
    accel_x: f32,
    now_us: u64,
    fail_every: Option<u32>,
    pub reads: u32,
}

impl FakeImu {
    pub fn new(accel_x: f32) -> Self {
        Self {
            accel_x,
            now_us: 0,
            fail_every: None,
            reads: 0,
        }
    }

    /// Every `n`-th read fails. The clock still advances on failed reads.
    pub fn failing_every(accel_x: f32, n: u32) -> Self {
        Self {
            fail_every: Some(n),
            ..Self::new(accel_x)
        }
    }
}

impl Imu for FakeImu {
    type Error = ();

    async fn read(&mut self) -> Result<ImuSample, Self::Error> {
        self.reads += 1;
        self.now_us += 10_000;
        if self.fail_every.is_some_and(|n| self.reads % n == 0) {
            return Err(());
        }
        Ok(ImuSample {
            accel: [self.accel_x, 0.0, 0.0],
            timestamp_us: self.now_us,
        })
    }
}

/// Raises the stop signal on the `n`-th check.
pub struct StopAfter {
    remaining: u32,
    pub checked: u32,
}

impl StopAfter {
    pub fn new(n: u32) -> Self {
        Self {
            remaining: n,
            checked: 0,
        }
    }
}

impl StopSignal for StopAfter {
    fn raised(&mut self, _task: TaskPhase) -> bool {
        self.checked += 1;
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

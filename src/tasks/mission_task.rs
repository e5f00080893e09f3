use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::scheduler::Pace;
use crate::sensing::{DeadReckoning, Imu, LineTracker};
use crate::state::{PatioPhase, SharedRegister, TaskPhase};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Code a patio (and the whole mission) returns when it is done.
pub type CompletionCode = u8;
pub const COMPLETE: CompletionCode = 0;

/// Target speed while following the line.
pub const LINE_FOLLOW_VELOCITY: i16 = 100;

// ── Stop signal ───────────────────────────────────────────────────────────────

/// Per-task stop flag, checked once per control iteration.
pub trait StopSignal {
    fn raised(&mut self, task: TaskPhase) -> bool;
}

/// Nothing ever stops a task. Task 1 then follows the line indefinitely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn raised(&mut self, _task: TaskPhase) -> bool {
        false
    }
}

/// (patio, task) pair as read back from the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MissionState {
    pub patio: PatioPhase,
    pub task: TaskPhase,
}

// ── Mission ───────────────────────────────────────────────────────────────────

/// Patio → task state machine.
///
/// Patio 1 runs whichever task the register points at; Task 1 follows the
/// line until its stop signal fires and then hands over to Task 2. Tasks 2
/// and 3 only record themselves. Patio 2 is a stub that ends the mission.
///
/// Without an IMU the mission runs degraded: dead reckoning is skipped for
/// good.
pub struct Mission<'r, M: RawMutex, L, I, S> {
    register: &'r SharedRegister<M>,
    tracker: L,
    imu: Option<I>,
    estimator: DeadReckoning,
    stop: S,
    iterations: u32,
}

impl<'r, M, L, I, S> Mission<'r, M, L, I, S>
where
    M: RawMutex,
    L: LineTracker,
    I: Imu,
    S: StopSignal,
{
    pub fn new(register: &'r SharedRegister<M>, tracker: L, imu: Option<I>, stop: S) -> Self {
        if imu.is_none() {
            crate::log_warn!("no IMU, dead reckoning disabled");
        }
        Self {
            register,
            tracker,
            imu,
            estimator: DeadReckoning::new(),
            stop,
            iterations: 0,
        }
    }

    pub fn state(&self) -> MissionState {
        let status = self.register.snapshot();
        MissionState {
            patio: status.patio_phase,
            task: status.task_phase,
        }
    }

    /// Control iterations run so far.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn estimator(&self) -> &DeadReckoning {
        &self.estimator
    }

    pub fn tracker(&self) -> &L {
        &self.tracker
    }

    pub fn imu(&self) -> Option<&I> {
        self.imu.as_ref()
    }

    pub fn stop_signal(&self) -> &S {
        &self.stop
    }

    /// Outer loop. Returns once Patio 2 reports completion.
    pub async fn run<P: Pace>(&mut self, pace: &mut P) -> CompletionCode {
        loop {
            match self.state().patio {
                PatioPhase::One => {
                    if self.start_patio_one(pace).await == COMPLETE {
                        self.register.set_patio_phase(PatioPhase::Two);
                    }
                }
                PatioPhase::Two => {
                    if self.start_patio_two() == COMPLETE {
                        return COMPLETE;
                    }
                }
            }
        }
    }

    async fn start_patio_one<P: Pace>(&mut self, pace: &mut P) -> CompletionCode {
        self.tracker.start();
        self.register.set_patio_phase(PatioPhase::One);
        crate::log_info!("In Patio 1");

        match self.state().task {
            TaskPhase::One => {
                self.register.set_task_phase(TaskPhase::One);
                crate::log_info!("Performing task 1");
                self.follow_line(pace).await;
            }
            TaskPhase::Two => {
                // bridge crossing, no control logic yet
                self.register.set_task_phase(TaskPhase::Two);
            }
            TaskPhase::Three => {
                // door passing, no control logic yet
                self.register.set_task_phase(TaskPhase::Three);
            }
        }

        COMPLETE
    }

    fn start_patio_two(&mut self) -> CompletionCode {
        self.register.set_patio_phase(PatioPhase::Two);
        crate::log_info!("In Patio 2, nothing to do, ending");
        COMPLETE
    }

    /// Task 1. One register update and one pause per iteration.
    async fn follow_line<P: Pace>(&mut self, pace: &mut P) {
        loop {
            let velocity = LINE_FOLLOW_VELOCITY;
            let command = self.tracker.calculate();
            if self.tracker.line().is_none() {
                crate::log_trace!("no line in view");
            }
            let theta_err = self.tracker.theta_err();
            self.register.set_control(command, theta_err, velocity);

            if let Some(imu) = self.imu.as_mut() {
                self.estimator.dead_reckoning(imu).await;
            }

            self.iterations = self.iterations.wrapping_add(1);
            if self.stop.raised(TaskPhase::One) {
                self.register.set_task_phase(TaskPhase::Two);
                break;
            }

            pace.pause().await;
        }
    }
}

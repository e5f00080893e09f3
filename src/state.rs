//! Status register shared between the mission loop and the protocol server.
//!
//! The mission writes phases and control outputs, the server copies the whole
//! record when it builds a snapshot frame. Both run on the same executor, so
//! every access is a short, non-awaiting critical section.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

// ── Phases ────────────────────────────────────────────────────────────────────

/// Active task inside the current patio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskPhase {
    /// Line following
    One = 1,
    /// Bridge crossing
    Two = 2,
    /// Door passing
    Three = 3,
}

impl TaskPhase {
    pub const fn number(self) -> u8 {
        self as u8
    }
}

/// Active patio (outer mission phase).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatioPhase {
    One = 1,
    Two = 2,
}

impl PatioPhase {
    pub const fn number(self) -> u8 {
        self as u8
    }
}

// ── Register ──────────────────────────────────────────────────────────────────

/// One full copy of the register. `Copy`, so a snapshot is just a read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusRegister {
    pub task_phase: TaskPhase,
    pub patio_phase: PatioPhase,
    /// Reserved, only ever holds its initial value.
    pub stage: u8,
    /// Steering command from the line tracker.
    pub control_command: i16,
    /// Heading error in degrees.
    pub control_angle: f32,
    /// Target speed.
    pub control_velocity: i16,
}

impl StatusRegister {
    /// Power-on state: patio 1, task 1, stage 1, controls zeroed.
    pub const fn new() -> Self {
        Self {
            task_phase: TaskPhase::One,
            patio_phase: PatioPhase::One,
            stage: 1,
            control_command: 0,
            control_angle: 0.0,
            control_velocity: 0,
        }
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the register, passed by reference to both tasks.
///
/// `M` picks the lock: `NoopRawMutex` when everything runs on one cooperative
/// executor, `CriticalSectionRawMutex` once interrupts or a second executor
/// can touch it.
pub struct SharedRegister<M: RawMutex> {
    inner: Mutex<M, RefCell<StatusRegister>>,
}

impl<M: RawMutex> SharedRegister<M> {
    pub const fn new() -> Self {
        Self::with_state(StatusRegister::new())
    }

    pub const fn with_state(state: StatusRegister) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(state)),
        }
    }

    /// Copy of every field taken in one critical section.
    pub fn snapshot(&self) -> StatusRegister {
        self.inner.lock(|cell| *cell.borrow())
    }

    pub fn task_phase(&self) -> TaskPhase {
        self.inner.lock(|cell| cell.borrow().task_phase)
    }

    pub fn patio_phase(&self) -> PatioPhase {
        self.inner.lock(|cell| cell.borrow().patio_phase)
    }

    pub fn set_task_phase(&self, phase: TaskPhase) {
        self.update(|reg| reg.task_phase = phase);
    }

    pub fn set_patio_phase(&self, phase: PatioPhase) {
        self.update(|reg| reg.patio_phase = phase);
    }

    pub fn set_stage(&self, stage: u8) {
        self.update(|reg| reg.stage = stage);
    }

    /// Writes the three control outputs together so a snapshot never sees a
    /// half-updated set.
    pub fn set_control(&self, command: i16, angle: f32, velocity: i16) {
        self.update(|reg| {
            reg.control_command = command;
            reg.control_angle = angle;
            reg.control_velocity = velocity;
        });
    }

    /// Arbitrary mutation. No validation, any value is accepted.
    pub fn update<R>(&self, f: impl FnOnce(&mut StatusRegister) -> R) -> R {
        self.inner.lock(|cell| f(&mut *cell.borrow_mut()))
    }
}

impl<M: RawMutex> Default for SharedRegister<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn starts_in_patio_one_task_one() {
        let reg: SharedRegister<NoopRawMutex> = SharedRegister::new();
        let snap = reg.snapshot();

        assert_eq!(snap.patio_phase, PatioPhase::One);
        assert_eq!(snap.task_phase, TaskPhase::One);
        assert_eq!(snap.stage, 1);
        assert_eq!(snap.control_command, 0);
        assert_eq!(snap.control_angle, 0.0);
        assert_eq!(snap.control_velocity, 0);
    }

    #[test]
    fn control_outputs_are_written_together() {
        let reg: SharedRegister<NoopRawMutex> = SharedRegister::new();
        reg.set_control(-42, 12.5, 100);

        let snap = reg.snapshot();
        assert_eq!(snap.control_command, -42);
        assert_eq!(snap.control_angle, 12.5);
        assert_eq!(snap.control_velocity, 100);
        // phases untouched
        assert_eq!(snap.task_phase, TaskPhase::One);
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let reg: SharedRegister<NoopRawMutex> = SharedRegister::new();
        let before = reg.snapshot();

        reg.set_task_phase(TaskPhase::Three);
        reg.set_patio_phase(PatioPhase::Two);
        reg.set_stage(7);

        assert_eq!(before.task_phase, TaskPhase::One);
        assert_eq!(reg.task_phase(), TaskPhase::Three);
        assert_eq!(reg.patio_phase(), PatioPhase::Two);
        assert_eq!(reg.snapshot().stage, 7);
    }

    #[test]
    fn phase_numbers_match_wire_values() {
        assert_eq!(TaskPhase::One.number(), 1);
        assert_eq!(TaskPhase::Three.number(), 3);
        assert_eq!(PatioPhase::Two.number(), 2);
    }
}

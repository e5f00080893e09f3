//! Cooperative scheduler for the two long-running tasks.
//!
//! Both tasks are plain futures polled from one executor task; control only
//! changes hands where a task awaits (a link read or a `Pace::pause`). Each
//! loop iteration of either task ends in a pause, so neither can starve the
//! other.

use core::convert::Infallible;
use core::future::Future;
use core::pin::pin;

use embassy_futures::select::{select, Either};

use crate::tasks::mission_task::CompletionCode;

/// Suspension point at the end of every task loop iteration.
#[allow(async_fn_in_trait)]
pub trait Pace {
    async fn pause(&mut self);
}

/// Gives the other task one turn and resumes immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldPace;

impl Pace for YieldPace {
    async fn pause(&mut self) {
        embassy_futures::yield_now().await;
    }
}

/// What happens to the protocol server once the mission loop returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutdownPolicy {
    /// Drop the server and return the mission's completion code.
    StopWithMission,
    /// Keep answering the host forever; `run` never returns.
    KeepServing,
}

/// Run the mission and the protocol server side by side.
///
/// The mission is polled first on every turn. Returns the mission's
/// completion code under `StopWithMission`; under `KeepServing` the server
/// continues alone and this never resolves.
pub async fn run<MF, SF>(policy: ShutdownPolicy, mission: MF, server: SF) -> CompletionCode
where
    MF: Future<Output = CompletionCode>,
    SF: Future<Output = Infallible>,
{
    let mut mission = pin!(mission);
    let mut server = pin!(server);

    match select(mission.as_mut(), server.as_mut()).await {
        Either::First(code) => {
            crate::log_info!("mission finished with code {}", code);
            match policy {
                ShutdownPolicy::StopWithMission => code,
                ShutdownPolicy::KeepServing => match server.await {},
            }
        }
        Either::Second(never) => match never {},
    }
}

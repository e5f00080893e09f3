#![cfg_attr(not(test), no_std)]

//! Patio mission controller core.
//!
//! Hardware-free half of the vehicle firmware: the shared status register,
//! the framed host protocol, the protocol server task, the patio/task mission
//! state machine and the cooperative scheduler that interleaves the two
//! tasks. Board bring-up and drivers live in the `patio-controller` binary.

pub mod logging;

pub mod protocol;
pub mod scheduler;
pub mod sensing;
pub mod state;
pub mod tasks;

#[cfg(test)]
pub(crate) mod mock;

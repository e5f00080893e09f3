use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io_async::{Read, Write};

use crate::protocol::{decode_command, encode_snapshot, Command, Frame};
use crate::scheduler::Pace;
use crate::state::SharedRegister;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServerState {
    Idle,
    AwaitingByte,
    Responding,
}

/// Host protocol server. Waits for one command byte and answers with a frame.
///
/// Remembers the last frame it built so `0xDD` can resend it verbatim. Before
/// the first snapshot that is the empty frame.
pub struct ProtocolServer<'r, M: RawMutex> {
    register: &'r SharedRegister<M>,
    last_frame: Frame,
    state: ServerState,
}

impl<'r, M: RawMutex> ProtocolServer<'r, M> {
    pub fn new(register: &'r SharedRegister<M>) -> Self {
        Self {
            register,
            last_frame: Frame::empty(),
            state: ServerState::Idle,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn last_frame(&self) -> &Frame {
        &self.last_frame
    }

    /// Dispatch one inbound byte. Returns the frame to send, if any.
    pub fn handle_byte(&mut self, byte: u8) -> Option<&Frame> {
        match decode_command(byte) {
            Command::SnapshotRequest => match encode_snapshot(&self.register.snapshot()) {
                Ok(frame) => {
                    crate::log_debug!("snapshot frame, {} byte payload", frame.payload().len());
                    self.last_frame = frame;
                    Some(&self.last_frame)
                }
                Err(e) => {
                    // keep the previous frame, send nothing
                    crate::log_error!("snapshot rejected: {:?}", e);
                    None
                }
            },
            Command::RepeatLast => {
                crate::log_debug!("repeat last frame");
                Some(&self.last_frame)
            }
            Command::Unknown(b) => {
                crate::log_trace!("ignoring byte {:#x}", b);
                None
            }
        }
    }

    /// Serve the host link forever.
    ///
    /// Link errors are logged and the loop carries on; there is no
    /// reconnection logic and no terminal state.
    pub async fn run<R, W, P>(&mut self, mut rx: R, mut tx: W, pace: &mut P) -> Infallible
    where
        R: Read,
        W: Write,
        P: Pace,
    {
        let mut byte = [0u8; 1];

        loop {
            self.state = ServerState::AwaitingByte;
            match rx.read(&mut byte).await {
                Ok(0) => {
                    pace.pause().await;
                    continue;
                }
                Ok(_) => {}
                Err(_) => {
                    crate::log_warn!("host link read error");
                    pace.pause().await;
                    continue;
                }
            }

            self.state = ServerState::Responding;
            if let Some(frame) = self.handle_byte(byte[0]) {
                if tx.write_all(frame.as_bytes()).await.is_err() {
                    crate::log_warn!("host link write error");
                }
            }

            pace.pause().await;
        }
    }
}

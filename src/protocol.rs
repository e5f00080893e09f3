//! Host link framing.
//!
//! Outbound frames: `[0xAA 0x55] [Len] [Payload...] [0xBB]`, payload is the
//! UTF-8 status snapshot. Inbound commands are single bytes.

use core::fmt::Write;

use crate::state::StatusRegister;

pub const FRAME_HEADER: [u8; 2] = [0xAA, 0x55];
pub const FRAME_TRAILER: u8 = 0xBB;
/// The length field is one byte.
pub const MAX_PAYLOAD_LEN: usize = 255;
/// Header (2) + Len (1) + Payload (N) + Trailer (1)
pub const FRAME_OVERHEAD: usize = 4;
pub const MAX_FRAME_LEN: usize = FRAME_OVERHEAD + MAX_PAYLOAD_LEN;

pub const CMD_SNAPSHOT: u8 = 0xCC;
pub const CMD_REPEAT_LAST: u8 = 0xDD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload does not fit the one-byte length field.
    PayloadTooLarge,
    /// Fewer bytes than the length field announces.
    Truncated,
    BadHeader,
    BadTrailer,
    /// More bytes than the length field announces.
    LengthMismatch,
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Build and send a fresh snapshot frame.
    SnapshotRequest,
    /// Resend the last frame verbatim.
    RepeatLast,
    /// Anything else. Ignored by the server.
    Unknown(u8),
}

pub fn decode_command(byte: u8) -> Command {
    match byte {
        CMD_SNAPSHOT => Command::SnapshotRequest,
        CMD_REPEAT_LAST => Command::RepeatLast,
        other => Command::Unknown(other),
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: heapless::Vec<u8, MAX_FRAME_LEN>,
}

impl Frame {
    /// `AA 55 00 BB`, sent when a repeat is requested before any snapshot.
    pub fn empty() -> Self {
        let mut bytes = heapless::Vec::new();
        let _ = bytes.extend_from_slice(&FRAME_HEADER);
        let _ = bytes.push(0);
        let _ = bytes.push(FRAME_TRAILER);
        Self { bytes }
    }

    /// Wrap a payload. Oversized payloads are rejected, never truncated.
    pub fn from_payload(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut bytes = heapless::Vec::new();
        bytes
            .extend_from_slice(&FRAME_HEADER)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        bytes
            .push(payload.len() as u8)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        bytes
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        bytes
            .push(FRAME_TRAILER)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self { bytes })
    }

    /// Validate one complete frame.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < FRAME_OVERHEAD {
            return Err(FrameError::Truncated);
        }
        if data[..2] != FRAME_HEADER {
            return Err(FrameError::BadHeader);
        }

        let total = FRAME_OVERHEAD + data[2] as usize;
        if data.len() < total {
            return Err(FrameError::Truncated);
        }
        if data.len() > total {
            return Err(FrameError::LengthMismatch);
        }
        if data[total - 1] != FRAME_TRAILER {
            return Err(FrameError::BadTrailer);
        }

        Self::from_payload(&data[3..total - 1])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[3..self.bytes.len() - 1]
    }

    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }
}

// ── Snapshot encoding ─────────────────────────────────────────────────────────

/// Serialise a register snapshot into a frame.
///
/// Fixed schema, fixed key order, compact separators:
/// `[{"Info_Task":1,"Info_Patio":1,"Info_Stage":1,"Control_Command":0,"Control_Angle":0,"Control_Velocity":0}]`
pub fn encode_snapshot(status: &StatusRegister) -> Result<Frame, FrameError> {
    let mut payload = heapless::String::<MAX_PAYLOAD_LEN>::new();
    write_snapshot(&mut payload, status).map_err(|_| FrameError::PayloadTooLarge)?;
    Frame::from_payload(payload.as_bytes())
}

fn write_snapshot(out: &mut impl Write, status: &StatusRegister) -> core::fmt::Result {
    write!(
        out,
        "[{{\"Info_Task\":{},\"Info_Patio\":{},\"Info_Stage\":{},\"Control_Command\":{},\"Control_Angle\":",
        status.task_phase.number(),
        status.patio_phase.number(),
        status.stage,
        status.control_command,
    )?;
    // JSON has no NaN/inf
    if status.control_angle.is_finite() {
        write!(out, "{}", status.control_angle)?;
    } else {
        out.write_str("null")?;
    }
    write!(out, ",\"Control_Velocity\":{}}}]", status.control_velocity)
}

// ── Stream parser (host side) ─────────────────────────────────────────────────

/// Reassembles frames from a raw byte stream.
///
/// A candidate that fails validation costs only its first byte: the rest of
/// the buffer is rescanned for the next header, so a stray `AA 55 len` never
/// swallows the real frames behind it.
pub struct FrameParser {
    buffer: heapless::Vec<u8, MAX_FRAME_LEN>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            buffer: heapless::Vec::new(),
        }
    }

    pub fn push_byte(&mut self, b: u8) -> Option<Frame> {
        if self.buffer.push(b).is_err() {
            // only reachable with a complete frame still queued
            self.discard(1);
            let _ = self.buffer.push(b);
        }
        self.next_frame()
    }

    /// Returns every complete frame found in `data`, in order.
    pub fn push_bytes(&mut self, data: &[u8]) -> heapless::Vec<Frame, 4> {
        let mut frames = heapless::Vec::new();
        for &b in data {
            let mut found = self.push_byte(b);
            while let Some(frame) = found {
                if frames.push(frame).is_err() {
                    crate::log_warn!("frame parser: dropping frame, caller queue full");
                }
                found = self.next_frame();
            }
        }
        frames
    }

    /// Pop the next complete frame already sitting in the buffer.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            self.align();
            if self.buffer.len() < 3 {
                return None;
            }

            let total = FRAME_OVERHEAD + self.buffer[2] as usize;
            if self.buffer.len() < total {
                return None;
            }

            if self.buffer[total - 1] == FRAME_TRAILER {
                if let Ok(frame) = Frame::parse(&self.buffer[..total]) {
                    self.discard(total);
                    return Some(frame);
                }
            }
            // false header: skip it and rescan
            self.discard(1);
        }
    }

    /// Drop bytes until the buffer starts with a (possibly partial) header.
    fn align(&mut self) {
        let len = self.buffer.len();
        let start = (0..len)
            .find(|&i| {
                self.buffer[i] == FRAME_HEADER[0]
                    && (i + 1 == len || self.buffer[i + 1] == FRAME_HEADER[1])
            })
            .unwrap_or(len);
        self.discard(start);
    }

    fn discard(&mut self, n: usize) {
        let len = self.buffer.len();
        let n = n.min(len);
        self.buffer.copy_within(n..len, 0);
        self.buffer.truncate(len - n);
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

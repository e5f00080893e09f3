//! `embedded-io-async` adapters over the UART4 DMA halves.
//!
//! Receive runs on a circular DMA buffer, so command bytes the host sends
//! while a frame is being written are queued rather than overrun.

use embassy_stm32::peripherals::{DMA1_CH2, DMA1_CH4, UART4};
use embassy_stm32::usart::{self, RingBufferedUartRx, UartRx, UartTx};
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

#[derive(Debug)]
pub struct LinkError(pub usart::Error);

impl embedded_io_async::Error for LinkError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Circular DMA buffer size. Covers well over one frame time of commands.
pub const RX_RING_LEN: usize = 64;

pub struct HostRx {
    rx: RingBufferedUartRx<'static, UART4, DMA1_CH2>,
}

impl HostRx {
    pub fn new(
        rx: UartRx<'static, UART4, DMA1_CH2>,
        ring: &'static mut [u8; RX_RING_LEN],
    ) -> Self {
        Self {
            rx: rx.into_ring_buffered(ring),
        }
    }
}

impl ErrorType for HostRx {
    type Error = LinkError;
}

impl Read for HostRx {
    /// Waits for at least one byte, then hands over what the ring holds.
    /// An overrun drops the ring contents and is reported once.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.rx.read(buf).await.map_err(LinkError)
    }
}

pub struct HostTx {
    tx: UartTx<'static, UART4, DMA1_CH4>,
}

impl HostTx {
    pub fn new(tx: UartTx<'static, UART4, DMA1_CH4>) -> Self {
        Self { tx }
    }
}

impl ErrorType for HostTx {
    type Error = LinkError;
}

impl Write for HostTx {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.write(buf).await.map_err(LinkError)?;
        Ok(buf.len())
    }
}

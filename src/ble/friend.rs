//! Transport session for the Bluefruit LE SPI Friend
//!
//! Drives one SDEP command/response exchange at a time over the SPI link:
//! chunks the outbound payload into frames, runs the chip-select handshake
//! with its not-ready retry loop, then polls the IRQ line and reassembles
//! the (possibly multi-frame) response.
//!
//! The session owns the bus, the select line, and the IRQ line for the
//! duration of one call; `&mut self` on every operation keeps exchanges
//! from overlapping.

use crate::ble::traits::{BleError, BleLink, Delay};
use crate::config::buffers::RESPONSE_BUFFER_SIZE;
use crate::config::timing::{
    INTER_FRAME_DELAY_US, MANDATORY_DELAY_US, READY_POLL_INTERVAL_US, READ_TIMEOUT_MS,
    RESET_SETTLE_MS, WRITE_RETRY_ATTEMPTS,
};
use crate::sdep::{
    Frame, Header, MessageType, CMD_AT_WRAPPER, CMD_BLE_UART_RX, CMD_BLE_UART_TX,
    CMD_INITIALIZE, ERR_DEVICE_NOT_READY, FILLER_BYTE, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use heapless::Vec;

/// Outcome of one attempt to read a frame.
enum ReadStatus {
    /// A response frame landed in the scratch buffer
    Frame,
    /// The peer signalled a transient condition; toggle select and retry
    Busy,
}

/// Session driving the SDEP exchange over an abstract link.
///
/// Scratch state (the in-flight frame and the response buffer) is cleared at
/// the start of each exchange and reused across calls; nothing is kept
/// between exchanges.
pub struct SpiFriend<L, D, const BUF_SIZE: usize = { RESPONSE_BUFFER_SIZE }>
where
    L: BleLink,
    D: Delay,
{
    link: L,
    delay: D,
    frame: Frame,
    response: Vec<u8, BUF_SIZE>,
}

impl<L, D, const BUF_SIZE: usize> SpiFriend<L, D, BUF_SIZE>
where
    L: BleLink,
    D: Delay,
{
    /// Create a session over the given link and timing source.
    pub fn new(link: L, delay: D) -> Self {
        Self {
            link,
            delay,
            frame: Frame::empty(),
            response: Vec::new(),
        }
    }

    /// Access the underlying link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Access the timing source.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Run one full command exchange.
    ///
    /// The payload is chunked into frames of at most
    /// [`MAX_PAYLOAD_SIZE`] bytes, the continuation flag set on every frame
    /// but the last. An empty payload still sends exactly one frame, with
    /// the filler byte standing in for the size byte. The returned slice is
    /// the concatenation of all response frame payloads and is valid until
    /// the next exchange.
    pub async fn execute(&mut self, id: u16, payload: &[u8]) -> Result<&[u8], BleError> {
        self.response.clear();

        if payload.is_empty() {
            self.send_frame(id, &[], false).await?;
        } else {
            let mut chunks = payload.chunks(MAX_PAYLOAD_SIZE).peekable();
            while let Some(chunk) = chunks.next() {
                let more_data = chunks.peek().is_some();
                self.send_frame(id, chunk, more_data).await?;
                if more_data {
                    // The peer needs a moment to drain its FIFO before it
                    // can take the next frame
                    self.delay.delay_us(INTER_FRAME_DELAY_US).await;
                }
            }
        }

        self.receive_response().await?;
        Ok(self.response.as_slice())
    }

    /// Send a text AT command and return the raw response bytes.
    pub async fn send_at(&mut self, command: &str) -> Result<&[u8], BleError> {
        self.execute(CMD_AT_WRAPPER, command.as_bytes()).await
    }

    /// Push data into the module's BLE UART service.
    pub async fn uart_tx(&mut self, data: &[u8]) -> Result<(), BleError> {
        self.execute(CMD_BLE_UART_TX, data).await?;
        Ok(())
    }

    /// Pull any pending data out of the module's BLE UART service.
    pub async fn uart_rx(&mut self) -> Result<&[u8], BleError> {
        self.execute(CMD_BLE_UART_RX, &[]).await
    }

    /// Send the initialize pattern, asking the module to reset.
    ///
    /// The module reboots instead of replying, so no response is read; the
    /// call just waits out the reboot settle time.
    pub async fn reset(&mut self) -> Result<(), BleError> {
        log::debug!("sdep: sending initialize pattern");
        self.send_frame(CMD_INITIALIZE, &[], false).await?;
        self.delay.delay_us(RESET_SETTLE_MS * 1_000).await;
        Ok(())
    }

    /// Write one command frame, driving the select handshake.
    async fn send_frame(
        &mut self,
        id: u16,
        payload: &[u8],
        more_data: bool,
    ) -> Result<(), BleError> {
        let header = Header::new(MessageType::Command, id, payload.len(), more_data)?;
        log::trace!(
            "sdep tx: id={:04x} len={} more={}",
            id,
            payload.len(),
            more_data
        );

        self.link.assert_select();
        let result = self.send_frame_selected(&header, payload).await;
        // Select must drop on every exit path
        self.link.release_select();
        result
    }

    async fn send_frame_selected(
        &mut self,
        header: &Header,
        payload: &[u8],
    ) -> Result<(), BleError> {
        // The peer answers the type byte with a status byte. Not-ready
        // means drop select, give it a moment, and offer the byte again.
        let mut accepted = false;
        for attempt in 0..WRITE_RETRY_ATTEMPTS {
            let status = self.link.transfer_byte(header.msg_type().as_byte()).await?;
            if status != ERR_DEVICE_NOT_READY {
                accepted = true;
                break;
            }
            log::trace!("sdep tx: peer not ready (attempt {})", attempt + 1);
            self.link.release_select();
            self.delay.delay_us(MANDATORY_DELAY_US).await;
            self.link.assert_select();
        }
        if !accepted {
            log::warn!("sdep tx: peer never accepted command {:04x}", header.id());
            return Err(BleError::WriteTimeout);
        }

        let bytes = header.encode();
        self.link.transfer_byte(bytes[1]).await?;
        self.link.transfer_byte(bytes[2]).await?;
        if payload.is_empty() {
            // A zero-payload frame carries a filler byte where the size
            // byte would go; the initialize pattern relies on this.
            self.link.transfer_byte(FILLER_BYTE).await?;
        } else {
            self.link.transfer_byte(bytes[3]).await?;
            for &byte in payload {
                self.link.transfer_byte(byte).await?;
            }
        }
        Ok(())
    }

    /// Wait for the peer and reassemble the response frames.
    async fn receive_response(&mut self) -> Result<(), BleError> {
        // Let the peer start processing before reasserting select
        self.delay.delay_us(INTER_FRAME_DELAY_US).await;
        self.link.assert_select();
        self.delay.delay_us(MANDATORY_DELAY_US).await;

        let result = self.receive_selected().await;
        self.link.release_select();
        result
    }

    async fn receive_selected(&mut self) -> Result<(), BleError> {
        // One poll budget covers the whole response: the wait for the IRQ
        // line, transient peer errors, and every continuation frame.
        let mut polls_left = READ_TIMEOUT_MS.saturating_mul(1_000) / READY_POLL_INTERVAL_US;
        loop {
            if !self.link.ready_asserted() {
                if polls_left == 0 {
                    log::warn!("sdep rx: timed out waiting for IRQ");
                    return Err(BleError::ReadTimeout);
                }
                polls_left -= 1;
                self.delay.delay_us(READY_POLL_INTERVAL_US).await;
                continue;
            }

            match self.read_frame().await? {
                ReadStatus::Busy => {
                    if polls_left == 0 {
                        return Err(BleError::ReadTimeout);
                    }
                    polls_left -= 1;
                    self.link.release_select();
                    self.delay.delay_us(INTER_FRAME_DELAY_US).await;
                    self.link.assert_select();
                    self.delay.delay_us(MANDATORY_DELAY_US).await;
                }
                ReadStatus::Frame => {
                    self.response
                        .extend_from_slice(self.frame.payload())
                        .map_err(|_| BleError::ResponseOverflow)?;
                    if !self.frame.header().more_data() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Read one frame into the scratch buffer.
    async fn read_frame(&mut self) -> Result<ReadStatus, BleError> {
        let type_byte = self.link.transfer_byte(FILLER_BYTE).await?;

        match MessageType::from_byte(type_byte) {
            Some(MessageType::Response) => {}
            Some(MessageType::Error) => {
                // Error frames carry a header and nothing worth keeping;
                // drain it and let the caller toggle select and retry
                let mut rest = [0u8; HEADER_SIZE - 1];
                self.link.read_bytes(&mut rest).await?;
                log::debug!(
                    "sdep rx: error frame id={:04x}",
                    u16::from_le_bytes([rest[0], rest[1]])
                );
                return Ok(ReadStatus::Busy);
            }
            Some(other) => {
                log::warn!("sdep rx: unexpected message type {:02x}", other.as_byte());
                return Err(BleError::UnexpectedMessageType(other.as_byte()));
            }
            None => {
                // Not-ready / read-overflow status bytes and wire garbage
                // are all transient: retry within the read window
                log::trace!("sdep rx: peer busy ({:02x})", type_byte);
                return Ok(ReadStatus::Busy);
            }
        }

        let mut rest = [0u8; HEADER_SIZE - 1];
        self.link.read_bytes(&mut rest).await?;
        let header = Header::from_wire(
            MessageType::Response,
            u16::from_le_bytes([rest[0], rest[1]]),
            rest[2],
        );

        // The five length bits can declare up to 31 bytes but the payload
        // buffer holds 16; clamp rather than read past it. The excess, if
        // the peer really sent any, is left on the wire.
        let length = header.length().min(MAX_PAYLOAD_SIZE);
        if length > 0 {
            let buf = self.frame.payload_mut();
            self.link.read_bytes(&mut buf[..length]).await?;
        }
        self.frame.set_header(header);
        log::trace!(
            "sdep rx: id={:04x} len={} more={}",
            header.id(),
            length,
            header.more_data()
        );
        Ok(ReadStatus::Frame)
    }
}

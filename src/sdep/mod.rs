//! SDEP (Simple Data Exchange Protocol) wire format
//!
//! The Bluefruit LE SPI Friend exchanges fixed-format packets: a four byte
//! header followed by at most sixteen payload bytes. This module is the pure
//! codec for that format; it performs no I/O.

mod frame;

pub use frame::{Frame, FrameError, Header};

/// Maximum size of one raw packet on the wire, header included.
pub const MAX_PACKET_SIZE: usize = 20;

/// Maximum payload carried by one frame.
pub const MAX_PAYLOAD_SIZE: usize = 16;

/// Header length in bytes: type, id low, id high, size.
pub const HEADER_SIZE: usize = 4;

/// Byte clocked out when the host is only reading, and written in place of
/// the size byte for a zero-payload frame.
pub const FILLER_BYTE: u8 = 0xFF;

/// In-band status bytes the peer substitutes for a message type when it
/// cannot service the transfer. Both are transient conditions.
pub const ERR_DEVICE_NOT_READY: u8 = 0xFE;
pub const ERR_READ_OVERFLOW: u8 = 0xFF;

/// Command identifier for the zero-payload initialize/reset pattern.
pub const CMD_INITIALIZE: u16 = 0xBEEF;
/// Command identifier wrapping a text AT command as payload.
pub const CMD_AT_WRAPPER: u16 = 0x0A00;
/// Command identifiers for BLE UART data in and out of the module.
pub const CMD_BLE_UART_TX: u16 = 0x0A01;
pub const CMD_BLE_UART_RX: u16 = 0x0A02;

/// Low five bits of the size byte carry the payload length.
pub(crate) const LENGTH_MASK: u8 = 0x1F;
/// Bit 7 of the size byte: more frames follow for this logical message.
pub(crate) const MORE_DATA_FLAG: u8 = 0x80;

/// Message type byte, the first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Host to module command
    Command = 0x10,
    /// Module to host reply
    Response = 0x20,
    /// Unsolicited notification
    Alert = 0x40,
    /// Error report from the module
    Error = 0x80,
}

impl MessageType {
    /// Map a wire byte to a message type. Returns `None` for the status
    /// sentinels and any other unrecognised value.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x10 => Some(MessageType::Command),
            0x20 => Some(MessageType::Response),
            0x40 => Some(MessageType::Alert),
            0x80 => Some(MessageType::Error),
            _ => None,
        }
    }

    /// The wire byte for this message type.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

//! Header and frame types for the SDEP packet format.

use super::{
    MessageType, HEADER_SIZE, LENGTH_MASK, MAX_PAYLOAD_SIZE, MORE_DATA_FLAG,
};

/// Errors from header construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Payload is longer than one frame can carry.
    PacketTooLarge,
}

/// The four byte SDEP header.
///
/// The size byte packs the payload length into bits 0-4 and the
/// continuation flag into bit 7. Bits 5-6 are undefined by the protocol and
/// pass through untouched in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    msg_type: MessageType,
    id: u16,
    size: u8,
}

impl Header {
    /// Build a header for an outbound frame.
    ///
    /// Fails with [`FrameError::PacketTooLarge`] if `length` exceeds
    /// [`MAX_PAYLOAD_SIZE`]. `more_data` sets the continuation flag.
    pub fn new(
        msg_type: MessageType,
        id: u16,
        length: usize,
        more_data: bool,
    ) -> Result<Self, FrameError> {
        if length > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PacketTooLarge);
        }
        let mut size = length as u8;
        if more_data {
            size |= MORE_DATA_FLAG;
        }
        Ok(Self { msg_type, id, size })
    }

    /// Build a header from fields read off the wire. The size byte is kept
    /// verbatim, undefined bits included.
    pub fn from_wire(msg_type: MessageType, id: u16, size: u8) -> Self {
        Self { msg_type, id, size }
    }

    /// Message type of this frame.
    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    /// Command identifier.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Declared payload length, low five bits of the size byte only.
    ///
    /// A malformed frame can declare up to 31; callers reading payload must
    /// clamp to [`MAX_PAYLOAD_SIZE`].
    pub fn length(&self) -> usize {
        (self.size & LENGTH_MASK) as usize
    }

    /// True when more frames follow for this logical message.
    pub fn more_data(&self) -> bool {
        self.size & MORE_DATA_FLAG != 0
    }

    /// The raw size byte as it appears on the wire.
    pub fn size_byte(&self) -> u8 {
        self.size
    }

    /// Encode as the four wire bytes: type, id low, id high, size.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let id = self.id.to_le_bytes();
        [self.msg_type.as_byte(), id[0], id[1], self.size]
    }

    /// Decode the four wire bytes. Returns `None` if the type byte is not a
    /// recognised message type.
    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Option<Self> {
        let msg_type = MessageType::from_byte(bytes[0])?;
        let id = u16::from_le_bytes([bytes[1], bytes[2]]);
        Some(Self::from_wire(msg_type, id, bytes[3]))
    }
}

/// One frame: header plus payload storage.
///
/// Reused as receive scratch by the transport session; never persisted
/// beyond a single transfer.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    header: Header,
    payload: [u8; MAX_PAYLOAD_SIZE],
}

impl Frame {
    /// An empty response frame, for use as scratch before the first read.
    pub fn empty() -> Self {
        Self {
            header: Header::from_wire(MessageType::Response, 0, 0),
            payload: [0; MAX_PAYLOAD_SIZE],
        }
    }

    /// This frame's header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Replace the header after reading a new one off the wire.
    pub fn set_header(&mut self, header: Header) {
        self.header = header;
    }

    /// The valid payload bytes.
    ///
    /// Clamped to the buffer size: a frame whose size byte declares more
    /// than [`MAX_PAYLOAD_SIZE`] bytes yields a truncated view rather than
    /// a read past the buffer. That truncation silently drops the excess,
    /// a known quirk of the wire format handling.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.header.length().min(MAX_PAYLOAD_SIZE)]
    }

    /// Mutable access to the full payload buffer for filling during reads.
    pub fn payload_mut(&mut self) -> &mut [u8; MAX_PAYLOAD_SIZE] {
        &mut self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        for length in 0..=MAX_PAYLOAD_SIZE {
            for more in [false, true] {
                let header =
                    Header::new(MessageType::Command, 0x0A00, length, more).unwrap();
                let decoded = Header::decode(header.encode()).expect("Should decode");
                assert_eq!(decoded.msg_type(), MessageType::Command);
                assert_eq!(decoded.id(), 0x0A00);
                assert_eq!(decoded.length(), length);
                assert_eq!(decoded.more_data(), more);
            }
        }
    }

    #[test]
    fn test_oversized_payload_rejected() {
        for length in (MAX_PAYLOAD_SIZE + 1)..=64 {
            let result = Header::new(MessageType::Command, 0x0001, length, false);
            assert_eq!(result, Err(FrameError::PacketTooLarge));
        }
    }

    #[test]
    fn test_wire_layout() {
        let header = Header::new(MessageType::Command, 0xBEEF, 3, true).unwrap();
        // type, id little-endian, size with continuation bit
        assert_eq!(header.encode(), [0x10, 0xEF, 0xBE, 0x83]);
    }

    #[test]
    fn test_undefined_size_bits_pass_through() {
        // Bits 5-6 are not length and not continuation
        let header = Header::from_wire(MessageType::Response, 0x0A00, 0x6F);
        assert_eq!(header.length(), 0x0F);
        assert!(!header.more_data());
        assert_eq!(header.size_byte(), 0x6F);
        assert_eq!(header.encode()[3], 0x6F);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(Header::decode([0xFE, 0x00, 0x00, 0x00]).is_none());
        assert!(Header::decode([0x33, 0x00, 0x00, 0x00]).is_none());
    }

    #[test]
    fn test_frame_payload_clamped() {
        let mut frame = Frame::empty();
        // Declares 31 bytes; buffer only holds 16
        frame.set_header(Header::from_wire(MessageType::Response, 0x0A00, 0x1F));
        assert_eq!(frame.payload().len(), MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_frame_payload_view() {
        let mut frame = Frame::empty();
        frame.payload_mut()[..2].copy_from_slice(b"OK");
        frame.set_header(Header::from_wire(MessageType::Response, 0x0A00, 2));
        assert_eq!(frame.payload(), b"OK");
    }
}

//! Link and timing traits for the Bluefruit SPI transport
//!
//! These traits define the seam between the transport session and the
//! physical SPI bus plus its two control lines, allowing the hardware to be
//! swapped with a mock for testing.

use core::future::Future;

/// Errors that can occur during a transport exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleError {
    /// Payload is longer than one frame can carry
    PacketTooLarge,
    /// Peer never accepted the command type byte within the retry ceiling
    WriteTimeout,
    /// No complete response arrived within the read window
    ReadTimeout,
    /// Peer sent a command or alert frame where a response was expected
    UnexpectedMessageType(u8),
    /// Reassembled response would exceed the response buffer
    ResponseOverflow,
    /// SPI bus failure
    Spi,
}

impl From<crate::sdep::FrameError> for BleError {
    fn from(err: crate::sdep::FrameError) -> Self {
        match err {
            crate::sdep::FrameError::PacketTooLarge => BleError::PacketTooLarge,
        }
    }
}

/// Abstract half-duplex link to the Bluefruit module
///
/// Covers the SPI bus, the chip select line, and the IRQ (data ready) line.
/// The session owns the link exclusively for the duration of one exchange.
pub trait BleLink {
    /// Drive chip select active, claiming the bus for one transfer sequence.
    fn assert_select(&mut self);

    /// Release chip select.
    fn release_select(&mut self);

    /// Exchange exactly one byte in both directions.
    ///
    /// The returned byte doubles as a peer status code: the not-ready
    /// sentinel means the peer cannot accept data yet.
    fn transfer_byte(&mut self, out: u8) -> impl Future<Output = Result<u8, BleError>>;

    /// Read `buf.len()` bytes, clocking out the filler byte.
    fn read_bytes(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), BleError>>;

    /// True when the IRQ line reports the peer has data for us.
    fn ready_asserted(&mut self) -> bool;
}

/// Timing source for the transport's delays and poll intervals
///
/// The contract is "resume the caller after at least this long"; whether the
/// implementation spins, uses a hardware timer, or yields to an executor is
/// up to the target.
pub trait Delay {
    /// Wait for at least `micros` microseconds.
    fn delay_us(&mut self, micros: u32) -> impl Future<Output = ()>;
}

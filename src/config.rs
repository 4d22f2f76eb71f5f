//! Timing and buffer configuration for the Bluefruit SPI transport

/// Write handshake timing
pub mod timing {
    /// Attempts to get the command type byte accepted before the write
    /// is abandoned. The peer answers each rejected attempt with the
    /// not-ready status byte.
    pub const WRITE_RETRY_ATTEMPTS: u32 = 25;

    /// Overall window for a complete response to arrive, continuation
    /// frames included.
    pub const READ_TIMEOUT_MS: u32 = 2_000;

    /// Interval between polls of the IRQ line while waiting for the
    /// response window to open.
    pub const READY_POLL_INTERVAL_US: u32 = 100;

    /// Short pause between dropping and reasserting chip select.
    pub const INTER_FRAME_DELAY_US: u32 = 10;

    /// Settle time the peer needs after chip select goes active before
    /// it will clock data.
    pub const MANDATORY_DELAY_US: u32 = 100;

    /// Reboot time after the initialize pattern is sent. The module takes
    /// about a second to come back.
    pub const RESET_SETTLE_MS: u32 = 1_000;
}

/// Buffer sizing
pub mod buffers {
    /// Capacity of the reassembled response buffer.
    pub const RESPONSE_BUFFER_SIZE: usize = 2048;
}

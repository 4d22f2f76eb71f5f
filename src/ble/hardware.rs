//! SPI and GPIO binding for the Bluefruit LE SPI Friend
//!
//! Implements the link trait over `embedded-hal` pins and an async SPI bus,
//! with chip select active low and the IRQ line active high, and the delay
//! trait over the Embassy timer.

use crate::ble::traits::{BleError, BleLink, Delay};
use crate::sdep::FILLER_BYTE;
use embassy_time::{Duration, Timer};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::spi::SpiBus;

/// Physical link to the module: SPI bus plus CS and IRQ pins.
///
/// The bus must be clocked slowly enough for the module (1 MHz in the
/// reference wiring) and must not be shared while an exchange is running.
pub struct SpiFriendLink<Spi, Cs, Irq>
where
    Spi: SpiBus,
    Cs: OutputPin,
    Irq: InputPin,
{
    spi: Spi,
    cs: Cs,
    irq: Irq,
}

impl<Spi, Cs, Irq> SpiFriendLink<Spi, Cs, Irq>
where
    Spi: SpiBus,
    Cs: OutputPin,
    Irq: InputPin,
{
    /// Wrap the bus and control pins. CS is driven inactive immediately.
    pub fn new(spi: Spi, mut cs: Cs, irq: Irq) -> Self {
        let _ = cs.set_high();
        Self { spi, cs, irq }
    }
}

impl<Spi, Cs, Irq> BleLink for SpiFriendLink<Spi, Cs, Irq>
where
    Spi: SpiBus,
    Cs: OutputPin,
    Irq: InputPin,
{
    fn assert_select(&mut self) {
        let _ = self.cs.set_low();
    }

    fn release_select(&mut self) {
        let _ = self.cs.set_high();
    }

    async fn transfer_byte(&mut self, out: u8) -> Result<u8, BleError> {
        let mut rx = [0u8; 1];
        self.spi
            .transfer(&mut rx, &[out])
            .await
            .map_err(|_| BleError::Spi)?;
        Ok(rx[0])
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), BleError> {
        buf.fill(FILLER_BYTE);
        self.spi
            .transfer_in_place(buf)
            .await
            .map_err(|_| BleError::Spi)
    }

    fn ready_asserted(&mut self) -> bool {
        self.irq.is_high().unwrap_or(false)
    }
}

/// Delay source backed by the Embassy timer queue.
pub struct EmbassyDelay;

impl Delay for EmbassyDelay {
    async fn delay_us(&mut self, micros: u32) {
        Timer::after(Duration::from_micros(u64::from(micros))).await;
    }
}

//! Bluefruit LE SPI Friend transport

pub mod friend;
pub mod traits;

#[cfg(feature = "embedded")]
pub mod hardware;

pub use friend::SpiFriend;
pub use traits::{BleError, BleLink, Delay};

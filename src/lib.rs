#![cfg_attr(not(test), no_std)]

pub mod ble;
pub mod config;
pub mod sdep;

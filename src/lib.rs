//! Signallock library - noise-masked audio puzzle prop

pub mod audio;
pub mod bus;
pub mod cli;
pub mod error;
pub mod gateway;
pub mod params;
pub mod session;

// Serial module - Serial port transport
pub mod client;

pub use client::{available_port_names, SerialPortOpener, SerialTransport};

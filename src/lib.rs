//! TartsMon Library
//!
//! Monitors a Tarts wireless sensor gateway attached over a serial link:
//! finds the gateway among candidate ports, runs a background session that
//! decodes the gateway's line protocol, and publishes sensor data and
//! gateway events to subscribers.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use domain::error::{GatewayError, GatewayResult};
pub use domain::config::TartsConfig;
pub use core::dispatch::{Event, Handler};
pub use core::gateway::{discover_gateway, CommandQueue, GatewayManager, MonitorTiming, SessionStatus};
pub use core::protocol::{decode_line, GatewayEvent, GatewayMessage, Membership, ScanResult, SensorReading};
pub use core::transport::{LinkSettings, PortOpener, Transport};

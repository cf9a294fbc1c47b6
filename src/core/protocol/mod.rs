// Protocol module - Gateway line protocol
pub mod codec;
pub mod message;

pub use codec::decode_line;
pub use message::{GatewayEvent, GatewayMessage, Membership, ScanResult, SensorReading};

// Core module - Gateway protocol and session logic
pub mod dispatch;
pub mod gateway;
pub mod protocol;
pub mod transport;

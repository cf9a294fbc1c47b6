use crate::core::protocol::message::UNKNOWN_FIELD;
use serde::Serialize;
use std::fmt;

/// Lifecycle of a gateway session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    /// No transport and no monitor
    Idle,
    /// Opening the transport and priming the gateway
    Starting,
    /// Monitor thread active
    Running,
    /// Stop requested, waiting for the monitor to exit
    Stopping,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "Idle"),
            SessionStatus::Starting => write!(f, "Starting"),
            SessionStatus::Running => write!(f, "Running"),
            SessionStatus::Stopping => write!(f, "Stopping"),
        }
    }
}

/// What the gateway has reported about itself during the current session.
///
/// Only the monitor thread mutates this; everyone else reads copies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayState {
    /// Last reported gateway identifier, `?` until one arrives
    pub gateway_id: String,
    /// Device list entries in arrival order
    pub sensor_list: Vec<String>,
}

impl GatewayState {
    /// Forget everything reported in a previous session
    pub fn reset(&mut self) {
        self.gateway_id = UNKNOWN_FIELD.to_string();
        self.sensor_list.clear();
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        Self {
            gateway_id: UNKNOWN_FIELD.to_string(),
            sensor_list: Vec::new(),
        }
    }
}

/// Point-in-time copy of a session, for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub port: Option<String>,
    pub status: SessionStatus,
    pub gateway_id: String,
    pub sensor_list: Vec<String>,
    pub pending_commands: usize,
}

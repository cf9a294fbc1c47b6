use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::gateway::MonitorTiming;
use crate::core::transport::LinkSettings;

/// TartsMon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TartsConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Gateway link and session settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Gateway link and session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Baud rate used for probing and monitoring
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Read/write timeout of the serial link in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Pause between the steps of the line-reset handshake
    #[serde(default = "default_handshake_delay")]
    pub handshake_delay_ms: u64,
    /// Pause after each queued command is written
    #[serde(default = "default_command_delay")]
    pub command_delay_ms: u64,
    /// Settle interval between the discovery probe and reading its response
    #[serde(default = "default_probe_settle")]
    pub probe_settle_ms: u64,
    /// Maximum number of bytes read back from a probe
    #[serde(default = "default_probe_read_bytes")]
    pub probe_read_bytes: usize,
    /// Candidate ports; empty means enumerate the system ports
    #[serde(default)]
    pub ports: Vec<String>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout() -> u64 {
    300
}

fn default_handshake_delay() -> u64 {
    1000
}

fn default_command_delay() -> u64 {
    500
}

fn default_probe_settle() -> u64 {
    500
}

fn default_probe_read_bytes() -> usize {
    64
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout(),
            handshake_delay_ms: default_handshake_delay(),
            command_delay_ms: default_command_delay(),
            probe_settle_ms: default_probe_settle(),
            probe_read_bytes: default_probe_read_bytes(),
            ports: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Settings used to open the serial link
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            baud_rate: self.baud_rate,
            timeout: Duration::from_millis(self.read_timeout_ms),
            probe_settle: Duration::from_millis(self.probe_settle_ms),
            probe_read_bytes: self.probe_read_bytes,
        }
    }

    /// Pacing of the session handshake and command writes
    pub fn timing(&self) -> MonitorTiming {
        MonitorTiming {
            handshake_delay: Duration::from_millis(self.handshake_delay_ms),
            command_delay: Duration::from_millis(self.command_delay_ms),
            error_backoff: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

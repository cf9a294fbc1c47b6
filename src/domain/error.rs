use thiserror::Error;

/// Unified error type for gateway monitoring
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device not present: {port}")]
    DeviceAbsent { port: String },

    #[error("Failed to open port '{port}': {message}")]
    PortOpen { port: String, message: String },

    #[error("Gateway monitor is already running")]
    AlreadyRunning,

    #[error("Handler is not subscribed to this event, so it cannot be unsubscribed")]
    HandlerNotSubscribed,

    #[error("No gateway found")]
    GatewayNotFound,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl GatewayError {
    /// Map a `serialport` open failure for `port`, keeping "device absent"
    /// distinguishable from every other cause.
    pub fn from_open(port: &str, err: serialport::Error) -> Self {
        match err.kind {
            serialport::ErrorKind::NoDevice => Self::DeviceAbsent { port: port.to_string() },
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
                Self::DeviceAbsent { port: port.to_string() }
            }
            _ => Self::PortOpen {
                port: port.to_string(),
                message: err.description,
            },
        }
    }

    /// Absent devices are expected while scanning many ports.
    pub fn is_device_absent(&self) -> bool {
        matches!(self, Self::DeviceAbsent { .. })
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_mapping() {
        let absent = serialport::Error::new(serialport::ErrorKind::NoDevice, "No such file or directory");
        assert!(GatewayError::from_open("/dev/ttyUSB9", absent).is_device_absent());

        let not_found = serialport::Error::new(
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound),
            "not found",
        );
        assert!(GatewayError::from_open("/dev/ttyUSB9", not_found).is_device_absent());

        let busy = serialport::Error::new(serialport::ErrorKind::Unknown, "Device or resource busy");
        let err = GatewayError::from_open("/dev/ttyUSB0", busy);
        assert!(!err.is_device_absent());
        assert!(err.to_string().contains("/dev/ttyUSB0"));
        assert!(err.to_string().contains("busy"));
    }
}

use std::error::Error;
use tartsmon::{Event, GatewayError, GatewayResult, Handler};

/// Error handling and resilience tests
#[cfg(test)]
mod error_handling_tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_error_types() {
        let errors = vec![
            GatewayError::DeviceAbsent { port: "/dev/ttyUSB9".to_string() },
            GatewayError::PortOpen { port: "/dev/ttyUSB0".to_string(), message: "busy".to_string() },
            GatewayError::AlreadyRunning,
            GatewayError::HandlerNotSubscribed,
            GatewayError::GatewayNotFound,
            GatewayError::Config { message: "Config error".to_string() },
            GatewayError::InvalidInput("Invalid input".to_string()),
            GatewayError::Output("Output error".to_string()),
        ];

        for error in errors {
            let display = error.to_string();
            assert!(!display.is_empty(), "Error display should not be empty");
        }

        // Errors cross the monitor thread boundary
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GatewayError>();
    }

    #[test]
    fn test_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        let error: GatewayError = io_error.into();
        assert!(matches!(error, GatewayError::Io(_)));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_device_absent_is_distinguishable() {
        let absent = GatewayError::DeviceAbsent { port: "/dev/ttyUSB9".to_string() };
        let busy = GatewayError::PortOpen { port: "/dev/ttyUSB0".to_string(), message: "busy".to_string() };

        assert!(absent.is_device_absent());
        assert!(!busy.is_device_absent());
        assert!(busy.to_string().contains("/dev/ttyUSB0"));
    }

    #[test]
    fn test_unsubscribe_absent_handler_is_an_error() {
        let event: Event<String> = Event::new();
        let handler: Handler<String> = Arc::new(|_: &String| {});

        let result: GatewayResult<()> = event.unsubscribe(&handler);
        let error = result.unwrap_err();
        assert!(matches!(error, GatewayError::HandlerNotSubscribed));
        assert!(error.to_string().contains("not subscribed"));
    }

    #[test]
    fn test_error_formatting() {
        let error = GatewayError::PortOpen {
            port: "/dev/ttyUSB0".to_string(),
            message: "Permission denied".to_string(),
        };

        let display = format!("{}", error);
        let debug = format!("{:?}", error);

        assert!(display.contains("Failed to open port"));
        assert!(display.contains("Permission denied"));
        assert_ne!(display, debug);
    }

    #[test]
    fn test_error_size() {
        use std::mem;

        let error_size = mem::size_of::<GatewayError>();
        assert!(error_size <= 128, "GatewayError too large: {} bytes", error_size);
    }
}

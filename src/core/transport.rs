use crate::domain::error::GatewayResult;
use std::time::Duration;

/// Parameters used to open a gateway link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    /// Baud rate of the serial link
    pub baud_rate: u32,
    /// Bound on every blocking read and write
    pub timeout: Duration,
    /// Wait between sending a discovery probe and reading the reply
    pub probe_settle: Duration,
    /// Maximum number of bytes read back from a probe
    pub probe_read_bytes: usize,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            timeout: Duration::from_millis(300),
            probe_settle: Duration::from_millis(500),
            probe_read_bytes: 64,
        }
    }
}

/// Duplex, line-oriented byte stream to a gateway.
///
/// Every blocking call is bounded by the timeout the transport was opened
/// with, so callers polling a stop flag stay responsive on a silent link.
pub trait Transport: Send {
    /// Identifier of the port this transport is attached to
    fn port_name(&self) -> &str;

    /// Write all bytes and flush them to the device
    fn write(&mut self, data: &[u8]) -> GatewayResult<()>;

    /// Read one `\n`-terminated line.
    ///
    /// Returns `Ok(None)` when the timeout elapses before a full line
    /// arrives; bytes received so far are kept for the next call.
    fn read_line(&mut self) -> GatewayResult<Option<String>>;

    /// Read up to `max_bytes`, returning early when the timeout elapses
    fn read_available(&mut self, max_bytes: usize) -> GatewayResult<Vec<u8>>;

    /// Discard any buffered input
    fn flush_input(&mut self) -> GatewayResult<()>;

    /// Release the underlying device
    fn close(self: Box<Self>) -> GatewayResult<()> {
        Ok(())
    }
}

/// Opens transports by port identifier.
///
/// Implementations must report a missing device as
/// [`GatewayError::DeviceAbsent`](crate::domain::error::GatewayError::DeviceAbsent)
/// so that scanning many ports stays quiet.
pub trait PortOpener: Send + Sync {
    fn open(&self, port: &str, settings: &LinkSettings) -> GatewayResult<Box<dyn Transport>>;
}

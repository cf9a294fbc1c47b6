use crate::core::transport::{LinkSettings, PortOpener, Transport};
use crate::domain::error::{GatewayError, GatewayResult};
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::Instant;
use tracing::{debug, info};

const READ_CHUNK_SIZE: usize = 256;
/// Longest line kept while waiting for `\n`; longer runs are cut here
const MAX_LINE_BYTES: usize = 1024;

/// List the serial ports present on this machine
pub fn available_port_names() -> GatewayResult<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|port| port.port_name).collect())
}

/// Opens gateway links on real serial ports (8N1, no flow control)
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortOpener;

impl PortOpener for SerialPortOpener {
    fn open(&self, port: &str, settings: &LinkSettings) -> GatewayResult<Box<dyn Transport>> {
        let serial = serialport::new(port, settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(settings.timeout)
            .open()
            .map_err(|e| GatewayError::from_open(port, e))?;

        let mut transport = SerialTransport {
            port: serial,
            name: port.to_string(),
            pending: LineBuffer::new(MAX_LINE_BYTES),
        };
        transport.flush_input()?;

        info!(port, baud_rate = settings.baud_rate, "Serial port opened");
        Ok(Box::new(transport))
    }
}

/// Bytes received after the last complete line.
///
/// A run of `limit` bytes without `\n` is handed out as a line of its own,
/// so a device that never terminates its output cannot grow the buffer.
#[derive(Debug)]
struct LineBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl LineBuffer {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit: limit.max(1),
        }
    }

    fn push(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn take_line(&mut self) -> Option<String> {
        let end = match self.bytes.iter().position(|b| *b == b'\n') {
            Some(newline) if newline < self.limit => newline + 1,
            _ if self.bytes.len() >= self.limit => self.limit,
            _ => return None,
        };
        let line: Vec<u8> = self.bytes.drain(..end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Remove up to `max` raw bytes from the front
    fn take(&mut self, max: usize) -> Vec<u8> {
        let take = max.min(self.bytes.len());
        self.bytes.drain(..take).collect()
    }

    fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// Line-buffered gateway link over a `serialport` handle
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
    pending: LineBuffer,
}

impl SerialTransport {
    /// One bounded read into `buf`; a timeout reads zero bytes
    fn read_chunk(&mut self, buf: &mut [u8]) -> GatewayResult<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl Transport for SerialTransport {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, data: &[u8]) -> GatewayResult<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        debug!(port = %self.name, bytes = data.len(), "Sent over serial");
        Ok(())
    }

    fn read_line(&mut self) -> GatewayResult<Option<String>> {
        if let Some(line) = self.pending.take_line() {
            return Ok(Some(line));
        }

        let deadline = Instant::now() + self.port.timeout();
        let mut buffer = [0u8; READ_CHUNK_SIZE];

        while Instant::now() < deadline {
            let n = self.read_chunk(&mut buffer)?;
            if n == 0 {
                continue;
            }
            self.pending.push(&buffer[..n]);
            if let Some(line) = self.pending.take_line() {
                return Ok(Some(line));
            }
        }

        Ok(None)
    }

    fn read_available(&mut self, max_bytes: usize) -> GatewayResult<Vec<u8>> {
        let mut data = self.pending.take(max_bytes);

        let deadline = Instant::now() + self.port.timeout();
        let mut buffer = [0u8; READ_CHUNK_SIZE];

        while data.len() < max_bytes && Instant::now() < deadline {
            let want = (max_bytes - data.len()).min(READ_CHUNK_SIZE);
            let n = self.read_chunk(&mut buffer[..want])?;
            data.extend_from_slice(&buffer[..n]);
        }

        Ok(data)
    }

    fn flush_input(&mut self) -> GatewayResult<()> {
        self.pending.clear();
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> GatewayResult<()> {
        // The device is released when the handle drops
        info!(port = %self.name, "Serial port closed");
        Ok(())
    }
}

//! Scripted in-memory gateway used to exercise discovery and sessions
//! without hardware.

use crate::core::transport::{LinkSettings, PortOpener, Transport};
use crate::domain::error::{GatewayError, GatewayResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// One I/O call observed by a mock transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockIo {
    Write(String),
    ReadLine,
}

#[derive(Debug, Default)]
struct WireState {
    incoming: VecDeque<String>,
    written: Vec<String>,
    transcript: Vec<MockIo>,
    responses: Vec<(String, Vec<String>)>,
    probe_response: Option<String>,
    fail_writes: bool,
    flushes: usize,
    closed: bool,
}

/// Shared view of what a mock device has received and will send.
#[derive(Debug, Clone, Default)]
pub struct MockWire {
    state: Arc<Mutex<WireState>>,
}

impl MockWire {
    fn lock(&self) -> MutexGuard<'_, WireState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a line for the monitor to read
    pub fn push_line(&self, line: impl Into<String>) {
        self.lock().incoming.push_back(line.into());
    }

    /// Every write so far, in order
    pub fn written(&self) -> Vec<String> {
        self.lock().written.clone()
    }

    /// Writes and line reads in the order they happened
    pub fn transcript(&self) -> Vec<MockIo> {
        self.lock().transcript.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn pending_lines(&self) -> usize {
        self.lock().incoming.len()
    }
}

/// Behaviour of one port behind a [`MockPortOpener`]
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    wire: MockWire,
    open_error: Option<String>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes returned when the probe response is read
    pub fn with_probe_response(self, response: impl Into<String>) -> Self {
        self.wire.lock().probe_response = Some(response.into());
        self
    }

    /// Lines queued whenever `command` is written
    pub fn respond_to(self, command: impl Into<String>, lines: &[&str]) -> Self {
        let lines = lines.iter().map(|l| l.to_string()).collect();
        self.wire.lock().responses.push((command.into(), lines));
        self
    }

    /// Opening the port fails with a non-absent error
    pub fn failing_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Every write fails with an I/O error
    pub fn failing_writes(self) -> Self {
        self.wire.lock().fail_writes = true;
        self
    }

    pub fn wire(&self) -> MockWire {
        self.wire.clone()
    }
}

/// Port opener backed by a table of [`MockDevice`]s; unknown ports are
/// reported absent.
#[derive(Debug, Default)]
pub struct MockPortOpener {
    devices: Mutex<HashMap<String, MockDevice>>,
    attempts: Mutex<Vec<String>>,
}

impl MockPortOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, port: impl Into<String>, device: MockDevice) {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(port.into(), device);
    }

    /// Ports passed to `open`, in call order
    pub fn open_attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl PortOpener for MockPortOpener {
    fn open(&self, port: &str, settings: &LinkSettings) -> GatewayResult<Box<dyn Transport>> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(port.to_string());

        let devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        let device = devices.get(port).ok_or_else(|| GatewayError::DeviceAbsent {
            port: port.to_string(),
        })?;

        if let Some(message) = &device.open_error {
            return Err(GatewayError::PortOpen {
                port: port.to_string(),
                message: message.clone(),
            });
        }

        Ok(Box::new(MockTransport {
            port: port.to_string(),
            wire: device.wire.clone(),
            timeout: settings.timeout,
        }))
    }
}

struct MockTransport {
    port: String,
    wire: MockWire,
    timeout: Duration,
}

impl Transport for MockTransport {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn write(&mut self, data: &[u8]) -> GatewayResult<()> {
        let mut state = self.wire.lock();
        if state.fail_writes {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "write failed").into());
        }

        let text = String::from_utf8_lossy(data).into_owned();
        let replies: Vec<String> = state
            .responses
            .iter()
            .filter(|(command, _)| *command == text)
            .flat_map(|(_, lines)| lines.iter().cloned())
            .collect();
        state.incoming.extend(replies);
        state.transcript.push(MockIo::Write(text.clone()));
        state.written.push(text);
        Ok(())
    }

    fn read_line(&mut self) -> GatewayResult<Option<String>> {
        let line = {
            let mut state = self.wire.lock();
            state.transcript.push(MockIo::ReadLine);
            state.incoming.pop_front()
        };
        if line.is_none() {
            thread::sleep(self.timeout);
        }
        Ok(line)
    }

    fn read_available(&mut self, max_bytes: usize) -> GatewayResult<Vec<u8>> {
        let response = self.wire.lock().probe_response.clone();
        match response {
            Some(response) => Ok(response.into_bytes().into_iter().take(max_bytes).collect()),
            None => {
                thread::sleep(self.timeout);
                Ok(Vec::new())
            }
        }
    }

    fn flush_input(&mut self) -> GatewayResult<()> {
        let mut state = self.wire.lock();
        state.incoming.clear();
        state.flushes += 1;
        Ok(())
    }

    fn close(self: Box<Self>) -> GatewayResult<()> {
        self.wire.lock().closed = true;
        Ok(())
    }
}

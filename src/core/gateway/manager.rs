use crate::core::dispatch::Event;
use crate::core::gateway::discovery::discover_gateway;
use crate::core::gateway::queue::CommandQueue;
use crate::core::gateway::state::{GatewayState, SessionSnapshot, SessionStatus};
use crate::core::protocol::codec::{decode_line, PROBE, REQUEST_DEVICE_LIST, REQUEST_ID, RESET};
use crate::core::protocol::message::{GatewayEvent, GatewayMessage, SensorReading};
use crate::core::transport::{LinkSettings, PortOpener, Transport};
use crate::domain::config::GatewayConfig;
use crate::domain::error::{GatewayError, GatewayResult};
use crate::infrastructure::serial::SerialPortOpener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const MONITOR_THREAD_NAME: &str = "gateway-monitor";

/// Pacing of the session handshake and the monitor loop
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorTiming {
    /// Pause between the steps of the line-reset handshake
    pub handshake_delay: Duration,
    /// Pause after each queued command, letting the gateway respond
    pub command_delay: Duration,
    /// Pause after a failed read before trying again
    pub error_backoff: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            handshake_delay: Duration::from_secs(1),
            command_delay: Duration::from_millis(500),
            error_backoff: Duration::from_millis(300),
        }
    }
}

struct Lifecycle {
    status: SessionStatus,
    port: Option<String>,
    worker: Option<JoinHandle<Box<dyn Transport>>>,
}

/// Owns one gateway session: the transport, the command queue, what the
/// gateway has reported, and the background monitor thread.
///
/// All methods take `&self`, so the manager can be shared across threads
/// behind an `Arc`. Dropping it stops the session.
pub struct GatewayManager {
    opener: Arc<dyn PortOpener>,
    settings: LinkSettings,
    timing: MonitorTiming,
    commands: CommandQueue,
    state: Arc<RwLock<GatewayState>>,
    sensor_data: Arc<Event<SensorReading>>,
    gateway_events: Arc<Event<GatewayEvent>>,
    stop_requested: Arc<AtomicBool>,
    worker_exited: Arc<AtomicBool>,
    lifecycle: Mutex<Lifecycle>,
}

impl GatewayManager {
    /// Create a manager that opens ports through `opener`
    pub fn new(opener: Arc<dyn PortOpener>, settings: LinkSettings, timing: MonitorTiming) -> Self {
        Self {
            opener,
            settings,
            timing,
            commands: CommandQueue::new(),
            state: Arc::new(RwLock::new(GatewayState::default())),
            sensor_data: Arc::new(Event::new()),
            gateway_events: Arc::new(Event::new()),
            stop_requested: Arc::new(AtomicBool::new(false)),
            worker_exited: Arc::new(AtomicBool::new(false)),
            lifecycle: Mutex::new(Lifecycle {
                status: SessionStatus::Idle,
                port: None,
                worker: None,
            }),
        }
    }

    /// Create a manager talking to real serial ports
    pub fn serial(config: &GatewayConfig) -> Self {
        Self::new(Arc::new(SerialPortOpener), config.link_settings(), config.timing())
    }

    /// Lock the lifecycle, first collecting a monitor thread that ended
    /// without a stop request
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if lifecycle.status == SessionStatus::Running && self.worker_exited.load(Ordering::SeqCst) {
            reap_worker(&mut lifecycle);
        }
        lifecycle
    }

    fn read_state(&self) -> RwLockReadGuard<'_, GatewayState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probe `ports` in order and return the first one with a gateway
    pub fn find<S: AsRef<str>>(&self, ports: &[S]) -> Option<String> {
        discover_gateway(self.opener.as_ref(), ports, &self.settings)
    }

    /// Open `port`, prime the gateway and start the monitor thread.
    ///
    /// Fails with [`GatewayError::AlreadyRunning`] unless the session is idle;
    /// in that case nothing about the current session changes.
    pub fn start(&self, port: &str) -> GatewayResult<()> {
        {
            let mut lifecycle = self.lifecycle();
            if lifecycle.status != SessionStatus::Idle {
                warn!(port, status = %lifecycle.status, "Monitor already active");
                return Err(GatewayError::AlreadyRunning);
            }
            lifecycle.status = SessionStatus::Starting;
        }

        write_state(&self.state).reset();

        let transport = match self.open_and_prime(port) {
            Ok(transport) => transport,
            Err(e) => {
                self.lifecycle().status = SessionStatus::Idle;
                return Err(e);
            }
        };

        self.stop_requested.store(false, Ordering::SeqCst);
        self.worker_exited.store(false, Ordering::SeqCst);
        self.commands.clear();
        self.commands.enqueue(REQUEST_ID);
        self.commands.enqueue(REQUEST_DEVICE_LIST);

        let monitor = Monitor {
            commands: self.commands.clone(),
            state: Arc::clone(&self.state),
            sensor_data: Arc::clone(&self.sensor_data),
            gateway_events: Arc::clone(&self.gateway_events),
            stop_requested: Arc::clone(&self.stop_requested),
            worker_exited: Arc::clone(&self.worker_exited),
            timing: self.timing.clone(),
        };

        let worker = thread::Builder::new()
            .name(MONITOR_THREAD_NAME.to_string())
            .spawn(move || monitor.run(transport));

        let mut lifecycle = self.lifecycle();
        match worker {
            Ok(handle) => {
                lifecycle.status = SessionStatus::Running;
                lifecycle.port = Some(port.to_string());
                lifecycle.worker = Some(handle);
                info!(port, "Gateway monitor started");
                Ok(())
            }
            Err(e) => {
                lifecycle.status = SessionStatus::Idle;
                error!(port, error = %e, "Failed to spawn monitor thread");
                Err(e.into())
            }
        }
    }

    fn open_and_prime(&self, port: &str) -> GatewayResult<Box<dyn Transport>> {
        let mut transport = self.opener.open(port, &self.settings).map_err(|e| {
            if e.is_device_absent() {
                debug!(port, "Port not present");
            } else {
                warn!(port, error = %e, "Failed to open port");
            }
            e
        })?;

        if let Err(e) = self.line_reset(transport.as_mut()) {
            warn!(port, error = %e, "Gateway handshake failed");
            if let Err(close_err) = transport.close() {
                debug!(port, error = %close_err, "Failed to close port");
            }
            return Err(e);
        }

        Ok(transport)
    }

    fn line_reset(&self, transport: &mut dyn Transport) -> GatewayResult<()> {
        transport.write(RESET.as_bytes())?;
        thread::sleep(self.timing.handshake_delay);
        transport.write(PROBE.as_bytes())?;
        thread::sleep(self.timing.handshake_delay);
        transport.flush_input()
    }

    /// Stop the monitor thread and close the transport.
    ///
    /// Blocks until the monitor observes the request, which takes at most
    /// one read timeout plus one command delay. Calling it on a session that
    /// is not running does nothing.
    pub fn stop(&self) {
        let worker = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.status != SessionStatus::Running {
                debug!(status = %lifecycle.status, "Stop ignored");
                return;
            }
            lifecycle.status = SessionStatus::Stopping;
            lifecycle.worker.take()
        };

        info!("Stopping gateway monitor");
        self.stop_requested.store(true, Ordering::SeqCst);

        if let Some(handle) = worker {
            match handle.join() {
                Ok(transport) => {
                    let port = transport.port_name().to_string();
                    if let Err(e) = transport.close() {
                        warn!(port = %port, error = %e, "Failed to close port");
                    }
                }
                Err(_) => error!("Gateway monitor thread panicked"),
            }
        }

        let mut lifecycle = self.lifecycle();
        lifecycle.status = SessionStatus::Idle;
        lifecycle.port = None;
        info!("Gateway monitor stopped");
    }

    /// Queue a command for the monitor to send
    pub fn enqueue_command(&self, command: impl Into<String>) {
        self.commands.enqueue(command);
    }

    /// Handle for enqueueing commands from other threads
    pub fn command_queue(&self) -> CommandQueue {
        self.commands.clone()
    }

    /// Sensor data stream
    pub fn on_sensor_data(&self) -> &Event<SensorReading> {
        &self.sensor_data
    }

    /// Join and scan stream
    pub fn on_gateway_event(&self) -> &Event<GatewayEvent> {
        &self.gateway_events
    }

    pub fn status(&self) -> SessionStatus {
        self.lifecycle().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    /// Port of the running session
    pub fn port(&self) -> Option<String> {
        self.lifecycle().port.clone()
    }

    /// Last reported gateway identifier, `?` until one arrives
    pub fn gateway_id(&self) -> String {
        self.read_state().gateway_id.clone()
    }

    /// Device list entries reported during the current session
    pub fn sensor_list(&self) -> Vec<String> {
        self.read_state().sensor_list.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (status, port) = {
            let lifecycle = self.lifecycle();
            (lifecycle.status, lifecycle.port.clone())
        };
        let state = self.read_state();

        SessionSnapshot {
            port,
            status,
            gateway_id: state.gateway_id.clone(),
            sensor_list: state.sensor_list.clone(),
            pending_commands: self.commands.len(),
        }
    }
}

impl Drop for GatewayManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Only a panic ends the monitor while the session is still `Running`
fn reap_worker(lifecycle: &mut Lifecycle) {
    let port = lifecycle.port.take().unwrap_or_default();
    match lifecycle.worker.take().map(JoinHandle::join) {
        Some(Err(_)) => error!(port = %port, "Gateway monitor thread panicked"),
        _ => error!(port = %port, "Gateway monitor exited unexpectedly"),
    }
    lifecycle.status = SessionStatus::Idle;
}

fn write_state(state: &RwLock<GatewayState>) -> RwLockWriteGuard<'_, GatewayState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the monitor thread owns or shares with the manager
struct Monitor {
    commands: CommandQueue,
    state: Arc<RwLock<GatewayState>>,
    sensor_data: Arc<Event<SensorReading>>,
    gateway_events: Arc<Event<GatewayEvent>>,
    stop_requested: Arc<AtomicBool>,
    worker_exited: Arc<AtomicBool>,
    timing: MonitorTiming,
}

/// Raises the exit flag however the monitor loop ends, unwinding included
struct ExitGuard(Arc<AtomicBool>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Monitor {
    /// Loop until a stop is requested, then hand the transport back
    fn run(self, mut transport: Box<dyn Transport>) -> Box<dyn Transport> {
        let _exited = ExitGuard(Arc::clone(&self.worker_exited));
        info!(port = transport.port_name(), "Monitoring gateway data");

        while !self.stop_requested.load(Ordering::SeqCst) {
            self.send_next_command(transport.as_mut());

            match transport.read_line() {
                Ok(Some(line)) => self.handle_line(&line),
                Ok(None) => {}
                Err(e) => {
                    warn!(port = transport.port_name(), error = %e, "Failed to read from gateway");
                    thread::sleep(self.timing.error_backoff);
                }
            }
        }

        debug!(port = transport.port_name(), "Monitor loop exited");
        transport
    }

    /// Write at most one queued command
    fn send_next_command(&self, transport: &mut dyn Transport) {
        let Some(command) = self.commands.pop() else {
            return;
        };

        match transport.write(command.as_bytes()) {
            Ok(()) => debug!(command = %command.trim_end(), "Command sent"),
            Err(e) => warn!(command = %command.trim_end(), error = %e, "Failed to send command"),
        }
        thread::sleep(self.timing.command_delay);
    }

    fn handle_line(&self, line: &str) {
        match decode_line(line) {
            Some(GatewayMessage::GatewayId(id)) => {
                info!(gateway_id = %id, "Gateway identified");
                write_state(&self.state).gateway_id = id;
            }
            Some(GatewayMessage::SensorList(entry)) => {
                debug!(entry = %entry, "Device list entry");
                write_state(&self.state).sensor_list.push(entry);
            }
            Some(GatewayMessage::Reading(reading)) => {
                debug!(id = %reading.id, value = %reading.value, "Sensor data");
                self.sensor_data.fire(&reading);
            }
            Some(GatewayMessage::Join(device_id)) => {
                debug!(device_id = %device_id, "Sensor joined network");
                self.gateway_events.fire(&GatewayEvent::Join { device_id });
            }
            Some(GatewayMessage::Scan(scan)) => {
                debug!(id = %scan.id, known = %scan.known, "Sensor scanned network");
                self.gateway_events.fire(&GatewayEvent::Scan(scan));
            }
            None => trace!(line = %line.trim(), "Ignoring line"),
        }
    }
}

use crate::core::protocol::codec::{ACK, PROBE, RESET};
use crate::core::transport::{LinkSettings, PortOpener, Transport};
use crate::domain::error::GatewayResult;
use std::thread;
use tracing::{debug, info, warn};

/// Try each candidate port in order and return the first one where a
/// gateway acknowledges the probe.
///
/// Remaining candidates are not touched once a gateway answers. Ports that
/// fail to open or error while probing are skipped.
pub fn discover_gateway<S: AsRef<str>>(
    opener: &dyn PortOpener,
    candidates: &[S],
    settings: &LinkSettings,
) -> Option<String> {
    info!(candidates = candidates.len(), "Searching for gateway on serial ports");

    for port in candidates.iter().map(AsRef::as_ref) {
        debug!(port, "Checking port");

        let mut transport = match opener.open(port, settings) {
            Ok(transport) => transport,
            Err(e) if e.is_device_absent() => {
                debug!(port, "Port not present");
                continue;
            }
            Err(e) => {
                warn!(port, error = %e, "Failed to open port");
                continue;
            }
        };

        let probe = probe_gateway(transport.as_mut(), settings);
        close_quietly(transport);

        match probe {
            Ok(true) => {
                info!(port, "Gateway found");
                return Some(port.to_string());
            }
            Ok(false) => debug!(port, "Gateway not found"),
            Err(e) => debug!(port, error = %e, "Probe failed"),
        }
    }

    warn!("No gateway found");
    None
}

/// Send the probe on an open transport and check for the acknowledgment
pub fn probe_gateway(transport: &mut dyn Transport, settings: &LinkSettings) -> GatewayResult<bool> {
    transport.write(RESET.as_bytes())?;
    transport.write(PROBE.as_bytes())?;
    thread::sleep(settings.probe_settle);

    let response = transport.read_available(settings.probe_read_bytes)?;
    let response = String::from_utf8_lossy(&response).trim().to_lowercase();
    debug!(port = transport.port_name(), response = %response, "Probe response");

    Ok(response.contains(ACK))
}

fn close_quietly(transport: Box<dyn Transport>) {
    let port = transport.port_name().to_string();
    if let Err(e) = transport.close() {
        debug!(port = %port, error = %e, "Failed to close probed port");
    }
}

//! Decoding of the gateway's prefix-tagged, comma-delimited line protocol.
//!
//! Every function here is total: malformed input produces placeholder
//! fields or `None`, never an error, so a bad line cannot stop the monitor.

use super::message::{GatewayMessage, Membership, ScanResult, SensorReading, UNKNOWN_FIELD};
use chrono::Local;

/// Line reset
pub const RESET: &str = "\r";
/// Probe, answered with `OK` by a live gateway
pub const PROBE: &str = "at$\r";
/// Request the gateway identifier
pub const REQUEST_ID: &str = "at$id\r";
/// Request the list of devices known to the gateway
pub const REQUEST_DEVICE_LIST: &str = "at$wl\r";
/// Substring expected in a probe response
pub const ACK: &str = "ok";
/// Terminator appended to outbound commands
pub const COMMAND_TERMINATOR: char = '\r';

/// Sensor type code of temperature sensors
pub const SENSOR_TYPE_TEMPERATURE: &str = "2";

const PREFIX_GATEWAY_ID: &str = "id:";
const PREFIX_DEVICE_LIST: &str = "wl:";
const PREFIX_JOIN: &str = "wj:";
const PREFIX_SCAN: &str = "ws:";
const PREFIX_DATA: &str = "wd:";

const SCAN_FIELDS: usize = 3;
const DATA_FIELDS: usize = 6;

/// Trim and lower-case a raw line; the protocol is case-insensitive.
pub fn normalize_line(line: &str) -> String {
    line.trim().to_lowercase()
}

/// Classify one received line.
///
/// Lines of two characters or fewer, and lines without a known prefix,
/// yield `None`.
pub fn decode_line(line: &str) -> Option<GatewayMessage> {
    let line = normalize_line(line);
    if line.len() <= 2 {
        return None;
    }

    if line.starts_with(PREFIX_GATEWAY_ID) {
        Some(GatewayMessage::GatewayId(parse_gateway_id(&line)))
    } else if line.starts_with(PREFIX_DATA) {
        Some(GatewayMessage::Reading(parse_sensor_data(&line)))
    } else if line.starts_with(PREFIX_DEVICE_LIST) {
        Some(GatewayMessage::SensorList(parse_device_list(&line)))
    } else if line.starts_with(PREFIX_JOIN) {
        Some(GatewayMessage::Join(parse_join(&line)))
    } else if line.starts_with(PREFIX_SCAN) {
        Some(GatewayMessage::Scan(parse_scan_data(&line)))
    } else {
        None
    }
}

fn after<'a>(prefix: &str, line: &'a str) -> &'a str {
    line.strip_prefix(prefix).unwrap_or("")
}

/// `id:<gateway id>`
pub fn parse_gateway_id(line: &str) -> String {
    after(PREFIX_GATEWAY_ID, line).trim().to_string()
}

/// `wl:<device list entry>`
pub fn parse_device_list(line: &str) -> String {
    after(PREFIX_DEVICE_LIST, line).trim().to_string()
}

/// `wj:<device id>`; the remainder is kept verbatim
pub fn parse_join(line: &str) -> String {
    after(PREFIX_JOIN, line).to_string()
}

/// `ws:<id>,<type>,<known>`
pub fn parse_scan_data(line: &str) -> ScanResult {
    let fields: Vec<&str> = after(PREFIX_SCAN, line).trim().split(',').collect();
    if fields.len() < SCAN_FIELDS {
        return ScanResult::default();
    }

    ScanResult {
        id: fields[0].to_string(),
        sensor_type: fields[1].to_string(),
        known: if fields[2] == "1" {
            Membership::Known
        } else {
            Membership::Unknown
        },
    }
}

/// `wd:<id>,<type>,<rssi>,<vbatt>,<state>,<data>`
pub fn parse_sensor_data(line: &str) -> SensorReading {
    let mut reading = SensorReading::placeholder(Local::now());

    let fields: Vec<&str> = after(PREFIX_DATA, line).trim().split(',').collect();
    if fields.len() < DATA_FIELDS {
        return reading;
    }

    reading.id = fields[0].to_string();
    reading.sensor_type = fields[1].to_string();
    reading.rssi = fields[2].to_string();
    reading.vbatt = fields[3].to_string();
    reading.state = fields[4].to_string();
    reading.value = fields[5].to_string();

    if reading.sensor_type == SENSOR_TYPE_TEMPERATURE && reading.value.chars().count() == 4 {
        reading.value = decode_temperature(&reading.value).unwrap_or_else(|| UNKNOWN_FIELD.to_string());
    }

    reading
}

/// Decode a 4-hex-digit temperature payload into degrees Fahrenheit.
///
/// The payload is tenths of a degree Celsius, low byte first.
pub fn decode_temperature(payload: &str) -> Option<String> {
    let bytes = hex::decode(payload).ok()?;
    let [lsb, msb] = <[u8; 2]>::try_from(bytes).ok()?;

    let raw = u16::from_le_bytes([lsb, msb]);
    let celsius = f64::from(raw) / 10.0;
    let fahrenheit = celsius * 9.0 / 5.0 + 32.0;

    Some(format!("{}F", format_degrees(fahrenheit)))
}

fn format_degrees(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

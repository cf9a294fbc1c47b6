use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// Placeholder used for any field the gateway did not report
pub const UNKNOWN_FIELD: &str = "?";

/// Format used when rendering reading timestamps
pub const TIMESTAMP_FORMAT: &str = "%y%m%d %H:%M:%S";

/// One decoded sensor data report (`wd:` line)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    /// Local wall-clock time the line was decoded
    pub timestamp: DateTime<Local>,
    pub id: String,
    /// Integer-coded sensor type, kept as reported
    pub sensor_type: String,
    pub rssi: String,
    pub vbatt: String,
    pub state: String,
    /// Raw hex payload, a decoded value such as `72.5F`, or `?`
    pub value: String,
}

impl SensorReading {
    /// Reading with every field set to the placeholder and a zero value
    pub fn placeholder(timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            id: UNKNOWN_FIELD.to_string(),
            sensor_type: UNKNOWN_FIELD.to_string(),
            rssi: UNKNOWN_FIELD.to_string(),
            vbatt: UNKNOWN_FIELD.to_string(),
            state: UNKNOWN_FIELD.to_string(),
            value: "0".to_string(),
        }
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time={} ID={} Type={} Value={} RSSI={} Vbat={} State={}",
            self.timestamp_string(),
            self.id,
            self.sensor_type,
            self.value,
            self.rssi,
            self.vbatt,
            self.state
        )
    }
}

/// Whether a scanning sensor already belongs to the gateway's network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Known,
    Unknown,
    /// The scan report was too short to tell
    #[serde(rename = "?")]
    Unspecified,
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Membership::Known => write!(f, "known"),
            Membership::Unknown => write!(f, "unknown"),
            Membership::Unspecified => write!(f, "{}", UNKNOWN_FIELD),
        }
    }
}

/// One decoded network scan report (`ws:` line)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub id: String,
    pub sensor_type: String,
    pub known: Membership,
}

impl Default for ScanResult {
    fn default() -> Self {
        Self {
            id: UNKNOWN_FIELD.to_string(),
            sensor_type: UNKNOWN_FIELD.to_string(),
            known: Membership::Unspecified,
        }
    }
}

/// Events published on the gateway-event stream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GatewayEvent {
    /// A sensor joined the gateway's network
    Join { device_id: String },
    /// A sensor scanned the network
    Scan(ScanResult),
}

impl GatewayEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayEvent::Join { .. } => "join",
            GatewayEvent::Scan(_) => "scan",
        }
    }
}

impl fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayEvent::Join { device_id } => write!(f, "Sensor {} joined network", device_id),
            GatewayEvent::Scan(scan) => write!(
                f,
                "Sensor {} (type {}) scanned network, sensor is {}",
                scan.id, scan.sensor_type, scan.known
            ),
        }
    }
}

/// Classification of one received protocol line
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayMessage {
    /// `id:` gateway identifier report
    GatewayId(String),
    /// `wl:` one entry of the gateway's device list
    SensorList(String),
    /// `wj:` a sensor joined
    Join(String),
    /// `ws:` a sensor scanned the network
    Scan(ScanResult),
    /// `wd:` sensor data
    Reading(SensorReading),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_display() {
        assert_eq!(Membership::Known.to_string(), "known");
        assert_eq!(Membership::Unknown.to_string(), "unknown");
        assert_eq!(Membership::Unspecified.to_string(), "?");
    }

    #[test]
    fn test_gateway_event_json() {
        let join = GatewayEvent::Join { device_id: "42".to_string() };
        let json = serde_json::to_value(&join).unwrap();
        assert_eq!(json["kind"], "join");
        assert_eq!(json["device_id"], "42");

        let scan = GatewayEvent::Scan(ScanResult {
            id: "42".to_string(),
            sensor_type: "2".to_string(),
            known: Membership::Known,
        });
        let json = serde_json::to_value(&scan).unwrap();
        assert_eq!(json["kind"], "scan");
        assert_eq!(json["known"], "known");
        assert_eq!(scan.kind(), "scan");
    }

    #[test]
    fn test_placeholder_reading() {
        let reading = SensorReading::placeholder(Local::now());
        assert_eq!(reading.id, "?");
        assert_eq!(reading.value, "0");
        assert_eq!(reading.timestamp_string().len(), "171229 10:00:00".len());
    }
}

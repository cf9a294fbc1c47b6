use crate::cli::args::OutputFormat;
use crate::core::gateway::SessionSnapshot;
use crate::core::protocol::{GatewayEvent, SensorReading};
use crate::domain::config::TartsConfig;
use std::io;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_ports(&self, ports: &[String]) -> Result<(), OutputError>;
    fn write_reading(&self, reading: &SensorReading) -> Result<(), OutputError>;
    fn write_gateway_event(&self, event: &GatewayEvent) -> Result<(), OutputError>;
    fn write_summary(&self, snapshot: &SessionSnapshot) -> Result<(), OutputError>;
    fn write_config(&self, config: &TartsConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl From<OutputError> for crate::domain::error::GatewayError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
#[derive(Debug, Clone)]
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

/// One CSV record without its terminator; fields holding a delimiter or a
/// quote are quoted
fn csv_row(fields: &[&str]) -> Result<String, OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer.into_inner().map_err(|e| OutputError::IoError(e.into_error()))?;

    Ok(String::from_utf8_lossy(&bytes).trim_end_matches('\n').to_string())
}

impl OutputWriter for ConsoleWriter {
    fn write_ports(&self, ports: &[String]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("{} serial port(s) found:", ports.len());
                for port in ports {
                    println!("  {}", port);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(ports)?);
            }
            OutputFormat::Table => {
                if !ports.is_empty() {
                    let rows: Vec<PortTableRow> = ports.iter().map(|port| PortTableRow { port: port.clone() }).collect();
                    println!("{}", Table::new(rows));
                }
            }
            OutputFormat::Csv => {
                println!("port");
                for port in ports {
                    println!("{}", csv_row(&[port.as_str()])?);
                }
            }
        }
        Ok(())
    }

    fn write_reading(&self, reading: &SensorReading) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => println!("Sensor Data: {}", reading),
            OutputFormat::Json => println!("{}", serde_json::to_string(reading)?),
            OutputFormat::Table => println!("{}", Table::new([ReadingTableRow::from(reading)])),
            OutputFormat::Csv => {
                let timestamp = reading.timestamp_string();
                println!(
                    "{}",
                    csv_row(&[
                        "reading",
                        &timestamp,
                        &reading.id,
                        &reading.sensor_type,
                        &reading.rssi,
                        &reading.vbatt,
                        &reading.state,
                        &reading.value,
                    ])?
                );
            }
        }
        Ok(())
    }

    fn write_gateway_event(&self, event: &GatewayEvent) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
            OutputFormat::Csv => match event {
                GatewayEvent::Join { device_id } => println!("{}", csv_row(&["join", device_id])?),
                GatewayEvent::Scan(scan) => {
                    let known = scan.known.to_string();
                    println!("{}", csv_row(&["scan", &scan.id, &scan.sensor_type, &known])?);
                }
            },
            _ => println!("Gateway Event: {}", event),
        }
        Ok(())
    }

    fn write_summary(&self, snapshot: &SessionSnapshot) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("Gateway Session:");
                println!("  Port: {}", snapshot.port.as_deref().unwrap_or("-"));
                println!("  Gateway ID: {}", snapshot.gateway_id);
                println!("  Sensors: {}", snapshot.sensor_list.len());
                for entry in &snapshot.sensor_list {
                    println!("    {}", entry);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(snapshot)?);
            }
            OutputFormat::Table => {
                println!("{}", Table::new([SummaryTableRow::from(snapshot)]));
            }
            OutputFormat::Csv => {
                println!("port,gateway_id,sensor");
                let port = snapshot.port.as_deref().unwrap_or("");
                for entry in &snapshot.sensor_list {
                    println!("{}", csv_row(&[port, &snapshot.gateway_id, entry])?);
                }
            }
        }
        Ok(())
    }

    fn write_config(&self, config: &TartsConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(config)?);
            }
            _ => {
                print!("{}", toml::to_string_pretty(config)?);
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Table row for serial port listing
#[derive(Tabled)]
struct PortTableRow {
    port: String,
}

/// Table row for one sensor reading
#[derive(Tabled)]
struct ReadingTableRow {
    time: String,
    id: String,
    r#type: String,
    value: String,
    rssi: String,
    vbatt: String,
    state: String,
}

impl From<&SensorReading> for ReadingTableRow {
    fn from(reading: &SensorReading) -> Self {
        Self {
            time: reading.timestamp_string(),
            id: reading.id.clone(),
            r#type: reading.sensor_type.clone(),
            value: reading.value.clone(),
            rssi: reading.rssi.clone(),
            vbatt: reading.vbatt.clone(),
            state: reading.state.clone(),
        }
    }
}

/// Table row for the session summary
#[derive(Tabled)]
struct SummaryTableRow {
    port: String,
    gateway_id: String,
    sensors: String,
}

impl From<&SessionSnapshot> for SummaryTableRow {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            port: snapshot.port.clone().unwrap_or_default(),
            gateway_id: snapshot.gateway_id.clone(),
            sensors: snapshot.sensor_list.join("\n"),
        }
    }
}

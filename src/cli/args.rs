use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for TartsMon
#[derive(Parser, Debug)]
#[command(
    name = "tartsmon",
    version = env!("CARGO_PKG_VERSION"),
    about = "Monitor for Tarts wireless sensor gateways",
    long_about = "Finds a Tarts wireless sensor gateway on the serial ports, then decodes and prints sensor data, join and scan events as the gateway reports them."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available serial ports
    Ports,
    /// Search the serial ports for a gateway
    Find {
        /// Candidate port (repeatable); defaults to configured or enumerated ports
        #[arg(short, long)]
        port: Vec<String>,
    },
    /// Monitor a gateway and print its events
    Monitor(MonitorArgs),
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
    /// CSV output
    Csv,
}

/// Gateway monitoring arguments
#[derive(ClapArgs, Debug)]
pub struct MonitorArgs {
    /// Gateway port; searched for when omitted
    #[arg(short, long)]
    pub port: Option<String>,

    /// Command sent once the session is up (repeatable), e.g. "at$wl"
    #[arg(short, long)]
    pub send: Vec<String>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(short, long)]
    pub duration: Option<u64>,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration
    Validate {
        /// Configuration file path
        file: Option<String>,
    },
    /// Create default configuration
    Init {
        /// Directory to create the project configuration in
        #[arg(short, long)]
        output: Option<String>,
        /// Write the global configuration instead
        #[arg(short, long)]
        global: bool,
    },
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_monitor() {
        let args = Args::parse_from([
            "tartsmon", "-o", "json", "monitor", "--port", "/dev/ttyUSB0", "-s", "at$wl", "-s", "at$id", "-d", "5",
        ]);

        assert!(matches!(args.output, OutputFormat::Json));
        match args.command {
            Command::Monitor(monitor) => {
                assert_eq!(monitor.port.as_deref(), Some("/dev/ttyUSB0"));
                assert_eq!(monitor.send, vec!["at$wl", "at$id"]);
                assert_eq!(monitor.duration, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_find_with_ports() {
        let args = Args::parse_from(["tartsmon", "find", "-p", "p1", "-p", "p2"]);
        match args.command {
            Command::Find { port } => assert_eq!(port, vec!["p1", "p2"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["tartsmon", "ports", "-v", "-c", "custom.toml"]);
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::default().to_string(), "text");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}

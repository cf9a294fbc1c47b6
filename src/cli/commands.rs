use crate::cli::args::{Args, Command, ConfigCommand, MonitorArgs};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::gateway::{CommandQueue, GatewayManager};
use crate::core::protocol::{GatewayEvent, SensorReading};
use crate::domain::config::TartsConfig;
use crate::domain::error::{GatewayError, GatewayResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::available_port_names;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Execute CLI command
pub async fn execute_command(args: Args) -> GatewayResult<()> {
    let writer = ConsoleWriter::new(args.output.clone());

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new()?;
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose).map_err(|e| GatewayError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;
    }

    match args.command {
        Command::Ports => {
            let ports = available_port_names()?;
            writer.write_ports(&ports)?;
            Ok(())
        }
        Command::Find { port } => {
            let candidates = resolve_candidates(port, &config)?;
            let manager = Arc::new(GatewayManager::serial(&config.gateway));
            let found = find_gateway(manager, candidates).await?;
            writer.write_message(&format!("Gateway found on {}", found))?;
            Ok(())
        }
        Command::Monitor(monitor_args) => execute_monitor(monitor_args, &writer, &config).await,
        Command::Config(config_args) => execute_config_command(config_args.command, &writer, &config, &config_manager),
        Command::Version => {
            writer.write_message(&format!("tartsmon {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

/// Ports given on the command line, else configured ports, else every
/// port present on the system
fn resolve_candidates(ports: Vec<String>, config: &TartsConfig) -> GatewayResult<Vec<String>> {
    let candidates = if !ports.is_empty() {
        ports
    } else if !config.gateway.ports.is_empty() {
        config.gateway.ports.clone()
    } else {
        available_port_names()?
    };

    if candidates.is_empty() {
        return Err(GatewayError::InvalidInput("No serial ports found".to_string()));
    }
    Ok(candidates)
}

async fn find_gateway(manager: Arc<GatewayManager>, candidates: Vec<String>) -> GatewayResult<String> {
    tokio::task::spawn_blocking(move || manager.find(candidates.as_slice()))
        .await
        .map_err(join_error)?
        .ok_or(GatewayError::GatewayNotFound)
}

fn join_error(e: tokio::task::JoinError) -> GatewayError {
    GatewayError::Io(io::Error::new(io::ErrorKind::Other, e))
}

async fn execute_monitor(args: MonitorArgs, writer: &ConsoleWriter, config: &TartsConfig) -> GatewayResult<()> {
    let manager = Arc::new(GatewayManager::serial(&config.gateway));

    let port = match args.port {
        Some(port) => port,
        None => {
            let candidates = resolve_candidates(Vec::new(), config)?;
            find_gateway(Arc::clone(&manager), candidates).await?
        }
    };

    let sensor_writer = writer.clone();
    manager.on_sensor_data().subscribe(Arc::new(move |reading: &SensorReading| {
        if let Err(e) = sensor_writer.write_reading(reading) {
            warn!(error = %e, "Failed to write sensor data");
        }
    }));
    let event_writer = writer.clone();
    manager.on_gateway_event().subscribe(Arc::new(move |event: &GatewayEvent| {
        if let Err(e) = event_writer.write_gateway_event(event) {
            warn!(error = %e, "Failed to write gateway event");
        }
    }));

    {
        let manager = Arc::clone(&manager);
        let port = port.clone();
        tokio::task::spawn_blocking(move || manager.start(&port))
            .await
            .map_err(join_error)??;
    }

    for command in args.send {
        manager.enqueue_command(command);
    }
    forward_stdin_commands(manager.command_queue());

    writer.write_message(&format!("Monitoring gateway on {} (Press Ctrl+C to stop)", port))?;

    let interrupted = match args.duration {
        Some(secs) => tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = tokio::time::sleep(Duration::from_secs(secs)) => Ok(()),
        },
        None => tokio::signal::ctrl_c().await,
    };
    if let Err(e) = interrupted {
        warn!(error = %e, "Failed to listen for Ctrl+C");
    }

    {
        let manager = Arc::clone(&manager);
        tokio::task::spawn_blocking(move || manager.stop())
            .await
            .map_err(join_error)?;
    }

    let mut snapshot = manager.snapshot();
    snapshot.port = Some(port);
    writer.write_summary(&snapshot)?;
    Ok(())
}

/// Enqueue each non-empty stdin line as a gateway command.
///
/// Runs on a detached thread; it ends with stdin or with the process.
fn forward_stdin_commands(queue: CommandQueue) {
    let spawned = thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let command = line.trim();
                if !command.is_empty() {
                    queue.enqueue(command);
                }
            }
            debug!("Stdin closed, no more commands will be forwarded");
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start stdin command reader");
    }
}

fn execute_config_command(
    command: ConfigCommand,
    writer: &ConsoleWriter,
    config: &TartsConfig,
    config_manager: &ConfigManager,
) -> GatewayResult<()> {
    match command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
            Ok(())
        }
        ConfigCommand::Validate { file } => {
            let result = match &file {
                Some(config_path) => config_manager.load_config_from_path(config_path.as_ref()),
                None => config_manager.load_config(),
            };
            match result {
                Ok(_) => writer.write_message(&format!(
                    "Configuration '{}' is valid",
                    file.as_deref().unwrap_or("current")
                ))?,
                Err(e) => writer.write_error(&format!("Configuration validation failed: {}", e))?,
            }
            Ok(())
        }
        ConfigCommand::Init { output, global } => {
            if global {
                let global_path = config_manager.get_global_config_path_ref();
                config_manager.save_config_to_path(global_path, &TartsConfig::default())?;
                writer.write_message(&format!("Global configuration initialized at '{}'", global_path.display()))?;
            } else {
                let dir: std::path::PathBuf = match output {
                    Some(output_path) => output_path.into(),
                    None => std::env::current_dir().map_err(|e| GatewayError::Config {
                        message: format!("Failed to get current directory: {}", e),
                    })?,
                };
                let path = config_manager.init_project_config(&dir)?;
                writer.write_message(&format!("Project configuration initialized at '{}'", path.display()))?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gateway::MonitorTiming;
    use crate::core::transport::LinkSettings;
    use crate::infrastructure::mock::{MockDevice, MockPortOpener};

    fn mock_manager(opener: MockPortOpener) -> Arc<GatewayManager> {
        let settings = LinkSettings {
            timeout: Duration::from_millis(5),
            probe_settle: Duration::ZERO,
            ..LinkSettings::default()
        };
        Arc::new(GatewayManager::new(Arc::new(opener), settings, MonitorTiming::default()))
    }

    #[tokio::test]
    async fn test_find_gateway_off_runtime_thread() {
        let opener = MockPortOpener::new();
        opener.add_device("p2", MockDevice::new().with_probe_response("OK"));
        let manager = mock_manager(opener);

        let found = find_gateway(manager, vec!["p1".to_string(), "p2".to_string()]).await.unwrap();
        assert_eq!(found, "p2");
    }

    #[tokio::test]
    async fn test_find_gateway_not_found() {
        let manager = mock_manager(MockPortOpener::new());

        let result = find_gateway(manager, vec!["p1".to_string()]).await;
        assert!(matches!(result, Err(GatewayError::GatewayNotFound)));
    }

    #[test]
    fn test_explicit_ports_win() {
        let mut config = TartsConfig::default();
        config.gateway.ports = vec!["/dev/ttyS0".to_string()];

        let candidates = resolve_candidates(vec!["p1".to_string()], &config).unwrap();
        assert_eq!(candidates, vec!["p1"]);
    }

    #[test]
    fn test_configured_ports_used() {
        let mut config = TartsConfig::default();
        config.gateway.ports = vec!["/dev/ttyS0".to_string(), "/dev/ttyS1".to_string()];

        let candidates = resolve_candidates(Vec::new(), &config).unwrap();
        assert_eq!(candidates, vec!["/dev/ttyS0", "/dev/ttyS1"]);
    }
}

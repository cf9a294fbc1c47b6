use crate::domain::{config::TartsConfig, error::{GatewayError, GatewayResult}};
use std::path::{Path, PathBuf};
use std::fs;

const CONFIG_DIR_NAME: &str = "tartsmon";
const PROJECT_DIR_NAME: &str = ".tartsmon";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> GatewayResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = Self::find_project_config_path();

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Load configuration from files.
    ///
    /// Defaults, then the global file, then the project file; each layer
    /// replaces the sections it contains.
    pub fn load_config(&self) -> GatewayResult<TartsConfig> {
        let mut config = TartsConfig::default();

        if self.global_config_path.exists() {
            config = self.load_config_from_path(&self.global_config_path)?;
        }

        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let project_config = self.load_config_from_path(project_path)?;
                config.gateway = project_config.gateway;
            }
        }

        Ok(config)
    }

    /// Get global configuration path
    fn get_global_config_path() -> GatewayResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| GatewayError::Config {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home.join(".config").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> GatewayResult<TartsConfig> {
        let content = fs::read_to_string(path).map_err(|e| GatewayError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| GatewayError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path, creating parent directories
    pub fn save_config_to_path(&self, path: &Path, config: &TartsConfig) -> GatewayResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GatewayError::Config {
                message: format!("Failed to create config directory {}: {}", parent.display(), e),
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| GatewayError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| GatewayError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration under `path`
    pub fn init_project_config(&self, path: &Path) -> GatewayResult<PathBuf> {
        let config_file = path.join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME);

        if config_file.exists() {
            return Err(GatewayError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        let mut default_config = TartsConfig::default();
        default_config.gateway.ports = vec!["/dev/ttyUSB0".to_string()];

        self.save_config_to_path(&config_file, &default_config)?;

        Ok(config_file)
    }

    /// Get the current project config path (if any)
    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}

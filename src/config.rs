use serde::Deserialize;
use std::fs;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub estabelecimentos_csv: String,
    pub censo_csv: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Loads `config.toml` (or an explicit path), then applies `RAJAI_*`
    /// environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.unwrap_or("config.toml");
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EngineError::Config(format!("Failed to read config file '{}': {}", config_path, e))
        })?;

        let mut config: Config = toml::from_str(&config_content)?;

        if let Ok(v) = std::env::var("RAJAI_ESTABELECIMENTOS_CSV") {
            config.data.estabelecimentos_csv = v;
        }
        if let Ok(v) = std::env::var("RAJAI_CENSO_CSV") {
            config.data.censo_csv = v;
        }
        if let Ok(v) = std::env::var("RAJAI_PORT") {
            config.server.port = v
                .parse()
                .map_err(|_| EngineError::Config(format!("RAJAI_PORT inválido: {}", v)))?;
        }

        Ok(config)
    }
}

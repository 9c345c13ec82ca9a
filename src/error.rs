use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown bairro: {0}")]
    UnknownBairro(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

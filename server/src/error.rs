use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tick rate must be positive, got {0}")]
    InvalidTickRate(u32),
    #[error("beacon bounds must have a positive area, got {width}x{height}")]
    EmptyWorld { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Error type shared by the viewer crates
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid color {0:?}: expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("viewport {width}x{height} is too small to render")]
    EmptyViewport { width: usize, height: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

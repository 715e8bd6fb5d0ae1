use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Maximum fling distance must be greater than 0, got {0}")]
    InvalidMaxFlingDistance(f32),

    #[error("Snap index {index} is out of range for {count} items")]
    SnapIndexOutOfRange { index: usize, count: usize },

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

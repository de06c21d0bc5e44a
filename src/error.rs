use thiserror::Error;

/// Invalid shape construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("convex polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("convex polygon has zero area")]
    Degenerate,

    #[error("polygon vertices do not form a convex hull (reflex turn at vertex {0})")]
    NotConvex(usize),

    #[error("size must be finite and non-negative, got {0}")]
    InvalidSize(f32),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid check setting: {0}")]
    InvalidCheck(String),

    #[error("Invalid channel name: {0:?}")]
    InvalidChannel(String),
}

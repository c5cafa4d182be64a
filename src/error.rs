//! Error types for generation, rendering and configuration.

use std::path::PathBuf;

/// Bad input to one of the subdividers.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GenerateError {
    /// Geometric or numeric input the generator cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Requested depth is above the configured guard.
    #[error("depth {depth} exceeds the limit of {limit}")]
    DepthLimitExceeded { depth: u32, limit: u32 },
}

/// Failures while rasterizing or writing an image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid surface size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Process exit code: 2 for bad configuration or input, 1 for output failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Generate(_) | Error::Config(_) => 2,
            Error::Render(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let e: Error = GenerateError::InvalidInput("x".into()).into();
        assert_eq!(e.exit_code(), 2);
        let e: Error = GenerateError::DepthLimitExceeded { depth: 30, limit: 24 }.into();
        assert_eq!(e.exit_code(), 2);
        let e: Error = RenderError::InvalidSurface { width: 0, height: 10 }.into();
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn depth_limit_message() {
        let e = GenerateError::DepthLimitExceeded { depth: 30, limit: 24 };
        assert_eq!(e.to_string(), "depth 30 exceeds the limit of 24");
    }
}

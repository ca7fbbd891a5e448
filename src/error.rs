//! Error types for actdoc operations.

use thiserror::Error;

/// Errors that can occur while rendering or merging documentation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input of {size} bytes exceeds the {limit} byte limit for regex operations")]
    InputTooLarge { size: usize, limit: usize },

    #[error("Invalid section id: {0:?}")]
    InvalidSectionId(String),

    #[error("Section {section} failed to render: {message}")]
    Render { section: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[cfg(feature = "cli")]
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "cli")]
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the backdrop.
//!
//! Surface failures never reach the user: callers log them and fall back to a
//! backdrop that draws nothing.

use std::fmt;

/// Errors raised while acquiring the drawing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// No global `window` (not running in a browser main thread).
    NoWindow,
    /// Window has no document.
    NoDocument,
    /// The 2D drawing context could not be created.
    ContextUnavailable,
    /// A DOM call failed.
    Dom(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::NoWindow => write!(f, "no global window available"),
            SurfaceError::NoDocument => write!(f, "window has no document"),
            SurfaceError::ContextUnavailable => write!(f, "2D drawing context unavailable"),
            SurfaceError::Dom(msg) => write!(f, "DOM operation failed: {}", msg),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Errors raised while loading or validating settings.
#[derive(Debug)]
pub enum ConfigError {
    /// A field holds a value outside its allowed range.
    Invalid { field: &'static str, reason: String },
    /// Settings JSON could not be parsed.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid setting `{}`: {}", field, reason)
            }
            ConfigError::Parse(e) => write!(f, "failed to parse settings: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

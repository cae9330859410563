//! # Sticker Session Configuration
//!
//! Configuration structures and validation for sticker sessions. This is the
//! common interface between the CLI and the library.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `rows` | `u32` | 1-64 | Grid rows of a sheet |
//! | `cols` | `u32` | 1-64 | Grid columns of a sheet |
//! | `output_format` | `OutputFormat` | png/jpeg/webp | Encoding of every sticker |
//! | `square_fit` | `FitMode` | stretch/pad | Placement of non-square cells on resize |
//! | `backend.base_url` | `String` | http(s) URL | Backend for labels, upscale, generation |
//! | `backend.timeout_secs` | `u64` | 1-600 | Per-request timeout |
//!
//! ## Sources
//!
//! Values are layered, last one wins:
//! 1. [`StickerConfig::default`]
//! 2. A JSON file ([`StickerConfig::from_json_file`]); missing keys keep defaults
//! 3. `STICKERS_BACKEND_URL` ([`StickerConfig::with_env_overrides`])
//! 4. CLI flags
//!
//! ## Examples
//!
//! ```rust
//! use sticker_grid::config::StickerConfig;
//!
//! let config = StickerConfig::default();
//! assert_eq!((config.rows, config.cols), (4, 4));
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sticker_scale::grid::GridShape;
use sticker_scale::presets::SquareFit;

use crate::error::{StickerError, StickerResult};
use crate::payload::OutputFormat;

/// Environment variable overriding [`BackendConfig::base_url`].
pub const BACKEND_URL_ENV: &str = "STICKERS_BACKEND_URL";

const MAX_GRID_SIDE: u32 = 64;
const MAX_TIMEOUT_SECS: u64 = 600;

/// How a non-square sticker is placed on a square canvas when resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Stretch to fill the square
    #[default]
    Stretch,
    /// Keep proportions, pad with transparent pixels
    Pad,
}

impl FitMode {
    pub fn to_square_fit(self) -> SquareFit {
        match self {
            FitMode::Stretch => SquareFit::Stretch,
            FitMode::Pad => SquareFit::Pad { bg_rgba: [0, 0, 0, 0] },
        }
    }
}

/// Where the label/upscale/generation backend lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:3000`. Endpoints are appended to it.
    pub base_url: String,
    /// Per-request timeout in seconds. Generation can be slow.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Configuration for a sticker session.
///
/// # Examples
///
/// ```rust
/// use sticker_grid::config::{FitMode, StickerConfig};
/// use sticker_grid::payload::OutputFormat;
///
/// let config = StickerConfig {
///     rows: 2,
///     cols: 3,
///     output_format: OutputFormat::WebP,
///     square_fit: FitMode::Pad,
///     ..StickerConfig::default()
/// };
/// assert_eq!(config.grid_shape().cell_count(), Some(6));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickerConfig {
    /// Grid rows of a sheet.
    pub rows: u32,
    /// Grid columns of a sheet.
    pub cols: u32,
    /// Encoding for every sticker payload (PNG keeps transparency).
    pub output_format: OutputFormat,
    /// Placement of non-square stickers when resized to a square.
    pub square_fit: FitMode,
    /// Backend collaborator settings.
    pub backend: BackendConfig,
}

impl Default for StickerConfig {
    /// Default values:
    /// - 4×4 grid
    /// - PNG output
    /// - stretch on resize
    /// - backend at `http://localhost:3000`, 120 s timeout
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 4,
            output_format: OutputFormat::Png,
            square_fit: FitMode::Stretch,
            backend: BackendConfig::default(),
        }
    }
}

impl StickerConfig {
    /// Grid shape used for slicing.
    pub fn grid_shape(&self) -> GridShape {
        GridShape::new(self.rows, self.cols)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_GRID_SIDE).contains(&self.rows) {
            return Err(format!("Rows must be between 1 and {}", MAX_GRID_SIDE));
        }
        if !(1..=MAX_GRID_SIDE).contains(&self.cols) {
            return Err(format!("Columns must be between 1 and {}", MAX_GRID_SIDE));
        }
        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err("Backend URL must start with http:// or https://".to_string());
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.backend.timeout_secs) {
            return Err(format!(
                "Backend timeout must be between 1 and {} seconds",
                MAX_TIMEOUT_SECS
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Keys that are absent keep their
    /// default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> StickerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StickerError::io("read config", e).with_path(path.display().to_string())
        })?;
        Self::from_json_str(&raw)
            .map_err(|e| e.with_context(format!("parsing {}", path.display())))
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(raw: &str) -> StickerResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply environment overrides (`STICKERS_BACKEND_URL`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend.base_url = url.trim().to_string();
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StickerConfig::default();
        assert_eq!(config.rows, 4);
        assert_eq!(config.cols, 4);
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.square_fit, FitMode::Stretch);
        assert_eq!(config.backend.timeout_secs, 120);
    }

    #[test]
    fn test_config_validation() {
        let mut config = StickerConfig::default();
        assert!(config.validate().is_ok());

        config.rows = 0;
        assert!(config.validate().is_err());
        config.rows = 4;

        config.cols = 65;
        assert!(config.validate().is_err());
        config.cols = 4;

        config.backend.base_url = "localhost:3000".to_string();
        assert!(config.validate().is_err());
        config.backend.base_url = "https://stickers.example".to_string();

        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.backend.timeout_secs = 30;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            StickerConfig::from_json_str(r#"{ "rows": 2, "output_format": "webp", "backend": { "timeout_secs": 5 } }"#)
                .unwrap();
        assert_eq!(config.rows, 2);
        assert_eq!(config.cols, 4);
        assert_eq!(config.output_format, OutputFormat::WebP);
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.backend.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = StickerConfig::from_json_str("{ rows: ").unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_fit_mode_mapping() {
        assert_eq!(FitMode::Stretch.to_square_fit(), SquareFit::Stretch);
        assert_eq!(
            FitMode::Pad.to_square_fit(),
            SquareFit::Pad { bg_rgba: [0, 0, 0, 0] }
        );
    }
}

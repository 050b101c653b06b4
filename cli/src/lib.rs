pub mod capture;
pub mod preview;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use thiserror::Error;
use vectorize::{TraceParams, VectorizeError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Vectorize(#[from] VectorizeError),
    #[error("Capture error: {0}")]
    Capture(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Where frames come from
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Decode with ffmpeg: a file, a URL or a capture device
    Ffmpeg {
        input: String,
        /// ffmpeg input format, e.g. `v4l2`, `avfoundation`, `dshow`
        #[serde(default)]
        format: Option<String>,
        width: u32,
        height: u32,
        #[serde(default)]
        ffmpeg_path: Option<String>,
    },
    /// Image files from a directory, in file name order
    ImageDir { path: String },
}

/// What happens with each traced frame
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputMode {
    /// One log line per frame
    #[default]
    Log,
    /// One JSON object per frame on stdout
    JsonLines,
}

fn default_threshold_ratio() -> f32 {
    1.0
}

fn default_frame_interval_ms() -> u64 {
    33
}

/// Preview session configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PreviewConfig {
    pub source: SourceConfig,
    /// Multiplier applied to the frame median to get the threshold
    #[serde(default = "default_threshold_ratio")]
    #[schemars(range(min = 0.0, max = 4.0))]
    pub threshold_ratio: f32,
    #[serde(default)]
    pub trace: TraceParams,
    /// Pause between frames in milliseconds
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default)]
    pub max_frames: Option<u64>,
    #[serde(default)]
    pub output: OutputMode,
    /// Last source frame is written here when the session ends
    #[serde(default)]
    pub snapshot_path: Option<String>,
    /// Last frame with its contours filled and outlined is written here when the session ends
    #[serde(default)]
    pub overlay_path: Option<String>,
}

impl PreviewConfig {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            source,
            threshold_ratio: default_threshold_ratio(),
            trace: TraceParams::default(),
            frame_interval_ms: default_frame_interval_ms(),
            max_frames: None,
            output: OutputMode::default(),
            snapshot_path: None,
            overlay_path: None,
        }
    }

    /// Webcam preview on the first video4linux device
    pub fn sample() -> Self {
        let mut config = Self::new(SourceConfig::Ffmpeg {
            input: "/dev/video0".to_string(),
            format: Some("v4l2".to_string()),
            width: 640,
            height: 480,
            ffmpeg_path: None,
        });
        config.snapshot_path = Some("/tmp/lastframe.jpg".to_string());
        config
    }

    /// Get the JSON schema of the configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PreviewConfig)
    }

    pub fn validate(&self) -> Result<(), CliError> {
        if !self.threshold_ratio.is_finite() || self.threshold_ratio < 0.0 {
            return Err(CliError::InvalidConfig(format!(
                "threshold_ratio must be a non-negative number, got {}",
                self.threshold_ratio
            )));
        }
        match &self.source {
            SourceConfig::Ffmpeg { width, height, .. } if *width == 0 || *height == 0 => {
                Err(CliError::InvalidConfig(format!(
                    "ffmpeg frame size must be non-zero, got {}x{}",
                    width, height
                )))
            }
            SourceConfig::ImageDir { path } if path.is_empty() => {
                Err(CliError::InvalidConfig("image directory path is empty".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert configuration to JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}

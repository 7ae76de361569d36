// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Benchmark configuration
//!
//! Values come from three layers: built-in defaults, an optional TOML file and
//! the command line. Later layers win. Width and height are aligned down to
//! [`INPUT_ALIGNMENT`] before a run.

use crate::device::DeviceKind;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Input width and height must be multiples of this.
pub const INPUT_ALIGNMENT: u32 = 32;

/// Symbolic dimension the model uses for the input height.
pub const HEIGHT_DIMENSION: &str = "input_cx";
/// Symbolic dimension the model uses for the input width.
pub const WIDTH_DIMENSION: &str = "input_cy";

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// Whether stdout carries only the report, pushing status text to stderr
    pub fn reserves_stdout(self) -> bool {
        matches!(self, Self::Json)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{}' (expected text or json)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Graph optimization level handed to the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

impl FromStr for OptimizationLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" | "none" | "0" => Ok(Self::Disable),
            "basic" | "1" => Ok(Self::Basic),
            "extended" | "2" => Ok(Self::Extended),
            "all" | "3" => Ok(Self::All),
            other => Err(format!(
                "unknown optimization level '{}' (expected disable, basic, extended or all)",
                other
            )),
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disable => write!(f, "disable"),
            Self::Basic => write!(f, "basic"),
            Self::Extended => write!(f, "extended"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Full benchmark configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub model_path: PathBuf,
    pub input_width: u32,
    pub input_height: u32,
    pub input_channels: u32,
    /// Number of timed evaluations
    pub iterations: u32,
    /// Number of untimed evaluations before timing starts
    pub warmup: u32,
    /// `None` means ask on the terminal
    pub device: Option<DeviceKind>,
    /// `None` means ask on the terminal
    pub adapter: Option<usize>,
    pub format: OutputFormat,
    pub optimization: OptimizationLevel,
    pub intra_threads: Option<usize>,
    /// Extra symbolic dimension values, applied on top of the width/height defaults
    pub dimension_overrides: BTreeMap<String, i64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./model.onnx"),
            input_width: 352,
            input_height: 192,
            input_channels: 3,
            iterations: 1000,
            warmup: 1,
            device: None,
            adapter: None,
            format: OutputFormat::Text,
            optimization: OptimizationLevel::All,
            intra_threads: None,
            dimension_overrides: BTreeMap::new(),
        }
    }
}

/// Values given on the command line. `None` leaves the lower layer untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_path: Option<PathBuf>,
    pub input_width: Option<u32>,
    pub input_height: Option<u32>,
    pub input_channels: Option<u32>,
    pub iterations: Option<u32>,
    pub warmup: Option<u32>,
    pub device: Option<DeviceKind>,
    pub adapter: Option<usize>,
    pub format: Option<OutputFormat>,
    pub optimization: Option<OptimizationLevel>,
    pub intra_threads: Option<usize>,
}

impl BenchConfig {
    /// Load from TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BenchError::Configuration(format!("TOML parse error: {}", e)))
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        r#"# ONNX Bench configuration
model_path = "./model.onnx"
input_width = 352
input_height = 192
input_channels = 3
iterations = 1000
warmup = 1
# device = "gpu"
# adapter = 0
format = "text"
optimization = "all"
# intra_threads = 4

# Concrete values for symbolic input dimensions.
# input_cx / input_cy default to the aligned height / width.
# [dimension_overrides]
# sequence = 128
"#
        .into()
    }

    /// Layer command-line values over this configuration
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(v) = overrides.model_path {
            self.model_path = v;
        }
        if let Some(v) = overrides.input_width {
            self.input_width = v;
        }
        if let Some(v) = overrides.input_height {
            self.input_height = v;
        }
        if let Some(v) = overrides.input_channels {
            self.input_channels = v;
        }
        if let Some(v) = overrides.iterations {
            self.iterations = v;
        }
        if let Some(v) = overrides.warmup {
            self.warmup = v;
        }
        if overrides.device.is_some() {
            self.device = overrides.device;
        }
        if overrides.adapter.is_some() {
            self.adapter = overrides.adapter;
        }
        if let Some(v) = overrides.format {
            self.format = v;
        }
        if let Some(v) = overrides.optimization {
            self.optimization = v;
        }
        if overrides.intra_threads.is_some() {
            self.intra_threads = overrides.intra_threads;
        }
        self
    }

    /// Align width/height and validate the remaining scalars.
    pub fn normalized(mut self) -> Result<Self> {
        self.input_width = align_dimension(self.input_width, INPUT_ALIGNMENT)
            .map_err(|e| BenchError::InvalidArgument(format!("input width: {}", e)))?;
        self.input_height = align_dimension(self.input_height, INPUT_ALIGNMENT)
            .map_err(|e| BenchError::InvalidArgument(format!("input height: {}", e)))?;

        if self.input_channels == 0 {
            return Err(BenchError::InvalidArgument(
                "input channels must be at least 1".into(),
            ));
        }
        if self.iterations == 0 {
            return Err(BenchError::InvalidArgument(
                "inference count must be at least 1".into(),
            ));
        }
        if self.intra_threads == Some(0) {
            return Err(BenchError::InvalidArgument(
                "intra-op thread count must be at least 1".into(),
            ));
        }
        Ok(self)
    }

    /// Symbolic dimension values to substitute when resolving the input shape.
    ///
    /// `input_cx`/`input_cy` always track the current height/width; entries in
    /// `dimension_overrides` extend or replace them.
    pub fn effective_dimension_overrides(&self) -> BTreeMap<String, i64> {
        let mut dims = BTreeMap::new();
        dims.insert(HEIGHT_DIMENSION.to_string(), i64::from(self.input_height));
        dims.insert(WIDTH_DIMENSION.to_string(), i64::from(self.input_width));
        for (name, value) in &self.dimension_overrides {
            dims.insert(name.clone(), *value);
        }
        dims
    }
}

/// Round `value` down to a multiple of `alignment`.
///
/// Fails when the result would be zero.
pub fn align_dimension(value: u32, alignment: u32) -> std::result::Result<u32, String> {
    if alignment == 0 {
        return Err("alignment must be non-zero".into());
    }
    let aligned = value - (value % alignment);
    if aligned == 0 {
        return Err(format!(
            "{} is smaller than the required multiple of {}",
            value, alignment
        ));
    }
    Ok(aligned)
}

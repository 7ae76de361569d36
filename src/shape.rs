// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Input shape resolution
//!
//! Models usually declare some input dimensions as dynamic (`-1`, often with a
//! symbolic name). Before a tensor can be bound every dimension needs a
//! concrete value. Resolution order per dimension:
//!
//! 1. a concrete value declared by the model is kept
//! 2. a symbol listed in the overrides takes the override value
//! 3. a symbol mentioning "batch" becomes 1
//! 4. the remaining dynamic dimensions are filled from the requested
//!    width/height/channels according to the detected [`InputLayout`]

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Largest channel count treated as a channel axis when guessing layouts.
const MAX_LAYOUT_CHANNELS: i64 = 4;

/// Largest input tensor that will be allocated (4 GiB of f32).
pub const MAX_INPUT_ELEMENTS: usize = 1 << 30;

/// Description of a model input as reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    /// Declared dimensions; `-1` (or any non-positive value) is dynamic
    pub dims: Vec<i64>,
    /// Symbolic names, parallel to `dims`
    pub symbols: Vec<Option<String>>,
}

impl InputSpec {
    fn symbol(&self, axis: usize) -> Option<&str> {
        self.symbols.get(axis).and_then(|s| s.as_deref())
    }

    fn concrete(&self, axis: usize) -> Option<i64> {
        self.dims.get(axis).copied().filter(|&d| d > 0)
    }
}

/// What the caller wants bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRequest {
    pub width: i64,
    pub height: i64,
    pub channels: i64,
    pub overrides: BTreeMap<String, i64>,
}

impl ShapeRequest {
    /// Request built from aligned config values and the effective overrides
    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            width: i64::from(config.input_width),
            height: i64::from(config.input_height),
            channels: i64::from(config.input_channels),
            overrides: config.effective_dimension_overrides(),
        }
    }
}

/// Axis order assumed when filling dynamic dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputLayout {
    /// Height, width, channels
    Hwc,
    /// Channels, height, width
    Chw,
    /// Batch, channels, height, width
    Nchw,
    /// Batch, height, width, channels
    Nhwc,
    /// Batch, flattened features
    Flat,
    /// Anything else; dynamic axes become 1
    Other,
}

impl fmt::Display for InputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Hwc => "HWC",
            Self::Chw => "CHW",
            Self::Nchw => "NCHW",
            Self::Nhwc => "NHWC",
            Self::Flat => "flat",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

fn is_channel_axis(input: &InputSpec, axis: usize) -> bool {
    input
        .concrete(axis)
        .map(|d| d <= MAX_LAYOUT_CHANNELS)
        .unwrap_or(false)
}

/// Guess the layout of `input` from its rank and declared dimensions
pub fn detect_layout(input: &InputSpec) -> InputLayout {
    match input.dims.len() {
        0 => InputLayout::Hwc,
        1 | 2 => InputLayout::Flat,
        3 if is_channel_axis(input, 0) => InputLayout::Chw,
        3 => InputLayout::Hwc,
        4 if is_channel_axis(input, 3) && !is_channel_axis(input, 1) => InputLayout::Nhwc,
        4 => InputLayout::Nchw,
        _ => InputLayout::Other,
    }
}

fn layout_template(layout: InputLayout, rank: usize, req: &ShapeRequest) -> Result<Vec<i64>> {
    let (w, h, c) = (req.width, req.height, req.channels);
    let flat = || {
        w.checked_mul(h)
            .and_then(|wh| wh.checked_mul(c))
            .ok_or_else(|| {
                BenchError::InvalidArgument(format!(
                    "flattened input size {} x {} x {} overflows",
                    w, h, c
                ))
            })
    };
    Ok(match layout {
        InputLayout::Hwc => vec![h, w, c],
        InputLayout::Chw => vec![c, h, w],
        InputLayout::Nchw => vec![1, c, h, w],
        InputLayout::Nhwc => vec![1, h, w, c],
        InputLayout::Flat if rank == 1 => vec![flat()?],
        InputLayout::Flat => vec![1, flat()?],
        InputLayout::Other => vec![1; rank],
    })
}

/// Compute the concrete shape to bind for `input`.
///
/// A model input of unknown rank gets `[height, width, channels]`. Fails when
/// the resulting tensor would exceed [`MAX_INPUT_ELEMENTS`].
pub fn resolve_input_shape(input: &InputSpec, req: &ShapeRequest) -> Result<Vec<i64>> {
    let layout = detect_layout(input);
    let rank = input.dims.len();
    let template = layout_template(layout, rank, req)?;

    if rank == 0 {
        checked_element_count(&template)?;
        return Ok(template);
    }

    let shape: Vec<i64> = (0..rank)
        .map(|axis| {
            if let Some(d) = input.concrete(axis) {
                if template[axis] != d {
                    log::warn!(
                        "Input '{}' fixes axis {} to {} ({} layout would use {})",
                        input.name,
                        axis,
                        d,
                        layout,
                        template[axis]
                    );
                }
                return d;
            }
            if let Some(symbol) = input.symbol(axis) {
                if let Some(&v) = req.overrides.get(symbol) {
                    return v;
                }
                if symbol.to_lowercase().contains("batch") {
                    return 1;
                }
            }
            template[axis]
        })
        .collect();

    log::debug!(
        "Resolved input '{}' {:?} as {} -> {:?}",
        input.name,
        input.dims,
        layout,
        shape
    );
    checked_element_count(&shape)?;
    Ok(shape)
}

/// Number of elements in `shape`.
///
/// Every dimension must be positive and the product must not exceed
/// [`MAX_INPUT_ELEMENTS`].
pub fn checked_element_count(shape: &[i64]) -> Result<usize> {
    shape.iter().try_fold(1usize, |acc, &d| {
        let d = usize::try_from(d)
            .ok()
            .filter(|&d| d > 0)
            .ok_or_else(|| {
                BenchError::InvalidArgument(format!("bad input dimension {} in {:?}", d, shape))
            })?;
        acc.checked_mul(d)
            .filter(|&n| n <= MAX_INPUT_ELEMENTS)
            .ok_or_else(|| {
                BenchError::InvalidArgument(format!(
                    "input shape {:?} exceeds {} elements",
                    shape, MAX_INPUT_ELEMENTS
                ))
            })
    })
}

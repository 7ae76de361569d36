// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Execution device discovery and selection
//!
//! ## Platform Support
//!
//! - **Windows**: GPU adapters from DXGI, executed through DirectML
//! - **Linux** (`nvidia` feature): NVIDIA GPUs from NVML, executed through CUDA
//! - **Everywhere**: CPU execution

#[cfg(all(target_os = "linux", feature = "nvidia"))]
mod nvidia;
#[cfg(windows)]
mod windows_helpers;

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::prompt::Prompter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

pub const VENDOR_NVIDIA: u32 = 0x10DE;
pub const VENDOR_AMD: u32 = 0x1002;
pub const VENDOR_INTEL: u32 = 0x8086;
pub const VENDOR_MICROSOFT: u32 = 0x1414;

/// CPU or GPU, as answered at the first prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "cpu" => Ok(Self::Cpu),
            "1" | "gpu" => Ok(Self::Gpu),
            other => Err(format!(
                "unknown device '{}' (expected 0/cpu or 1/gpu)",
                other
            )),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Gpu => write!(f, "gpu"),
        }
    }
}

/// Which API reported the adapter. Decides the execution provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterBackend {
    /// DXGI enumeration, run through DirectML
    Dxgi,
    /// NVML enumeration, run through CUDA
    Nvml,
}

/// A GPU adapter that can run inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Ordinal handed to the execution provider as `device_id`
    pub index: usize,
    pub description: String,
    /// PCI vendor ID (e.g., 0x1002 for AMD, 0x8086 for Intel, 0x10DE for NVIDIA)
    pub vendor_id: u32,
    pub device_id: u32,
    /// Dedicated video memory in bytes
    pub dedicated_video_memory: u64,
    /// Shared system memory in bytes
    pub shared_system_memory: u64,
    pub backend: AdapterBackend,
}

impl AdapterInfo {
    pub fn vendor_name(&self) -> &'static str {
        vendor_name(self.vendor_id)
    }
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)?;
        if self.dedicated_video_memory > 0 {
            write!(
                f,
                " ({} MiB)",
                self.dedicated_video_memory / (1024 * 1024)
            )?;
        }
        Ok(())
    }
}

/// Human-readable PCI vendor name
pub fn vendor_name(vendor_id: u32) -> &'static str {
    match vendor_id {
        VENDOR_NVIDIA => "NVIDIA",
        VENDOR_AMD => "AMD",
        VENDOR_INTEL => "Intel",
        VENDOR_MICROSOFT => "Microsoft",
        _ => "Unknown",
    }
}

/// The device the session will be created on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionDevice {
    Cpu,
    Gpu(AdapterInfo),
}

impl ExecutionDevice {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Cpu => DeviceKind::Cpu,
            Self::Gpu(_) => DeviceKind::Gpu,
        }
    }

    /// Short label used in reports
    pub fn label(&self) -> String {
        match self {
            Self::Cpu => "CPU".to_string(),
            Self::Gpu(adapter) => format!("GPU {}: {}", adapter.index, adapter.description),
        }
    }
}

/// Enumerate the GPU adapters available on this platform.
///
/// Failures are logged and produce an empty list; a GPU run then fails at
/// selection with [`BenchError::DeviceNotFound`].
pub fn enumerate_adapters() -> Vec<AdapterInfo> {
    #[cfg(windows)]
    {
        windows_helpers::enumerate_dxgi_adapters()
    }

    #[cfg(all(target_os = "linux", feature = "nvidia"))]
    {
        match nvidia::enumerate_nvml_adapters() {
            Ok(adapters) => adapters,
            Err(e) => {
                log::warn!("NVML adapter enumeration failed: {}", e);
                Vec::new()
            }
        }
    }

    #[cfg(not(any(windows, all(target_os = "linux", feature = "nvidia"))))]
    {
        log::debug!("No GPU adapter enumeration backend on this platform");
        Vec::new()
    }
}

/// Write the `Adapter i: name` listing shown before the adapter prompt
pub fn write_adapter_list<W: Write>(out: &mut W, adapters: &[AdapterInfo]) -> Result<()> {
    for adapter in adapters {
        writeln!(out, "Adapter {}: {}", adapter.index, adapter)?;
    }
    Ok(())
}

/// Resolve the execution device from the config, asking on `prompter` for
/// anything the config leaves open.
pub fn select_device<R: BufRead, W: Write>(
    config: &BenchConfig,
    prompter: &mut Prompter<R, W>,
    adapters: &[AdapterInfo],
) -> Result<ExecutionDevice> {
    let kind = match config.device {
        Some(kind) => kind,
        None => {
            let kind = prompter.ask("\nUse CPU (0) or GPU (1) to inference: ", |s| {
                s.parse::<DeviceKind>()
            })?;
            writeln!(prompter.output())?;
            kind
        }
    };

    if kind == DeviceKind::Cpu {
        log::info!("Selected CPU execution");
        return Ok(ExecutionDevice::Cpu);
    }

    if adapters.is_empty() {
        return Err(BenchError::DeviceNotFound(
            "no GPU adapters found on this system".into(),
        ));
    }

    let index = match config.adapter {
        Some(index) => index,
        None => {
            write_adapter_list(prompter.output(), adapters)?;
            let last = adapters.len() - 1;
            prompter.ask(&format!("\nChoose adapter (0 - {}): ", last), |s| {
                s.parse::<usize>()
                    .map_err(|_| format!("'{}' is not an adapter number", s))
            })?
        }
    };

    let adapter = adapters
        .iter()
        .find(|a| a.index == index)
        .cloned()
        .ok_or_else(|| {
            BenchError::DeviceNotFound(format!(
                "adapter {} (available: {})",
                index,
                adapters
                    .iter()
                    .map(|a| a.index.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

    log::info!(
        "Selected adapter {}: {} [{}]",
        adapter.index,
        adapter.description,
        adapter.vendor_name()
    );
    Ok(ExecutionDevice::Gpu(adapter))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! NVIDIA adapter enumeration via NVML
//!
//! NVML device indices match the CUDA device ordinals the CUDA execution
//! provider expects, as long as `CUDA_VISIBLE_DEVICES` is unset.

#![cfg(all(target_os = "linux", feature = "nvidia"))]

use super::{AdapterBackend, AdapterInfo};
use crate::error::Result;
use nvml_wrapper::Nvml;

pub fn enumerate_nvml_adapters() -> Result<Vec<AdapterInfo>> {
    let nvml = Nvml::init()?;
    let count = nvml.device_count()?;
    let mut adapters = Vec::with_capacity(count as usize);

    for index in 0..count {
        let device = nvml.device_by_index(index)?;
        let description = device.name()?;
        let memory = device.memory_info()?;
        // pci_device_id packs the device id in the high half, vendor in the low half
        let (vendor_id, device_id) = match device.pci_info() {
            Ok(pci) => (pci.pci_device_id & 0xFFFF, pci.pci_device_id >> 16),
            Err(e) => {
                log::debug!("pci_info failed for GPU {}: {}", index, e);
                (super::VENDOR_NVIDIA, 0)
            }
        };

        adapters.push(AdapterInfo {
            index: index as usize,
            description,
            vendor_id,
            device_id,
            dedicated_video_memory: memory.total,
            shared_system_memory: 0,
            backend: AdapterBackend::Nvml,
        });
    }

    Ok(adapters)
}

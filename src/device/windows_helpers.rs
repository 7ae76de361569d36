// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! DXGI adapter enumeration
//!
//! Adapter indices returned here are the `IDXGIFactory1::EnumAdapters`
//! ordinals, which is what the DirectML execution provider takes as its
//! `device_id`.

#![cfg(windows)]

use super::{AdapterBackend, AdapterInfo};

/// Enumerate DXGI adapters in `EnumAdapters` order.
///
/// Adapters whose descriptor cannot be read are skipped but keep their
/// ordinal, so the remaining indices still line up with DirectML.
pub fn enumerate_dxgi_adapters() -> Vec<AdapterInfo> {
    use windows::Win32::Graphics::Dxgi::{CreateDXGIFactory1, IDXGIFactory1};

    let mut adapters = Vec::new();

    let factory: IDXGIFactory1 = match unsafe { CreateDXGIFactory1() } {
        Ok(f) => f,
        Err(e) => {
            log::warn!("CreateDXGIFactory1 failed: {}", e);
            return adapters;
        }
    };

    let mut index = 0u32;
    loop {
        // DXGI_ERROR_NOT_FOUND ends the enumeration
        let adapter = match unsafe { factory.EnumAdapters(index) } {
            Ok(a) => a,
            Err(_) => break,
        };

        let desc = match unsafe { adapter.GetDesc() } {
            Ok(d) => d,
            Err(e) => {
                log::debug!("GetDesc failed for adapter {}: {}", index, e);
                index += 1;
                continue;
            }
        };

        adapters.push(AdapterInfo {
            index: index as usize,
            description: wide_to_string(&desc.Description),
            vendor_id: desc.VendorId,
            device_id: desc.DeviceId,
            dedicated_video_memory: desc.DedicatedVideoMemory as u64,
            shared_system_memory: desc.SharedSystemMemory as u64,
            backend: AdapterBackend::Dxgi,
        });

        index += 1;
    }

    adapters
}

/// Convert a NUL-terminated UTF-16 buffer to a String
fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_to_string_stops_at_nul() {
        let mut buf = [0u16; 16];
        for (i, c) in "Radeon".encode_utf16().enumerate() {
            buf[i] = c;
        }
        assert_eq!(wide_to_string(&buf), "Radeon");
    }

    #[test]
    fn test_wide_to_string_without_nul() {
        let buf: Vec<u16> = "Arc A770".encode_utf16().collect();
        assert_eq!(wide_to_string(&buf), "Arc A770");
    }

    #[test]
    fn test_enumerated_indices_are_increasing() {
        let adapters = enumerate_dxgi_adapters();
        for pair in adapters.windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
    }
}

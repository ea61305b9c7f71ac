// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Hardware products (server sizes).
//!
//! CloudSigma has no fixed flavors: any combination of memory, CPU speed and
//! CPU count is accepted. Products are encoded as `<ram>:<mhz>` or
//! `<ram>:<mhz>:<count>`.

use std::fmt;

use super::super::common::Architecture;

const RAM_SIZES_MB: &[u32] = &[
    512, 1024, 2048, 4096, 8192, 12288, 16384, 20480, 24576, 28668, 32768,
];

const CPU_SPEEDS_MHZ: &[u32] = &[
    1000, 1200, 1500, 2000, 2500, 3000, 4000, 5000, 6000, 7000, 8000, 9000, 10000, 12000,
    14000, 16000, 18000, 20000,
];

const CPU_COUNTS: &[u32] = &[1, 2, 4, 8];

/// A server hardware configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product ID, `<ram>:<mhz>[:<count>]`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description, same as the name.
    pub description: String,
    /// Memory in MiB.
    pub ram_mb: u32,
    /// CPU speed in MHz.
    pub cpu_mhz: u32,
    /// Number of CPUs.
    pub cpu_count: u32,
    /// Size of the root volume in GiB, always zero since drives are separate.
    pub root_volume_gb: u32,
}

impl Product {
    fn new(id: String, ram_mb: u32, cpu_mhz: u32, cpu_count: u32) -> Product {
        let name = format!("{}MB - {}x{}MHz", ram_mb, cpu_count, cpu_mhz);
        Product {
            id,
            description: name.clone(),
            name,
            ram_mb,
            cpu_mhz,
            cpu_count,
            root_volume_gb: 0,
        }
    }

    /// Parse a product ID.
    ///
    /// Returns `None` for IDs with less than two parts or with non-numeric
    /// parts.
    pub fn parse<S: AsRef<str>>(id: S) -> Option<Product> {
        let id = id.as_ref();
        let parts: Vec<&str> = id.split(':').map(str::trim).collect();
        if parts.len() < 2 {
            return None;
        }

        let ram_mb = parts[0].parse().ok()?;
        let cpu_mhz = parts[1].parse().ok()?;
        let cpu_count = match parts.get(2) {
            Some(count) => count.parse().ok()?,
            None => 1,
        };
        Some(Product::new(id.to_string(), ram_mb, cpu_mhz, cpu_count))
    }

    /// Hardware settings for a product ID, falling back to defaults.
    ///
    /// Returns `(ram_mb, cpu_mhz, cpu_count)`. Values are read in order and
    /// the first malformed one stops parsing, so it and everything after it
    /// keep the defaults of 512 MiB, 1000 MHz and one CPU.
    pub fn settings_for<S: AsRef<str>>(id: S) -> (u32, u32, u32) {
        let value = id.as_ref().replace('\n', " ");
        let parts: Vec<&str> = value.split(':').map(str::trim).collect();
        let mut settings = (512, 1000, 1);
        if parts.len() < 2 {
            return settings;
        }

        match parts[0].parse() {
            Ok(ram) => settings.0 = ram,
            Err(_) => return settings,
        }
        match parts[1].parse() {
            Ok(speed) => settings.1 = speed,
            Err(_) => return settings,
        }
        if parts.len() == 3 {
            if let Ok(count) = parts[2].parse() {
                settings.2 = count;
            }
        }
        settings
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Build the product ID for hardware settings.
pub fn product_id(ram_mb: u32, cpu_mhz: u32, cpu_count: u32) -> String {
    if cpu_count == 1 {
        format!("{}:{}", ram_mb, cpu_mhz)
    } else {
        format!("{}:{}:{}", ram_mb, cpu_mhz, cpu_count)
    }
}

/// List the standard products.
///
/// The catalog is the same for every architecture.
pub fn list_products(_architecture: Architecture) -> Vec<Product> {
    let mut result =
        Vec::with_capacity(RAM_SIZES_MB.len() * CPU_SPEEDS_MHZ.len() * CPU_COUNTS.len());
    for &ram in RAM_SIZES_MB {
        for &speed in CPU_SPEEDS_MHZ {
            for &count in CPU_COUNTS {
                result.push(Product::new(product_id(ram, speed, count), ram, speed, count));
            }
        }
    }
    result
}

/// Architectures servers can use.
pub fn list_supported_architectures() -> Vec<Architecture> {
    vec![Architecture::I64, Architecture::I32]
}

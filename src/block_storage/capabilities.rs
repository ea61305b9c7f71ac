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

//! What the drives API can do.

use super::super::common::{NamingConstraints, Requirement};

/// Static description of the volume support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeCapabilities {
    /// Provider term for a volume.
    pub term: &'static str,
    /// Provider term for a machine image.
    pub image_term: &'static str,
    /// Maximum number of volumes, `None` when unknown.
    pub max_volume_count: Option<u32>,
    /// Minimum volume size in GiB.
    pub min_size_gb: u64,
    /// Maximum volume size in GiB.
    pub max_size_gb: u64,
    /// Constraints on volume names.
    pub naming: NamingConstraints,
    /// Whether a volume product must be given.
    pub product_requirement: Requirement,
    /// Whether the size is determined by the product.
    pub size_determined_by_product: bool,
    /// Whether volumes can be created from snapshots.
    pub supports_snapshots: bool,
    /// Whether a public image library exists.
    pub has_public_library: bool,
    /// Whether images can be shared with other accounts.
    pub supports_image_sharing: bool,
}

/// Capabilities of the drives API.
pub const CAPABILITIES: VolumeCapabilities = VolumeCapabilities {
    term: "drive",
    image_term: "drive",
    max_volume_count: None,
    min_size_gb: 1,
    max_size_gb: 100,
    naming: NamingConstraints::any(1, 64),
    product_requirement: Requirement::Optional,
    size_determined_by_product: false,
    supports_snapshots: false,
    has_public_library: true,
    supports_image_sharing: false,
};

// Copyright 2024 Sandro-Alessio Gierens <sandro@gierens.de>
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

//! Drives used as block storage volumes.
//!
//! CloudSigma uses drives both for volumes and for machine images. Volumes
//! are attached to `block:N` slots of servers, which requires stopping them.

pub(crate) mod api;
pub mod capabilities;
pub(crate) mod protocol;
mod volumes;

pub use self::capabilities::VolumeCapabilities;
pub use self::protocol::{DriveStatus, PUBLIC_OWNER};
pub use self::volumes::{
    list_possible_device_ids, list_volume_products, NewVolume, Volume, VolumeProduct,
    VolumeState, VolumeType,
};

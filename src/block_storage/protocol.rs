// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Key/value structures and protocol bits for the drives API.

#![allow(missing_docs)]

use super::super::common::KvObject;

/// Default volume size when the API does not report one.
pub const DEFAULT_SIZE_BYTES: u64 = 1024 * 1024 * 1024;

/// Tag marking drives placed on SSD storage.
pub const SSD_TAG: &str = "affinity:ssd";

/// Owner of drives in the public library.
pub const PUBLIC_OWNER: &str = "00000000-0000-0000-0000-000000000001";

protocol_enum! {
    #[doc = "Drive status as reported by the API."]
    enum DriveStatus {
        #[doc = "Ready for use."]
        Active = "active",
        #[doc = "Not usable."]
        Inactive = "inactive",
        #[doc = "Being copied."]
        Copying = "copying",
        #[doc = "Reported state was not recognized."]
        Unknown = "unknown"
    }
}

impl DriveStatus {
    /// Map a state reported by the API.
    pub fn from_api(value: Option<&str>) -> DriveStatus {
        match value.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("active") => DriveStatus::Active,
            Some(s) if s.eq_ignore_ascii_case("inactive") => DriveStatus::Inactive,
            Some(s) if s.starts_with("copying") => DriveStatus::Copying,
            Some(other) => {
                warn!("Unknown drive state {}", other);
                DriveStatus::Unknown
            }
            None => DriveStatus::Unknown,
        }
    }
}

impl Default for DriveStatus {
    fn default() -> DriveStatus {
        DriveStatus::Unknown
    }
}

/// A drive as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drive {
    pub id: String,
    pub name: Option<String>,
    pub status: DriveStatus,
    /// Progress of an imaging operation, if one is running.
    pub imaging: Option<String>,
    pub claimed: Option<String>,
    pub size: Option<u64>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub tags: Option<String>,
    pub os: Option<String>,
    pub bits: Option<String>,
    pub licenses: Option<String>,
    pub install_notes: Option<String>,
}

fn non_empty(object: &KvObject, key: &str) -> Option<String> {
    object.get_non_empty(key).map(ToString::to_string)
}

impl Drive {
    /// Map a key/value object, `None` if it has no drive ID.
    pub fn from_kv(object: &KvObject) -> Option<Drive> {
        let id = non_empty(object, "drive")?;
        let size = match object.get_non_empty("size") {
            Some(value) => match value.trim().parse() {
                Ok(size) => Some(size),
                Err(_) => {
                    warn!("Invalid size {} of drive {}", value, id);
                    None
                }
            },
            None => None,
        };

        Some(Drive {
            id,
            name: non_empty(object, "name"),
            status: DriveStatus::from_api(object.get("status")),
            imaging: object.get("imaging").map(ToString::to_string),
            claimed: object.get("claimed").map(ToString::to_string),
            size,
            user: non_empty(object, "user"),
            host: non_empty(object, "host"),
            tags: object.get("tags").map(ToString::to_string),
            os: non_empty(object, "os"),
            bits: non_empty(object, "bits"),
            licenses: object.get("licenses").map(ToString::to_string),
            install_notes: non_empty(object, "install_notes"),
        })
    }

    /// Whether the drive is claimed by something other than imaging.
    pub fn is_claimed(&self) -> bool {
        match self.claimed {
            Some(ref claim) => !claim.trim().is_empty() && !claim.contains("imaging"),
            None => false,
        }
    }

    /// Whether the drive is active and no imaging is running on it.
    pub fn is_ready(&self) -> bool {
        self.status == DriveStatus::Active && self.imaging.is_none()
    }

    /// Whether the drive is placed on SSD storage.
    pub fn is_ssd(&self) -> bool {
        self.tags.as_deref() == Some(SSD_TAG)
    }

    /// Owner of the drive, public drives are owned by the public account.
    pub fn owner(&self) -> &str {
        self.user.as_deref().unwrap_or(PUBLIC_OWNER)
    }

    /// Drive name, defaults to the ID.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

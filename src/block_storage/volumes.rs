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

//! Drives used as volumes.

use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;

use super::super::common::{DeletionWaiter, KvBody, Platform, Refresh};
use super::super::compute::{BackgroundTask, Server, MAX_BLOCK_DEVICES};
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::capabilities::CAPABILITIES;
use super::{api, protocol};

const GIB: u64 = 1024 * 1024 * 1024;

protocol_enum! {
    #[doc = "Possible volume states."]
    enum VolumeState {
        #[doc = "Being created or copied."]
        Pending = "pending",
        #[doc = "Ready for use."]
        Available = "available",
        #[doc = "Removed."]
        Deleted = "deleted"
    }
}

protocol_enum! {
    #[doc = "Storage type of a volume."]
    enum VolumeType {
        #[doc = "Spinning disks."]
        Hdd = "hdd",
        #[doc = "Solid state disks."]
        Ssd = "ssd"
    }
}

/// A volume product (storage type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeProduct {
    /// Product ID used when creating volumes.
    pub id: String,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Storage type.
    pub volume_type: VolumeType,
}

/// Structure representing a single volume.
#[derive(Clone, Debug)]
pub struct Volume {
    session: Session,
    inner: protocol::Drive,
    region_id: String,
    server_id: Option<String>,
    device_id: Option<u8>,
}

/// A request to create a volume.
#[derive(Clone, Debug)]
pub struct NewVolume {
    session: Session,
    name: String,
    size_gb: u64,
    product_id: Option<String>,
    snapshot_id: Option<String>,
}

impl Display for Volume {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#?}", self.inner)
    }
}

impl Volume {
    /// Build a volume, resolving the server it is attached to.
    pub(crate) async fn from_drive(session: Session, inner: protocol::Drive) -> Result<Volume> {
        let region_id = session.region_id()?;
        let (server_id, device_id) = match inner.host {
            Some(ref host) => match Server::find(&session, host).await? {
                Some(server) => (Some(host.clone()), server.device_of(&inner.id)),
                None => (None, None),
            },
            None => (None, None),
        };

        Ok(Volume {
            session,
            inner,
            region_id,
            server_id,
            device_id,
        })
    }

    /// Load a volume, `None` if it does not exist.
    pub(crate) async fn find<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Option<Volume>> {
        match api::get_own_drive(session, id).await? {
            Some(drive) => Ok(Some(Volume::from_drive(session.clone(), drive).await?)),
            None => Ok(None),
        }
    }

    /// Load a volume.
    pub(crate) async fn load<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Volume> {
        let id = id.as_ref();
        Volume::find(session, id).await?.ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("No such volume: {}", id),
            )
        })
    }

    /// List all drives of the account as volumes.
    pub(crate) async fn list(session: &Session) -> Result<Vec<Volume>> {
        let mut result = Vec::new();
        for drive in api::list_drives(session).await? {
            result.push(Volume::from_drive(session.clone(), drive).await?);
        }
        Ok(result)
    }

    transparent_property! {
        #[doc = "Volume unique ID."]
        id: ref String
    }

    /// Volume name, defaults to the ID.
    pub fn name(&self) -> &str {
        self.inner.display_name()
    }

    /// Volume description, same as the name.
    pub fn description(&self) -> &str {
        self.name()
    }

    /// Volume size in bytes.
    pub fn size(&self) -> u64 {
        self.inner.size.unwrap_or(protocol::DEFAULT_SIZE_BYTES)
    }

    /// Volume state.
    pub fn state(&self) -> VolumeState {
        match self.inner.status {
            protocol::DriveStatus::Active if self.inner.imaging.is_some() => VolumeState::Pending,
            protocol::DriveStatus::Active => VolumeState::Available,
            protocol::DriveStatus::Inactive => VolumeState::Deleted,
            _ => VolumeState::Pending,
        }
    }

    /// Storage type.
    pub fn volume_type(&self) -> VolumeType {
        if self.inner.is_ssd() {
            VolumeType::Ssd
        } else {
            VolumeType::Hdd
        }
    }

    /// Volume product ID (`hdd` or `ssd`).
    pub fn product_id(&self) -> &'static str {
        self.volume_type().as_str()
    }

    /// ID of the server the volume is attached to.
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    /// Device slot (`block:N`) on the server.
    pub fn device_id(&self) -> Option<u8> {
        self.device_id
    }

    /// Guest operating system if the volume has one installed.
    pub fn guest_platform(&self) -> Option<Platform> {
        self.inner
            .os
            .as_deref()
            .map(|os| Platform::guess_with_fallback(Some(os), self.name()))
    }

    /// Whether the volume carries an operating system.
    pub fn is_root_volume(&self) -> bool {
        self.inner.os.is_some()
    }

    /// ID of the region.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// ID of the data center.
    pub fn data_center_id(&self) -> String {
        format!("{}-a", self.region_id)
    }

    /// Attach the volume to a server.
    ///
    /// The server is stopped for the change and restarted in the background
    /// if it was running.
    pub async fn attach<S: AsRef<str>>(
        &mut self,
        server_id: S,
        device: u8,
    ) -> Result<Option<BackgroundTask<()>>> {
        let server_id = server_id.as_ref();
        if let Some(ref current) = self.server_id {
            if current != server_id {
                return Err(Error::new(
                    ErrorKind::Conflict,
                    format!(
                        "Volume {} is already attached to server {}",
                        self.inner.id, current
                    ),
                ));
            }
        }
        let mut server = Server::load(&self.session, server_id).await?;
        let task = server.attach_drive(&self.inner.id, device).await?;
        self.server_id = Some(server.id().clone());
        self.device_id = Some(device);
        Ok(task)
    }

    /// Detach the volume from its server.
    pub async fn detach(&mut self) -> Result<Option<BackgroundTask<()>>> {
        let server_id = self.server_id.clone().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Volume {} is not attached", self.inner.id),
            )
        })?;
        let mut server = Server::load(&self.session, server_id).await?;
        let task = server.detach_drive(&self.inner.id).await?;
        self.server_id = None;
        self.device_id = None;
        Ok(task)
    }

    /// Delete the volume.
    pub async fn delete(self) -> Result<DeletionWaiter<Volume>> {
        api::destroy_drive(&self.session, &self.inner.id).await?;
        let timeouts = *self.session.timeouts();
        Ok(DeletionWaiter::new(
            self,
            timeouts.terminate,
            timeouts.poll_interval,
        ))
    }
}

#[async_trait]
impl Refresh for Volume {
    /// Refresh the volume.
    async fn refresh(&mut self) -> Result<()> {
        *self = Volume::load(&self.session, &self.inner.id).await?;
        Ok(())
    }
}

impl NewVolume {
    /// Start creating a volume.
    pub(crate) fn new(session: Session, name: String, size_gb: u64) -> NewVolume {
        NewVolume {
            session,
            name,
            size_gb,
            product_id: None,
            snapshot_id: None,
        }
    }

    /// Request creation of the volume.
    pub async fn create(self) -> Result<Volume> {
        if self.snapshot_id.is_some() {
            return Err(Error::not_supported("Creating volumes from snapshots"));
        }
        let (min_size_gb, max_size_gb) = (CAPABILITIES.min_size_gb, CAPABILITIES.max_size_gb);
        if self.size_gb < min_size_gb || self.size_gb > max_size_gb {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Volume size must be between {} and {} GiB, got {}",
                    min_size_gb, max_size_gb, self.size_gb
                ),
            ));
        }
        let size = self.size_gb.checked_mul(GIB).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Volume size {} GiB is too large", self.size_gb),
            )
        })?;

        let mut body = KvBody::new()
            .with("name", &self.name)
            .with("size", size.to_string())
            .with("claim:type", "exclusive");
        if self.product_id.as_deref() == Some(VolumeType::Ssd.as_str()) {
            body.push("tags", protocol::SSD_TAG);
        }

        let drive = api::create_drive(&self.session, body).await?;
        Volume::from_drive(self.session, drive).await
    }

    creation_field! {
        #[doc = "Set the name."]
        set_name, with_name -> name: String
    }

    creation_field! {
        #[doc = "Set the size in GiB."]
        set_size, with_size -> size_gb: u64
    }

    creation_field! {
        #[doc = "Set the product ID (`hdd` or `ssd`)."]
        set_product_id, with_product_id -> product_id: optional String
    }

    creation_field! {
        #[doc = "Set the snapshot to create the volume from (not supported)."]
        set_snapshot_id, with_snapshot_id -> snapshot_id: optional String
    }
}

/// Volume products: HDD and SSD storage.
pub fn list_volume_products() -> Vec<VolumeProduct> {
    vec![
        VolumeProduct {
            id: VolumeType::Hdd.as_str().to_string(),
            name: "HDD".to_string(),
            description: "HDD Affinity".to_string(),
            volume_type: VolumeType::Hdd,
        },
        VolumeProduct {
            id: VolumeType::Ssd.as_str().to_string(),
            name: "SSD".to_string(),
            description: "SSD Affinity".to_string(),
            volume_type: VolumeType::Ssd,
        },
    ]
}

/// Device IDs volumes can be attached as.
pub fn list_possible_device_ids() -> Vec<String> {
    (0..MAX_BLOCK_DEVICES).map(|n| n.to_string()).collect()
}

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

//! Machine images backed by drives.

use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;

use super::super::block_storage::api as drive_api;
use super::super::block_storage::protocol::{Drive, DriveStatus, PUBLIC_OWNER};
use super::super::common::{Architecture, DeletionWaiter, Platform, Refresh};
use super::super::compute::{BackgroundTask, Server};
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};

protocol_enum! {
    #[doc = "Possible machine image states."]
    enum ImageState {
        #[doc = "Being created or copied."]
        Pending = "pending",
        #[doc = "Ready for use."]
        Active = "active",
        #[doc = "Removed."]
        Deleted = "deleted"
    }
}

protocol_enum! {
    #[doc = "Formats machine images can be imported from."]
    enum ImageFormat {
        #[doc = "Open Virtualization Format."]
        Ovf = "ovf"
    }
}

/// Structure representing a single machine image.
#[derive(Clone, Debug)]
pub struct MachineImage {
    session: Session,
    inner: Drive,
    region_id: String,
}

impl Display for MachineImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#?}", self.inner)
    }
}

impl MachineImage {
    /// Build an image from a drive, `None` for drives claimed by servers.
    pub(crate) fn from_drive(session: &Session, inner: Drive) -> Result<Option<MachineImage>> {
        if inner.is_claimed() {
            trace!("Drive {} is claimed, not an image", inner.id);
            return Ok(None);
        }

        Ok(Some(MachineImage {
            region_id: session.region_id()?,
            session: session.clone(),
            inner,
        }))
    }

    /// Load an image, `None` if it does not exist.
    pub(crate) async fn find<Id: AsRef<str>>(
        session: &Session,
        id: Id,
    ) -> Result<Option<MachineImage>> {
        match drive_api::get_drive(session, id).await? {
            Some(drive) => MachineImage::from_drive(session, drive),
            None => Ok(None),
        }
    }

    /// Load an image.
    pub(crate) async fn load<Id: AsRef<str>>(session: &Session, id: Id) -> Result<MachineImage> {
        let id = id.as_ref();
        MachineImage::find(session, id).await?.ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("No such machine image: {}", id),
            )
        })
    }

    transparent_property! {
        #[doc = "Image unique ID."]
        id: ref String
    }

    /// Image name, defaults to the ID.
    pub fn name(&self) -> &str {
        self.inner.display_name()
    }

    /// Image description, defaults to the name.
    pub fn description(&self) -> &str {
        self.inner
            .install_notes
            .as_deref()
            .unwrap_or_else(|| self.name())
    }

    /// ID of the owning account, the public account for library images.
    pub fn owner(&self) -> &str {
        self.inner.owner()
    }

    /// Image state.
    pub fn state(&self) -> ImageState {
        match self.inner.status {
            DriveStatus::Active if self.inner.imaging.is_some() => ImageState::Pending,
            DriveStatus::Active => ImageState::Active,
            DriveStatus::Inactive => ImageState::Deleted,
            _ => ImageState::Pending,
        }
    }

    /// Image size in bytes.
    pub fn size(&self) -> Option<u64> {
        self.inner.size
    }

    /// Software licenses installed on the image.
    pub fn software(&self) -> &str {
        self.inner.licenses.as_deref().unwrap_or("")
    }

    /// CPU architecture.
    pub fn architecture(&self) -> Architecture {
        Architecture::from_bits(self.inner.bits.as_deref())
    }

    /// Operating system.
    pub fn platform(&self) -> Platform {
        Platform::guess_with_fallback(self.inner.os.as_deref(), self.name())
    }

    /// Whether the image belongs to the public library.
    pub fn is_public(&self) -> bool {
        self.owner() == PUBLIC_OWNER
    }

    /// ID of the region.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Whether the image matches search criteria.
    pub fn matches(
        &self,
        keyword: Option<&str>,
        platform: Option<Platform>,
        architecture: Option<Architecture>,
    ) -> bool {
        if let Some(arch) = architecture {
            if arch != self.architecture() {
                return false;
            }
        }

        match platform {
            None | Some(Platform::Unknown) => {}
            Some(Platform::Unix) => {
                if !self.platform().is_unix() {
                    return false;
                }
            }
            Some(wanted) => {
                if wanted != self.platform() {
                    return false;
                }
            }
        }

        match keyword {
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                self.description().to_lowercase().contains(&keyword)
                    || self.name().to_lowercase().contains(&keyword)
                    || self.id().to_lowercase().contains(&keyword)
            }
            None => true,
        }
    }

    /// Remove the image.
    pub async fn delete(self) -> Result<DeletionWaiter<MachineImage>> {
        drive_api::destroy_drive(&self.session, &self.inner.id).await?;
        let timeouts = *self.session.timeouts();
        Ok(DeletionWaiter::new(
            self,
            timeouts.terminate,
            timeouts.poll_interval,
        ))
    }
}

#[async_trait]
impl Refresh for MachineImage {
    /// Refresh the image.
    async fn refresh(&mut self) -> Result<()> {
        *self = MachineImage::load(&self.session, &self.inner.id).await?;
        Ok(())
    }
}

fn into_images(session: &Session, drives: Vec<Drive>, owner: &str) -> Result<Vec<MachineImage>> {
    let mut result = Vec::new();
    for drive in drives {
        if drive.owner() != owner {
            continue;
        }
        if let Some(image) = MachineImage::from_drive(session, drive)? {
            result.push(image);
        }
    }
    Ok(result)
}

/// List images owned by the current account.
pub(crate) async fn list_images(session: &Session) -> Result<Vec<MachineImage>> {
    let account = session.account().await?;
    let drives = drive_api::list_drives(session).await?;
    into_images(session, drives, &account)
}

/// List images owned by an account, the public library when none is given.
pub(crate) async fn list_images_owned_by(
    session: &Session,
    account: Option<&str>,
) -> Result<Vec<MachineImage>> {
    let me = session.account().await?;
    let owner = match account {
        Some(account) if account == me => return list_images(session).await,
        Some(account) if !account.is_empty() => account,
        _ => PUBLIC_OWNER,
    };

    let drives = drive_api::list_library_drives(session).await?;
    into_images(session, drives, owner)
}

/// Search own and public images.
pub(crate) async fn search_images(
    session: &Session,
    keyword: Option<&str>,
    platform: Option<Platform>,
    architecture: Option<Architecture>,
) -> Result<Vec<MachineImage>> {
    let mut result = list_images(session).await?;
    result.extend(list_images_owned_by(session, None).await?);
    result.retain(|image| image.matches(keyword, platform, architecture));
    Ok(result)
}

/// Whether the image belongs to the public library, `false` if there is no such image.
pub(crate) async fn is_image_shared_with_public<Id: AsRef<str>>(
    session: &Session,
    id: Id,
) -> Result<bool> {
    Ok(MachineImage::find(session, id)
        .await?
        .map(|image| image.is_public())
        .unwrap_or(false))
}

/// Make an image of a server by cloning its boot drive.
///
/// The server is stopped for cloning and always started again afterwards.
/// The resulting task yields the ID of the new image.
pub(crate) async fn image_server<Id: AsRef<str>>(
    session: &Session,
    server_id: Id,
    name: Option<String>,
) -> Result<BackgroundTask<String>> {
    let mut server = Server::load(session, server_id).await?;
    let name = name.unwrap_or_else(|| format!("Clone of {}", server.id()));
    let drive_id = server.image_id().clone().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Server {} has no boot drive", server.id()),
        )
    })?;

    let session = session.clone();
    Ok(BackgroundTask::spawn(
        format!("Image server {}", server.id()),
        async move {
            let timeout = session.timeouts().clone_stop;
            server.power_off_and_wait(timeout).await?;
            let result = drive_api::clone_drive(&session, &drive_id, &name).await;
            if let Err(e) = server.start().await {
                warn!(
                    "Failed to restart server {} after drive cloning: {}",
                    server.id(),
                    e
                );
            }
            let drive = result?;
            info!("Drive {} of server {} imaged as {}", drive_id, server.id(), drive.id);
            Ok(drive.id)
        },
    ))
}

/// Formats machine images can be imported from.
pub fn list_supported_formats() -> Vec<ImageFormat> {
    vec![ImageFormat::Ovf]
}

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

//! Foundation bits exposing the drives API.

use super::super::common::{KvBody, KvObject};
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::protocol::Drive;

fn expect_drive(result: Option<KvObject>, what: &str) -> Result<Drive> {
    result
        .as_ref()
        .and_then(Drive::from_kv)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("{} succeeded, but no drive information was provided", what),
            )
        })
}

/// Get a drive of the current account, `None` if it does not exist.
pub async fn get_own_drive<S: AsRef<str>>(session: &Session, id: S) -> Result<Option<Drive>> {
    trace!("Fetching drive {}", id.as_ref());
    let result = session
        .get_kv(&["drives", id.as_ref(), "info"])
        .await?
        .and_then(|obj| Drive::from_kv(&obj));
    trace!("Received {:?}", result);
    Ok(result)
}

/// Get a drive, looking into the public library if the account has no such drive.
pub async fn get_drive<S: AsRef<str>>(session: &Session, id: S) -> Result<Option<Drive>> {
    let id = id.as_ref();
    if let Some(drive) = get_own_drive(session, id).await? {
        return Ok(Some(drive));
    }

    debug!("No drive {} in the account, looking in the library", id);
    let result = session
        .get_kv(&["drives", "standard", "img", id, "info"])
        .await?
        .and_then(|obj| Drive::from_kv(&obj));
    trace!("Received {:?}", result);
    Ok(result)
}

/// List drives of the current account.
pub async fn list_drives(session: &Session) -> Result<Vec<Drive>> {
    trace!("Listing drives");
    let result: Vec<Drive> = session
        .get_kv_list(&["drives", "info"])
        .await?
        .iter()
        .filter_map(Drive::from_kv)
        .collect();
    trace!("Received drives: {:?}", result);
    Ok(result)
}

/// List drives in the public library.
pub async fn list_library_drives(session: &Session) -> Result<Vec<Drive>> {
    trace!("Listing library drives");
    let result: Vec<Drive> = session
        .get_kv_list(&["drives", "standard", "img", "info"])
        .await?
        .iter()
        .filter_map(Drive::from_kv)
        .collect();
    trace!("Received library drives: {:?}", result);
    Ok(result)
}

/// Clone a drive into an exclusively claimed drive of the same size.
pub async fn clone_drive<S1, S2>(session: &Session, id: S1, name: S2) -> Result<Drive>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    let id = id.as_ref();
    let source = get_drive(session, id).await?.ok_or_else(|| {
        Error::new(
            ErrorKind::ResourceNotFound,
            format!("No such drive: {}", id),
        )
    })?;

    let mut body = KvBody::new().with("name", name.as_ref());
    if let Some(size) = source.size {
        body.push("size", size.to_string());
    }
    body.push("claim:type", "exclusive");

    trace!("Cloning drive {} with {:?}", id, body);
    let result = session.post_kv(&["drives", id, "clone"], body).await?;
    let drive = expect_drive(result, "Clone")?;
    debug!("Drive {} cloned into {}", id, drive.id);
    Ok(drive)
}

/// Create a drive.
pub async fn create_drive(session: &Session, body: KvBody) -> Result<Drive> {
    trace!("Creating a drive with {:?}", body);
    let result = session.post_kv(&["drives", "create"], body).await?;
    let drive = expect_drive(result, "Drive creation")?;
    debug!("Created drive {:?}", drive);
    Ok(drive)
}

/// Destroy a drive.
pub async fn destroy_drive<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Destroying drive {}", id.as_ref());
    session
        .post_action(&["drives", id.as_ref(), "destroy"])
        .await?;
    debug!("Successfully destroyed drive {}", id.as_ref());
    Ok(())
}

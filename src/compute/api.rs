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

//! Foundation bits exposing the servers API.

use super::super::common::{KvBody, KvObject};
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::protocol::Server;

/// An action that can be triggered on a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    /// Power on.
    Start,
    /// Graceful (ACPI) shutdown.
    Shutdown,
    /// Forced power off.
    Stop,
    /// Destroy the server.
    Destroy,
}

impl ServerAction {
    fn as_str(self) -> &'static str {
        match self {
            ServerAction::Start => "start",
            ServerAction::Shutdown => "shutdown",
            ServerAction::Stop => "stop",
            ServerAction::Destroy => "destroy",
        }
    }
}

fn expect_server(session: &Session, result: Option<KvObject>) -> Result<Server> {
    let region = session.region_id()?;
    result
        .as_ref()
        .and_then(|obj| Server::from_kv(obj, &region))
        .ok_or_else(|| Error::new(ErrorKind::InvalidResponse, "No server returned by the API"))
}

/// Get a server, `None` if it does not exist.
pub async fn get_server<S: AsRef<str>>(session: &Session, id: S) -> Result<Option<Server>> {
    trace!("Fetching server {}", id.as_ref());
    let region = session.region_id()?;
    let result = session
        .get_kv(&["servers", id.as_ref(), "info"])
        .await?
        .and_then(|obj| Server::from_kv(&obj, &region));
    trace!("Received {:?}", result);
    Ok(result)
}

/// List servers.
pub async fn list_servers(session: &Session) -> Result<Vec<Server>> {
    trace!("Listing servers");
    let region = session.region_id()?;
    let result: Vec<Server> = session
        .get_kv_list(&["servers", "info"])
        .await?
        .iter()
        .filter_map(|obj| Server::from_kv(obj, &region))
        .collect();
    trace!("Received servers: {:?}", result);
    Ok(result)
}

/// Trigger an action on a server.
///
/// The servers API exposes actions as GET requests.
pub async fn server_action<S: AsRef<str>>(
    session: &Session,
    id: S,
    action: ServerAction,
) -> Result<()> {
    trace!("Requesting {} of server {}", action.as_str(), id.as_ref());
    session
        .get_action(&["servers", id.as_ref(), action.as_str()])
        .await?;
    debug!(
        "Successfully requested {} of server {}",
        action.as_str(),
        id.as_ref()
    );
    Ok(())
}

/// Change server configuration.
pub async fn set_server<S: AsRef<str>>(session: &Session, id: S, body: KvBody) -> Result<()> {
    trace!("Changing server {} with {:?}", id.as_ref(), body);
    let _ = session
        .post_kv(&["servers", id.as_ref(), "set"], body)
        .await?;
    debug!("Successfully changed server {}", id.as_ref());
    Ok(())
}

/// Clone a server.
pub async fn clone_server<S: AsRef<str>>(session: &Session, id: S, body: KvBody) -> Result<Server> {
    trace!("Cloning server {} with {:?}", id.as_ref(), body);
    let result = session
        .post_kv(&["servers", id.as_ref(), "clone"], body)
        .await?;
    let server = expect_server(session, result)?;
    debug!("Server {} cloned into {}", id.as_ref(), server.id);
    Ok(server)
}

/// Create a server.
pub async fn create_server(session: &Session, body: KvBody) -> Result<Server> {
    trace!("Creating a server with {:?}", body);
    let result = session.post_kv(&["servers", "create"], body).await?;
    let server = expect_server(session, result)?;
    debug!("Created server {:?}", server);
    Ok(server)
}

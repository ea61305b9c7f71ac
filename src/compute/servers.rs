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

//! Server management via the servers API.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use waiter::Waiter;

use super::super::common::{Architecture, Platform, Refresh};
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::api::{self, ServerAction};
use super::lifecycle::{self, Provisioned};
use super::products::Product;
use super::protocol::{self, ServerStatus};

/// Structure representing a single server.
#[derive(Clone, Debug)]
pub struct Server {
    session: Session,
    inner: protocol::Server,
}

/// Waiter for server status to change.
#[derive(Debug)]
pub struct ServerStatusWaiter {
    server: Server,
    targets: Vec<ServerStatus>,
    wait_timeout: Duration,
    delay: Duration,
}

/// Waiter for a server to disappear or become terminated.
#[derive(Debug)]
pub struct TerminationWaiter {
    server: Server,
    wait_timeout: Duration,
    delay: Duration,
}

/// A request to launch a server from a machine image.
#[derive(Clone, Debug)]
pub struct NewServer {
    session: Session,
    host_name: String,
    image_id: String,
    product_id: Option<String>,
    vlan_id: Option<String>,
}

impl Display for Server {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#?}", self.inner)
    }
}

impl Server {
    pub(crate) fn new(session: Session, inner: protocol::Server) -> Server {
        Server { session, inner }
    }

    /// Load a server, `None` if it does not exist.
    pub(crate) async fn find<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Option<Server>> {
        Ok(api::get_server(session, id)
            .await?
            .map(|inner| Server::new(session.clone(), inner)))
    }

    /// Load a server.
    pub(crate) async fn load<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Server> {
        let id = id.as_ref();
        Server::find(session, id).await?.ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("No such server: {}", id),
            )
        })
    }

    /// List all servers.
    pub(crate) async fn list(session: &Session) -> Result<Vec<Server>> {
        Ok(api::list_servers(session)
            .await?
            .into_iter()
            .map(|inner| Server::new(session.clone(), inner))
            .collect())
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn raw(&self) -> &protocol::Server {
        &self.inner
    }

    pub(crate) fn set_raw(&mut self, inner: protocol::Server) {
        self.inner = inner;
    }

    transparent_property! {
        #[doc = "Server unique ID."]
        id: ref String
    }

    transparent_property! {
        #[doc = "Server name."]
        name: ref String
    }

    transparent_property! {
        #[doc = "Server description (same as the name)."]
        description: ref String
    }

    transparent_property! {
        #[doc = "Server status."]
        status: ServerStatus
    }

    transparent_property! {
        #[doc = "Device the server boots from, e.g. `ide:0:0`."]
        boot_device: ref String
    }

    transparent_property! {
        #[doc = "ID of the drive the server boots from."]
        image_id: ref Option<String>
    }

    transparent_property! {
        #[doc = "ID of the VLAN the server is connected to."]
        vlan_id: ref Option<String>
    }

    transparent_property! {
        #[doc = "Drives attached to `block:N` slots."]
        drives: ref BTreeMap<u8, String>
    }

    transparent_property! {
        #[doc = "Static IP assigned to the first NIC."]
        assigned_ip_id: ref Option<String>
    }

    transparent_property! {
        #[doc = "Public IP addresses."]
        public_addresses: ref Vec<String>
    }

    transparent_property! {
        #[doc = "Private IP addresses."]
        private_addresses: ref Vec<String>
    }

    transparent_property! {
        #[doc = "ID of the owning account."]
        owner: ref Option<String>
    }

    transparent_property! {
        #[doc = "Root user name, if a VNC password is set."]
        root_user: ref Option<String>
    }

    transparent_property! {
        #[doc = "VNC (root) password."]
        root_password: ref Option<String>
    }

    transparent_property! {
        #[doc = "CPU speed in MHz."]
        cpu_mhz: u32
    }

    transparent_property! {
        #[doc = "Number of CPUs."]
        cpu_count: u32
    }

    transparent_property! {
        #[doc = "Memory in MiB."]
        memory_mb: u32
    }

    transparent_property! {
        #[doc = "Product ID for the server hardware."]
        product_id: ref String
    }

    transparent_property! {
        #[doc = "CPU architecture."]
        architecture: Architecture
    }

    transparent_property! {
        #[doc = "Operating system."]
        platform: Platform
    }

    transparent_property! {
        #[doc = "Whether the server survives a stop."]
        persistent: bool
    }

    transparent_property! {
        #[doc = "ID of the region."]
        region_id: ref String
    }

    transparent_property! {
        #[doc = "ID of the data center."]
        data_center_id: ref String
    }

    /// Hardware product of the server.
    pub fn product(&self) -> Option<Product> {
        Product::parse(&self.inner.product_id)
    }

    /// Device slot holding the drive, if it is attached.
    pub fn device_of<S: AsRef<str>>(&self, drive_id: S) -> Option<u8> {
        self.inner.device_of(drive_id.as_ref())
    }

    /// Whether the server can be cloned right now.
    pub fn is_clonable(&self) -> bool {
        self.inner.status == ServerStatus::Stopped
    }

    /// Whether the server is running.
    pub fn is_running(&self) -> bool {
        self.inner.status == ServerStatus::Running
    }

    pub(crate) fn status_waiter(
        &self,
        targets: &[ServerStatus],
        wait_timeout: Duration,
    ) -> ServerStatusWaiter {
        ServerStatusWaiter {
            server: self.clone(),
            targets: targets.to_vec(),
            wait_timeout,
            delay: self.session.timeouts().poll_interval,
        }
    }

    /// Power on the server.
    pub async fn start(&self) -> Result<ServerStatusWaiter> {
        api::server_action(&self.session, &self.inner.id, ServerAction::Start).await?;
        Ok(self.status_waiter(
            &[ServerStatus::Running],
            self.session.timeouts().server_ready,
        ))
    }

    /// Shut the server down, gracefully unless `force` is set.
    pub async fn stop(&self, force: bool) -> Result<ServerStatusWaiter> {
        let (action, timeout) = if force {
            (ServerAction::Stop, self.session.timeouts().change_stop)
        } else {
            (ServerAction::Shutdown, self.session.timeouts().graceful_shutdown)
        };
        api::server_action(&self.session, &self.inner.id, action).await?;
        Ok(self.status_waiter(&[ServerStatus::Stopped], timeout))
    }

    /// Destroy the server.
    ///
    /// The returned waiter completes when the server disappears or becomes
    /// terminated.
    pub async fn terminate(self) -> Result<TerminationWaiter> {
        api::server_action(&self.session, &self.inner.id, ServerAction::Destroy).await?;
        let timeouts = *self.session.timeouts();
        Ok(TerminationWaiter {
            server: self,
            wait_timeout: timeouts.terminate,
            delay: timeouts.poll_interval,
        })
    }
}

#[async_trait]
impl Refresh for Server {
    /// Refresh the server.
    async fn refresh(&mut self) -> Result<()> {
        self.inner = Server::load(&self.session, &self.inner.id).await?.inner;
        Ok(())
    }
}

impl ServerStatusWaiter {
    /// Last known state of the server.
    pub fn current_state(&self) -> &Server {
        &self.server
    }
}

#[async_trait]
impl Waiter<Server, Error> for ServerStatusWaiter {
    fn default_wait_timeout(&self) -> Option<Duration> {
        Some(self.wait_timeout)
    }

    fn default_delay(&self) -> Duration {
        self.delay
    }

    fn timeout_error(&self) -> Error {
        Error::new(
            ErrorKind::OperationTimedOut,
            format!(
                "Timeout waiting for server {} to reach state {:?}",
                self.server.id(),
                self.targets
            ),
        )
    }

    async fn poll(&mut self) -> Result<Option<Server>> {
        self.server.refresh().await?;
        let status = self.server.status();
        if self.targets.contains(&status) {
            debug!("Server {} reached state {}", self.server.id(), status);
            Ok(Some(self.server.clone()))
        } else if status == ServerStatus::Terminated {
            debug!(
                "Failed to move server {} to {:?} - it is terminated",
                self.server.id(),
                self.targets
            );
            Err(Error::new(
                ErrorKind::OperationFailed,
                format!("Server {} was terminated", self.server.id()),
            ))
        } else {
            trace!(
                "Still waiting for server {} to get to state {:?}, current is {}",
                self.server.id(),
                self.targets,
                status
            );
            Ok(None)
        }
    }
}

impl TerminationWaiter {
    /// Last known state of the server.
    pub fn current_state(&self) -> &Server {
        &self.server
    }
}

#[async_trait]
impl Waiter<(), Error> for TerminationWaiter {
    fn default_wait_timeout(&self) -> Option<Duration> {
        Some(self.wait_timeout)
    }

    fn default_delay(&self) -> Duration {
        self.delay
    }

    fn timeout_error(&self) -> Error {
        Error::new(
            ErrorKind::OperationTimedOut,
            format!("Timeout waiting for server {} to terminate", self.server.id()),
        )
    }

    async fn poll(&mut self) -> Result<Option<()>> {
        match self.server.refresh().await {
            Ok(()) if self.server.status() == ServerStatus::Terminated => {
                debug!("Server {} is terminated", self.server.id());
                Ok(Some(()))
            }
            Ok(()) => {
                trace!("Still waiting for server {} to terminate", self.server.id());
                Ok(None)
            }
            Err(ref e) if e.kind() == ErrorKind::ResourceNotFound => {
                debug!("Server {} was deleted", self.server.id());
                Ok(Some(()))
            }
            Err(e) => Err(e),
        }
    }
}

impl NewServer {
    /// Start launching a server.
    pub(crate) fn new(session: Session, host_name: String, image_id: String) -> NewServer {
        NewServer {
            session,
            host_name,
            image_id,
            product_id: None,
            vlan_id: None,
        }
    }

    /// Request launching of the server.
    ///
    /// Returns once the server exists and is stopped or running. If the
    /// server is not running yet, it is started in the background.
    pub async fn launch(self) -> Result<Provisioned> {
        lifecycle::launch(
            &self.session,
            &self.host_name,
            &self.image_id,
            self.product_id.as_deref(),
            self.vlan_id.as_deref(),
        )
        .await
    }

    creation_field! {
        #[doc = "Set the host name."]
        set_host_name, with_host_name -> host_name: String
    }

    creation_field! {
        #[doc = "Set the hardware product, e.g. `1024:2000:2`."]
        set_product_id, with_product_id -> product_id: optional String
    }

    creation_field! {
        #[doc = "Set the VLAN to connect the second NIC to."]
        set_vlan_id, with_vlan_id -> vlan_id: optional String
    }
}

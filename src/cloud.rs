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

//! Cloud API.

use futures::stream::Stream;
use static_assertions::assert_impl_all;

use super::auth::{self, BasicAuth};
use super::block_storage::{NewVolume, Volume, VolumeProduct};
use super::common::{Architecture, DeletionWaiter, Platform};
use super::compute::{
    BackgroundTask, NewServer, Product, Provisioned, Server, ServerStatus, ServerStatusWaiter,
    TerminationWaiter,
};
use super::datacenter::{self, DataCenter, Region};
use super::image::{self, ImageFormat, MachineImage};
use super::network::{Firewall, FirewallRule, IpAddress, Vlan, VlanResources, VlanState};
use super::session::{Session, Timeouts};
use super::{block_storage, compute, Error, ErrorKind, Result};

/// CloudSigma cloud API.
///
/// Provides high-level API for working with CloudSigma clouds.
#[derive(Debug, Clone)]
pub struct Cloud {
    session: Session,
}

assert_impl_all!(Cloud: Send, Sync);

impl Cloud {
    /// Create a new cloud object with given credentials.
    ///
    /// See [`auth` module](auth/index.html) for details on how to authenticate
    /// against CloudSigma clouds.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// fn cloud() -> cloudsigma::Result<cloudsigma::Cloud> {
    ///     let auth = cloudsigma::auth::BasicAuth::new(
    ///             "https://api.zrh.cloudsigma.com",
    ///             "user1@example.com", "pa$$word")?;
    ///     Ok(cloudsigma::Cloud::new(auth))
    /// }
    ///
    /// # fn main() { cloud().unwrap(); }
    /// ```
    ///
    /// # See Also
    ///
    /// * [from_config](#method.from_config) to create a Cloud from cloudsigma.yaml
    /// * [from_env](#method.from_env) to create a Cloud from environment variables
    pub fn new(auth: BasicAuth) -> Cloud {
        Cloud {
            session: Session::new(auth),
        }
    }

    /// Create a new cloud object from an existing session.
    pub fn from_session(session: Session) -> Cloud {
        Cloud { session }
    }

    /// Create a new cloud object from a configuration file
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # fn cloud_from_config() -> cloudsigma::Result<()> {
    /// let cloud = cloudsigma::Cloud::from_config("zurich")?;
    /// # Ok(()) }
    /// # fn main() { cloud_from_config().unwrap(); }
    /// ```
    pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Cloud> {
        Ok(Cloud {
            session: auth::from_config(cloud_name)?,
        })
    }

    /// Create a new cloud object from environment variables.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # fn cloud_from_env() -> cloudsigma::Result<()> {
    /// let cloud = cloudsigma::Cloud::from_env()?;
    /// # Ok(()) }
    /// # fn main() { cloud_from_env().unwrap(); }
    /// ```
    pub fn from_env() -> Result<Cloud> {
        Ok(Cloud {
            session: auth::from_env()?,
        })
    }

    /// Convert this cloud into one using the given timeouts.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    ///
    /// fn cloud_from_env() -> cloudsigma::Result<cloudsigma::Cloud> {
    ///     let timeouts = cloudsigma::Timeouts {
    ///         poll_interval: Duration::from_secs(5),
    ///         ..Default::default()
    ///     };
    ///     cloudsigma::Cloud::from_env().map(|cloud| cloud.with_timeouts(timeouts))
    /// }
    ///
    /// # fn main() { cloud_from_env().unwrap(); }
    /// ```
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Cloud {
        self.session.set_timeouts(timeouts);
        self
    }

    /// Session used by this cloud.
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Check the credentials, returning the account UUID if they work.
    pub async fn test_context(&self) -> Option<String> {
        match self.session.fetch_profile_uuid().await {
            Ok(uuid) => {
                debug!("Credentials are valid for account {}", uuid);
                Some(uuid)
            }
            Err(e) => {
                warn!("Cannot access the profile with the credentials: {}", e);
                None
            }
        }
    }

    // Compute

    /// Find a server by its ID.
    ///
    /// Unlike [get_server](#method.get_server) returns `None` for a missing
    /// server.
    pub async fn find_server<Id: AsRef<str>>(&self, id: Id) -> Result<Option<Server>> {
        Server::find(&self.session, id).await
    }

    /// Get a server by its ID.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// async fn server_status() -> cloudsigma::Result<()> {
    ///     let cloud = cloudsigma::Cloud::from_env()?;
    ///     let server = cloud.get_server("8d9e3a42-2c2d-4ef6-8bfa-3e48a5ea0b2f").await?;
    ///     println!("Server {} is {}", server.name(), server.status());
    ///     Ok(())
    /// }
    /// ```
    pub async fn get_server<Id: AsRef<str>>(&self, id: Id) -> Result<Server> {
        Server::load(&self.session, id).await
    }

    /// List all servers of the account.
    pub async fn list_servers(&self) -> Result<Vec<Server>> {
        Server::list(&self.session).await
    }

    /// List IDs and states of all servers.
    pub async fn list_server_status(&self) -> Result<Vec<(String, ServerStatus)>> {
        Ok(self
            .list_servers()
            .await?
            .into_iter()
            .map(|server| (server.id().clone(), server.status()))
            .collect())
    }

    /// Prepare a new server to launch from an image.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// async fn launch() -> cloudsigma::Result<()> {
    ///     let cloud = cloudsigma::Cloud::from_env()?;
    ///     let provisioned = cloud
    ///         .new_server("web-1", "1b7cd2b1-2aa8-4b3c-9a8f-0e9e4f77f4a4")
    ///         .with_product_id("2048:2000:2")
    ///         .launch()
    ///         .await?;
    ///     println!("Created {}", provisioned.server.id());
    ///     Ok(())
    /// }
    /// ```
    pub fn new_server<S1, S2>(&self, host_name: S1, image_id: S2) -> NewServer
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        NewServer::new(self.session.clone(), host_name.into(), image_id.into())
    }

    /// Clone a server under a new name.
    pub async fn clone_server<Id, S>(&self, id: Id, name: S, power_on: bool) -> Result<Provisioned>
    where
        Id: AsRef<str>,
        S: AsRef<str>,
    {
        self.get_server(id).await?.clone_as(name, power_on).await
    }

    /// Power on a server.
    pub async fn start_server<Id: AsRef<str>>(&self, id: Id) -> Result<ServerStatusWaiter> {
        self.get_server(id).await?.start().await
    }

    /// Shut a server down, gracefully unless `force` is set.
    pub async fn stop_server<Id: AsRef<str>>(
        &self,
        id: Id,
        force: bool,
    ) -> Result<ServerStatusWaiter> {
        self.get_server(id).await?.stop(force).await
    }

    /// Shut a server down gracefully, forcing it if needed, and wait for it.
    pub async fn shut_down_server<Id: AsRef<str>>(&self, id: Id) -> Result<Server> {
        let mut server = self.get_server(id).await?;
        server.shut_down().await?;
        Ok(server)
    }

    /// Reboot a server.
    pub async fn reboot_server<Id: AsRef<str>>(&self, id: Id) -> Result<()> {
        self.get_server(id).await?.reboot().await
    }

    /// Destroy a server.
    pub async fn terminate_server<Id: AsRef<str>>(&self, id: Id) -> Result<TerminationWaiter> {
        self.get_server(id).await?.terminate().await
    }

    /// Get a hardware product by its ID.
    pub fn get_product<Id: AsRef<str>>(&self, id: Id) -> Result<Product> {
        let id = id.as_ref();
        Product::parse(id).ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("No such product: {}", id),
            )
        })
    }

    /// List hardware products for an architecture.
    pub fn list_products(&self, architecture: Architecture) -> Vec<Product> {
        compute::list_products(architecture)
    }

    /// List architectures servers can use.
    pub fn list_supported_architectures(&self) -> Vec<Architecture> {
        compute::list_supported_architectures()
    }

    // Images

    /// Get a machine image by its ID.
    pub async fn get_image<Id: AsRef<str>>(&self, id: Id) -> Result<MachineImage> {
        MachineImage::load(&self.session, id).await
    }

    /// List images owned by the account.
    pub async fn list_images(&self) -> Result<Vec<MachineImage>> {
        image::list_images(&self.session).await
    }

    /// List images owned by another account, the public library if `None`.
    pub async fn list_images_owned_by(&self, account: Option<&str>) -> Result<Vec<MachineImage>> {
        image::list_images_owned_by(&self.session, account).await
    }

    /// Search own and public images.
    ///
    /// The keyword is matched case-insensitively against names and
    /// descriptions.
    pub async fn search_images(
        &self,
        keyword: Option<&str>,
        platform: Option<Platform>,
        architecture: Option<Architecture>,
    ) -> Result<Vec<MachineImage>> {
        image::search_images(&self.session, keyword, platform, architecture).await
    }

    /// Whether an image belongs to the public library.
    pub async fn is_image_shared_with_public<Id: AsRef<str>>(&self, id: Id) -> Result<bool> {
        image::is_image_shared_with_public(&self.session, id).await
    }

    /// Delete an image.
    pub async fn remove_image<Id: AsRef<str>>(
        &self,
        id: Id,
    ) -> Result<DeletionWaiter<MachineImage>> {
        self.get_image(id).await?.delete().await
    }

    /// Make an image of a server in the background.
    ///
    /// The task yields the ID of the new image.
    pub async fn image_server<Id: AsRef<str>>(
        &self,
        server_id: Id,
        name: Option<String>,
    ) -> Result<BackgroundTask<String>> {
        image::image_server(&self.session, server_id, name).await
    }

    /// Formats images can be imported from.
    pub fn list_supported_formats(&self) -> Vec<ImageFormat> {
        image::list_supported_formats()
    }

    // Block storage

    /// Get a volume by its ID.
    pub async fn get_volume<Id: AsRef<str>>(&self, id: Id) -> Result<Volume> {
        Volume::load(&self.session, id).await
    }

    /// List volumes of the account.
    pub async fn list_volumes(&self) -> Result<Vec<Volume>> {
        Volume::list(&self.session).await
    }

    /// Prepare a new volume.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// async fn create_volume() -> cloudsigma::Result<()> {
    ///     let cloud = cloudsigma::Cloud::from_env()?;
    ///     let volume = cloud
    ///         .new_volume("data", 10)
    ///         .with_product_id("ssd")
    ///         .create()
    ///         .await?;
    ///     println!("Created {}", volume.id());
    ///     Ok(())
    /// }
    /// ```
    pub fn new_volume<S: Into<String>>(&self, name: S, size_gb: u64) -> NewVolume {
        NewVolume::new(self.session.clone(), name.into(), size_gb)
    }

    /// Delete a volume.
    pub async fn remove_volume<Id: AsRef<str>>(&self, id: Id) -> Result<DeletionWaiter<Volume>> {
        self.get_volume(id).await?.delete().await
    }

    /// Attach a volume to a `block:N` slot of a server.
    ///
    /// Returns the task restarting the server if it had to be stopped.
    pub async fn attach_volume<Id1, Id2>(
        &self,
        volume_id: Id1,
        server_id: Id2,
        device: u8,
    ) -> Result<Option<BackgroundTask<()>>>
    where
        Id1: AsRef<str>,
        Id2: AsRef<str>,
    {
        self.get_volume(volume_id)
            .await?
            .attach(server_id, device)
            .await
    }

    /// Detach a volume from its server.
    pub async fn detach_volume<Id: AsRef<str>>(
        &self,
        volume_id: Id,
    ) -> Result<Option<BackgroundTask<()>>> {
        self.get_volume(volume_id).await?.detach().await
    }

    /// Volume products.
    pub fn list_volume_products(&self) -> Vec<VolumeProduct> {
        block_storage::list_volume_products()
    }

    /// Device IDs volumes can be attached to.
    pub fn list_possible_device_ids(&self) -> Vec<String> {
        block_storage::list_possible_device_ids()
    }

    // VLANs

    /// Create a VLAN.
    pub async fn create_vlan<S: AsRef<str>>(&self, name: S) -> Result<Vlan> {
        Vlan::create(&self.session, name).await
    }

    /// Get a VLAN by its ID.
    pub async fn get_vlan<Id: AsRef<str>>(&self, id: Id) -> Result<Vlan> {
        Vlan::load(&self.session, id).await
    }

    /// List VLANs of the account.
    pub async fn list_vlans(&self) -> Result<Vec<Vlan>> {
        Vlan::list(&self.session).await
    }

    /// List IDs and states of all VLANs.
    pub async fn list_vlan_status(&self) -> Result<Vec<(String, VlanState)>> {
        Ok(self
            .list_vlans()
            .await?
            .into_iter()
            .map(|vlan| (vlan.id().clone(), vlan.state()))
            .collect())
    }

    /// Servers and static IPs connected to a VLAN.
    pub async fn list_vlan_resources<Id: AsRef<str>>(&self, id: Id) -> Result<VlanResources> {
        self.get_vlan(id).await?.resources().await
    }

    /// Delete a VLAN.
    pub async fn remove_vlan<Id: AsRef<str>>(&self, id: Id) -> Result<DeletionWaiter<Vlan>> {
        self.get_vlan(id).await?.delete().await
    }

    // Static IPs

    /// Request a new static IP.
    pub async fn request_ip(&self) -> Result<IpAddress> {
        IpAddress::request(&self.session).await
    }

    /// Get a static IP.
    pub async fn get_ip<Id: AsRef<str>>(&self, id: Id) -> Result<IpAddress> {
        IpAddress::load(&self.session, id).await
    }

    /// List static IPs, optionally only those not held by a server.
    pub async fn list_ips(&self, unassigned_only: bool) -> Result<Vec<IpAddress>> {
        IpAddress::list(&self.session, unassigned_only).await
    }

    /// Assign a static IP to a server.
    pub async fn assign_ip<Id1, Id2>(
        &self,
        ip: Id1,
        server_id: Id2,
    ) -> Result<Option<BackgroundTask<()>>>
    where
        Id1: AsRef<str>,
        Id2: AsRef<str>,
    {
        self.get_ip(ip).await?.assign(server_id).await
    }

    /// Release a static IP from the server holding it.
    pub async fn release_ip_from_server<Id: AsRef<str>>(
        &self,
        ip: Id,
    ) -> Result<Option<BackgroundTask<()>>> {
        self.get_ip(ip).await?.release_from_server().await
    }

    /// Release a static IP back to the pool.
    pub async fn release_ip_from_pool<Id: AsRef<str>>(
        &self,
        ip: Id,
    ) -> Result<DeletionWaiter<IpAddress>> {
        self.get_ip(ip).await?.release_from_pool().await
    }

    // Firewalls

    /// Create a firewall policy.
    pub async fn create_firewall<S: Into<String>>(&self, name: S) -> Result<Firewall> {
        Firewall::create(&self.session, name).await
    }

    /// Get a firewall policy by its ID.
    pub async fn get_firewall<Id: AsRef<str>>(&self, id: Id) -> Result<Firewall> {
        Firewall::load(&self.session, id).await
    }

    /// Stream firewall policies page by page.
    pub fn stream_firewalls(&self) -> impl Stream<Item = Result<Firewall>> {
        Firewall::stream(&self.session)
    }

    /// List all firewall policies.
    pub async fn list_firewalls(&self) -> Result<Vec<Firewall>> {
        Firewall::list(&self.session).await
    }

    /// List IDs and availability of all firewall policies.
    pub async fn list_firewall_status(&self) -> Result<Vec<(String, bool)>> {
        Firewall::list_status(&self.session).await
    }

    /// Rules of a firewall policy.
    pub async fn get_rules<Id: AsRef<str>>(&self, firewall_id: Id) -> Result<Vec<FirewallRule>> {
        self.get_firewall(firewall_id).await?.rules()
    }

    /// Add a rule to its firewall policy, returning the rule ID.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use cloudsigma::network::{Direction, FirewallRule, Permission, Protocol};
    ///
    /// async fn allow_http() -> cloudsigma::Result<()> {
    ///     let cloud = cloudsigma::Cloud::from_env()?;
    ///     let rule = FirewallRule::new(
    ///         "fa6b2b4c-1c41-4a5e-a9d4-6b1e0a3b6c55",
    ///         Direction::Ingress,
    ///         Permission::Allow,
    ///         Protocol::Tcp,
    ///     )
    ///     .with_ports(80, 80);
    ///     let id = cloud.authorize(rule).await?;
    ///     println!("Added rule {}", id);
    ///     Ok(())
    /// }
    /// ```
    pub async fn authorize(&self, rule: FirewallRule) -> Result<String> {
        self.get_firewall(&rule.firewall_id)
            .await?
            .authorize(rule)
            .await
    }

    /// Remove a rule from a firewall policy.
    pub async fn revoke<Id1, Id2>(&self, firewall_id: Id1, rule_id: Id2) -> Result<()>
    where
        Id1: AsRef<str>,
        Id2: AsRef<str>,
    {
        self.get_firewall(firewall_id).await?.revoke(rule_id).await
    }

    /// Remove a rule by its ID, searching all firewall policies.
    pub async fn revoke_by_id<Id: AsRef<str>>(&self, rule_id: Id) -> Result<()> {
        Firewall::revoke_by_id(&self.session, rule_id).await
    }

    // Regions

    /// List regions available through the session.
    pub fn list_regions(&self) -> Result<Vec<Region>> {
        datacenter::list_regions(&self.session)
    }

    /// Get a region by its ID.
    pub fn get_region<Id: AsRef<str>>(&self, id: Id) -> Result<Option<Region>> {
        datacenter::get_region(&self.session, id.as_ref())
    }

    /// List data centers of a region.
    pub fn list_data_centers<Id: AsRef<str>>(&self, region_id: Id) -> Result<Vec<DataCenter>> {
        datacenter::list_data_centers(&self.session, region_id.as_ref())
    }

    /// Get a data center by its ID.
    pub fn get_data_center<Id: AsRef<str>>(&self, id: Id) -> Result<Option<DataCenter>> {
        datacenter::get_data_center(&self.session, id.as_ref())
    }
}

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

//! VLAN management.

use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;

use super::super::common::{DeletionWaiter, KvBody, Refresh};
use super::super::compute::Server;
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::ips::IpAddress;
use super::protocol::Resource;
use super::{api, IpVersion};

const RESOURCE_TYPE: &str = "vlan";

protocol_enum! {
    #[doc = "Possible VLAN states."]
    enum VlanState {
        #[doc = "Being set up."]
        Pending = "pending",
        #[doc = "Ready for use."]
        Available = "available"
    }
}

/// Structure representing a single VLAN.
#[derive(Clone, Debug)]
pub struct Vlan {
    session: Session,
    inner: Resource,
    owner: String,
    region_id: String,
}

/// Resources connected to a VLAN.
#[derive(Clone, Debug)]
pub struct VlanResources {
    /// Servers with a NIC in the VLAN.
    pub servers: Vec<Server>,
    /// Static IPs held by these servers.
    pub ips: Vec<IpAddress>,
}

impl Display for Vlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#?}", self.inner)
    }
}

impl Vlan {
    fn new(session: &Session, inner: Resource, owner: String) -> Result<Vlan> {
        Ok(Vlan {
            region_id: session.region_id()?,
            session: session.clone(),
            inner,
            owner,
        })
    }

    /// Create a VLAN.
    pub(crate) async fn create<S: AsRef<str>>(session: &Session, name: S) -> Result<Vlan> {
        let account = session.account().await?;
        let inner = api::create_resource(
            session,
            RESOURCE_TYPE,
            KvBody::new().with("name", name.as_ref()),
        )
        .await?;
        Vlan::new(session, inner, account)
    }

    /// Load a VLAN, `None` if it does not exist or is not a VLAN of this account.
    pub(crate) async fn find<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Option<Vlan>> {
        let account = session.account().await?;
        match api::get_resource(session, RESOURCE_TYPE, id).await? {
            Some(inner) if inner.is_usable(RESOURCE_TYPE, &account) => {
                Ok(Some(Vlan::new(session, inner, account)?))
            }
            _ => Ok(None),
        }
    }

    /// Load a VLAN.
    pub(crate) async fn load<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Vlan> {
        let id = id.as_ref();
        Vlan::find(session, id).await?.ok_or_else(|| {
            Error::new(ErrorKind::ResourceNotFound, format!("No such VLAN: {}", id))
        })
    }

    /// List VLANs of the account.
    pub(crate) async fn list(session: &Session) -> Result<Vec<Vlan>> {
        let account = session.account().await?;
        api::list_resources(session, RESOURCE_TYPE)
            .await?
            .into_iter()
            .filter(|inner| inner.is_usable(RESOURCE_TYPE, &account))
            .map(|inner| Vlan::new(session, inner, account.clone()))
            .collect()
    }

    transparent_property! {
        #[doc = "VLAN unique ID."]
        id: ref String
    }

    /// VLAN name, defaults to the ID.
    pub fn name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or(&self.inner.id)
    }

    /// VLAN description, same as the name.
    pub fn description(&self) -> &str {
        self.name()
    }

    /// Address range, VLANs are not bound to one.
    pub fn cidr(&self) -> &'static str {
        "0.0.0.0/0"
    }

    /// VLAN state, always available.
    pub fn state(&self) -> VlanState {
        VlanState::Available
    }

    /// Supported IP traffic.
    pub fn supported_traffic(&self) -> Vec<IpVersion> {
        vec![IpVersion::V4]
    }

    /// DNS servers, not managed by the cloud.
    pub fn dns_servers(&self) -> Vec<String> {
        Vec::new()
    }

    /// NTP servers, not managed by the cloud.
    pub fn ntp_servers(&self) -> Vec<String> {
        Vec::new()
    }

    /// ID of the owning account.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// ID of the region.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// ID of the data center.
    pub fn data_center_id(&self) -> String {
        format!("{}-a", self.region_id)
    }

    /// Resources connected to the VLAN.
    pub async fn resources(&self) -> Result<VlanResources> {
        let servers: Vec<Server> = Server::list(&self.session)
            .await?
            .into_iter()
            .filter(|server| server.vlan_id().as_deref() == Some(self.inner.id.as_str()))
            .collect();
        let ips = IpAddress::list(&self.session, false)
            .await?
            .into_iter()
            .filter(|ip| {
                servers
                    .iter()
                    .any(|server| ip.server_id() == Some(server.id().as_str()))
            })
            .collect();
        Ok(VlanResources { servers, ips })
    }

    /// Delete the VLAN.
    pub async fn delete(self) -> Result<DeletionWaiter<Vlan>> {
        api::destroy_resource(&self.session, RESOURCE_TYPE, &self.inner.id).await?;
        let timeouts = *self.session.timeouts();
        Ok(DeletionWaiter::new(
            self,
            timeouts.terminate,
            timeouts.poll_interval,
        ))
    }
}

#[async_trait]
impl Refresh for Vlan {
    /// Refresh the VLAN.
    async fn refresh(&mut self) -> Result<()> {
        *self = Vlan::load(&self.session, &self.inner.id).await?;
        Ok(())
    }
}

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

//! Regions and data centers.
//!
//! Every CloudSigma endpoint serves exactly one region, and every region has
//! exactly one data center named `<region>-a`. Regions are derived from the
//! endpoint host name unless set on the session, no API calls are made.

use reqwest::Url;

use super::session::Session;
use super::{Error, ErrorKind, Result};

/// A geographical region served by one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Region ID.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Jurisdiction (country or area code).
    pub jurisdiction: String,
    /// Whether the region is active.
    pub active: bool,
    /// Whether the region is available.
    pub available: bool,
}

/// A data center inside a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCenter {
    /// Data center ID.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// ID of the region.
    pub region_id: String,
    /// Whether the data center is active.
    pub active: bool,
    /// Whether the data center is available.
    pub available: bool,
}

/// Static description of the data center services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataCenterCapabilities {
    /// Provider term for a data center.
    pub data_center_term: &'static str,
    /// Provider term for a region.
    pub region_term: &'static str,
    /// Whether affinity groups are supported.
    pub supports_affinity_groups: bool,
    /// Whether resource pools are supported.
    pub supports_resource_pools: bool,
    /// Whether storage pools are supported.
    pub supports_storage_pools: bool,
    /// Whether folders are supported.
    pub supports_folders: bool,
}

/// Capabilities of the data center services.
pub const CAPABILITIES: DataCenterCapabilities = DataCenterCapabilities {
    data_center_term: "data center",
    region_term: "region",
    supports_affinity_groups: false,
    supports_resource_pools: false,
    supports_storage_pools: false,
    supports_folders: false,
};

impl Region {
    fn new<S1, S2, S3>(id: S1, name: S2, jurisdiction: S3) -> Region
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Region {
            id: id.into(),
            name: name.into(),
            jurisdiction: jurisdiction.into(),
            active: true,
            available: true,
        }
    }

    /// Describe a region by its ID.
    pub fn from_id<S: Into<String>>(id: S) -> Region {
        let id = id.into();
        match id.as_str() {
            "eu-ch1" => Region::new(id, "Switzerland 1", "CH"),
            "us-nv1" => Region::new(id, "Nevada 1", "US"),
            _ => Region::new(id.clone(), id, "EU"),
        }
    }

    /// The only data center of this region.
    pub fn data_center(&self) -> DataCenter {
        let name = match self.id.as_str() {
            "eu-ch1" => "Zurich",
            "us-nv1" => "Las Vegas",
            _ => self.name.as_str(),
        };
        DataCenter {
            id: data_center_id(self.id.clone()),
            name: name.to_string(),
            region_id: self.id.clone(),
            active: self.active,
            available: self.available,
        }
    }
}

/// ID of the data center of a region.
pub fn data_center_id(region_id: String) -> String {
    format!("{}-a", region_id)
}

/// Determine the region served by an endpoint.
///
/// The generic `api.cloudsigma.com` endpoint is served from Zurich.
pub fn region_for_endpoint(endpoint: &Url) -> Result<Region> {
    let host = endpoint.host_str().unwrap_or("").to_lowercase();

    if host.is_empty()
        || host.contains("api.cloudsigma.com")
        || host.ends_with("zrh.cloudsigma.com")
    {
        return Ok(Region::from_id("eu-ch1"));
    }
    if host.ends_with("lvs.cloudsigma.com") {
        return Ok(Region::from_id("us-nv1"));
    }

    if let Some(code) = host
        .strip_prefix("api.")
        .and_then(|rest| rest.strip_suffix(".cloudsigma.com"))
        .filter(|code| !code.is_empty() && !code.contains('.'))
    {
        return Ok(Region::from_id(code));
    }

    Err(Error::new(
        ErrorKind::InvalidConfig,
        format!("Cannot determine region for endpoint {}", endpoint),
    ))
}

/// The region a session works with.
///
/// An explicitly configured region wins over the one derived from the
/// endpoint.
pub fn current_region(session: &Session) -> Result<Region> {
    match session.configured_region() {
        Some(id) => Ok(Region::from_id(id)),
        None => region_for_endpoint(session.endpoint()),
    }
}

/// List regions available through a session.
pub fn list_regions(session: &Session) -> Result<Vec<Region>> {
    current_region(session).map(|r| vec![r])
}

/// Get a region by its ID.
pub fn get_region(session: &Session, id: &str) -> Result<Option<Region>> {
    Ok(list_regions(session)?.into_iter().find(|r| r.id == id))
}

/// List data centers of a region, empty for an unknown region.
pub fn list_data_centers(session: &Session, region_id: &str) -> Result<Vec<DataCenter>> {
    Ok(get_region(session, region_id)?
        .map(|region| vec![region.data_center()])
        .unwrap_or_default())
}

/// Get a data center by its ID.
pub fn get_data_center(session: &Session, id: &str) -> Result<Option<DataCenter>> {
    Ok(list_regions(session)?
        .iter()
        .map(Region::data_center)
        .find(|dc| dc.id == id))
}

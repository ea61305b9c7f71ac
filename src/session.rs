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

//! Session structure definition.
//!
//! The Session object serves as a wrapper around an HTTP(s) client, handling
//! authentication, URL building and conversion of responses. Both API
//! flavours are supported: the key/value text format used for servers,
//! drives and resources, and JSON used for firewall policies and the profile.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;

use super::auth::BasicAuth;
use super::common::kv::{self, KvBody, KvObject};
use super::datacenter;
use super::{Error, ErrorKind, Result};

/// Timeouts and poll intervals used by long-running workflows.
///
/// The defaults are suitable for real clouds, tests usually shrink them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Delay between state checks of a server.
    pub poll_interval: Duration,
    /// Delay between state checks while stopping a server for cloning.
    pub clone_poll_interval: Duration,
    /// Delay between state checks of a drive.
    pub drive_poll_interval: Duration,
    /// How long to wait for a graceful shutdown before forcing it.
    pub graceful_shutdown: Duration,
    /// How long to wait for a server to stop before changing it.
    pub change_stop: Duration,
    /// How long to wait for a server to stop before cloning it.
    pub clone_stop: Duration,
    /// How long to wait for a server to stop when rebooting it.
    pub reboot_stop: Duration,
    /// How long to wait for a new server to appear as stopped or running.
    pub server_ready: Duration,
    /// How long to wait for a cloned drive to become active.
    pub drive_ready: Duration,
    /// How long to wait for a server to disappear after destroying it.
    pub terminate: Duration,
    /// Maximum number of attempts to start a new server in the background.
    pub start_attempts: u32,
    /// Delay between attempts to start a new server.
    pub start_retry_delay: Duration,
}

impl Default for Timeouts {
    fn default() -> Timeouts {
        Timeouts {
            poll_interval: Duration::from_secs(15),
            clone_poll_interval: Duration::from_secs(30),
            drive_poll_interval: Duration::from_secs(20),
            graceful_shutdown: Duration::from_secs(5 * 60),
            change_stop: Duration::from_secs(10 * 60),
            clone_stop: Duration::from_secs(20 * 60),
            reboot_stop: Duration::from_secs(20 * 60),
            server_ready: Duration::from_secs(15 * 60),
            drive_ready: Duration::from_secs(20 * 60),
            terminate: Duration::from_secs(10 * 60),
            start_attempts: 5,
            start_retry_delay: Duration::from_secs(60),
        }
    }
}

/// A CloudSigma API session.
///
/// Cloning a session is cheap, the account cache is shared between clones.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    auth: BasicAuth,
    account: Arc<OnceCell<String>>,
    region: Option<String>,
    timeouts: Timeouts,
}

#[derive(Debug, Deserialize)]
struct Profile {
    uuid: String,
}

impl Session {
    /// Create a new session with a given authentication.
    pub fn new(auth: BasicAuth) -> Session {
        Session {
            client: Client::new(),
            auth,
            account: Arc::new(OnceCell::new()),
            region: None,
            timeouts: Timeouts::default(),
        }
    }

    /// Endpoint of this session.
    #[inline]
    pub fn endpoint(&self) -> &Url {
        self.auth.endpoint()
    }

    /// Timeouts used by workflows.
    #[inline]
    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Override timeouts used by workflows.
    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    /// Set the account UUID instead of fetching it from the profile.
    pub fn set_account<S: Into<String>>(&mut self, account: S) {
        self.account = Arc::new(OnceCell::new_with(Some(account.into())));
    }

    /// Set the region instead of deriving it from the endpoint.
    pub fn set_region<S: Into<String>>(&mut self, region: S) {
        self.region = Some(region.into());
    }

    /// Send all requests through an HTTP proxy.
    pub fn set_proxy<S: AsRef<str>>(&mut self, host: S, port: u16) -> Result<()> {
        let proxy = reqwest::Proxy::all(format!("http://{}:{}", host.as_ref(), port))?;
        self.client = Client::builder().proxy(proxy).build()?;
        debug!("Using proxy {}:{}", host.as_ref(), port);
        Ok(())
    }

    /// Account UUID if it is known without a request.
    #[inline]
    pub fn cached_account(&self) -> Option<&str> {
        self.account.get().map(String::as_str)
    }

    /// Account UUID, fetched from the profile on first use.
    pub async fn account(&self) -> Result<String> {
        self.account
            .get_or_try_init(|| self.fetch_profile_uuid())
            .await
            .cloned()
    }

    /// Region set explicitly with `set_region`.
    #[inline]
    pub fn configured_region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// ID of the region this session works with.
    pub fn region_id(&self) -> Result<String> {
        datacenter::current_region(self).map(|r| r.id)
    }

    /// ID of the only data center of the current region.
    pub fn data_center_id(&self) -> Result<String> {
        self.region_id().map(datacenter::data_center_id)
    }

    /// Fetch the account UUID from the profile.
    pub(crate) async fn fetch_profile_uuid(&self) -> Result<String> {
        let body = self
            .request_text(Method::GET, &["profile", ""], None, None)
            .await?
            .ok_or_else(|| Error::new(ErrorKind::InvalidResponse, "Empty profile received"))?;

        let uuid = match serde_json::from_str::<Profile>(&body) {
            Ok(profile) => Some(profile.uuid),
            Err(_) => kv::seek_value(&body, "uuid").map(ToString::to_string),
        };
        debug!("Profile UUID is {:?}", uuid);
        uuid.ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                "No UUID was provided in the profile",
            )
        })
    }

    /// Build a URL from path segments and an optional query string.
    ///
    /// Segments are percent-encoded. An empty last segment produces a
    /// trailing slash.
    pub fn url(&self, segments: &[&str], query: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint().clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("Endpoint {} cannot be used as a base", self.endpoint()),
                )
            })?;
            let _ = path.pop_if_empty().extend(segments);
        }
        url.set_query(query.map(|q| q.trim_start_matches('?')).filter(|q| !q.is_empty()));
        Ok(url)
    }

    async fn request_text(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<&str>,
        body: Option<(&'static str, String)>,
    ) -> Result<Option<String>> {
        let is_lookup = method == Method::GET;
        self.send_request(method, segments, query, body, is_lookup)
            .await
    }

    async fn send_request(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<&str>,
        body: Option<(&'static str, String)>,
        missing_is_none: bool,
    ) -> Result<Option<String>> {
        let url = self.url(segments, query)?;
        trace!("Sending {} {}", method, url);

        let mut request = self
            .auth
            .authenticate(self.client.request(method.clone(), url.clone()))
            .header(ACCEPT, "application/json, text/plain");
        if let Some((content_type, content)) = body {
            trace!("Request body: {}", content);
            request = request.header(CONTENT_TYPE, content_type).body(content);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!("Received {} for {} {}: {}", status, method, url, text);

        if status == StatusCode::NOT_FOUND && missing_is_none {
            debug!("Resource {} was not found", url);
            return Ok(None);
        }

        if !status.is_success() {
            debug!("Request {} {} failed with {}", method, url, status);
            return Err(Error::from_status(status, &text));
        }

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    /// Fetch a key/value object, `None` if it does not exist.
    pub async fn get_kv(&self, segments: &[&str]) -> Result<Option<KvObject>> {
        Ok(self
            .request_text(Method::GET, segments, None, None)
            .await?
            .map(KvObject::parse))
    }

    /// Fetch a list of key/value objects.
    pub async fn get_kv_list(&self, segments: &[&str]) -> Result<Vec<KvObject>> {
        match self.request_text(Method::GET, segments, None, None).await? {
            Some(body) => Ok(KvObject::parse_list(body)),
            None => Ok(Vec::new()),
        }
    }

    /// Post a key/value body, returning the resulting object if any.
    pub async fn post_kv(&self, segments: &[&str], body: KvBody) -> Result<Option<KvObject>> {
        Ok(self
            .request_text(
                Method::POST,
                segments,
                None,
                Some(("text/plain", body.to_string())),
            )
            .await?
            .map(KvObject::parse))
    }

    /// Post an action without a body.
    pub async fn post_action(&self, segments: &[&str]) -> Result<()> {
        let _ = self
            .request_text(Method::POST, segments, None, Some(("text/plain", String::new())))
            .await?;
        Ok(())
    }

    /// Trigger an action that the API exposes as a GET request.
    ///
    /// Unlike other GET requests, a missing resource is an error here.
    pub async fn get_action(&self, segments: &[&str]) -> Result<()> {
        let _ = self
            .send_request(Method::GET, segments, None, None, false)
            .await?;
        Ok(())
    }

    /// Fetch a JSON document, `None` if it does not exist.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: Option<&str>,
    ) -> Result<Option<T>> {
        match self.request_text(Method::GET, segments, query, None).await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn send_json<B, T>(&self, method: Method, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body)?;
        let text = self
            .request_text(method, segments, None, Some(("application/json", body)))
            .await?
            .ok_or_else(|| Error::new(ErrorKind::InvalidResponse, "Empty response received"))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Post a JSON document.
    pub async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, segments, body).await
    }

    /// Replace a JSON document.
    pub async fn put_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, segments, body).await
    }
}

#[cfg(test)]
mod test {
    use super::super::auth::BasicAuth;
    use super::Session;

    fn session(endpoint: &str) -> Session {
        Session::new(BasicAuth::new(endpoint, "user", "pass").unwrap())
    }

    #[test]
    fn test_url_join() {
        let s = session("https://api.zrh.cloudsigma.com");
        assert_eq!(
            s.url(&["servers", "abc", "info"], None).unwrap().as_str(),
            "https://api.zrh.cloudsigma.com/servers/abc/info"
        );
        let s = session("https://api.zrh.cloudsigma.com/api/2.0/");
        assert_eq!(
            s.url(&["fwpolicies", "detail", ""], Some("?limit=20&offset=20"))
                .unwrap()
                .as_str(),
            "https://api.zrh.cloudsigma.com/api/2.0/fwpolicies/detail/?limit=20&offset=20"
        );
    }

    #[test]
    fn test_url_encodes_segments() {
        let s = session("https://api.zrh.cloudsigma.com");
        assert_eq!(
            s.url(&["drives", "a b/c", "info"], None).unwrap().as_str(),
            "https://api.zrh.cloudsigma.com/drives/a%20b%2Fc/info"
        );
    }

    #[test]
    fn test_region() {
        let mut s = session("https://api.lvs.cloudsigma.com");
        assert_eq!(s.region_id().unwrap(), "us-nv1");
        assert_eq!(s.data_center_id().unwrap(), "us-nv1-a");
        s.set_region("eu-ch1");
        assert_eq!(s.region_id().unwrap(), "eu-ch1");
        assert!(session("https://example.com").region_id().is_err());
    }

    #[test]
    fn test_account_cache() {
        let mut s = session("https://api.zrh.cloudsigma.com");
        assert_eq!(s.cached_account(), None);
        s.set_account("acc");
        let clone = s.clone();
        assert_eq!(clone.cached_account(), Some("acc"));
    }
}

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

//! HTTP basic authentication.

use std::fmt;

use reqwest::{IntoUrl, RequestBuilder, Url};

use super::super::Result;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.zrh.cloudsigma.com";

/// Basic authentication against a fixed endpoint.
#[derive(Clone)]
pub struct BasicAuth {
    endpoint: Url,
    username: String,
    password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .field("password", &"<hidden>")
            .finish()
    }
}

impl BasicAuth {
    /// Create an authentication method for the given endpoint.
    pub fn new<U, S1, S2>(endpoint: U, username: S1, password: S2) -> Result<BasicAuth>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
    {
        Ok(BasicAuth {
            endpoint: endpoint.into_url()?,
            username: username.into(),
            password: password.into(),
        })
    }

    /// Create an authentication method for the default (Zurich) endpoint.
    pub fn with_default_endpoint<S1, S2>(username: S1, password: S2) -> Result<BasicAuth>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        BasicAuth::new(DEFAULT_ENDPOINT, username, password)
    }

    /// Endpoint all requests go to.
    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// User name.
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Add credentials to a request.
    pub(crate) fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

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

//! Authentication and configuration.
//!
//! CloudSigma uses HTTP basic authentication with the account e-mail (or
//! API key) as a user name. Every request carries the credentials, there is
//! no token exchange.
//!
//! The usual workflow for connecting to the API is as follows:
//!
//! 1. Create [BasicAuth](struct.BasicAuth.html) with the endpoint and
//!    credentials, or load them from a configuration file or environment.
//! 2. Create a [Session](../session/struct.Session.html) or directly a
//!    [Cloud](../struct.Cloud.html).
//!
//! # Examples
//!
//! ```rust,no_run
//! use cloudsigma::auth::BasicAuth;
//! use cloudsigma::Cloud;
//!
//! let auth = BasicAuth::new("https://api.lvs.cloudsigma.com", "me@example.com", "pa$$w0rd")
//!     .expect("Invalid endpoint");
//! let cloud = Cloud::new(auth);
//! ```
//!
//! Creating a session from environment variables:
//!
//! ```rust,no_run
//! let session = cloudsigma::auth::from_env().expect("Failed to configure");
//! ```
//!
//! # Configuration file
//!
//! The file `cloudsigma.yaml` is searched in the current directory, in
//! `~/.config/cloudsigma/` and in `/etc/cloudsigma/`:
//!
//! ```yaml
//! clouds:
//!   zurich:
//!     endpoint: https://api.zrh.cloudsigma.com
//!     auth:
//!       username: me@example.com
//!       password: pa$$w0rd
//!     # optional, fetched from the profile when missing
//!     account: 6e5f3b1c-7e74-4b8a-9e0c-6f8e3b4f3f11
//!     proxy:
//!       host: proxy.example.com
//!       port: 3128
//! ```

mod basic;
mod config;

pub use self::basic::{BasicAuth, DEFAULT_ENDPOINT};
pub use self::config::{from_config, from_env};

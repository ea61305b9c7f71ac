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

//! Support for cloud configuration file and environment.

use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::basic::{BasicAuth, DEFAULT_ENDPOINT};

#[derive(Debug, Clone, Deserialize)]
struct Auth {
    username: String,
    password: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Proxy {
    host: String,
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct Cloud {
    #[serde(default)]
    endpoint: Option<String>,
    auth: Auth,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    proxy: Option<Proxy>,
}

#[derive(Debug, Clone, Deserialize)]
struct Root {
    clouds: HashMap<String, Cloud>,
}

fn find_config() -> Option<PathBuf> {
    let current = Path::new("./cloudsigma.yaml");
    if current.is_file() {
        match current.canonicalize() {
            Ok(val) => return Some(val),
            Err(e) => warn!("Cannot canonicalize {:?}: {}", current, e),
        }
    }

    if let Some(mut home) = dirs::home_dir() {
        home.push(".config/cloudsigma/cloudsigma.yaml");
        if home.is_file() {
            return Some(home);
        }
    } else {
        warn!("Cannot find home directory");
    }

    let abs = PathBuf::from("/etc/cloudsigma/cloudsigma.yaml");
    if abs.is_file() {
        Some(abs)
    } else {
        None
    }
}

fn session_from_cloud(cloud: Cloud) -> Result<Session> {
    let endpoint = cloud.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
    let auth = BasicAuth::new(endpoint, cloud.auth.username, cloud.auth.password)?;
    let mut session = Session::new(auth);
    if let Some(account) = cloud.account {
        session.set_account(account);
    }
    if let Some(region) = cloud.region {
        session.set_region(region);
    }
    if let Some(proxy) = cloud.proxy {
        session.set_proxy(proxy.host, proxy.port)?;
    }
    Ok(session)
}

fn session_from_yaml<R: std::io::Read>(reader: R, cloud_name: &str) -> Result<Session> {
    let mut root: Root = serde_yaml::from_reader(reader)?;
    let cloud = root.clouds.remove(cloud_name).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("No such cloud: {}", cloud_name),
        )
    })?;
    debug!("Using cloud {} from the configuration file", cloud_name);
    session_from_cloud(cloud)
}

/// Create a `Session` from the config file.
pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Session> {
    let path = find_config().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidConfig,
            "cloudsigma.yaml was not found in any location",
        )
    })?;
    let file = File::open(&path).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot read {:?}: {}", path, e),
        )
    })?;
    session_from_yaml(file, cloud_name.as_ref())
}

fn session_from_vars<F>(var: F) -> Result<Session>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |name: &str| {
        var(name).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Environment variable {} is not set", name),
            )
        })
    };

    let proxy = match (var("CLOUDSIGMA_PROXY_HOST"), var("CLOUDSIGMA_PROXY_PORT")) {
        (Some(host), Some(port)) => Some(Proxy {
            host,
            port: port.parse().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("Invalid proxy port {}", port),
                )
            })?,
        }),
        (Some(host), None) => Some(Proxy { host, port: 80 }),
        _ => None,
    };

    session_from_cloud(Cloud {
        endpoint: var("CLOUDSIGMA_ENDPOINT"),
        auth: Auth {
            username: require("CLOUDSIGMA_USERNAME")?,
            password: require("CLOUDSIGMA_PASSWORD")?,
        },
        account: var("CLOUDSIGMA_ACCOUNT"),
        region: var("CLOUDSIGMA_REGION"),
        proxy,
    })
}

/// Create a `Session` from environment variables.
///
/// `CLOUDSIGMA_USERNAME` and `CLOUDSIGMA_PASSWORD` are required,
/// `CLOUDSIGMA_ENDPOINT`, `CLOUDSIGMA_ACCOUNT`, `CLOUDSIGMA_REGION`,
/// `CLOUDSIGMA_PROXY_HOST` and `CLOUDSIGMA_PROXY_PORT` are optional.
pub fn from_env() -> Result<Session> {
    session_from_vars(|name| env::var(name).ok().filter(|v| !v.is_empty()))
}

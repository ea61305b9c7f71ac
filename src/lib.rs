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

//! CloudSigma client in Rust.
//!
//! The goal of this project is to provide a simple API for working with
//! CloudSigma clouds: servers, drives (used both as machine images and as
//! attachable volumes), VLANs, static IP addresses and firewall policies.
//!
//! # Usage
//!
//! Start with [authentication](auth/index.html) and [Cloud](struct.Cloud.html)
//! structure, which is the entry point to the API.
//!
//! ```rust,no_run
//! async fn list_servers() -> cloudsigma::Result<()> {
//!     let cloud = cloudsigma::Cloud::from_env()?;
//!     for server in cloud.list_servers().await? {
//!         println!("{} is {}", server.name(), server.status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Operations that reconfigure a server stop it first and restart it in the
//! background afterwards. Background restarts are spawned on the current
//! tokio runtime.
//!
//! # Features
//!
//! * [Compute API support](compute/index.html): servers, hardware products,
//!   lifecycle workflows (change, clone, launch, reboot, terminate)
//! * [Machine images](image/index.html) backed by drives
//! * [Block storage](block_storage/index.html) backed by drives
//! * [Networking](network/index.html): VLANs, static IPs, firewall policies
//! * [Regions and data centers](datacenter/index.html)

#![crate_name = "cloudsigma"]
#![crate_type = "lib"]
#![doc(html_root_url = "https://docs.rs/cloudsigma/0.1.0")]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    missing_debug_implementations,
    non_shorthand_field_patterns,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_import_braces,
    unused_parens,
    while_true
)]
#![warn(missing_docs, unused, unused_results)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

#[macro_use]
mod utils;

pub mod auth;
pub mod block_storage;
mod cloud;
pub mod common;
pub mod compute;
pub mod datacenter;
mod error;
pub mod image;
pub mod network;
pub mod session;

pub use crate::cloud::Cloud;
pub use crate::common::Refresh;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::session::{Session, Timeouts};

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

//! Servers (virtual machines) support.
//!
//! Servers are accessed via the [Cloud](../struct.Cloud.html) object:
//!
//! ```rust,no_run
//! async fn reboot_all() -> cloudsigma::Result<()> {
//!     let cloud = cloudsigma::Cloud::from_env()?;
//!     for mut server in cloud.list_servers().await? {
//!         if server.is_running() {
//!             server.reboot().await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Hardware changes (drives, IP addresses) require the server to be stopped.
//! The workflows stop the server, apply the change and start it again in the
//! background, returning a [BackgroundTask](struct.BackgroundTask.html) that
//! can be awaited or dropped.

mod api;
pub mod capabilities;
mod lifecycle;
mod products;
mod protocol;
mod servers;

pub use self::capabilities::ServerCapabilities;
pub use self::lifecycle::{BackgroundTask, Provisioned};
pub use self::products::{list_products, list_supported_architectures, product_id, Product};
pub use self::protocol::{ServerStatus, DEFAULT_BOOT_DEVICE, MAX_BLOCK_DEVICES};
pub use self::servers::{NewServer, Server, ServerStatusWaiter, TerminationWaiter};

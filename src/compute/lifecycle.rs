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

//! Multi-step server workflows.
//!
//! Hardware changes require a stopped server: a running server is stopped,
//! changed and then started again in the background. Cloning works the same
//! way. Launching clones a boot drive, waits for it and creates a server.
//!
//! Background work is spawned on the current tokio runtime and represented
//! by [BackgroundTask](struct.BackgroundTask.html). Dropping a task detaches
//! it.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use super::super::block_storage::api as drive_api;
use super::super::common::KvBody;
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::api::{self, ServerAction};
use super::products::Product;
use super::protocol::{self, ServerStatus};
use super::servers::Server;

/// A piece of work running in the background.
pub struct BackgroundTask<T> {
    description: String,
    started_at: DateTime<Utc>,
    handle: JoinHandle<Result<T>>,
}

/// A new server together with the background work started for it.
#[derive(Debug)]
pub struct Provisioned {
    /// The new server.
    pub server: Server,
    /// Background tasks started by the workflow (starting servers).
    pub background: Vec<BackgroundTask<()>>,
}

impl<T> fmt::Debug for BackgroundTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundTask")
            .field("description", &self.description)
            .field("started_at", &self.started_at)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub(crate) fn spawn<F>(description: String, future: F) -> BackgroundTask<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        debug!("Starting background task: {}", description);
        BackgroundTask {
            description,
            started_at: Utc::now(),
            handle: tokio::spawn(future),
        }
    }

    /// What the task does.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// When the task was started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to finish and return its result.
    pub async fn join(self) -> Result<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(Error::new(
                ErrorKind::OperationFailed,
                format!("Background task '{}' failed: {}", self.description, e),
            )),
        }
    }
}

/// Wait for a server to reach one of the states.
///
/// Returns `None` if the server disappears and the last known state when
/// the timeout is reached. A terminated server is returned immediately.
/// Transient errors when fetching the server are ignored.
pub(crate) async fn wait_for_state(
    session: &Session,
    mut server: protocol::Server,
    states: &[ServerStatus],
    timeout: Duration,
    delay: Duration,
) -> Option<protocol::Server> {
    let deadline = Instant::now() + timeout;
    loop {
        if states.contains(&server.status) || server.status == ServerStatus::Terminated {
            debug!("Server {} is {}", server.id, server.status);
            return Some(server);
        }

        if Instant::now() + delay > deadline {
            warn!(
                "Timeout waiting for server {} to reach {:?}, current state is {}",
                server.id, states, server.status
            );
            return Some(server);
        }

        trace!(
            "Waiting for server {} to reach {:?}, current state is {}",
            server.id,
            states,
            server.status
        );
        sleep(delay).await;
        match api::get_server(session, &server.id).await {
            Ok(Some(new)) => server = new,
            Ok(None) => {
                debug!("Server {} disappeared", server.id);
                return None;
            }
            Err(e) => debug!("Failed to refresh server {}, ignoring: {}", server.id, e),
        }
    }
}

/// Stop a server, gracefully first and forcefully if that does not work.
pub(crate) async fn power_off(session: &Session, server: &protocol::Server) -> Result<()> {
    info!("Shutting down server {}", server.id);
    api::server_action(session, &server.id, ServerAction::Shutdown).await?;

    let timeouts = session.timeouts();
    let current = wait_for_state(
        session,
        server.clone(),
        &[ServerStatus::Stopped],
        timeouts.graceful_shutdown,
        timeouts.poll_interval,
    )
    .await;

    match current {
        Some(ref s) if s.status == ServerStatus::Running || s.status == ServerStatus::Pending => {
            info!("Server {} did not shut down gracefully, forcing", server.id);
            api::server_action(session, &server.id, ServerAction::Stop).await
        }
        _ => Ok(()),
    }
}

/// Start a server in the background, logging failures.
fn spawn_restart(session: &Session, id: &str, reason: &str) -> BackgroundTask<()> {
    let session = session.clone();
    let id = id.to_string();
    let reason = reason.to_string();
    BackgroundTask::spawn(format!("Restart server {} {}", id, reason), async move {
        info!("Restarting server {} {}", id, reason);
        let result = api::server_action(&session, &id, ServerAction::Start).await;
        if let Err(ref e) = result {
            warn!("Failed to start server {} {}: {}", id, reason, e);
        }
        result
    })
}

/// Start a new server in the background with several attempts.
fn spawn_starter(session: &Session, id: &str) -> BackgroundTask<()> {
    let session = session.clone();
    let id = id.to_string();
    BackgroundTask::spawn(format!("Start new server {}", id), async move {
        let timeouts = *session.timeouts();
        let mut last_error = None;
        for attempt in 1..=timeouts.start_attempts {
            let current = match api::get_server(&session, &id).await {
                Ok(Some(server)) => {
                    info!("Verifying the state of server {}", id);
                    wait_for_state(
                        &session,
                        server,
                        &[ServerStatus::Stopped, ServerStatus::Running],
                        timeouts.server_ready,
                        timeouts.poll_interval,
                    )
                    .await
                }
                Ok(None) => None,
                Err(e) => {
                    warn!("Cannot fetch server {} before starting it: {}", id, e);
                    last_error = Some(e);
                    sleep(timeouts.start_retry_delay).await;
                    continue;
                }
            };

            match current {
                None => {
                    info!("Server {} disappeared, not starting it", id);
                    return Ok(());
                }
                Some(ref s) if s.status == ServerStatus::Running => {
                    info!("Server {} is already running", id);
                    return Ok(());
                }
                Some(ref s) if s.status == ServerStatus::Terminated => {
                    info!("Server {} is terminated, not starting it", id);
                    return Ok(());
                }
                Some(_) => {}
            }

            info!("Start attempt {} on server {}", attempt, id);
            match api::server_action(&session, &id, ServerAction::Start).await {
                Ok(()) => {
                    info!("Server {} started", id);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Failed to start server {} post-create: {}", id, e);
                    last_error = Some(e);
                }
            }
            sleep(timeouts.start_retry_delay).await;
        }

        info!("Server {} never started", id);
        Err(last_error.unwrap_or_else(|| {
            Error::new(
                ErrorKind::OperationFailed,
                format!("Server {} never started", id),
            )
        }))
    })
}

impl Server {
    /// Apply a configuration change.
    ///
    /// A server that is not stopped is stopped first and restarted in the
    /// background after the change. The restart task is returned in this
    /// case.
    pub async fn change(&mut self, body: KvBody) -> Result<Option<BackgroundTask<()>>> {
        let session = self.session().clone();
        let restart = self.status() != ServerStatus::Stopped;

        if restart {
            info!("Server {} needs to be stopped prior to change", self.id());
            power_off(&session, self.raw()).await?;
            info!("Waiting for server {} to fully stop", self.id());
            let timeouts = session.timeouts();
            match wait_for_state(
                &session,
                self.raw().clone(),
                &[ServerStatus::Stopped],
                timeouts.change_stop,
                timeouts.poll_interval,
            )
            .await
            {
                Some(server) if server.status == ServerStatus::Terminated => {
                    return Err(Error::new(
                        ErrorKind::OperationFailed,
                        format!("Server {} was terminated before the change", self.id()),
                    ));
                }
                Some(server) => self.set_raw(server),
                None => {
                    return Err(Error::new(
                        ErrorKind::ResourceNotFound,
                        format!("Server {} disappeared before the change", self.id()),
                    ));
                }
            }
        }

        info!("Posting changes to server {}", self.id());
        api::set_server(&session, self.id(), body).await?;
        info!("Change to server {} succeeded", self.id());

        Ok(if restart {
            Some(spawn_restart(&session, self.id(), "after change"))
        } else {
            None
        })
    }

    /// Attach a drive to the given device slot (`block:N`).
    pub async fn attach_drive<S: AsRef<str>>(
        &mut self,
        drive_id: S,
        device: u8,
    ) -> Result<Option<BackgroundTask<()>>> {
        let drive_id = drive_id.as_ref();
        if device >= protocol::MAX_BLOCK_DEVICES {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid device ID {}", device),
            ));
        }
        if let Some(existing) = self.device_of(drive_id) {
            return Err(Error::new(
                ErrorKind::Conflict,
                format!(
                    "Drive {} is already attached to server {} as block:{}",
                    drive_id,
                    self.id(),
                    existing
                ),
            ));
        }
        if let Some(other) = self.drives().get(&device) {
            return Err(Error::new(
                ErrorKind::Conflict,
                format!(
                    "Device block:{} of server {} is already used by drive {}",
                    device,
                    self.id(),
                    other
                ),
            ));
        }

        self.change(KvBody::new().with(format!("block:{}", device), drive_id))
            .await
    }

    /// Detach a drive.
    pub async fn detach_drive<S: AsRef<str>>(
        &mut self,
        drive_id: S,
    ) -> Result<Option<BackgroundTask<()>>> {
        let drive_id = drive_id.as_ref();
        let device = self.device_of(drive_id).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Drive {} does not appear to be attached to server {}",
                    drive_id,
                    self.id()
                ),
            )
        })?;

        self.change(KvBody::new().with_cleared(format!("block:{}", device)))
            .await
    }

    /// Assign a static IP to the first NIC.
    pub async fn assign_ip<S: AsRef<str>>(&mut self, ip: S) -> Result<Option<BackgroundTask<()>>> {
        self.change(KvBody::new().with("nic:0:dhcp", ip)).await
    }

    /// Release the static IP of the first NIC.
    pub async fn release_ip(&mut self) -> Result<Option<BackgroundTask<()>>> {
        self.change(KvBody::new().with_cleared("nic:0:dhcp")).await
    }

    /// Stop the server and wait for it to be stopped.
    ///
    /// Timing out is not an error, the last known state is kept.
    pub(crate) async fn power_off_and_wait(&mut self, timeout: Duration) -> Result<()> {
        let session = self.session().clone();
        if self.status() != ServerStatus::Stopped {
            power_off(&session, self.raw()).await?;
        }

        let delay = session.timeouts().poll_interval;
        match wait_for_state(&session, self.raw().clone(), &[ServerStatus::Stopped], timeout, delay)
            .await
        {
            Some(server) if server.status == ServerStatus::Terminated => Err(Error::new(
                ErrorKind::OperationFailed,
                format!("Server {} is terminated", self.id()),
            )),
            Some(server) => {
                self.set_raw(server);
                Ok(())
            }
            None => Err(Error::new(
                ErrorKind::ResourceNotFound,
                format!("Server {} disappeared while stopping", self.id()),
            )),
        }
    }

    /// Shut the server down and wait for it to be stopped.
    ///
    /// The server is shut down gracefully first and forcefully if it does
    /// not stop in time.
    pub async fn shut_down(&mut self) -> Result<()> {
        let timeout = self.session().timeouts().change_stop;
        self.power_off_and_wait(timeout).await
    }

    /// Reboot the server.
    ///
    /// The server is stopped, and started once it is stopped or when the
    /// wait times out.
    pub async fn reboot(&mut self) -> Result<()> {
        let timeout = self.session().timeouts().reboot_stop;
        self.power_off_and_wait(timeout).await?;
        info!("Starting server {} after reboot", self.id());
        api::server_action(self.session(), self.id(), ServerAction::Start).await
    }

    /// Clone the server into a new one.
    ///
    /// A server that is not stopped is stopped for cloning and restarted in
    /// the background afterwards, even if cloning fails.
    pub async fn clone_as<S: AsRef<str>>(&self, name: S, power_on: bool) -> Result<Provisioned> {
        let session = self.session().clone();
        if self.status() == ServerStatus::Terminated {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Cannot clone terminated server {}", self.id()),
            ));
        }

        let was_stopped = self.status() == ServerStatus::Stopped;
        let result = self.clone_stopped(&session, name.as_ref(), power_on).await;
        if !was_stopped {
            let restart = spawn_restart(&session, self.id(), "after cloning");
            return result.map(|mut provisioned| {
                provisioned.background.push(restart);
                provisioned
            });
        }
        result
    }

    async fn clone_stopped(
        &self,
        session: &Session,
        name: &str,
        power_on: bool,
    ) -> Result<Provisioned> {
        if self.status() != ServerStatus::Stopped {
            power_off(session, self.raw()).await?;
            let timeouts = session.timeouts();
            match wait_for_state(
                session,
                self.raw().clone(),
                &[ServerStatus::Stopped],
                timeouts.clone_stop,
                timeouts.clone_poll_interval,
            )
            .await
            {
                Some(server) if server.status != ServerStatus::Terminated => {}
                _ => {
                    return Err(Error::new(
                        ErrorKind::OperationFailed,
                        format!("Server {} terminated during stop for cloning", self.id()),
                    ))
                }
            }
        }

        let new = api::clone_server(session, self.id(), KvBody::new().with("name", name)).await?;
        let mut background = Vec::new();
        let mut current = new.clone();
        if power_on {
            let timeouts = session.timeouts();
            current = wait_for_state(
                session,
                new,
                &[ServerStatus::Stopped, ServerStatus::Running],
                timeouts.server_ready,
                timeouts.poll_interval,
            )
            .await
            .ok_or_else(|| {
                Error::new(ErrorKind::ResourceNotFound, "New server disappeared")
            })?;
            if current.status != ServerStatus::Running {
                background.push(spawn_restart(session, &current.id, "after cloning"));
            }
        }

        Ok(Provisioned {
            server: Server::new(session.clone(), current),
            background,
        })
    }
}

/// Launch a new server from a machine image.
pub(crate) async fn launch(
    session: &Session,
    host_name: &str,
    image_id: &str,
    product_id: Option<&str>,
    vlan_id: Option<&str>,
) -> Result<Provisioned> {
    if drive_api::get_drive(session, image_id).await?.is_none() {
        return Err(Error::new(
            ErrorKind::ResourceNotFound,
            format!("No such machine image: {}", image_id),
        ));
    }

    info!("Cloning drive from machine image {}", image_id);
    let drive = drive_api::clone_drive(session, image_id, host_name).await?;
    info!("Waiting for new drive {} to become active", drive.id);
    let timeouts = session.timeouts();
    let deadline = Instant::now() + timeouts.drive_ready;
    let mut current = drive.clone();
    while !current.is_ready() && Instant::now() < deadline {
        sleep(timeouts.drive_poll_interval).await;
        match drive_api::get_drive(session, &drive.id).await {
            Ok(Some(refreshed)) => current = refreshed,
            Ok(None) => {
                return Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!("Cloned drive {} has disappeared", drive.id),
                ))
            }
            Err(e) => debug!("Failed to refresh drive {}, ignoring: {}", drive.id, e),
        }
        debug!("Drive {} is {:?}", drive.id, current.status);
    }

    let (ram, speed, count) = product_id
        .map(Product::settings_for)
        .unwrap_or((512, 1000, 1));
    let mut body = KvBody::new()
        .with("name", host_name)
        .with(protocol::DEFAULT_BOOT_DEVICE, &drive.id)
        .with("boot", protocol::DEFAULT_BOOT_DEVICE)
        .with("cpu", speed.to_string())
        .with("mem", ram.to_string())
        .with("smp", count.to_string());
    if let Some(vlan) = vlan_id {
        body.push("nic:1:vlan", vlan);
    }

    info!("Creating server {}", host_name);
    let server = api::create_server(session, body).await?;
    info!("Waiting for server {} to be stopped or running", server.id);
    let server = wait_for_state(
        session,
        server,
        &[ServerStatus::Stopped, ServerStatus::Running],
        timeouts.server_ready,
        timeouts.poll_interval,
    )
    .await
    .ok_or_else(|| {
        Error::new(
            ErrorKind::ResourceNotFound,
            "Server disappeared waiting for startup state",
        )
    })?;

    let mut background = Vec::new();
    if server.status != ServerStatus::Running {
        info!("Starting server {} in the background", server.id);
        background.push(spawn_starter(session, &server.id));
    }

    Ok(Provisioned {
        server: Server::new(session.clone(), server),
        background,
    })
}

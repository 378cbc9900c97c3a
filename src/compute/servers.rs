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

//! Server management via Compute API.
//!
//! # Examples
//!
//! ```rust,no_run
//! use novaclient::auth::Token;
//! use novaclient::compute;
//! use novaclient::{Client, Config};
//!
//! let auth = Token::new("https://cloud.example.com:8774/v2.1", "gAAAAAB...")
//!     .expect("Invalid endpoint");
//! let client = Client::connect(Config::new().with_api_version("2.30"), Box::new(auth))
//!     .expect("Negotiation failed");
//!
//! let server_list = compute::servers(&client).list().expect("Unable to fetch servers");
//! ```

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use super::super::client::Client;
use super::super::common::{DeletionWaiter, Refresh};
use super::super::utils::Query;
use super::super::Result;
use super::migrations::ServerMigrationManager;
use super::protocol::{self, ServerAddress, ServerFlavor, ServerStatus};
use super::substitutions;

/// Server manager: working with virtual servers.
#[derive(Clone, Copy, Debug)]
pub struct ServerManager<'client> {
    client: &'client Client,
}

/// Structure representing a single server.
#[derive(Clone, Debug)]
pub struct Server<'client> {
    client: &'client Client,
    inner: protocol::Server,
}

/// Arguments of a live migration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveMigration {
    /// Target host, `None` to let the scheduler pick one.
    pub host: Option<String>,
    /// Whether to use block migration, `None` for the server default.
    pub block_migration: Option<bool>,
    /// Bypass the scheduler checks (2.30+, requires a host).
    pub force: bool,
}

impl LiveMigration {
    /// Live migration with the default settings.
    pub fn new() -> LiveMigration {
        LiveMigration::default()
    }

    /// Set the target host.
    pub fn with_host<S: Into<String>>(mut self, value: S) -> LiveMigration {
        self.host = Some(value.into());
        self
    }

    /// Request or disable block migration.
    pub fn with_block_migration(mut self, value: bool) -> LiveMigration {
        self.block_migration = Some(value);
        self
    }

    /// Force the migration to the given host.
    pub fn with_force(mut self, value: bool) -> LiveMigration {
        self.force = value;
        self
    }
}

impl<'client> ServerManager<'client> {
    pub(crate) fn new(client: &'client Client) -> ServerManager<'client> {
        ServerManager { client }
    }

    /// List all servers with details.
    pub fn list(&self) -> Result<Vec<Server<'client>>> {
        trace!("Listing servers");
        let root: protocol::ServersRoot = self.client.get_json("servers/detail", &Query::new())?;
        debug!("Received {} servers", root.servers.len());
        Ok(root
            .servers
            .into_iter()
            .map(|inner| Server {
                client: self.client,
                inner,
            })
            .collect())
    }

    /// Get a server by its ID.
    pub fn get<Id: AsRef<str>>(&self, id: Id) -> Result<Server<'client>> {
        let inner = fetch(self.client, id.as_ref())?;
        Ok(Server {
            client: self.client,
            inner,
        })
    }

    /// Start live migration of a server.
    pub fn live_migrate<Id: AsRef<str>>(&self, id: Id, args: &LiveMigration) -> Result<()> {
        let builder = substitutions::live_migrate(self.client.negotiated_version()?)?;
        let body = builder(args)?;
        let path = format!("servers/{}/action", id.as_ref());
        debug!("Live migrating server {} with {:?}", id.as_ref(), args);
        let _ = self.client.post(&path, &body)?;
        Ok(())
    }

    /// Delete a server by its ID without waiting.
    pub fn delete<Id: AsRef<str>>(&self, id: Id) -> Result<()> {
        debug!("Deleting server {}", id.as_ref());
        self.client.delete(&format!("servers/{}", id.as_ref()))
    }
}

fn fetch(client: &Client, id: &str) -> Result<protocol::Server> {
    trace!("Fetching server {}", id);
    let root: protocol::ServerRoot = client.get_json(&format!("servers/{}", id), &Query::new())?;
    trace!("Received {:?}", root.server);
    Ok(root.server)
}

impl<'client> Server<'client> {
    /// Server unique ID.
    pub fn id(&self) -> &String {
        &self.inner.id
    }

    /// Server name.
    pub fn name(&self) -> &String {
        &self.inner.name
    }

    /// Server status.
    pub fn status(&self) -> ServerStatus {
        self.inner.status
    }

    /// Creation date and time (if reported).
    pub fn created_at(&self) -> Option<&DateTime<FixedOffset>> {
        self.inner.created.as_ref()
    }

    /// Last update date and time (if reported).
    pub fn updated_at(&self) -> Option<&DateTime<FixedOffset>> {
        self.inner.updated.as_ref()
    }

    /// Addresses grouped by network name.
    pub fn addresses(&self) -> &HashMap<String, Vec<ServerAddress>> {
        &self.inner.addresses
    }

    /// Metadata.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.inner.metadata
    }

    /// Flavor information, its shape depends on the API version.
    pub fn flavor(&self) -> &ServerFlavor {
        &self.inner.flavor
    }

    /// Image ID, `None` for servers booted from volume.
    pub fn image_id(&self) -> Option<&String> {
        self.inner.image.as_ref().map(|x| &x.id)
    }

    /// Opaque ID of the host, unique per project.
    pub fn host_id(&self) -> Option<&String> {
        self.inner.host_id.as_ref()
    }

    /// Compute host (admin only).
    pub fn host(&self) -> Option<&String> {
        self.inner.host.as_ref()
    }

    /// Build progress in percent (if building).
    pub fn progress(&self) -> Option<u8> {
        self.inner.progress
    }

    /// Start live migration of this server.
    pub fn live_migrate(&self, args: &LiveMigration) -> Result<()> {
        ServerManager::new(self.client).live_migrate(self.id(), args)
    }

    /// Migrations of this server.
    pub fn migrations(&self) -> ServerMigrationManager<'client> {
        ServerMigrationManager::new(self.client, self.inner.id.clone())
    }

    /// Delete the server.
    pub fn delete(self) -> Result<DeletionWaiter<Server<'client>>> {
        ServerManager::new(self.client).delete(self.id())?;
        Ok(DeletionWaiter::new(
            self,
            Duration::new(120, 0),
            Duration::new(1, 0),
        ))
    }
}

impl<'client> Refresh for Server<'client> {
    /// Refresh the server.
    fn refresh(&mut self) -> Result<()> {
        self.inner = fetch(self.client, &self.inner.id)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use waiter::Waiter;

    use super::super::super::client::test::ready_client;
    use super::super::super::common::Refresh;
    use super::super::super::fakes::FakeTransport;
    use super::super::super::ErrorKind;
    use super::super::protocol::ServerStatus;
    use super::{LiveMigration, ServerManager};

    fn fake() -> FakeTransport {
        FakeTransport::new()
            .with_versions("http://nova-api:8774", "2.1", "2.40")
            .with_json(
                Method::GET,
                "/servers/detail",
                StatusCode::OK,
                json!({"servers": [
                    {"id": "1234", "name": "sample-server", "status": "BUILD", "progress": 60,
                     "image": {"id": "img"}, "flavor": {"id": 1},
                     "hostId": "e4d909c290d0fb1ca068ffaddf22cbd0"},
                    {"id": "5678", "name": "sample-server2", "status": "ACTIVE",
                     "image": "", "flavor": {"id": 1}}
                ]}),
            )
            .with_json(
                Method::GET,
                "/servers/1234",
                StatusCode::OK,
                json!({"server": {"id": "1234", "name": "sample-server", "status": "ACTIVE"}}),
            )
            .with_empty(Method::POST, "/servers/1234/action", StatusCode::ACCEPTED)
    }

    #[test]
    fn test_list() {
        let fake = fake();
        let client = ready_client(&fake, "2.30");
        let servers = ServerManager::new(&client).list().unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].id(), "1234");
        assert_eq!(servers[0].status(), ServerStatus::Building);
        assert_eq!(servers[0].progress(), Some(60));
        assert_eq!(servers[0].image_id().map(String::as_str), Some("img"));
        assert!(servers[1].image_id().is_none());
        assert_eq!(
            servers[0].host_id().map(String::as_str),
            Some("e4d909c290d0fb1ca068ffaddf22cbd0")
        );
        assert!(servers[1].host_id().is_none());
        fake.assert_called(Method::GET, "/v2.1/servers/detail", None);
    }

    #[test]
    fn test_get_and_refresh() {
        let fake = fake();
        let client = ready_client(&fake, "2.30");
        let mut server = ServerManager::new(&client).list().unwrap().remove(0);
        assert_eq!(server.status(), ServerStatus::Building);
        server.refresh().unwrap();
        assert_eq!(server.name(), "sample-server");
        assert_eq!(server.status(), ServerStatus::Active);
        fake.assert_called(Method::GET, "/v2.1/servers/1234", None);
    }

    fn live_migrate_body(version: &str, args: &LiveMigration) -> serde_json::Value {
        let fake = fake();
        let client = ready_client(&fake, version);
        ServerManager::new(&client)
            .live_migrate("1234", args)
            .unwrap();
        fake.last_call().body.unwrap()
    }

    #[test]
    fn test_live_migrate_by_version() {
        let args = LiveMigration::new().with_host("hostname");
        assert_eq!(
            live_migrate_body("2.1", &args),
            json!({"os-migrateLive": {"host": "hostname", "block_migration": false,
                                      "disk_over_commit": false}})
        );
        assert_eq!(
            live_migrate_body("2.25", &args),
            json!({"os-migrateLive": {"host": "hostname", "block_migration": "auto"}})
        );
        assert_eq!(
            live_migrate_body("2.30", &args.clone().with_force(true)),
            json!({"os-migrateLive": {"host": "hostname", "block_migration": "auto",
                                      "force": true}})
        );
        assert_eq!(
            live_migrate_body("2.30", &LiveMigration::new().with_block_migration(true)),
            json!({"os-migrateLive": {"host": null, "block_migration": true}})
        );
    }

    #[test]
    fn test_live_migrate_force_rejected_locally() {
        let fake = fake();
        let client = ready_client(&fake, "2.29");
        let args = LiveMigration::new().with_host("hostname").with_force(true);
        let err = ServerManager::new(&client)
            .live_migrate("1234", &args)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
        assert!(fake.callstack().is_empty());
    }

    #[test]
    fn test_delete_and_wait() {
        let fake = FakeTransport::new()
            .with_versions("http://nova-api:8774", "2.1", "2.40")
            .with_json(
                Method::GET,
                "/servers/1234",
                StatusCode::OK,
                json!({"server": {"id": "1234", "name": "sample-server", "status": "ACTIVE"}}),
            )
            .with_empty(Method::DELETE, "/servers/1234", StatusCode::NO_CONTENT);
        let client = ready_client(&fake, "2.30");
        let server = ServerManager::new(&client).get("1234").unwrap();
        let mut waiter = server.delete().unwrap();
        fake.assert_called(Method::DELETE, "/v2.1/servers/1234", None);

        // The fake keeps returning the server, so only check the first poll.
        assert_eq!(waiter.poll().unwrap(), None);
    }

    #[test]
    fn test_delete_wait_finishes_on_not_found() {
        let fake = FakeTransport::new()
            .with_versions("http://nova-api:8774", "2.1", "2.40")
            .with_json(
                Method::GET,
                "/servers/detail",
                StatusCode::OK,
                json!({"servers": [{"id": "9999", "name": "doomed", "status": "ACTIVE"}]}),
            )
            .with_empty(Method::DELETE, "/servers/9999", StatusCode::NO_CONTENT);
        let client = ready_client(&fake, "2.30");
        let server = ServerManager::new(&client).list().unwrap().remove(0);
        // GET /servers/9999 is not faked and yields 404.
        server.delete().unwrap().wait().unwrap();
    }
}

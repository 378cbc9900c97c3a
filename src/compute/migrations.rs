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

//! In-progress migrations of a server.
//!
//! Listing and showing needs API version 2.23, aborting 2.24 and forcing
//! completion 2.22.

use chrono::NaiveDateTime;
use serde_json::json;

use super::super::client::Client;
use super::super::utils::Query;
use super::super::Result;
use super::protocol;
use super::substitutions::{
    self, MIGRATION_ABORT, MIGRATION_FORCE_COMPLETE, MIGRATION_GET, MIGRATION_LIST,
};

/// Migrations of a single server.
#[derive(Clone, Debug)]
pub struct ServerMigrationManager<'client> {
    client: &'client Client,
    server_id: String,
}

/// A server migration.
#[derive(Clone, Debug)]
pub struct Migration {
    inner: protocol::Migration,
}

impl<'client> ServerMigrationManager<'client> {
    pub(crate) fn new(client: &'client Client, server_id: String) -> ServerMigrationManager<'client> {
        ServerMigrationManager { client, server_id }
    }

    fn path(&self, migration_id: Option<u64>) -> String {
        match migration_id {
            Some(id) => format!("servers/{}/migrations/{}", self.server_id, id),
            None => format!("servers/{}/migrations", self.server_id),
        }
    }

    fn require(&self, name: &str) -> Result<()> {
        substitutions::require(name, self.client.negotiated_version()?)
    }

    /// List in-progress migrations.
    pub fn list(&self) -> Result<Vec<Migration>> {
        self.require(MIGRATION_LIST)?;
        let root: protocol::MigrationsRoot = self.client.get_json(&self.path(None), &Query::new())?;
        Ok(root
            .migrations
            .into_iter()
            .map(|inner| Migration { inner })
            .collect())
    }

    /// Get a migration.
    pub fn get(&self, migration_id: u64) -> Result<Migration> {
        self.require(MIGRATION_GET)?;
        let root: protocol::MigrationRoot = self
            .client
            .get_json(&self.path(Some(migration_id)), &Query::new())?;
        Ok(Migration {
            inner: root.migration,
        })
    }

    /// Abort a running live migration.
    pub fn abort(&self, migration_id: u64) -> Result<()> {
        self.require(MIGRATION_ABORT)?;
        debug!("Aborting migration {} of server {}", migration_id, self.server_id);
        self.client.delete(&self.path(Some(migration_id)))
    }

    /// Force a running live migration to complete.
    pub fn force_complete(&self, migration_id: u64) -> Result<()> {
        self.require(MIGRATION_FORCE_COMPLETE)?;
        debug!(
            "Forcing migration {} of server {} to complete",
            migration_id, self.server_id
        );
        let path = format!("{}/action", self.path(Some(migration_id)));
        let _ = self.client.post(&path, &json!({"force_complete": null}))?;
        Ok(())
    }
}

impl Migration {
    /// Migration ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Server being migrated.
    pub fn server_id(&self) -> Option<&String> {
        self.inner.server_uuid.as_ref()
    }

    /// Migration status as reported by Nova.
    pub fn status(&self) -> &String {
        &self.inner.status
    }

    /// Source compute service.
    pub fn source_compute(&self) -> Option<&String> {
        self.inner.source_compute.as_ref()
    }

    /// Source node.
    pub fn source_node(&self) -> Option<&String> {
        self.inner.source_node.as_ref()
    }

    /// Destination compute service.
    pub fn dest_compute(&self) -> Option<&String> {
        self.inner.dest_compute.as_ref()
    }

    /// Destination node.
    pub fn dest_node(&self) -> Option<&String> {
        self.inner.dest_node.as_ref()
    }

    /// Destination host address.
    pub fn dest_host(&self) -> Option<&String> {
        self.inner.dest_host.as_ref()
    }

    /// Memory transfer progress: (processed, remaining, total) bytes.
    pub fn memory_progress(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        (
            self.inner.memory_processed_bytes,
            self.inner.memory_remaining_bytes,
            self.inner.memory_total_bytes,
        )
    }

    /// Disk transfer progress: (processed, remaining, total) bytes.
    pub fn disk_progress(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        (
            self.inner.disk_processed_bytes,
            self.inner.disk_remaining_bytes,
            self.inner.disk_total_bytes,
        )
    }

    /// Creation time.
    pub fn created_at(&self) -> &NaiveDateTime {
        &self.inner.created_at
    }

    /// Last update time.
    pub fn updated_at(&self) -> Option<&NaiveDateTime> {
        self.inner.updated_at.as_ref()
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use super::super::super::client::test::ready_client;
    use super::super::super::fakes::FakeTransport;
    use super::super::super::ErrorKind;
    use super::ServerMigrationManager;

    fn migration() -> serde_json::Value {
        json!({
            "created_at": "2016-01-29T13:42:02.000000",
            "dest_compute": "compute2",
            "dest_host": "1.2.3.4",
            "dest_node": "node2",
            "id": 1,
            "server_uuid": "4cfba335-03d8-49b2-8c52-e69043d1e8fe",
            "source_compute": "compute1",
            "source_node": "node1",
            "status": "running",
            "memory_total_bytes": 123456,
            "memory_processed_bytes": 12345,
            "memory_remaining_bytes": 120000,
            "disk_total_bytes": 234567,
            "disk_processed_bytes": 23456,
            "disk_remaining_bytes": 230000,
            "updated_at": "2016-01-29T13:42:02.000000"
        })
    }

    fn fake() -> FakeTransport {
        FakeTransport::new()
            .with_versions("http://nova-api:8774", "2.1", "2.40")
            .with_json(
                Method::GET,
                "/servers/1234/migrations",
                StatusCode::OK,
                json!({ "migrations": [migration()] }),
            )
            .with_json(
                Method::GET,
                "/servers/1234/migrations/1",
                StatusCode::OK,
                json!({ "migration": migration() }),
            )
            .with_empty(
                Method::DELETE,
                "/servers/1234/migrations/1",
                StatusCode::ACCEPTED,
            )
            .with_empty(
                Method::POST,
                "/servers/1234/migrations/1/action",
                StatusCode::ACCEPTED,
            )
    }

    #[test]
    fn test_list_and_get() {
        let fake = fake();
        let client = ready_client(&fake, "2.23");
        let manager = ServerMigrationManager::new(&client, String::from("1234"));
        let migrations = manager.list().unwrap();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].status(), "running");
        assert_eq!(
            migrations[0].memory_progress(),
            (Some(12345), Some(120000), Some(123456))
        );
        fake.assert_called(Method::GET, "/v2.1/servers/1234/migrations", None);

        let migration = manager.get(1).unwrap();
        assert_eq!(migration.id(), 1);
        assert_eq!(migration.dest_host().map(String::as_str), Some("1.2.3.4"));
        fake.assert_called(Method::GET, "/v2.1/servers/1234/migrations/1", None);
    }

    #[test]
    fn test_list_too_old() {
        let fake = fake();
        let client = ready_client(&fake, "2.22");
        let manager = ServerMigrationManager::new(&client, String::from("1234"));
        let err = manager.list().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoSubstitutionFound);
        assert!(fake.callstack().is_empty());
        // Forcing completion is available one version earlier.
        manager.force_complete(1).unwrap();
        fake.assert_called(
            Method::POST,
            "/v2.1/servers/1234/migrations/1/action",
            Some(json!({"force_complete": null})),
        );
    }

    #[test]
    fn test_abort() {
        let fake = fake();
        let client = ready_client(&fake, "2.23");
        let manager = ServerMigrationManager::new(&client, String::from("1234"));
        let err = manager.abort(1).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoSubstitutionFound);

        let client = ready_client(&fake, "2.24");
        let manager = ServerMigrationManager::new(&client, String::from("1234"));
        manager.abort(1).unwrap();
        fake.assert_called(Method::DELETE, "/v2.1/servers/1234/migrations/1", None);
    }
}

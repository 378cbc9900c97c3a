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

//! Compute API implementation bits.
//!
//! Operations whose request shape changed between microversions are routed
//! through a registry of version-scoped implementations, so the negotiated
//! version of the [Client](../struct.Client.html) decides what goes on the
//! wire.

mod flavors;
mod keypairs;
mod migrations;
mod protocol;
mod servers;
mod substitutions;

use super::client::Client;

pub use self::flavors::{Flavor, FlavorManager};
pub use self::keypairs::{KeyPair, KeyPairManager, KeyPairQuery, NewKeyPair};
pub use self::migrations::{Migration, ServerMigrationManager};
pub use self::protocol::{KeyPairType, ServerAddress, ServerFlavor, ServerStatus};
pub use self::servers::{LiveMigration, Server, ServerManager};
pub use self::substitutions::{MAX_KNOWN_VERSION, UNCHANGED_VERSIONS};

/// Manager for servers.
pub fn servers(client: &Client) -> ServerManager<'_> {
    ServerManager::new(client)
}

/// Manager for flavors.
pub fn flavors(client: &Client) -> FlavorManager<'_> {
    FlavorManager::new(client)
}

/// Manager for key pairs.
pub fn keypairs(client: &Client) -> KeyPairManager<'_> {
    KeyPairManager::new(client)
}

/// Manager for migrations of the given server.
pub fn server_migrations<Id: Into<String>>(client: &Client, server_id: Id) -> ServerMigrationManager<'_> {
    ServerMigrationManager::new(client, server_id.into())
}

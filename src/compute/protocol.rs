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

//! JSON structures and protocol bits for the Compute API.

#![allow(missing_docs)]

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::super::common::protocol::empty_as_default;

protocol_enum! {
    #[doc = "Possible server statuses."]
    enum ServerStatus = Unknown {
        Active = "ACTIVE",
        Building = "BUILD",
        Deleted = "DELETED",
        Error = "ERROR",
        HardRebooting = "HARD_REBOOT",
        Migrating = "MIGRATING",
        Paused = "PAUSED",
        Rebooting = "REBOOT",
        Resizing = "RESIZE",
        RevertingResize = "REVERT_RESIZE",
        ShutOff = "SHUTOFF",
        Suspended = "SUSPENDED",
        Rescuing = "RESCUE",
        Shelved = "SHELVED",
        ShelvedOffloaded = "SHELVED_OFFLOADED",
        SoftDeleted = "SOFT_DELETED",
        Unknown = "UNKNOWN",
        UpdatingPassword = "PASSWORD",
        VerifyingResize = "VERIFY_RESIZE"
    }
}

protocol_enum! {
    #[doc = "Type of a key pair."]
    enum KeyPairType = Ssh {
        Ssh = "ssh",
        X509 = "x509"
    }
}

/// Accept both numeric and string identifiers.
pub fn id_from_any<'de, D>(des: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(des)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Accept a reference object, an empty string or `null`.
fn ref_or_empty<'de, D>(des: D) -> Result<Option<Ref>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(des)? {
        Some(value @ Value::Object(..)) => {
            Some(serde_json::from_value(value).map_err(DeError::custom)?)
        }
        _ => None,
    })
}

/// Reference to another resource.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Ref {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
}

/// Flavor of a server: a reference before 2.47, an embedded copy after.
#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct ServerFlavor {
    #[serde(default, deserialize_with = "empty_as_default")]
    pub id: Option<Value>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub ram: Option<u64>,
    #[serde(default)]
    pub vcpus: Option<u32>,
    #[serde(default)]
    pub disk: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ServerAddress {
    pub addr: String,
    #[serde(default)]
    pub version: u8,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: ServerStatus,
    #[serde(default)]
    pub created: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub updated: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub addresses: HashMap<String, Vec<ServerAddress>>,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub flavor: ServerFlavor,
    #[serde(default, deserialize_with = "ref_or_empty")]
    pub image: Option<Ref>,
    #[serde(rename = "OS-EXT-SRV-ATTR:host", default)]
    pub host: Option<String>,
    #[serde(rename = "hostId", default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServersRoot {
    pub servers: Vec<Server>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerRoot {
    pub server: Server,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Flavor {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    pub ram: u64,
    #[serde(default)]
    pub vcpus: u32,
    pub disk: u64,
    #[serde(rename = "OS-FLV-EXT-DATA:ephemeral", default)]
    pub ephemeral: u64,
    #[serde(rename = "os-flavor-access:is_public", default = "default_true")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FlavorsRoot {
    pub flavors: Vec<Flavor>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FlavorRoot {
    pub flavor: Flavor,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KeyPair {
    pub name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(rename = "type", default)]
    pub key_type: Option<KeyPairType>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KeyPairRoot {
    pub keypair: KeyPair,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KeyPairsRoot {
    pub keypairs: Vec<KeyPairRoot>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Migration {
    pub id: u64,
    #[serde(default)]
    pub server_uuid: Option<String>,
    pub status: String,
    #[serde(default)]
    pub source_compute: Option<String>,
    #[serde(default)]
    pub source_node: Option<String>,
    #[serde(default)]
    pub dest_compute: Option<String>,
    #[serde(default)]
    pub dest_node: Option<String>,
    #[serde(default)]
    pub dest_host: Option<String>,
    #[serde(default)]
    pub memory_total_bytes: Option<u64>,
    #[serde(default)]
    pub memory_processed_bytes: Option<u64>,
    #[serde(default)]
    pub memory_remaining_bytes: Option<u64>,
    #[serde(default)]
    pub disk_total_bytes: Option<u64>,
    #[serde(default)]
    pub disk_processed_bytes: Option<u64>,
    #[serde(default)]
    pub disk_remaining_bytes: Option<u64>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MigrationsRoot {
    pub migrations: Vec<Migration>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MigrationRoot {
    pub migration: Migration,
}

#[inline]
fn default_true() -> bool {
    true
}

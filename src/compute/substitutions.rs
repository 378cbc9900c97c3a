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

//! Version-dependent request shapes of the Compute API.

use std::fmt;
use std::sync::OnceLock;

use serde_json::{json, Map, Value};

use super::super::common::ApiVersion;
use super::super::substitution::{SubstitutionTable, VersionRange};
use super::super::utils::Query;
use super::super::{Error, ErrorKind, Result};
use super::keypairs::{KeyPairQuery, NewKeyPair};
use super::servers::LiveMigration;

pub(crate) const LIVE_MIGRATE: &str = "servers.live_migrate";
pub(crate) const KEYPAIR_CREATE: &str = "keypairs.create";
pub(crate) const KEYPAIR_LIST: &str = "keypairs.list";
pub(crate) const MIGRATION_LIST: &str = "server_migrations.list";
pub(crate) const MIGRATION_GET: &str = "server_migrations.get";
pub(crate) const MIGRATION_ABORT: &str = "server_migrations.abort";
pub(crate) const MIGRATION_FORCE_COMPLETE: &str = "server_migrations.force_complete";

/// Highest microversion the registry was checked against.
pub const MAX_KNOWN_VERSION: ApiVersion = ApiVersion(2, 40);

/// Microversions up to `MAX_KNOWN_VERSION` that change nothing in the
/// operations supported here.
pub const UNCHANGED_VERSIONS: &[u16] = &[
    1, 3, 4, 5, 6, 7, 8, 9, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 26, 27, 28, 29, 31, 32,
    33, 34, 36, 37, 38, 39, 40,
];

type BodyBuilder<T> = fn(&T) -> Result<Value>;
type QueryBuilder<T> = fn(&T) -> Result<Query>;

/// Implementation handle stored in the registry.
#[derive(Clone, Copy)]
pub(crate) enum Shim {
    LiveMigrate(BodyBuilder<LiveMigration>),
    CreateKeyPair(BodyBuilder<NewKeyPair>),
    ListKeyPairs(QueryBuilder<KeyPairQuery>),
    /// The operation exists, its shape does not change.
    Available,
}

impl fmt::Debug for Shim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shim::LiveMigrate(..) => "LiveMigrate",
            Shim::CreateKeyPair(..) => "CreateKeyPair",
            Shim::ListKeyPairs(..) => "ListKeyPairs",
            Shim::Available => "Available",
        })
    }
}

fn since(minor: u16) -> VersionRange {
    VersionRange::since(ApiVersion(2, minor))
}

fn between(first: u16, last: u16) -> VersionRange {
    VersionRange::between(ApiVersion(2, first), ApiVersion(2, last))
}

fn build() -> SubstitutionTable<Shim> {
    let mut table = SubstitutionTable::new();
    let _ = table
        .register(LIVE_MIGRATE, between(0, 24), Shim::LiveMigrate(live_migrate_v20))
        .register(LIVE_MIGRATE, between(25, 29), Shim::LiveMigrate(live_migrate_v225))
        .register(LIVE_MIGRATE, since(30), Shim::LiveMigrate(live_migrate_v230))
        .register(KEYPAIR_CREATE, between(0, 1), Shim::CreateKeyPair(keypair_v20))
        .register(KEYPAIR_CREATE, since(2), Shim::CreateKeyPair(keypair_v22))
        .register(KEYPAIR_LIST, between(0, 9), Shim::ListKeyPairs(keypair_query_v20))
        .register(KEYPAIR_LIST, between(10, 34), Shim::ListKeyPairs(keypair_query_v210))
        .register(KEYPAIR_LIST, since(35), Shim::ListKeyPairs(keypair_query_v235))
        .register(MIGRATION_FORCE_COMPLETE, since(22), Shim::Available)
        .register(MIGRATION_LIST, since(23), Shim::Available)
        .register(MIGRATION_GET, since(23), Shim::Available)
        .register(MIGRATION_ABORT, since(24), Shim::Available);
    table
}

/// The registry, built on first use.
pub(crate) fn table() -> &'static SubstitutionTable<Shim> {
    static TABLE: OnceLock<SubstitutionTable<Shim>> = OnceLock::new();
    TABLE.get_or_init(build)
}

fn unexpected(name: &str, shim: &Shim) -> Error {
    Error::new(
        ErrorKind::NoSubstitutionFound,
        format!("{} is registered with an unexpected handler {:?}", name, shim),
    )
}

/// Check that an operation exists in the version.
pub(crate) fn require(name: &str, version: ApiVersion) -> Result<()> {
    table().resolve(name, version).map(|_| ())
}

pub(crate) fn live_migrate(version: ApiVersion) -> Result<BodyBuilder<LiveMigration>> {
    match table().resolve(LIVE_MIGRATE, version)? {
        Shim::LiveMigrate(f) => Ok(*f),
        other => Err(unexpected(LIVE_MIGRATE, other)),
    }
}

pub(crate) fn create_keypair(version: ApiVersion) -> Result<BodyBuilder<NewKeyPair>> {
    match table().resolve(KEYPAIR_CREATE, version)? {
        Shim::CreateKeyPair(f) => Ok(*f),
        other => Err(unexpected(KEYPAIR_CREATE, other)),
    }
}

pub(crate) fn list_keypairs(version: ApiVersion) -> Result<QueryBuilder<KeyPairQuery>> {
    match table().resolve(KEYPAIR_LIST, version)? {
        Shim::ListKeyPairs(f) => Ok(*f),
        other => Err(unexpected(KEYPAIR_LIST, other)),
    }
}

fn too_old(what: &str, minor: u16) -> Error {
    Error::new(
        ErrorKind::IncompatibleApiVersion,
        format!("{} requires API version 2.{} or newer", what, minor),
    )
}

fn live_migrate_v20(args: &LiveMigration) -> Result<Value> {
    if args.force {
        return Err(too_old("Forcing live migration", 30));
    }
    Ok(json!({"os-migrateLive": {
        "host": args.host,
        "block_migration": args.block_migration.unwrap_or(false),
        "disk_over_commit": false,
    }}))
}

fn live_migrate_v225(args: &LiveMigration) -> Result<Value> {
    if args.force {
        return Err(too_old("Forcing live migration", 30));
    }
    let block_migration = match args.block_migration {
        Some(value) => json!(value),
        None => json!("auto"),
    };
    Ok(json!({"os-migrateLive": {
        "host": args.host,
        "block_migration": block_migration,
    }}))
}

fn live_migrate_v230(args: &LiveMigration) -> Result<Value> {
    let mut body = live_migrate_v225(&LiveMigration {
        force: false,
        ..args.clone()
    })?;
    // Nova rejects forcing without a target host.
    if args.force {
        if args.host.is_none() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Forcing live migration requires a target host",
            ));
        }
        if let Some(inner) = body.get_mut("os-migrateLive").and_then(Value::as_object_mut) {
            let _ = inner.insert(String::from("force"), Value::Bool(true));
        }
    }
    Ok(body)
}

fn keypair_body(args: &NewKeyPair) -> Map<String, Value> {
    let mut keypair = Map::new();
    let _ = keypair.insert(String::from("name"), json!(args.name));
    if let Some(ref public_key) = args.public_key {
        let _ = keypair.insert(String::from("public_key"), json!(public_key));
    }
    keypair
}

fn keypair_v20(args: &NewKeyPair) -> Result<Value> {
    if args.key_type.is_some() {
        return Err(too_old("Key pair type", 2));
    }
    Ok(json!({ "keypair": keypair_body(args) }))
}

fn keypair_v22(args: &NewKeyPair) -> Result<Value> {
    let mut keypair = keypair_body(args);
    let key_type = args.key_type.unwrap_or_default();
    let _ = keypair.insert(String::from("type"), json!(key_type.as_str()));
    Ok(json!({ "keypair": keypair }))
}

fn keypair_query_v20(args: &KeyPairQuery) -> Result<Query> {
    if args.user_id.is_some() {
        return Err(too_old("Filtering key pairs by user", 10));
    }
    keypair_query_v210(args)
}

fn keypair_query_v210(args: &KeyPairQuery) -> Result<Query> {
    if args.limit.is_some() || args.marker.is_some() {
        return Err(too_old("Key pair pagination", 35));
    }
    let mut query = Query::new();
    query.push_opt("user_id", args.user_id.as_ref());
    Ok(query)
}

fn keypair_query_v235(args: &KeyPairQuery) -> Result<Query> {
    let mut query = Query::new();
    query.push_opt("user_id", args.user_id.as_ref());
    query.push_opt("limit", args.limit);
    query.push_opt("marker", args.marker.as_ref());
    Ok(query)
}

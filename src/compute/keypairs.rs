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

//! Key pair management via Compute API.

use chrono::NaiveDateTime;

use super::super::client::Client;
use super::super::utils::Query;
use super::super::Result;
use super::protocol::{self, KeyPairType};
use super::substitutions;

/// Key pair manager.
#[derive(Clone, Copy, Debug)]
pub struct KeyPairManager<'client> {
    client: &'client Client,
}

/// Structure representing a key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    inner: protocol::KeyPair,
}

/// A request to create or import a key pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewKeyPair {
    /// Key pair name.
    pub name: String,
    /// Public key to import, `None` to generate a new one.
    pub public_key: Option<String>,
    /// Key type (2.2+), `None` for the default.
    pub key_type: Option<KeyPairType>,
}

/// Filters for listing key pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPairQuery {
    /// Owner of key pairs (2.10+, admin only).
    pub user_id: Option<String>,
    /// Page size (2.35+).
    pub limit: Option<usize>,
    /// Name of the last key pair on the previous page (2.35+).
    pub marker: Option<String>,
}

impl NewKeyPair {
    /// Request to generate a key pair.
    pub fn new<S: Into<String>>(name: S) -> NewKeyPair {
        NewKeyPair {
            name: name.into(),
            public_key: None,
            key_type: None,
        }
    }

    /// Import an existing public key.
    pub fn with_public_key<S: Into<String>>(mut self, value: S) -> NewKeyPair {
        self.public_key = Some(value.into());
        self
    }

    /// Set the key type.
    pub fn with_key_type(mut self, value: KeyPairType) -> NewKeyPair {
        self.key_type = Some(value);
        self
    }
}

impl KeyPairQuery {
    /// Query without filters.
    pub fn new() -> KeyPairQuery {
        KeyPairQuery::default()
    }

    /// Filter by owner.
    pub fn with_user_id<S: Into<String>>(mut self, value: S) -> KeyPairQuery {
        self.user_id = Some(value.into());
        self
    }

    /// Limit the page size.
    pub fn with_limit(mut self, value: usize) -> KeyPairQuery {
        self.limit = Some(value);
        self
    }

    /// Start after the named key pair.
    pub fn with_marker<S: Into<String>>(mut self, value: S) -> KeyPairQuery {
        self.marker = Some(value.into());
        self
    }
}

impl<'client> KeyPairManager<'client> {
    pub(crate) fn new(client: &'client Client) -> KeyPairManager<'client> {
        KeyPairManager { client }
    }

    /// List key pairs.
    pub fn list(&self, query: &KeyPairQuery) -> Result<Vec<KeyPair>> {
        let builder = substitutions::list_keypairs(self.client.negotiated_version()?)?;
        let query = builder(query)?;
        let root: protocol::KeyPairsRoot = self.client.get_json("os-keypairs", &query)?;
        Ok(root
            .keypairs
            .into_iter()
            .map(|item| KeyPair {
                inner: item.keypair,
            })
            .collect())
    }

    /// Get a key pair by its name.
    pub fn get<Id: AsRef<str>>(&self, name: Id) -> Result<KeyPair> {
        let path = format!("os-keypairs/{}", name.as_ref());
        let root: protocol::KeyPairRoot = self.client.get_json(&path, &Query::new())?;
        Ok(KeyPair {
            inner: root.keypair,
        })
    }

    /// Create or import a key pair.
    ///
    /// A generated private key is only available in the result.
    pub fn create(&self, request: &NewKeyPair) -> Result<KeyPair> {
        let builder = substitutions::create_keypair(self.client.negotiated_version()?)?;
        let body = builder(request)?;
        debug!("Creating a key pair {}", request.name);
        let root: protocol::KeyPairRoot = self.client.post("os-keypairs", &body)?.json()?;
        Ok(KeyPair {
            inner: root.keypair,
        })
    }

    /// Delete a key pair.
    pub fn delete<Id: AsRef<str>>(&self, name: Id) -> Result<()> {
        debug!("Deleting key pair {}", name.as_ref());
        self.client
            .delete(&format!("os-keypairs/{}", name.as_ref()))
    }
}

impl KeyPair {
    /// Key pair name.
    pub fn name(&self) -> &String {
        &self.inner.name
    }

    /// Public key.
    pub fn public_key(&self) -> &String {
        &self.inner.public_key
    }

    /// Key fingerprint.
    pub fn fingerprint(&self) -> &String {
        &self.inner.fingerprint
    }

    /// Key type, reported starting with 2.2.
    pub fn key_type(&self) -> Option<KeyPairType> {
        self.inner.key_type
    }

    /// Owner (if reported).
    pub fn user_id(&self) -> Option<&String> {
        self.inner.user_id.as_ref()
    }

    /// Generated private key, only present right after creation.
    pub fn private_key(&self) -> Option<&String> {
        self.inner.private_key.as_ref()
    }

    /// Creation time (if reported).
    pub fn created_at(&self) -> Option<&NaiveDateTime> {
        self.inner.created_at.as_ref()
    }
}

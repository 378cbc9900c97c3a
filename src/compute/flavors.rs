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

//! Flavor management via Compute API.

use super::super::client::Client;
use super::super::utils::Query;
use super::super::Result;
use super::protocol;

/// Flavor manager.
#[derive(Clone, Copy, Debug)]
pub struct FlavorManager<'client> {
    client: &'client Client,
}

/// Structure representing a flavor.
#[derive(Clone, Debug)]
pub struct Flavor {
    inner: protocol::Flavor,
}

impl<'client> FlavorManager<'client> {
    pub(crate) fn new(client: &'client Client) -> FlavorManager<'client> {
        FlavorManager { client }
    }

    /// List flavors with details.
    pub fn list(&self) -> Result<Vec<Flavor>> {
        let root: protocol::FlavorsRoot = self.client.get_json("flavors/detail", &Query::new())?;
        Ok(root
            .flavors
            .into_iter()
            .map(|inner| Flavor { inner })
            .collect())
    }

    /// Get a flavor by its ID.
    pub fn get<Id: AsRef<str>>(&self, id: Id) -> Result<Flavor> {
        let path = format!("flavors/{}", id.as_ref());
        let root: protocol::FlavorRoot = self.client.get_json(&path, &Query::new())?;
        Ok(Flavor { inner: root.flavor })
    }
}

impl Flavor {
    /// Flavor ID.
    pub fn id(&self) -> &String {
        &self.inner.id
    }

    /// Flavor name.
    pub fn name(&self) -> &String {
        &self.inner.name
    }

    /// RAM size in MiB.
    pub fn ram_size(&self) -> u64 {
        self.inner.ram
    }

    /// VCPU count.
    pub fn vcpu_count(&self) -> u32 {
        self.inner.vcpus
    }

    /// Root disk size in GiB.
    pub fn root_size(&self) -> u64 {
        self.inner.disk
    }

    /// Ephemeral disk size in GiB.
    pub fn ephemeral_size(&self) -> u64 {
        self.inner.ephemeral
    }

    /// Whether the flavor is public.
    pub fn is_public(&self) -> bool {
        self.inner.is_public
    }

    /// Description, reported starting with 2.55.
    pub fn description(&self) -> Option<&String> {
        self.inner.description.as_ref()
    }
}

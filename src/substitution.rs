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

//! Version-scoped implementations of API operations.
//!
//! A [SubstitutionTable](struct.SubstitutionTable.html) maps an operation
//! name to a list of implementations, each valid for a range of API versions.
//! Entries are checked in the order of registration and the first one whose
//! range contains the version wins, even if a later entry is more specific.
//!
//! ```rust
//! use novaclient::{ApiVersion, SubstitutionTable, VersionRange};
//!
//! let mut table = SubstitutionTable::new();
//! table.register("keypair-create", VersionRange::between(ApiVersion(2, 0), ApiVersion(2, 1)), 1)
//!     .register("keypair-create", VersionRange::since(ApiVersion(2, 2)), 2);
//!
//! assert_eq!(*table.resolve("keypair-create", ApiVersion(2, 1)).unwrap(), 1);
//! assert_eq!(*table.resolve("keypair-create", ApiVersion(2, 35)).unwrap(), 2);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::common::ApiVersion;
use super::{Error, ErrorKind, Result};

/// Inclusive range of API versions, optionally unbounded from above.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionRange {
    start: ApiVersion,
    end: Option<ApiVersion>,
}

/// A single registered implementation.
#[derive(Clone, Debug)]
pub struct Substitution<T> {
    range: VersionRange,
    implementation: T,
}

/// Registry of version-scoped implementations keyed by operation name.
#[derive(Clone, Debug)]
pub struct SubstitutionTable<T> {
    entries: HashMap<String, Vec<Substitution<T>>>,
}

impl VersionRange {
    /// Create a range, failing if `start` is above `end`.
    pub fn new(start: ApiVersion, end: Option<ApiVersion>) -> Result<VersionRange> {
        match end {
            Some(end) if end < start => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid version range: {} is above {}", start, end),
            )),
            _ => Ok(VersionRange { start, end }),
        }
    }

    /// Range without an upper bound.
    #[inline]
    pub fn since(start: ApiVersion) -> VersionRange {
        VersionRange { start, end: None }
    }

    /// Bounded range.
    ///
    /// Panics if `start` is above `end`, use [new](#method.new) for
    /// untrusted input.
    pub fn between(start: ApiVersion, end: ApiVersion) -> VersionRange {
        assert!(start <= end, "{} is above {}", start, end);
        VersionRange {
            start,
            end: Some(end),
        }
    }

    /// First version in the range.
    #[inline]
    pub fn start(&self) -> ApiVersion {
        self.start
    }

    /// Last version in the range (if bounded).
    #[inline]
    pub fn end(&self) -> Option<ApiVersion> {
        self.end
    }

    /// Whether the version belongs to this range.
    pub fn contains(&self, version: ApiVersion) -> bool {
        version >= self.start && self.end.map(|end| version <= end).unwrap_or(true)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} - {}", self.start, end),
            None => write!(f, "{} - latest", self.start),
        }
    }
}

impl<T> Substitution<T> {
    /// Versions this implementation is valid for.
    #[inline]
    pub fn range(&self) -> VersionRange {
        self.range
    }
}

impl<T> SubstitutionTable<T> {
    /// Create an empty table.
    pub fn new() -> SubstitutionTable<T> {
        SubstitutionTable {
            entries: HashMap::new(),
        }
    }

    /// Append an implementation of the named operation.
    pub fn register<S: Into<String>>(
        &mut self,
        name: S,
        range: VersionRange,
        implementation: T,
    ) -> &mut SubstitutionTable<T> {
        let name = name.into();
        trace!("Registering {} for API versions {}", name, range);
        self.entries
            .entry(name)
            .or_default()
            .push(Substitution {
                range,
                implementation,
            });
        self
    }

    /// Find the first implementation of the operation valid for the version.
    pub fn resolve(&self, name: &str, version: ApiVersion) -> Result<&T> {
        self.entries
            .get(name)
            .and_then(|subs| subs.iter().find(|sub| sub.range.contains(version)))
            .map(|sub| &sub.implementation)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::NoSubstitutionFound,
                    format!("{} is not available in API version {}", name, version),
                )
            })
    }

    /// All registered implementations of an operation, in registration order.
    pub fn substitutions(&self, name: &str) -> &[Substitution<T>] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of all registered operations.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Minor versions at which some operation changes, for the major version.
    pub fn covered_minor_versions(&self, major: u16) -> BTreeSet<u16> {
        self.entries
            .values()
            .flatten()
            .map(|sub| sub.range.start)
            .filter(|start| start.0 == major)
            .map(|start| start.1)
            .collect()
    }
}

impl<T> Default for SubstitutionTable<T> {
    fn default() -> SubstitutionTable<T> {
        SubstitutionTable::new()
    }
}

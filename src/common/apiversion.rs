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

//! ApiVersion implementation.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::{Error as DeserError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::super::{Error, ErrorKind, Result};

/// The only major version of the Compute API still served.
pub const MAJOR_VERSION: u16 = 2;

/// Lowest stable microversion, used when nothing was requested.
pub const DEFAULT_VERSION: ApiVersion = ApiVersion(2, 1);

/// Version used by servers without microversion support.
pub const LEGACY_VERSION: ApiVersion = ApiVersion(2, 0);

/// API version (major, minor).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ApiVersion(pub u16, pub u16);

/// Requested API version: either a concrete one or the newest available.
///
/// `Latest` compares greater than any concrete version.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersionRequest {
    /// Exactly this version.
    Exact(ApiVersion),
    /// The maximum version supported by the server.
    Latest,
}

impl ApiVersion {
    /// Major version component.
    #[inline]
    pub fn major(&self) -> u16 {
        self.0
    }

    /// Minor version component.
    #[inline]
    pub fn minor(&self) -> u16 {
        self.1
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

fn parse_component(component: &str, value: &str) -> Result<u16> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        let msg = format!("Invalid API version: expected X.Y, got {}", value);
        return Err(Error::new(ErrorKind::InvalidVersion, msg));
    }

    component.parse().map_err(|_| {
        Error::new(
            ErrorKind::InvalidVersion,
            format!("Version component out of range in {}", value),
        )
    })
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<ApiVersion> {
        let parts: Vec<&str> = s.split('.').collect();

        if parts.len() != 2 {
            let msg = format!("Invalid API version: expected X.Y, got {}", s);
            return Err(Error::new(ErrorKind::InvalidVersion, msg));
        }

        let major = parse_component(parts[0], s)?;
        let minor = parse_component(parts[1], s)?;

        Ok(ApiVersion(major, minor))
    }
}

impl ApiVersionRequest {
    /// Whether this is the `latest` sentinel.
    #[inline]
    pub fn is_latest(&self) -> bool {
        matches!(*self, ApiVersionRequest::Latest)
    }

    /// Parse the loose syntax accepted on the command line.
    ///
    /// Accepts `X`, `X.Y`, `latest` and `X.latest`. A major-only version
    /// means `X.0`, `1.1` is an alias for `2.0`. Only the major version 2
    /// is supported.
    pub fn from_user_input(s: &str) -> Result<ApiVersionRequest> {
        let s = s.trim();
        if s == "latest" {
            return Ok(ApiVersionRequest::Latest);
        }

        if s == "1.1" {
            warn!("Compute API version 1.1 is deprecated, using 2.0 instead");
            return Ok(ApiVersionRequest::Exact(LEGACY_VERSION));
        }

        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (s, None),
        };

        let major = parse_component(major, s)?;
        if major != MAJOR_VERSION {
            return Err(Error::new(
                ErrorKind::IncompatibleApiVersion,
                format!(
                    "Compute API version {} is not supported, only {}.x is",
                    s, MAJOR_VERSION
                ),
            ));
        }

        match minor {
            Some("latest") => Ok(ApiVersionRequest::Latest),
            Some(minor) => Ok(ApiVersionRequest::Exact(ApiVersion(
                major,
                parse_component(minor, s)?,
            ))),
            None => Ok(ApiVersionRequest::Exact(ApiVersion(major, 0))),
        }
    }
}

impl From<ApiVersion> for ApiVersionRequest {
    fn from(value: ApiVersion) -> ApiVersionRequest {
        ApiVersionRequest::Exact(value)
    }
}

impl fmt::Display for ApiVersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ApiVersionRequest::Exact(ref ver) => ver.fmt(f),
            ApiVersionRequest::Latest => f.write_str("latest"),
        }
    }
}

impl FromStr for ApiVersionRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<ApiVersionRequest> {
        if s == "latest" {
            Ok(ApiVersionRequest::Latest)
        } else {
            ApiVersion::from_str(s).map(ApiVersionRequest::Exact)
        }
    }
}

impl PartialOrd for ApiVersionRequest {
    fn partial_cmp(&self, other: &ApiVersionRequest) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersionRequest {
    fn cmp(&self, other: &ApiVersionRequest) -> Ordering {
        match (self, other) {
            (ApiVersionRequest::Latest, ApiVersionRequest::Latest) => Ordering::Equal,
            (ApiVersionRequest::Latest, _) => Ordering::Greater,
            (_, ApiVersionRequest::Latest) => Ordering::Less,
            (ApiVersionRequest::Exact(a), ApiVersionRequest::Exact(b)) => a.cmp(b),
        }
    }
}

impl Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for ApiVersionRequest {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct ApiVersionVisitor;

impl<'de> Visitor<'de> for ApiVersionVisitor {
    type Value = ApiVersion;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string in format X.Y")
    }

    fn visit_str<E>(self, value: &str) -> ::std::result::Result<ApiVersion, E>
    where
        E: DeserError,
    {
        ApiVersion::from_str(value).map_err(DeserError::custom)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<ApiVersion, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ApiVersionVisitor)
    }
}

struct ApiVersionRequestVisitor;

impl<'de> Visitor<'de> for ApiVersionRequestVisitor {
    type Value = ApiVersionRequest;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string in format X.Y or \"latest\"")
    }

    fn visit_str<E>(self, value: &str) -> ::std::result::Result<ApiVersionRequest, E>
    where
        E: DeserError,
    {
        ApiVersionRequest::from_str(value).map_err(DeserError::custom)
    }
}

impl<'de> Deserialize<'de> for ApiVersionRequest {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<ApiVersionRequest, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ApiVersionRequestVisitor)
    }
}

#[cfg(test)]
pub mod test {
    use std::str::FromStr;

    use super::super::super::ErrorKind;
    use super::{ApiVersion, ApiVersionRequest};

    #[test]
    fn test_apiversion_format() {
        let ver = ApiVersion(2, 27);
        assert_eq!(&ver.to_string(), "2.27");
        assert_eq!(ApiVersion::from_str("2.27").unwrap(), ver);
    }

    #[test]
    fn test_apiversion_roundtrip() {
        for s in &["2.0", "2.1", "2.40", "10.999"] {
            let ver = ApiVersion::from_str(s).unwrap();
            assert_eq!(ApiVersion::from_str(&ver.to_string()).unwrap(), ver);
        }
    }

    #[test]
    fn test_apiversion_invalid() {
        for s in &["2", "", "2.", ".1", "2.1.1", "a.b", "2.x", "-1.2", "2.+1"] {
            let err = ApiVersion::from_str(s).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::InvalidVersion, "{}", s);
        }
    }

    #[test]
    fn test_apiversion_ordering() {
        assert!(ApiVersion(2, 9) < ApiVersion(2, 10));
        assert!(ApiVersion(2, 40) < ApiVersion(3, 0));
        assert_eq!(ApiVersion(2, 1), ApiVersion(2, 1));
    }

    #[test]
    fn test_apiversion_serde() {
        let ver = ApiVersion(2, 27);
        let ser = serde_json::to_string(&ver).unwrap();
        assert_eq!(&ser, "\"2.27\"");
        assert_eq!(serde_json::from_str::<ApiVersion>(&ser).unwrap(), ver);
        assert!(serde_json::from_str::<ApiVersion>("\"2\"").is_err());
    }

    #[test]
    fn test_request_latest() {
        let latest = ApiVersionRequest::from_str("latest").unwrap();
        assert!(latest.is_latest());
        assert_eq!(&latest.to_string(), "latest");
        assert!(latest > ApiVersionRequest::Exact(ApiVersion(2, 9999)));
        assert_eq!(latest, ApiVersionRequest::Latest);
        assert_eq!(
            latest.cmp(&ApiVersionRequest::Latest),
            ::std::cmp::Ordering::Equal
        );
        assert!(ApiVersionRequest::Exact(ApiVersion(2, 1)) < ApiVersionRequest::from(ApiVersion(2, 2)));
    }

    #[test]
    fn test_request_serde() {
        let req: ApiVersionRequest = serde_json::from_str("\"latest\"").unwrap();
        assert!(req.is_latest());
        let req: ApiVersionRequest = serde_json::from_str("\"2.30\"").unwrap();
        assert_eq!(req, ApiVersionRequest::Exact(ApiVersion(2, 30)));
        assert_eq!(serde_json::to_string(&req).unwrap(), "\"2.30\"");
    }

    #[test]
    fn test_user_input() {
        assert_eq!(
            ApiVersionRequest::from_user_input("2").unwrap(),
            ApiVersionRequest::Exact(ApiVersion(2, 0))
        );
        assert_eq!(
            ApiVersionRequest::from_user_input("1.1").unwrap(),
            ApiVersionRequest::Exact(ApiVersion(2, 0))
        );
        assert_eq!(
            ApiVersionRequest::from_user_input("2.35").unwrap(),
            ApiVersionRequest::Exact(ApiVersion(2, 35))
        );
        assert!(ApiVersionRequest::from_user_input("latest")
            .unwrap()
            .is_latest());
        assert!(ApiVersionRequest::from_user_input("2.latest")
            .unwrap()
            .is_latest());
    }

    #[test]
    fn test_user_input_unsupported() {
        for s in &["0", "3", "3.1", "1.2"] {
            let err = ApiVersionRequest::from_user_input(s).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion, "{}", s);
        }
        let err = ApiVersionRequest::from_user_input("two").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidVersion);
        let err = ApiVersionRequest::from_user_input("2.x").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidVersion);
    }
}

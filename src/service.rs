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

//! Service discovery and API version negotiation.

use reqwest::Url;

use super::common::protocol::{Version, VersionRoot, VersionsRoot};
use super::common::{ApiVersion, ApiVersionRequest, DEFAULT_VERSION, LEGACY_VERSION};
use super::{Error, ErrorKind, Result};

/// Identifier of the microversioned Compute API in the versions document.
pub const VERSION_ID: &str = "v2.1";

/// Information about API endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Root endpoint.
    pub root_url: Url,
    /// Current API version (if supported).
    pub current_version: Option<ApiVersion>,
    /// Minimum API version (if supported).
    pub minimum_version: Option<ApiVersion>,
}

/// Result of a successful negotiation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NegotiatedSession {
    /// Version asked for by the caller (if any).
    pub requested: Option<ApiVersionRequest>,
    /// Minimum version supported by the server.
    pub server_min: ApiVersion,
    /// Maximum version supported by the server.
    pub server_max: ApiVersion,
    /// Version that will be sent with every request.
    pub resolved: ApiVersion,
}

/// Pick a concrete API version out of the server range.
///
/// Without a request the lowest stable version is used. `Latest` resolves to
/// `server_max` only when `allow_latest` is set.
pub fn negotiate(
    requested: Option<ApiVersionRequest>,
    server_min: ApiVersion,
    server_max: ApiVersion,
    allow_latest: bool,
) -> Result<ApiVersion> {
    let candidate = match requested {
        None => DEFAULT_VERSION,
        Some(ApiVersionRequest::Exact(version)) => version,
        Some(ApiVersionRequest::Latest) if allow_latest => server_max,
        Some(ApiVersionRequest::Latest) => {
            return Err(Error::new(
                ErrorKind::IncompatibleApiVersion,
                "API version 'latest' was requested without enabling \
                 dynamic negotiation",
            ));
        }
    };

    if candidate < server_min || candidate > server_max {
        return Err(Error::new(
            ErrorKind::IncompatibleApiVersion,
            format!(
                "API version {} is not supported by the server, supported \
                 range is {} - {}",
                candidate, server_min, server_max
            ),
        ));
    }

    Ok(candidate)
}

impl ServiceInfo {
    /// Supported version range, treating a non-microversioned server as 2.0.
    pub fn version_range(&self) -> (ApiVersion, ApiVersion) {
        match (self.minimum_version, self.current_version) {
            (Some(min), Some(max)) => (min, max),
            (None, Some(max)) => (max, max),
            (Some(min), None) => (min, min),
            (None, None) => (LEGACY_VERSION, LEGACY_VERSION),
        }
    }

    /// Whether the server supports microversions at all.
    #[inline]
    pub fn supports_microversions(&self) -> bool {
        self.current_version.is_some()
    }

    /// Negotiate an API version against this service.
    pub fn negotiate(
        &self,
        requested: Option<ApiVersionRequest>,
        allow_latest: bool,
    ) -> Result<NegotiatedSession> {
        let (server_min, server_max) = self.version_range();
        // A legacy server cannot serve the default microversion.
        let effective = match requested {
            None if !self.supports_microversions() => Some(LEGACY_VERSION.into()),
            other => other,
        };
        let resolved = negotiate(effective, server_min, server_max, allow_latest)?;
        info!(
            "Negotiated compute API version {} (requested {}, server supports {} - {})",
            resolved,
            requested
                .map(|r| r.to_string())
                .unwrap_or_else(|| String::from("default")),
            server_min,
            server_max
        );
        Ok(NegotiatedSession {
            requested,
            server_min,
            server_max,
            resolved,
        })
    }
}

impl Version {
    /// Convert a version record into service information.
    pub fn into_service_info(self) -> Result<ServiceInfo> {
        let current_version = if self.version.is_empty() {
            None
        } else {
            Some(self.version.parse()?)
        };

        let minimum_version = if self.min_version.is_empty() {
            None
        } else {
            Some(self.min_version.parse()?)
        };

        let endpoint = match self.links.iter().find(|x| x.rel == "self") {
            Some(link) => Url::parse(&link.href)
                .map_err(|e| Error::new(ErrorKind::InvalidResponse, e.to_string()))?,
            None => {
                let msg = format!("No link to self in version, only {:?}", self.links);
                return Err(Error::new(ErrorKind::InvalidResponse, msg));
            }
        };

        Ok(ServiceInfo {
            root_url: endpoint,
            current_version,
            minimum_version,
        })
    }
}

/// Extract service information from a version document.
///
/// The document may be either a versioned one (`{"version": ...}`) or a root
/// one (`{"versions": [...]}`).
pub fn extract_info(body: &serde_json::Value, secure: bool) -> Result<ServiceInfo> {
    // First, assume it's a versioned URL.
    let mut info = match serde_json::from_value::<VersionRoot>(body.clone()) {
        Ok(ver) => ver.version.into_service_info()?,
        Err(..) => {
            // Second, assume it's a root URL.
            let vers: VersionsRoot = serde_json::from_value(body.clone())?;
            match vers.versions.into_iter().find(|x| x.id == VERSION_ID) {
                Some(ver) => ver.into_service_info()?,
                None => return Err(Error::new_endpoint_not_found("compute")),
            }
        }
    };

    // Nova returns insecure URLs even for secure protocol.
    if secure && info.root_url.scheme() == "http" {
        let _ = info.root_url.set_scheme("https");
    }

    Ok(info)
}

#[cfg(test)]
pub mod test {
    use reqwest::Url;
    use serde_json::json;

    use super::super::common::{ApiVersion, ApiVersionRequest};
    use super::super::ErrorKind;
    use super::{extract_info, negotiate, ServiceInfo};

    fn service_info(min: Option<u16>, max: Option<u16>) -> ServiceInfo {
        ServiceInfo {
            root_url: Url::parse("http://127.0.0.1").unwrap(),
            minimum_version: min.map(|x| ApiVersion(2, x)),
            current_version: max.map(|x| ApiVersion(2, x)),
        }
    }

    const MIN: ApiVersion = ApiVersion(2, 1);
    const MAX: ApiVersion = ApiVersion(2, 40);

    #[test]
    fn test_negotiate_exact() {
        let result = negotiate(Some(ApiVersion(2, 30).into()), MIN, MAX, false).unwrap();
        assert_eq!(result, ApiVersion(2, 30));
    }

    #[test]
    fn test_negotiate_exact_mismatch() {
        let err = negotiate(Some(ApiVersion(2, 50).into()), MIN, MAX, false)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
        let err = negotiate(Some(ApiVersion(2, 0).into()), MIN, MAX, true)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
    }

    #[test]
    fn test_negotiate_closed_interval() {
        for minor in 0..60 {
            let version = ApiVersion(2, minor);
            let result = negotiate(Some(version.into()), MIN, MAX, false);
            if (1..=40).contains(&minor) {
                assert_eq!(result.unwrap(), version);
            } else {
                assert!(result.is_err(), "{} accepted", version);
            }
        }
    }

    #[test]
    fn test_negotiate_default() {
        assert_eq!(negotiate(None, MIN, MAX, false).unwrap(), ApiVersion(2, 1));
        let err = negotiate(None, ApiVersion(2, 5), MAX, false).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
    }

    #[test]
    fn test_negotiate_latest() {
        let err = negotiate(Some(ApiVersionRequest::Latest), MIN, MAX, false)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
        let result = negotiate(Some(ApiVersionRequest::Latest), MIN, MAX, true).unwrap();
        assert_eq!(result, MAX);
    }

    #[test]
    fn test_service_info_negotiate() {
        let info = service_info(Some(1), Some(40));
        let session = info
            .negotiate(Some(ApiVersion(2, 30).into()), false)
            .unwrap();
        assert_eq!(session.resolved, ApiVersion(2, 30));
        assert_eq!(session.server_min, MIN);
        assert_eq!(session.server_max, MAX);
        assert_eq!(session.requested, Some(ApiVersion(2, 30).into()));
    }

    #[test]
    fn test_service_info_legacy() {
        let info = service_info(None, None);
        assert!(!info.supports_microversions());
        let session = info.negotiate(None, false).unwrap();
        assert_eq!(session.resolved, ApiVersion(2, 0));
        let err = info
            .negotiate(Some(ApiVersion(2, 1).into()), false)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
    }

    #[test]
    fn test_service_info_current_only() {
        let info = service_info(None, Some(24));
        assert_eq!(info.version_range(), (ApiVersion(2, 24), ApiVersion(2, 24)));
    }

    #[test]
    fn test_extract_info_root() {
        let body = json!({
            "versions": [
                {"status": "SUPPORTED", "updated": "2011-01-21T11:33:21Z",
                 "links": [{"href": "http://nova-api:8774/v2/", "rel": "self"}],
                 "min_version": "", "version": "", "id": "v2.0"},
                {"status": "CURRENT", "updated": "2013-07-23T11:33:21Z",
                 "links": [{"href": "http://nova-api:8774/v2.1/", "rel": "self"}],
                 "min_version": "2.1", "version": "2.40", "id": "v2.1"}
            ]
        });
        let info = extract_info(&body, true).unwrap();
        assert_eq!(info.root_url.as_str(), "https://nova-api:8774/v2.1/");
        assert_eq!(info.minimum_version, Some(MIN));
        assert_eq!(info.current_version, Some(MAX));
    }

    #[test]
    fn test_extract_info_versioned_legacy() {
        let body = json!({
            "version": {
                "status": "SUPPORTED", "updated": "2011-01-21T11:33:21Z",
                "links": [{"href": "http://nova-api:8774/v2/", "rel": "self"}],
                "min_version": "", "version": "", "id": "v2.0"
            }
        });
        let info = extract_info(&body, false).unwrap();
        assert_eq!(info.root_url.as_str(), "http://nova-api:8774/v2/");
        assert!(info.minimum_version.is_none());
        assert!(info.current_version.is_none());
    }

    #[test]
    fn test_extract_info_missing() {
        let body = json!({"versions": []});
        let err = extract_info(&body, false).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::EndpointNotFound);
    }
}

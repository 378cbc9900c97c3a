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

//! Client configuration: environment and `clouds.yaml` support.

use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::auth::{AuthProvider, NoAuth, Token};
use super::common::ApiVersionRequest;
use super::{Error, ErrorKind, Result};

/// Default service type in the catalog.
pub const DEFAULT_SERVICE_TYPE: &str = "compute";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Requested API version: `2`, `2.X`, `latest` or nothing.
    pub api_version: Option<String>,
    /// Whether `latest` may be negotiated to the server maximum.
    pub allow_latest: bool,
    /// Service type to look up in the catalog.
    pub service_type: String,
    /// Endpoint interface (public, internal or admin).
    pub endpoint_interface: Option<String>,
    /// Region of the endpoint.
    pub region_name: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<u64>,
    /// Whether to record request timings.
    pub timings: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            api_version: None,
            allow_latest: false,
            service_type: String::from(DEFAULT_SERVICE_TYPE),
            endpoint_interface: None,
            region_name: None,
            timeout: None,
            timings: false,
        }
    }
}

fn invalid_config<S: Into<String>>(message: S) -> Error {
    Error::new(ErrorKind::InvalidConfig, message)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|x| !x.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_config(format!(
            "{} must be a boolean, got {}",
            name, value
        ))),
    }
}

impl Config {
    /// Configuration with default values.
    pub fn new() -> Config {
        Config::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Recognizes `OS_COMPUTE_API_VERSION`, `NOVA_SERVICE_TYPE`,
    /// `OS_INTERFACE`, `OS_REGION_NAME` and `NOVACLIENT_TIMINGS`.
    pub fn from_env() -> Result<Config> {
        let mut config = Config {
            api_version: non_empty_var("OS_COMPUTE_API_VERSION"),
            endpoint_interface: non_empty_var("OS_INTERFACE"),
            region_name: non_empty_var("OS_REGION_NAME"),
            ..Config::default()
        };
        if let Some(value) = non_empty_var("NOVA_SERVICE_TYPE") {
            config.service_type = value;
        }
        if let Some(value) = non_empty_var("NOVACLIENT_TIMINGS") {
            config.timings = parse_bool("NOVACLIENT_TIMINGS", &value)?;
        }
        // Validate early so that a typo fails before any network access.
        let _ = config.requested_version()?;
        Ok(config)
    }

    /// Set the requested API version.
    pub fn with_api_version<S: Into<String>>(mut self, value: S) -> Config {
        self.api_version = Some(value.into());
        self
    }

    /// Allow negotiating `latest` to the server maximum.
    pub fn with_latest_allowed(mut self, value: bool) -> Config {
        self.allow_latest = value;
        self
    }

    /// Set the catalog service type.
    pub fn with_service_type<S: Into<String>>(mut self, value: S) -> Config {
        self.service_type = value.into();
        self
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout(mut self, value: u64) -> Config {
        self.timeout = Some(value);
        self
    }

    /// Enable or disable request timings.
    pub fn with_timings(mut self, value: bool) -> Config {
        self.timings = value;
        self
    }

    /// Parsed requested version.
    pub fn requested_version(&self) -> Result<Option<ApiVersionRequest>> {
        match self.api_version {
            Some(ref value) => ApiVersionRequest::from_user_input(value).map(Some),
            None => Ok(None),
        }
    }

    /// Request timeout.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CloudAuth {
    endpoint: String,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Cloud {
    auth: CloudAuth,
    #[serde(default)]
    compute_api_version: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    interface: Option<String>,
    #[serde(default)]
    compute_service_type: Option<String>,
    #[serde(default)]
    api_timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct Root {
    clouds: HashMap<String, Cloud>,
}

fn find_config() -> Option<PathBuf> {
    let current = Path::new("./clouds.yaml");
    if current.is_file() {
        match current.canonicalize() {
            Ok(val) => return Some(val),
            Err(e) => warn!("Cannot canonicalize {:?}: {}", current, e),
        }
    }

    if let Some(mut home) = dirs::home_dir() {
        home.push(".config/openstack/clouds.yaml");
        if home.is_file() {
            return Some(home);
        }
    } else {
        warn!("Cannot find home directory");
    }

    let abs = PathBuf::from("/etc/openstack/clouds.yaml");
    if abs.is_file() {
        Some(abs)
    } else {
        None
    }
}

/// Load a named cloud from a `clouds.yaml` document.
pub fn load_cloud<R: Read>(
    reader: R,
    cloud_name: &str,
) -> Result<(Config, Box<dyn AuthProvider>)> {
    let mut clouds: Root = serde_yaml::from_reader(reader)
        .map_err(|e| invalid_config(format!("Cannot parse clouds.yaml: {}", e)))?;

    let cloud = clouds
        .clouds
        .remove(cloud_name)
        .ok_or_else(|| invalid_config(format!("No such cloud: {}", cloud_name)))?;

    let mut config = Config {
        api_version: cloud.compute_api_version,
        region_name: cloud.region_name,
        endpoint_interface: cloud.interface,
        timeout: cloud.api_timeout,
        ..Config::default()
    };
    if let Some(service_type) = cloud.compute_service_type {
        config.service_type = service_type;
    }
    let _ = config.requested_version()?;

    let auth: Box<dyn AuthProvider> = match cloud.auth.token {
        Some(token) => Box::new(Token::new(&cloud.auth.endpoint, token)?),
        None => Box::new(NoAuth::new(&cloud.auth.endpoint)?),
    };
    debug!("Loaded cloud {} with endpoint {}", cloud_name, cloud.auth.endpoint);

    Ok((config, auth))
}

/// Load a named cloud from the first `clouds.yaml` found.
///
/// Looks in the current directory, `~/.config/openstack` and
/// `/etc/openstack`.
pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<(Config, Box<dyn AuthProvider>)> {
    let path =
        find_config().ok_or_else(|| invalid_config("clouds.yaml was not found in any location"))?;
    let file = File::open(&path)
        .map_err(|e| invalid_config(format!("Cannot read {}: {}", path.display(), e)))?;
    load_cloud(file, cloud_name.as_ref())
}

#[cfg(test)]
pub mod test {
    use super::super::common::{ApiVersion, ApiVersionRequest};
    use super::super::ErrorKind;
    use super::{load_cloud, Config};

    const CLOUDS: &str = r#"
clouds:
  devstack:
    auth:
      endpoint: http://nova-api:8774/v2.1
      token: abcdef
    compute_api_version: "2.30"
    region_name: RegionOne
    api_timeout: 30
  standalone:
    auth:
      endpoint: http://127.0.0.1:8774
  broken:
    auth:
      endpoint: http://127.0.0.1:8774
    compute_api_version: "3.1"
"#;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.service_type, "compute");
        assert!(!config.allow_latest);
        assert!(config.requested_version().unwrap().is_none());
        assert!(config.timeout_duration().is_none());
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_api_version("latest")
            .with_latest_allowed(true)
            .with_service_type("compute_legacy")
            .with_timeout(10)
            .with_timings(true);
        assert_eq!(
            config.requested_version().unwrap(),
            Some(ApiVersionRequest::Latest)
        );
        assert_eq!(config.service_type, "compute_legacy");
        assert_eq!(config.timeout, Some(10));
        assert!(config.timings);
    }

    #[test]
    fn test_load_cloud() {
        let (config, auth) = load_cloud(CLOUDS.as_bytes(), "devstack").unwrap();
        assert_eq!(
            config.requested_version().unwrap(),
            Some(ApiVersionRequest::Exact(ApiVersion(2, 30)))
        );
        assert_eq!(config.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(config.timeout, Some(30));
        assert_eq!(auth.token().unwrap().as_deref(), Some("abcdef"));
        let endpoint = auth.get_endpoint("compute", None, None).unwrap();
        assert_eq!(endpoint.as_str(), "http://nova-api:8774/v2.1");
    }

    #[test]
    fn test_load_cloud_noauth() {
        let (config, auth) = load_cloud(CLOUDS.as_bytes(), "standalone").unwrap();
        assert!(config.api_version.is_none());
        assert!(auth.token().unwrap().is_none());
    }

    #[test]
    fn test_load_cloud_errors() {
        let err = load_cloud(CLOUDS.as_bytes(), "missing").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        let err = load_cloud(CLOUDS.as_bytes(), "broken").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
        let err = load_cloud("clouds: [".as_bytes(), "devstack").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_config_yaml() {
        let config: Config =
            serde_yaml::from_str("api_version: '2.35'\ntimings: true\n").unwrap();
        assert_eq!(config.api_version.as_deref(), Some("2.35"));
        assert!(config.timings);
        assert_eq!(config.service_type, "compute");
    }
}

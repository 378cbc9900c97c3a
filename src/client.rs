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

//! Compute API client.
//!
//! The [Client](struct.Client.html) wraps a transport, handling
//! authentication, version discovery and negotiation, version headers and
//! error reporting. It has to be negotiated before any API call:
//!
//! ```rust,no_run
//! use novaclient::auth::Token;
//! use novaclient::{Client, Config};
//!
//! let auth = Token::new("https://cloud.example.com:8774/v2.1", "gAAAAAB...")
//!     .expect("Invalid endpoint");
//! let config = Config::new().with_api_version("2.30");
//! let client = Client::connect(config, Box::new(auth)).expect("Negotiation failed");
//! println!("Using API version {}", client.api_version().unwrap());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::auth::AuthProvider;
use super::common::ApiVersion;
use super::config::Config;
use super::service::{extract_info, NegotiatedSession, ServiceInfo};
use super::transport::{HttpTransport, Request, Response, Transport};
use super::utils::{self, Query};
use super::{Error, ErrorKind, Result};

/// Header carrying the microversion, understood by all Nova releases.
pub const LEGACY_VERSION_HEADER: &str = "x-openstack-nova-api-version";

/// Generic microversion header, sent starting with 2.27.
pub const VERSION_HEADER: &str = "openstack-api-version";

/// First version that understands the generic header.
pub const VERSION_HEADER_SINCE: ApiVersion = ApiVersion(2, 27);

const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// A single timing record: request label and elapsed seconds.
pub type Timing = (String, f64);

/// Negotiation state of a client.
#[derive(Clone, Debug)]
pub enum ClientState {
    /// Nothing has been done yet.
    Uninitialized,
    /// Discovery is in progress.
    Negotiating,
    /// The version is negotiated, requests can be made.
    Ready(NegotiatedSession),
    /// Negotiation failed, the client cannot be used.
    Failed(Error),
}

/// Compute API client.
///
/// Not `Sync`: the timing log uses interior mutability.
pub struct Client {
    config: Config,
    auth: Box<dyn AuthProvider>,
    transport: Box<dyn Transport>,
    state: ClientState,
    endpoint: Option<Url>,
    timings: RefCell<Vec<Timing>>,
}

/// Headers carrying the API version.
pub fn version_headers(version: ApiVersion) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = version.to_string();
    // X.Y is always a valid header value.
    if let Ok(value) = HeaderValue::from_str(&value) {
        let _ = headers.insert(HeaderName::from_static(LEGACY_VERSION_HEADER), value);
    }
    if version >= VERSION_HEADER_SINCE {
        if let Ok(value) = HeaderValue::from_str(&format!("compute {}", value)) {
            let _ = headers.insert(HeaderName::from_static(VERSION_HEADER), value);
        }
    }
    headers
}

fn check(resp: Response) -> Result<Response> {
    if resp.status.is_success() {
        Ok(resp)
    } else {
        let err = Error::from_status(
            resp.status,
            resp.fault_message(),
            resp.request_id().map(String::from),
        );
        debug!("Request failed: {}", err);
        Err(err)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Uninitialized => f.write_str("uninitialized"),
            ClientState::Negotiating => f.write_str("negotiating"),
            ClientState::Ready(session) => write!(f, "ready ({})", session.resolved),
            ClientState::Failed(err) => write!(f, "failed ({})", err),
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("auth", &self.auth)
            .field("state", &self.state)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Client {
    /// Create a client using the provided transport.
    ///
    /// The client starts uninitialized, call [negotiate](#method.negotiate)
    /// before making requests.
    pub fn new(config: Config, auth: Box<dyn AuthProvider>, transport: Box<dyn Transport>) -> Client {
        Client {
            config,
            auth,
            transport,
            state: ClientState::Uninitialized,
            endpoint: None,
            timings: RefCell::new(Vec::new()),
        }
    }

    /// Create a client with an HTTP transport and negotiate the version.
    pub fn connect(config: Config, auth: Box<dyn AuthProvider>) -> Result<Client> {
        let transport = HttpTransport::new(config.timeout_duration())?;
        let mut client = Client::new(config, auth, Box::new(transport));
        let _ = client.negotiate()?;
        Ok(client)
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Client configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Negotiated API version (if ready).
    pub fn api_version(&self) -> Option<ApiVersion> {
        match self.state {
            ClientState::Ready(ref session) => Some(session.resolved),
            _ => None,
        }
    }

    /// Endpoint used for API calls (if ready).
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// Discover the endpoint and negotiate the API version.
    ///
    /// Does nothing if the client is already negotiated. A failure is
    /// final: the same error is returned on every further call.
    pub fn negotiate(&mut self) -> Result<NegotiatedSession> {
        match self.state {
            ClientState::Ready(session) => return Ok(session),
            ClientState::Failed(ref err) => return Err(err.clone()),
            ClientState::Negotiating => {
                return Err(Error::new(
                    ErrorKind::InvalidState,
                    "Negotiation is already in progress",
                ))
            }
            ClientState::Uninitialized => (),
        }

        self.state = ClientState::Negotiating;
        match self.do_negotiate() {
            Ok((session, endpoint)) => {
                debug!("Using compute endpoint {}", endpoint);
                self.state = ClientState::Ready(session);
                self.endpoint = Some(endpoint);
                Ok(session)
            }
            Err(err) => {
                warn!("API version negotiation failed: {}", err);
                self.state = ClientState::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn do_negotiate(&self) -> Result<(NegotiatedSession, Url)> {
        // Validate the request before touching the network.
        let requested = self.config.requested_version()?;
        let catalog_url = self.catalog_endpoint()?;
        let info = self.discover_from(catalog_url.clone())?;
        let session = info.negotiate(requested, self.config.allow_latest)?;
        let endpoint = if utils::url::is_root(&catalog_url) {
            info.root_url
        } else {
            catalog_url
        };
        Ok((session, endpoint))
    }

    fn catalog_endpoint(&self) -> Result<Url> {
        self.auth.get_endpoint(
            &self.config.service_type,
            self.config.endpoint_interface.as_deref(),
            self.config.region_name.as_deref(),
        )
    }

    /// Fetch the version document of the Compute service.
    ///
    /// Available in any state, the request is not authenticated.
    pub fn discover(&self) -> Result<ServiceInfo> {
        let url = self.catalog_endpoint()?;
        self.discover_from(url)
    }

    fn discover_from(&self, mut url: Url) -> Result<ServiceInfo> {
        loop {
            let mut headers = HeaderMap::new();
            let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
            let request = Request::new(Method::GET, url.clone()).with_headers(headers);
            let resp = self.send(request)?;

            if resp.status == StatusCode::NOT_FOUND && !utils::url::is_root(&url) {
                debug!("Got HTTP 404 from {}, trying parent endpoint", url);
                url = utils::url::pop(url)?;
                continue;
            }

            let resp = check(resp)?;
            let body = resp.body.ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse, "Empty version document")
            })?;
            let info = extract_info(&body, url.scheme() == "https")?;
            debug!(
                "Found compute service at {} with versions {:?} - {:?}",
                info.root_url, info.minimum_version, info.current_version
            );
            return Ok(info);
        }
    }

    /// Make an API call.
    ///
    /// The path is relative to the compute endpoint and may contain a query
    /// string. Non-2xx responses are converted into errors.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Response> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        let mut url = self.url(path)?;
        url.set_query(query);
        self.execute(method, url, body, headers)
    }

    /// Fetch a JSON resource.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T> {
        let url = utils::url::with_query(self.url(path)?, query);
        self.execute(Method::GET, url, None, None)?.json()
    }

    /// POST a JSON body, returning the response.
    pub fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(body), None)
    }

    /// Issue a DELETE request.
    pub fn delete(&self, path: &str) -> Result<()> {
        let _ = self.request(Method::DELETE, path, None, None)?;
        Ok(())
    }

    /// Recorded timings, empty unless enabled in the configuration.
    pub fn timings(&self) -> Vec<Timing> {
        self.timings.borrow().clone()
    }

    /// Forget recorded timings.
    pub fn reset_timings(&self) {
        self.timings.borrow_mut().clear();
    }

    fn ready(&self) -> Result<(ApiVersion, &Url)> {
        match (&self.state, &self.endpoint) {
            (ClientState::Ready(session), Some(endpoint)) => Ok((session.resolved, endpoint)),
            (state, _) => Err(Error::new(
                ErrorKind::InvalidState,
                format!("Cannot make requests, client is {}", state),
            )),
        }
    }

    /// Negotiated version or `InvalidState`.
    pub(crate) fn negotiated_version(&self) -> Result<ApiVersion> {
        self.ready().map(|(version, _)| version)
    }

    fn url(&self, path: &str) -> Result<Url> {
        let (_, endpoint) = self.ready()?;
        utils::url::join_path(endpoint.clone(), path)
    }

    fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Response> {
        let (version, _) = self.ready()?;
        let mut request = Request::new(method, url).with_headers(self.default_headers(version)?);
        if let Some(headers) = headers {
            request = request.with_headers(headers);
        }
        if let Some(body) = body {
            request = request.with_body(body);
        }
        check(self.send(request)?)
    }

    fn default_headers(&self, version: ApiVersion) -> Result<HeaderMap> {
        let mut headers = version_headers(version);
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = self.auth.token()? {
            let mut value = HeaderValue::from_str(&token)?;
            value.set_sensitive(true);
            let _ = headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), value);
        }
        Ok(headers)
    }

    fn send(&self, request: Request) -> Result<Response> {
        let label = format!("{} {}", request.method, request.url);
        debug!("Sending {}", label);
        let started = Instant::now();
        let resp = self.transport.request(request)?;
        if self.config.timings {
            let elapsed = started.elapsed().as_secs_f64();
            self.timings.borrow_mut().push((label.clone(), elapsed));
        }
        match resp.request_id() {
            Some(request_id) => debug!("{} returned HTTP {} ({})", label, resp.status, request_id),
            None => debug!("{} returned HTTP {}", label, resp.status),
        }
        Ok(resp)
    }
}

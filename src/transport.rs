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

//! Low-level HTTP utilities.
//!
//! The [Transport](trait.Transport.html) trait is the only place where the
//! client touches the network, so it can be replaced with a
//! [FakeTransport](../fakes/struct.FakeTransport.html) in tests.

use std::fmt::Debug;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Error, ErrorKind, Result};

/// Header used to report the request ID.
pub const REQUEST_ID_HEADERS: &[&str] = &["x-openstack-request-id", "x-compute-request-id"];

/// An HTTP request ready to be sent.
#[derive(Clone, Debug)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Full URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body (if any).
    pub body: Option<Value>,
}

/// A received HTTP response.
#[derive(Clone, Debug)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// JSON body, `None` for an empty body.
    pub body: Option<Value>,
}

/// Capability to issue HTTP requests.
pub trait Transport: Debug {
    /// Send the request and wait for the response.
    ///
    /// Must not interpret the status code.
    fn request(&self, request: Request) -> Result<Response>;
}

/// Transport based on the blocking reqwest client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl Request {
    /// Create a request without headers and body.
    pub fn new(method: Method, url: Url) -> Request {
        Request {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a JSON body.
    pub fn with_body(mut self, body: Value) -> Request {
        self.body = Some(body);
        self
    }

    /// Add headers, overwriting existing ones.
    pub fn with_headers(mut self, headers: HeaderMap) -> Request {
        self.headers.extend(headers);
        self
    }
}

impl Response {
    /// Create a response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Option<Value>) -> Response {
        Response {
            status,
            headers,
            body,
        }
    }

    /// Request ID reported by the server (if any).
    pub fn request_id(&self) -> Option<&str> {
        REQUEST_ID_HEADERS
            .iter()
            .filter_map(|name| self.headers.get(*name))
            .find_map(|value| value.to_str().ok())
    }

    /// Deserialize the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self.body {
            Some(ref body) => serde_json::from_value(body.clone()).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidResponse,
                    format!("Unexpected response body: {}", e),
                )
            }),
            None => Err(Error::new(
                ErrorKind::InvalidResponse,
                "Expected a JSON body, got an empty response",
            )),
        }
    }

    /// Extract a fault message from a Nova error body.
    ///
    /// Nova wraps faults in a single-key object, e.g.
    /// `{"itemNotFound": {"message": "...", "code": 404}}`. A plain-text
    /// body is returned as is.
    pub fn fault_message(&self) -> Option<String> {
        let body = self.body.as_ref()?;
        if let Some(text) = body.as_str() {
            let text = text.trim();
            return if text.is_empty() {
                None
            } else {
                Some(String::from(text))
            };
        }
        let direct = body.get("message").and_then(Value::as_str);
        let nested = || {
            body.as_object()?
                .values()
                .find_map(|v| v.get("message").and_then(Value::as_str))
        };
        direct.or_else(nested).map(String::from)
    }
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<HttpTransport> {
        let mut builder = Client::builder().gzip(true);
        if let Some(value) = timeout {
            builder = builder.timeout(value);
        }
        Ok(HttpTransport {
            client: builder.build()?,
        })
    }

    fn prepare(&self, request: Request) -> Result<RequestBuilder> {
        let Request {
            method,
            url,
            mut headers,
            body,
        } = request;
        let body = match body {
            Some(body) => {
                let _ = headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));
                Some(serde_json::to_vec(&body)?)
            }
            None => None,
        };

        let builder = self.client.request(method, url).headers(headers);
        Ok(match body {
            Some(body) => builder.body(body),
            None => builder,
        })
    }
}

impl Transport for HttpTransport {
    fn request(&self, request: Request) -> Result<Response> {
        trace!("Sending {} {}", request.method, request.url);
        let resp = self.prepare(request)?.send()?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes()?;
        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                // Errors from proxies are often HTML or plain text.
                Err(e) if !status.is_success() => {
                    debug!("Non-JSON error body from the server: {}", e);
                    Some(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Err(e) => {
                    return Err(Error::new_with_details(
                        ErrorKind::InvalidResponse,
                        Some(status),
                        Some(format!("Response body is not JSON: {}", e)),
                        None,
                    ))
                }
            }
        };

        Ok(Response::new(status, headers, body))
    }
}

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

//! Fake transport for testing code that uses the client.
//!
//! Responses are registered per method and path. A path is matched exactly
//! (including the query string) or, failing that, as the longest registered
//! suffix of the request path. Unknown calls get HTTP 404.
//!
//! ```rust
//! use novaclient::fakes::FakeTransport;
//! use novaclient::transport::{Request, Transport};
//! use reqwest::{Method, StatusCode, Url};
//! use serde_json::json;
//!
//! let fake = FakeTransport::new()
//!     .with_json(Method::GET, "/servers/1234", StatusCode::OK, json!({"server": {"id": "1234"}}));
//! let url = Url::parse("http://nova-api:8774/v2.1/servers/1234").unwrap();
//! let resp = fake.request(Request::new(Method::GET, url)).unwrap();
//! assert_eq!(resp.status, StatusCode::OK);
//! fake.assert_called(Method::GET, "/v2.1/servers/1234", None);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use super::transport::{Request, Response, Transport};
use super::Result;

/// Request ID attached to all fake responses.
pub const FAKE_REQUEST_ID: &str = "req-3fdea7c2-e3e3-48b5-a656-6b12504c49a1";

#[derive(Debug, Clone)]
struct Canned {
    method: Method,
    path: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Value>,
}

#[derive(Debug, Default)]
struct State {
    responses: Vec<Canned>,
    callstack: Vec<Request>,
}

/// Transport serving canned responses and recording all calls.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Rc<RefCell<State>>,
}

fn path_and_query(request: &Request) -> String {
    match request.url.query() {
        Some(query) => format!("{}?{}", request.url.path(), query),
        None => request.url.path().to_string(),
    }
}

impl FakeTransport {
    /// Create a fake without any responses.
    pub fn new() -> FakeTransport {
        FakeTransport::default()
    }

    /// Register a response.
    pub fn with_response<S: Into<String>>(
        self,
        method: Method,
        path: S,
        status: StatusCode,
        headers: HeaderMap,
        body: Option<Value>,
    ) -> FakeTransport {
        let mut headers = headers;
        let _ = headers.insert(
            HeaderName::from_static("x-openstack-request-id"),
            HeaderValue::from_static(FAKE_REQUEST_ID),
        );
        self.state.borrow_mut().responses.push(Canned {
            method,
            path: path.into(),
            status,
            headers,
            body,
        });
        self
    }

    /// Register a JSON response without extra headers.
    pub fn with_json<S: Into<String>>(
        self,
        method: Method,
        path: S,
        status: StatusCode,
        body: Value,
    ) -> FakeTransport {
        self.with_response(method, path, status, HeaderMap::new(), Some(body))
    }

    /// Register an empty response.
    pub fn with_empty<S: Into<String>>(
        self,
        method: Method,
        path: S,
        status: StatusCode,
    ) -> FakeTransport {
        self.with_response(method, path, status, HeaderMap::new(), None)
    }

    /// Register a versions document for the service root.
    pub fn with_versions(self, root: &str, min_version: &str, max_version: &str) -> FakeTransport {
        let body = json!({
            "versions": [
                {"status": "SUPPORTED", "updated": "2011-01-21T11:33:21Z",
                 "links": [{"href": format!("{}/v2/", root), "rel": "self"}],
                 "min_version": "", "version": "", "id": "v2.0"},
                {"status": "CURRENT", "updated": "2013-07-23T11:33:21Z",
                 "links": [{"href": format!("{}/v2.1/", root), "rel": "self"}],
                 "min_version": min_version, "version": max_version, "id": "v2.1"}
            ]
        });
        self.with_json(Method::GET, "/", StatusCode::OK, body)
    }

    /// All requests made so far.
    pub fn callstack(&self) -> Vec<Request> {
        self.state.borrow().callstack.clone()
    }

    /// Forget recorded requests.
    pub fn clear_callstack(&self) {
        self.state.borrow_mut().callstack.clear();
    }

    /// The last recorded request.
    ///
    /// Panics if nothing was called.
    pub fn last_call(&self) -> Request {
        match self.state.borrow().callstack.last() {
            Some(req) => req.clone(),
            None => panic!("Expected a call, but nothing was called"),
        }
    }

    /// Assert that the last call matches.
    ///
    /// Panics otherwise. The path includes the query string.
    pub fn assert_called(&self, method: Method, path: &str, body: Option<Value>) {
        let last = self.last_call();
        assert_eq!(last.method, method, "method of the last call");
        assert_eq!(path_and_query(&last), path, "path of the last call");
        assert_eq!(last.body, body, "body of the last call");
    }

    /// Assert that a matching call happened at some point.
    pub fn assert_called_anytime(&self, method: Method, path: &str, body: Option<Value>) {
        let found = self
            .state
            .borrow()
            .callstack
            .iter()
            .any(|req| req.method == method && path_and_query(req) == path && req.body == body);
        assert!(
            found,
            "Expected {} {} with body {:?} in {:?}",
            method,
            path,
            body,
            self.callstack()
        );
    }

    fn find(&self, request: &Request) -> Option<Canned> {
        let full = path_and_query(request);
        let state = self.state.borrow();
        let candidates = state
            .responses
            .iter()
            .filter(|canned| canned.method == request.method);
        let mut best: Option<&Canned> = None;
        for canned in candidates {
            if canned.path == full {
                return Some(canned.clone());
            }
            let suffix_match = canned.path != "/" && full.ends_with(&canned.path);
            let root_match = canned.path == "/" && full == "/";
            if (suffix_match || root_match)
                && best.map(|b| b.path.len() < canned.path.len()).unwrap_or(true)
            {
                best = Some(canned);
            }
        }
        best.cloned()
    }
}

impl Transport for FakeTransport {
    fn request(&self, request: Request) -> Result<Response> {
        let canned = self.find(&request);
        self.state.borrow_mut().callstack.push(request.clone());
        Ok(match canned {
            Some(canned) => Response::new(canned.status, canned.headers, canned.body),
            None => {
                debug!(
                    "Called unknown fake API method: {} {}",
                    request.method, request.url
                );
                Response::new(
                    StatusCode::NOT_FOUND,
                    HeaderMap::new(),
                    Some(json!({"itemNotFound": {
                        "message": format!("{} {} is not faked", request.method, request.url.path()),
                        "code": 404
                    }})),
                )
            }
        })
    }
}

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

use std::sync::Once;

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use novaclient::auth::{NoAuth, Token};
use novaclient::{compute, ApiVersion, Client, ClientState, Config, ErrorKind};

static INIT: Once = Once::new();

fn set_up() -> ServerGuard {
    INIT.call_once(|| {
        env_logger::init();
    });

    Server::new()
}

fn version_document(server: &ServerGuard) -> String {
    json!({
        "version": {
            "id": "v2.1",
            "status": "CURRENT",
            "version": "2.40",
            "min_version": "2.1",
            "updated": "2013-07-23T11:33:21Z",
            "links": [{"href": format!("{}/v2.1/", server.url()), "rel": "self"}]
        }
    })
    .to_string()
}

fn mock_discovery(server: &mut ServerGuard) -> mockito::Mock {
    let body = version_document(server);
    server
        .mock("GET", "/v2.1")
        .match_header("x-auth-token", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

fn connect(server: &ServerGuard, config: Config) -> novaclient::Result<Client> {
    let auth = Token::new(format!("{}/v2.1", server.url()), "abcdef")?;
    Client::connect(config, Box::new(auth))
}

#[test]
fn test_negotiate_explicit_version() {
    let mut server = set_up();
    let discovery = mock_discovery(&mut server);
    let servers = server
        .mock("GET", "/v2.1/servers/detail")
        .match_header("x-auth-token", "abcdef")
        .match_header("x-openstack-nova-api-version", "2.30")
        .match_header("openstack-api-version", "compute 2.30")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"servers": [{"id": "1234", "name": "sample-server", "status": "ACTIVE"}]}"#)
        .create();

    let client = connect(&server, Config::new().with_api_version("2.30")).expect("Cannot connect");
    assert_eq!(client.api_version(), Some(ApiVersion(2, 30)));

    let items = compute::servers(&client).list().expect("Cannot list servers");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name(), "sample-server");

    discovery.assert();
    servers.assert();
}

#[test]
fn test_negotiate_old_version_omits_new_header() {
    let mut server = set_up();
    let _discovery = mock_discovery(&mut server);
    let flavors = server
        .mock("GET", "/v2.1/flavors/detail")
        .match_header("x-openstack-nova-api-version", "2.26")
        .match_header("openstack-api-version", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"flavors": []}"#)
        .create();

    let client = connect(&server, Config::new().with_api_version("2.26")).expect("Cannot connect");
    let items = compute::flavors(&client).list().expect("Cannot list flavors");
    assert!(items.is_empty());
    flavors.assert();
}

#[test]
fn test_negotiate_latest() {
    let mut server = set_up();
    let _discovery = mock_discovery(&mut server);

    let err = connect(&server, Config::new().with_api_version("latest"))
        .err()
        .expect("Latest must be refused without an opt-in");
    assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);

    let config = Config::new()
        .with_api_version("latest")
        .with_latest_allowed(true);
    let client = connect(&server, config).expect("Cannot connect");
    assert_eq!(client.api_version(), Some(ApiVersion(2, 40)));
}

#[test]
fn test_negotiate_unsupported_version() {
    let mut server = set_up();
    let discovery = mock_discovery(&mut server);
    let servers = server
        .mock("GET", Matcher::Regex(r"^/v2\.1/servers".to_string()))
        .expect(0)
        .create();

    let auth = Token::new(format!("{}/v2.1", server.url()), "abcdef").expect("Invalid endpoint");
    let mut client = Client::new(
        Config::new().with_api_version("2.50"),
        Box::new(auth),
        Box::new(novaclient::transport::HttpTransport::new(None).expect("Cannot build transport")),
    );
    let err = client.negotiate().err().expect("2.50 is not supported");
    assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
    match client.state() {
        ClientState::Failed(..) => (),
        other => panic!("Unexpected state {}", other),
    }

    let err = compute::servers(&client).list().err().expect("Client must not be usable");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // A failed negotiation is not retried.
    let again = client.negotiate().err().expect("Failure is final");
    assert_eq!(again.kind(), ErrorKind::IncompatibleApiVersion);

    discovery.assert();
    servers.assert();
}

#[test]
fn test_discovery_falls_back_to_parent() {
    let mut server = set_up();
    let body = json!({
        "versions": [
            {"id": "v2.0", "status": "SUPPORTED", "version": "", "min_version": "",
             "updated": "2011-01-21T11:33:21Z",
             "links": [{"href": format!("{}/v2/", server.url()), "rel": "self"}]},
            {"id": "v2.1", "status": "CURRENT", "version": "2.40", "min_version": "2.1",
             "updated": "2013-07-23T11:33:21Z",
             "links": [{"href": format!("{}/v2.1/", server.url()), "rel": "self"}]}
        ]
    })
    .to_string();
    let missing = server
        .mock("GET", "/compute/v2.1")
        .with_status(404)
        .create();
    let parent = server.mock("GET", "/compute/").with_status(404).create();
    let root = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create();

    let auth = NoAuth::new(format!("{}/compute/v2.1", server.url())).expect("Invalid endpoint");
    let client = Client::connect(Config::new().with_api_version("2.5"), Box::new(auth))
        .expect("Cannot connect");
    assert_eq!(client.api_version(), Some(ApiVersion(2, 5)));
    assert_eq!(
        client.endpoint().map(|x| x.path().to_string()),
        Some("/compute/v2.1".to_string())
    );

    missing.assert();
    parent.assert();
    root.assert();
}

#[test]
fn test_server_rejects_version() {
    let mut server = set_up();
    let _discovery = mock_discovery(&mut server);
    let _keypairs = server
        .mock("GET", "/v2.1/os-keypairs")
        .with_status(406)
        .with_header("content-type", "application/json")
        .with_header("x-openstack-request-id", "req-1234")
        .with_body(
            r#"{"computeFault": {"code": 406, "message": "Version 2.3 is not supported by the API."}}"#,
        )
        .create();

    let client = connect(&server, Config::new().with_api_version("2.3")).expect("Cannot connect");
    let err = compute::keypairs(&client)
        .list(&Default::default())
        .err()
        .expect("Version must be rejected");
    assert_eq!(err.kind(), ErrorKind::IncompatibleApiVersion);
    assert_eq!(err.request_id(), Some("req-1234"));
    assert_eq!(err.message(), Some("Version 2.3 is not supported by the API."));
}

#[test]
fn test_timings() {
    let mut server = set_up();
    let _discovery = mock_discovery(&mut server);
    let _flavors = server
        .mock("GET", "/v2.1/flavors/detail")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"flavors": []}"#)
        .create();

    let config = Config::new().with_api_version("2.1").with_timings(true);
    let client = connect(&server, config).expect("Cannot connect");
    client.reset_timings();

    let _ = compute::flavors(&client).list().expect("Cannot list flavors");
    let _ = compute::flavors(&client).list().expect("Cannot list flavors");
    let timings = client.timings();
    assert_eq!(timings.len(), 2);
    assert!(timings[0].0.starts_with("GET "));
    assert!(timings.iter().all(|(_, elapsed)| *elapsed >= 0.0));

    client.reset_timings();
    assert!(client.timings().is_empty());
}

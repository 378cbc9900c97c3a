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

//! OpenStack Compute (Nova) client in Rust.
//!
//! The core of this crate is API microversion negotiation: the
//! [Client](struct.Client.html) discovers the version range supported by
//! the server, picks a concrete version and sends it with every request,
//! while the [compute](compute/index.html) module adjusts request bodies to
//! the negotiated version.
//!
//! # Features
//!
//! * [Version parsing and ordering](struct.ApiVersion.html)
//! * [Negotiation](service/fn.negotiate.html) against a server range
//! * [Version-scoped implementations](substitution/index.html)
//! * [Servers, flavors, key pairs and migrations](compute/index.html)
//! * [Configuration](config/index.html) from the environment and `clouds.yaml`
//!
//! # Example
//!
//! ```rust,no_run
//! use novaclient::auth::NoAuth;
//! use novaclient::{compute, Client, Config};
//!
//! let auth = NoAuth::new("http://127.0.0.1:8774").expect("Invalid endpoint");
//! let config = Config::new().with_api_version("2.25");
//! let client = Client::connect(config, Box::new(auth)).expect("Cannot negotiate");
//!
//! for server in compute::servers(&client).list().expect("Cannot list servers") {
//!     println!("{} {}", server.id(), server.status());
//! }
//! ```

#![crate_name = "novaclient"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    dead_code,
    improper_ctypes,
    missing_debug_implementations,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_extern_crates,
    unused_import_braces,
    unused_parens,
    unused_results,
    while_true
)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

#[macro_use]
mod common;

pub mod auth;
mod client;
pub mod compute;
pub mod config;
mod error;
pub mod fakes;
pub mod service;
pub mod substitution;
pub mod transport;
pub mod utils;

pub use crate::client::{
    version_headers, Client, ClientState, Timing, LEGACY_VERSION_HEADER, VERSION_HEADER,
    VERSION_HEADER_SINCE,
};
pub use crate::common::{
    ApiVersion, ApiVersionRequest, DeletionWaiter, Refresh, DEFAULT_VERSION, LEGACY_VERSION,
    MAJOR_VERSION,
};
pub use crate::config::Config;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::service::{negotiate, NegotiatedSession, ServiceInfo};
pub use crate::substitution::{Substitution, SubstitutionTable, VersionRange};

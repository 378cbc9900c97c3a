// Copyright 2016 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Base code for authentication.

use std::fmt::Debug;

use reqwest::Url;

use super::super::Result;

/// Trait for any authentication method.
pub trait AuthProvider: Debug {
    /// Authentication token to send with requests.
    ///
    /// `None` means that no token header is sent.
    fn token(&self) -> Result<Option<String>>;

    /// Get a URL for the requested service.
    fn get_endpoint(
        &self,
        service_type: &str,
        endpoint_interface: Option<&str>,
        region: Option<&str>,
    ) -> Result<Url>;
}

impl<T: AuthProvider + ?Sized> AuthProvider for Box<T> {
    fn token(&self) -> Result<Option<String>> {
        (**self).token()
    }

    fn get_endpoint(
        &self,
        service_type: &str,
        endpoint_interface: Option<&str>,
        region: Option<&str>,
    ) -> Result<Url> {
        (**self).get_endpoint(service_type, endpoint_interface, region)
    }
}

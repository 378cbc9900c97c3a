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

//! Simple authentication methods.

use reqwest::Url;

use super::super::{Error, ErrorKind, Result};
use super::AuthProvider;

/// Authentication method that provides no authentication.
///
/// No token is sent, and a pre-defined endpoint is used for all services.
#[derive(Clone, Debug)]
pub struct NoAuth {
    endpoint: Url,
}

/// Authentication using a token obtained elsewhere.
#[derive(Clone)]
pub struct Token {
    endpoint: Url,
    token: String,
}

fn parse_endpoint<U: AsRef<str>>(endpoint: U) -> Result<Url> {
    Url::parse(endpoint.as_ref())
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("Invalid endpoint: {}", e)))
}

impl NoAuth {
    /// Create a new fake authentication method using a fixed endpoint.
    ///
    /// This endpoint will be returned in response to all get_endpoint calls
    /// of the [AuthProvider](trait.AuthProvider.html) trait.
    pub fn new<U>(endpoint: U) -> Result<NoAuth>
    where
        U: AsRef<str>,
    {
        Ok(NoAuth {
            endpoint: parse_endpoint(endpoint)?,
        })
    }
}

impl AuthProvider for NoAuth {
    fn token(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Get a predefined endpoint for all service types
    fn get_endpoint(
        &self,
        _service_type: &str,
        _endpoint_interface: Option<&str>,
        _region: Option<&str>,
    ) -> Result<Url> {
        Ok(self.endpoint.clone())
    }
}

impl Token {
    /// Create a token authentication with a fixed endpoint.
    pub fn new<U, S>(endpoint: U, token: S) -> Result<Token>
    where
        U: AsRef<str>,
        S: Into<String>,
    {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "Token cannot be empty"));
        }

        Ok(Token {
            endpoint: parse_endpoint(endpoint)?,
            token,
        })
    }
}

impl ::std::fmt::Debug for Token {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        f.debug_struct("Token")
            .field("endpoint", &self.endpoint)
            .field("token", &"<hidden>")
            .finish()
    }
}

impl AuthProvider for Token {
    fn token(&self) -> Result<Option<String>> {
        Ok(Some(self.token.clone()))
    }

    fn get_endpoint(
        &self,
        _service_type: &str,
        _endpoint_interface: Option<&str>,
        _region: Option<&str>,
    ) -> Result<Url> {
        Ok(self.endpoint.clone())
    }
}

#[cfg(test)]
pub mod test {
    use super::super::AuthProvider;
    use super::{NoAuth, Token};

    #[test]
    fn test_noauth_new() {
        let a = NoAuth::new("http://127.0.0.1:8080/v1").unwrap();
        let e = a.endpoint;
        assert_eq!(e.scheme(), "http");
        assert_eq!(e.host_str().unwrap(), "127.0.0.1");
        assert_eq!(e.port().unwrap(), 8080u16);
        assert_eq!(e.path(), "/v1");
    }

    #[test]
    fn test_noauth_new_fail() {
        let _ = NoAuth::new("foo bar").err().unwrap();
    }

    #[test]
    fn test_noauth_get_endpoint() {
        let a = NoAuth::new("http://127.0.0.1:8080/v1").unwrap();
        let e = a.get_endpoint("compute", None, None).unwrap();
        assert_eq!(e.as_str(), "http://127.0.0.1:8080/v1");
        assert!(a.token().unwrap().is_none());
    }

    #[test]
    fn test_token() {
        let a = Token::new("http://127.0.0.1:8774", "abcdef").unwrap();
        assert_eq!(a.token().unwrap().unwrap(), "abcdef");
        assert!(!format!("{:?}", a).contains("abcdef"));
        let _ = Token::new("http://127.0.0.1:8774", "").err().unwrap();
    }
}

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

//! Various utilities.

use std::collections::BTreeMap;
use std::fmt::Display;

/// Query string parameters, kept sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, String>);

impl Query {
    /// Empty query.
    pub fn new() -> Query {
        Query::default()
    }

    /// Add or replace a parameter.
    pub fn push<K: Into<String>, V: Display>(&mut self, key: K, value: V) {
        let _ = self.0.insert(key.into(), value.to_string());
    }

    /// Add a parameter if the value is present.
    pub fn push_opt<K: Into<String>, V: Display>(&mut self, key: K, value: Option<V>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub mod url {
    //! Handy primitives for working with URLs.

    use reqwest::Url;

    use super::super::{Error, ErrorKind, Result};
    use super::Query;

    fn cannot_be_base(url: &Url) -> Error {
        Error::new(
            ErrorKind::InvalidInput,
            format!("URL {} cannot be used as a base", url),
        )
    }

    /// Whether the URL has no path segments.
    #[inline]
    pub fn is_root(url: &Url) -> bool {
        url.path_segments()
            .map(|mut segments| segments.all(|x| x.is_empty()))
            .unwrap_or(true)
    }

    /// Append path segments to the URL.
    pub fn extend<I, S>(mut url: Url, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if url.cannot_be_a_base() {
            return Err(cannot_be_base(&url));
        }
        if let Ok(mut path) = url.path_segments_mut() {
            let _ = path.pop_if_empty();
            for segment in segments {
                let _ = path.push(segment.as_ref());
            }
        }
        Ok(url)
    }

    /// Append a relative path (e.g. `servers/1234/action`) to the URL.
    pub fn join_path(url: Url, path: &str) -> Result<Url> {
        extend(url, path.split('/').filter(|x| !x.is_empty()))
    }

    /// Remove the last path segment, keeping the trailing slash.
    pub fn pop(mut url: Url) -> Result<Url> {
        if url.cannot_be_a_base() {
            return Err(cannot_be_base(&url));
        }
        if let Ok(mut path) = url.path_segments_mut() {
            let _ = path.pop_if_empty().pop().push("");
        }
        Ok(url)
    }

    /// Replace the query string.
    pub fn with_query(mut url: Url, query: &Query) -> Url {
        if query.is_empty() {
            url.set_query(None);
        } else {
            let _ = url.query_pairs_mut().clear().extend_pairs(query.iter());
        }
        url
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::Url;

    use super::super::ErrorKind;
    use super::url;
    use super::Query;

    #[test]
    fn test_is_root() {
        assert!(url::is_root(&Url::parse("http://nova:8774").unwrap()));
        assert!(url::is_root(&Url::parse("http://nova:8774/").unwrap()));
        assert!(!url::is_root(&Url::parse("http://nova:8774/v2.1").unwrap()));
    }

    #[test]
    fn test_join_path() {
        let base = Url::parse("http://nova:8774/v2.1/").unwrap();
        let full = url::join_path(base, "servers/1234/action").unwrap();
        assert_eq!(full.as_str(), "http://nova:8774/v2.1/servers/1234/action");
        let base = Url::parse("http://nova:8774/v2.1").unwrap();
        let full = url::join_path(base, "/servers").unwrap();
        assert_eq!(full.as_str(), "http://nova:8774/v2.1/servers");
    }

    #[test]
    fn test_pop() {
        let url = Url::parse("http://nova:8774/v2.1/abcdef").unwrap();
        let url = url::pop(url).unwrap();
        assert_eq!(url.as_str(), "http://nova:8774/v2.1/");
        let url = url::pop(url).unwrap();
        assert_eq!(url.as_str(), "http://nova:8774/");
    }

    #[test]
    fn test_cannot_be_base() {
        let base = Url::parse("mailto:nova@example.com").unwrap();
        let err = url::join_path(base.clone(), "servers").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let _ = url::pop(base).err().unwrap();
    }

    #[test]
    fn test_with_query() {
        let mut query = Query::new();
        query.push("user_id", "test_user");
        query.push("limit", 3);
        query.push_opt::<_, String>("marker", None);
        let url = url::with_query(Url::parse("http://nova/os-keypairs").unwrap(), &query);
        assert_eq!(url.as_str(), "http://nova/os-keypairs?limit=3&user_id=test_user");
    }
}

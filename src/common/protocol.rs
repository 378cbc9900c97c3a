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

//! Common protocol bits.

#![allow(missing_docs)]

use serde::{Deserialize, Deserializer};

/// Define an enum mapped to a protocol string.
macro_rules! protocol_enum {
    {$(#[$attr:meta])* enum $name:ident = $default:ident {
        $($item:ident = $val:literal),+
    }} => (
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($item),+,
        }

        impl $name {
            /// String representation used on the wire.
            pub fn as_str(&self) -> &'static str {
                match *self {
                    $($name::$item => $val),+
                }
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::$default
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> ::std::result::Result<$name, ()> {
                match s {
                    $($val => Ok($name::$item)),+,
                    _ => Err(()),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<$name, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok(value.parse().unwrap_or($name::$default))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }
    );
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Version {
    pub id: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "empty_as_default")]
    pub min_version: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VersionsRoot {
    pub versions: Vec<Version>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VersionRoot {
    pub version: Version,
}

/// Treat `null` the same as a missing value.
pub fn empty_as_default<'de, D, T>(des: D) -> ::std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value: Option<T> = Deserialize::deserialize(des)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
pub mod test {
    use super::VersionRoot;

    protocol_enum! {
        #[doc = "Test enum."]
        enum Colour = Unknown {
            Red = "red",
            Unknown = "unknown"
        }
    }

    #[test]
    fn test_protocol_enum() {
        let c: Colour = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(c, Colour::Red);
        let c: Colour = serde_json::from_str("\"green\"").unwrap();
        assert_eq!(c, Colour::Unknown);
        assert_eq!(serde_json::to_string(&Colour::Red).unwrap(), "\"red\"");
        assert_eq!(Colour::default(), Colour::Unknown);
    }

    #[test]
    fn test_version_null_fields() {
        let root: VersionRoot = serde_json::from_str(
            r#"{"version": {"id": "v2.0", "links": [], "version": null, "min_version": null}}"#,
        )
        .unwrap();
        assert!(root.version.version.is_empty());
        assert!(root.version.min_version.is_empty());
    }
}

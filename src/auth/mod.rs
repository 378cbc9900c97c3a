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

//! Authentication modules.
//!
//! Authentication itself is out of scope of this crate: an
//! [AuthProvider](trait.AuthProvider.html) only has to hand out a token and
//! resolve the Compute endpoint. Two simple implementations are provided for
//! standalone use and for pre-issued tokens.
//!
//! # Examples
//!
//! Using a token issued elsewhere:
//!
//! ```
//! use novaclient::auth::Token;
//!
//! let auth = Token::new("https://my.cloud.com/compute", "gAAAAAB...").unwrap();
//! ```
//!
//! Creating a dummy authentication method for use against clouds that do not
//! have actual authentication:
//!
//! ```
//! use novaclient::auth::NoAuth;
//!
//! let auth = NoAuth::new("http://127.0.0.1:8774").unwrap();
//! ```

mod base;
mod simple;

pub use self::base::AuthProvider;
pub use self::simple::{NoAuth, Token};

// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locate the bearer token which authenticates against the proxy.

use std::fmt::Debug;

use reqwest::header::HeaderValue;

use crate::env::Environment;
use crate::error::{Error, Result};
use crate::product::Product;

/// A bearer token for the proxy.
///
/// The [`Debug`] representation does not reveal the token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyToken(String);

static_assertions::assert_impl_all!(ProxyToken: Send, Sync);

impl ProxyToken {
    /// Wrap the given `token`.
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    /// The token itself.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Proxy-Authorization` header value for this token, i.e. `Bearer <token>`.
    ///
    /// The header is marked as sensitive.  Fail if the token has characters which are not allowed
    /// in a header value.
    pub fn bearer_header(&self, product: Product) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))
            .map_err(|_| Error::InvalidToken(product))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl Debug for ProxyToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProxyToken(<redacted>)")
    }
}

/// Find the token for `product`.
///
/// Use `explicit` if given and not empty; otherwise look up `$<NAME>_TOKEN` in `env`, which covers
/// both the process environment and the `.env` file.
///
/// Return [`Error::MissingToken`] with setup instructions if no token was found.
pub fn resolve_token(
    explicit: Option<&str>,
    env: &Environment,
    product: Product,
) -> Result<ProxyToken> {
    explicit
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| env.var(&product.token_var()))
        .map(ProxyToken)
        .ok_or(Error::MissingToken(product))
}

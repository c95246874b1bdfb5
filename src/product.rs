// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The proxy products this crate talks to.
//!
//! ACP and GAP behave identically; they only differ in the names of their environment variables,
//! their configuration directory and their home page.  [`Product`] derives all of these from the
//! product name.

use std::fmt::Display;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// The proxy URL to use if `$<NAME>_PROXY_URL` is not set.
pub const DEFAULT_PROXY_URL: &str = "http://localhost:9443";

/// A local authenticating proxy product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Product {
    name: &'static str,
    slug: &'static str,
}

static_assertions::assert_impl_all!(Product: Send, Sync);

impl Product {
    /// The ACP proxy.
    pub const ACP: Product = Product::new("ACP", "acp");

    /// The GAP proxy.
    pub const GAP: Product = Product::new("GAP", "gap");

    /// Describe a product with the given display `name` and lowercase `slug`.
    ///
    /// The name is used for environment variables and messages, the slug for the configuration
    /// directory, the CLI command and the token prefix.
    pub const fn new(name: &'static str, slug: &'static str) -> Self {
        Self { name, slug }
    }

    /// The display name, e.g. `ACP`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The lowercase slug, e.g. `acp`.
    pub fn slug(&self) -> &'static str {
        self.slug
    }

    /// The environment variable holding the bearer token, e.g. `ACP_TOKEN`.
    pub fn token_var(&self) -> String {
        format!("{}_TOKEN", self.name)
    }

    /// The environment variable overriding the proxy URL, e.g. `ACP_PROXY_URL`.
    pub fn proxy_url_var(&self) -> String {
        format!("{}_PROXY_URL", self.name)
    }

    /// The key of the token in MCP server configuration, e.g. `acpToken`.
    pub fn config_key(&self) -> String {
        format!("{}Token", self.slug)
    }

    /// Where to find installation instructions.
    pub fn homepage(&self) -> String {
        format!("https://github.com/mikekelly/{}", self.slug)
    }

    /// The CA certificate path relative to the home directory, e.g. `.config/acp/ca.crt`.
    pub fn ca_cert_relative_path(&self) -> PathBuf {
        [".config", self.slug, "ca.crt"].iter().collect()
    }

    /// The CA certificate the proxy uses to intercept TLS connections.
    ///
    /// Return an error if the home directory cannot be determined.  This does not check whether
    /// the file exists.
    pub fn ca_cert_path(&self) -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(self.ca_cert_relative_path()))
            .ok_or(Error::NoHomeDirectory(*self))
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

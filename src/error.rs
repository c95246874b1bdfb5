// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors of this crate.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::product::Product;

/// Result with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to set up a proxied client.
#[derive(Debug, Error)]
pub enum Error {
    /// No token was given explicitly and none was found in the environment or `.env`.
    #[error("{}", missing_token_message(.0))]
    MissingToken(Product),
    /// The token contains characters not allowed in an HTTP header.
    #[error("{0} token contains characters which are not allowed in a Proxy-Authorization header")]
    InvalidToken(Product),
    /// The home directory, which holds the CA certificate, is unknown.
    #[error("Cannot determine the home directory to locate the {0} CA certificate")]
    NoHomeDirectory(Product),
    /// The CA certificate file does not exist.
    #[error("{}", missing_ca_message(.product, .path))]
    MissingCaCertificate {
        /// The product whose certificate is missing.
        product: Product,
        /// Where the certificate was expected.
        path: PathBuf,
    },
    /// The CA certificate exists but could not be read.
    #[error("Failed to read CA certificate from {}: {source}", .path.display())]
    ReadCaCertificate {
        /// The certificate file.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },
    /// The CA certificate file holds no valid PEM certificate.
    #[error("Invalid CA certificate at {}: {reason}", .path.display())]
    InvalidCaCertificate {
        /// The certificate file.
        path: PathBuf,
        /// Why the certificate was rejected.
        reason: String,
    },
    /// The configured proxy URL does not parse.
    #[error("Invalid proxy URL {url:?}: {source}")]
    InvalidProxyUrl {
        /// The offending value.
        url: String,
        /// The parse error.
        source: url::ParseError,
    },
    /// A request path could not be joined to the base URL.
    #[error("Cannot resolve {path:?} against base URL: {source}")]
    InvalidBaseUrl {
        /// The request path.
        path: String,
        /// The parse error.
        source: url::ParseError,
    },
    /// The underlying HTTP client failed.
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

static_assertions::assert_impl_all!(Error: Send, Sync);

fn missing_token_message(product: &Product) -> String {
    let var = product.token_var();
    let name = product.name();
    let slug = product.slug();
    format!(
        "{var} is required but not found.\n\n\
         To configure your {name} token:\n  \
         1. Generate a token: {slug} token create\n  \
         2. Set it via one of these methods:\n     \
         - Environment variable: export {var}={slug}_xxx\n     \
         - .env file in working directory: {var}={slug}_xxx\n     \
         - MCP config: {{ \"{key}\": \"{slug}_xxx\" }}\n\n\
         If {name} is not installed, visit {homepage}",
        key = product.config_key(),
        homepage = product.homepage(),
    )
}

fn missing_ca_message(product: &Product, path: &Path) -> String {
    format!(
        "{name} CA certificate not found at {path}.\n\n\
         If {name} is not installed, visit {homepage}",
        name = product.name(),
        path = path.display(),
        homepage = product.homepage(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_token_message_guides_setup() {
        assert_eq!(
            Error::MissingToken(Product::ACP).to_string(),
            "ACP_TOKEN is required but not found.\n\n\
             To configure your ACP token:\n  \
             1. Generate a token: acp token create\n  \
             2. Set it via one of these methods:\n     \
             - Environment variable: export ACP_TOKEN=acp_xxx\n     \
             - .env file in working directory: ACP_TOKEN=acp_xxx\n     \
             - MCP config: { \"acpToken\": \"acp_xxx\" }\n\n\
             If ACP is not installed, visit https://github.com/mikekelly/acp"
        );
    }

    #[test]
    fn missing_ca_message_names_path_and_homepage() {
        let error = Error::MissingCaCertificate {
            product: Product::GAP,
            path: PathBuf::from("/home/jane/.config/gap/ca.crt"),
        };
        assert_eq!(
            error.to_string(),
            "GAP CA certificate not found at /home/jane/.config/gap/ca.crt.\n\n\
             If GAP is not installed, visit https://github.com/mikekelly/gap"
        );
    }
}

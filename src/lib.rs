// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![deny(warnings, missing_docs, clippy::all)]

//! HTTP clients which talk through a local authenticating proxy.
//!
//! ACP and GAP are local proxies which intercept HTTPS traffic to inject credentials.  Clients
//! authenticate against the proxy with a bearer token, and must trust the CA the proxy uses to
//! re-encrypt intercepted connections.  This crate creates [`reqwest`] clients set up for this.
//!
//! ## Configuration
//!
//! - The token comes from [`ClientConfig::token`], or from `$ACP_TOKEN` or `$GAP_TOKEN`
//!   respectively.  The variables may also be set in a `.env` file in the working directory, but
//!   the process environment takes precedence.
//! - The proxy listens at `http://localhost:9443`, unless `$ACP_PROXY_URL` or `$GAP_PROXY_URL`
//!   says otherwise.
//! - The proxy CA is loaded from `~/.config/acp/ca.crt` or `~/.config/gap/ca.crt`, and trusted
//!   in addition to the built-in root certificates.
//!
//! ## Usage
//!
//! [`acp::create`] and [`gap::create`] create clients with process-wide factories, which cache a
//! [`agent::ProxyAgent`] per token:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use authproxy::{acp, ClientConfig};
//! use url::Url;
//!
//! let client = acp::create(
//!     ClientConfig::new().base_url(Url::parse("https://api.example.com")?),
//! )?;
//! let response = client.get("/status")?.send().await?;
//! println!("Status code: {}", response.status());
//! # Ok(())
//! # }
//! ```
//!
//! Use [`ClientFactory`] directly for explicit control over the environment and the CA location,
//! and [`ClientFactory::builder`] for client options not covered by [`ClientConfig`].

pub mod acp;
pub mod agent;
pub mod ca;
pub mod client;
pub mod env;
pub mod error;
pub mod gap;
pub mod product;
pub mod token;

pub use client::{ClientConfig, ClientFactory, ProxiedClient};
pub use error::{Error, Result};
pub use product::Product;
pub use token::ProxyToken;

pub use reqwest;

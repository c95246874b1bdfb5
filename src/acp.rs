// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clients for the [ACP](https://github.com/mikekelly/acp) proxy.
//!
//! ```no_run
//! # fn main() -> authproxy::Result<()> {
//! use authproxy::{acp, ClientConfig};
//!
//! // Uses $ACP_TOKEN, or ACP_TOKEN from .env
//! let client = acp::create(ClientConfig::new())?;
//!
//! // Or pass the token explicitly
//! let client = acp::create(ClientConfig::new().token("acp_xxx"))?;
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

use crate::client::{ClientConfig, ClientFactory, ProxiedClient};
use crate::error::Result;
use crate::product::Product;

/// The ACP product.
pub const PRODUCT: Product = Product::ACP;

/// The process-wide ACP client factory.
///
/// Built on first use, which also reads `.env` from the working directory.
pub fn factory() -> &'static ClientFactory {
    static FACTORY: OnceLock<ClientFactory> = OnceLock::new();
    FACTORY.get_or_init(|| ClientFactory::new(PRODUCT))
}

/// Create a client which sends all requests through the ACP proxy.
///
/// See [`ClientFactory::create`].
pub fn create(config: ClientConfig) -> Result<ProxiedClient> {
    factory().create(config)
}

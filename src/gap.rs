// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clients for the [GAP](https://github.com/mikekelly/gap) proxy.
//!
//! ```no_run
//! # fn main() -> authproxy::Result<()> {
//! use authproxy::{gap, ClientConfig};
//!
//! // Uses $GAP_TOKEN, or GAP_TOKEN from .env
//! let client = gap::create(ClientConfig::new())?;
//!
//! // Or pass the token explicitly
//! let client = gap::create(ClientConfig::new().token("gap_xxx"))?;
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

use crate::client::{ClientConfig, ClientFactory, ProxiedClient};
use crate::error::Result;
use crate::product::Product;

/// The GAP product.
pub const PRODUCT: Product = Product::GAP;

/// The process-wide GAP client factory.
///
/// Built on first use, which also reads `.env` from the working directory.
pub fn factory() -> &'static ClientFactory {
    static FACTORY: OnceLock<ClientFactory> = OnceLock::new();
    FACTORY.get_or_init(|| ClientFactory::new(PRODUCT))
}

/// Create a client which sends all requests through the GAP proxy.
///
/// See [`ClientFactory::create`].
pub fn create(config: ClientConfig) -> Result<ProxiedClient> {
    factory().create(config)
}

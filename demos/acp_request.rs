// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Send a request through the ACP proxy.
//!
//! Needs a running ACP proxy, its CA in `~/.config/acp/ca.crt`, and `$ACP_TOKEN`.  Pass `gap` as
//! first argument to use GAP instead.

use authproxy::{acp, gap, ClientConfig};
use url::Url;

async fn do_request() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::new()
        .base_url(Url::parse("https://httpbin.org")?)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
    let client = match std::env::args().nth(1).as_deref() {
        Some("gap") => gap::create(config)?,
        _ => acp::create(config)?,
    };

    let response = client.get("/status/200")?.send().await?;
    println!("Status code: {}", response.status());
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(error) = do_request().await {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

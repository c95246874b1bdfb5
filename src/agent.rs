// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Proxy agents, i.e. everything a client needs to talk through the proxy.
//!
//! A [`ProxyAgent`] bundles the proxy URL, the bearer token and the proxy CA.  It applies to a
//! [`reqwest::ClientBuilder`] with [`ProxyAgent::apply`]: all requests go through the proxy with
//! `Proxy-Authorization: Bearer <token>`, and TLS connections additionally trust the proxy CA.
//!
//! Agents are cached per token in an [`AgentCache`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::header::HeaderValue;
use reqwest::{Certificate, ClientBuilder, Proxy};
use url::Url;

use crate::ca::{load_ca_certificates, locate_ca_certificate};
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::product::{Product, DEFAULT_PROXY_URL};
use crate::token::ProxyToken;

/// Get the proxy URL for `product` from `$<NAME>_PROXY_URL`, or [`DEFAULT_PROXY_URL`].
pub fn proxy_url(env: &Environment, product: Product) -> Result<Url> {
    let url = env
        .var(&product.proxy_url_var())
        .unwrap_or_else(|| DEFAULT_PROXY_URL.to_string());
    Url::parse(&url).map_err(|source| Error::InvalidProxyUrl { url, source })
}

/// Route a client through the proxy of a product.
#[derive(Clone)]
pub struct ProxyAgent {
    product: Product,
    proxy_url: Url,
    authorization: HeaderValue,
    certificates: Vec<Certificate>,
}

static_assertions::assert_impl_all!(ProxyAgent: Send, Sync);

impl ProxyAgent {
    /// Create an agent from its parts.
    pub fn from_parts(
        product: Product,
        proxy_url: Url,
        token: &ProxyToken,
        certificates: Vec<Certificate>,
    ) -> Result<Self> {
        Ok(Self {
            product,
            proxy_url,
            authorization: token.bearer_header(product)?,
            certificates,
        })
    }

    /// Create an agent for `product` with the given `token`.
    ///
    /// Take the proxy URL from `env` (see [`proxy_url`]), and load the CA from `ca_cert_path`.
    /// Fail if the proxy URL is invalid or if the CA certificate is missing or invalid.
    pub fn new(
        product: Product,
        token: &ProxyToken,
        env: &Environment,
        ca_cert_path: &Path,
    ) -> Result<Self> {
        let proxy_url = proxy_url(env, product)?;
        let path = locate_ca_certificate(product, ca_cert_path)?;
        let certificates = load_ca_certificates(&path)?;
        log::debug!(
            "Created {} proxy agent for {} with CA {}",
            product,
            proxy_url,
            path.display()
        );
        Self::from_parts(product, proxy_url, token, certificates)
    }

    /// The product whose proxy this agent talks to.
    pub fn product(&self) -> Product {
        self.product
    }

    /// The URL of the proxy.
    pub fn proxy_url(&self) -> &Url {
        &self.proxy_url
    }

    /// The additional trusted CA certificates.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// A proxy for all URLs which authenticates with the bearer token.
    ///
    /// The `Proxy-Authorization` header goes to the proxy for plain HTTP requests as well as for
    /// `CONNECT` tunnels to HTTPS endpoints.
    pub fn proxy(&self) -> Result<Proxy> {
        Ok(Proxy::all(self.proxy_url.as_str())?.custom_http_auth(self.authorization.clone()))
    }

    /// Configure `builder` to use this agent.
    ///
    /// Route all requests through the proxy, ignoring any proxy settings from the environment,
    /// and trust the proxy CA in addition to the built-in root certificates.
    pub fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder> {
        let builder = builder.no_proxy().proxy(self.proxy()?);
        Ok(self
            .certificates
            .iter()
            .cloned()
            .fold(builder, ClientBuilder::add_root_certificate))
    }
}

impl std::fmt::Debug for ProxyAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyAgent")
            .field("product", &self.product)
            .field("proxy_url", &self.proxy_url.as_str())
            .field("certificates", &self.certificates.len())
            .finish_non_exhaustive()
    }
}

/// Proxy agents by token.
///
/// Agents are created on first use of a token and then reused for as long as the cache lives.
/// Failed creations are not cached.
#[derive(Debug, Default)]
pub struct AgentCache {
    agents: Mutex<HashMap<ProxyToken, Arc<ProxyAgent>>>,
}

static_assertions::assert_impl_all!(AgentCache: Send, Sync);

impl AgentCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the agent for `token`, or create it with `create`.
    ///
    /// The cache stays locked while `create` runs, so concurrent callers with the same token never
    /// create two agents.
    pub fn get_or_try_insert_with<F>(
        &self,
        token: &ProxyToken,
        create: F,
    ) -> Result<Arc<ProxyAgent>>
    where
        F: FnOnce() -> Result<ProxyAgent>,
    {
        let mut agents = self.agents.lock();
        if let Some(agent) = agents.get(token) {
            log::debug!("Reusing cached {} proxy agent", agent.product());
            return Ok(agent.clone());
        }
        let agent = Arc::new(create()?);
        agents.insert(token.clone(), agent.clone());
        Ok(agent)
    }

    /// The cached agent for `token`, if any.
    pub fn get(&self, token: &ProxyToken) -> Option<Arc<ProxyAgent>> {
        self.agents.lock().get(token).cloned()
    }

    /// The number of cached agents.
    pub fn len(&self) -> usize {
        self.agents.lock().len()
    }

    /// Whether no agent is cached.
    pub fn is_empty(&self) -> bool {
        self.agents.lock().is_empty()
    }

    /// Drop all cached agents.
    pub fn clear(&self) {
        self.agents.lock().clear();
    }
}

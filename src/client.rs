// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Create HTTP clients which talk through the proxy.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use url::Url;

use crate::agent::{AgentCache, ProxyAgent};
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::product::Product;
use crate::token::{resolve_token, ProxyToken};

/// Options for a new client.
///
/// Besides the usual client options this holds an optional explicit token; if unset the token
/// comes from the environment.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Resolve relative request paths against this URL.
    pub base_url: Option<Url>,
    /// Total timeout for each request.
    pub timeout: Option<Duration>,
    /// Timeout for connecting to the proxy.
    pub connect_timeout: Option<Duration>,
    /// The `User-Agent` header.
    pub user_agent: Option<String>,
    /// Headers to send with every request.
    pub default_headers: HeaderMap,
    /// The proxy token; overrides `$<NAME>_TOKEN`.
    pub token: Option<String>,
}

impl ClientConfig {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set headers to send with every request.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Use an explicit proxy token.
    pub fn token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    fn apply(&self, mut builder: ClientBuilder) -> ClientBuilder {
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        if !self.default_headers.is_empty() {
            builder = builder.default_headers(self.default_headers.clone());
        }
        builder
    }
}

/// A client which sends all requests through the proxy.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ProxiedClient {
    client: Client,
    base_url: Option<Url>,
}

static_assertions::assert_impl_all!(ProxiedClient: Send, Sync);

impl ProxiedClient {
    /// Wrap a `client` which already routes through the proxy.
    pub fn new(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    /// The underlying client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The base URL for relative paths.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve `path` against the base URL.
    ///
    /// Absolute URLs are returned as they are.  Without a base URL `path` must be absolute.
    pub fn url(&self, path: &str) -> Result<Url> {
        let result = match &self.base_url {
            Some(base) => base.join(path),
            None => Url::parse(path),
        };
        result.map_err(|source| Error::InvalidBaseUrl {
            path: path.to_string(),
            source,
        })
    }

    /// Start a request with `method` to `path`.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// Start a `GET` request.
    pub fn get(&self, path: &str) -> Result<RequestBuilder> {
        self.request(Method::GET, path)
    }

    /// Start a `POST` request.
    pub fn post(&self, path: &str) -> Result<RequestBuilder> {
        self.request(Method::POST, path)
    }

    /// Start a `PUT` request.
    pub fn put(&self, path: &str) -> Result<RequestBuilder> {
        self.request(Method::PUT, path)
    }

    /// Start a `PATCH` request.
    pub fn patch(&self, path: &str) -> Result<RequestBuilder> {
        self.request(Method::PATCH, path)
    }

    /// Start a `DELETE` request.
    pub fn delete(&self, path: &str) -> Result<RequestBuilder> {
        self.request(Method::DELETE, path)
    }

    /// Start a `HEAD` request.
    pub fn head(&self, path: &str) -> Result<RequestBuilder> {
        self.request(Method::HEAD, path)
    }
}

/// Create clients for the proxy of one product.
///
/// The factory caches one [`ProxyAgent`] per token, so the proxy URL and the CA certificate are
/// only read on first use of a token.
#[derive(Debug)]
pub struct ClientFactory {
    product: Product,
    env: Environment,
    ca_cert_path: Option<PathBuf>,
    agents: AgentCache,
}

static_assertions::assert_impl_all!(ClientFactory: Send, Sync);

impl ClientFactory {
    /// A factory for `product`, configured from the process environment and `.env`.
    ///
    /// Reads `.env` from the current working directory right away.
    pub fn new(product: Product) -> Self {
        Self::with_environment(product, Environment::from_working_dir())
    }

    /// A factory for `product`, configured from `env`.
    pub fn with_environment(product: Product, env: Environment) -> Self {
        Self {
            product,
            env,
            ca_cert_path: None,
            agents: AgentCache::new(),
        }
    }

    /// Load the CA certificate from `path` instead of the product's default location.
    pub fn with_ca_cert_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    /// The product of this factory.
    pub fn product(&self) -> Product {
        self.product
    }

    /// The environment this factory takes tokens and proxy URLs from.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// The cached agents.
    pub fn agents(&self) -> &AgentCache {
        &self.agents
    }

    /// Where this factory loads the CA certificate from.
    pub fn ca_cert_path(&self) -> Result<PathBuf> {
        match &self.ca_cert_path {
            Some(path) => Ok(path.clone()),
            None => self.product.ca_cert_path(),
        }
    }

    /// Find the token to use, from `explicit` or the environment.
    pub fn token(&self, explicit: Option<&str>) -> Result<ProxyToken> {
        resolve_token(explicit, &self.env, self.product)
    }

    /// Get the agent for `token`, creating it on first use.
    pub fn agent(&self, token: &ProxyToken) -> Result<Arc<ProxyAgent>> {
        self.agents.get_or_try_insert_with(token, || {
            ProxyAgent::new(self.product, token, &self.env, &self.ca_cert_path()?)
        })
    }

    /// A client builder configured with `config` and routed through the proxy.
    ///
    /// Use this to set options [`ClientConfig`] does not cover.  Note that the base URL and the
    /// token of `config` do not apply to the builder; the token selects the agent.
    pub fn builder(&self, config: &ClientConfig) -> Result<ClientBuilder> {
        let token = self.token(config.token.as_deref())?;
        let agent = self.agent(&token)?;
        agent.apply(config.apply(Client::builder()))
    }

    /// Create a client from `config` which sends all requests through the proxy.
    ///
    /// Fail if no token can be found, if the CA certificate is missing, or if the client cannot
    /// be built.
    pub fn create(&self, config: ClientConfig) -> Result<ProxiedClient> {
        let client = self.builder(&config)?.build()?;
        Ok(ProxiedClient::new(client, config.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::DotEnv;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ca.crt")
    }

    fn factory(product: Product, dotenv: &str) -> ClientFactory {
        ClientFactory::with_environment(product, Environment::with_dotenv(DotEnv::parse(dotenv)))
            .with_ca_cert_path(fixture())
    }

    #[test]
    fn create_with_explicit_token() {
        temp_env::with_vars_unset(vec!["ACP_TOKEN", "ACP_PROXY_URL"], || {
            let factory = factory(Product::ACP, "");
            let client = factory
                .create(ClientConfig::new().token("acp_explicit"))
                .unwrap();
            assert!(client.base_url().is_none());
            assert!(factory
                .agents()
                .get(&ProxyToken::new("acp_explicit"))
                .is_some());
        })
    }

    #[test]
    fn create_with_token_from_dotenv() {
        temp_env::with_vars_unset(vec!["GAP_TOKEN", "GAP_PROXY_URL"], || {
            let factory = factory(Product::GAP, "GAP_TOKEN=gap_dotenv\n");
            factory.create(ClientConfig::new()).unwrap();
            assert!(factory
                .agents()
                .get(&ProxyToken::new("gap_dotenv"))
                .is_some());
        })
    }

    #[test]
    fn create_without_token() {
        temp_env::with_var_unset("ACP_TOKEN", || {
            let error = factory(Product::ACP, "")
                .create(ClientConfig::new())
                .unwrap_err();
            assert!(matches!(error, Error::MissingToken(Product::ACP)), "{error:?}");
        })
    }

    #[test]
    fn create_without_ca_certificate() {
        temp_env::with_var_unset("GAP_PROXY_URL", || {
            let dir = tempfile::tempdir().unwrap();
            let factory =
                ClientFactory::with_environment(Product::GAP, Environment::process_only())
                    .with_ca_cert_path(dir.path().join("ca.crt"));
            let error = factory
                .create(ClientConfig::new().token("gap_123"))
                .unwrap_err();
            assert!(matches!(error, Error::MissingCaCertificate { .. }), "{error:?}");
            assert!(factory.agents().is_empty());
        })
    }

    #[test]
    fn create_reuses_agent_per_token() {
        temp_env::with_var_unset("ACP_PROXY_URL", || {
            let factory = factory(Product::ACP, "");
            let token = ProxyToken::new("acp_1");
            let first = factory.agent(&token).unwrap();
            factory.create(ClientConfig::new().token("acp_1")).unwrap();
            factory.create(ClientConfig::new().token("acp_2")).unwrap();
            assert!(Arc::ptr_eq(&first, &factory.agent(&token).unwrap()));
            assert_eq!(factory.agents().len(), 2);
        })
    }

    #[test]
    fn create_with_options() {
        let mut headers = HeaderMap::new();
        headers.insert("x-test", HeaderValue::from_static("yes"));
        let config = ClientConfig::new()
            .base_url(Url::parse("https://api.example.com/v1/").unwrap())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("authproxy-test")
            .default_headers(headers)
            .token("acp_123");
        temp_env::with_var_unset("ACP_PROXY_URL", || {
            let client = factory(Product::ACP, "").create(config).unwrap();
            assert_eq!(
                client.base_url().map(Url::as_str),
                Some("https://api.example.com/v1/")
            );
        })
    }

    #[test]
    fn default_ca_cert_path() {
        let factory = ClientFactory::with_environment(Product::ACP, Environment::process_only());
        assert_eq!(
            factory.ca_cert_path().unwrap(),
            Product::ACP.ca_cert_path().unwrap()
        );
    }

    #[test]
    fn url_joins_base() {
        let client = ProxiedClient::new(
            Client::new(),
            Some(Url::parse("https://api.example.com/v1/").unwrap()),
        );
        assert_eq!(
            client.url("users/42").unwrap().as_str(),
            "https://api.example.com/v1/users/42"
        );
        assert_eq!(
            client.url("/status").unwrap().as_str(),
            "https://api.example.com/status"
        );
        assert_eq!(
            client.url("https://other.example.com/x").unwrap().as_str(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn url_without_base() {
        let client = ProxiedClient::new(Client::new(), None);
        assert_eq!(
            client.url("https://api.example.com/").unwrap().as_str(),
            "https://api.example.com/"
        );
        let error = client.url("relative/path").unwrap_err();
        match error {
            Error::InvalidBaseUrl { path, .. } => assert_eq!(path, "relative/path"),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn request_uses_method_and_url() {
        let client = ProxiedClient::new(
            Client::new(),
            Some(Url::parse("https://api.example.com/").unwrap()),
        );
        let request = client.delete("items/1").unwrap().build().unwrap();
        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(request.url().as_str(), "https://api.example.com/items/1");
    }
}

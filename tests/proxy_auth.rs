// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Send requests to a stub proxy and check what arrives there.

use std::path::PathBuf;

use authproxy::env::{DotEnv, Environment};
use authproxy::{ClientConfig, ClientFactory, Product};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

// A product of its own, so that no variables from the real environment leak into the tests.
const PRODUCT: Product = Product::new("AUTHPROXYTEST", "authproxytest");

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ca.crt")
}

/// Accept one connection, capture the request head, and answer with `response`.
async fn stub_proxy(response: &'static str) -> (Url, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buffer = [0; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = socket.read(&mut buffer).await.unwrap();
            if read == 0 {
                break;
            }
            head.extend_from_slice(&buffer[..read]);
        }
        tx.send(String::from_utf8_lossy(&head).to_lowercase())
            .unwrap();
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    (url, rx)
}

fn factory(proxy_url: &Url, token: Option<&str>) -> ClientFactory {
    let mut dotenv = format!("AUTHPROXYTEST_PROXY_URL={proxy_url}\n");
    if let Some(token) = token {
        dotenv.push_str(&format!("AUTHPROXYTEST_TOKEN={token}\n"));
    }
    ClientFactory::with_environment(PRODUCT, Environment::with_dotenv(DotEnv::parse(dotenv)))
        .with_ca_cert_path(fixture())
}

#[tokio::test]
async fn http_request_goes_through_proxy_with_bearer_token() {
    let (proxy_url, head) =
        stub_proxy("HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok").await;
    let client = factory(&proxy_url, Some("test_token"))
        .create(ClientConfig::new().base_url(Url::parse("http://upstream.invalid/api/").unwrap()))
        .unwrap();

    let response = client.get("hello").unwrap().send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let head = head.await.unwrap();
    assert!(
        head.starts_with("get http://upstream.invalid/api/hello http/1.1\r\n"),
        "{head}"
    );
    assert!(
        head.contains("proxy-authorization: bearer test_token\r\n"),
        "{head}"
    );
}

#[tokio::test]
async fn https_request_tunnels_through_proxy_with_bearer_token() {
    let (proxy_url, head) = stub_proxy("HTTP/1.1 502 Bad Gateway\r\n\r\n").await;
    let client = factory(&proxy_url, None)
        .create(ClientConfig::new().token("explicit_token"))
        .unwrap();

    let result = client
        .get("https://upstream.invalid/secure")
        .unwrap()
        .send()
        .await;
    assert!(result.is_err());

    let head = head.await.unwrap();
    assert!(
        head.starts_with("connect upstream.invalid:443 http/1.1\r\n"),
        "{head}"
    );
    assert!(
        head.contains("proxy-authorization: bearer explicit_token\r\n"),
        "{head}"
    );
}

#[tokio::test]
async fn missing_token_is_reported() {
    let proxy_url = Url::parse("http://127.0.0.1:9").unwrap();
    let error = factory(&proxy_url, None)
        .create(ClientConfig::new())
        .unwrap_err();
    assert!(
        error
            .to_string()
            .starts_with("AUTHPROXYTEST_TOKEN is required but not found."),
        "{error}"
    );
}

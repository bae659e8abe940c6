//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_gateway::config::{GatewayConfig, ProxyRule, ServiceConfig};
use api_gateway::{bootstrap, Shutdown};
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const ISSUER: &str = "http://id.test/realms/hub";
const SECRET: &[u8] = b"gateway-integration-secret-0123456789";
const SECRET_B64URL: &str = "Z2F0ZXdheS1pbnRlZ3JhdGlvbi1zZWNyZXQtMDEyMzQ1Njc4OQ";

/// A raw-TCP backend answering `"<name> <request-target>"`.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Request head (request line and headers) of the latest request, lowercased.
    pub fn last_request(&self) -> String {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

/// Start a mock backend that waits `delay` before answering.
pub async fn start_backend(name: &'static str, delay: Duration) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&head).to_string();
                let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                recorded.lock().unwrap().push(head);

                tokio::time::sleep(delay).await;

                let body = format!("{} {}", name, target);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockBackend { addr, requests }
}

/// A backend that sends its head and part of the body, then goes silent.
pub async fn start_stalling_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut chunk = [0u8; 1024];
                let _ = socket.read(&mut chunk).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                    .await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn service(name: &str, url: &str, prefix: &str, rewrite: &str) -> ServiceConfig {
    ServiceConfig {
        name: name.to_string(),
        url: url.to_string(),
        replicas: Vec::new(),
        proxy: ProxyRule {
            prefix: prefix.to_string(),
            rewrite: rewrite.to_string(),
        },
    }
}

/// Configuration trusting the test signing key.
pub fn gateway_config(services: Vec<ServiceConfig>) -> (GatewayConfig, tempfile::NamedTempFile) {
    let keys = tempfile::NamedTempFile::new().unwrap();
    let jwks = serde_json::json!({
        "keys": [{ "kty": "oct", "kid": "k1", "alg": "HS256", "k": SECRET_B64URL }]
    });
    std::fs::write(keys.path(), jwks.to_string()).unwrap();

    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.services = services;
    config.identity.issuer_url = ISSUER.to_string();
    config.identity.jwks_file = Some(keys.path().to_path_buf());
    config.identity.allowed_algorithms = vec![Algorithm::HS256];
    (config, keys)
}

pub fn token_with(issuer: &str, exp_offset: i64, secret: &[u8]) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("k1".to_string());
    let claims = serde_json::json!({
        "sub": "user-1",
        "iss": issuer,
        "exp": get_current_timestamp() as i64 + exp_offset,
        "preferred_username": "ada",
    });
    encode(&header, &claims, &EncodingKey::from_secret(secret)).unwrap()
}

/// A valid token for the test issuer.
pub fn token() -> String {
    token_with(ISSUER, 3600, SECRET)
}

pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Bootstrap and serve a gateway on an ephemeral port.
pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let server = bootstrap(config).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestGateway {
        addr,
        shutdown,
        updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

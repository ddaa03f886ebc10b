use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Body returned by the backend. `reply` may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub reply: Option<String>,
}

/// Why a remote exchange failed
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend timed out")]
    Timeout,
    #[error("backend responded with status {0}")]
    Status(StatusCode),
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl ExchangeError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout
        } else if err.is_decode() {
            ExchangeError::Malformed(err.to_string())
        } else {
            ExchangeError::Transport(err.to_string())
        }
    }
}

/// A single request/response exchange with the chat backend
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn exchange(&self, message: &str) -> Result<BackendReply, ExchangeError>;

    /// Where requests go, for logging
    fn endpoint(&self) -> &str;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn exchange(&self, message: &str) -> Result<BackendReply, ExchangeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(ExchangeError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ExchangeError::Status(response.status()));
        }

        response
            .json::<BackendReply>()
            .await
            .map_err(ExchangeError::from_reqwest)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Minimal HTTP server answering every connection with a canned response
#[cfg(test)]
pub(crate) mod test_server {
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    pub struct TestServer {
        pub addr: SocketAddr,
        pub requests: mpsc::UnboundedReceiver<String>,
    }

    impl TestServer {
        pub fn url(&self) -> String {
            format!("http://{}/chat", self.addr)
        }
    }

    pub async fn serve(status_line: &'static str, body: &'static str) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, requests) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    let _ = tx.send(request);
                    let response = format!(
                        "HTTP/1.1 {}\r\n\
                         Content-Type: application/json\r\n\
                         Content-Length: {}\r\n\
                         Connection: close\r\n\
                         \r\n\
                         {}",
                        status_line,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        TestServer { addr, requests }
    }

    /// Accepts connections and never answers them
    pub async fn serve_silent() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        addr
    }

    /// An address nothing listens on
    pub async fn closed_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            data.extend_from_slice(&buf[..n]);
            if let Some(header_end) = find_header_end(&data) {
                let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    fn find_header_end(data: &[u8]) -> Option<usize> {
        data.windows(4).position(|w| w == b"\r\n\r\n")
    }
}

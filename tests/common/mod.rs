//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use json_lb::config::LbConfig;
use json_lb::{HttpServer, Pool, Shutdown};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// What the mock answers on `POST /json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonBehavior {
    /// 200 with the request body and a JSON content type.
    Echo,
    /// The given status with a short text body.
    Status(u16),
    /// Close the connection without answering.
    Drop,
}

/// A programmable backend speaking just enough HTTP/1.1.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    healthy: Arc<AtomicBool>,
    behavior: Arc<Mutex<JsonBehavior>>,
    json_calls: Arc<AtomicU32>,
    health_calls: Arc<AtomicU32>,
}

impl MockBackend {
    pub async fn start(behavior: JsonBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let backend = Self {
            addr: listener.local_addr().unwrap(),
            healthy: Arc::new(AtomicBool::new(true)),
            behavior: Arc::new(Mutex::new(behavior)),
            json_calls: Arc::new(AtomicU32::new(0)),
            health_calls: Arc::new(AtomicU32::new(0)),
        };

        let server = backend.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let server = server.clone();
                        tokio::spawn(async move {
                            let _ = server.handle(socket).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        backend
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_behavior(&self, behavior: JsonBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn json_calls(&self) -> u32 {
        self.json_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> u32 {
        self.health_calls.load(Ordering::SeqCst)
    }

    async fn handle(&self, socket: TcpStream) -> std::io::Result<()> {
        let mut reader = BufReader::new(socket);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 || line == "\r\n" {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await?;
        let mut socket = reader.into_inner();

        let (status, content_type, payload) = match (method.as_str(), path.as_str()) {
            ("GET", "/health") => {
                self.health_calls.fetch_add(1, Ordering::SeqCst);
                if self.healthy.load(Ordering::SeqCst) {
                    (200, None, Vec::new())
                } else {
                    (503, None, Vec::new())
                }
            }
            ("POST", "/json") => {
                self.json_calls.fetch_add(1, Ordering::SeqCst);
                let behavior = *self.behavior.lock().unwrap();
                match behavior {
                    JsonBehavior::Echo => (200, Some("application/json"), body),
                    JsonBehavior::Status(code) => (code, Some("text/plain"), b"error".to_vec()),
                    JsonBehavior::Drop => {
                        drop(socket);
                        return Ok(());
                    }
                }
            }
            _ => (404, None, Vec::new()),
        };

        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            status,
            reason(status),
            payload.len()
        );
        if let Some(ct) = content_type {
            head.push_str(&format!("Content-Type: {}\r\n", ct));
        }
        head.push_str("\r\n");

        socket.write_all(head.as_bytes()).await?;
        socket.write_all(&payload).await?;
        socket.shutdown().await
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Timings small enough for tests; latency never makes a target unavailable.
pub fn fast_config() -> LbConfig {
    let mut config = LbConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.pool.availability_threshold_ms = 10_000.0;
    config.health_check.liveness_interval_ms = 50;
    config.health_check.probe_timeout_ms = 500;
    config.health_check.probe_retry_delay_ms = 10;
    config.health_check.latency_interval_ms = 50;
    config.health_check.stale_after_ms = 60_000;
    config.proxy.forward_timeout_secs = 5;
    config.proxy.retry_delay_ms = 300;
    config
}

/// A balancer running on an ephemeral port.
pub struct RunningBalancer {
    pub addr: SocketAddr,
    pub pool: Arc<Pool>,
    pub shutdown: Shutdown,
}

impl RunningBalancer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningBalancer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_balancer(config: LbConfig) -> RunningBalancer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, &shutdown).unwrap();
    let pool = server.pool();

    let run_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, run_shutdown).await;
    });

    RunningBalancer {
        addr,
        pool,
        shutdown,
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F>(timeout: Duration, check: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

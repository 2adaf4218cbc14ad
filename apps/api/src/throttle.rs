//! Fixed-window counter for anonymous `/api/analyze` calls.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::errors::AppError;

/// Key used when neither a peer address nor a trusted forwarding header is available.
const SHARED_BUCKET: &str = "anonymous";

/// INCR and EXPIRE in one step, so a key never outlives its window.
const INCREMENT_SCRIPT: &str = r#"
    local count = redis.call('INCR', KEYS[1])
    if count == 1 then
        redis.call('EXPIRE', KEYS[1], ARGV[1])
    end
    return count
"#;

#[async_trait]
pub trait Throttle: Send + Sync {
    /// Records one hit for `key` and returns the number of hits in the current window.
    async fn hit(&self, key: &str, window: Duration) -> Result<u64>;
}

pub struct RedisThrottle {
    client: redis::Client,
}

impl RedisThrottle {
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid REDIS_URL")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Throttle for RedisThrottle {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Redis connection failed")?;
        let count: u64 = redis::Script::new(INCREMENT_SCRIPT)
            .key(format!("throttle:analyze:{key}"))
            .arg(window.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .context("Redis INCR failed")?;
        Ok(count)
    }
}

#[derive(Default)]
pub struct MemoryThrottle {
    windows: Mutex<HashMap<String, (Instant, u64)>>,
}

#[async_trait]
impl Throttle for MemoryThrottle {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, (started, _)| now.duration_since(*started) < window);
        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        entry.1 += 1;
        Ok(entry.1)
    }
}

/// The anonymous-analysis limit as applied by the analyze handler.
#[derive(Clone)]
pub struct AnonThrottle {
    backend: Arc<dyn Throttle>,
    limit: u32,
    window: Duration,
}

impl AnonThrottle {
    pub fn new(backend: Arc<dyn Throttle>, limit: u32, window: Duration) -> Self {
        Self {
            backend,
            limit,
            window,
        }
    }

    /// Counts the call against `key`; `RateLimited` once the window's limit is passed.
    /// A backend failure lets the call through.
    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        match self.backend.hit(key, self.window).await {
            Ok(count) if count > u64::from(self.limit) => {
                info!("Anonymous analyze limit reached for {key} ({count} calls)");
                Err(AppError::RateLimited)
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Throttle backend unavailable, allowing request: {e:#}");
                Ok(())
            }
        }
    }
}

/// Client identity for the anonymous limit.
///
/// Behind a trusted proxy: first `X-Forwarded-For` hop, else `X-Real-IP`. Otherwise
/// those headers are client-controlled and ignored. Falls back to the peer IP, then
/// to the shared bucket.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let forwarded = trust_proxy
        .then(|| {
            header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .or_else(|| header("x-real-ip"))
        })
        .flatten();

    match (forwarded, peer) {
        (Some(forwarded), _) => forwarded.to_string(),
        (None, Some(peer)) => peer.ip().to_string(),
        (None, None) => SHARED_BUCKET.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn throttle(limit: u32) -> AnonThrottle {
        AnonThrottle::new(
            Arc::new(MemoryThrottle::default()),
            limit,
            Duration::from_secs(60),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_applies_per_key_and_resets_after_window() {
        let throttle = throttle(2);
        assert!(throttle.check("1.2.3.4").await.is_ok());
        assert!(throttle.check("1.2.3.4").await.is_ok());
        assert!(matches!(
            throttle.check("1.2.3.4").await,
            Err(AppError::RateLimited)
        ));
        assert!(throttle.check("5.6.7.8").await.is_ok());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(throttle.check("1.2.3.4").await.is_ok());
    }

    struct Broken;

    #[async_trait]
    impl Throttle for Broken {
        async fn hit(&self, _key: &str, _window: Duration) -> Result<u64> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_backend_failure_allows_request() {
        let throttle = AnonThrottle::new(Arc::new(Broken), 1, Duration::from_secs(60));
        assert!(throttle.check("k").await.is_ok());
        assert!(throttle.check("k").await.is_ok());
    }

    fn peer(addr: &str) -> Option<SocketAddr> {
        Some(addr.parse().unwrap())
    }

    fn forwarded_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers
    }

    #[test]
    fn test_client_key_uses_peer_ip_for_direct_clients() {
        let headers = HeaderMap::new();
        assert_eq!(client_key(&headers, peer("198.51.100.4:5120"), false), "198.51.100.4");
        assert_eq!(client_key(&headers, peer("198.51.100.4:6001"), false), "198.51.100.4");
        assert_eq!(client_key(&headers, None, false), "anonymous");
    }

    #[test]
    fn test_forwarding_headers_ignored_without_trusted_proxy() {
        let key = client_key(&forwarded_headers(), peer("198.51.100.4:5120"), false);
        assert_eq!(key, "198.51.100.4");
    }

    #[test]
    fn test_trusted_proxy_prefers_first_forwarded_hop() {
        let mut headers = forwarded_headers();
        let proxy = peer("10.0.0.1:443");
        assert_eq!(client_key(&headers, proxy, true), "203.0.113.7");

        headers.remove("x-forwarded-for");
        assert_eq!(client_key(&headers, proxy, true), "10.0.0.2");

        headers.remove("x-real-ip");
        assert_eq!(client_key(&headers, proxy, true), "10.0.0.1");
    }

    #[tokio::test]
    async fn test_direct_clients_do_not_share_a_budget() {
        let throttle = throttle(5);
        let headers = HeaderMap::new();
        for _ in 0..5 {
            let key = client_key(&headers, peer("198.51.100.4:5120"), false);
            assert!(throttle.check(&key).await.is_ok());
        }
        let key = client_key(&headers, peer("198.51.100.4:5121"), false);
        assert!(throttle.check(&key).await.is_err());

        let other = client_key(&headers, peer("192.0.2.9:7000"), false);
        assert!(throttle.check(&other).await.is_ok());
    }

    #[tokio::test]
    async fn test_spoofed_forwarded_for_does_not_reset_the_limit() {
        let throttle = throttle(1);
        let direct = peer("198.51.100.4:5120");

        let key = client_key(&HeaderMap::new(), direct, false);
        assert!(throttle.check(&key).await.is_ok());

        let mut spoofed = HeaderMap::new();
        spoofed.insert("x-forwarded-for", HeaderValue::from_static("1.1.1.1"));
        let key = client_key(&spoofed, direct, false);
        assert!(matches!(throttle.check(&key).await, Err(AppError::RateLimited)));
    }
}

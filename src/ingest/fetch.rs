// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Payload fetching: HTTP with cache, retry, and per-host rate limiting.
//!
//! Blocking `reqwest` on worker threads, no async runtime - the build phase
//! is a handful of downloads, not a proxy server. Three layers:
//!
//! 1. **Cache**: payloads land on disk keyed by the URL's SHA-256, with a
//!    TTL (default 7 days). Rebuilds within the TTL never touch the network.
//! 2. **Rate limit**: leaky bucket per host, one request per second by
//!    default. Public mirrors ban the impatient.
//! 3. **Retry**: up to three attempts with exponential backoff, starting at
//!    250 ms. Only transient failures retry; a 404 is not going to improve.
//!
//! `file://` URLs and bare paths bypass all three and read the filesystem.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

/// Fetch tuning; every value is a configuration input.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Directory for cached payloads; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// How long a cached payload stays fresh.
    pub cache_ttl: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum spacing between requests to the same host.
    pub per_host_interval: Duration,
    /// Total attempts per URL (first try included).
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles each retry.
    pub backoff_base: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            cache_dir: None,
            cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            timeout: Duration::from_secs(30),
            per_host_interval: Duration::from_secs(1),
            max_attempts: 3,
            backoff_base: Duration::from_millis(250),
        }
    }
}

/// Shared fetcher: one blocking client, one rate-limiter table. Clone-free;
/// workers borrow it.
pub struct Fetcher {
    client: reqwest::blocking::Client,
    options: FetchOptions,
    /// host -> earliest instant the next request may fire.
    next_allowed: Mutex<HashMap<String, Instant>>,
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("glossa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Fetcher {
            client,
            options,
            next_allowed: Mutex::new(HashMap::new()),
        })
    }

    /// Fetch one URL, honoring cache, rate limit, and retries.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(path) = local_path(url) {
            return Ok(std::fs::read(&path)?);
        }

        if let Some(cached) = self.read_cache(url) {
            tracing::debug!(url, "payload served from cache");
            return Ok(cached);
        }

        let mut backoff = self.options.backoff_base;
        let mut last_err = String::new();

        for attempt in 1..=self.options.max_attempts {
            if attempt > 1 {
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            self.wait_for_host_slot(url);

            match self.try_fetch(url) {
                Ok(body) => {
                    self.write_cache(url, &body);
                    return Ok(body);
                }
                Err(TryFetchError::Fatal(reason)) => {
                    return Err(Error::Fetch {
                        url: url.to_string(),
                        reason,
                    });
                }
                Err(TryFetchError::Transient(reason)) => {
                    tracing::warn!(url, attempt, %reason, "fetch attempt failed");
                    last_err = reason;
                }
            }
        }

        Err(Error::Fetch {
            url: url.to_string(),
            reason: format!(
                "giving up after {} attempts: {last_err}",
                self.options.max_attempts
            ),
        })
    }

    fn try_fetch(&self, url: &str) -> std::result::Result<Vec<u8>, TryFetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TryFetchError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .bytes()
                .map(|b| b.to_vec())
                .map_err(|e| TryFetchError::Transient(e.to_string()))
        } else if status.is_server_error() || status.as_u16() == 429 {
            Err(TryFetchError::Transient(format!("HTTP {status}")))
        } else {
            Err(TryFetchError::Fatal(format!("HTTP {status}")))
        }
    }

    /// Leaky bucket: claim the host's next slot, then sleep until it opens.
    fn wait_for_host_slot(&self, url: &str) {
        let Some(host) = host_of(url) else { return };
        let now = Instant::now();
        let wait = {
            let mut table = self.next_allowed.lock();
            let slot = table.entry(host).or_insert(now);
            let wait = slot.saturating_duration_since(now);
            *slot = (*slot).max(now) + self.options.per_host_interval;
            wait
        };
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }

    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        let dir = self.options.cache_dir.as_ref()?;
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = hasher.finalize();
        let mut name = String::with_capacity(40);
        for b in &digest[..16] {
            name.push_str(&format!("{b:02x}"));
        }
        name.push_str(".payload");
        Some(dir.join(name))
    }

    fn read_cache(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.cache_path(url)?;
        let modified = std::fs::metadata(&path).ok()?.modified().ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;
        if age > self.options.cache_ttl {
            return None;
        }
        std::fs::read(&path).ok()
    }

    fn write_cache(&self, url: &str, body: &[u8]) {
        let Some(path) = self.cache_path(url) else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&path, body) {
            tracing::warn!(url, error = %e, "failed to write payload cache");
        }
    }
}

enum TryFetchError {
    /// Worth retrying: network error, 5xx, 429.
    Transient(String),
    /// Not worth retrying: 4xx and friends.
    Fatal(String),
}

/// Local path for `file://` URLs and bare paths; `None` for http(s).
fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(stripped) = url.strip_prefix("file://") {
        return Some(PathBuf::from(stripped));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return None;
    }
    Some(PathBuf::from(url))
}

fn host_of(url: &str) -> Option<String> {
    let rest = url.split("://").nth(1)?;
    let host = rest.split('/').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_path_detection() {
        assert_eq!(
            local_path("file:///tmp/words.txt"),
            Some(PathBuf::from("/tmp/words.txt"))
        );
        assert_eq!(
            local_path("data/words.txt"),
            Some(PathBuf::from("data/words.txt"))
        );
        assert_eq!(local_path("https://example.com/w.txt"), None);
    }

    #[test]
    fn host_extraction() {
        assert_eq!(
            host_of("https://raw.githubusercontent.com/a/b.txt"),
            Some("raw.githubusercontent.com".to_string())
        );
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn fetch_reads_bare_paths() {
        let dir = std::env::temp_dir().join("glossa-fetch-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("words.txt");
        std::fs::write(&file, b"hello\nworld\n").unwrap();

        let fetcher = Fetcher::new(FetchOptions::default()).unwrap();
        let body = fetcher.fetch(file.to_str().unwrap()).unwrap();
        assert_eq!(body, b"hello\nworld\n");
    }

    #[test]
    fn missing_local_file_is_io_error() {
        let fetcher = Fetcher::new(FetchOptions::default()).unwrap();
        assert!(fetcher.fetch("/definitely/not/a/file").is_err());
    }

    #[test]
    fn rate_limiter_spaces_same_host() {
        let fetcher = Fetcher::new(FetchOptions {
            per_host_interval: Duration::from_millis(30),
            ..FetchOptions::default()
        })
        .unwrap();

        let start = Instant::now();
        fetcher.wait_for_host_slot("https://example.com/a");
        fetcher.wait_for_host_slot("https://example.com/b");
        fetcher.wait_for_host_slot("https://example.com/c");
        assert!(start.elapsed() >= Duration::from_millis(60));

        // A different host is not throttled by example.com's bucket.
        let start = Instant::now();
        fetcher.wait_for_host_slot("https://other.org/a");
        assert!(start.elapsed() < Duration::from_millis(30));
    }
}

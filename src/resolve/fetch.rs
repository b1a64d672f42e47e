//! Reference portrait retrieval and caching.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::signature::PortraitSignature;

/// Loads the bytes of a reference portrait.
pub trait ImageFetcher: Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches `http(s)://` URLs over the network; `file://` URLs and bare paths
/// are read from disk.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("roster-scan")
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            let path = url.strip_prefix("file://").unwrap_or(url);
            return fs::read(Path::new(path))
                .with_context(|| format!("Failed to read reference image {}", path));
        }

        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to download {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to download {}: HTTP {}", url, response.status()));
        }

        Ok(response.bytes()?.to_vec())
    }
}

/// A reference portrait, reduced to what disambiguation needs.
#[derive(Debug)]
pub struct ReferenceArt {
    pub signature: PortraitSignature,
    pub thumbnail: Arc<RgbaImage>,
}

/// Reference art computed so far, keyed by URL.
///
/// Safe to share between threads and between scans, as long as every scan
/// sharing it uses the same resolve settings. Failed lookups are not cached.
#[derive(Default)]
pub struct ReferenceCache {
    entries: Mutex<HashMap<String, Arc<ReferenceArt>>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached art for `url`, computing and storing it on a miss.
    ///
    /// The lock is not held while computing, so two threads may compute the
    /// same URL at once; both results are identical.
    pub fn get_or_compute(
        &self,
        url: &str,
        compute: impl FnOnce() -> Result<ReferenceArt>,
    ) -> Result<Arc<ReferenceArt>> {
        if let Some(hit) = self.lookup(url) {
            return Ok(hit);
        }

        let art = Arc::new(compute()?);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(url.to_string(), Arc::clone(&art));
        }
        Ok(art)
    }

    fn lookup(&self, url: &str) -> Option<Arc<ReferenceArt>> {
        self.entries.lock().ok()?.get(url).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn art() -> ReferenceArt {
        ReferenceArt {
            signature: PortraitSignature {
                hash: "00ff".to_string(),
                color: [1.0, 2.0, 3.0],
            },
            thumbnail: Arc::new(RgbaImage::new(4, 4)),
        }
    }

    #[test]
    fn test_cache_computes_once() {
        let cache = ReferenceCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let hit = cache
                .get_or_compute("a", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(art())
                })
                .unwrap();
            assert_eq!(hit.signature.hash, "00ff");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let cache = ReferenceCache::new();
        assert!(cache.get_or_compute("a", || Err(anyhow!("offline"))).is_err());
        assert!(cache.is_empty());
        assert!(cache.get_or_compute("a", || Ok(art())).is_ok());
    }

    #[test]
    fn test_fetch_reads_local_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portrait.bin");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let plain = fetcher.fetch(path.to_str().unwrap()).unwrap();
        let url = format!("file://{}", path.display());
        let prefixed = fetcher.fetch(&url).unwrap();

        assert_eq!(plain, vec![1, 2, 3]);
        assert_eq!(prefixed, plain);
        assert!(fetcher.fetch("/definitely/not/here.png").is_err());
    }
}

//! Two-tier (process memory + on-disk JSON) TTL cache for inventory
//! payloads.
//!
//! The memory tier makes repeat lookups within a process free; the disk tier
//! survives restarts and is shared (last-write-wins, no locking) between
//! instances pointing at the same cache directory. Both tiers use one TTL.
//! The cache takes its fetcher as a closure so tests can count live fetches.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use tracing::{debug, warn};

use super::client::SkuInventory;

struct MemoryEntry {
  fetched_at: DateTime<Utc>,
  payload: Arc<Vec<SkuInventory>>,
}

pub struct InventoryCache {
  dir: PathBuf,
  ttl: Duration,
  memory: Mutex<HashMap<u32, MemoryEntry>>,
  // Per-style guards so concurrent cold callers share one live fetch
  // instead of stampeding the vendor.
  in_flight: tokio::sync::Mutex<HashMap<u32, Arc<tokio::sync::Mutex<()>>>>,
}

impl InventoryCache {
  pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
    Self {
      dir: dir.into(),
      ttl,
      memory: Mutex::new(HashMap::new()),
      in_flight: tokio::sync::Mutex::new(HashMap::new()),
    }
  }

  /// Resolve a style's inventory: memory tier, then disk tier, then the
  /// given live fetcher. `refresh` bypasses both tiers unconditionally.
  ///
  /// A successful live fetch writes through to memory and (best-effort) to
  /// disk. A failed fetch propagates as-is; this layer never falls back to
  /// stale data once a live fetch was required.
  pub async fn fetch_with<F, Fut>(
    &self,
    style_id: u32,
    refresh: bool,
    fetcher: F,
  ) -> Result<Arc<Vec<SkuInventory>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<SkuInventory>>>,
  {
    if !refresh {
      if let Some(hit) = self.memory_lookup(style_id)? {
        debug!(style_id, "inventory served from memory cache");
        return Ok(hit);
      }
    }

    let guard = self.flight_guard(style_id).await;
    let _held = guard.lock().await;

    if !refresh {
      // A caller we queued behind may have filled the memory tier.
      if let Some(hit) = self.memory_lookup(style_id)? {
        debug!(style_id, "inventory served from memory cache");
        return Ok(hit);
      }
      if let Some(payload) = self.disk_lookup(style_id) {
        debug!(style_id, "inventory served from file cache");
        let payload = Arc::new(payload);
        self.store_memory(style_id, Arc::clone(&payload))?;
        return Ok(payload);
      }
    }

    let payload = Arc::new(fetcher().await?);
    debug!(style_id, skus = payload.len(), "inventory fetched live");
    self.store_memory(style_id, Arc::clone(&payload))?;
    self.store_disk(style_id, &payload);
    Ok(payload)
  }

  fn file_path(&self, style_id: u32) -> PathBuf {
    self.dir.join(format!("inventory-{}.json", style_id))
  }

  fn memory_lookup(&self, style_id: u32) -> Result<Option<Arc<Vec<SkuInventory>>>> {
    let memory = self
      .memory
      .lock()
      .map_err(|e| eyre!("Cache lock poisoned: {}", e))?;
    Ok(
      memory
        .get(&style_id)
        .filter(|entry| Utc::now() - entry.fetched_at < self.ttl)
        .map(|entry| Arc::clone(&entry.payload)),
    )
  }

  fn store_memory(&self, style_id: u32, payload: Arc<Vec<SkuInventory>>) -> Result<()> {
    let mut memory = self
      .memory
      .lock()
      .map_err(|e| eyre!("Cache lock poisoned: {}", e))?;
    memory.insert(
      style_id,
      MemoryEntry {
        fetched_at: Utc::now(),
        payload,
      },
    );
    Ok(())
  }

  // Any disk-tier problem (missing file, stale mtime, unreadable JSON) is a
  // plain miss.
  fn disk_lookup(&self, style_id: u32) -> Option<Vec<SkuInventory>> {
    let path = self.file_path(style_id);
    let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
    let age = Duration::from_std(modified.elapsed().ok()?).ok()?;
    if age >= self.ttl {
      return None;
    }
    let text = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&text).ok()
  }

  // Best-effort write-through; the memory tier already holds the payload,
  // so a failed write must not fail the fetch.
  fn store_disk(&self, style_id: u32, payload: &[SkuInventory]) {
    let path = self.file_path(style_id);
    let result = std::fs::create_dir_all(&self.dir).and_then(|_| {
      let text = serde_json::to_string(payload)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
      std::fs::write(&path, text)
    });
    if let Err(error) = result {
      warn!(style_id, path = %path.display(), %error, "failed to write inventory cache file");
    }
  }

  async fn flight_guard(&self, style_id: u32) -> Arc<tokio::sync::Mutex<()>> {
    let mut in_flight = self.in_flight.lock().await;
    Arc::clone(in_flight.entry(style_id).or_default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn payload(sku: &str, qty: f64) -> Vec<SkuInventory> {
    let json = format!(r#"[{{"sku":"{}","warehouses":[{{"qty":{}}}]}}]"#, sku, qty);
    serde_json::from_str(&json).unwrap()
  }

  fn counting_fetcher(
    counter: &Arc<AtomicUsize>,
    result: Vec<SkuInventory>,
  ) -> impl FnOnce() -> std::future::Ready<Result<Vec<SkuInventory>>> {
    let counter = Arc::clone(counter);
    move || {
      counter.fetch_add(1, Ordering::SeqCst);
      std::future::ready(Ok(result))
    }
  }

  #[tokio::test]
  async fn test_second_call_within_ttl_hits_memory() {
    let dir = tempfile::tempdir().unwrap();
    let cache = InventoryCache::new(dir.path(), Duration::minutes(5));
    let fetches = Arc::new(AtomicUsize::new(0));

    let first = cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 10.0)))
      .await
      .unwrap();
    let second = cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 99.0)))
      .await
      .unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
  }

  #[tokio::test]
  async fn test_refresh_always_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let cache = InventoryCache::new(dir.path(), Duration::minutes(5));
    let fetches = Arc::new(AtomicUsize::new(0));

    cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 10.0)))
      .await
      .unwrap();
    let refreshed = cache
      .fetch_with(39, true, counting_fetcher(&fetches, payload("A", 3.0)))
      .await
      .unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(refreshed[0].warehouses[0].qty, Some(3.0));

    // The refreshed payload replaced the memory entry wholesale.
    let after = cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 77.0)))
      .await
      .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(after[0].warehouses[0].qty, Some(3.0));
  }

  #[tokio::test]
  async fn test_fresh_disk_file_avoids_fetch_and_fills_memory() {
    let dir = tempfile::tempdir().unwrap();
    let fetches = Arc::new(AtomicUsize::new(0));

    // One process fetches and writes the disk tier.
    {
      let cache = InventoryCache::new(dir.path(), Duration::minutes(5));
      cache
        .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 10.0)))
        .await
        .unwrap();
    }

    // A second process (fresh memory tier) is served from disk.
    let cache = InventoryCache::new(dir.path(), Duration::minutes(5));
    let from_disk = cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 99.0)))
      .await
      .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(from_disk[0].warehouses[0].qty, Some(10.0));

    // And the disk hit populated its memory tier.
    cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 99.0)))
      .await
      .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_expired_ttl_fetches_again() {
    let dir = tempfile::tempdir().unwrap();
    let cache = InventoryCache::new(dir.path(), Duration::zero());
    let fetches = Arc::new(AtomicUsize::new(0));

    cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 10.0)))
      .await
      .unwrap();
    cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 11.0)))
      .await
      .unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_fetch_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let cache = InventoryCache::new(dir.path(), Duration::minutes(5));

    let result = cache
      .fetch_with(39, false, || {
        std::future::ready(Err(eyre!("Inventory request for style 39 returned 503: busy")))
      })
      .await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("503"));
  }

  #[tokio::test]
  async fn test_concurrent_cold_callers_share_one_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(InventoryCache::new(dir.path(), Duration::minutes(5)));
    let fetches = Arc::new(AtomicUsize::new(0));

    let slow_fetcher = || {
      let fetches = Arc::clone(&fetches);
      || async move {
        fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok(payload("A", 10.0))
      }
    };

    let (a, b) = tokio::join!(
      cache.fetch_with(39, false, slow_fetcher()),
      cache.fetch_with(39, false, slow_fetcher()),
    );

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(a.unwrap()[0].sku, "A");
    assert_eq!(b.unwrap()[0].sku, "A");
  }

  #[tokio::test]
  async fn test_distinct_styles_use_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let cache = InventoryCache::new(dir.path(), Duration::minutes(5));
    let fetches = Arc::new(AtomicUsize::new(0));

    cache
      .fetch_with(39, false, counting_fetcher(&fetches, payload("A", 1.0)))
      .await
      .unwrap();
    cache
      .fetch_with(1157, false, counting_fetcher(&fetches, payload("B", 2.0)))
      .await
      .unwrap();

    assert!(dir.path().join("inventory-39.json").exists());
    assert!(dir.path().join("inventory-1157.json").exists());
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
  }
}

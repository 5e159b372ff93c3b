//! Inventory client with transparent two-tier caching.

use std::sync::Arc;

use chrono::Duration;
use color_eyre::Result;

use crate::config::Config;

use super::cache::InventoryCache;
use super::client::{InventoryClient, SkuInventory};

/// The client the rest of the application talks to: same surface as
/// [`InventoryClient`], but cache-aware.
pub struct CachedInventoryClient {
  inner: InventoryClient,
  cache: InventoryCache,
}

impl CachedInventoryClient {
  pub fn new(config: &Config) -> Result<Self> {
    let inner = InventoryClient::new(config)?;
    let cache = InventoryCache::new(&config.cache.dir, Duration::minutes(config.cache.ttl_minutes));
    Ok(Self { inner, cache })
  }

  /// Inventory for one style. `refresh` bypasses both cache tiers and
  /// forces a live fetch.
  pub async fn fetch_inventory(
    &self,
    style_id: u32,
    refresh: bool,
  ) -> Result<Arc<Vec<SkuInventory>>> {
    self
      .cache
      .fetch_with(style_id, refresh, || {
        let inner = self.inner.clone();
        async move { inner.fetch(style_id).await }
      })
      .await
  }
}

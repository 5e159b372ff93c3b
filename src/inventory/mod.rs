//! Live inventory: vendor HTTP client, two-tier TTL cache, and the cached
//! client that combines them.

pub mod cache;
pub mod cached_client;
pub mod client;

pub use cache::InventoryCache;
pub use cached_client::CachedInventoryClient;
pub use client::{InventoryClient, SkuInventory, Warehouse};

//! Process-wide catalog tables with atomic reload.
//!
//! Both feeds are read-mostly singletons: loaded once, shared across every
//! request in the process, replaced wholesale on an explicit reload. Readers
//! hold `Arc` snapshots, so a reload never exposes a partially-built table.

pub mod products;
pub mod styles;

pub use products::{ProductCatalog, ProductRecord, RowImages};
pub use styles::{StyleCatalog, StyleRecord};

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use color_eyre::{eyre::eyre, Result};

/// Lazily-initialized shared snapshot of one table.
///
/// The new table is built fully off to the side and then swapped in; a
/// concurrent reader sees either the old or the new snapshot, never a mix.
struct CatalogCell<T> {
  slot: RwLock<Option<Arc<T>>>,
}

impl<T> CatalogCell<T> {
  fn new() -> Self {
    Self {
      slot: RwLock::new(None),
    }
  }

  fn get_or_load(&self, load: impl FnOnce() -> T) -> Result<Arc<T>> {
    {
      let slot = self
        .slot
        .read()
        .map_err(|e| eyre!("Catalog lock poisoned: {}", e))?;
      if let Some(current) = slot.as_ref() {
        return Ok(Arc::clone(current));
      }
    }

    // Cold path: build without holding the lock, then publish. If another
    // caller published first, theirs wins and our build is discarded.
    let fresh = Arc::new(load());
    let mut slot = self
      .slot
      .write()
      .map_err(|e| eyre!("Catalog lock poisoned: {}", e))?;
    Ok(Arc::clone(slot.get_or_insert(fresh)))
  }

  fn reload(&self, load: impl FnOnce() -> T) -> Result<Arc<T>> {
    let fresh = Arc::new(load());
    let mut slot = self
      .slot
      .write()
      .map_err(|e| eyre!("Catalog lock poisoned: {}", e))?;
    *slot = Some(Arc::clone(&fresh));
    Ok(fresh)
  }
}

/// Owner of both catalog singletons, keyed to the configured feed paths.
pub struct Catalogs {
  styles_path: PathBuf,
  products_path: PathBuf,
  styles: CatalogCell<StyleCatalog>,
  products: CatalogCell<ProductCatalog>,
}

impl Catalogs {
  pub fn new(styles_path: impl Into<PathBuf>, products_path: impl Into<PathBuf>) -> Self {
    Self {
      styles_path: styles_path.into(),
      products_path: products_path.into(),
      styles: CatalogCell::new(),
      products: CatalogCell::new(),
    }
  }

  /// Style table snapshot. The first call reads the feed; later calls are
  /// free. `refresh` forces a re-read and atomically replaces the snapshot.
  pub fn styles(&self, refresh: bool) -> Result<Arc<StyleCatalog>> {
    let load = || StyleCatalog::load(&self.styles_path);
    if refresh {
      self.styles.reload(load)
    } else {
      self.styles.get_or_load(load)
    }
  }

  /// Product table snapshot, same lifecycle as [`Catalogs::styles`].
  pub fn products(&self, refresh: bool) -> Result<Arc<ProductCatalog>> {
    let load = || ProductCatalog::load(&self.products_path);
    if refresh {
      self.products.reload(load)
    } else {
      self.products.get_or_load(load)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn test_get_or_load_memoizes() {
    let cell = CatalogCell::new();
    let loads = AtomicUsize::new(0);
    let load = || {
      loads.fetch_add(1, Ordering::SeqCst);
      42u32
    };

    let a = cell.get_or_load(load).unwrap();
    let b = cell.get_or_load(load).unwrap();
    assert_eq!(*a, 42);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_reload_replaces_snapshot() {
    let cell = CatalogCell::new();
    let old = cell.get_or_load(|| 1u32).unwrap();
    let new = cell.reload(|| 2u32).unwrap();
    assert_eq!(*new, 2);
    // The old snapshot stays valid for readers that still hold it.
    assert_eq!(*old, 1);
    assert_eq!(*cell.get_or_load(|| 3u32).unwrap(), 2);
  }

  #[test]
  fn test_missing_feeds_yield_empty_catalogs() {
    let catalogs = Catalogs::new("/nonexistent/Styles.csv", "/nonexistent/Products.csv");
    assert!(catalogs.styles(false).unwrap().is_empty());
    assert!(catalogs.products(false).unwrap().is_empty());
  }
}

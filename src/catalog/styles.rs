//! Style reference table loaded from the vendor's Styles feed.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::csv::{field, Table};

/// One style: a brand + product-line identity, independent of color/size.
#[derive(Debug, Clone, Serialize)]
pub struct StyleRecord {
  pub style_id: u32,
  pub brand_name: String,
  pub style_name: String,
  pub title: Option<String>,
  pub description: Option<String>,
  /// Preferred display image: style image, then generic image, then brand
  /// image; absent when none of them is present.
  pub image: Option<String>,
  pub brand_image: Option<String>,
}

/// Immutable style table. Rebuilt wholesale on reload, never mutated.
pub struct StyleCatalog {
  rows: Vec<StyleRecord>,
}

impl StyleCatalog {
  pub fn empty() -> Self {
    Self { rows: Vec::new() }
  }

  /// Read and parse the backing file. A missing or unreadable file degrades
  /// to an empty catalog: style data is advisory display metadata, and a
  /// broken feed must not take down request handling.
  pub fn load(path: &Path) -> Self {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(error) => {
        warn!(path = %path.display(), %error, "styles feed unreadable, serving empty catalog");
        return Self::empty();
      }
    };
    let catalog = Self::parse(&content);
    info!(rows = catalog.len(), path = %path.display(), "loaded style catalog");
    catalog
  }

  pub fn parse(content: &str) -> Self {
    let Some(table) = Table::parse(content) else {
      warn!("styles feed has no header row, serving empty catalog");
      return Self::empty();
    };

    let idx_id = table.column("styleid");
    let idx_brand = table.column("brandname");
    let idx_style = table.column("stylename");
    let idx_title = table.column("title");
    let idx_desc = table.column("description");
    let idx_style_img = table.column_any(&["styleimage", "styleimageurl"]);
    let idx_img = table.column("image");
    let idx_brand_img = table.column("brandimage");

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for raw in table.rows() {
      let Ok(style_id) = field(raw, idx_id).parse::<u32>() else {
        dropped += 1;
        continue;
      };

      let brand_image = opt(field(raw, idx_brand_img));
      let image = opt(field(raw, idx_style_img))
        .or_else(|| opt(field(raw, idx_img)))
        .or_else(|| brand_image.clone());

      rows.push(StyleRecord {
        style_id,
        brand_name: field(raw, idx_brand).to_string(),
        style_name: field(raw, idx_style).to_string(),
        title: opt(field(raw, idx_title)),
        description: opt(field(raw, idx_desc)),
        image,
        brand_image,
      });
    }

    if dropped > 0 {
      warn!(dropped, "styles feed rows without a resolvable styleID");
    }

    Self { rows }
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Exact integer lookup.
  pub fn get_by_id(&self, style_id: u32) -> Option<&StyleRecord> {
    self.rows.iter().find(|s| s.style_id == style_id)
  }

  /// Tokenized substring search over brand + style + title.
  ///
  /// Every whitespace-separated token of the query must appear somewhere in
  /// the concatenated, lowercased text (AND semantics). Results come back in
  /// table order, capped at `limit`; there is no relevance scoring.
  pub fn search(&self, query: &str, limit: usize) -> Vec<&StyleRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
      return Vec::new();
    }
    let tokens: Vec<&str> = query.split_whitespace().collect();

    self
      .rows
      .iter()
      .filter(|s| {
        let hay = format!(
          "{} {} {}",
          s.brand_name,
          s.style_name,
          s.title.as_deref().unwrap_or("")
        )
        .to_lowercase();
        tokens.iter().all(|t| hay.contains(t))
      })
      .take(limit)
      .collect()
  }

  /// Full table snapshot, in file order.
  pub fn all(&self) -> &[StyleRecord] {
    &self.rows
  }
}

fn opt(s: &str) -> Option<String> {
  if s.is_empty() {
    None
  } else {
    Some(s.to_string())
  }
}

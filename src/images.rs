//! Image URL normalization and "best representative image" ranking.
//!
//! The product feed carries up to ~10 optional image columns per row, mixing
//! absolute URLs, vendor-relative paths and plain junk. The resolver
//! normalizes what it can, drops the rest, and orders the survivors so the
//! most representative shot (on-model, front-facing) comes first and color
//! swatch chips come last.

use std::collections::HashSet;

use crate::catalog::ProductRecord;

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp"];

/// True if the URL looks like a color chip/swatch. These never lead a
/// gallery.
pub fn is_swatch(url: &str) -> bool {
  url.to_ascii_lowercase().contains("swatch")
}

/// Score a URL for gallery ordering; lower is better. Swatches sort last
/// unconditionally. On-model imagery beats flat shots, front framing beats
/// side, side beats back, and a `_fm` (product-only render) suffix earns a
/// small bonus.
pub fn rank(url: &str) -> i32 {
  let url = url.to_ascii_lowercase();
  if is_swatch(&url) {
    return 9999;
  }
  let mut score = 1000;
  if url.contains("model") {
    score -= 600;
  }
  if url.contains("front") {
    score -= 300;
  }
  if url.contains("side") {
    score -= 100;
  }
  if url.contains("back") {
    score -= 50;
  }
  if has_product_only_suffix(&url) {
    score -= 30;
  }
  score
}

// Filename stem ends in "_fm" right before the image extension.
fn has_product_only_suffix(url: &str) -> bool {
  IMAGE_EXTENSIONS
    .iter()
    .filter_map(|ext| url.strip_suffix(ext))
    .any(|stem| stem.ends_with("_fm"))
}

fn has_image_extension(url: &str) -> bool {
  let url = url.to_ascii_lowercase();
  IMAGE_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
  s.get(..prefix.len())
    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Resolves feed image fields into ranked galleries of absolute URLs.
pub struct ImageResolver {
  base_url: String,
}

impl ImageResolver {
  /// `base_url` is the vendor web host that relative `images/` paths are
  /// rewritten against.
  pub fn new(base_url: impl Into<String>) -> Self {
    let mut base_url = base_url.into();
    while base_url.ends_with('/') {
      base_url.pop();
    }
    Self { base_url }
  }

  /// Normalize one raw field value into an absolute URL.
  ///
  /// Absolute http(s) URLs pass through; vendor-relative paths starting
  /// with `images/` (optionally with a leading slash) are rewritten against
  /// the base; anything else is rejected so non-image columns cannot leak
  /// into a gallery.
  pub fn normalize(&self, raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
      return None;
    }
    if starts_with_ignore_case(value, "http://") || starts_with_ignore_case(value, "https://") {
      return Some(value.to_string());
    }
    let relative = value.strip_prefix('/').unwrap_or(value);
    if starts_with_ignore_case(relative, "images/") {
      return Some(format!("{}/{}", self.base_url, relative));
    }
    None
  }

  /// Normalize, filter and order an arbitrary set of raw URLs: best image
  /// first, duplicates removed (first occurrence wins), non-image URLs
  /// dropped. The sort is stable, so equal scores keep input order.
  pub fn sort_gallery<I, S>(&self, raw_urls: I) -> Vec<String>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut gallery = self.collect(raw_urls);
    gallery.sort_by_key(|url| rank(url));
    gallery
  }

  /// Gallery for one color with style-level fallback: when the color's own
  /// rows yield no qualifying image, every row of the style is scanned
  /// instead, so a product page is never imageless just because one color
  /// variant lacks photography.
  pub fn gallery(&self, color_rows: &[&ProductRecord], all_style_rows: &[&ProductRecord]) -> Vec<String> {
    let mut gallery = self.collect_rows(color_rows);
    if gallery.is_empty() {
      gallery = self.collect_rows(all_style_rows);
    }
    gallery.sort_by_key(|url| rank(url));
    gallery
  }

  fn collect_rows(&self, rows: &[&ProductRecord]) -> Vec<String> {
    self.collect(rows.iter().flat_map(|r| r.images.candidates()))
  }

  fn collect<I, S>(&self, raw_urls: I) -> Vec<String>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in raw_urls {
      let Some(url) = self.normalize(raw.as_ref()) else {
        continue;
      };
      if !has_image_extension(&url) {
        continue;
      }
      if seen.insert(url.clone()) {
        out.push(url);
      }
    }
    out
  }
}

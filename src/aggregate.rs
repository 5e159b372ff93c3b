//! Joins live inventory payloads to catalog rows by SKU.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::ProductCatalog;
use crate::inventory::SkuInventory;

/// Label used when a style has no colors at all.
pub const PLACEHOLDER_COLOR: &str = "Color";

/// Total on-hand quantity per SKU: warehouse quantities summed, with absent
/// or non-numeric quantities counted as zero.
pub fn sku_totals(payload: &[SkuInventory]) -> HashMap<String, i64> {
  let mut totals = HashMap::new();
  for record in payload {
    let total: f64 = record.warehouses.iter().filter_map(|w| w.qty).sum();
    totals.insert(record.sku.clone(), total as i64);
  }
  totals
}

/// Default display color for a style.
///
/// Precedence: "White" with stock, then "Black" with stock (both matched
/// case-insensitively but returned in catalog casing), then the first color
/// in catalog order with stock, then the first color, then a placeholder.
/// This drives default UI state and must not change.
pub fn preferred_color(colors: &[String], totals: &HashMap<String, i64>) -> String {
  let stock = |color: &str| totals.get(color).copied().unwrap_or(0);
  let find = |name: &str| colors.iter().find(|c| c.eq_ignore_ascii_case(name));

  if let Some(white) = find("white") {
    if stock(white) > 0 {
      return white.clone();
    }
  }
  if let Some(black) = find("black") {
    if stock(black) > 0 {
      return black.clone();
    }
  }
  if let Some(color) = colors.iter().find(|c| stock(c) > 0) {
    return color.clone();
  }
  colors
    .first()
    .cloned()
    .unwrap_or_else(|| PLACEHOLDER_COLOR.to_string())
}

/// Aggregated stock view of one style: catalog colors joined to live
/// quantities. A style with zero product rows yields an empty view.
#[derive(Debug, Clone, Serialize)]
pub struct StyleStock {
  pub style_id: u32,
  /// Colors in catalog (first-seen) order.
  pub colors: Vec<String>,
  /// Total on-hand per SKU, summed across warehouses.
  pub sku_totals: HashMap<String, i64>,
  /// Total on-hand per color, summed across that color's SKUs.
  pub color_totals: HashMap<String, i64>,
  pub preferred_color: String,
}

impl StyleStock {
  pub fn build(style_id: u32, catalog: &ProductCatalog, payload: &[SkuInventory]) -> Self {
    let colors = catalog.list_colors(style_id);
    let sku_totals = sku_totals(payload);

    let mut color_totals = HashMap::new();
    for color in &colors {
      let total = catalog
        .color_rows(style_id, color)
        .iter()
        .map(|row| sku_totals.get(&row.sku).copied().unwrap_or(0))
        .sum();
      color_totals.insert(color.clone(), total);
    }

    let preferred_color = preferred_color(&colors, &color_totals);

    Self {
      style_id,
      colors,
      sku_totals,
      color_totals,
      preferred_color,
    }
  }
}

//! Per-SKU product table loaded from the vendor's Products feed.
//!
//! One row per (style, color, size) combination. The feed is much larger
//! than the styles table, so rows are indexed by style at load time.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::csv::{field, Table};

/// Image columns we know by name. Anything else ending in "image" still gets
/// scanned (vendor schema drift), but these drive the preferred ordering.
const KNOWN_IMAGE_COLUMNS: &[&str] = &[
  "colorswatchimage",
  "colorfrontimage",
  "colorsideimage",
  "colorbackimage",
  "colordirectsideimage",
  "coloronmodelfrontimage",
  "coloronmodelsideimage",
  "coloronmodelbackimage",
];

/// Image URL fields of one product row, as they appear in the feed
/// (unnormalized, possibly relative paths).
#[derive(Debug, Clone, Default, Serialize)]
pub struct RowImages {
  pub on_model_front: Option<String>,
  pub on_model_side: Option<String>,
  pub on_model_back: Option<String>,
  pub front: Option<String>,
  pub side: Option<String>,
  pub back: Option<String>,
  pub direct_side: Option<String>,
  pub swatch: Option<String>,
  /// Values of any other `*Image` column the feed happens to carry.
  pub extra: Vec<String>,
}

impl RowImages {
  /// Every candidate URL of this row, named columns first, drift columns
  /// last. Ranking happens later; this order only matters for ties.
  pub fn candidates(&self) -> impl Iterator<Item = &str> {
    [
      &self.on_model_front,
      &self.on_model_side,
      &self.on_model_back,
      &self.front,
      &self.side,
      &self.back,
      &self.direct_side,
      &self.swatch,
    ]
    .into_iter()
    .filter_map(|v| v.as_deref())
    .chain(self.extra.iter().map(String::as_str))
  }
}

/// One (style, color, size) row of the products feed.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
  pub sku: String,
  pub gtin: String,
  pub sku_id_master: Option<u64>,
  pub style_id: u32,
  pub brand_name: String,
  pub style_name: String,

  pub color_name: String,
  pub color_code: String,
  pub color_price_code_name: String,
  pub color_group: String,
  pub color_family: String,
  pub color_swatch_text_color: Option<String>,
  pub color1: Option<String>,
  pub color2: Option<String>,

  pub size_name: String,
  pub size_code: String,
  pub size_order: String,
  pub size_price_code_name: String,

  pub case_qty: Option<f64>,
  pub unit_weight: Option<f64>,
  pub map_price: Option<f64>,
  pub piece_price: Option<f64>,
  pub dozen_price: Option<f64>,
  pub case_price: Option<f64>,
  pub sale_price: Option<f64>,
  pub customer_price: Option<f64>,

  pub images: RowImages,
}

impl ProductRecord {
  /// Price shown to the customer: sale price, then customer price, then
  /// piece price. First field present and greater than zero wins.
  pub fn display_price(&self) -> Option<f64> {
    [self.sale_price, self.customer_price, self.piece_price]
      .into_iter()
      .flatten()
      .find(|p| *p > 0.0)
  }
}

/// Immutable product table with a style index. Rebuilt wholesale on reload.
pub struct ProductCatalog {
  rows: Vec<ProductRecord>,
  by_style: HashMap<u32, Vec<usize>>,
}

impl ProductCatalog {
  pub fn empty() -> Self {
    Self {
      rows: Vec::new(),
      by_style: HashMap::new(),
    }
  }

  /// Read and parse the backing file, degrading to an empty catalog on any
  /// file-level problem (same policy as the style catalog).
  pub fn load(path: &Path) -> Self {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(error) => {
        warn!(path = %path.display(), %error, "products feed unreadable, serving empty catalog");
        return Self::empty();
      }
    };
    let catalog = Self::parse(&content);
    info!(rows = catalog.len(), path = %path.display(), "loaded product catalog");
    catalog
  }

  pub fn parse(content: &str) -> Self {
    let Some(table) = Table::parse(content) else {
      warn!("products feed has no header row, serving empty catalog");
      return Self::empty();
    };

    let idx_sku = table.column("sku");
    let idx_gtin = table.column("gtin");
    let idx_sku_master = table.column("skuid_master");
    let idx_style_id = table.column("styleid");
    let idx_brand = table.column("brandname");
    let idx_style = table.column("stylename");

    let idx_color = table.column("colorname");
    let idx_color_code = table.column("colorcode");
    let idx_color_price_code = table.column("colorpricecodename");
    let idx_color_group = table.column("colorgroup");
    let idx_color_family = table.column("colorfamily");
    let idx_swatch_text = table.column("colorswatchtextcolor");
    let idx_color1 = table.column("color1");
    let idx_color2 = table.column("color2");

    let idx_size = table.column("sizename");
    let idx_size_code = table.column("sizecode");
    let idx_size_order = table.column("sizeorder");
    let idx_size_price_code = table.column("sizepricecodename");

    let idx_case_qty = table.column("caseqty");
    let idx_unit_weight = table.column("unitweight");
    let idx_map_price = table.column("mapprice");
    let idx_piece_price = table.column("pieceprice");
    let idx_dozen_price = table.column("dozenprice");
    let idx_case_price = table.column("caseprice");
    let idx_sale_price = table.column("saleprice");
    let idx_customer_price = table.column("customerprice");

    let idx_swatch = table.column("colorswatchimage");
    let idx_front = table.column("colorfrontimage");
    let idx_side = table.column("colorsideimage");
    let idx_back = table.column("colorbackimage");
    let idx_direct_side = table.column("colordirectsideimage");
    let idx_om_front = table.column("coloronmodelfrontimage");
    let idx_om_side = table.column("coloronmodelsideimage");
    let idx_om_back = table.column("coloronmodelbackimage");

    // Unrecognized *image columns still feed the gallery scan.
    let idx_extra_images: Vec<usize> = table
      .headers()
      .iter()
      .enumerate()
      .filter(|(_, h)| h.ends_with("image") && !KNOWN_IMAGE_COLUMNS.contains(&h.as_str()))
      .map(|(i, _)| i)
      .collect();

    let mut rows = Vec::new();
    let mut by_style: HashMap<u32, Vec<usize>> = HashMap::new();
    let mut dropped = 0usize;

    for raw in table.rows() {
      let sku = field(raw, idx_sku);
      let Ok(style_id) = field(raw, idx_style_id).parse::<u32>() else {
        dropped += 1;
        continue;
      };
      if sku.is_empty() {
        dropped += 1;
        continue;
      }

      let extra = idx_extra_images
        .iter()
        .filter_map(|&i| opt(field(raw, Some(i))))
        .collect();

      let record = ProductRecord {
        sku: sku.to_string(),
        gtin: field(raw, idx_gtin).to_string(),
        sku_id_master: field(raw, idx_sku_master).parse().ok(),
        style_id,
        brand_name: field(raw, idx_brand).to_string(),
        style_name: field(raw, idx_style).to_string(),

        color_name: field(raw, idx_color).to_string(),
        color_code: field(raw, idx_color_code).to_string(),
        color_price_code_name: field(raw, idx_color_price_code).to_string(),
        color_group: field(raw, idx_color_group).to_string(),
        color_family: field(raw, idx_color_family).to_string(),
        color_swatch_text_color: opt(field(raw, idx_swatch_text)),
        color1: opt(field(raw, idx_color1)),
        color2: opt(field(raw, idx_color2)),

        size_name: field(raw, idx_size).to_string(),
        size_code: field(raw, idx_size_code).to_string(),
        size_order: field(raw, idx_size_order).to_string(),
        size_price_code_name: field(raw, idx_size_price_code).to_string(),

        case_qty: num(field(raw, idx_case_qty)),
        unit_weight: num(field(raw, idx_unit_weight)),
        map_price: num(field(raw, idx_map_price)),
        piece_price: num(field(raw, idx_piece_price)),
        dozen_price: num(field(raw, idx_dozen_price)),
        case_price: num(field(raw, idx_case_price)),
        sale_price: num(field(raw, idx_sale_price)),
        customer_price: num(field(raw, idx_customer_price)),

        images: RowImages {
          on_model_front: opt(field(raw, idx_om_front)),
          on_model_side: opt(field(raw, idx_om_side)),
          on_model_back: opt(field(raw, idx_om_back)),
          front: opt(field(raw, idx_front)),
          side: opt(field(raw, idx_side)),
          back: opt(field(raw, idx_back)),
          direct_side: opt(field(raw, idx_direct_side)),
          swatch: opt(field(raw, idx_swatch)),
          extra,
        },
      };

      by_style.entry(style_id).or_default().push(rows.len());
      rows.push(record);
    }

    if dropped > 0 {
      warn!(dropped, "products feed rows without styleID or sku");
    }

    Self { rows, by_style }
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// All rows of a style, in file order. Empty for unknown styles.
  pub fn by_style(&self, style_id: u32) -> Vec<&ProductRecord> {
    self
      .by_style
      .get(&style_id)
      .map(|indices| indices.iter().map(|&i| &self.rows[i]).collect())
      .unwrap_or_default()
  }

  /// sku -> record lookup for one style. SKUs are case-sensitive; they are
  /// the join key against live inventory and must match exactly.
  pub fn sku_index(&self, style_id: u32) -> HashMap<&str, &ProductRecord> {
    self
      .by_style(style_id)
      .into_iter()
      .map(|r| (r.sku.as_str(), r))
      .collect()
  }

  /// Unique color names of a style, first-seen order, rows with a blank
  /// color skipped.
  pub fn list_colors(&self, style_id: u32) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for row in self.by_style(style_id) {
      if !row.color_name.is_empty() && !colors.iter().any(|c| *c == row.color_name) {
        colors.push(row.color_name.clone());
      }
    }
    colors
  }

  /// Rows of a style scoped to one color (exact name match), file order.
  pub fn color_rows(&self, style_id: u32, color: &str) -> Vec<&ProductRecord> {
    self
      .by_style(style_id)
      .into_iter()
      .filter(|r| r.color_name == color)
      .collect()
  }
}

fn opt(s: &str) -> Option<String> {
  if s.is_empty() {
    None
  } else {
    Some(s.to_string())
  }
}

/// Permissive numeric parse: unparseable values become absent, never zero,
/// so price fallthrough can try the next candidate field.
fn num(s: &str) -> Option<f64> {
  let n = s.parse::<f64>().ok()?;
  n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
  use super::*;

  const FEED: &str = "\
sku,styleID,brandName,styleName,colorName,sizeName,sizeOrder,piecePrice,salePrice,customerPrice,colorFrontImage,colorOnModelFrontImage,colorSwatchImage,bannerImage
B00760004,39,Gildan,2000,White,S,1,3.12,,2.80,Images/Color/39_w_front.jpg,Images/OnModel/39_w_om.jpg,Images/Swatch/39_w_swatch.jpg,Images/Banner/39.png
B00760005,39,Gildan,2000,White,M,2,3.12,2.50,2.80,Images/Color/39_w_front.jpg,,,
B00760030,39,Gildan,2000,Navy,M,2,3.40,,not-a-price,Images/Color/39_n_front.jpg,,,
,39,Gildan,2000,Red,S,1,3.12,,,,,,
B00760099,,Gildan,2000,Red,M,2,3.12,,,,,,
B00880001,1157,Bella+Canvas,3001,Black,S,1,4.20,,,,,,
";

  fn catalog() -> ProductCatalog {
    ProductCatalog::parse(FEED)
  }

  #[test]
  fn test_rows_without_key_are_dropped() {
    let c = catalog();
    // 6 rows, 2 invalid (missing sku, missing styleID).
    assert_eq!(c.len(), 4);
    assert_eq!(c.by_style(39).len(), 3);
    assert_eq!(c.by_style(1157).len(), 1);
    assert!(c.by_style(9999).is_empty());
  }

  #[test]
  fn test_list_colors_first_seen_deduped() {
    let c = catalog();
    assert_eq!(c.list_colors(39), ["White", "Navy"]);
    assert!(c.list_colors(9999).is_empty());
  }

  #[test]
  fn test_sku_index_is_exact() {
    let c = catalog();
    let index = c.sku_index(39);
    assert!(index.contains_key("B00760004"));
    // Case-sensitive join key.
    assert!(!index.contains_key("b00760004"));
  }

  #[test]
  fn test_unparseable_numbers_are_absent() {
    let c = catalog();
    let navy = &c.color_rows(39, "Navy")[0];
    assert_eq!(navy.customer_price, None);
    assert_eq!(navy.piece_price, Some(3.40));
  }

  #[test]
  fn test_display_price_fallthrough() {
    let c = catalog();
    let rows = c.color_rows(39, "White");
    // No sale price: customer price wins over piece price.
    assert_eq!(rows[0].display_price(), Some(2.80));
    // Sale price present and positive wins.
    assert_eq!(rows[1].display_price(), Some(2.50));
    // Navy has no sale/customer price, falls through to piece price.
    assert_eq!(c.color_rows(39, "Navy")[0].display_price(), Some(3.40));
  }

  #[test]
  fn test_drift_image_columns_are_captured() {
    let c = catalog();
    let white_s = &c.color_rows(39, "White")[0];
    assert_eq!(white_s.images.extra, ["Images/Banner/39.png"]);
    let candidates: Vec<&str> = white_s.images.candidates().collect();
    assert_eq!(
      candidates,
      [
        "Images/OnModel/39_w_om.jpg",
        "Images/Color/39_w_front.jpg",
        "Images/Swatch/39_w_swatch.jpg",
        "Images/Banner/39.png",
      ]
    );
  }

  #[test]
  fn test_missing_file_degrades_to_empty() {
    let c = ProductCatalog::load(Path::new("/nonexistent/Products.csv"));
    assert!(c.is_empty());
  }
}

//! HTTP client for the vendor's live inventory endpoint.

use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;

/// One warehouse quantity line inside a SKU's inventory record.
///
/// `qty` is parsed leniently (number, numeric string, or absent) because the
/// vendor is not consistent; unknown fields ride along so cached payloads
/// stay verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
  #[serde(
    default,
    deserialize_with = "lenient_qty",
    skip_serializing_if = "Option::is_none"
  )]
  pub qty: Option<f64>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-SKU warehouse quantities as returned by the vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuInventory {
  #[serde(default)]
  pub sku: String,
  #[serde(default)]
  pub warehouses: Vec<Warehouse>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

fn lenient_qty<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(match value {
    serde_json::Value::Number(n) => n.as_f64(),
    serde_json::Value::String(s) => s.trim().parse().ok(),
    _ => None,
  })
}

/// Authenticated client for `GET <base>/inventory/?style=<id>`.
#[derive(Clone)]
pub struct InventoryClient {
  http: reqwest::Client,
  base_url: String,
  account: String,
  api_key: String,
}

impl InventoryClient {
  pub fn new(config: &Config) -> Result<Self> {
    let account = config.vendor_account()?;
    let api_key = Config::get_api_key()?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.vendor.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: config.vendor.api_base.trim_end_matches('/').to_string(),
      account,
      api_key,
    })
  }

  /// Fetch live inventory for one style. Single attempt, no retries; a
  /// non-2xx response becomes an error carrying status and body.
  pub async fn fetch(&self, style_id: u32) -> Result<Vec<SkuInventory>> {
    let url = Url::parse_with_params(
      &format!("{}/inventory/", self.base_url),
      [("style", style_id.to_string())],
    )
    .map_err(|e| eyre!("Invalid inventory URL: {}", e))?;

    // This layer owns cache policy; the transport must not add its own.
    let response = self
      .http
      .get(url)
      .basic_auth(&self.account, Some(&self.api_key))
      .header(reqwest::header::CACHE_CONTROL, "no-store")
      .send()
      .await
      .map_err(|e| eyre!("Inventory request for style {} failed: {}", style_id, e))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(eyre!(
        "Inventory request for style {} returned {}: {}",
        style_id,
        status,
        body
      ));
    }

    response
      .json::<Vec<SkuInventory>>()
      .await
      .map_err(|e| eyre!("Bad inventory payload for style {}: {}", style_id, e))
  }
}

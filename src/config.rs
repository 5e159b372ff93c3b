use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub vendor: VendorConfig,
  #[serde(default)]
  pub data: DataConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorConfig {
  /// Vendor account number for HTTP basic auth. May also come from the
  /// SS_ACCOUNT / SS_ACCOUNT_NUMBER environment variables.
  pub account: Option<String>,
  /// Inventory API base URL.
  #[serde(default = "default_api_base")]
  pub api_base: String,
  /// Web host that relative `images/` paths resolve against.
  #[serde(default = "default_image_base")]
  pub image_base: String,
  /// Transport timeout for inventory requests, in seconds. The vendor is
  /// external; this bounds worst-case caller latency.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
  /// Styles feed path.
  #[serde(default = "default_styles_path")]
  pub styles_path: PathBuf,
  /// Products feed path.
  #[serde(default = "default_products_path")]
  pub products_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Directory holding one JSON cache file per style.
  #[serde(default = "default_cache_dir")]
  pub dir: PathBuf,
  /// One TTL shared by the memory and file tiers, in minutes.
  #[serde(default = "default_ttl_minutes")]
  pub ttl_minutes: i64,
}

fn default_api_base() -> String {
  "https://api.ssactivewear.com/v2".to_string()
}

fn default_image_base() -> String {
  "https://www.ssactivewear.com".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_styles_path() -> PathBuf {
  PathBuf::from("data/Styles.csv")
}

fn default_products_path() -> PathBuf {
  PathBuf::from("data/Products.csv")
}

fn default_cache_dir() -> PathBuf {
  PathBuf::from(".cache/inventory")
}

fn default_ttl_minutes() -> i64 {
  5
}

impl Default for VendorConfig {
  fn default() -> Self {
    Self {
      account: None,
      api_base: default_api_base(),
      image_base: default_image_base(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl Default for DataConfig {
  fn default() -> Self {
    Self {
      styles_path: default_styles_path(),
      products_path: default_products_path(),
    }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      dir: default_cache_dir(),
      ttl_minutes: default_ttl_minutes(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./stockroom.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/stockroom/config.yaml
  ///
  /// With no file anywhere, every field falls back to its default; only
  /// credentials are required, and those come from the environment.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("stockroom.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("stockroom").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Vendor account number: config value first, then the SS_ACCOUNT or
  /// SS_ACCOUNT_NUMBER environment variables.
  pub fn vendor_account(&self) -> Result<String> {
    if let Some(account) = &self.vendor.account {
      return Ok(account.clone());
    }
    std::env::var("SS_ACCOUNT")
      .or_else(|_| std::env::var("SS_ACCOUNT_NUMBER"))
      .map_err(|_| {
        eyre!("Vendor account not configured. Set vendor.account or the SS_ACCOUNT environment variable.")
      })
  }

  /// Vendor API key. Never stored in the config file.
  ///
  /// Checks STOCKROOM_API_KEY first, then SS_API_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("STOCKROOM_API_KEY")
      .or_else(|_| std::env::var("SS_API_KEY"))
      .map_err(|_| {
        eyre!("Vendor API key not found. Set STOCKROOM_API_KEY or SS_API_KEY environment variable.")
      })
  }
}

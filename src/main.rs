use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use stockroom::aggregate::StyleStock;
use stockroom::catalog::Catalogs;
use stockroom::config::Config;
use stockroom::images::ImageResolver;
use stockroom::inventory::CachedInventoryClient;

#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(about = "Catalog and live-inventory lookups for the storefront data layer")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/stockroom/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Search styles by free-text query (all tokens must match)
  Search {
    query: String,
    /// Maximum number of results
    #[arg(short, long, default_value_t = 50)]
    limit: usize,
  },
  /// Show style metadata, colors and display prices
  Style { style_id: u32 },
  /// Show aggregated live inventory for a style
  Inventory {
    style_id: u32,
    /// Bypass the inventory cache and fetch live
    #[arg(short, long)]
    refresh: bool,
  },
  /// Print the ranked image gallery for a style, best image first
  Gallery {
    style_id: u32,
    /// Scope the gallery to one color (falls back to style-wide imagery
    /// when the color has none)
    #[arg(long)]
    color: Option<String>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let catalogs = Catalogs::new(&config.data.styles_path, &config.data.products_path);

  match args.command {
    Command::Search { query, limit } => {
      let styles = catalogs.styles(false)?;
      for style in styles.search(&query, limit) {
        println!(
          "{}\t{}\t{}\t{}",
          style.style_id,
          style.brand_name,
          style.style_name,
          style.title.as_deref().unwrap_or("")
        );
      }
    }

    Command::Style { style_id } => {
      let styles = catalogs.styles(false)?;
      let products = catalogs.products(false)?;

      match styles.get_by_id(style_id) {
        Some(style) => {
          println!("{} {}", style.brand_name, style.style_name);
          if let Some(title) = &style.title {
            println!("{}", title);
          }
          if let Some(image) = &style.image {
            println!("image: {}", image);
          }
        }
        None => println!("style {} not in styles feed", style_id),
      }

      for color in products.list_colors(style_id) {
        let rows = products.color_rows(style_id, &color);
        let price = rows
          .iter()
          .find_map(|r| r.display_price())
          .map(|p| format!("${:.2}", p))
          .unwrap_or_else(|| "-".to_string());
        println!("  {} ({} sizes) {}", color, rows.len(), price);
      }
    }

    Command::Inventory { style_id, refresh } => {
      let products = catalogs.products(false)?;
      let client = CachedInventoryClient::new(&config)?;
      let payload = client.fetch_inventory(style_id, refresh).await?;
      let stock = StyleStock::build(style_id, &products, &payload);
      println!("{}", serde_json::to_string_pretty(&stock)?);
    }

    Command::Gallery { style_id, color } => {
      let products = catalogs.products(false)?;
      let resolver = ImageResolver::new(&config.vendor.image_base);
      let all_rows = products.by_style(style_id);
      let scoped = match &color {
        Some(color) => products.color_rows(style_id, color),
        None => all_rows.clone(),
      };
      for url in resolver.gallery(&scoped, &all_rows) {
        println!("{}", url);
      }
    }
  }

  Ok(())
}

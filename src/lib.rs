//! Flat-file catalog and live-inventory data layer for an apparel
//! storefront.
//!
//! The vendor supplies two delimiter-sniffed tabular feeds (styles and
//! per-SKU products) and a rate-limited REST inventory endpoint. This crate
//! loads the feeds into process-wide indexed tables, fronts the inventory
//! endpoint with a two-tier TTL cache, resolves display image galleries, and
//! joins the two worlds by SKU.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod csv;
pub mod images;
pub mod inventory;

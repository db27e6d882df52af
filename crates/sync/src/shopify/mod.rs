//! Shopify Admin API client (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **This module handles the high-privilege Admin API access token.** The
//! token grants write access to products, variants, and the store's file
//! library. Keep it out of logs and shell history; configuration loads it
//! into a `SecretString` and redacts it from `Debug` output.
//!
//! # Architecture
//!
//! - Hand-written GraphQL documents with `serde`-typed responses, posted
//!   via `reqwest` to `https://{store}/admin/api/{version}/graphql.json`
//! - Loosely-typed JSON never crosses this module boundary: every response
//!   is converted into the domain types of `media-sync-core` on arrival
//! - Rate limiting (429) and auth failures surface as typed errors the
//!   orchestrator's retry understands
//!
//! # Example
//!
//! ```rust,ignore
//! use media_sync::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&config.shopify);
//!
//! // Resolve a filename key to a product
//! let entity = client.lookup_by_key("7001").await?;
//!
//! // Allocate a staged upload target
//! let target = client
//!     .create_staged_target("7001.jpg", "image/jpeg", 81234, MediaKind::Image)
//!     .await?;
//! ```

mod client;
mod media;
mod products;

pub use client::ShopifyClient;

//! Catalog
//!
//! Read-only view of products, variants and addons. Reads run inside the caller's
//! transaction so a checkout prices against one consistent snapshot.

pub mod errors;
mod quotes;
pub mod records;
mod repository;
pub mod service;

pub use errors::CatalogServiceError;
pub(crate) use quotes::{quote_addon, quote_price};
pub(crate) use repository::PgCatalogRepository;
pub use service::*;

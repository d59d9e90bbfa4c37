//! Camera catalog: viewport/role query construction and the stores that
//! evaluate it.

pub mod cached;
pub mod postgres;
pub mod query;
pub mod sqlite;
pub mod trait_def;

pub use cached::CachedCatalog;
pub use postgres::PostgresCatalog;
pub use query::{CatalogFilter, Viewport, ViewportError};
pub use sqlite::SqliteCatalog;
pub use trait_def::{CatalogError, CatalogResult, CatalogStore};

//! relmeta cache - hierarchical lazy metadata cache
//!
//! A two-tier cache over an introspection source: container -> ordered
//! table list -> ordered column list per table. Each level is loaded on
//! demand exactly once, with per-key single-flight under concurrent access.

mod cache;

pub use cache::{CacheStats, ColumnList, MetadataCache, TableList};

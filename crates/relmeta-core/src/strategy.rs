//! The pluggable fetch seam between the cache engine and a source variant

use std::cmp::Ordering;

use crate::{Column, Container, MetaQuery, MetadataSession, Result, Row, Table};

/// Source-variant-specific logic for building introspection queries and
/// converting raw rows into entities.
///
/// The cache engine holds a strategy reference and never branches on source
/// identity itself; every driver quirk lives behind this trait. One
/// implementation exists per source variant, configured with that variant's
/// quirk parameters.
pub trait FetchStrategy: Send + Sync {
    /// Query enumerating the tables of `container`. `name_filter` is set
    /// only for the point-lookup fast path and arrives already
    /// wildcard-escaped by the engine; implementations embed it as-is.
    fn table_list_query(
        &self,
        session: &dyn MetadataSession,
        container: &Container,
        name_filter: Option<&str>,
    ) -> Result<MetaQuery>;

    /// Query enumerating the columns of one table, or of all tables in the
    /// container when `table` is absent.
    fn column_list_query(
        &self,
        session: &dyn MetadataSession,
        container: &Container,
        table: Option<&Table>,
    ) -> Result<MetaQuery>;

    /// Convert one raw table row. `None` means the row was filtered out and
    /// must be skipped; it is not an error and never cached.
    fn fetch_table(&self, container: &Container, row: &Row) -> Option<Table>;

    /// Convert one raw column row. Column rows of an accepted table are
    /// never filtered.
    fn fetch_column(&self, table: &Table, row: &Row) -> Result<Column>;

    /// Table identity of a column row, used to demultiplex the all-tables
    /// column query into per-table lists.
    fn column_row_table_name(&self, row: &Row) -> Option<String>;

    /// Whether the source can scope a column query to a single table. When
    /// false, the engine loads columns through the batch all-tables query
    /// and populates sibling tables as a side effect.
    fn supports_scoped_column_query(&self) -> bool {
        true
    }

    /// List order for tables within a container. The engine applies a
    /// stable sort, so rows comparing equal keep source row order.
    fn compare_tables(&self, a: &Table, b: &Table) -> Ordering {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    }
}

//! Hierarchical lazy-loading cache engine
//!
//! Keyed by container, the engine caches the ordered table list and, per
//! table, the ordered column list. Every level moves through
//! unloaded -> loading -> loaded; the loading state is never observable
//! from outside, callers either trigger the load or suspend on the one
//! already in flight.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use relmeta_core::{
    Column, Container, ContainerKey, FetchStrategy, MetaError, MetadataSource, Result, Table,
};

/// Immutable, name-ordered table snapshot for one container
pub type TableList = Arc<Vec<Arc<Table>>>;

/// Immutable, ordinal-ordered column snapshot for one table
pub type ColumnList = Arc<Vec<Column>>;

/// Cache data for a single container
#[derive(Default)]
struct ContainerSlot {
    /// Table list cell; unset = unloaded
    tables: Arc<OnceCell<TableList>>,
    /// Column list cells keyed by table name
    columns: HashMap<String, Arc<OnceCell<ColumnList>>>,
}

/// Two-tier lazy metadata cache.
///
/// All driver-specific behavior lives behind the injected [`FetchStrategy`];
/// the engine owns only the load state machine, ordering and invalidation.
///
/// Single-flight is carried by one `tokio::sync::OnceCell` per cache entry:
/// concurrent callers for the same key share one underlying fetch, and a
/// failed load leaves the cell unset so the next caller retries. A loaded
/// snapshot is immutable until invalidated; no partial list is ever visible.
///
/// Invalidation detaches the entry's cells from the slot map. A load still
/// in flight completes into the detached cell and its result is discarded,
/// so the entry stays unloaded and the next caller reloads from the source.
pub struct MetadataCache {
    source: Arc<dyn MetadataSource>,
    strategy: Arc<dyn FetchStrategy>,
    slots: Mutex<HashMap<ContainerKey, ContainerSlot>>,
}

impl MetadataCache {
    pub fn new(source: Arc<dyn MetadataSource>, strategy: Arc<dyn FetchStrategy>) -> Self {
        Self {
            source,
            strategy,
            slots: Mutex::new(HashMap::new()),
        }
    }

    // ========== Table Operations ==========

    /// Tables of a container, name-ordered. Triggers the load on first
    /// access; concurrent callers suspend on the same load.
    #[tracing::instrument(skip_all, fields(container = %container.key()))]
    pub async fn get_tables(&self, container: &Container) -> Result<TableList> {
        let cell = self.tables_cell(container);
        cell.get_or_try_init(|| self.load_tables(container))
            .await
            .cloned()
    }

    /// Point lookup of one table by name.
    ///
    /// Served from the loaded snapshot when available. Otherwise a
    /// name-filtered lookup query runs against the source without touching
    /// the container's load state, so the single-flight full load stays the
    /// only writer of the table list.
    #[tracing::instrument(skip_all, fields(container = %container.key(), table = name))]
    pub async fn get_table(&self, container: &Container, name: &str) -> Result<Option<Arc<Table>>> {
        if let Some(tables) = self.peek_tables(container) {
            return Ok(tables.iter().find(|t| t.name == name).cloned());
        }

        let wrap = |e| MetaError::metadata_load(format!("{}.{}", container.key(), name), e);
        let session = self.source.open_session().await.map_err(wrap)?;
        let escaped = session.escape_wildcards(name);
        let query = self
            .strategy
            .table_list_query(session.as_ref(), container, Some(&escaped))
            .map_err(wrap)?;
        let result = session.query(&query).await.map_err(wrap)?;
        drop(session);

        for row in &result.rows {
            if let Some(table) = self.strategy.fetch_table(container, row) {
                if table.name == name {
                    return Ok(Some(Arc::new(table)));
                }
            }
        }
        Ok(None)
    }

    async fn load_tables(&self, container: &Container) -> Result<TableList> {
        let key = container.key();
        let wrap = |e| MetaError::metadata_load(key.to_string(), e);

        let session = self.source.open_session().await.map_err(wrap)?;
        let query = self
            .strategy
            .table_list_query(session.as_ref(), container, None)
            .map_err(wrap)?;
        let result = session.query(&query).await.map_err(wrap)?;
        drop(session);

        let mut tables: Vec<Arc<Table>> = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            // None means the row was filtered; skipped, never tombstoned
            if let Some(table) = self.strategy.fetch_table(container, row) {
                tables.push(Arc::new(table));
            }
        }
        // stable sort: rows comparing equal keep source row order
        tables.sort_by(|a, b| self.strategy.compare_tables(a, b));

        tracing::debug!(
            container = %key,
            rows = result.rows.len(),
            tables = tables.len(),
            "loaded table list"
        );
        Ok(Arc::new(tables))
    }

    // ========== Column Operations ==========

    /// Columns of a table, ordinal-ordered, with the same lazy single-flight
    /// semantics scoped to the table.
    #[tracing::instrument(skip_all, fields(container = %container.key(), table = %table.name))]
    pub async fn get_columns(&self, container: &Container, table: &Table) -> Result<ColumnList> {
        let cell = self.columns_cell(container, &table.name);
        cell.get_or_try_init(|| self.load_columns(container, table))
            .await
            .cloned()
    }

    async fn load_columns(&self, container: &Container, table: &Table) -> Result<ColumnList> {
        if self.strategy.supports_scoped_column_query() {
            self.load_columns_scoped(container, table).await
        } else {
            self.load_columns_batch(container, Some(table)).await
        }
    }

    async fn load_columns_scoped(&self, container: &Container, table: &Table) -> Result<ColumnList> {
        let wrap = |e| MetaError::metadata_load(table.name.clone(), e);

        let session = self.source.open_session().await.map_err(wrap)?;
        let query = self
            .strategy
            .column_list_query(session.as_ref(), container, Some(table))
            .map_err(wrap)?;
        let result = session.query(&query).await.map_err(wrap)?;
        drop(session);

        let mut columns = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            columns.push(self.strategy.fetch_column(table, row).map_err(wrap)?);
        }
        columns.sort_by_key(|c| c.ordinal);

        tracing::debug!(table = %table.name, columns = columns.len(), "loaded column list");
        Ok(Arc::new(columns))
    }

    /// Load columns for every table of the container from one all-tables
    /// query, handing each sibling its list as a side effect. Returns the
    /// list of `target` when given, so sibling population amortizes the
    /// batch query across later lookups.
    async fn load_columns_batch(
        &self,
        container: &Container,
        target: Option<&Table>,
    ) -> Result<ColumnList> {
        let key = container.key();
        let wrap = |e| MetaError::metadata_load(key.to_string(), e);

        // demultiplexing needs the table entities
        let tables = self.get_tables(container).await?;

        let session = self.source.open_session().await.map_err(wrap)?;
        let query = self
            .strategy
            .column_list_query(session.as_ref(), container, None)
            .map_err(wrap)?;
        let result = session.query(&query).await.map_err(wrap)?;
        drop(session);

        let mut by_table: HashMap<String, Vec<Column>> = HashMap::new();
        for row in &result.rows {
            let Some(table_name) = self.strategy.column_row_table_name(row) else {
                tracing::debug!(container = %key, "column row without table identity, skipped");
                continue;
            };
            let Some(owner) = tables.iter().find(|t| t.name == table_name) else {
                tracing::debug!(container = %key, table = %table_name, "column row for unknown table, skipped");
                continue;
            };
            let column = self.strategy.fetch_column(owner, row).map_err(wrap)?;
            by_table.entry(table_name).or_default().push(column);
        }

        let mut target_list: ColumnList = Arc::new(Vec::new());
        for table in tables.iter() {
            let mut columns = by_table.remove(&table.name).unwrap_or_default();
            columns.sort_by_key(|c| c.ordinal);
            let list: ColumnList = Arc::new(columns);

            if target.is_some_and(|t| t.name == table.name) {
                // the caller's OnceCell stores this through get_or_try_init
                target_list = list;
                continue;
            }
            let cell = self.columns_cell(container, &table.name);
            if cell.set(list).is_err() {
                // already loaded or mid-load elsewhere; that result wins
                tracing::debug!(table = %table.name, "batch column list dropped, cell occupied");
            }
        }

        tracing::debug!(
            container = %key,
            tables = tables.len(),
            rows = result.rows.len(),
            "batch-loaded column lists"
        );
        Ok(target_list)
    }

    // ========== Invalidation ==========

    /// Drop the container's table list and every cached column list. An
    /// in-flight load completes into the detached entry and is discarded.
    pub fn invalidate_container(&self, container: &Container) {
        let mut slots = self.slots.lock();
        if slots.remove(&container.key()).is_some() {
            tracing::info!(container = %container.key(), "invalidated container metadata");
        }
    }

    /// Drop the cached column list of one table; the container's table list
    /// is untouched.
    pub fn invalidate_table(&self, container: &Container, table: &str) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(&container.key()) {
            if slot.columns.remove(table).is_some() {
                tracing::debug!(container = %container.key(), table = %table, "invalidated column list");
            }
        }
    }

    /// Reload the whole container in one pass: fresh table list, then every
    /// table's columns from a single all-tables query.
    #[tracing::instrument(skip_all, fields(container = %container.key()))]
    pub async fn refresh_full(&self, container: &Container) -> Result<TableList> {
        self.invalidate_container(container);
        let tables = self.get_tables(container).await?;
        self.load_columns_batch(container, None).await?;
        Ok(tables)
    }

    /// Drop everything
    pub fn clear(&self) {
        let count = self.slots.lock().len();
        tracing::info!(containers = count, "clearing metadata cache");
        self.slots.lock().clear();
    }

    // ========== Introspection ==========

    /// Whether the container's table list is loaded
    pub fn tables_loaded(&self, container: &Container) -> bool {
        self.peek_tables(container).is_some()
    }

    /// Cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        let slots = self.slots.lock();
        let mut stats = CacheStats::default();
        for slot in slots.values() {
            stats.containers += 1;
            if slot.tables.initialized() {
                stats.table_lists_loaded += 1;
            }
            stats.column_lists_loaded += slot
                .columns
                .values()
                .filter(|cell| cell.initialized())
                .count();
        }
        stats
    }

    fn peek_tables(&self, container: &Container) -> Option<TableList> {
        let slots = self.slots.lock();
        slots
            .get(&container.key())
            .and_then(|slot| slot.tables.get())
            .cloned()
    }

    fn tables_cell(&self, container: &Container) -> Arc<OnceCell<TableList>> {
        let mut slots = self.slots.lock();
        slots.entry(container.key()).or_default().tables.clone()
    }

    fn columns_cell(&self, container: &Container, table: &str) -> Arc<OnceCell<ColumnList>> {
        let mut slots = self.slots.lock();
        slots
            .entry(container.key())
            .or_default()
            .columns
            .entry(table.to_string())
            .or_default()
            .clone()
    }
}

/// Statistics about the cache state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Containers with at least one tracked entry
    pub containers: usize,
    /// Containers whose table list is loaded
    pub table_lists_loaded: usize,
    /// Tables whose column list is loaded
    pub column_lists_loaded: usize,
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

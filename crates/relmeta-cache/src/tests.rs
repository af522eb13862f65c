//! Tests for the hierarchical metadata cache

use super::*;
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use relmeta_core::{
    Container, MetaError, MetaQuery, MetadataSession, MetadataSource, QueryResult, Result, Row,
    SourcePreferences, TypeRegistry, Value,
};
use relmeta_generic::{GenericStrategy, QuirkProfile};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

// ============ Scripted Source ============

#[derive(Default)]
struct SourceState {
    table_rows: SyncMutex<Vec<Row>>,
    column_rows: SyncMutex<Vec<Row>>,
    table_queries: AtomicUsize,
    column_queries: AtomicUsize,
    last_table_pattern: SyncMutex<Option<String>>,
    fail_next_tables: AtomicBool,
    delay_ms: AtomicU64,
}

struct ScriptedSession {
    state: Arc<SourceState>,
}

#[async_trait]
impl MetadataSession for ScriptedSession {
    async fn query(&self, query: &MetaQuery) -> Result<QueryResult> {
        let delay = self.state.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        match query {
            MetaQuery::Tables { table_pattern, .. } => {
                self.state.table_queries.fetch_add(1, Ordering::SeqCst);
                *self.state.last_table_pattern.lock() = table_pattern.clone();
                if self.state.fail_next_tables.swap(false, Ordering::SeqCst) {
                    return Err(MetaError::Query("connection reset".to_string()));
                }
                let rows = self
                    .state
                    .table_rows
                    .lock()
                    .iter()
                    .filter(|row| match table_pattern {
                        Some(pattern) => {
                            row.get_string_trimmed("TABLE_NAME").as_deref() == Some(pattern.as_str())
                        }
                        None => true,
                    })
                    .cloned()
                    .collect();
                Ok(QueryResult {
                    columns: Vec::new(),
                    rows,
                })
            }
            MetaQuery::Columns { table_pattern, .. } => {
                self.state.column_queries.fetch_add(1, Ordering::SeqCst);
                let rows = self
                    .state
                    .column_rows
                    .lock()
                    .iter()
                    .filter(|row| {
                        table_pattern == "%"
                            || row.get_string_trimmed("TABLE_NAME").as_deref()
                                == Some(table_pattern.as_str())
                    })
                    .cloned()
                    .collect();
                Ok(QueryResult {
                    columns: Vec::new(),
                    rows,
                })
            }
        }
    }
}

struct ScriptedSource {
    state: Arc<SourceState>,
}

#[async_trait]
impl MetadataSource for ScriptedSource {
    async fn open_session(&self) -> Result<Box<dyn MetadataSession>> {
        Ok(Box::new(ScriptedSession {
            state: self.state.clone(),
        }))
    }
}

// ============ Row Builders ============

fn s(text: &str) -> Value {
    Value::String(text.to_string())
}

fn row(cells: &[(&str, Value)]) -> Row {
    Row::new(
        cells.iter().map(|(label, _)| label.to_string()).collect(),
        cells.iter().map(|(_, value)| value.clone()).collect(),
    )
}

fn table_row(name: &str, type_label: &str) -> Row {
    row(&[
        ("TABLE_NAME", s(name)),
        ("TABLE_TYPE", s(type_label)),
        ("TABLE_SCHEM", Value::Null),
    ])
}

fn column_row(table: &str, name: &str, ordinal: i32) -> Row {
    row(&[
        ("TABLE_NAME", s(table)),
        ("COLUMN_NAME", s(name)),
        ("DATA_TYPE", Value::Int32(12)),
        ("TYPE_NAME", s("VARCHAR")),
        ("COLUMN_SIZE", Value::Int64(20)),
        ("NULLABLE", Value::Int32(1)),
        ("ORDINAL_POSITION", Value::Int32(ordinal)),
        ("IS_AUTOINCREMENT", s("NO")),
    ])
}

fn strategy(scoped_column_queries: bool) -> Arc<GenericStrategy> {
    Arc::new(GenericStrategy::new(
        QuirkProfile {
            scoped_column_queries,
            ..QuirkProfile::default()
        },
        Arc::new(TypeRegistry::with_standard_types()),
        SourcePreferences::default(),
    ))
}

fn scripted(
    tables: Vec<Row>,
    columns: Vec<Row>,
    scoped_column_queries: bool,
) -> (Arc<MetadataCache>, Arc<SourceState>) {
    let state = Arc::new(SourceState {
        table_rows: SyncMutex::new(tables),
        column_rows: SyncMutex::new(columns),
        ..SourceState::default()
    });
    let cache = Arc::new(MetadataCache::new(
        Arc::new(ScriptedSource {
            state: state.clone(),
        }),
        strategy(scoped_column_queries),
    ));
    (cache, state)
}

// ============ Table Loading ============

mod table_load_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn idempotent_load_issues_one_query() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE"), table_row("orders", "TABLE")],
            vec![],
            true,
        );
        let container = Container::schema("public");

        let first = cache.get_tables(&container).await.unwrap();
        let second = cache.get_tables(&container).await.unwrap();

        assert_eq!(state.table_queries.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn tables_ordered_by_name() {
        let (cache, _state) = scripted(
            vec![
                table_row("b", "TABLE"),
                table_row("A", "TABLE"),
                table_row("c", "TABLE"),
            ],
            vec![],
            true,
        );
        let container = Container::schema("public");

        let tables = cache.get_tables(&container).await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b", "c"]);
    }

    #[tokio::test]
    async fn filtered_rows_are_skipped_not_tombstoned() {
        let (cache, _state) = scripted(
            vec![
                table_row("users", "TABLE"),
                table_row("users_seq", "SEQUENCE"),
                table_row("  ", "TABLE"),
                table_row("pg_class", "SYSTEM TABLE"),
            ],
            vec![],
            true,
        );
        let container = Container::schema("public");

        let tables = cache.get_tables(&container).await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["users"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_load() {
        let (cache, state) = scripted(
            vec![table_row("a", "TABLE"), table_row("b", "TABLE")],
            vec![],
            true,
        );
        state.delay_ms.store(25, Ordering::SeqCst);
        let container = Container::schema("public");
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let container = container.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                cache.get_tables(&container).await.unwrap()
            }));
        }

        let mut lists = Vec::new();
        for handle in handles {
            lists.push(handle.await.unwrap());
        }

        assert_eq!(state.table_queries.load(Ordering::SeqCst), 1);
        for list in &lists {
            assert!(Arc::ptr_eq(list, &lists[0]));
        }
        let names: Vec<&str> = lists[0].iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn load_failure_is_reported_and_retryable() {
        let (cache, state) = scripted(vec![table_row("users", "TABLE")], vec![], true);
        state.fail_next_tables.store(true, Ordering::SeqCst);
        let container = Container::schema("public");

        let err = cache.get_tables(&container).await.unwrap_err();
        assert!(
            err.to_string()
                .contains("unable to load metadata for public"),
            "unexpected error: {err}"
        );
        assert!(!cache.tables_loaded(&container));

        // no partial data was cached; the next call retries and succeeds
        let tables = cache.get_tables(&container).await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 2);
    }
}

// ============ Point Lookup ============

mod lookup_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn lookup_on_loaded_container_serves_from_cache() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE"), table_row("orders", "TABLE")],
            vec![],
            true,
        );
        let container = Container::schema("public");

        cache.get_tables(&container).await.unwrap();
        let table = cache.get_table(&container, "orders").await.unwrap();
        assert_eq!(table.unwrap().name, "orders");
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 1);

        let missing = cache.get_table(&container, "ghost").await.unwrap();
        assert!(missing.is_none());
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_on_unloaded_container_leaves_it_unloaded() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE"), table_row("orders", "TABLE")],
            vec![],
            true,
        );
        let container = Container::schema("public");

        let table = cache.get_table(&container, "users").await.unwrap();
        assert_eq!(table.unwrap().name, "users");
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 1);
        assert!(!cache.tables_loaded(&container));

        // the full load still runs its own query
        let tables = cache.get_tables(&container).await.unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn lookup_escapes_wildcards_exactly_once() {
        let (cache, state) = scripted(vec![], vec![], true);
        let container = Container::schema("public");

        cache.get_table(&container, "audit_log").await.unwrap();

        // the engine owns the escaping; the strategy embeds the pattern as-is
        assert_eq!(
            state.last_table_pattern.lock().as_deref(),
            Some("audit\\_log")
        );
    }
}

// ============ Column Loading ============

mod column_load_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn columns_ordered_by_ordinal_position() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE")],
            vec![
                column_row("users", "email", 3),
                column_row("users", "id", 1),
                column_row("users", "name", 2),
            ],
            true,
        );
        let container = Container::schema("public");

        let tables = cache.get_tables(&container).await.unwrap();
        let columns = cache.get_columns(&container, &tables[0]).await.unwrap();

        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
        assert_eq!(
            columns.iter().map(|c| c.ordinal).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 1);

        // second read is served from the snapshot
        let again = cache.get_columns(&container, &tables[0]).await.unwrap();
        assert!(Arc::ptr_eq(&columns, &again));
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scoped_strategy_queries_per_table() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE"), table_row("orders", "TABLE")],
            vec![
                column_row("users", "id", 1),
                column_row("orders", "total", 1),
            ],
            true,
        );
        let container = Container::schema("public");
        let tables = cache.get_tables(&container).await.unwrap();

        let orders = cache.get_columns(&container, &tables[0]).await.unwrap();
        let users = cache.get_columns(&container, &tables[1]).await.unwrap();

        assert_eq!(orders[0].name, "total");
        assert_eq!(users[0].name, "id");
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batch_strategy_populates_siblings_from_one_query() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE"), table_row("orders", "TABLE")],
            vec![
                column_row("users", "id", 1),
                column_row("users", "name", 2),
                column_row("orders", "total", 1),
                column_row("ghost", "phantom", 1),
            ],
            false,
        );
        let container = Container::schema("public");
        let tables = cache.get_tables(&container).await.unwrap();
        let orders = &tables[0];
        let users = &tables[1];

        let order_columns = cache.get_columns(&container, orders).await.unwrap();
        assert_eq!(order_columns.len(), 1);
        assert_eq!(order_columns[0].name, "total");
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 1);

        // the sibling was populated for free; no second query
        let user_columns = cache.get_columns(&container, users).await.unwrap();
        let names: Vec<&str> = user_columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 1);
    }
}

// ============ Invalidation & Refresh ============

mod invalidation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn invalidate_then_reload_observes_fresh_data() {
        let (cache, state) = scripted(vec![table_row("old", "TABLE")], vec![], true);
        let container = Container::schema("public");

        let before = cache.get_tables(&container).await.unwrap();
        assert_eq!(before[0].name, "old");

        *state.table_rows.lock() = vec![table_row("new", "TABLE")];

        // without invalidation the snapshot is stable
        let cached = cache.get_tables(&container).await.unwrap();
        assert_eq!(cached[0].name, "old");
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 1);

        cache.invalidate_container(&container);
        let after = cache.get_tables(&container).await.unwrap();
        assert_eq!(after[0].name, "new");
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_table_discards_only_its_columns() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE"), table_row("orders", "TABLE")],
            vec![
                column_row("users", "id", 1),
                column_row("orders", "total", 1),
            ],
            true,
        );
        let container = Container::schema("public");
        let tables = cache.get_tables(&container).await.unwrap();
        let orders = &tables[0];
        let users = &tables[1];

        cache.get_columns(&container, users).await.unwrap();
        cache.get_columns(&container, orders).await.unwrap();
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 2);

        cache.invalidate_table(&container, "users");

        // the table list and the sibling's columns are untouched
        assert!(cache.tables_loaded(&container));
        cache.get_columns(&container, orders).await.unwrap();
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 2);

        cache.get_columns(&container, users).await.unwrap();
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn refresh_full_loads_everything_in_one_pass() {
        let (cache, state) = scripted(
            vec![table_row("users", "TABLE"), table_row("orders", "TABLE")],
            vec![
                column_row("users", "id", 1),
                column_row("orders", "total", 1),
            ],
            true,
        );
        let container = Container::schema("public");

        let tables = cache.refresh_full(&container).await.unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(state.table_queries.load(Ordering::SeqCst), 1);
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 1);

        // every table's columns came out of the single batch query
        for table in tables.iter() {
            let columns = cache.get_columns(&container, table).await.unwrap();
            assert_eq!(columns.len(), 1);
        }
        assert_eq!(state.column_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_and_stats() {
        let (cache, _state) = scripted(
            vec![table_row("users", "TABLE")],
            vec![column_row("users", "id", 1)],
            true,
        );
        let container = Container::schema("public");

        assert_eq!(cache.stats(), CacheStats::default());

        let tables = cache.get_tables(&container).await.unwrap();
        cache.get_columns(&container, &tables[0]).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.containers, 1);
        assert_eq!(stats.table_lists_loaded, 1);
        assert_eq!(stats.column_lists_loaded, 1);

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}

//! Session and source traits over the introspection transport

use async_trait::async_trait;

use crate::{QueryResult, Result};

/// A structured introspection request, shaped like the generic driver
/// metadata API.
///
/// Pattern fields use SQL LIKE wildcard conventions; literal identifiers
/// embedded in a pattern must be escaped first (see
/// [`MetadataSession::escape_wildcards`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaQuery {
    /// Enumerate tables within a catalog/schema scope. `table_pattern` is
    /// set only for point lookups.
    Tables {
        catalog: Option<String>,
        schema: Option<String>,
        table_pattern: Option<String>,
    },
    /// Enumerate columns for tables matching `table_pattern`
    Columns {
        catalog: Option<String>,
        schema: Option<String>,
        table_pattern: String,
        column_pattern: String,
    },
}

/// A scoped introspection session.
///
/// Acquired for the duration of one load pass and dropped on every exit
/// path (success, empty result or failure). The session may serialize or
/// parallelize underlying access at its own discretion; the cache never
/// assumes exclusive use.
#[async_trait]
pub trait MetadataSession: Send + Sync {
    /// Run one introspection query
    async fn query(&self, query: &MetaQuery) -> Result<QueryResult>;

    /// Neutralize pattern metacharacters in a literal identifier before it
    /// is embedded in a query pattern. Sources with a different escape
    /// convention override this.
    fn escape_wildcards(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for ch in text.chars() {
            if matches!(ch, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        escaped
    }
}

/// Provider of introspection sessions, analogous to a driver's metadata
/// interface behind a live connection.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Open a session for one load pass
    async fn open_session(&self) -> Result<Box<dyn MetadataSession>>;
}

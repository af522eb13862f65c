//! Generic fetch strategy over driver-style metadata result sets

use std::collections::HashSet;
use std::sync::Arc;

use relmeta_core::{
    Column, Container, FetchStrategy, MetaQuery, MetadataSession, Result, Row, SourcePreferences,
    Table, TypeCode, TypeRegistry,
};

use crate::filter::check_table_row;
use crate::normalize::normalize_type_name;

/// Result column labels of the generic metadata shape
mod labels {
    pub const TABLE_NAME: &str = "TABLE_NAME";
    pub const TABLE_TYPE: &str = "TABLE_TYPE";
    pub const TABLE_SCHEM: &str = "TABLE_SCHEM";
    pub const COLUMN_NAME: &str = "COLUMN_NAME";
    pub const DATA_TYPE: &str = "DATA_TYPE";
    pub const SOURCE_DATA_TYPE: &str = "SOURCE_DATA_TYPE";
    pub const TYPE_NAME: &str = "TYPE_NAME";
    pub const COLUMN_SIZE: &str = "COLUMN_SIZE";
    pub const NULLABLE: &str = "NULLABLE";
    pub const DECIMAL_DIGITS: &str = "DECIMAL_DIGITS";
    pub const NUM_PREC_RADIX: &str = "NUM_PREC_RADIX";
    pub const COLUMN_DEF: &str = "COLUMN_DEF";
    pub const REMARKS: &str = "REMARKS";
    pub const CHAR_OCTET_LENGTH: &str = "CHAR_OCTET_LENGTH";
    pub const ORDINAL_POSITION: &str = "ORDINAL_POSITION";
    pub const IS_AUTOINCREMENT: &str = "IS_AUTOINCREMENT";
    pub const IS_GENERATEDCOLUMN: &str = "IS_GENERATEDCOLUMN";
}

/// `NULLABLE` enumeration value meaning the column rejects NULLs
const COLUMN_NO_NULLS: i32 = 0;

/// Per-source-variant quirk parameters.
///
/// The defaults carry the object kinds that common drivers are known to
/// leak into table listings, plus the usual textual type-name quirks. A
/// source variant with different behavior gets its own profile instead of
/// patching a process-wide constant.
#[derive(Debug, Clone)]
pub struct QuirkProfile {
    /// Type labels that do not denote tables (compared uppercase)
    pub invalid_table_types: HashSet<String>,
    /// Trailing modifier marking identity columns
    pub identity_suffix: String,
    /// Wildcard pattern matching every object name
    pub all_objects_pattern: String,
    /// Sentinel substituted for a blank declared type name
    pub unknown_type_name: String,
    /// Whether the source supports column queries scoped to one table;
    /// when false, columns load through the batch all-tables query
    pub scoped_column_queries: bool,
}

impl Default for QuirkProfile {
    fn default() -> Self {
        Self {
            invalid_table_types: [
                "INDEX",
                "SEQUENCE",
                "TYPE",
                "SYSTEM INDEX",
                "SYSTEM SEQUENCE",
                "TRIGGER",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            identity_suffix: " IDENTITY".to_string(),
            all_objects_pattern: "%".to_string(),
            unknown_type_name: "N/A".to_string(),
            scoped_column_queries: true,
        }
    }
}

/// Fetch strategy for sources exposing the generic driver metadata shape
pub struct GenericStrategy {
    profile: QuirkProfile,
    registry: Arc<TypeRegistry>,
    prefs: SourcePreferences,
}

impl GenericStrategy {
    pub fn new(
        profile: QuirkProfile,
        registry: Arc<TypeRegistry>,
        prefs: SourcePreferences,
    ) -> Self {
        Self {
            profile,
            registry,
            prefs,
        }
    }

    /// Default profile, standard type registry, system objects hidden
    pub fn with_defaults() -> Self {
        Self::new(
            QuirkProfile::default(),
            Arc::new(TypeRegistry::with_standard_types()),
            SourcePreferences::default(),
        )
    }

    pub fn profile(&self) -> &QuirkProfile {
        &self.profile
    }
}

impl FetchStrategy for GenericStrategy {
    fn table_list_query(
        &self,
        _session: &dyn MetadataSession,
        container: &Container,
        name_filter: Option<&str>,
    ) -> Result<MetaQuery> {
        Ok(MetaQuery::Tables {
            catalog: container.catalog.clone(),
            schema: container.schema.clone(),
            table_pattern: name_filter.map(|n| n.to_string()),
        })
    }

    fn column_list_query(
        &self,
        session: &dyn MetadataSession,
        container: &Container,
        table: Option<&Table>,
    ) -> Result<MetaQuery> {
        // a virtual container's schema name is synthetic; don't send it
        let schema = match &container.schema {
            Some(schema) if !container.virtual_container => {
                Some(session.escape_wildcards(schema))
            }
            _ => None,
        };
        let table_pattern = match table {
            Some(table) => session.escape_wildcards(&table.name),
            None => self.profile.all_objects_pattern.clone(),
        };
        Ok(MetaQuery::Columns {
            catalog: container.catalog.clone(),
            schema,
            table_pattern,
            column_pattern: self.profile.all_objects_pattern.clone(),
        })
    }

    fn fetch_table(&self, container: &Container, row: &Row) -> Option<Table> {
        let name = row.get_string_trimmed(labels::TABLE_NAME);
        let type_label = row.get_string_trimmed(labels::TABLE_TYPE);
        let row_schema = row.get_string_trimmed(labels::TABLE_SCHEM);

        if let Some(reason) = check_table_row(
            container,
            name.as_deref(),
            type_label.as_deref(),
            row_schema.as_deref(),
            &self.profile.invalid_table_types,
            self.prefs.show_system_objects,
        ) {
            tracing::debug!(
                container = %container.key(),
                table = name.as_deref().unwrap_or(""),
                %reason,
                "table row rejected"
            );
            return None;
        }

        Some(Table::new(container, name?, type_label))
    }

    fn fetch_column(&self, table: &Table, row: &Row) -> Result<Column> {
        let name = row.get_string_trimmed(labels::COLUMN_NAME).unwrap_or_default();
        let declared_code = row.get_i32(labels::DATA_TYPE).unwrap_or(0);
        let source_type = row.get_i32(labels::SOURCE_DATA_TYPE).unwrap_or(0);
        let size = row.get_i64(labels::COLUMN_SIZE).unwrap_or(0);
        // strictly the no-nulls enumeration value, never a textual hint
        let nullable = row.get_i32(labels::NULLABLE) != Some(COLUMN_NO_NULLS);

        let scale = match row.try_get_i32(labels::DECIMAL_DIGITS) {
            Ok(scale) => scale,
            Err(err) => {
                tracing::warn!(table = %table.name, column = %name, error = %err, "error reading column scale");
                None
            }
        };
        let radix = match row.try_get_i32(labels::NUM_PREC_RADIX) {
            Ok(Some(radix)) => radix,
            Ok(None) => 10,
            Err(err) => {
                tracing::warn!(table = %table.name, column = %name, error = %err, "error reading column radix");
                10
            }
        };

        let default_value = row.get_string(labels::COLUMN_DEF);
        let remarks = row.get_string(labels::REMARKS);
        let char_length = row.get_i64(labels::CHAR_OCTET_LENGTH).unwrap_or(0);
        let ordinal = row.get_i32(labels::ORDINAL_POSITION).unwrap_or(0).max(0) as u32;
        let mut auto_increment = row.get_bool_yes(labels::IS_AUTOINCREMENT);
        let auto_generated = row.get_bool_yes(labels::IS_GENERATEDCOLUMN);

        let normalized = normalize_type_name(
            row.get_string_trimmed(labels::TYPE_NAME).as_deref(),
            &self.profile.identity_suffix,
            &self.profile.unknown_type_name,
        );
        if normalized.identity {
            // the identity modifier wins over the source's own field
            auto_increment = true;
        }

        // the source's numeric code is untrustworthy; a registry hit wins
        let mut type_code = TypeCode::from_code(declared_code);
        if let Some(code) = self.registry.resolve(&normalized.name) {
            type_code = code;
        }
        let precision = type_code.is_decimal_numeric().then_some(size as i32);

        Ok(Column {
            name,
            type_name: normalized.name,
            type_code,
            source_type,
            ordinal,
            size,
            char_length,
            scale,
            precision,
            radix,
            nullable,
            default_value,
            remarks,
            auto_increment,
            auto_generated,
        })
    }

    fn column_row_table_name(&self, row: &Row) -> Option<String> {
        row.get_string_trimmed(labels::TABLE_NAME)
    }

    fn supports_scoped_column_query(&self) -> bool {
        self.profile.scoped_column_queries
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

//! Admission rules for raw table rows
//!
//! Some drivers return non-table objects from table listings, report
//! schema-qualified rows for schema-less sources, or leak system objects.
//! These rules decide which raw rows are admitted as real tables; getting
//! them wrong silently hides or fabricates tables.

use std::collections::HashSet;

use relmeta_core::Container;

/// Why a raw table row was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Blank or missing table name
    EmptyName,
    /// Row reports a schema while the source has no schema dimension
    SchemaQualified,
    /// Type label names an object kind that is not a table
    InvalidType,
    /// Schema-qualified row under a virtual container
    VirtualSchemaMismatch,
    /// System table while system objects are hidden
    SystemHidden,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            RejectReason::EmptyName => "empty table name",
            RejectReason::SchemaQualified => "schema-qualified row in schema-less source",
            RejectReason::InvalidType => "object kind is not a table",
            RejectReason::VirtualSchemaMismatch => "schema mismatch under virtual container",
            RejectReason::SystemHidden => "system objects are hidden",
        };
        write!(f, "{}", reason)
    }
}

fn blank(text: Option<&str>) -> bool {
    text.is_none_or(|t| t.trim().is_empty())
}

/// Decide whether a raw table row denotes a real table.
///
/// Rules apply in order and short-circuit on the first match. A rejection
/// is never an error: the caller logs it at debug level and skips the row.
pub(crate) fn check_table_row(
    container: &Container,
    name: Option<&str>,
    type_label: Option<&str>,
    row_schema: Option<&str>,
    invalid_table_types: &HashSet<String>,
    show_system_objects: bool,
) -> Option<RejectReason> {
    if blank(name) {
        return Some(RejectReason::EmptyName);
    }
    if !blank(row_schema) && container.omit_schema {
        return Some(RejectReason::SchemaQualified);
    }
    if let Some(label) = type_label {
        if invalid_table_types.contains(&label.trim().to_uppercase()) {
            return Some(RejectReason::InvalidType);
        }
    }
    if container.virtual_container && !blank(row_schema) {
        return Some(RejectReason::VirtualSchemaMismatch);
    }
    let is_system = type_label.is_some_and(|label| label.to_uppercase().contains("SYSTEM"));
    if is_system && !show_system_objects {
        return Some(RejectReason::SystemHidden);
    }
    None
}

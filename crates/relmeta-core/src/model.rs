//! Domain entities: containers, tables and columns

use serde::{Deserialize, Serialize};

use crate::TypeCode;

/// A schema- or catalog-level scope holding zero or more tables.
///
/// Owned by the container tree above this layer; the cache only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Display name of the container itself
    pub name: String,
    /// Parent catalog name, if the source has a catalog dimension
    pub catalog: Option<String>,
    /// Schema name, if the source has a schema dimension
    pub schema: Option<String>,
    /// Synthetic container not backed by a real schema (federation views,
    /// single-schema sources presented through a placeholder node)
    pub virtual_container: bool,
    /// Source-level quirk: the source has no schema dimension, so rows that
    /// still report a schema are artifacts and must be dropped
    pub omit_schema: bool,
}

impl Container {
    /// A schema-level container
    pub fn schema(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            schema: Some(name.clone()),
            name,
            catalog: None,
            virtual_container: false,
            omit_schema: false,
        }
    }

    /// A catalog-level container without a schema dimension
    pub fn catalog(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            catalog: Some(name.clone()),
            name,
            schema: None,
            virtual_container: false,
            omit_schema: false,
        }
    }

    /// Set the parent catalog
    pub fn in_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Mark as a virtual (synthetic) container
    pub fn with_virtual(mut self, virtual_container: bool) -> Self {
        self.virtual_container = virtual_container;
        self
    }

    /// Mark the source as schema-less
    pub fn with_omit_schema(mut self, omit_schema: bool) -> Self {
        self.omit_schema = omit_schema;
        self
    }

    /// Cache key identifying this container
    pub fn key(&self) -> ContainerKey {
        ContainerKey {
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }
}

/// Identity of a container within the cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerKey {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
}

impl std::fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(catalog) = &self.catalog {
            write!(f, "{}.", catalog)?;
        }
        write!(f, "{}", self.name)
    }
}

/// A named relation surfaced by introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Raw type label as reported by the source ("TABLE", "VIEW",
    /// "SYSTEM TABLE", ...)
    pub type_label: String,
    /// Derived from the type label; system tables may be hidden by
    /// source preferences
    pub is_system: bool,
    /// Owning container's catalog name
    pub catalog: Option<String>,
    /// Owning container's schema name
    pub schema: Option<String>,
}

impl Table {
    /// Build a table entity from a raw row's name and type label. A missing
    /// label defaults to "TABLE".
    pub fn new(container: &Container, name: impl Into<String>, type_label: Option<String>) -> Self {
        let type_label = type_label.unwrap_or_else(|| "TABLE".to_string());
        let is_system = type_label.to_uppercase().contains("SYSTEM");
        Self {
            name: name.into(),
            type_label,
            is_system,
            catalog: container.catalog.clone(),
            schema: container.schema.clone(),
        }
    }

    pub fn is_view(&self) -> bool {
        self.type_label.to_uppercase().contains("VIEW")
    }
}

/// A table column after normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type name, post-normalization (identity suffix and empty
    /// parameter lists stripped, blank replaced by a sentinel)
    pub type_name: String,
    /// Canonical type identifier; a registry hit overrides the code the
    /// source reported
    pub type_code: TypeCode,
    /// Source-declared secondary type code, kept verbatim
    pub source_type: i32,
    /// 1-based position; defines the default column ordering
    pub ordinal: u32,
    /// Declared size/length
    pub size: i64,
    /// Character octet length
    pub char_length: i64,
    /// Decimal scale; absent when the source failed to report it
    pub scale: Option<i32>,
    /// Precision; only meaningful for fixed/decimal numeric types
    pub precision: Option<i32>,
    /// Numeric radix; defaults to 10 when unreadable
    pub radix: i32,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub remarks: Option<String>,
    pub auto_increment: bool,
    pub auto_generated: bool,
}

/// Effective visibility configuration for a source.
///
/// Loading this from user settings happens elsewhere; the cache only
/// consumes the resolved flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourcePreferences {
    /// Whether system tables are admitted into table lists
    pub show_system_objects: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_flag_derived_from_type_label() {
        let container = Container::schema("public");
        let table = Table::new(&container, "pg_class", Some("SYSTEM TABLE".to_string()));
        assert!(table.is_system);
        assert!(!table.is_view());

        let table = Table::new(&container, "users", Some("TABLE".to_string()));
        assert!(!table.is_system);

        // label defaults to TABLE when the source reports none
        let table = Table::new(&container, "orders", None);
        assert_eq!(table.type_label, "TABLE");
        assert!(!table.is_system);
    }

    #[test]
    fn container_keys_distinguish_catalogs() {
        let a = Container::schema("public").in_catalog("db1");
        let b = Container::schema("public").in_catalog("db2");
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key().to_string(), "db1.public");
    }
}

//! Canonical type identifiers and the local type registry

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Canonical, source-independent type identifier.
///
/// Numeric codes follow the generic driver-metadata convention so that a
/// registry hit can transparently override the code the source reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCode {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Clob,
    Boolean,
    /// A code this layer does not interpret
    Other(i32),
}

impl TypeCode {
    /// Map a source-declared numeric code to a canonical identifier
    pub fn from_code(code: i32) -> Self {
        match code {
            -7 => TypeCode::Bit,
            -6 => TypeCode::TinyInt,
            5 => TypeCode::SmallInt,
            4 => TypeCode::Integer,
            -5 => TypeCode::BigInt,
            6 => TypeCode::Float,
            7 => TypeCode::Real,
            8 => TypeCode::Double,
            2 => TypeCode::Numeric,
            3 => TypeCode::Decimal,
            1 => TypeCode::Char,
            12 => TypeCode::VarChar,
            -1 => TypeCode::LongVarChar,
            -15 => TypeCode::NChar,
            -9 => TypeCode::NVarChar,
            91 => TypeCode::Date,
            92 => TypeCode::Time,
            93 => TypeCode::Timestamp,
            -2 => TypeCode::Binary,
            -3 => TypeCode::VarBinary,
            -4 => TypeCode::LongVarBinary,
            2004 => TypeCode::Blob,
            2005 => TypeCode::Clob,
            16 => TypeCode::Boolean,
            other => TypeCode::Other(other),
        }
    }

    /// The numeric code of this identifier
    pub fn code(self) -> i32 {
        match self {
            TypeCode::Bit => -7,
            TypeCode::TinyInt => -6,
            TypeCode::SmallInt => 5,
            TypeCode::Integer => 4,
            TypeCode::BigInt => -5,
            TypeCode::Float => 6,
            TypeCode::Real => 7,
            TypeCode::Double => 8,
            TypeCode::Numeric => 2,
            TypeCode::Decimal => 3,
            TypeCode::Char => 1,
            TypeCode::VarChar => 12,
            TypeCode::LongVarChar => -1,
            TypeCode::NChar => -15,
            TypeCode::NVarChar => -9,
            TypeCode::Date => 91,
            TypeCode::Time => 92,
            TypeCode::Timestamp => 93,
            TypeCode::Binary => -2,
            TypeCode::VarBinary => -3,
            TypeCode::LongVarBinary => -4,
            TypeCode::Blob => 2004,
            TypeCode::Clob => 2005,
            TypeCode::Boolean => 16,
            TypeCode::Other(code) => code,
        }
    }

    /// Fixed/decimal numeric kinds. Only these carry a precision.
    pub fn is_decimal_numeric(self) -> bool {
        matches!(self, TypeCode::Numeric | TypeCode::Decimal)
    }
}

/// Local registry mapping declared type names to canonical identifiers.
///
/// Lookup is case-insensitive. Source-reported numeric codes are treated as
/// untrustworthy: whenever a type name resolves here, the registry's
/// identifier wins.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeCode>,
}

impl TypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the standard SQL type names
    pub fn with_standard_types() -> Self {
        let mut registry = Self::new();
        for (name, code) in [
            ("BIT", TypeCode::Bit),
            ("TINYINT", TypeCode::TinyInt),
            ("SMALLINT", TypeCode::SmallInt),
            ("INT", TypeCode::Integer),
            ("INTEGER", TypeCode::Integer),
            ("BIGINT", TypeCode::BigInt),
            ("FLOAT", TypeCode::Float),
            ("REAL", TypeCode::Real),
            ("DOUBLE", TypeCode::Double),
            ("DOUBLE PRECISION", TypeCode::Double),
            ("NUMERIC", TypeCode::Numeric),
            ("DECIMAL", TypeCode::Decimal),
            ("CHAR", TypeCode::Char),
            ("VARCHAR", TypeCode::VarChar),
            ("TEXT", TypeCode::LongVarChar),
            ("NCHAR", TypeCode::NChar),
            ("NVARCHAR", TypeCode::NVarChar),
            ("DATE", TypeCode::Date),
            ("TIME", TypeCode::Time),
            ("TIMESTAMP", TypeCode::Timestamp),
            ("DATETIME", TypeCode::Timestamp),
            ("BINARY", TypeCode::Binary),
            ("VARBINARY", TypeCode::VarBinary),
            ("BLOB", TypeCode::Blob),
            ("CLOB", TypeCode::Clob),
            ("BOOLEAN", TypeCode::Boolean),
        ] {
            registry.register(name, code);
        }
        registry
    }

    /// Register or replace a type name
    pub fn register(&mut self, name: impl AsRef<str>, code: TypeCode) {
        self.types
            .insert(name.as_ref().to_uppercase(), code);
    }

    /// Resolve a declared type name to its canonical identifier
    pub fn resolve(&self, name: &str) -> Option<TypeCode> {
        self.types.get(&name.to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

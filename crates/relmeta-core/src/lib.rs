//! relmeta core - shared model and traits for the schema metadata cache
//!
//! This crate provides the fundamental types that the other relmeta crates
//! depend on. It defines:
//!
//! - `MetadataSession` / `MetadataSource` - traits over the introspection source
//! - `FetchStrategy` - per-source-variant query building and row conversion
//! - `Container`, `Table`, `Column` - the domain entities
//! - `TypeRegistry` / `TypeCode` - canonical type resolution
//! - `Value`, `Row`, `QueryResult` - raw introspection data

mod error;
mod model;
mod registry;
mod session;
mod strategy;
mod types;

pub use error::*;
pub use model::*;
pub use registry::*;
pub use session::*;
pub use strategy::*;
pub use types::*;

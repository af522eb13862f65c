//! Generic fetch strategy for driver-style metadata sources
//!
//! One `FetchStrategy` implementation covering the broad family of sources
//! that expose catalog/schema/table/column metadata in the generic driver
//! shape. Source-specific quirks (bogus object kinds in table listings,
//! identity type modifiers, wildcard conventions) are configuration, not
//! code: each source variant gets its own `QuirkProfile`.

mod filter;
mod normalize;
mod strategy;

pub use filter::RejectReason;
pub use normalize::{NormalizedType, normalize_type_name};
pub use strategy::{GenericStrategy, QuirkProfile};

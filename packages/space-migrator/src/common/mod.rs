// Common types and utilities shared across the migrator

pub mod ids;
pub mod pagination;
pub mod types;

pub use ids::{ContentId, Destination, DestinationPageId, Source, SourcePageId};
pub use pagination::{collect_all, Collected, Listing};
pub use types::*;

//! Migration engine - spaces, page trees and page satellites.
//!
//! # Components
//!
//! - `spaces` - source/destination space discovery and idempotent space creation
//! - `id_map` - run-scoped source id to destination id mapping
//! - `pages` - ordering, parent resolution and per-page pipeline
//! - `labels` / `attachments` / `comments` - satellite copies for a created page
//! - `orchestrator` - drives a whole run and produces the report
//!
//! Everything here talks to the platforms through the kernel traits only.

pub mod attachments;
pub mod comments;
pub mod error;
pub mod id_map;
pub mod labels;
pub mod orchestrator;
pub mod pages;
pub mod report;
pub mod spaces;

pub use attachments::AttachmentReplicator;
pub use comments::CommentReplicator;
pub use error::MigrationError;
pub use id_map::{IdentifierMap, MappedPage, Slot};
pub use labels::LabelReplicator;
pub use orchestrator::{MigrationOptions, MigrationOrchestrator};
pub use pages::{order_pages, resolve_parent, PageOrdering, PageState, PageTreeMigrator, ParentResolution};
pub use report::{MigrationReport, PageRecord, ReportSummary, SatelliteSummary, SpaceOutcome, SpaceReport};
pub use spaces::{DestinationSpaceIndex, SourceSpaceIndex, SpaceReplicator};

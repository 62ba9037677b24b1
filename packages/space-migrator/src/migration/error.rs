use thiserror::Error;

use crate::common::{DestinationPageId, SourcePageId};

/// Engine invariant violations. These abort the run; everything else is
/// logged, recorded in the report, and skipped.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("source page {source_id} is already mapped to {existing}, refusing to remap it to {attempted}")]
    DuplicateMapping {
        source_id: SourcePageId,
        existing: DestinationPageId,
        attempted: DestinationPageId,
    },
}

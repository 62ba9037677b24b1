//! Top-level driver: spaces first, then each space's page tree.

use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::id_map::IdentifierMap;
use super::pages::{PageOrdering, PageTreeMigrator};
use super::report::{MigrationReport, SpaceOutcome, SpaceReport};
use super::spaces::{DestinationSpaceIndex, SourceSpaceIndex, SpaceReplicator};
use crate::common::Space;
use crate::kernel::{BaseDestinationPlatform, BaseSourcePlatform};

/// Run settings that shape what gets migrated.
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    pub page_ordering: PageOrdering,
    /// Only migrate these space keys. Empty means every eligible space.
    pub space_keys: Vec<String>,
    pub attachment_dump_dir: Option<PathBuf>,
    /// Recorded in the report. The destination passed in decides whether writes happen.
    pub dry_run: bool,
}

pub struct MigrationOrchestrator {
    options: MigrationOptions,
    source: Arc<dyn BaseSourcePlatform>,
    destination: Arc<dyn BaseDestinationPlatform>,
}

impl MigrationOrchestrator {
    pub fn new(
        options: MigrationOptions,
        source: Arc<dyn BaseSourcePlatform>,
        destination: Arc<dyn BaseDestinationPlatform>,
    ) -> Self {
        Self {
            options,
            source,
            destination,
        }
    }

    /// Migrate everything once.
    ///
    /// Remote failures are logged and recorded in the report; the run carries
    /// on. `Err` means an engine invariant was broken and the run stopped.
    pub async fn run(&self) -> Result<MigrationReport> {
        let source = self.source.as_ref();
        let destination = self.destination.as_ref();
        let mut report = MigrationReport::start(self.options.dry_run, self.options.page_ordering);

        info!(
            dry_run = self.options.dry_run,
            ordering = ?self.options.page_ordering,
            spaces = ?self.options.space_keys,
            "Starting migration"
        );

        let discovered = SourceSpaceIndex::new(source).discover().await;
        report.personal_spaces_skipped = discovered.personal_skipped;
        report.source_listing_error = discovered.error;
        let (spaces, missing) = select_spaces(discovered.spaces, &self.options.space_keys);
        for key in &missing {
            warn!(space_key = %key, "Requested space was not found at the source");
        }
        report.missing_spaces = missing;

        let existing = DestinationSpaceIndex::new(destination).existing_keys().await;
        report.destination_listing_error = existing.error;
        let mut existing_keys = existing.keys;

        let replicator = SpaceReplicator::new(source, destination);
        let pages = PageTreeMigrator::new(source, destination, self.options.page_ordering)
            .with_attachment_dump_dir(self.options.attachment_dump_dir.clone());
        let mut ids = IdentifierMap::new();

        for space in &spaces {
            let outcome = replicator.replicate(space, &mut existing_keys).await;
            let mut space_report = SpaceReport::new(&space.key, &space.name, outcome);

            if matches!(space_report.outcome, SpaceOutcome::DetailUnavailable { .. }) {
                report.spaces.push(space_report);
                continue;
            }

            let migrated = pages.migrate_space(&space.key, &mut ids).await?;
            space_report.page_listing_error = migrated.listing_error;
            space_report.pages = migrated.records;
            info!(
                space_key = %space.key,
                pages = space_report.pages.len(),
                clean = space_report.is_clean(),
                "Space finished"
            );
            report.spaces.push(space_report);
        }

        let report = report.finish();
        let summary = report.summary();
        info!(
            spaces_created = summary.spaces_created,
            pages_created = summary.pages_created,
            pages_failed = summary.pages_failed,
            pages_orphaned = summary.pages_orphaned,
            attachment_failures = summary.attachment_failures,
            comment_failures = summary.comment_failures,
            mapped_pages = ids.len(),
            "Migration finished"
        );
        Ok(report)
    }
}

/// Keep the spaces whose keys were asked for, in listing order, and name the
/// keys that were asked for but not listed.
fn select_spaces(spaces: Vec<Space>, wanted: &[String]) -> (Vec<Space>, Vec<String>) {
    if wanted.is_empty() {
        return (spaces, Vec::new());
    }
    let wanted_set: HashSet<&str> = wanted.iter().map(String::as_str).collect();
    let selected: Vec<_> = spaces
        .into_iter()
        .filter(|s| wanted_set.contains(s.key.as_str()))
        .collect();
    let found: HashSet<&str> = selected.iter().map(|s| s.key.as_str()).collect();
    let missing = wanted
        .iter()
        .filter(|k| !found.contains(k.as_str()))
        .cloned()
        .collect();
    (selected, missing)
}

//! Page tree migration for one space.
//!
//! Pages are listed with bodies and ancestor chains, put in an order where
//! parents come before children, and created one at a time. Each created page
//! is mapped in the [`IdentifierMap`] before its labels, attachments and
//! comments are copied, so children and satellites can always find it.
//!
//! Per-page states advance in one direction only:
//!
//! ```text
//! Discovered -> Created -> LabelsApplied -> AttachmentsApplied -> CommentsApplied -> Done
//! ```
//!
//! A page that fails to be created stays `Discovered`. A satellite step that
//! fails as a whole leaves the page at the last state it reached; nothing is
//! rolled back.

use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use super::attachments::AttachmentReplicator;
use super::comments::CommentReplicator;
use super::error::MigrationError;
use super::id_map::{IdentifierMap, MappedPage};
use super::labels::LabelReplicator;
use super::report::PageRecord;
use crate::common::{collect_all, DestinationPageId, SourcePage, SourcePageId};
use crate::kernel::{BaseDestinationPlatform, BaseSourcePlatform};

/// Order in which a space's pages are created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrdering {
    /// Shallowest first; siblings keep listing order.
    #[default]
    AncestorDepth,
    /// Exactly as listed. A child listed before its parent becomes an orphan.
    Listing,
}

impl FromStr for PageOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "depth" | "ancestor-depth" | "ancestor_depth" => Ok(Self::AncestorDepth),
            "listing" => Ok(Self::Listing),
            other => Err(format!(
                "unknown page ordering '{}', expected 'depth' or 'listing'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    Discovered,
    Created,
    LabelsApplied,
    AttachmentsApplied,
    CommentsApplied,
    Done,
}

/// Where a page goes in the destination tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentResolution {
    Root,
    Child { destination: DestinationPageId },
    /// The parent was never created; the page is created at the root.
    Orphaned { missing: SourcePageId },
}

impl ParentResolution {
    pub fn destination(&self) -> Option<&DestinationPageId> {
        match self {
            Self::Child { destination } => Some(destination),
            Self::Root | Self::Orphaned { .. } => None,
        }
    }
}

/// Put pages in creation order.
pub fn order_pages(mut pages: Vec<SourcePage>, ordering: PageOrdering) -> Vec<SourcePage> {
    if ordering == PageOrdering::AncestorDepth {
        // sort_by_key is stable
        pages.sort_by_key(SourcePage::depth);
    }
    pages
}

pub fn resolve_parent(page: &SourcePage, ids: &IdentifierMap) -> ParentResolution {
    match page.parent() {
        None => ParentResolution::Root,
        Some(parent) => match ids.get(parent) {
            Some(destination) => ParentResolution::Child {
                destination: destination.clone(),
            },
            None => ParentResolution::Orphaned {
                missing: parent.clone(),
            },
        },
    }
}

/// Pages processed for one space.
#[derive(Debug, Default)]
pub struct SpacePages {
    pub records: Vec<PageRecord>,
    pub listing_error: Option<String>,
}

pub struct PageTreeMigrator<'a> {
    source: &'a dyn BaseSourcePlatform,
    destination: &'a dyn BaseDestinationPlatform,
    ordering: PageOrdering,
    labels: LabelReplicator<'a>,
    attachments: AttachmentReplicator<'a>,
    comments: CommentReplicator<'a>,
}

impl<'a> PageTreeMigrator<'a> {
    pub fn new(
        source: &'a dyn BaseSourcePlatform,
        destination: &'a dyn BaseDestinationPlatform,
        ordering: PageOrdering,
    ) -> Self {
        Self {
            source,
            destination,
            ordering,
            labels: LabelReplicator::new(source, destination),
            attachments: AttachmentReplicator::new(source, destination),
            comments: CommentReplicator::new(source, destination),
        }
    }

    pub fn with_attachment_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.attachments = self.attachments.with_dump_dir(dir);
        self
    }

    /// Copy every page of `space_key`.
    ///
    /// Only an identifier map invariant violation is returned as an error.
    pub async fn migrate_space(
        &self,
        space_key: &str,
        ids: &mut IdentifierMap,
    ) -> Result<SpacePages, MigrationError> {
        let collected = collect_all("pages", |cursor| async move {
            self.source.list_pages(space_key, cursor.as_deref()).await
        })
        .await;
        let listing_error = collected.error_message();
        if let Some(e) = &listing_error {
            warn!(space_key, error = %e, "Page listing incomplete, migrating what was listed");
        }

        let pages = order_pages(collected.items, self.ordering);
        info!(space_key, pages = pages.len(), ordering = ?self.ordering, "Migrating pages");

        let mut records = Vec::with_capacity(pages.len());
        for page in &pages {
            records.push(self.migrate_page(space_key, page, ids).await?);
        }

        Ok(SpacePages {
            records,
            listing_error,
        })
    }

    async fn migrate_page(
        &self,
        space_key: &str,
        page: &SourcePage,
        ids: &mut IdentifierMap,
    ) -> Result<PageRecord, MigrationError> {
        let mut record = PageRecord::discovered(page.id.clone(), page.title.as_str());

        let Some(source_id) = page.id.clone() else {
            warn!(space_key, title = %page.title, "Page has no id, skipping");
            record.skipped = Some("missing id".to_string());
            return Ok(record);
        };
        let Some(body) = page.body.as_deref() else {
            warn!(space_key, source_id = %source_id, title = %page.title, "Page has no storage body, skipping");
            record.skipped = Some("missing body".to_string());
            return Ok(record);
        };
        if ids.contains(&source_id) {
            warn!(space_key, source_id = %source_id, "Page listed twice, skipping repeat");
            record.skipped = Some("listed more than once".to_string());
            return Ok(record);
        }

        let parent = resolve_parent(page, ids);
        if let ParentResolution::Orphaned { missing } = &parent {
            warn!(
                space_key,
                source_id = %source_id,
                missing_parent = %missing,
                "Parent was not migrated, creating page at the root"
            );
        }
        record.parent = Some(parent.clone());

        let created = self
            .destination
            .create_page(space_key, &page.title, body, parent.destination())
            .await;
        let destination_id = match created {
            Ok(id) => id,
            Err(e) => {
                error!(
                    space_key,
                    source_id = %source_id,
                    title = %page.title,
                    error = %format!("{:#}", e),
                    "Failed to create page"
                );
                record.error = Some(format!("{:#}", e));
                return Ok(record);
            }
        };

        let mapped = ids.insert(source_id, destination_id)?;
        info!(
            space_key,
            source_id = %mapped.source,
            destination_id = %mapped.destination,
            title = %page.title,
            "Page created"
        );
        record.destination_id = Some(mapped.destination.clone());
        record.slot = Some(mapped.slot);
        record.state = PageState::Created;

        self.copy_satellites(&mapped, &mut record).await;
        Ok(record)
    }

    async fn copy_satellites(&self, page: &MappedPage, record: &mut PageRecord) {
        record.labels = self.labels.replicate(page).await;
        if let Some(e) = &record.labels.step_error {
            warn!(source_id = %page.source, error = %e, "Label step failed, stopping page pipeline");
            return;
        }
        record.state = PageState::LabelsApplied;

        record.attachments = self.attachments.replicate(page).await;
        if let Some(e) = &record.attachments.step_error {
            warn!(source_id = %page.source, error = %e, "Attachment step failed, stopping page pipeline");
            return;
        }
        record.state = PageState::AttachmentsApplied;

        record.comments = self.comments.replicate(page).await;
        if let Some(e) = &record.comments.step_error {
            warn!(source_id = %page.source, error = %e, "Comment step failed, stopping page pipeline");
            return;
        }
        record.state = PageState::CommentsApplied;

        debug!(source_id = %page.source, "Page done");
        record.state = PageState::Done;
    }
}

//! What a run did, space by space and page by page.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id_map::Slot;
use super::pages::{PageOrdering, PageState, ParentResolution};
use crate::common::{DestinationPageId, SourcePageId};

/// Result of making sure a source space exists at the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpaceOutcome {
    Created,
    AlreadyPresent,
    /// Creation was attempted and rejected. Pages are still attempted.
    Failed { reason: String },
    /// The source space detail could not be read; the space was skipped.
    DetailUnavailable { reason: String },
}

impl SpaceOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::DetailUnavailable { .. })
    }
}

/// Per-page tally for one kind of satellite (labels, attachments or comments).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SatelliteSummary {
    pub listed: usize,
    pub migrated: usize,
    /// Items that could not be sent at all, such as comments without a body.
    pub skipped: usize,
    /// One entry per item that failed in isolation.
    pub failures: Vec<String>,
    /// Set when the step as a whole failed, which stops the page's pipeline.
    pub step_error: Option<String>,
}

impl SatelliteSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.step_error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub source_id: Option<SourcePageId>,
    pub title: String,
    pub destination_id: Option<DestinationPageId>,
    /// Position of the page in the run's identifier map, in creation order.
    pub slot: Option<Slot>,
    pub parent: Option<ParentResolution>,
    /// Last state reached.
    pub state: PageState,
    pub skipped: Option<String>,
    pub error: Option<String>,
    pub labels: SatelliteSummary,
    pub attachments: SatelliteSummary,
    pub comments: SatelliteSummary,
}

impl PageRecord {
    pub fn discovered(source_id: Option<SourcePageId>, title: impl Into<String>) -> Self {
        Self {
            source_id,
            title: title.into(),
            destination_id: None,
            slot: None,
            parent: None,
            state: PageState::Discovered,
            skipped: None,
            error: None,
            labels: SatelliteSummary::default(),
            attachments: SatelliteSummary::default(),
            comments: SatelliteSummary::default(),
        }
    }

    pub fn is_created(&self) -> bool {
        self.destination_id.is_some()
    }

    pub fn is_orphaned(&self) -> bool {
        matches!(self.parent, Some(ParentResolution::Orphaned { .. }))
    }

    /// Created but stopped before [`PageState::Done`].
    pub fn is_truncated(&self) -> bool {
        self.is_created() && self.state != PageState::Done
    }

    pub fn is_clean(&self) -> bool {
        self.error.is_none()
            && !self.is_orphaned()
            && (self.skipped.is_some() || self.state == PageState::Done)
            && self.labels.is_clean()
            && self.attachments.is_clean()
            && self.comments.is_clean()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceReport {
    pub key: String,
    pub name: String,
    pub outcome: SpaceOutcome,
    /// Set when listing the space's pages stopped early.
    pub page_listing_error: Option<String>,
    pub pages: Vec<PageRecord>,
}

impl SpaceReport {
    pub fn new(key: impl Into<String>, name: impl Into<String>, outcome: SpaceOutcome) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            outcome,
            page_listing_error: None,
            pages: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.outcome.is_failure()
            && self.page_listing_error.is_none()
            && self.pages.iter().all(PageRecord::is_clean)
    }
}

/// Totals across a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub spaces_created: usize,
    pub spaces_already_present: usize,
    pub spaces_failed: usize,
    pub pages_created: usize,
    pub pages_truncated: usize,
    pub pages_orphaned: usize,
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub labels_applied: usize,
    pub attachments_migrated: usize,
    pub attachment_failures: usize,
    pub comments_migrated: usize,
    pub comment_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub page_ordering: PageOrdering,
    /// Personal spaces dropped during discovery.
    pub personal_spaces_skipped: usize,
    /// Requested space keys that the source did not list.
    pub missing_spaces: Vec<String>,
    pub source_listing_error: Option<String>,
    pub destination_listing_error: Option<String>,
    pub spaces: Vec<SpaceReport>,
}

impl MigrationReport {
    pub fn start(dry_run: bool, page_ordering: PageOrdering) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            page_ordering,
            personal_spaces_skipped: 0,
            missing_spaces: Vec::new(),
            source_listing_error: None,
            destination_listing_error: None,
            spaces: Vec::new(),
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn space(&self, key: &str) -> Option<&SpaceReport> {
        self.spaces.iter().find(|s| s.key == key)
    }

    /// Pages across all spaces, in processing order.
    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.spaces.iter().flat_map(|s| s.pages.iter())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();

        for space in &self.spaces {
            match space.outcome {
                SpaceOutcome::Created => summary.spaces_created += 1,
                SpaceOutcome::AlreadyPresent => summary.spaces_already_present += 1,
                SpaceOutcome::Failed { .. } | SpaceOutcome::DetailUnavailable { .. } => {
                    summary.spaces_failed += 1
                }
            }
        }

        for page in self.pages() {
            if page.skipped.is_some() {
                summary.pages_skipped += 1;
                continue;
            }
            if !page.is_created() {
                summary.pages_failed += 1;
                continue;
            }
            summary.pages_created += 1;
            if page.is_truncated() {
                summary.pages_truncated += 1;
            }
            if page.is_orphaned() {
                summary.pages_orphaned += 1;
            }
            summary.labels_applied += page.labels.migrated;
            summary.attachments_migrated += page.attachments.migrated;
            summary.attachment_failures += page.attachments.failures.len();
            summary.comments_migrated += page.comments.migrated;
            summary.comment_failures += page.comments.failures.len();
        }

        summary
    }

    /// No failures, no truncated listings and no orphaned pages anywhere.
    pub fn is_clean(&self) -> bool {
        self.source_listing_error.is_none()
            && self.destination_listing_error.is_none()
            && self.missing_spaces.is_empty()
            && self.spaces.iter().all(SpaceReport::is_clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(title: &str, parent: ParentResolution) -> PageRecord {
        let mut record = PageRecord::discovered(Some(SourcePageId::from(title)), title);
        record.destination_id = Some(DestinationPageId::from(format!("d-{}", title)));
        record.parent = Some(parent);
        record.state = PageState::Done;
        record
    }

    #[test]
    fn summary_counts_pages_and_satellites() {
        let mut report = MigrationReport::start(false, PageOrdering::AncestorDepth);
        let mut space = SpaceReport::new("ENG", "Engineering", SpaceOutcome::Created);

        let mut root = created("Home", ParentResolution::Root);
        root.attachments.migrated = 2;
        root.attachments.failures.push("b.png: HTTP 500".into());
        space.pages.push(root);

        space.pages.push(created(
            "Lost",
            ParentResolution::Orphaned {
                missing: SourcePageId::from("404"),
            },
        ));

        let mut skipped = PageRecord::discovered(None, "No id");
        skipped.skipped = Some("missing id".into());
        space.pages.push(skipped);

        let mut failed = PageRecord::discovered(Some(SourcePageId::from("9")), "Rejected");
        failed.error = Some("HTTP 400".into());
        space.pages.push(failed);

        report.spaces.push(space);
        report
            .spaces
            .push(SpaceReport::new("HR", "People", SpaceOutcome::AlreadyPresent));

        let summary = report.summary();
        assert_eq!(summary.spaces_created, 1);
        assert_eq!(summary.spaces_already_present, 1);
        assert_eq!(summary.pages_created, 2);
        assert_eq!(summary.pages_orphaned, 1);
        assert_eq!(summary.pages_skipped, 1);
        assert_eq!(summary.pages_failed, 1);
        assert_eq!(summary.attachments_migrated, 2);
        assert_eq!(summary.attachment_failures, 1);
        assert!(!report.is_clean());
        assert!(report.space("HR").unwrap().is_clean());
    }

    #[test]
    fn serializes_outcomes_with_status_tag() {
        let json = serde_json::to_value(SpaceOutcome::Failed {
            reason: "HTTP 403".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "HTTP 403");
    }
}

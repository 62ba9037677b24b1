use tracing::{debug, warn};

use super::id_map::MappedPage;
use super::report::SatelliteSummary;
use crate::common::collect_all;
use crate::kernel::{BaseDestinationPlatform, BaseSourcePlatform};

/// Recreates a page's comments as top-level comments on its copy.
///
/// Reply threading is not carried over.
pub struct CommentReplicator<'a> {
    source: &'a dyn BaseSourcePlatform,
    destination: &'a dyn BaseDestinationPlatform,
}

impl<'a> CommentReplicator<'a> {
    pub fn new(
        source: &'a dyn BaseSourcePlatform,
        destination: &'a dyn BaseDestinationPlatform,
    ) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub async fn replicate(&self, page: &MappedPage) -> SatelliteSummary {
        let collected = collect_all("comments", |cursor| async move {
            self.source.list_comments(&page.source, cursor.as_deref()).await
        })
        .await;

        let mut summary = SatelliteSummary {
            listed: collected.items.len(),
            step_error: collected.error_message(),
            ..Default::default()
        };

        for comment in &collected.items {
            let Some(body) = comment.body.as_deref() else {
                debug!(source_id = %page.source, comment_id = ?comment.id, "Comment has no body, skipping");
                summary.skipped += 1;
                continue;
            };

            match self.destination.create_comment(&page.destination, body).await {
                Ok(()) => summary.migrated += 1,
                Err(e) => {
                    warn!(
                        destination_id = %page.destination,
                        comment_id = ?comment.id,
                        error = %format!("{:#}", e),
                        "Failed to copy comment"
                    );
                    let id = comment.id.as_deref().unwrap_or("<no id>");
                    summary.failures.push(format!("comment {}: {:#}", id, e));
                }
            }
        }

        debug!(destination_id = %page.destination, migrated = summary.migrated, "Comments copied");
        summary
    }
}

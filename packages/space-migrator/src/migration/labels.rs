use tracing::{debug, warn};

use super::id_map::MappedPage;
use super::report::SatelliteSummary;
use crate::common::collect_all;
use crate::kernel::{BaseDestinationPlatform, BaseSourcePlatform};

/// Copies a page's label names onto its copy in one batch call.
pub struct LabelReplicator<'a> {
    source: &'a dyn BaseSourcePlatform,
    destination: &'a dyn BaseDestinationPlatform,
}

impl<'a> LabelReplicator<'a> {
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
        let collected = collect_all("labels", |cursor| async move {
            self.source.list_labels(&page.source, cursor.as_deref()).await
        })
        .await;

        let mut summary = SatelliteSummary {
            listed: collected.items.len(),
            step_error: collected.error_message(),
            ..Default::default()
        };

        if collected.items.is_empty() {
            debug!(source_id = %page.source, "No labels to copy");
            return summary;
        }

        match self
            .destination
            .add_labels(&page.destination, &collected.items)
            .await
        {
            Ok(()) => {
                summary.migrated = collected.items.len();
                debug!(destination_id = %page.destination, count = summary.migrated, "Labels applied");
            }
            Err(e) => {
                warn!(destination_id = %page.destination, error = %format!("{:#}", e), "Failed to apply labels");
                summary.step_error = Some(format!("{:#}", e));
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DestinationPageId, SourcePageId};
    use crate::migration::IdentifierMap;
    use crate::kernel::{MockDestinationPlatform, MockSourcePlatform};

    fn mapped() -> MappedPage {
        IdentifierMap::new()
            .insert(SourcePageId::from("1001"), DestinationPageId::from("dest-1"))
            .unwrap()
    }

    #[tokio::test]
    async fn pushes_all_labels_in_one_call() {
        let source = MockSourcePlatform::new()
            .with_page_size(2)
            .with_labels("1001", &["runbook", "ops", "oncall"]);
        let destination = MockDestinationPlatform::new();

        let summary = LabelReplicator::new(&source, &destination)
            .replicate(&mapped())
            .await;

        assert_eq!(summary.migrated, 3);
        let calls = destination.label_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_str(), "dest-1");
        assert_eq!(calls[0].1, vec!["runbook", "ops", "oncall"]);
    }

    #[tokio::test]
    async fn no_labels_means_no_call() {
        let source = MockSourcePlatform::new();
        let destination = MockDestinationPlatform::new();

        let summary = LabelReplicator::new(&source, &destination)
            .replicate(&mapped())
            .await;

        assert!(summary.is_clean());
        assert!(destination.label_calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_batch_is_a_step_error() {
        let source = MockSourcePlatform::new().with_labels("1001", &["x"]);
        let destination = MockDestinationPlatform::new().failing_labels();

        let summary = LabelReplicator::new(&source, &destination)
            .replicate(&mapped())
            .await;

        assert_eq!(summary.migrated, 0);
        assert!(summary.step_error.is_some());
    }
}

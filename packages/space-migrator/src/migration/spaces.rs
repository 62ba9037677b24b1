//! Space discovery on both instances and idempotent space creation.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use super::report::SpaceOutcome;
use crate::common::{collect_all, Space};
use crate::kernel::{BaseDestinationPlatform, BaseSourcePlatform};

/// Source spaces eligible for migration.
#[derive(Debug, Default)]
pub struct SourceSpaces {
    pub spaces: Vec<Space>,
    pub personal_skipped: usize,
    /// Why discovery stopped early, if it did.
    pub error: Option<String>,
}

pub struct SourceSpaceIndex<'a> {
    source: &'a dyn BaseSourcePlatform,
}

impl<'a> SourceSpaceIndex<'a> {
    pub fn new(source: &'a dyn BaseSourcePlatform) -> Self {
        Self { source }
    }

    /// All non-personal source spaces, in listing order.
    pub async fn discover(&self) -> SourceSpaces {
        let collected = collect_all("source spaces", |cursor| async move {
            self.source.list_spaces(cursor.as_deref()).await
        })
        .await;
        let error = collected.error_message();

        let total = collected.items.len();
        let spaces: Vec<Space> = collected
            .items
            .into_iter()
            .filter(|s| {
                if s.is_personal() {
                    debug!(space_key = %s.key, "Skipping personal space");
                }
                !s.is_personal()
            })
            .collect();

        info!(
            discovered = total,
            eligible = spaces.len(),
            complete = error.is_none(),
            "Discovered source spaces"
        );

        SourceSpaces {
            personal_skipped: total - spaces.len(),
            spaces,
            error,
        }
    }
}

/// Keys of the spaces the destination already has.
#[derive(Debug, Default)]
pub struct ExistingSpaces {
    pub keys: HashSet<String>,
    pub error: Option<String>,
}

pub struct DestinationSpaceIndex<'a> {
    destination: &'a dyn BaseDestinationPlatform,
}

impl<'a> DestinationSpaceIndex<'a> {
    pub fn new(destination: &'a dyn BaseDestinationPlatform) -> Self {
        Self { destination }
    }

    pub async fn existing_keys(&self) -> ExistingSpaces {
        let collected = collect_all("destination spaces", |cursor| async move {
            self.destination.list_spaces(cursor.as_deref()).await
        })
        .await;
        let error = collected.error_message();
        let keys: HashSet<String> = collected.items.into_iter().map(|s| s.key).collect();

        info!(existing = keys.len(), complete = error.is_none(), "Indexed destination spaces");
        ExistingSpaces { keys, error }
    }
}

pub struct SpaceReplicator<'a> {
    source: &'a dyn BaseSourcePlatform,
    destination: &'a dyn BaseDestinationPlatform,
}

impl<'a> SpaceReplicator<'a> {
    pub fn new(
        source: &'a dyn BaseSourcePlatform,
        destination: &'a dyn BaseDestinationPlatform,
    ) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Full source record for a listed space. Blank fields fall back to the listing.
    pub async fn fetch_detail(&self, listed: &Space) -> Result<Space> {
        let mut detail = self.source.get_space(&listed.key).await?;
        if detail.name.is_empty() {
            detail.name = listed.name.clone();
        }
        if detail.description.is_empty() {
            detail.description = listed.description.clone();
        }
        Ok(detail)
    }

    /// Create `space` unless `existing` already has its key.
    ///
    /// A created key is added to `existing`, so a second call for the same
    /// space makes no remote call.
    pub async fn ensure(&self, space: &Space, existing: &mut HashSet<String>) -> SpaceOutcome {
        if existing.contains(&space.key) {
            info!(space_key = %space.key, "Space already exists at destination");
            return SpaceOutcome::AlreadyPresent;
        }

        match self.destination.create_space(space).await {
            Ok(()) => {
                existing.insert(space.key.clone());
                info!(space_key = %space.key, name = %space.name, "Space created");
                SpaceOutcome::Created
            }
            Err(e) => {
                error!(space_key = %space.key, error = %format!("{:#}", e), "Failed to create space");
                SpaceOutcome::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    /// Detail fetch followed by [`ensure`](Self::ensure).
    ///
    /// Existing spaces are not re-read. A space whose detail cannot be read is
    /// reported as [`SpaceOutcome::DetailUnavailable`] and not created.
    pub async fn replicate(&self, listed: &Space, existing: &mut HashSet<String>) -> SpaceOutcome {
        if existing.contains(&listed.key) {
            return self.ensure(listed, existing).await;
        }

        match self.fetch_detail(listed).await {
            Ok(detail) => self.ensure(&detail, existing).await,
            Err(e) => {
                warn!(space_key = %listed.key, error = %format!("{:#}", e), "Could not read space detail, skipping space");
                SpaceOutcome::DetailUnavailable {
                    reason: format!("{:#}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{MockDestinationPlatform, MockSourcePlatform, SourceCall};

    #[tokio::test]
    async fn discovery_drops_personal_spaces_across_pages() {
        let source = MockSourcePlatform::new()
            .with_page_size(2)
            .with_space(Space::new("ENG", "Engineering"))
            .with_space(Space::new("~jdoe", "Jane Doe").personal())
            .with_space(Space::new("HR", "People"))
            .with_space(Space::new("OPS", "Operations"))
            .with_space(Space::new("~asmith", "Alex Smith").personal());

        let found = SourceSpaceIndex::new(&source).discover().await;

        let keys: Vec<&str> = found.spaces.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["ENG", "HR", "OPS"]);
        assert_eq!(found.personal_skipped, 2);
        assert!(found.error.is_none());
        assert_eq!(
            source.count_calls(|c| matches!(c, SourceCall::ListSpaces { .. })),
            3
        );
    }

    #[tokio::test]
    async fn discovery_keeps_partial_result_on_failure() {
        let source = MockSourcePlatform::new()
            .with_page_size(1)
            .with_space(Space::new("A", "A"))
            .with_space(Space::new("B", "B"))
            .with_space(Space::new("C", "C"))
            .failing_space_listing_at(1);

        let found = SourceSpaceIndex::new(&source).discover().await;
        assert_eq!(found.spaces.len(), 1);
        assert!(found.error.unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn ensure_twice_creates_once() {
        let source = MockSourcePlatform::new();
        let destination = MockDestinationPlatform::new().with_existing_space("HR");
        let replicator = SpaceReplicator::new(&source, &destination);

        let mut keys = DestinationSpaceIndex::new(&destination).existing_keys().await.keys;
        let eng = Space::new("ENG", "Engineering");

        assert_eq!(replicator.ensure(&eng, &mut keys).await, SpaceOutcome::Created);
        assert_eq!(replicator.ensure(&eng, &mut keys).await, SpaceOutcome::AlreadyPresent);
        assert_eq!(
            replicator.ensure(&Space::new("HR", "People"), &mut keys).await,
            SpaceOutcome::AlreadyPresent
        );
        assert_eq!(destination.created_spaces().len(), 1);
    }

    #[tokio::test]
    async fn failed_creation_leaves_key_absent() {
        let source = MockSourcePlatform::new();
        let destination = MockDestinationPlatform::new().failing_space_creation("ENG");
        let replicator = SpaceReplicator::new(&source, &destination);
        let mut keys = HashSet::new();

        let outcome = replicator.ensure(&Space::new("ENG", "Engineering"), &mut keys).await;
        assert!(matches!(outcome, SpaceOutcome::Failed { .. }));
        assert!(!keys.contains("ENG"));
    }

    #[tokio::test]
    async fn replicate_uses_detail_and_skips_when_unreadable() {
        let source = MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering").with_description("Build things"))
            .with_space(Space::new("SEC", "Security"))
            .failing_space_detail("SEC");
        let destination = MockDestinationPlatform::new();
        let replicator = SpaceReplicator::new(&source, &destination);
        let mut keys = HashSet::new();

        let listed = Space::new("ENG", "Engineering");
        assert_eq!(replicator.replicate(&listed, &mut keys).await, SpaceOutcome::Created);
        assert_eq!(destination.created_spaces()[0].description, "Build things");

        let outcome = replicator
            .replicate(&Space::new("SEC", "Security"), &mut keys)
            .await;
        assert!(matches!(outcome, SpaceOutcome::DetailUnavailable { .. }));
        assert_eq!(destination.created_spaces().len(), 1);
    }
}

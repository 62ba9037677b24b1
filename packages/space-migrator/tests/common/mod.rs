//! Shared test harness: an orchestrator wired to in-memory platforms.

#![allow(dead_code)]

use migrator_core::common::SourcePage;
use migrator_core::kernel::{MockDestinationPlatform, MockSourcePlatform};
use migrator_core::migration::{MigrationOptions, MigrationOrchestrator, MigrationReport, PageOrdering};
use std::sync::Arc;

pub struct TestHarness {
    pub source: MockSourcePlatform,
    pub destination: MockDestinationPlatform,
}

impl TestHarness {
    pub fn new(source: MockSourcePlatform, destination: MockDestinationPlatform) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// The mocks are shared, so every run sees what earlier runs wrote.
    pub fn orchestrator(&self, options: MigrationOptions) -> MigrationOrchestrator {
        MigrationOrchestrator::new(
            options,
            Arc::new(self.source.clone()),
            Arc::new(self.destination.clone()),
        )
    }

    pub async fn run(&self) -> MigrationReport {
        self.run_with(MigrationOptions::default()).await
    }

    pub async fn run_ordered(&self, ordering: PageOrdering) -> MigrationReport {
        self.run_with(MigrationOptions {
            page_ordering: ordering,
            ..Default::default()
        })
        .await
    }

    pub async fn run_with(&self, options: MigrationOptions) -> MigrationReport {
        self.orchestrator(options)
            .run()
            .await
            .expect("migration run should not hit an invariant violation")
    }
}

pub fn page(id: &str, title: &str, ancestors: &[&str]) -> SourcePage {
    SourcePage::new(id, title, format!("<p>{}</p>", title)).with_ancestors(ancestors.iter().copied())
}

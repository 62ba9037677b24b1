//! End-to-end runs of the orchestrator against in-memory platforms.

mod common;

use crate::common::{page, TestHarness};
use migrator_core::common::{AttachmentRef, SourceComment, SourcePage, Space};
use migrator_core::kernel::{
    DryRunDestination, MockDestinationPlatform, MockSourcePlatform, SourceCall,
};
use migrator_core::migration::{
    MigrationOptions, MigrationOrchestrator, PageOrdering, PageState, ParentResolution,
    SpaceOutcome,
};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Spaces
// ============================================================================

#[tokio::test]
async fn creates_only_missing_spaces_and_stays_idempotent() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_space(Space::new("HR", "People")),
        MockDestinationPlatform::new().with_existing_space("HR"),
    );

    let report = harness.run().await;

    let created = harness.destination.created_spaces();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].key, "ENG");
    assert_eq!(report.space("ENG").unwrap().outcome, SpaceOutcome::Created);
    assert_eq!(report.space("HR").unwrap().outcome, SpaceOutcome::AlreadyPresent);

    // Pages are attempted for both spaces.
    let listed: Vec<String> = harness
        .source
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            SourceCall::ListPages { space_key, .. } => Some(space_key),
            _ => None,
        })
        .collect();
    assert_eq!(listed, vec!["ENG", "HR"]);

    // A second run sees both keys and creates nothing new.
    let again = harness.run().await;
    assert_eq!(harness.destination.created_spaces().len(), 1);
    assert!(again
        .spaces
        .iter()
        .all(|s| s.outcome == SpaceOutcome::AlreadyPresent));
}

#[tokio::test]
async fn personal_spaces_are_never_migrated() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("~jdoe", "Jane Doe").personal())
            .with_space(Space::new("OPS", "Operations")),
        MockDestinationPlatform::new(),
    );

    let report = harness.run().await;

    assert_eq!(report.personal_spaces_skipped, 1);
    assert_eq!(report.spaces.len(), 1);
    assert_eq!(harness.destination.created_spaces()[0].key, "OPS");
}

#[tokio::test]
async fn unreadable_space_detail_skips_the_space_entirely() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("SEC", "Security"))
            .with_pages("SEC", vec![page("1", "Secrets", &[])])
            .failing_space_detail("SEC"),
        MockDestinationPlatform::new(),
    );

    let report = harness.run().await;

    assert!(matches!(
        report.space("SEC").unwrap().outcome,
        SpaceOutcome::DetailUnavailable { .. }
    ));
    assert_eq!(
        harness
            .source
            .count_calls(|c| matches!(c, SourceCall::ListPages { .. })),
        0
    );
    assert!(harness.destination.created_pages().is_empty());
    assert!(!report.is_clean());
}

#[tokio::test]
async fn failed_space_creation_still_attempts_pages() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", vec![page("1", "Home", &[])]),
        MockDestinationPlatform::new().failing_space_creation("ENG"),
    );

    let report = harness.run().await;
    let space = report.space("ENG").unwrap();

    assert!(matches!(space.outcome, SpaceOutcome::Failed { .. }));
    assert_eq!(space.pages.len(), 1);
    assert!(space.pages[0].error.is_some());
    assert_eq!(report.summary().pages_failed, 1);
}

#[tokio::test]
async fn broken_destination_listing_is_reported_and_run_continues() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", vec![page("1", "Home", &[])]),
        MockDestinationPlatform::new().failing_space_listing(),
    );

    let report = harness.run().await;

    assert_eq!(
        report.destination_listing_error.as_deref(),
        Some("destination: list spaces failed (HTTP 401)")
    );
    assert_eq!(harness.destination.space_list_calls(), 1);
    assert_eq!(report.space("ENG").unwrap().outcome, SpaceOutcome::Created);
    assert_eq!(harness.destination.created_pages().len(), 1);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn space_selection_limits_the_run() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_space(Space::new("HR", "People")),
        MockDestinationPlatform::new(),
    );

    let report = harness
        .run_with(MigrationOptions {
            space_keys: vec!["HR".into(), "NOPE".into()],
            ..Default::default()
        })
        .await;

    let keys: Vec<&str> = report.spaces.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["HR"]);
    assert_eq!(report.missing_spaces, vec!["NOPE"]);
    assert!(!report.is_clean());
}

// ============================================================================
// Page trees
// ============================================================================

#[tokio::test]
async fn child_listed_after_parent_gets_parent_id() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", vec![page("1", "A", &[]), page("2", "B", &["1"])]),
        MockDestinationPlatform::new(),
    );

    let report = harness.run_ordered(PageOrdering::Listing).await;

    let a = harness.destination.page_titled("A").unwrap();
    let b = harness.destination.page_titled("B").unwrap();
    assert_eq!(a.parent, None);
    assert_eq!(b.parent, Some(a.id.clone()));
    assert!(report.is_clean());
}

#[tokio::test]
async fn child_listed_before_parent_depends_on_ordering() {
    let pages = vec![page("2", "B", &["1"]), page("1", "A", &[])];

    // Listing order: B goes first and its parent is not mapped yet.
    let listing = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", pages.clone()),
        MockDestinationPlatform::new(),
    );
    let report = listing.run_ordered(PageOrdering::Listing).await;

    assert_eq!(listing.destination.page_titled("B").unwrap().parent, None);
    let b = report.pages().find(|p| p.title == "B").unwrap();
    assert!(b.is_orphaned());
    assert_eq!(report.summary().pages_orphaned, 1);

    // Depth order: A is created first, B lands under it.
    let depth = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", pages),
        MockDestinationPlatform::new(),
    );
    let report = depth.run_ordered(PageOrdering::AncestorDepth).await;

    let a = depth.destination.page_titled("A").unwrap();
    assert_eq!(depth.destination.page_titled("B").unwrap().parent, Some(a.id));
    assert_eq!(report.summary().pages_orphaned, 0);
}

#[tokio::test]
async fn parents_are_always_created_before_children() {
    // A shuffled four-level tree.
    let pages = vec![
        page("6", "Leaf 2", &["1", "2", "4"]),
        page("3", "Section B", &["1"]),
        page("4", "Sub A1", &["1", "2"]),
        page("1", "Home", &[]),
        page("5", "Leaf 1", &["1", "2", "4"]),
        page("2", "Section A", &["1"]),
        page("7", "Sub B1", &["1", "3"]),
    ];
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("DOCS", "Docs"))
            .with_pages("DOCS", pages.clone()),
        MockDestinationPlatform::new(),
    );

    let report = harness.run().await;
    assert!(report.is_clean());

    let created = harness.destination.created_pages();
    assert_eq!(created.len(), pages.len());

    let position: HashMap<_, _> = created.iter().enumerate().map(|(i, p)| (p.id.clone(), i)).collect();
    let by_title: HashMap<_, _> = created.iter().map(|p| (p.title.clone(), p)).collect();
    for source in &pages {
        let copy = by_title[&source.title];
        match source.parent() {
            None => assert_eq!(copy.parent, None),
            Some(parent_id) => {
                let parent_title = &pages
                    .iter()
                    .find(|p| p.id.as_ref() == Some(parent_id))
                    .unwrap()
                    .title;
                let parent_copy = by_title[parent_title];
                assert_eq!(copy.parent.as_ref(), Some(&parent_copy.id));
                assert!(position[&parent_copy.id] < position[&copy.id]);
            }
        }
    }
}

#[tokio::test]
async fn titles_and_bodies_arrive_byte_for_byte() {
    let body = r#"<p>Ünïcödé &amp; <strong>markup</strong></p><ac:structured-macro ac:name="info"><ac:rich-text-body><p>Keep me</p></ac:rich-text-body></ac:structured-macro>"#;
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", vec![SourcePage::new("1", "Runbook: déploiement / v2", body)]),
        MockDestinationPlatform::new(),
    );

    harness.run().await;

    let created = harness.destination.created_pages();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Runbook: déploiement / v2");
    assert_eq!(created[0].body, body);
    assert_eq!(created[0].space_key, "ENG");
}

// ============================================================================
// Satellites
// ============================================================================

#[tokio::test]
async fn one_failed_attachment_does_not_stop_the_page() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", vec![page("1", "Home", &[])])
            .with_attachment("1", AttachmentRef::new("a1", "one.png"), b"one")
            .with_attachment("1", AttachmentRef::new("a2", "two.png"), b"two")
            .with_attachment("1", AttachmentRef::new("a3", "three.png"), b"three")
            .with_comment("1", SourceComment::new("<p>Looks good</p>"))
            .with_labels("1", &["onboarding", "howto"]),
        MockDestinationPlatform::new().failing_upload("two.png"),
    );

    let report = harness.run().await;

    let uploaded: Vec<String> = harness
        .destination
        .uploads()
        .into_iter()
        .map(|u| u.filename)
        .collect();
    assert_eq!(uploaded, vec!["one.png", "three.png"]);
    assert_eq!(harness.destination.upload_attempts(), 3);
    assert_eq!(harness.destination.created_comments().len(), 1);
    assert_eq!(harness.destination.label_calls()[0].1, vec!["onboarding", "howto"]);

    let home = report.pages().next().unwrap();
    assert_eq!(home.state, PageState::Done);
    assert_eq!(home.attachments.migrated, 2);
    assert_eq!(home.attachments.failures.len(), 1);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn satellites_target_the_new_page_id() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", vec![page("1", "Home", &[]), page("2", "Child", &["1"])])
            .with_attachment("2", AttachmentRef::new("a1", "diagram.png"), b"png")
            .with_comment("2", SourceComment::new("<p>c</p>"))
            .with_labels("2", &["child"]),
        MockDestinationPlatform::new(),
    );

    harness.run().await;

    let child = harness.destination.page_titled("Child").unwrap();
    assert_eq!(harness.destination.uploads()[0].page_id, child.id);
    assert_eq!(harness.destination.created_comments()[0].page_id, child.id);
    assert_eq!(harness.destination.label_calls()[0].0, child.id);
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn follows_every_page_of_every_listing() {
    let pages: Vec<SourcePage> = (1..=5).map(|i| page(&i.to_string(), &format!("P{}", i), &[])).collect();
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_page_size(3)
            .with_space(Space::new("A", "A"))
            .with_space(Space::new("~b", "B").personal())
            .with_space(Space::new("C", "C"))
            .with_space(Space::new("D", "D"))
            .with_space(Space::new("~e", "E").personal())
            .with_space(Space::new("F", "F"))
            .with_space(Space::new("G", "G"))
            .with_pages("A", pages),
        MockDestinationPlatform::new().with_page_size(2).with_existing_space("X"),
    );

    let report = harness.run().await;

    // 7 spaces in pages of 3, 5 of them eligible.
    assert_eq!(
        harness
            .source
            .count_calls(|c| matches!(c, SourceCall::ListSpaces { .. })),
        3
    );
    assert_eq!(report.spaces.len(), 5);
    assert_eq!(report.personal_spaces_skipped, 2);

    // 5 pages in pages of 3.
    assert_eq!(
        harness
            .source
            .count_calls(|c| matches!(c, SourceCall::ListPages { space_key, .. } if space_key == "A")),
        2
    );
    assert_eq!(report.space("A").unwrap().pages.len(), 5);

    // One existing destination space still takes one fetch.
    assert_eq!(harness.destination.space_list_calls(), 1);
}

#[tokio::test]
async fn broken_page_listing_is_reported_on_the_space() {
    let harness = TestHarness::new(
        MockSourcePlatform::new()
            .with_space(Space::new("ENG", "Engineering"))
            .with_pages("ENG", vec![page("1", "Home", &[])])
            .failing_page_listing("ENG"),
        MockDestinationPlatform::new(),
    );

    let report = harness.run().await;
    let space = report.space("ENG").unwrap();

    assert!(space.page_listing_error.is_some());
    assert!(space.pages.is_empty());
    assert!(!report.is_clean());
}

// ============================================================================
// Dry run
// ============================================================================

#[tokio::test]
async fn dry_run_plans_the_full_tree_without_writing() {
    let source = MockSourcePlatform::new()
        .with_space(Space::new("ENG", "Engineering"))
        .with_pages("ENG", vec![page("2", "B", &["1"]), page("1", "A", &[])])
        .with_attachment("2", AttachmentRef::new("a1", "x.png"), b"x")
        .with_labels("2", &["l"]);
    let destination = MockDestinationPlatform::new();

    let orchestrator = MigrationOrchestrator::new(
        MigrationOptions {
            dry_run: true,
            ..Default::default()
        },
        Arc::new(source.clone()),
        Arc::new(DryRunDestination::new(destination.clone())),
    );
    let report = orchestrator.run().await.unwrap();

    assert!(report.dry_run);
    assert!(destination.created_spaces().is_empty());
    assert!(destination.created_pages().is_empty());
    assert!(destination.uploads().is_empty());
    assert!(destination.label_calls().is_empty());

    let a = report.pages().find(|p| p.title == "A").unwrap();
    let b = report.pages().find(|p| p.title == "B").unwrap();
    let a_id = a.destination_id.clone().unwrap();
    assert!(a_id.as_str().starts_with("dry-run-"));
    assert_eq!(b.parent, Some(ParentResolution::Child { destination: a_id }));
    assert_eq!(b.attachments.migrated, 1);
    assert_eq!(report.space("ENG").unwrap().outcome, SpaceOutcome::Created);
}

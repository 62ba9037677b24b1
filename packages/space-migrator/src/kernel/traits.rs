// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no migration logic.
// Ordering, id remapping and failure isolation live in `migration`, which only
// ever talks to these traits.
//
// Naming convention: Base* for trait names (e.g., BaseSourcePlatform)

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::common::{AttachmentRef, DestinationPageId, Listing, SourceComment, SourcePage, SourcePageId, Space};

// =============================================================================
// Source platform (read-only)
// =============================================================================

#[async_trait]
pub trait BaseSourcePlatform: Send + Sync {
    /// One page of the instance's spaces (all types, including personal).
    async fn list_spaces(&self, cursor: Option<&str>) -> Result<Listing<Space>>;

    /// Full space record, including its description.
    async fn get_space(&self, key: &str) -> Result<Space>;

    /// One page of a space's pages, bodies and ancestor chains included.
    async fn list_pages(&self, space_key: &str, cursor: Option<&str>) -> Result<Listing<SourcePage>>;

    async fn list_attachments(
        &self,
        page_id: &SourcePageId,
        cursor: Option<&str>,
    ) -> Result<Listing<AttachmentRef>>;

    /// Binary content of an attachment.
    async fn download_attachment(&self, attachment: &AttachmentRef) -> Result<Bytes>;

    async fn list_comments(
        &self,
        page_id: &SourcePageId,
        cursor: Option<&str>,
    ) -> Result<Listing<SourceComment>>;

    /// One page of label names on a page.
    async fn list_labels(&self, page_id: &SourcePageId, cursor: Option<&str>) -> Result<Listing<String>>;
}

// =============================================================================
// Destination platform (write, plus the space index)
// =============================================================================

#[async_trait]
pub trait BaseDestinationPlatform: Send + Sync {
    async fn list_spaces(&self, cursor: Option<&str>) -> Result<Listing<Space>>;

    async fn create_space(&self, space: &Space) -> Result<()>;

    /// Create a page with a verbatim storage body; returns the new page id.
    async fn create_page(
        &self,
        space_key: &str,
        title: &str,
        body: &str,
        parent: Option<&DestinationPageId>,
    ) -> Result<DestinationPageId>;

    async fn upload_attachment(
        &self,
        page_id: &DestinationPageId,
        attachment: &AttachmentRef,
        bytes: Bytes,
    ) -> Result<()>;

    /// Add all labels in a single batch call.
    async fn add_labels(&self, page_id: &DestinationPageId, labels: &[String]) -> Result<()>;

    /// Create a top-level comment whose container is `page_id`.
    async fn create_comment(&self, page_id: &DestinationPageId, body: &str) -> Result<()>;
}

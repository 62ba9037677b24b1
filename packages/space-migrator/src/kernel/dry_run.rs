//! Destination wrapper that plans writes instead of performing them.
//!
//! Reads go to the wrapped destination so the existing-space index is real.
//! Writes are logged and reported as successful; page creation hands out
//! synthetic `dry-run-<n>` ids so parent resolution runs exactly as it would
//! for real.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::BaseDestinationPlatform;
use crate::common::{AttachmentRef, DestinationPageId, Listing, Space};

pub struct DryRunDestination<D> {
    inner: D,
    next_page: AtomicUsize,
}

impl<D: BaseDestinationPlatform> DryRunDestination<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            next_page: AtomicUsize::new(1),
        }
    }

    /// Number of pages that would have been created so far.
    pub fn planned_pages(&self) -> usize {
        self.next_page.load(Ordering::SeqCst) - 1
    }
}

#[async_trait]
impl<D: BaseDestinationPlatform> BaseDestinationPlatform for DryRunDestination<D> {
    async fn list_spaces(&self, cursor: Option<&str>) -> Result<Listing<Space>> {
        self.inner.list_spaces(cursor).await
    }

    async fn create_space(&self, space: &Space) -> Result<()> {
        info!(space_key = %space.key, name = %space.name, "[dry-run] would create space");
        Ok(())
    }

    async fn create_page(
        &self,
        space_key: &str,
        title: &str,
        body: &str,
        parent: Option<&DestinationPageId>,
    ) -> Result<DestinationPageId> {
        let n = self.next_page.fetch_add(1, Ordering::SeqCst);
        let id = DestinationPageId::new(format!("dry-run-{}", n));
        info!(
            space_key,
            title,
            body_bytes = body.len(),
            parent = parent.map(|p| p.as_str()).unwrap_or("<root>"),
            planned_id = %id,
            "[dry-run] would create page"
        );
        Ok(id)
    }

    async fn upload_attachment(
        &self,
        page_id: &DestinationPageId,
        attachment: &AttachmentRef,
        bytes: Bytes,
    ) -> Result<()> {
        info!(
            page_id = %page_id,
            attachment = %attachment.title,
            bytes = bytes.len(),
            "[dry-run] would upload attachment"
        );
        Ok(())
    }

    async fn add_labels(&self, page_id: &DestinationPageId, labels: &[String]) -> Result<()> {
        info!(page_id = %page_id, labels = ?labels, "[dry-run] would add labels");
        Ok(())
    }

    async fn create_comment(&self, page_id: &DestinationPageId, body: &str) -> Result<()> {
        info!(page_id = %page_id, body_bytes = body.len(), "[dry-run] would create comment");
        Ok(())
    }
}

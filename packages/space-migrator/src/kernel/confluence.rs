//! Confluence-backed implementations of the platform traits.
//!
//! Both adapters wrap a [`ConfluenceClient`], run every call through the
//! instance's [`RetryConfig`], and translate wire models into the migrator's
//! own types.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use confluence_client::{
    Attachment, ConfluenceClient, ConfluenceError, Content, CreateContentRequest,
    CreateSpaceRequest, Label, PagedResponse,
};
use tracing::{debug, info};

use super::retry::{CallClass, RetryConfig};
use super::{BaseDestinationPlatform, BaseSourcePlatform};
use crate::common::{
    AttachmentRef, DestinationPageId, Listing, SourceComment, SourcePage, SourcePageId, Space,
};

/// Page sizes used when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    pub spaces: u32,
    pub content: u32,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            spaces: 1000,
            content: 100,
        }
    }
}

fn listing<T, U>(page: PagedResponse<T>, convert: impl FnMut(T) -> U) -> Listing<U> {
    let next = page.next_link().map(str::to_string);
    Listing::new(page.results.into_iter().map(convert).collect(), next)
}

fn to_space(space: confluence_client::Space) -> Space {
    let description = space.plain_description().unwrap_or_default().to_string();
    Space {
        key: space.key,
        name: space.name,
        description,
        space_type: space.space_type,
    }
}

fn to_source_page(content: Content) -> SourcePage {
    let body = content.storage_value().map(str::to_string);
    SourcePage {
        id: content.id.map(SourcePageId::from),
        title: content.title.unwrap_or_default(),
        body,
        ancestors: content
            .ancestors
            .into_iter()
            .map(|a| SourcePageId::from(a.id))
            .collect(),
    }
}

fn to_attachment(attachment: Attachment) -> AttachmentRef {
    let media_type = attachment.media_type().map(str::to_string);
    AttachmentRef {
        id: attachment.id,
        title: attachment.title,
        media_type,
        download_link: attachment.links.download,
    }
}

fn to_comment(content: Content) -> SourceComment {
    let body = content.storage_value().map(str::to_string);
    SourceComment {
        id: content.id,
        body,
    }
}

// =============================================================================
// Source
// =============================================================================

pub struct ConfluenceSource {
    client: ConfluenceClient,
    retry: RetryConfig,
    limits: ListLimits,
}

impl ConfluenceSource {
    pub fn new(client: ConfluenceClient, retry: RetryConfig, limits: ListLimits) -> Self {
        Self {
            client,
            retry,
            limits,
        }
    }

    async fn read<T, O, Fut>(&self, what: &str, operation: O) -> Result<T>
    where
        O: FnMut() -> Fut,
        Fut: std::future::Future<Output = confluence_client::Result<T>>,
    {
        self.retry
            .run(CallClass::Read, what, operation)
            .await
            .with_context(|| format!("source: {}", what))
    }
}

#[async_trait]
impl BaseSourcePlatform for ConfluenceSource {
    async fn list_spaces(&self, cursor: Option<&str>) -> Result<Listing<Space>> {
        let page = self
            .read("list spaces", || self.client.list_spaces(self.limits.spaces, cursor))
            .await?;
        Ok(listing(page, to_space))
    }

    async fn get_space(&self, key: &str) -> Result<Space> {
        let space = self
            .read(&format!("get space {}", key), || self.client.get_space(key))
            .await?;
        Ok(to_space(space))
    }

    async fn list_pages(&self, space_key: &str, cursor: Option<&str>) -> Result<Listing<SourcePage>> {
        let page = self
            .read(&format!("list pages of {}", space_key), || {
                self.client
                    .list_pages(space_key, self.limits.content, cursor)
            })
            .await?;
        Ok(listing(page, to_source_page))
    }

    async fn list_attachments(
        &self,
        page_id: &SourcePageId,
        cursor: Option<&str>,
    ) -> Result<Listing<AttachmentRef>> {
        let page = self
            .read(&format!("list attachments of {}", page_id), || {
                self.client
                    .list_attachments(page_id.as_str(), self.limits.content, cursor)
            })
            .await?;
        Ok(listing(page, to_attachment))
    }

    async fn download_attachment(&self, attachment: &AttachmentRef) -> Result<Bytes> {
        let link = match &attachment.download_link {
            Some(link) => link.clone(),
            None => {
                // Listings from some instances omit `_links.download`; the
                // attachment's own content record always has it.
                let content = self
                    .read(&format!("get attachment {}", attachment.id), || {
                        self.client.get_content(&attachment.id)
                    })
                    .await?;
                content.links.download.ok_or_else(|| ConfluenceError::MissingField {
                    field: "_links.download",
                    context: format!("attachment {}", attachment.id),
                })?
            }
        };

        debug!(attachment = %attachment.title, link = %link, "Downloading attachment");
        self.read(&format!("download {}", attachment.title), || {
            self.client.download(&link)
        })
        .await
    }

    async fn list_comments(
        &self,
        page_id: &SourcePageId,
        cursor: Option<&str>,
    ) -> Result<Listing<SourceComment>> {
        let page = self
            .read(&format!("list comments of {}", page_id), || {
                self.client
                    .list_comments(page_id.as_str(), self.limits.content, cursor)
            })
            .await?;
        Ok(listing(page, to_comment))
    }

    async fn list_labels(&self, page_id: &SourcePageId, cursor: Option<&str>) -> Result<Listing<String>> {
        let page = self
            .read(&format!("list labels of {}", page_id), || {
                self.client
                    .list_labels(page_id.as_str(), self.limits.content, cursor)
            })
            .await?;
        Ok(listing(page, |label| label.name))
    }
}

// =============================================================================
// Destination
// =============================================================================

pub struct ConfluenceDestination {
    client: ConfluenceClient,
    retry: RetryConfig,
    limits: ListLimits,
}

impl ConfluenceDestination {
    pub fn new(client: ConfluenceClient, retry: RetryConfig, limits: ListLimits) -> Self {
        Self {
            client,
            retry,
            limits,
        }
    }

    async fn call<T, O, Fut>(&self, class: CallClass, what: &str, operation: O) -> Result<T>
    where
        O: FnMut() -> Fut,
        Fut: std::future::Future<Output = confluence_client::Result<T>>,
    {
        self.retry
            .run(class, what, operation)
            .await
            .with_context(|| format!("destination: {}", what))
    }
}

#[async_trait]
impl BaseDestinationPlatform for ConfluenceDestination {
    async fn list_spaces(&self, cursor: Option<&str>) -> Result<Listing<Space>> {
        let page = self
            .call(CallClass::Read, "list spaces", || {
                self.client.list_spaces(self.limits.spaces, cursor)
            })
            .await?;
        Ok(listing(page, to_space))
    }

    async fn create_space(&self, space: &Space) -> Result<()> {
        let request = CreateSpaceRequest::global(&space.key, &space.name, &space.description);
        let created = self
            .call(CallClass::Write, &format!("create space {}", space.key), || {
                self.client.create_space(&request)
            })
            .await?;
        info!(space_key = %created.key, name = %created.name, "Created space");
        Ok(())
    }

    async fn create_page(
        &self,
        space_key: &str,
        title: &str,
        body: &str,
        parent: Option<&DestinationPageId>,
    ) -> Result<DestinationPageId> {
        let request = CreateContentRequest::page(space_key, title, body, parent.map(|p| p.as_str()));
        let created = self
            .call(CallClass::Write, &format!("create page '{}'", title), || {
                self.client.create_content(&request)
            })
            .await?;

        let id = created.id.ok_or_else(|| ConfluenceError::MissingField {
            field: "id",
            context: format!("created page '{}'", title),
        })?;
        Ok(DestinationPageId::from(id))
    }

    async fn upload_attachment(
        &self,
        page_id: &DestinationPageId,
        attachment: &AttachmentRef,
        bytes: Bytes,
    ) -> Result<()> {
        self.call(
            CallClass::Write,
            &format!("upload {} to {}", attachment.title, page_id),
            || {
                self.client.upload_attachment(
                    page_id.as_str(),
                    &attachment.title,
                    attachment.media_type.as_deref(),
                    bytes.clone(),
                )
            },
        )
        .await?;
        Ok(())
    }

    async fn add_labels(&self, page_id: &DestinationPageId, labels: &[String]) -> Result<()> {
        let payload: Vec<Label> = labels.iter().map(Label::global).collect();
        self.call(CallClass::Write, &format!("add labels to {}", page_id), || {
            self.client.add_labels(page_id.as_str(), &payload)
        })
        .await?;
        Ok(())
    }

    async fn create_comment(&self, page_id: &DestinationPageId, body: &str) -> Result<()> {
        let request = CreateContentRequest::comment(page_id.as_str(), body);
        self.call(CallClass::Write, &format!("comment on {}", page_id), || {
            self.client.create_content(&request)
        })
        .await?;
        Ok(())
    }
}

// TestDependencies - mock implementations for testing
//
// In-memory source and destination platforms that record every call, paginate
// like the real API, and can be told to fail specific operations.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{BaseDestinationPlatform, BaseSourcePlatform};
use crate::common::{
    AttachmentRef, DestinationPageId, Listing, SourceComment, SourcePage, SourcePageId, Space,
};

const DEFAULT_PAGE_SIZE: usize = 25;

/// Slice `items` the way a `start`/`limit` API would, using `start=<n>` cursors.
fn paginate<T: Clone>(items: &[T], page_size: usize, cursor: Option<&str>) -> Result<Listing<T>> {
    let start = match cursor {
        None => 0,
        Some(c) => c
            .strip_prefix("start=")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| anyhow!("malformed cursor '{}'", c))?,
    };
    let page_size = page_size.max(1);
    let end = (start + page_size).min(items.len());
    let slice = items.get(start..end).map(|s| s.to_vec()).unwrap_or_default();
    let next = (end < items.len()).then(|| format!("start={}", end));
    Ok(Listing::new(slice, next))
}

// =============================================================================
// Mock Source Platform
// =============================================================================

/// A call made against the mock source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    ListSpaces { cursor: Option<String> },
    GetSpace { key: String },
    ListPages { space_key: String, cursor: Option<String> },
    ListAttachments { page_id: String },
    Download { attachment_id: String },
    ListComments { page_id: String },
    ListLabels { page_id: String },
}

#[derive(Default)]
struct SourceState {
    spaces: Vec<Space>,
    pages: HashMap<String, Vec<SourcePage>>,
    attachments: HashMap<String, Vec<(AttachmentRef, Bytes)>>,
    comments: HashMap<String, Vec<SourceComment>>,
    labels: HashMap<String, Vec<String>>,
    page_size: Option<usize>,

    fail_space_listing_at: Option<usize>,
    space_list_calls: usize,
    failing_details: HashSet<String>,
    failing_page_listings: HashSet<String>,
    failing_attachment_listings: HashSet<String>,
    failing_comment_listings: HashSet<String>,
    failing_label_listings: HashSet<String>,
    failing_downloads: HashSet<String>,

    calls: Vec<SourceCall>,
}

impl SourceState {
    fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Clone, Default)]
pub struct MockSourcePlatform {
    state: Arc<Mutex<SourceState>>,
}

impl MockSourcePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page size used by every listing.
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().unwrap().page_size = Some(page_size);
        self
    }

    pub fn with_space(self, space: Space) -> Self {
        self.state.lock().unwrap().spaces.push(space);
        self
    }

    /// Pages of `space_key`, listed in the given order.
    pub fn with_pages(self, space_key: &str, pages: Vec<SourcePage>) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .entry(space_key.to_string())
            .or_default()
            .extend(pages);
        self
    }

    pub fn with_attachment(self, page_id: &str, attachment: AttachmentRef, bytes: &[u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .attachments
            .entry(page_id.to_string())
            .or_default()
            .push((attachment, Bytes::copy_from_slice(bytes)));
        self
    }

    pub fn with_comment(self, page_id: &str, comment: SourceComment) -> Self {
        self.state
            .lock()
            .unwrap()
            .comments
            .entry(page_id.to_string())
            .or_default()
            .push(comment);
        self
    }

    pub fn with_labels(self, page_id: &str, labels: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .labels
            .entry(page_id.to_string())
            .or_default()
            .extend(labels.iter().map(|l| l.to_string()));
        self
    }

    /// Make the `n`th (0-based) space listing call fail.
    pub fn failing_space_listing_at(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_space_listing_at = Some(n);
        self
    }

    pub fn failing_space_detail(self, key: &str) -> Self {
        self.state.lock().unwrap().failing_details.insert(key.to_string());
        self
    }

    pub fn failing_page_listing(self, space_key: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_page_listings
            .insert(space_key.to_string());
        self
    }

    pub fn failing_attachment_listing(self, page_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_attachment_listings
            .insert(page_id.to_string());
        self
    }

    pub fn failing_comment_listing(self, page_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_comment_listings
            .insert(page_id.to_string());
        self
    }

    pub fn failing_label_listing(self, page_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_label_listings
            .insert(page_id.to_string());
        self
    }

    pub fn failing_download(self, attachment_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_downloads
            .insert(attachment_id.to_string());
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<SourceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&SourceCall) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    fn record(&self, call: SourceCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl BaseSourcePlatform for MockSourcePlatform {
    async fn list_spaces(&self, cursor: Option<&str>) -> Result<Listing<Space>> {
        self.record(SourceCall::ListSpaces {
            cursor: cursor.map(str::to_string),
        });
        let mut state = self.state.lock().unwrap();
        let n = state.space_list_calls;
        state.space_list_calls += 1;
        if state.fail_space_listing_at == Some(n) {
            bail!("source: list spaces failed (HTTP 500)");
        }
        paginate(&state.spaces, state.page_size(), cursor)
    }

    async fn get_space(&self, key: &str) -> Result<Space> {
        self.record(SourceCall::GetSpace {
            key: key.to_string(),
        });
        let state = self.state.lock().unwrap();
        if state.failing_details.contains(key) {
            bail!("source: get space {} failed (HTTP 403)", key);
        }
        state
            .spaces
            .iter()
            .find(|s| s.key == key)
            .cloned()
            .ok_or_else(|| anyhow!("source: space {} not found (HTTP 404)", key))
    }

    async fn list_pages(&self, space_key: &str, cursor: Option<&str>) -> Result<Listing<SourcePage>> {
        self.record(SourceCall::ListPages {
            space_key: space_key.to_string(),
            cursor: cursor.map(str::to_string),
        });
        let state = self.state.lock().unwrap();
        if state.failing_page_listings.contains(space_key) {
            bail!("source: list pages of {} failed (HTTP 500)", space_key);
        }
        let pages = state.pages.get(space_key).cloned().unwrap_or_default();
        paginate(&pages, state.page_size(), cursor)
    }

    async fn list_attachments(
        &self,
        page_id: &SourcePageId,
        cursor: Option<&str>,
    ) -> Result<Listing<AttachmentRef>> {
        self.record(SourceCall::ListAttachments {
            page_id: page_id.to_string(),
        });
        let state = self.state.lock().unwrap();
        if state.failing_attachment_listings.contains(page_id.as_str()) {
            bail!("source: list attachments of {} failed (HTTP 500)", page_id);
        }
        let attachments: Vec<AttachmentRef> = state
            .attachments
            .get(page_id.as_str())
            .map(|list| list.iter().map(|(a, _)| a.clone()).collect())
            .unwrap_or_default();
        paginate(&attachments, state.page_size(), cursor)
    }

    async fn download_attachment(&self, attachment: &AttachmentRef) -> Result<Bytes> {
        self.record(SourceCall::Download {
            attachment_id: attachment.id.clone(),
        });
        let state = self.state.lock().unwrap();
        if state.failing_downloads.contains(&attachment.id) {
            bail!("source: download {} failed (HTTP 500)", attachment.title);
        }
        state
            .attachments
            .values()
            .flatten()
            .find(|(a, _)| a.id == attachment.id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| anyhow!("source: attachment {} not found (HTTP 404)", attachment.id))
    }

    async fn list_comments(
        &self,
        page_id: &SourcePageId,
        cursor: Option<&str>,
    ) -> Result<Listing<SourceComment>> {
        self.record(SourceCall::ListComments {
            page_id: page_id.to_string(),
        });
        let state = self.state.lock().unwrap();
        if state.failing_comment_listings.contains(page_id.as_str()) {
            bail!("source: list comments of {} failed (HTTP 500)", page_id);
        }
        let comments = state.comments.get(page_id.as_str()).cloned().unwrap_or_default();
        paginate(&comments, state.page_size(), cursor)
    }

    async fn list_labels(&self, page_id: &SourcePageId, cursor: Option<&str>) -> Result<Listing<String>> {
        self.record(SourceCall::ListLabels {
            page_id: page_id.to_string(),
        });
        let state = self.state.lock().unwrap();
        if state.failing_label_listings.contains(page_id.as_str()) {
            bail!("source: list labels of {} failed (HTTP 500)", page_id);
        }
        let labels = state.labels.get(page_id.as_str()).cloned().unwrap_or_default();
        paginate(&labels, state.page_size(), cursor)
    }
}

// =============================================================================
// Mock Destination Platform
// =============================================================================

/// A page created on the mock destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPage {
    pub id: DestinationPageId,
    pub space_key: String,
    pub title: String,
    pub body: String,
    pub parent: Option<DestinationPageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAttachment {
    pub page_id: DestinationPageId,
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedComment {
    pub page_id: DestinationPageId,
    pub body: String,
}

#[derive(Default)]
struct DestinationState {
    spaces: Vec<Space>,
    page_size: Option<usize>,
    next_page_id: usize,

    created_spaces: Vec<Space>,
    created_pages: Vec<CreatedPage>,
    uploads: Vec<UploadedAttachment>,
    label_calls: Vec<(DestinationPageId, Vec<String>)>,
    comments: Vec<CreatedComment>,
    space_list_calls: usize,
    upload_attempts: usize,
    comment_attempts: usize,

    fail_space_listing: bool,
    failing_spaces: HashSet<String>,
    failing_pages: HashSet<String>,
    failing_uploads: HashSet<String>,
    failing_labels: bool,
    failing_comments: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct MockDestinationPlatform {
    state: Arc<Mutex<DestinationState>>,
}

impl MockDestinationPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().unwrap().page_size = Some(page_size);
        self
    }

    /// A space that already exists before the run.
    pub fn with_existing_space(self, key: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .spaces
            .push(Space::new(key, format!("Existing {}", key)));
        self
    }

    pub fn failing_space_listing(self) -> Self {
        self.state.lock().unwrap().fail_space_listing = true;
        self
    }

    pub fn failing_space_creation(self, key: &str) -> Self {
        self.state.lock().unwrap().failing_spaces.insert(key.to_string());
        self
    }

    /// Reject creation of pages with this title.
    pub fn failing_page(self, title: &str) -> Self {
        self.state.lock().unwrap().failing_pages.insert(title.to_string());
        self
    }

    /// Reject uploads with this filename.
    pub fn failing_upload(self, filename: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(filename.to_string());
        self
    }

    pub fn failing_labels(self) -> Self {
        self.state.lock().unwrap().failing_labels = true;
        self
    }

    /// Reject comments with this body.
    pub fn failing_comment(self, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_comments
            .insert(body.to_string());
        self
    }

    pub fn created_spaces(&self) -> Vec<Space> {
        self.state.lock().unwrap().created_spaces.clone()
    }

    pub fn created_pages(&self) -> Vec<CreatedPage> {
        self.state.lock().unwrap().created_pages.clone()
    }

    pub fn page_titled(&self, title: &str) -> Option<CreatedPage> {
        self.state
            .lock()
            .unwrap()
            .created_pages
            .iter()
            .find(|p| p.title == title)
            .cloned()
    }

    pub fn uploads(&self) -> Vec<UploadedAttachment> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn label_calls(&self) -> Vec<(DestinationPageId, Vec<String>)> {
        self.state.lock().unwrap().label_calls.clone()
    }

    pub fn created_comments(&self) -> Vec<CreatedComment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn space_list_calls(&self) -> usize {
        self.state.lock().unwrap().space_list_calls
    }

    /// Upload calls including rejected ones.
    pub fn upload_attempts(&self) -> usize {
        self.state.lock().unwrap().upload_attempts
    }

    /// Comment calls including rejected ones.
    pub fn comment_attempts(&self) -> usize {
        self.state.lock().unwrap().comment_attempts
    }
}

#[async_trait]
impl BaseDestinationPlatform for MockDestinationPlatform {
    async fn list_spaces(&self, cursor: Option<&str>) -> Result<Listing<Space>> {
        let mut state = self.state.lock().unwrap();
        state.space_list_calls += 1;
        if state.fail_space_listing {
            bail!("destination: list spaces failed (HTTP 401)");
        }
        let page_size = state.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        paginate(&state.spaces, page_size, cursor)
    }

    async fn create_space(&self, space: &Space) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_spaces.contains(&space.key) {
            bail!("destination: create space {} failed (HTTP 400)", space.key);
        }
        if state.spaces.iter().any(|s| s.key == space.key) {
            bail!("destination: space {} already exists (HTTP 409)", space.key);
        }
        state.spaces.push(space.clone());
        state.created_spaces.push(space.clone());
        Ok(())
    }

    async fn create_page(
        &self,
        space_key: &str,
        title: &str,
        body: &str,
        parent: Option<&DestinationPageId>,
    ) -> Result<DestinationPageId> {
        let mut state = self.state.lock().unwrap();
        if state.failing_pages.contains(title) {
            bail!("destination: create page '{}' failed (HTTP 400)", title);
        }
        if !state.spaces.iter().any(|s| s.key == space_key) {
            bail!("destination: no space with key {} (HTTP 404)", space_key);
        }
        state.next_page_id += 1;
        let id = DestinationPageId::new(format!("dest-{}", state.next_page_id));
        state.created_pages.push(CreatedPage {
            id: id.clone(),
            space_key: space_key.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            parent: parent.cloned(),
        });
        Ok(id)
    }

    async fn upload_attachment(
        &self,
        page_id: &DestinationPageId,
        attachment: &AttachmentRef,
        bytes: Bytes,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.upload_attempts += 1;
        if state.failing_uploads.contains(&attachment.title) {
            bail!("destination: upload {} failed (HTTP 413)", attachment.title);
        }
        state.uploads.push(UploadedAttachment {
            page_id: page_id.clone(),
            filename: attachment.title.clone(),
            bytes,
        });
        Ok(())
    }

    async fn add_labels(&self, page_id: &DestinationPageId, labels: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_labels {
            bail!("destination: add labels to {} failed (HTTP 400)", page_id);
        }
        state.label_calls.push((page_id.clone(), labels.to_vec()));
        Ok(())
    }

    async fn create_comment(&self, page_id: &DestinationPageId, body: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.comment_attempts += 1;
        if state.failing_comments.contains(body) {
            bail!("destination: create comment on {} failed (HTTP 400)", page_id);
        }
        state.comments.push(CreatedComment {
            page_id: page_id.clone(),
            body: body.to_string(),
        });
        Ok(())
    }
}

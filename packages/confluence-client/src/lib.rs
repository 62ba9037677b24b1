//! Pure Confluence REST API client.
//!
//! A minimal client for the Confluence Cloud v1 REST API covering what a
//! space-to-space copy needs: listing spaces, pages, attachments, comments and
//! labels (following `_links.next` cursors), and creating the same on another
//! instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use confluence_client::{Auth, ConfluenceClient};
//!
//! let client = ConfluenceClient::new(
//!     "https://example.atlassian.net/wiki",
//!     Auth::basic("admin@example.com", "api-token"),
//! )?;
//!
//! let first = client.list_spaces(100, None).await?;
//! for space in &first.results {
//!     println!("{} ({})", space.name, space.key);
//! }
//! if let Some(next) = first.next_link() {
//!     let second = client.list_spaces(100, Some(next)).await?;
//! }
//! ```

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{ApiToken, Auth};
pub use error::{ConfluenceError, Result};
pub use types::*;

use bytes::Bytes;
use reqwest::{header, multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Confluence REST API client bound to one instance.
#[derive(Clone)]
pub struct ConfluenceClient {
    http_client: Client,
    base_url: String,
    auth: Auth,
}

impl ConfluenceClient {
    /// Create a client for the instance at `base_url` (e.g. `https://x.atlassian.net/wiki`).
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        Self::with_timeout(base_url, auth, DEFAULT_TIMEOUT)
    }

    /// Same as [`ConfluenceClient::new`] with a custom per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, auth: Auth, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfluenceError::Config(format!(
                "base URL must be absolute, got '{}'",
                base_url
            )));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfluenceError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            auth,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an API path or a `_links` value against the base URL.
    pub fn resolve(&self, path_or_link: &str) -> String {
        if path_or_link.starts_with("http://") || path_or_link.starts_with("https://") {
            path_or_link.to_string()
        } else if path_or_link.starts_with('/') {
            format!("{}{}", self.base_url, path_or_link)
        } else {
            format!("{}/{}", self.base_url, path_or_link)
        }
    }

    // ------------------------------------------------------------------------
    // Spaces
    // ------------------------------------------------------------------------

    /// `GET /rest/api/space`. Pass the previous response's `next_link()` to continue.
    pub async fn list_spaces(&self, limit: u32, next: Option<&str>) -> Result<PagedResponse<Space>> {
        let request = self.listing("/rest/api/space", &[("limit", limit.to_string())], next);
        self.send_json(request).await
    }

    /// `GET /rest/api/space/{key}` with the plain description expanded.
    pub async fn get_space(&self, key: &str) -> Result<Space> {
        let path = format!("/rest/api/space/{}", urlencoding::encode(key));
        let request = self
            .get(&path)
            .query(&[("expand", "description.plain")]);
        self.send_json(request).await
    }

    /// `POST /rest/api/space`.
    pub async fn create_space(&self, body: &CreateSpaceRequest) -> Result<Space> {
        tracing::debug!(space_key = %body.key, "Creating space");
        let request = self.post("/rest/api/space").json(body);
        self.send_json(request).await
    }

    // ------------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------------

    /// Pages of a space with `body.storage` and `ancestors` expanded.
    pub async fn list_pages(
        &self,
        space_key: &str,
        limit: u32,
        next: Option<&str>,
    ) -> Result<PagedResponse<Content>> {
        let request = self.listing(
            "/rest/api/content",
            &[
                ("spaceKey", space_key.to_string()),
                ("type", "page".to_string()),
                ("expand", "body.storage,ancestors".to_string()),
                ("limit", limit.to_string()),
            ],
            next,
        );
        self.send_json(request).await
    }

    /// `GET /rest/api/content/{id}`.
    pub async fn get_content(&self, id: &str) -> Result<Content> {
        let path = format!("/rest/api/content/{}", urlencoding::encode(id));
        self.send_json(self.get(&path)).await
    }

    /// `POST /rest/api/content` (pages and comments).
    pub async fn create_content(&self, body: &CreateContentRequest) -> Result<Content> {
        let request = self.post("/rest/api/content").json(body);
        self.send_json(request).await
    }

    // ------------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------------

    pub async fn list_attachments(
        &self,
        content_id: &str,
        limit: u32,
        next: Option<&str>,
    ) -> Result<PagedResponse<Attachment>> {
        let path = format!(
            "/rest/api/content/{}/child/attachment",
            urlencoding::encode(content_id)
        );
        let request = self.listing(&path, &[("limit", limit.to_string())], next);
        self.send_json(request).await
    }

    /// Download the binary behind a `_links.download` value.
    pub async fn download(&self, download_link: &str) -> Result<Bytes> {
        let request = self
            .authorized(self.http_client.get(self.resolve(download_link)))
            .header(header::ACCEPT, "application/octet-stream");
        let response = Self::check(request.send().await?).await?;
        Ok(response.bytes().await?)
    }

    /// Multipart upload to `POST /rest/api/content/{id}/child/attachment`.
    ///
    /// Confluence rejects attachment uploads without `X-Atlassian-Token: no-check`.
    pub async fn upload_attachment(
        &self,
        content_id: &str,
        filename: &str,
        media_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<PagedResponse<Attachment>> {
        let mut part = multipart::Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        if let Some(mime) = media_type {
            part = part.mime_str(mime)?;
        }
        let form = multipart::Form::new().part("file", part);

        let path = format!(
            "/rest/api/content/{}/child/attachment",
            urlencoding::encode(content_id)
        );
        let request = self
            .post(&path)
            .header("X-Atlassian-Token", "no-check")
            .multipart(form);
        self.send_json(request).await
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    /// Comments on a page with `body.storage` expanded.
    pub async fn list_comments(
        &self,
        content_id: &str,
        limit: u32,
        next: Option<&str>,
    ) -> Result<PagedResponse<Content>> {
        let path = format!(
            "/rest/api/content/{}/child/comment",
            urlencoding::encode(content_id)
        );
        let request = self.listing(
            &path,
            &[
                ("expand", "body.storage".to_string()),
                ("limit", limit.to_string()),
            ],
            next,
        );
        self.send_json(request).await
    }

    // ------------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------------

    pub async fn list_labels(
        &self,
        content_id: &str,
        limit: u32,
        next: Option<&str>,
    ) -> Result<PagedResponse<Label>> {
        let path = format!("/rest/api/content/{}/label", urlencoding::encode(content_id));
        let request = self.listing(&path, &[("limit", limit.to_string())], next);
        self.send_json(request).await
    }

    /// Add labels to content in one batch call.
    pub async fn add_labels(&self, content_id: &str, labels: &[Label]) -> Result<PagedResponse<Label>> {
        let path = format!("/rest/api/content/{}/label", urlencoding::encode(content_id));
        let request = self.post(&path).json(labels);
        self.send_json(request).await
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        self.auth.apply(request)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http_client.get(self.resolve(path)))
            .header(header::ACCEPT, "application/json")
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http_client.post(self.resolve(path)))
            .header(header::ACCEPT, "application/json")
    }

    /// First page uses `path` + `query`; later pages use the server's next link verbatim.
    fn listing(&self, path: &str, query: &[(&str, String)], next: Option<&str>) -> RequestBuilder {
        match next {
            Some(link) => self.get(link),
            None => self.get(path).query(query),
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Confluence API error");
        Err(ConfluenceError::Api {
            status: status.as_u16(),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                body
            },
        })
    }

    async fn send_json<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R> {
        let response = Self::check(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl std::fmt::Debug for ConfluenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfluenceClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

use serde::{Deserialize, Serialize};

/// Body representation Confluence stores pages and comments in.
pub const STORAGE_REPRESENTATION: &str = "storage";

/// Label prefix used for ordinary user-visible labels.
pub const GLOBAL_LABEL_PREFIX: &str = "global";

// ============================================================================
// Response envelopes
// ============================================================================

/// One page of a paginated listing (`results` + `_links.next`).
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    pub start: Option<u32>,
    pub limit: Option<u32>,
    pub size: Option<u32>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl<T> PagedResponse<T> {
    /// Link to the next page, relative to the instance base URL.
    pub fn next_link(&self) -> Option<&str> {
        self.links.next.as_deref().filter(|s| !s.is_empty())
    }
}

/// The `_links` object attached to most Confluence resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    pub next: Option<String>,
    pub base: Option<String>,
    pub download: Option<String>,
    pub webui: Option<String>,
}

// ============================================================================
// Spaces
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    pub id: Option<i64>,
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub space_type: Option<String>,
    pub description: Option<SpaceDescription>,
}

impl Space {
    pub fn is_personal(&self) -> bool {
        self.space_type.as_deref() == Some("personal")
    }

    /// Plain-text description, when it was expanded into the response.
    pub fn plain_description(&self) -> Option<&str> {
        self.description
            .as_ref()
            .and_then(|d| d.plain.as_ref())
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceDescription {
    pub plain: Option<PlainValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlainValue {
    pub value: String,
    #[serde(default = "plain_representation")]
    pub representation: String,
}

fn plain_representation() -> String {
    "plain".to_string()
}

/// Body of `POST /rest/api/space`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSpaceRequest {
    pub key: String,
    pub name: String,
    pub description: SpaceDescription,
    #[serde(rename = "type")]
    pub space_type: String,
}

impl CreateSpaceRequest {
    pub fn global(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: SpaceDescription {
                plain: Some(PlainValue {
                    value: description.into(),
                    representation: plain_representation(),
                }),
            },
            space_type: "global".to_string(),
        }
    }
}

// ============================================================================
// Content (pages and comments)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub body: Option<Body>,
    #[serde(default)]
    pub ancestors: Vec<ContentRef>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl Content {
    /// Storage-format body, when `body.storage` was expanded.
    pub fn storage_value(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.storage.as_ref())
            .map(|s| s.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub storage: Option<Storage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    pub value: String,
    pub representation: String,
}

impl Storage {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            representation: STORAGE_REPRESENTATION.to_string(),
        }
    }
}

/// Reference to another piece of content by id (ancestors, containers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRef {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceRef {
    pub key: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Page,
    Comment,
}

/// Body of `POST /rest/api/content`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateContentRequest {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContentRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<ContentRef>,
    pub body: Body,
}

impl CreateContentRequest {
    /// A page in `space_key`, optionally nested under `parent_id`.
    pub fn page(
        space_key: impl Into<String>,
        title: impl Into<String>,
        storage_value: impl Into<String>,
        parent_id: Option<&str>,
    ) -> Self {
        Self {
            content_type: ContentType::Page,
            title: Some(title.into()),
            space: Some(SpaceRef {
                key: space_key.into(),
            }),
            container: None,
            ancestors: parent_id
                .map(|id| {
                    vec![ContentRef {
                        id: id.to_string(),
                        content_type: None,
                    }]
                })
                .unwrap_or_default(),
            body: Body {
                storage: Some(Storage::new(storage_value)),
            },
        }
    }

    /// A top-level comment on the page `page_id`.
    pub fn comment(page_id: impl Into<String>, storage_value: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Comment,
            title: None,
            space: None,
            container: Some(ContentRef {
                id: page_id.into(),
                content_type: Some("page".to_string()),
            }),
            ancestors: Vec::new(),
            body: Body {
                storage: Some(Storage::new(storage_value)),
            },
        }
    }
}

// ============================================================================
// Attachments
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub title: String,
    pub metadata: Option<AttachmentMetadata>,
    pub extensions: Option<AttachmentExtensions>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

impl Attachment {
    pub fn media_type(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.media_type.as_deref())
            .or_else(|| {
                self.extensions
                    .as_ref()
                    .and_then(|e| e.media_type.as_deref())
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentMetadata {
    #[serde(rename = "mediaType")]
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentExtensions {
    #[serde(rename = "mediaType")]
    pub media_type: Option<String>,
    #[serde(rename = "fileSize")]
    pub file_size: Option<u64>,
}

// ============================================================================
// Labels
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
}

impl Label {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            id: None,
            prefix: Some(GLOBAL_LABEL_PREFIX.to_string()),
            name: name.into(),
        }
    }
}

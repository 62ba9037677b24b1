// Platform-neutral views of the content being migrated.

use serde::Serialize;

use super::ids::SourcePageId;

/// A top-level content container, identified by its key on both instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Space {
    pub key: String,
    pub name: String,
    pub description: String,
    /// `global` or `personal` at the source; unused at the destination.
    pub space_type: Option<String>,
}

impl Space {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            space_type: Some("global".to_string()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn personal(mut self) -> Self {
        self.space_type = Some("personal".to_string());
        self
    }

    pub fn is_personal(&self) -> bool {
        self.space_type.as_deref() == Some("personal")
    }
}

/// A source page as listed with body and ancestors expanded.
///
/// `id` and `body` are optional because the listing may omit them; such pages
/// are skipped rather than created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    pub id: Option<SourcePageId>,
    pub title: String,
    /// Storage-representation body, transferred verbatim.
    pub body: Option<String>,
    /// Root first, immediate parent last.
    pub ancestors: Vec<SourcePageId>,
}

impl SourcePage {
    pub fn new(id: impl Into<SourcePageId>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: title.into(),
            body: Some(body.into()),
            ancestors: Vec::new(),
        }
    }

    pub fn with_ancestors<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SourcePageId>,
    {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }

    pub fn parent(&self) -> Option<&SourcePageId> {
        self.ancestors.last()
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

/// Attachment metadata; bytes are downloaded separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub id: String,
    /// Original filename, reused for the upload.
    pub title: String,
    pub media_type: Option<String>,
    /// `_links.download`, when the listing carried it.
    pub download_link: Option<String>,
}

impl AttachmentRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            media_type: None,
            download_link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceComment {
    pub id: Option<String>,
    pub body: Option<String>,
}

impl SourceComment {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            id: None,
            body: Some(body.into()),
        }
    }
}

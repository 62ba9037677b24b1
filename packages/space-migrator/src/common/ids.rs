//! Typed content-id wrappers.
//!
//! Confluence ids are opaque strings on both instances, so a plain `String`
//! would let a source id slip into a destination call. `ContentId<T>` tags the
//! instance at compile time:
//!
//! ```rust
//! use migrator_core::common::{DestinationPageId, SourcePageId};
//!
//! let old = SourcePageId::from("1001");
//! let new = DestinationPageId::from("98304");
//!
//! // This would be a compile error:
//! // let wrong: DestinationPageId = old;
//! # let _ = (old, new);
//! ```

use serde::{Serialize, Serializer};
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker for ids issued by the source instance.
pub struct Source;

/// Marker for ids issued by the destination instance.
pub struct Destination;

#[repr(transparent)]
pub struct ContentId<T>(String, PhantomData<fn() -> T>);

pub type SourcePageId = ContentId<Source>;
pub type DestinationPageId = ContentId<Destination>;

impl<T> ContentId<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into(), PhantomData)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Manual impls: derives would demand the marker type implement them too.

impl<T> Clone for ContentId<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T> PartialEq for ContentId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for ContentId<T> {}

impl<T> Hash for ContentId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> Debug for ContentId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl<T> Display for ContentId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<T> From<String> for ContentId<T> {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl<T> From<&str> for ContentId<T> {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<T> Serialize for ContentId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

//! Document and collection paths
//!
//! Paths alternate collection ids and document ids:
//! `collection/doc/collection/doc/...`. A collection path has an odd number
//! of segments, a document path an even number.

use crate::error::{StoreError, StoreResult};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;

/// Length of generated document ids (matches the reference store's auto ids)
pub const AUTO_ID_LEN: usize = 20;

/// Generate a random document id
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

fn split(raw: &str) -> StoreResult<Vec<String>> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath(raw.to_string()));
    }
    let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(raw.to_string()));
    }
    Ok(segments)
}

fn check_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(StoreError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

/// Path of a collection (odd number of segments)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Parse a `/`-joined collection path
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let segments = split(raw)?;
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(format!(
                "{} is a document path, not a collection",
                raw
            )));
        }
        Ok(Self { segments })
    }

    /// Collection id (last segment)
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Document that owns this collection, `None` for root collections
    pub fn parent(&self) -> Option<DocPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Reference a document in this collection
    pub fn doc(&self, id: &str) -> StoreResult<DocPath> {
        check_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(DocPath { segments })
    }

    /// Reference a new document with a generated id
    pub fn new_doc(&self) -> DocPath {
        let mut segments = self.segments.clone();
        segments.push(auto_id());
        DocPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Path of a document (even number of segments)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Parse a `/`-joined document path
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let segments = split(raw)?;
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath(format!(
                "{} is a collection path, not a document",
                raw
            )));
        }
        Ok(Self { segments })
    }

    /// Document id (last segment)
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Collection holding this document
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Reference a sub-collection of this document
    pub fn collection(&self, id: &str) -> StoreResult<CollectionPath> {
        check_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(CollectionPath { segments })
    }

    /// `true` if `self` lies strictly below `ancestor`
    pub fn is_descendant_of(&self, ancestor: &DocPath) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes() {
        assert!(CollectionPath::parse("admin-data/root/products").is_ok());
        assert!(CollectionPath::parse("admin-data/root").is_err());
        assert!(DocPath::parse("admin-data/root").is_ok());
        assert!(DocPath::parse("admin-data/root/products").is_err());
        assert!(DocPath::parse("a//b").is_err());
        assert!(DocPath::parse("").is_err());
    }

    #[test]
    fn test_navigation() {
        let companies = CollectionPath::parse("admin-data/root/products").unwrap();
        let lg = companies.doc("LG").unwrap();
        let tv = lg.collection("categories").unwrap().doc("TV").unwrap();
        assert_eq!(tv.to_string(), "admin-data/root/products/LG/categories/TV");
        assert_eq!(tv.id(), "TV");
        assert_eq!(tv.parent().id(), "categories");
        assert_eq!(tv.parent().parent(), Some(lg.clone()));
        assert!(tv.is_descendant_of(&lg));
        assert!(!lg.is_descendant_of(&tv));
        assert!(!lg.is_descendant_of(&lg));
    }

    #[test]
    fn test_doc_rejects_slash_in_id() {
        let companies = CollectionPath::parse("admin-data/root/products").unwrap();
        assert!(companies.doc("Blue/Star").is_err());
        assert!(companies.doc("").is_err());
    }

    #[test]
    fn test_auto_id_shape() {
        let id = auto_id();
        assert_eq!(id.len(), AUTO_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(auto_id(), id);
    }
}

//! Note entities, pages and query keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity component shared by every note listing key.
pub const NOTES_ENTITY: &str = "notes";

/// Server-assigned note identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Fixed set of tags a note can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoteTag {
    #[default]
    Todo,
    Work,
    Personal,
    Meeting,
    Shopping,
}

impl NoteTag {
    /// All tags, in the order the form offers them.
    pub const ALL: [NoteTag; 5] = [
        NoteTag::Todo,
        NoteTag::Work,
        NoteTag::Personal,
        NoteTag::Meeting,
        NoteTag::Shopping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteTag::Todo => "Todo",
            NoteTag::Work => "Work",
            NoteTag::Personal => "Personal",
            NoteTag::Meeting => "Meeting",
            NoteTag::Shopping => "Shopping",
        }
    }
}

impl fmt::Display for NoteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown note tag: {0}")]
pub struct ParseTagError(pub String);

impl FromStr for NoteTag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTagError(s.to_string()))
    }
}

/// A note as returned by the remote service.
///
/// Immutable from the client's point of view; it only changes through
/// create and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tag: NoteTag,
}

/// One page of a note listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub notes: Vec<Note>,
    pub total_pages: u32,
}

impl Page {
    pub fn empty() -> Self {
        Self {
            notes: Vec::new(),
            total_pages: 1,
        }
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.notes.iter().any(|note| &note.id == id)
    }
}

/// Query parameters for `GET /notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchNotesParams {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
}

/// Identity of a cached listing page: `("notes", page, search term)`.
///
/// Two keys are equal iff every component is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    entity: &'static str,
    page: u32,
    search: String,
}

impl QueryKey {
    /// Key for a notes listing. Pages below 1 are clamped to 1.
    pub fn notes(page: u32, search: impl Into<String>) -> Self {
        Self {
            entity: NOTES_ENTITY,
            page: page.max(1),
            search: search.into(),
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn matches(&self, prefix: &QueryPrefix) -> bool {
        self.entity == prefix.entity()
    }

    pub fn to_params(&self, per_page: u32) -> FetchNotesParams {
        FetchNotesParams {
            page: self.page,
            per_page,
            search: self.search.clone(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {:?}]", self.entity, self.page, self.search)
    }
}

/// Entity-only prefix used to scope invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryPrefix {
    entity: &'static str,
}

impl QueryPrefix {
    pub const fn new(entity: &'static str) -> Self {
        Self { entity }
    }

    pub const fn notes() -> Self {
        Self::new(NOTES_ENTITY)
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }
}

impl fmt::Display for QueryPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_key_equality_is_componentwise() {
        assert_eq!(QueryKey::notes(1, ""), QueryKey::notes(1, ""));
        assert_ne!(QueryKey::notes(1, ""), QueryKey::notes(2, ""));
        assert_ne!(QueryKey::notes(1, ""), QueryKey::notes(1, "x"));
    }

    #[test]
    fn test_query_key_clamps_page() {
        assert_eq!(QueryKey::notes(0, "a").page(), 1);
    }

    #[test]
    fn test_prefix_matches_entity() {
        let key = QueryKey::notes(3, "meeting");
        assert!(key.matches(&QueryPrefix::notes()));
        assert!(!key.matches(&QueryPrefix::new("tags")));
    }

    #[test]
    fn test_tag_parse_and_display() {
        for tag in NoteTag::ALL {
            assert_eq!(tag.as_str().parse::<NoteTag>(), Ok(tag));
        }
        assert_eq!("meeting".parse::<NoteTag>(), Ok(NoteTag::Meeting));
        assert!("Urgent".parse::<NoteTag>().is_err());
        assert_eq!(NoteTag::default(), NoteTag::Todo);
    }

    #[test]
    fn test_params_omit_empty_search() {
        let params = QueryKey::notes(2, "").to_params(12);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({ "page": 2, "perPage": 12 }));

        let params = QueryKey::notes(1, "meeting").to_params(12);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["search"], "meeting");
    }

    #[test]
    fn test_page_deserializes_camel_case() {
        let page: Page = serde_json::from_str(
            r#"{"notes":[{"id":"n1","title":"Buy milk","content":"","tag":"Shopping","createdAt":"x"}],"totalPages":3}"#,
        )
        .unwrap();
        assert_eq!(page.total_pages, 3);
        assert!(page.contains(&NoteId::from("n1")));
    }
}

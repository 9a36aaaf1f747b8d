//! Draft validation.
//!
//! [`validate`] is pure: it maps a [`NoteDraft`] to the set of field
//! errors it violates. An empty [`ValidationErrors`] means the draft is
//! valid. The only way to obtain a [`NewNote`] is [`NoteDraft::validate`],
//! so an unvalidated draft can never reach the remote service.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::NoteTag;
use crate::{CONTENT_MAX, TITLE_MAX, TITLE_MIN};

/// Transient note being edited in the create form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tag: NoteTag,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tag: NoteTag) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tag,
        }
    }

    /// Validate the draft and produce the payload sent to the service.
    ///
    /// The title is trimmed; content is passed through untouched.
    pub fn validate(&self) -> Result<NewNote, ValidationErrors> {
        let errors = validate(self);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewNote {
            title: self.title.trim().to_string(),
            content: self.content.clone(),
            tag: self.tag,
        })
    }
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNote {
    title: String,
    content: String,
    tag: NoteTag,
}

impl NewNote {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tag(&self) -> NoteTag {
        self.tag
    }
}

/// Draft fields that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Content,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Content => "content",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Title must be at least {min} characters")]
    TitleTooShort { min: usize },

    #[error("Title must be at most {max} characters")]
    TitleTooLong { max: usize },

    #[error("Content must be at most {max} characters")]
    ContentTooLong { max: usize },
}

/// Field name to error mapping. Empty means valid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn insert(&mut self, field: Field, error: FieldError) {
        self.errors.insert(field, error);
    }

    /// Remove the error for `field`, returning whether one was present.
    pub fn clear(&mut self, field: Field) -> bool {
        self.errors.remove(&field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.errors.iter().map(|(field, error)| (*field, error))
    }

    /// Field name to message, as shown inline under each input.
    pub fn messages(&self) -> BTreeMap<&'static str, String> {
        self.errors
            .iter()
            .map(|(field, error)| (field.as_str(), error.to_string()))
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, error) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, error)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check a draft against the field rules.
///
/// - title: required; trimmed length in `TITLE_MIN..=TITLE_MAX`
/// - content: optional; raw length at most `CONTENT_MAX`
/// - tag: always valid
pub fn validate(draft: &NoteDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let title = draft.title.trim();
    let title_len = title.chars().count();
    if title.is_empty() {
        errors.insert(Field::Title, FieldError::TitleRequired);
    } else if title_len < TITLE_MIN {
        errors.insert(Field::Title, FieldError::TitleTooShort { min: TITLE_MIN });
    } else if title_len > TITLE_MAX {
        errors.insert(Field::Title, FieldError::TitleTooLong { max: TITLE_MAX });
    }

    if draft.content.chars().count() > CONTENT_MAX {
        errors.insert(Field::Content, FieldError::ContentTooLong { max: CONTENT_MAX });
    }

    errors
}

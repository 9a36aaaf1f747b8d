//! Create-note form state.

use notehub_core::{Field, FieldError, NewNote, NoteDraft, NoteTag, ValidationErrors};

pub const SUBMIT_LABEL: &str = "Create note";
pub const SUBMITTING_LABEL: &str = "Creating...";

/// Draft plus the field errors from the last submit.
///
/// Editing a field clears that field's error and never adds one; errors
/// only appear on submit, which re-validates the whole draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteForm {
    draft: NoteDraft,
    errors: ValidationErrors,
}

impl NoteForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &NoteDraft {
        &self.draft
    }

    pub fn title(&self) -> &str {
        &self.draft.title
    }

    pub fn content(&self) -> &str {
        &self.draft.content
    }

    pub fn tag(&self) -> NoteTag {
        self.draft.tag
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&FieldError> {
        self.errors.get(field)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
        self.errors.clear(Field::Title);
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.draft.content = content.into();
        self.errors.clear(Field::Content);
    }

    pub fn set_tag(&mut self, tag: NoteTag) {
        self.draft.tag = tag;
    }

    /// Validate the whole draft, keeping the errors for display.
    pub fn submit(&mut self) -> Result<NewNote, ValidationErrors> {
        match self.draft.validate() {
            Ok(note) => {
                self.errors = ValidationErrors::new();
                Ok(note)
            }
            Err(errors) => {
                tracing::debug!(errors = %errors, "Note form rejected");
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    pub fn submit_label(pending: bool) -> &'static str {
        if pending {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }
}

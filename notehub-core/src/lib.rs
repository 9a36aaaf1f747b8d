//! notehub Core - Entity Types
//!
//! Data structures shared by every notehub crate: the note model, the
//! draft validation rules, the error taxonomy, and the contract of the
//! remote note service. No runtime, no I/O.

pub mod error;
pub mod model;
pub mod service;
pub mod validation;

pub use error::{FetchError, MutationError, ServiceError};
pub use model::{
    FetchNotesParams, Note, NoteId, NoteTag, Page, ParseTagError, QueryKey, QueryPrefix,
    NOTES_ENTITY,
};
pub use service::NoteService;
pub use validation::{validate, Field, FieldError, NewNote, NoteDraft, ValidationErrors};

// ============================================================================
// LIMITS
// ============================================================================

/// Number of notes requested per page.
pub const PER_PAGE: u32 = 12;

/// Minimum trimmed title length, in characters.
pub const TITLE_MIN: usize = 3;

/// Maximum trimmed title length, in characters.
pub const TITLE_MAX: usize = 50;

/// Maximum raw content length, in characters.
pub const CONTENT_MAX: usize = 500;

/// Result type for remote service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

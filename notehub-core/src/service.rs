//! Contract of the remote note service.

use async_trait::async_trait;

use crate::model::{FetchNotesParams, Note, NoteId, Page};
use crate::validation::NewNote;
use crate::ServiceResult;

/// Remote note service: list, create and delete against the notes API.
///
/// Transport, authentication headers and base URL are the implementor's
/// concern. Implementations must be usable from spawned tasks.
#[async_trait]
pub trait NoteService: Send + Sync {
    /// Fetch one page of notes matching `params.search`.
    async fn fetch_notes(&self, params: &FetchNotesParams) -> ServiceResult<Page>;

    /// Create a note from an already validated payload.
    async fn create_note(&self, note: &NewNote) -> ServiceResult<Note>;

    /// Delete a note by id.
    async fn delete_note(&self, id: &NoteId) -> ServiceResult<()>;
}

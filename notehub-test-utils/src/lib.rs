//! notehub Test Utilities
//!
//! Centralized test infrastructure for the notehub workspace:
//! - In-memory note service with scripted latency and failures
//! - Proptest generators for notes and drafts
//! - Test fixtures for common scenarios
//! - Custom assertions for listing pages

pub use notehub_core::{
    FetchNotesParams, NewNote, Note, NoteDraft, NoteId, NoteService, NoteTag, Page, QueryKey,
    ServiceError, ServiceResult, PER_PAGE,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// MOCK NOTE SERVICE
// ============================================================================

#[derive(Default)]
struct MockState {
    /// Newest first, like the real listing.
    notes: Vec<Note>,
    latency: Duration,
    search_latency: HashMap<String, Duration>,
    fail_fetches: usize,
    fail_creates: usize,
    fail_deletes: usize,
    fetch_calls: Vec<FetchNotesParams>,
    create_calls: Vec<NewNote>,
    delete_calls: Vec<NoteId>,
}

/// In-memory [`NoteService`] for tests.
///
/// Listing filters by case-insensitive substring of title or content and
/// paginates with the requested page size. Created notes are inserted at
/// the front so they appear on page 1.
#[derive(Default)]
pub struct MockNoteService {
    state: Mutex<MockState>,
}

impl MockNoteService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the service with `notes`, first element on top.
    pub fn with_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let service = Self::new();
        service.state().notes = notes.into_iter().collect();
        service
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Delay applied to every call.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Delay applied to listing calls for a specific search term.
    pub fn set_search_latency(&self, search: &str, latency: Duration) {
        self.state()
            .search_latency
            .insert(search.to_string(), latency);
    }

    /// Make the next `count` listing calls fail with a 500.
    pub fn fail_next_fetches(&self, count: usize) {
        self.state().fail_fetches = count;
    }

    /// Make the next `count` create calls fail with a 400.
    pub fn fail_next_creates(&self, count: usize) {
        self.state().fail_creates = count;
    }

    /// Make the next `count` delete calls fail with a 500.
    pub fn fail_next_deletes(&self, count: usize) {
        self.state().fail_deletes = count;
    }

    pub fn notes(&self) -> Vec<Note> {
        self.state().notes.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state().fetch_calls.len()
    }

    pub fn fetch_calls(&self) -> Vec<FetchNotesParams> {
        self.state().fetch_calls.clone()
    }

    pub fn create_calls(&self) -> Vec<NewNote> {
        self.state().create_calls.clone()
    }

    pub fn delete_calls(&self) -> Vec<NoteId> {
        self.state().delete_calls.clone()
    }

    fn take_failure(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

fn matches_search(note: &Note, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    note.title.to_lowercase().contains(&needle) || note.content.to_lowercase().contains(&needle)
}

/// Slice `notes` into the requested page. Always at least one page.
pub fn paginate(notes: &[Note], page: u32, per_page: u32) -> Page {
    let per_page = per_page.max(1) as usize;
    let total_pages = notes.len().div_ceil(per_page).max(1) as u32;
    let start = (page.max(1) as usize - 1) * per_page;
    let notes = notes.iter().skip(start).take(per_page).cloned().collect();
    Page { notes, total_pages }
}

#[async_trait]
impl NoteService for MockNoteService {
    async fn fetch_notes(&self, params: &FetchNotesParams) -> ServiceResult<Page> {
        let delay = {
            let mut state = self.state();
            state.fetch_calls.push(params.clone());
            state
                .search_latency
                .get(&params.search)
                .copied()
                .unwrap_or(state.latency)
        };
        tokio::time::sleep(delay).await;

        let mut state = self.state();
        if Self::take_failure(&mut state.fail_fetches) {
            return Err(ServiceError::api(500, "Internal Server Error"));
        }
        let matching: Vec<Note> = state
            .notes
            .iter()
            .filter(|note| matches_search(note, &params.search))
            .cloned()
            .collect();
        Ok(paginate(&matching, params.page, params.per_page))
    }

    async fn create_note(&self, note: &NewNote) -> ServiceResult<Note> {
        let delay = {
            let mut state = self.state();
            state.create_calls.push(note.clone());
            state.latency
        };
        tokio::time::sleep(delay).await;

        let mut state = self.state();
        if Self::take_failure(&mut state.fail_creates) {
            return Err(ServiceError::api(400, "Bad Request"));
        }
        let created = Note {
            id: NoteId::new(Uuid::now_v7().to_string()),
            title: note.title().to_string(),
            content: note.content().to_string(),
            tag: note.tag(),
        };
        state.notes.insert(0, created.clone());
        Ok(created)
    }

    async fn delete_note(&self, id: &NoteId) -> ServiceResult<()> {
        let delay = {
            let mut state = self.state();
            state.delete_calls.push(id.clone());
            state.latency
        };
        tokio::time::sleep(delay).await;

        let mut state = self.state();
        if Self::take_failure(&mut state.fail_deletes) {
            return Err(ServiceError::api(500, "Internal Server Error"));
        }
        let before = state.notes.len();
        state.notes.retain(|note| &note.id != id);
        if state.notes.len() == before {
            return Err(ServiceError::api(404, format!("Note {} not found", id)));
        }
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating notehub types.

    use super::*;
    use proptest::prelude::*;

    /// Generate any tag.
    pub fn arb_tag() -> impl Strategy<Value = NoteTag> {
        prop::sample::select(NoteTag::ALL.to_vec())
    }

    /// Generate a title whose trimmed length is within bounds.
    pub fn arb_valid_title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.!?-]{1,48}[A-Za-z0-9]"
    }

    /// Generate content within the length limit.
    pub fn arb_valid_content() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 \n,.]{0,500}"
    }

    /// Generate a draft that passes validation.
    pub fn arb_valid_draft() -> impl Strategy<Value = NoteDraft> {
        (arb_valid_title(), arb_valid_content(), arb_tag())
            .prop_map(|(title, content, tag)| NoteDraft::new(title, content, tag))
    }

    /// Generate a server-side note.
    pub fn arb_note() -> impl Strategy<Value = Note> {
        ("[a-f0-9]{24}", arb_valid_title(), arb_valid_content(), arb_tag()).prop_map(
            |(id, title, content, tag)| Note {
                id: NoteId::new(id),
                title,
                content,
                tag,
            },
        )
    }

    /// Generate a listing of up to `max` notes.
    pub fn arb_notes(max: usize) -> impl Strategy<Value = Vec<Note>> {
        prop::collection::vec(arb_note(), 0..=max)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Create a note with a predictable id.
    pub fn note(id: &str, title: &str, tag: NoteTag) -> Note {
        Note {
            id: NoteId::from(id),
            title: title.to_string(),
            content: format!("Content of {}", title),
            tag,
        }
    }

    /// `count` notes with ids `n1..`, cycling through every tag.
    pub fn sample_notes(count: usize) -> Vec<Note> {
        (1..=count)
            .map(|i| {
                let tag = NoteTag::ALL[(i - 1) % NoteTag::ALL.len()];
                note(&format!("n{}", i), &format!("Note number {}", i), tag)
            })
            .collect()
    }

    /// A small set with a recognisable meeting note.
    pub fn meeting_notes() -> Vec<Note> {
        vec![
            note("m1", "Weekly meeting", NoteTag::Meeting),
            note("w1", "Quarterly report", NoteTag::Work),
            note("s1", "Groceries", NoteTag::Shopping),
        ]
    }

    /// A draft that passes validation.
    pub fn valid_draft() -> NoteDraft {
        NoteDraft::new("Plan the sprint", "Review backlog", NoteTag::Work)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over listing pages.

    use super::*;

    /// Assert that the page lists a note with `id`.
    #[track_caller]
    pub fn assert_lists(page: &Page, id: &NoteId) {
        assert!(
            page.contains(id),
            "Expected note {} in page, got ids: {:?}",
            id,
            page.notes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>()
        );
    }

    /// Assert that the page does not list a note with `id`.
    #[track_caller]
    pub fn assert_not_lists(page: &Page, id: &NoteId) {
        assert!(!page.contains(id), "Note {} should not be listed", id);
    }

    /// Assert the page respects the page size and page count invariants.
    #[track_caller]
    pub fn assert_page_shape(page: &Page, per_page: u32) {
        assert!(page.total_pages >= 1, "total_pages must be at least 1");
        assert!(
            page.notes.len() <= per_page as usize,
            "page holds {} notes, more than {}",
            page.notes.len(),
            per_page
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

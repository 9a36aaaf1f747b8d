//! The notes listing as state.
//!
//! [`NotesApp`] owns the search controller, the subscription to the page
//! being shown, the create form and both mutations. [`ListingView`] is
//! derived from it on demand and is what a front end displays.

use crate::controller::SearchController;
use crate::error::SubmitError;
use crate::form::NoteForm;
use crate::mutation::{Mutation, MutationSpec, MutationTicket};
use futures_util::future::{BoxFuture, FutureExt};
use notehub_cache::{CacheRead, NotesCache, Subscription};
use notehub_core::{
    FetchError, MutationError, Note, NoteId, NoteService, NoteTag, Page, QueryKey,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const CREATE_TOGGLE_LABEL: &str = "Create note +";
pub const CANCEL_LABEL: &str = "Cancel";
pub const DELETE_LABEL: &str = "Delete";
pub const DELETING_LABEL: &str = "Deleting...";
pub const LOADING_MESSAGE: &str = "Loading notes...";
pub const NO_NOTES_MESSAGE: &str = "No notes yet. Create your first note!";

pub struct NotesApp {
    service: Arc<dyn NoteService>,
    cache: NotesCache,
    search: SearchController,
    subscription: Option<Subscription<QueryKey, Page>>,
    form: Option<NoteForm>,
    create: Mutation,
    delete: Mutation,
    /// Error timestamp the user dismissed; a newer error shows again.
    dismissed_error: Option<Instant>,
}

impl NotesApp {
    pub fn new(service: Arc<dyn NoteService>, cache: NotesCache, debounce: Duration) -> Self {
        Self {
            service,
            cache,
            search: SearchController::new(debounce),
            subscription: None,
            form: None,
            create: Mutation::new(MutationSpec::create_note()),
            delete: Mutation::new(MutationSpec::delete_note()),
            dismissed_error: None,
        }
    }

    pub fn cache(&self) -> &NotesCache {
        &self.cache
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn active_key(&self) -> QueryKey {
        self.search.active_key()
    }

    pub fn create_mutation(&self) -> &Mutation {
        &self.create
    }

    pub fn delete_mutation(&self) -> &Mutation {
        &self.delete
    }

    // ------------------------------------------------------------------
    // Search and paging
    // ------------------------------------------------------------------

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search.set_search_term(term, Instant::now());
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.search.next_deadline()
    }

    /// Apply a due search term and start loading its first page.
    pub fn tick(&mut self) -> bool {
        let changed = self.search.tick(Instant::now());
        if changed {
            self.sync();
        }
        changed
    }

    pub fn go_to_page(&mut self, page: u32) -> bool {
        let changed = self.search.set_page(page);
        if changed {
            self.sync();
        }
        changed
    }

    /// Observe the active key and start a fetch if it has no fresh data.
    pub fn sync(&mut self) {
        let key = self.resubscribe();
        self.cache.ensure(&key);
    }

    fn resubscribe(&mut self) -> QueryKey {
        let key = self.active_key();
        let current = self.subscription.as_ref().map(|subscription| subscription.key());
        if current != Some(&key) {
            tracing::debug!(key = %key, "Showing listing page");
            self.subscription = Some(self.cache.observe(&key));
        }
        key
    }

    /// Wait for the active key's in-flight fetch, if any.
    pub async fn settle(&self) -> Option<Result<Page, FetchError>> {
        self.cache.wait(&self.active_key()).await
    }

    /// Observe the active key and read it through the cache.
    pub async fn load(&mut self) -> Result<Page, FetchError> {
        let key = self.resubscribe();
        self.cache.get(&key).await.map(CacheRead::into_value)
    }

    // ------------------------------------------------------------------
    // Create form
    // ------------------------------------------------------------------

    /// Open a fresh form, or close the open one. Returns whether it is open.
    pub fn toggle_create_form(&mut self) -> bool {
        if self.form.take().is_none() {
            self.create.reset();
            self.form = Some(NoteForm::new());
        }
        self.form.is_some()
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    pub fn form(&self) -> Option<&NoteForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut NoteForm> {
        self.form.as_mut()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Validate the form and create the note.
    ///
    /// An invalid draft never reaches the service. On success the form
    /// closes, the listing returns to page 1 and every notes query is
    /// refetched before this returns.
    pub async fn submit_form(&mut self) -> Result<Note, SubmitError> {
        let pending = self.begin_submit()?;
        let response = pending.send().await;
        self.finish_submit(response).await
    }

    /// Validate the form and mark the create mutation pending.
    ///
    /// The returned call borrows nothing from the app, so the view shows
    /// the submitting form while it is in flight. Its response must be
    /// handed to [`NotesApp::finish_submit`].
    pub fn begin_submit(&mut self) -> Result<PendingCreate, SubmitError> {
        let form = self.form.as_mut().ok_or(SubmitError::NoForm)?;
        let new_note = form.submit()?;
        let ticket = self.create.begin()?;

        let service = Arc::clone(&self.service);
        let call = async move {
            service
                .create_note(&new_note)
                .await
                .map_err(MutationError::Create)
        }
        .boxed();
        Ok(PendingCreate { ticket, call })
    }

    /// Settle a create started by [`NotesApp::begin_submit`].
    pub async fn finish_submit(&mut self, response: CreateResponse) -> Result<Note, SubmitError> {
        let CreateResponse { ticket, result } = response;
        let cache = self.cache.clone();
        let note = ticket
            .finish(&cache, result, |note: &Note| {
                tracing::info!(id = %note.id, "Note created");
                self.form = None;
                self.search.reset_page();
                self.resubscribe();
            })
            .await?;
        Ok(note)
    }

    pub async fn delete_note(&self, id: NoteId) -> Result<(), MutationError> {
        let service = Arc::clone(&self.service);
        let target = id.clone();
        let call = async move {
            service
                .delete_note(&target)
                .await
                .map_err(|source| MutationError::Delete {
                    id: target.clone(),
                    source,
                })
        };

        self.delete
            .run(&self.cache, call, |_: &()| {
                tracing::info!(id = %id, "Note deleted");
            })
            .await
    }

    /// Hide the current listing error until a newer one arrives.
    pub fn dismiss_error(&mut self) {
        self.dismissed_error = self.cache.snapshot(&self.active_key()).error_updated_at;
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    pub fn view(&self) -> ListingView {
        let snapshot = self.cache.snapshot(&self.active_key());
        let is_loading = snapshot.is_loading();

        let error_banner = match &snapshot.error {
            Some(err) if snapshot.error_updated_at != self.dismissed_error => {
                Some(format!("Error loading notes: {}", err))
            }
            _ => None,
        };

        let (notes, total_pages) = match snapshot.data {
            Some(page) => (page.notes, page.total_pages.max(1)),
            None => (Vec::new(), 1),
        };

        let search_term = self.search.search_term().to_string();
        let empty_message = (notes.is_empty() && !is_loading).then(|| {
            if search_term.is_empty() {
                NO_NOTES_MESSAGE.to_string()
            } else {
                format!("No notes found for \"{}\"", search_term)
            }
        });

        let deleting = self.delete.is_pending();
        let form = self.form.as_ref().map(|form| {
            let submitting = self.create.is_pending();
            FormView {
                title: form.title().to_string(),
                content: form.content().to_string(),
                tag: form.tag(),
                errors: form.errors().messages(),
                submit_label: NoteForm::submit_label(submitting),
                submit_disabled: submitting,
                create_error: self.create.error().map(|err| err.to_string()),
            }
        });

        ListingView {
            current_page: self.search.current_page(),
            total_pages,
            show_pagination: total_pages > 1,
            is_loading,
            is_fetching: snapshot.is_fetching,
            error_banner,
            empty_message,
            create_toggle_label: if self.form.is_some() {
                CANCEL_LABEL
            } else {
                CREATE_TOGGLE_LABEL
            },
            form,
            delete_label: if deleting { DELETING_LABEL } else { DELETE_LABEL },
            delete_disabled: deleting,
            delete_error: self.delete.error().map(|err| err.to_string()),
            search_term,
            notes,
        }
    }
}

/// A validated create waiting to be sent.
#[must_use = "send the call and pass its response to NotesApp::finish_submit"]
pub struct PendingCreate {
    ticket: MutationTicket,
    call: BoxFuture<'static, Result<Note, MutationError>>,
}

impl PendingCreate {
    /// Make the service call.
    pub async fn send(self) -> CreateResponse {
        let result = self.call.await;
        CreateResponse {
            ticket: self.ticket,
            result,
        }
    }
}

impl fmt::Debug for PendingCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCreate").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct CreateResponse {
    ticket: MutationTicket,
    result: Result<Note, MutationError>,
}

/// Everything the listing screen shows, derived from [`NotesApp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    pub search_term: String,
    pub notes: Vec<Note>,
    pub current_page: u32,
    pub total_pages: u32,
    pub show_pagination: bool,
    /// First load of the current key, nothing to show yet.
    pub is_loading: bool,
    /// Any fetch in flight for the current key, including background
    /// refreshes behind stale data.
    pub is_fetching: bool,
    pub error_banner: Option<String>,
    pub empty_message: Option<String>,
    pub create_toggle_label: &'static str,
    pub form: Option<FormView>,
    pub delete_label: &'static str,
    pub delete_disabled: bool,
    pub delete_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub title: String,
    pub content: String,
    pub tag: NoteTag,
    /// Field name to message.
    pub errors: BTreeMap<&'static str, String>,
    pub submit_label: &'static str,
    pub submit_disabled: bool,
    pub create_error: Option<String>,
}

impl fmt::Display for ListingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Search: \"{}\"", self.search_term)?;
        if self.show_pagination {
            write!(f, "  Page {}/{}", self.current_page, self.total_pages)?;
        }
        if self.is_fetching && !self.is_loading {
            write!(f, "  (refreshing)")?;
        }
        writeln!(f, "  [{}]", self.create_toggle_label)?;

        if let Some(banner) = &self.error_banner {
            writeln!(f, "! {}", banner)?;
        }
        if self.is_loading {
            writeln!(f, "{}", LOADING_MESSAGE)?;
        }

        if let Some(form) = &self.form {
            writeln!(f, "-- New note --")?;
            writeln!(f, "  title:   {}", form.title)?;
            if let Some(message) = form.errors.get("title") {
                writeln!(f, "           ! {}", message)?;
            }
            writeln!(f, "  content: {}", form.content)?;
            if let Some(message) = form.errors.get("content") {
                writeln!(f, "           ! {}", message)?;
            }
            writeln!(f, "  tag:     {}", form.tag)?;
            if let Some(err) = &form.create_error {
                writeln!(f, "  ! {}", err)?;
            }
            writeln!(f, "  [{}]", form.submit_label)?;
        }

        for note in &self.notes {
            writeln!(f, "- {} ({}) [{}]  id={}", note.title, note.tag, self.delete_label, note.id)?;
            if !note.content.is_empty() {
                writeln!(f, "    {}", note.content)?;
            }
        }
        if let Some(err) = &self.delete_error {
            writeln!(f, "! {}", err)?;
        }
        if let Some(message) = &self.empty_message {
            writeln!(f, "{}", message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ListingView {
        ListingView {
            search_term: String::new(),
            notes: Vec::new(),
            current_page: 1,
            total_pages: 1,
            show_pagination: false,
            is_loading: false,
            is_fetching: false,
            error_banner: None,
            empty_message: Some(NO_NOTES_MESSAGE.to_string()),
            create_toggle_label: CREATE_TOGGLE_LABEL,
            form: None,
            delete_label: DELETE_LABEL,
            delete_disabled: false,
            delete_error: None,
        }
    }

    #[test]
    fn test_display_empty_listing() {
        let text = view().to_string();
        assert!(text.starts_with("Search: \"\"  [Create note +]"));
        assert!(text.contains(NO_NOTES_MESSAGE));
        assert!(!text.contains("Page"));
    }

    #[test]
    fn test_display_pagination_and_banner() {
        let mut listing = view();
        listing.total_pages = 3;
        listing.current_page = 2;
        listing.show_pagination = true;
        listing.error_banner = Some("Error loading notes: HTTP 500: boom".to_string());
        let text = listing.to_string();
        assert!(text.contains("Page 2/3"));
        assert!(text.contains("! Error loading notes: HTTP 500: boom"));
    }
}

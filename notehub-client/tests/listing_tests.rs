//! End-to-end listing behaviour over the mock service, in paused time.

use notehub_cache::{notes_cache, CacheConfig};
use notehub_client::app::NO_NOTES_MESSAGE;
use notehub_client::{NotesApp, SubmitError, SEARCH_DEBOUNCE};
use notehub_core::{
    Field, MutationError, NoteId, NoteService, NoteTag, QueryKey, ServiceError,
};
use notehub_test_utils::assertions::assert_lists;
use notehub_test_utils::fixtures::{meeting_notes, note, sample_notes};
use notehub_test_utils::MockNoteService;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::advance;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn app_with(service: &Arc<MockNoteService>) -> NotesApp {
    let service: Arc<dyn NoteService> = service.clone();
    let cache = notes_cache(Arc::clone(&service), CacheConfig::default());
    NotesApp::new(service, cache, SEARCH_DEBOUNCE)
}

async fn loaded(service: &Arc<MockNoteService>) -> NotesApp {
    let mut app = app_with(service);
    app.sync();
    app.settle().await;
    app
}

/// Type `term` and let the debounce window pass.
async fn search(app: &mut NotesApp, term: &str) {
    app.set_search_term(term);
    advance(SEARCH_DEBOUNCE).await;
    assert!(app.tick(), "search term {:?} should apply", term);
}

fn ids(app: &NotesApp) -> Vec<String> {
    app.view()
        .notes
        .iter()
        .map(|note| note.id.as_str().to_string())
        .collect()
}

// ============================================================================
// SEARCH AND PAGINATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn typing_burst_fetches_once_with_final_term() {
    let service = MockNoteService::with_notes(sample_notes(30)).into_arc();
    let mut app = loaded(&service).await;
    assert_eq!(service.fetch_count(), 1);

    app.set_search_term("a");
    advance(ms(100)).await;
    assert!(!app.tick());
    app.set_search_term("ab");
    advance(ms(100)).await;
    assert!(!app.tick());
    app.set_search_term("abc");
    advance(ms(499)).await;
    assert!(!app.tick());
    advance(ms(1)).await;
    assert!(app.tick());
    app.settle().await;

    let calls = service.fetch_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].search, "abc");
    assert_eq!(calls[1].page, 1);
    assert_eq!(calls[1].per_page, 12);
}

#[tokio::test(start_paused = true)]
async fn applied_search_resets_to_first_page() {
    let service = MockNoteService::with_notes(sample_notes(30)).into_arc();
    let mut app = loaded(&service).await;

    assert!(app.go_to_page(3));
    app.settle().await;
    let view = app.view();
    assert_eq!(view.current_page, 3);
    assert_eq!(view.total_pages, 3);
    assert!(view.show_pagination);
    assert_eq!(view.notes.len(), 6);

    search(&mut app, "number 1").await;
    assert_eq!(app.active_key(), QueryKey::notes(1, "number 1"));
    app.settle().await;

    // "Note number 1" and "Note number 10" to "Note number 19".
    let view = app.view();
    assert_eq!(view.current_page, 1);
    assert_eq!(view.notes.len(), 11);
    assert!(!view.show_pagination);
}

#[tokio::test(start_paused = true)]
async fn revisited_page_shows_cached_data_while_refreshing() {
    let service = MockNoteService::with_notes(sample_notes(30)).into_arc();
    let mut app = loaded(&service).await;
    app.go_to_page(2);
    app.settle().await;

    service.set_latency(ms(1_000));
    app.go_to_page(1);
    let view = app.view();
    assert!(!view.is_loading);
    assert!(view.is_fetching);
    assert_eq!(view.notes.len(), 12);

    app.settle().await;
    assert!(!app.view().is_fetching);
    assert_eq!(service.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn first_load_shows_loading_instead_of_empty_message() {
    let service = MockNoteService::with_notes(sample_notes(3)).into_arc();
    service.set_latency(ms(300));
    let mut app = app_with(&service);
    app.sync();

    let view = app.view();
    assert!(view.is_loading);
    assert_eq!(view.empty_message, None);

    app.settle().await;
    let view = app.view();
    assert!(!view.is_loading);
    assert_eq!(view.notes.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn empty_messages_follow_search_term() {
    let service = MockNoteService::with_notes(meeting_notes()).into_arc();
    let mut app = loaded(&service).await;

    search(&mut app, "meeting").await;
    app.settle().await;
    assert_eq!(ids(&app), vec!["m1"]);
    assert_eq!(app.view().empty_message, None);

    search(&mut app, "zzz").await;
    app.settle().await;
    let view = app.view();
    assert!(view.notes.is_empty());
    assert_eq!(
        view.empty_message.as_deref(),
        Some("No notes found for \"zzz\"")
    );
}

#[tokio::test(start_paused = true)]
async fn empty_second_page_names_the_search_term() {
    let service = MockNoteService::with_notes(meeting_notes()).into_arc();
    let mut app = loaded(&service).await;
    search(&mut app, "meeting").await;
    app.go_to_page(2);
    app.settle().await;

    let view = app.view();
    assert_eq!(view.current_page, 2);
    assert!(view.notes.is_empty());
    assert_eq!(view.total_pages, 1);
    assert_eq!(
        view.empty_message.as_deref(),
        Some("No notes found for \"meeting\"")
    );
}

#[tokio::test(start_paused = true)]
async fn empty_service_invites_first_note() {
    let service = MockNoteService::new().into_arc();
    let app = loaded(&service).await;
    let view = app.view();
    assert_eq!(view.empty_message.as_deref(), Some(NO_NOTES_MESSAGE));
    assert_eq!(view.total_pages, 1);
    assert!(!view.show_pagination);
}

#[tokio::test(start_paused = true)]
async fn slow_response_for_old_search_never_replaces_current_listing() {
    let service = MockNoteService::with_notes(vec![
        note("s1", "slow lane", NoteTag::Todo),
        note("f1", "fast lane", NoteTag::Todo),
    ])
    .into_arc();
    service.set_search_latency("slow", ms(2_000));
    service.set_search_latency("fast", ms(10));
    let mut app = loaded(&service).await;

    search(&mut app, "slow").await;
    search(&mut app, "fast").await;
    app.settle().await;
    assert_eq!(ids(&app), vec!["f1"]);

    let slow_key = QueryKey::notes(1, "slow");
    let slow = app.cache().wait(&slow_key).await;
    assert!(matches!(slow, Some(Ok(ref page)) if page.notes[0].id == NoteId::from("s1")));

    assert_eq!(ids(&app), vec!["f1"]);
    assert_eq!(app.active_key(), QueryKey::notes(1, "fast"));
}

// ============================================================================
// LISTING ERRORS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn failed_fetch_is_retried_once() {
    let service = MockNoteService::with_notes(sample_notes(3)).into_arc();
    service.fail_next_fetches(1);
    let app = loaded(&service).await;

    assert_eq!(service.fetch_count(), 2);
    let view = app.view();
    assert_eq!(view.error_banner, None);
    assert_eq!(view.notes.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn error_banner_after_retry_and_dismiss() {
    let service = MockNoteService::with_notes(sample_notes(3)).into_arc();
    service.fail_next_fetches(2);
    let mut app = app_with(&service);
    app.sync();
    assert!(matches!(app.settle().await, Some(Err(_))));
    assert_eq!(service.fetch_count(), 2);

    let view = app.view();
    assert_eq!(
        view.error_banner.as_deref(),
        Some("Error loading notes: HTTP 500: Internal Server Error")
    );
    assert!(!view.is_loading);

    app.dismiss_error();
    assert_eq!(app.view().error_banner, None);

    // A newer failure is shown again.
    service.fail_next_fetches(2);
    let key = app.active_key();
    assert!(app.cache().refetch(&key).await.is_err());
    assert!(app.view().error_banner.is_some());
}

#[tokio::test(start_paused = true)]
async fn refetch_error_keeps_last_good_notes() {
    let service = MockNoteService::with_notes(sample_notes(3)).into_arc();
    let app = loaded(&service).await;

    service.fail_next_fetches(2);
    let key = app.active_key();
    assert!(app.cache().refetch(&key).await.is_err());

    let view = app.view();
    assert_eq!(view.notes.len(), 3);
    assert!(view.error_banner.is_some());
    assert_eq!(view.empty_message, None);
}

// ============================================================================
// CREATE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn created_note_appears_on_first_page_without_refresh() {
    let service = MockNoteService::with_notes(sample_notes(30)).into_arc();
    let mut app = loaded(&service).await;
    app.go_to_page(3);
    app.settle().await;

    assert!(app.toggle_create_form());
    assert_eq!(app.view().create_toggle_label, "Cancel");
    let form = app.form_mut().unwrap();
    form.set_title("Fresh note");
    form.set_tag(NoteTag::Work);

    let created = app.submit_form().await.unwrap();
    let view = app.view();
    assert!(view.form.is_none());
    assert_eq!(view.create_toggle_label, "Create note +");
    assert_eq!(view.current_page, 1);
    assert_eq!(view.notes[0].id, created.id);
    assert_eq!(view.notes[0].tag, NoteTag::Work);
    assert_eq!(view.total_pages, 3);
    let first_page = app.cache().snapshot(&QueryKey::notes(1, "")).data.unwrap();
    assert_lists(&first_page, &created.id);

    assert_eq!(service.create_calls().len(), 1);
    assert!(app.cache().snapshot(&QueryKey::notes(3, "")).is_invalidated);
}

#[tokio::test(start_paused = true)]
async fn invalid_draft_never_reaches_service() {
    let service = MockNoteService::with_notes(sample_notes(3)).into_arc();
    let mut app = loaded(&service).await;
    app.toggle_create_form();
    let form = app.form_mut().unwrap();
    form.set_title("ab");
    form.set_content("x".repeat(501));

    match app.submit_form().await {
        Err(SubmitError::Invalid(errors)) => {
            assert!(errors.contains(Field::Title));
            assert!(errors.contains(Field::Content));
        }
        other => panic!("expected validation errors, got {:?}", other),
    }
    assert!(service.create_calls().is_empty());

    let form = app.view().form.unwrap();
    assert_eq!(form.errors["title"], "Title must be at least 3 characters");
    assert_eq!(form.errors["content"], "Content must be at most 500 characters");
}

#[tokio::test(start_paused = true)]
async fn submit_without_form_is_rejected() {
    let service = MockNoteService::new().into_arc();
    let mut app = loaded(&service).await;
    assert_eq!(app.submit_form().await, Err(SubmitError::NoForm));
}

#[tokio::test(start_paused = true)]
async fn create_failure_stays_on_the_form() {
    let service = MockNoteService::with_notes(sample_notes(3)).into_arc();
    let mut app = loaded(&service).await;
    let fetches = service.fetch_count();

    service.fail_next_creates(1);
    app.toggle_create_form();
    app.form_mut().unwrap().set_title("Will fail");

    let err = app.submit_form().await.unwrap_err();
    assert_eq!(
        err,
        SubmitError::Mutation(MutationError::Create(ServiceError::api(400, "Bad Request")))
    );

    let view = app.view();
    let form = view.form.clone().unwrap();
    assert_eq!(
        form.create_error.as_deref(),
        Some("Failed to create note: HTTP 400: Bad Request")
    );
    assert_eq!(form.submit_label, "Create note");
    assert_eq!(view.error_banner, None);
    assert_eq!(service.fetch_count(), fetches);
    assert_eq!(service.create_calls().len(), 1);

    // Resubmitting the same draft succeeds.
    app.submit_form().await.unwrap();
    assert!(app.view().form.is_none());
    assert_eq!(app.view().notes.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn submit_control_disabled_while_creating() {
    let service = MockNoteService::with_notes(sample_notes(3)).into_arc();
    let mut app = loaded(&service).await;
    service.set_latency(ms(200));
    app.toggle_create_form();
    app.form_mut().unwrap().set_title("Slow note");

    let pending = app.begin_submit().unwrap();
    let (response, during) = tokio::join!(pending.send(), async {
        tokio::time::sleep(ms(50)).await;
        app.view()
    });

    let form = during.form.unwrap();
    assert_eq!(form.submit_label, "Creating...");
    assert!(form.submit_disabled);
    assert!(matches!(
        app.begin_submit(),
        Err(SubmitError::Mutation(MutationError::Busy("create")))
    ));

    app.finish_submit(response).await.unwrap();
    let after = app.view();
    assert!(after.form.is_none());
    assert!(!app.create_mutation().is_pending());
    assert_eq!(after.notes.len(), 4);
    assert_eq!(service.create_calls().len(), 1);
}

// ============================================================================
// DELETE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn deleted_note_leaves_the_listing() {
    let service = MockNoteService::with_notes(sample_notes(5)).into_arc();
    let app = loaded(&service).await;
    let id = NoteId::from("n3");
    assert!(ids(&app).contains(&"n3".to_string()));

    app.delete_note(id.clone()).await.unwrap();

    assert!(!ids(&app).contains(&"n3".to_string()));
    assert_eq!(app.view().notes.len(), 4);
    assert_eq!(service.delete_calls(), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn delete_controls_disabled_while_pending() {
    let service = MockNoteService::with_notes(sample_notes(5)).into_arc();
    let app = loaded(&service).await;
    service.set_latency(ms(200));

    let (result, during) = tokio::join!(app.delete_note(NoteId::from("n1")), async {
        tokio::time::sleep(ms(50)).await;
        app.view()
    });
    result.unwrap();

    assert_eq!(during.delete_label, "Deleting...");
    assert!(during.delete_disabled);
    let after = app.view();
    assert_eq!(after.delete_label, "Delete");
    assert!(!after.delete_disabled);
}

#[tokio::test(start_paused = true)]
async fn delete_failure_is_reported_without_touching_listing() {
    let service = MockNoteService::with_notes(sample_notes(5)).into_arc();
    let app = loaded(&service).await;
    service.fail_next_deletes(1);

    let err = app.delete_note(NoteId::from("n2")).await.unwrap_err();
    assert!(matches!(err, MutationError::Delete { ref id, .. } if id.as_str() == "n2"));

    let view = app.view();
    assert_eq!(
        view.delete_error.as_deref(),
        Some("Failed to delete note n2: HTTP 500: Internal Server Error")
    );
    assert_eq!(view.error_banner, None);
    assert!(ids(&app).contains(&"n2".to_string()));
    assert_eq!(service.delete_calls().len(), 1);
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Titles shorter than the minimum never produce a create call.
    #[test]
    fn prop_short_titles_never_submitted(title in "[a-z ]{0,2}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();
        runtime.block_on(async {
            let service = MockNoteService::new().into_arc();
            let mut app = loaded(&service).await;
            app.toggle_create_form();
            app.form_mut().unwrap().set_title(title.clone());
            let result = app.submit_form().await;
            prop_assert!(matches!(result, Err(SubmitError::Invalid(_))));
            prop_assert!(service.create_calls().is_empty());
            Ok(())
        })?;
    }
}

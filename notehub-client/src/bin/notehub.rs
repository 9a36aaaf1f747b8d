//! notehub interactive client entry point.

use notehub_cache::notes_cache;
use notehub_client::commands::{parse_command, Command, HELP};
use notehub_client::config::ClientConfig;
use notehub_client::error::{ClientError, SubmitError};
use notehub_client::telemetry::init_tracing;
use notehub_client::{NotesApp, RestNoteService};
use notehub_core::NoteService;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::load()?;
    init_tracing(&config.logging)?;

    let service: Arc<dyn NoteService> = Arc::new(RestNoteService::new(&config.api)?);
    let cache = notes_cache(Arc::clone(&service), config.cache_config());
    let gc = cache.spawn_gc(config.gc_interval());
    let mut app = NotesApp::new(service, cache.clone(), config.debounce());
    tracing::info!(base_url = %config.api.base_url, "notehub client started");

    let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
    spawn_input_reader(line_tx);

    app.sync();
    app.settle().await;
    println!("{}", app.view());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let deadline = app.next_deadline();
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if handle_command(&mut app, command).await {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => println!("{}", err),
                }
            }
            _ = sleep_until(deadline) => {
                if app.tick() {
                    app.settle().await;
                    println!("{}", app.view());
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    gc.abort();
    cache.clear();
    Ok(())
}

/// Sleep until the debounce deadline, or forever when nothing is pending.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn spawn_input_reader(sender: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.blocking_send(line).is_err() {
                break;
            }
        }
    });
}

/// Returns true when the loop should exit.
async fn handle_command(app: &mut NotesApp, command: Command) -> bool {
    match command {
        Command::Quit => return true,
        Command::Help => {
            println!("{}", HELP);
            return false;
        }
        Command::Search(term) => {
            app.set_search_term(term);
            return false;
        }
        Command::Page(page) => {
            if app.go_to_page(page) {
                app.settle().await;
            }
        }
        Command::NextPage => {
            let view = app.view();
            if view.current_page < view.total_pages && app.go_to_page(view.current_page + 1) {
                app.settle().await;
            }
        }
        Command::PrevPage => {
            let current = app.search().current_page();
            if current > 1 && app.go_to_page(current - 1) {
                app.settle().await;
            }
        }
        Command::NewNote => {
            if app.form().is_none() {
                app.toggle_create_form();
            }
        }
        Command::Cancel => app.close_form(),
        Command::Title(title) => match app.form_mut() {
            Some(form) => form.set_title(title),
            None => println!("No form open (use 'new')"),
        },
        Command::Content(content) => match app.form_mut() {
            Some(form) => form.set_content(content),
            None => println!("No form open (use 'new')"),
        },
        Command::Tag(tag) => match app.form_mut() {
            Some(form) => form.set_tag(tag),
            None => println!("No form open (use 'new')"),
        },
        Command::Submit => match app.begin_submit() {
            Ok(pending) => {
                println!("{}", app.view());
                let response = pending.send().await;
                match app.finish_submit(response).await {
                    Ok(note) => println!("Created note {}", note.id),
                    Err(err) => println!("{}", err),
                }
            }
            // Field errors are shown in the form itself.
            Err(SubmitError::Invalid(_)) => {}
            Err(err) => println!("{}", err),
        },
        Command::Delete(id) => {
            let show_pending = async {
                tokio::task::yield_now().await;
                println!("{}", app.view());
            };
            let (result, ()) = tokio::join!(app.delete_note(id), show_pending);
            if let Err(err) = result {
                tracing::debug!(error = %err, "Delete failed");
            }
        }
        Command::Dismiss => app.dismiss_error(),
        Command::Show => {}
    }
    println!("{}", app.view());
    false
}

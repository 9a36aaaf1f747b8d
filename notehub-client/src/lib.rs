//! notehub client
//!
//! Everything between the remote notes service and a front end: the
//! REST transport, configuration, logging setup, the debounced search
//! and pagination controller, the create form, the create and delete
//! mutations and the listing state they feed.

pub mod api_client;
pub mod app;
pub mod commands;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod form;
pub mod mutation;
pub mod telemetry;

pub use api_client::{ApiClientError, RestNoteService};
pub use app::{CreateResponse, FormView, ListingView, NotesApp, PendingCreate};
pub use commands::{parse_command, Command, CommandError};
pub use config::{ClientConfig, ConfigError};
pub use controller::{SearchController, SEARCH_DEBOUNCE};
pub use debounce::Debouncer;
pub use error::{ClientError, SubmitError};
pub use form::NoteForm;
pub use mutation::{Mutation, MutationSpec, MutationState, MutationTicket};

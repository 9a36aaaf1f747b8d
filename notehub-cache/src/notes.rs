//! Note listing queries.

use std::sync::Arc;

use async_trait::async_trait;
use notehub_core::{NoteService, Page, QueryKey, ServiceResult, PER_PAGE};

use crate::config::CacheConfig;
use crate::query_cache::QueryCache;
use crate::traits::QueryFetcher;

/// Cache of note listing pages keyed by `("notes", page, search)`.
pub type NotesCache = QueryCache<QueryKey, Page>;

/// Fetches listing pages from a [`NoteService`].
pub struct NotePageFetcher {
    service: Arc<dyn NoteService>,
    per_page: u32,
}

impl NotePageFetcher {
    pub fn new(service: Arc<dyn NoteService>) -> Self {
        Self {
            service,
            per_page: PER_PAGE,
        }
    }
}

#[async_trait]
impl QueryFetcher<QueryKey, Page> for NotePageFetcher {
    async fn fetch(&self, key: &QueryKey) -> ServiceResult<Page> {
        let params = key.to_params(self.per_page);
        self.service.fetch_notes(&params).await
    }
}

/// Build the notes cache over `service`.
pub fn notes_cache(service: Arc<dyn NoteService>, config: CacheConfig) -> NotesCache {
    QueryCache::new(Arc::new(NotePageFetcher::new(service)), config)
}

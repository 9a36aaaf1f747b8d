//! Search and pagination state for the listing.
//!
//! The raw search term changes on every keystroke; the listing only ever
//! queries with the debounced term. Whenever the debounced term changes,
//! the page goes back to 1, so a new search never lands on page N of the
//! old results.

use crate::debounce::Debouncer;
use notehub_core::QueryKey;
use std::time::Duration;
use tokio::time::Instant;

/// Quiet period before a search term is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct SearchController {
    search_term: String,
    debounced: Debouncer<String>,
    current_page: u32,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            search_term: String::new(),
            debounced: Debouncer::new(String::new(), debounce),
            current_page: 1,
        }
    }

    /// Raw input, as typed.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Term used for queries.
    pub fn debounced_search(&self) -> &str {
        self.debounced.value()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn set_search_term(&mut self, term: impl Into<String>, now: Instant) {
        self.search_term = term.into();
        self.debounced.push(self.search_term.clone(), now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounced.deadline()
    }

    /// Apply the pending search term if it is due. Returns true when the
    /// debounced term changed, in which case the page is reset to 1.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(search) = self.debounced.poll(now) else {
            return false;
        };
        tracing::debug!(search = %search, previous_page = self.current_page, "Search term applied");
        self.current_page = 1;
        true
    }

    /// Move to `page` (at least 1). Returns true when the page changed.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn reset_page(&mut self) -> bool {
        self.set_page(1)
    }

    /// Key of the listing page currently shown.
    pub fn active_key(&self) -> QueryKey {
        QueryKey::notes(self.current_page, self.debounced_search())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_debounced_change_resets_page() {
        let start = Instant::now();
        let mut controller = SearchController::default();
        controller.set_page(3);

        controller.set_search_term("meet", start);
        assert_eq!(controller.search_term(), "meet");
        assert_eq!(controller.debounced_search(), "");
        assert!(!controller.tick(start + ms(499)));
        assert_eq!(controller.current_page(), 3);

        assert!(controller.tick(start + ms(500)));
        assert_eq!(controller.current_page(), 1);
        assert_eq!(controller.active_key(), QueryKey::notes(1, "meet"));
    }

    #[test]
    fn test_clearing_search_also_resets_page() {
        let start = Instant::now();
        let mut controller = SearchController::default();
        controller.set_search_term("x", start);
        assert!(controller.tick(start + SEARCH_DEBOUNCE));
        controller.set_page(4);

        controller.set_search_term("", start + ms(1_000));
        assert!(controller.tick(start + ms(1_500)));
        assert_eq!(controller.current_page(), 1);
        assert_eq!(controller.active_key(), QueryKey::notes(1, ""));
    }

    #[test]
    fn test_page_is_at_least_one() {
        let mut controller = SearchController::default();
        assert!(!controller.set_page(0));
        assert_eq!(controller.current_page(), 1);
        assert!(controller.set_page(2));
        assert!(controller.reset_page());
    }
}

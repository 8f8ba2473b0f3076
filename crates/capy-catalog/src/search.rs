//! Debounced search: collapses keystroke bursts into one backend query and
//! materializes the backend's answer against the installed list.

use crate::debounce::Debounce;
use crate::item::ItemInfo;
use std::time::{Duration, Instant};

/// Search results as seen by the presentation layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SearchState {
    /// No search has completed yet.
    #[default]
    NotRun,
    /// Completed search. May be empty ("no results").
    Results(Vec<ItemInfo>),
}

#[derive(Debug)]
pub struct SearchSession {
    pending_query: String,
    /// Set by the first `request`; until then there is nothing to re-run.
    requested: bool,
    timer: Debounce,
    state: SearchState,
}

impl SearchSession {
    pub fn new(delay: Duration) -> Self {
        Self {
            pending_query: String::new(),
            requested: false,
            timer: Debounce::new(delay),
            state: SearchState::NotRun,
        }
    }

    /// Replace the pending query and restart the debounce timer.
    pub fn request(&mut self, query: &str, now: Instant) {
        self.pending_query = query.to_string();
        self.requested = true;
        self.timer.schedule(now);
    }

    /// Re-run the current query, e.g. after the installed list changed.
    /// No-op before the first request.
    pub fn restart(&mut self, now: Instant) {
        if self.requested {
            self.timer.schedule(now);
        }
    }

    /// The query to dispatch, if the debounce window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        self.timer
            .fire_if_due(now)
            .then(|| self.pending_query.clone())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn pending_query(&self) -> &str {
        &self.pending_query
    }

    /// Resolve backend result keys against `installed`, keeping backend order.
    /// Unknown keys are dropped.
    pub fn complete(&mut self, keys: &[String], installed: &[ItemInfo]) -> &SearchState {
        let results = keys
            .iter()
            .filter_map(|key| installed.iter().find(|i| &i.key == key))
            .cloned()
            .collect();
        self.state = SearchState::Results(results);
        &self.state
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn results(&self) -> &[ItemInfo] {
        match &self.state {
            SearchState::NotRun => &[],
            SearchState::Results(items) => items.as_slice(),
        }
    }

    /// True after a completed search that matched nothing.
    pub fn is_empty_result(&self) -> bool {
        matches!(&self.state, SearchState::Results(items) if items.is_empty())
    }
}

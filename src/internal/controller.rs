//! Query state machine behind the article list.
//!
//! The controller owns the query, the accumulated articles and the view state.
//! It never performs I/O: every user action returns a [`FetchRequest`] that the
//! caller runs, and the result comes back through [`Controller::complete`].
//! Each request carries a generation number; only the completion matching the
//! latest generation is applied, so an older response that arrives late is
//! dropped (last write wins).

use strum_macros::Display;

use super::models::{Article, PageOutcome, QueryMode, QueryState};
use super::store::ArticleStore;
use crate::api::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Empty,
    Error,
}

/// A page fetch the caller must run and report back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub query: QueryState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result belonged to the current request and moved the state machine.
    Applied(ViewState),
    /// The result belonged to a superseded request and was discarded.
    Stale,
}

#[derive(Debug)]
pub struct Controller {
    query: QueryState,
    store: ArticleStore,
    state: ViewState,
    generation: u64,
    in_flight: Option<FetchRequest>,
    clear_visible: bool,
    last_error: Option<String>,
    page_size: u32,
}

impl Controller {
    pub fn new(page_size: u32) -> Self {
        Self {
            query: QueryState::headlines(page_size),
            store: ArticleStore::new(),
            state: ViewState::Idle,
            generation: 0,
            in_flight: None,
            clear_visible: false,
            last_error: None,
            page_size,
        }
    }

    /// Initial load: first page of headlines.
    pub fn start(&mut self) -> FetchRequest {
        self.query = QueryState::headlines(self.page_size);
        self.store.reset();
        self.issue(self.query.clone())
    }

    /// Search for the trimmed input. An input that is blank after trimming
    /// falls back to headlines, since a search needs a term.
    pub fn submit_search(&mut self, input: &str) -> FetchRequest {
        let term = input.trim();
        if term.is_empty() {
            return self.clear_search();
        }

        self.query = QueryState::search(term, self.page_size);
        self.store.reset();
        self.clear_visible = true;
        self.issue(self.query.clone())
    }

    /// Drop the search term and rerun the initial load.
    pub fn clear_search(&mut self) -> FetchRequest {
        self.clear_visible = false;
        self.start()
    }

    /// Next page of the current query, appended to the list.
    ///
    /// Returns `None` while a request is in flight or when the "more"
    /// affordance is hidden. The page cursor only advances once the page
    /// arrives, so a failed load-more can be retried.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.state == ViewState::Loading || !self.store.show_more() {
            return None;
        }
        Some(self.issue(self.query.next_page()))
    }

    /// Refetch the first page of the current query.
    pub fn reload(&mut self) -> FetchRequest {
        self.query.page = 1;
        self.store.reset();
        self.issue(self.query.clone())
    }

    fn issue(&mut self, query: QueryState) -> FetchRequest {
        self.generation += 1;
        self.state = ViewState::Loading;

        let request = FetchRequest {
            generation: self.generation,
            query,
        };
        if let Some(previous) = self.in_flight.replace(request.clone()) {
            tracing::debug!(
                superseded = previous.generation,
                by = request.generation,
                "request superseded"
            );
        }
        tracing::info!(
            generation = request.generation,
            mode = %request.query.mode,
            page = request.query.page,
            "issuing page request"
        );
        request
    }

    /// Apply the result of the request with the given generation.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<PageOutcome, FetchError>,
    ) -> Completion {
        let Some(request) = self.in_flight.take_if(|r| r.generation == generation) else {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale response"
            );
            return Completion::Stale;
        };

        self.state = match result {
            Ok(PageOutcome::Articles {
                articles,
                total_results,
            }) => {
                self.query = request.query;
                self.store.append(articles, total_results);
                self.last_error = None;
                ViewState::Loaded
            }
            Ok(PageOutcome::Empty { .. }) => {
                self.query = request.query;
                self.store.reset();
                self.last_error = None;
                ViewState::Empty
            }
            Err(e) => {
                tracing::error!(kind = %e.kind(), error = %e, "page request failed");
                self.last_error = Some(e.user_message());
                ViewState::Error
            }
        };

        Completion::Applied(self.state)
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn mode(&self) -> QueryMode {
        self.query.mode
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub fn articles(&self) -> &[Article] {
        self.store.articles()
    }

    pub fn show_more(&self) -> bool {
        self.store.show_more()
    }

    pub fn clear_visible(&self) -> bool {
        self.clear_visible
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

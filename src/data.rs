use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use parking_lot::Mutex;

use crate::mastodon::{self, SearchOptions};

/// The three reads the comment section needs from an instance.
pub trait StatusService: Send + Sync {
    fn status(&self, id: &str) -> Result<mastodon::Status>;
    fn context(&self, id: &str) -> Result<mastodon::Context>;
    fn search_statuses(&self, query: &str, opts: SearchOptions) -> Result<Vec<mastodon::Status>>;
}

pub struct MastodonStatusService {
    client: Arc<mastodon::Client>,
}

impl MastodonStatusService {
    pub fn new(client: Arc<mastodon::Client>) -> Self {
        Self { client }
    }
}

impl StatusService for MastodonStatusService {
    fn status(&self, id: &str) -> Result<mastodon::Status> {
        self.client.status(id)
    }

    fn context(&self, id: &str) -> Result<mastodon::Context> {
        self.client.context(id)
    }

    fn search_statuses(&self, query: &str, opts: SearchOptions) -> Result<Vec<mastodon::Status>> {
        self.client.search_statuses(query, opts)
    }
}

/// In-memory instance used for offline runs and tests.
#[derive(Default)]
pub struct MockStatusService {
    statuses: HashMap<String, mastodon::Status>,
    contexts: HashMap<String, mastodon::Context>,
    search_results: Vec<mastodon::Status>,
    fail_search: bool,
    fail_context: bool,
    calls: Mutex<Vec<String>>,
}

impl MockStatusService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread(mut self, status: mastodon::Status, descendants: Vec<mastodon::Status>) -> Self {
        self.contexts.insert(
            status.id.clone(),
            mastodon::Context {
                ancestors: Vec::new(),
                descendants,
            },
        );
        self.statuses.insert(status.id.clone(), status);
        self
    }

    pub fn with_search_results(mut self, results: Vec<mastodon::Status>) -> Self {
        self.search_results = results;
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_context(mut self) -> Self {
        self.fail_context = true;
        self
    }

    /// Every call made so far, as `method:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, method: &str, arg: &str) {
        self.calls.lock().push(format!("{method}:{arg}"));
    }
}

impl StatusService for MockStatusService {
    fn status(&self, id: &str) -> Result<mastodon::Status> {
        self.record("status", id);
        self.statuses
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("mock: status {} not found", id))
    }

    fn context(&self, id: &str) -> Result<mastodon::Context> {
        self.record("context", id);
        if self.fail_context {
            bail!("mock: context unavailable");
        }
        self.contexts
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("mock: context {} not found", id))
    }

    fn search_statuses(&self, query: &str, opts: SearchOptions) -> Result<Vec<mastodon::Status>> {
        self.record("search", query);
        if self.fail_search {
            bail!("mock: search unavailable");
        }
        Ok(self
            .search_results
            .iter()
            .take(opts.limit as usize)
            .cloned()
            .collect())
    }
}

//! Searchable, filterable list state shared by every resource page.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fleetdesk_client::{ApiClient, Query, Resource};
use tokio::sync::Mutex;
use tracing::debug;

use crate::notice::Notices;
use crate::record::Record;
use crate::stream::{Generation, RequestStream};

/// Result of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Rows replaced; carries the new row count.
    Applied(usize),
    /// A newer request took over; nothing was applied.
    Superseded,
    /// The request failed; previous rows are still displayed.
    Failed(String),
}

/// Count of list requests still outstanding.
#[derive(Debug, Clone, Default)]
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.0.clone())
    }

    fn active(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

/// Leaves the in-flight count on drop, so a refresh future dropped
/// mid-request does not leave the list loading.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Displayed rowset plus the search/filter inputs that produced it.
#[derive(Debug)]
pub struct ListView<R> {
    rows: Vec<R>,
    search: String,
    filters: BTreeMap<String, String>,
    loading: InFlight,
}

impl<R> Default for ListView<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            search: String::new(),
            filters: BTreeMap::new(),
            loading: InFlight::default(),
        }
    }
}

impl<R: Record> ListView<R> {
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn row(&self, id: i64) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    /// True while a list request for this view is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading.active()
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    /// Set one equality filter. An empty value removes the key.
    pub fn set_filter(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            self.filters.remove(name);
        } else {
            self.filters.insert(name.to_string(), value.to_string());
        }
    }

    pub fn reset_filters(&mut self) {
        self.filters.clear();
    }

    /// Number of active filters (the filter button badge).
    pub fn active_filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Outgoing query: `search` first, then filters in key order.
    pub fn query(&self) -> Query {
        Query::new().search(&self.search).filters(&self.filters)
    }

    /// Replace the rowset wholesale.
    pub fn replace(&mut self, rows: Vec<R>) {
        self.rows = rows;
    }
}

/// State container that owns a [`ListView`] and a notice queue.
pub trait ListHost<R> {
    fn list_mut(&mut self) -> &mut ListView<R>;
    fn notices_mut(&mut self) -> &mut Notices;
    /// Notice text used when the failure carries no server message.
    fn fetch_failure(&self) -> String;
}

/// Fetch `resource` with the host's current query and apply the response
/// if `generation` is still the latest of `stream`.
pub(crate) async fn fetch_into<R, H>(
    client: &ApiClient,
    resource: Resource,
    stream: &RequestStream,
    host: &Mutex<H>,
    generation: Generation,
) -> RefreshOutcome
where
    R: Record,
    H: ListHost<R>,
{
    let (query, _in_flight) = {
        let mut host = host.lock().await;
        let list = host.list_mut();
        (list.query(), list.loading.enter())
    };
    debug!(%resource, %query, generation = generation.get(), "list refresh");

    let result = match client.list(resource, &query).await {
        Ok(env) => env.data_as::<Vec<R>>(),
        Err(e) => Err(e),
    };

    let mut host = host.lock().await;
    if !stream.is_current(generation) {
        debug!(%resource, generation = generation.get(), "discarding stale list response");
        return RefreshOutcome::Superseded;
    }
    match result {
        Ok(rows) => {
            let n = rows.len();
            host.list_mut().replace(rows);
            RefreshOutcome::Applied(n)
        }
        Err(e) => {
            let message = e.message_or(&host.fetch_failure());
            host.notices_mut().error(message.clone());
            RefreshOutcome::Failed(message)
        }
    }
}

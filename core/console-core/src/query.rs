//! URL-synchronized pagination state for list pages.
//!
//! Each list page owns one [`QuerySynchronizer`]. It keeps three things
//! consistent without feeding back into itself:
//!
//! - the location's `page` query parameter,
//! - the descriptor's `page`,
//! - the descriptor's `filter` versus the [`FilterStore`] serialization.
//!
//! # Fetch Discipline
//!
//! Every settled change to the descriptor bumps a revision. [`QuerySynchronizer::next_fetch`]
//! hands out at most one [`FetchTicket`] per revision, so unrelated calls never
//! trigger a fetch. Responses carry their ticket back; a response for a
//! superseded revision is ignored.
//!
//! ```text
//! filter change ──► {filter: B, page: 1} + URL page=1 ──► revision+1 ──► fetch
//! page request  ──► range check ──► {page: n} + URL page=n ──► revision+1 ──► fetch
//! response      ──► total_page recorded, page corrected in memory (no fetch)
//! ```

use std::collections::BTreeMap;

use console_api::{ListMeta, FILTER_PARAM, LIMIT_PARAM, PAGE_PARAM};
use serde::Serialize;
use url::Url;

use crate::filters::FilterStore;
use crate::navigation::{page_from_url, Navigator};

/// The `{page, limit, filter}` triple a list page requests, plus static extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl PaginationQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            filter: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            (PAGE_PARAM.to_string(), self.page.to_string()),
            (LIMIT_PARAM.to_string(), self.limit.to_string()),
        ];
        if let Some(filter) = &self.filter {
            pairs.push((FILTER_PARAM.to_string(), filter.clone()));
        }
        for (key, value) in &self.extra {
            if key != PAGE_PARAM && key != LIMIT_PARAM && key != FILTER_PARAM {
                pairs.push((key.clone(), value.clone()));
            }
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_pairs())
            .finish()
    }
}

/// Permission to fetch one descriptor revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    revision: u64,
    pub query: PaginationQuery,
}

impl FetchTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Accepted,
    /// Already on the requested page.
    Unchanged,
    /// Outside `[1, total_page]`; nothing changed.
    Rejected,
}

#[derive(Debug)]
pub struct QuerySynchronizer {
    category: String,
    query: PaginationQuery,
    total_page: Option<u32>,
    /// Last `page` seen in or written to the location.
    location_page: u32,
    revision: u64,
    settled_revision: u64,
    in_flight: Option<u64>,
}

impl QuerySynchronizer {
    /// Seeds the descriptor from the location's `page` and the category's
    /// current filters. The seeded descriptor is immediately fetchable.
    pub fn mount(category: &str, limit: u32, location: &Url, filters: &FilterStore) -> Self {
        let location_page = page_from_url(location);
        let mut query = PaginationQuery::new(location_page, limit);
        query.filter = filters.serialized(category);
        tracing::debug!(category = %category, page = query.page, "Query mounted");

        Self {
            category: category.to_string(),
            query,
            total_page: None,
            location_page,
            revision: 1,
            settled_revision: 0,
            in_flight: None,
        }
    }

    /// Adds a static query field sent with every fetch.
    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.query.extra.insert(key.to_string(), value.to_string());
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn query(&self) -> &PaginationQuery {
        &self.query
    }

    /// Last `total_page` reported by the server.
    pub fn total_page(&self) -> Option<u32> {
        self.total_page
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Adopts a changed filter serialization, resetting `page` to 1 in the
    /// descriptor and the location together. Returns whether anything changed.
    pub fn sync_filters(&mut self, filters: &FilterStore, navigator: &dyn Navigator) -> bool {
        let serialized = filters.serialized(&self.category);
        if serialized == self.query.filter {
            return false;
        }

        tracing::debug!(
            category = %self.category,
            previous_page = self.query.page,
            "Filters changed, resetting to first page"
        );
        self.query.filter = serialized;
        self.query.page = 1;
        if page_from_url(&navigator.location()) != 1 {
            navigator.replace_query_param(PAGE_PARAM, "1");
        }
        self.location_page = 1;
        self.bump();
        true
    }

    /// Handles an explicit page change from the user.
    pub fn request_page(&mut self, page: u32, navigator: &dyn Navigator) -> PageRequest {
        if !self.in_range(page) {
            tracing::debug!(
                category = %self.category,
                requested = page,
                total_page = ?self.total_page,
                "Rejected out-of-range page"
            );
            return PageRequest::Rejected;
        }
        if page == self.query.page {
            return PageRequest::Unchanged;
        }

        self.query.page = page;
        navigator.replace_query_param(PAGE_PARAM, &page.to_string());
        self.location_page = page;
        self.bump();
        PageRequest::Accepted
    }

    /// Adopts a `page` changed outside the synchronizer (back/forward
    /// navigation). Returns whether the descriptor changed.
    ///
    /// Only a location page that differs from the last one seen counts as a
    /// change, so a page the server corrected in memory is not re-adopted from
    /// the unchanged location. Out-of-range pages are ignored.
    pub fn sync_location(&mut self, location: &Url) -> bool {
        let page = page_from_url(location);
        if page == self.location_page {
            return false;
        }
        self.location_page = page;

        if !self.in_range(page) {
            tracing::debug!(
                category = %self.category,
                requested = page,
                total_page = ?self.total_page,
                "Ignoring out-of-range location page"
            );
            return false;
        }
        if page == self.query.page {
            return false;
        }
        self.query.page = page;
        self.bump();
        true
    }

    /// Requests a fresh fetch of the current descriptor.
    pub fn reload(&mut self) {
        self.bump();
    }

    /// Returns a ticket if the current revision has not been fetched or
    /// handed out yet.
    pub fn next_fetch(&mut self) -> Option<FetchTicket> {
        if self.settled_revision == self.revision || self.in_flight == Some(self.revision) {
            return None;
        }
        self.in_flight = Some(self.revision);
        Some(FetchTicket {
            revision: self.revision,
            query: self.query.clone(),
        })
    }

    /// Applies the server's pagination metadata. Returns false for a
    /// superseded ticket.
    pub fn on_fetch_success(&mut self, ticket: &FetchTicket, meta: &ListMeta) -> bool {
        if !self.settle(ticket) {
            return false;
        }

        self.total_page = Some(meta.total_page);
        if meta.page >= 1 && meta.page != self.query.page {
            tracing::debug!(
                category = %self.category,
                requested = self.query.page,
                confirmed = meta.page,
                "Server corrected page"
            );
            self.query.page = meta.page;
        }
        true
    }

    /// Settles a failed fetch. The descriptor is left as is and no retry is
    /// scheduled; call [`QuerySynchronizer::reload`] to try again.
    pub fn on_fetch_failure(&mut self, ticket: &FetchTicket) -> bool {
        self.settle(ticket)
    }

    fn settle(&mut self, ticket: &FetchTicket) -> bool {
        if ticket.revision != self.revision {
            tracing::debug!(
                category = %self.category,
                ticket = ticket.revision,
                current = self.revision,
                "Ignoring response for superseded query"
            );
            return false;
        }
        self.settled_revision = ticket.revision;
        self.in_flight = None;
        true
    }

    /// `[1, total_page]`, where an empty result set (`total_page == 0`) still
    /// has page 1. Before the first response only the lower bound applies.
    fn in_range(&self, page: u32) -> bool {
        page >= 1 && self.total_page.map_or(true, |total| page <= total.max(1))
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterValue;
    use crate::navigation::MemoryNavigator;

    fn meta(page: u32, total_page: u32) -> ListMeta {
        ListMeta {
            page,
            total_page,
            total: None,
        }
    }

    fn mounted(location: &str, filters: &FilterStore) -> (QuerySynchronizer, MemoryNavigator) {
        let navigator = MemoryNavigator::parse(location).unwrap();
        let sync = QuerySynchronizer::mount("orders", 20, &navigator.location(), filters);
        (sync, navigator)
    }

    #[test]
    fn test_mount_reads_page_from_location() {
        let filters = FilterStore::new();
        let (sync, _) = mounted("http://console.local/orders?page=4", &filters);
        assert_eq!(sync.query().page, 4);
        assert_eq!(sync.query().limit, 20);
        assert_eq!(sync.query().filter, None);
    }

    #[test]
    fn test_mount_defaults_to_first_page() {
        let filters = FilterStore::new();
        let (sync, _) = mounted("http://console.local/orders", &filters);
        assert_eq!(sync.query().page, 1);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut filters = FilterStore::new();
        filters.set_filter("orders", "status", Some("paid".into()));
        let (mut sync, navigator) = mounted("http://console.local/orders?page=5", &filters);
        assert_eq!(sync.query().page, 5);

        filters.set_filter("orders", "status", Some("failed".into()));
        assert!(sync.sync_filters(&filters, &navigator));

        assert_eq!(sync.query().page, 1);
        assert_eq!(
            sync.query().filter.as_deref(),
            Some(r#"{"status":"failed"}"#)
        );
        assert_eq!(page_from_url(&navigator.location()), 1);
        assert_eq!(navigator.history_len(), 1);
    }

    #[test]
    fn test_unchanged_filters_do_not_touch_state() {
        let mut filters = FilterStore::new();
        filters.set_filter("orders", "status", Some("paid".into()));
        let (mut sync, navigator) = mounted("http://console.local/orders?page=3", &filters);
        let revision = sync.revision();

        filters.set_filter("orders", "status", Some("paid".into()));
        assert!(!sync.sync_filters(&filters, &navigator));
        assert_eq!(sync.query().page, 3);
        assert_eq!(sync.revision(), revision);
        assert_eq!(navigator.replace_count(), 0);
    }

    #[test]
    fn test_other_category_changes_are_ignored() {
        let mut filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=3", &filters);

        filters.set_filter("merchants", "status", Some(FilterValue::from("active")));
        assert!(!sync.sync_filters(&filters, &navigator));
        assert_eq!(sync.query().page, 3);
    }

    #[test]
    fn test_out_of_range_page_is_rejected() {
        let filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=2", &filters);
        let ticket = sync.next_fetch().unwrap();
        sync.on_fetch_success(&ticket, &meta(2, 3));

        assert_eq!(sync.request_page(5, &navigator), PageRequest::Rejected);
        assert_eq!(sync.request_page(0, &navigator), PageRequest::Rejected);
        assert_eq!(sync.query().page, 2);
        assert_eq!(navigator.replace_count(), 0);
        assert!(sync.next_fetch().is_none());
    }

    #[test]
    fn test_page_request_updates_location_with_replace() {
        let filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders", &filters);
        let ticket = sync.next_fetch().unwrap();
        sync.on_fetch_success(&ticket, &meta(1, 3));

        assert_eq!(sync.request_page(3, &navigator), PageRequest::Accepted);
        assert_eq!(sync.query().page, 3);
        assert_eq!(page_from_url(&navigator.location()), 3);
        assert_eq!(navigator.history_len(), 1);

        assert_eq!(sync.request_page(3, &navigator), PageRequest::Unchanged);
        assert_eq!(navigator.replace_count(), 1);
    }

    #[test]
    fn test_one_ticket_per_revision() {
        let filters = FilterStore::new();
        let (mut sync, _) = mounted("http://console.local/orders", &filters);

        let ticket = sync.next_fetch().unwrap();
        assert!(sync.next_fetch().is_none());
        sync.on_fetch_success(&ticket, &meta(1, 1));
        assert!(sync.next_fetch().is_none());

        sync.reload();
        assert!(sync.next_fetch().is_some());
    }

    #[test]
    fn test_server_page_correction_does_not_refetch() {
        let filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=9", &filters);

        let ticket = sync.next_fetch().unwrap();
        assert!(sync.on_fetch_success(&ticket, &meta(4, 4)));

        assert_eq!(sync.query().page, 4);
        assert_eq!(sync.total_page(), Some(4));
        assert!(sync.next_fetch().is_none());
        assert_eq!(navigator.replace_count(), 0);
    }

    #[test]
    fn test_superseded_response_is_ignored() {
        let mut filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=2", &filters);

        let stale = sync.next_fetch().unwrap();
        filters.set_filter("orders", "status", Some("paid".into()));
        sync.sync_filters(&filters, &navigator);
        let fresh = sync.next_fetch().unwrap();

        assert!(!sync.on_fetch_success(&stale, &meta(2, 10)));
        assert_eq!(sync.query().page, 1);
        assert_eq!(sync.total_page(), None);

        assert!(sync.on_fetch_success(&fresh, &meta(1, 2)));
        assert_eq!(sync.total_page(), Some(2));
    }

    #[test]
    fn test_failure_settles_without_retry() {
        let filters = FilterStore::new();
        let (mut sync, _) = mounted("http://console.local/orders?page=2", &filters);

        let ticket = sync.next_fetch().unwrap();
        assert!(sync.on_fetch_failure(&ticket));
        assert_eq!(sync.query().page, 2);
        assert!(sync.next_fetch().is_none());
    }

    #[test]
    fn test_external_navigation_is_adopted() {
        let filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=2", &filters);
        let ticket = sync.next_fetch().unwrap();
        sync.on_fetch_success(&ticket, &meta(2, 5));

        navigator.push("/orders?page=4");
        assert!(sync.sync_location(&navigator.location()));
        assert_eq!(sync.query().page, 4);
        assert!(sync.next_fetch().is_some());
    }

    #[test]
    fn test_corrected_page_is_not_readopted_from_location() {
        let filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=9", &filters);

        for _ in 0..3 {
            if let Some(ticket) = sync.next_fetch() {
                sync.on_fetch_success(&ticket, &meta(4, 4));
            }
            assert!(!sync.sync_location(&navigator.location()));
            assert_eq!(sync.query().page, 4);
            assert!(sync.next_fetch().is_none());
        }
    }

    #[test]
    fn test_out_of_range_location_page_is_ignored() {
        let filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=2", &filters);
        let ticket = sync.next_fetch().unwrap();
        sync.on_fetch_success(&ticket, &meta(2, 3));
        let revision = sync.revision();

        navigator.push("/orders?page=99");
        assert!(!sync.sync_location(&navigator.location()));
        assert_eq!(sync.query().page, 2);
        assert_eq!(sync.revision(), revision);
        assert!(sync.next_fetch().is_none());
    }

    #[test]
    fn test_empty_result_set_still_allows_first_page() {
        let filters = FilterStore::new();
        let (mut sync, navigator) = mounted("http://console.local/orders?page=2", &filters);
        let ticket = sync.next_fetch().unwrap();
        sync.on_fetch_success(&ticket, &meta(2, 0));

        assert_eq!(sync.request_page(1, &navigator), PageRequest::Accepted);
        assert_eq!(sync.query().page, 1);
        assert_eq!(sync.request_page(2, &navigator), PageRequest::Rejected);
    }

    #[test]
    fn test_query_string_encodes_filter_and_extras() {
        let mut query = PaginationQuery::new(2, 25);
        query.filter = Some(r#"{"status":"paid"}"#.to_string());
        query.extra.insert("sort".to_string(), "created_at".to_string());

        assert_eq!(
            query.to_query_string(),
            "page=2&limit=25&filter=%7B%22status%22%3A%22paid%22%7D&sort=created_at"
        );
    }

    #[test]
    fn test_query_string_omits_empty_filter() {
        let query = PaginationQuery::new(1, 10);
        assert_eq!(query.to_query_string(), "page=1&limit=10");
    }
}

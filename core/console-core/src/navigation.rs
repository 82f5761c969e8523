//! Navigable location seam.
//!
//! The session manager forces navigation to the sign-in route; the query
//! synchronizer reads and rewrites the `page` parameter. Both go through
//! [`Navigator`], which hosts back with their real history API.

use std::sync::Mutex;

use console_api::PAGE_PARAM;
use url::Url;

use crate::error::{ConsoleError, Result};

pub trait Navigator {
    fn location(&self) -> Url;

    /// Navigates to `route`, adding a history entry.
    fn push(&self, route: &str);

    /// Rewrites one query parameter in place without adding a history entry.
    fn replace_query_param(&self, key: &str, value: &str);
}

/// Reads the 1-based `page` parameter. Absent, zero, or unparsable means 1.
pub fn page_from_url(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Returns true if `url` already points at `route` (trailing slashes ignored).
pub fn is_at_route(url: &Url, route: &str) -> bool {
    let route_path = route.split('?').next().unwrap_or(route);
    normalize_path(url.path()) == normalize_path(route_path)
}

fn normalize_path(path: &str) -> &str {
    if path == "/" {
        path
    } else {
        path.trim_end_matches('/')
    }
}

#[derive(Debug)]
struct NavState {
    location: Url,
    history: Vec<Url>,
    replace_count: usize,
}

/// In-process navigator keeping a history stack.
#[derive(Debug)]
pub struct MemoryNavigator {
    state: Mutex<NavState>,
}

impl MemoryNavigator {
    pub fn new(location: Url) -> Self {
        Self {
            state: Mutex::new(NavState {
                history: vec![location.clone()],
                location,
                replace_count: 0,
            }),
        }
    }

    pub fn parse(location: &str) -> Result<Self> {
        let url = Url::parse(location).map_err(|err| ConsoleError::InvalidBaseUrl {
            url: location.to_string(),
            details: err.to_string(),
        })?;
        Ok(Self::new(url))
    }

    /// Number of history entries, including the initial location.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn replace_count(&self) -> usize {
        self.lock().replace_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NavState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> Url {
        self.lock().location.clone()
    }

    fn push(&self, route: &str) {
        let mut state = self.lock();
        let joined = state.location.join(route);
        match joined {
            Ok(next) => {
                tracing::debug!(from = %state.location, to = %next, "Navigation push");
                state.location = next.clone();
                state.history.push(next);
            }
            Err(err) => {
                tracing::warn!(error = %err, route = %route, "Ignoring navigation to invalid route");
            }
        }
    }

    fn replace_query_param(&self, key: &str, value: &str) {
        let mut state = self.lock();
        let mut pairs: Vec<(String, String)> = state
            .location
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }

        state.location.query_pairs_mut().clear().extend_pairs(pairs);
        state.replace_count += 1;
        let location = state.location.clone();
        if let Some(current) = state.history.last_mut() {
            *current = location;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_page_defaults_to_one() {
        assert_eq!(page_from_url(&url("http://console.local/merchants")), 1);
        assert_eq!(page_from_url(&url("http://console.local/merchants?page=0")), 1);
        assert_eq!(page_from_url(&url("http://console.local/merchants?page=abc")), 1);
        assert_eq!(page_from_url(&url("http://console.local/merchants?page=-2")), 1);
    }

    #[test]
    fn test_page_is_read_from_query() {
        assert_eq!(
            page_from_url(&url("http://console.local/merchants?tab=all&page=4")),
            4
        );
    }

    #[test]
    fn test_is_at_route_ignores_trailing_slash_and_query() {
        let location = url("http://console.local/signin/?next=%2Forders");
        assert!(is_at_route(&location, "/signin"));
        assert!(is_at_route(&location, "/signin?reason=expired"));
        assert!(!is_at_route(&location, "/orders"));
    }

    #[test]
    fn test_push_adds_history_entry() {
        let navigator = MemoryNavigator::parse("http://console.local/orders?page=3").unwrap();
        navigator.push("/signin");

        assert_eq!(navigator.location().path(), "/signin");
        assert_eq!(navigator.location().query(), None);
        assert_eq!(navigator.history_len(), 2);
    }

    #[test]
    fn test_replace_query_param_keeps_other_params_and_history() {
        let navigator =
            MemoryNavigator::parse("http://console.local/orders?tab=open&page=3").unwrap();
        navigator.replace_query_param("page", "1");

        let location = navigator.location();
        assert_eq!(page_from_url(&location), 1);
        assert_eq!(location.query(), Some("tab=open&page=1"));
        assert_eq!(navigator.history_len(), 1);
        assert_eq!(navigator.replace_count(), 1);
    }

    #[test]
    fn test_replace_query_param_appends_missing_param() {
        let navigator = MemoryNavigator::parse("http://console.local/orders").unwrap();
        navigator.replace_query_param("page", "2");
        assert_eq!(navigator.location().query(), Some("page=2"));
    }
}

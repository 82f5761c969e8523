//! Per-category filter dictionaries shared by list pages.
//!
//! A category (usually one per list page, e.g. `"merchants"`) maps filter keys
//! to values. Clearing a key removes it, so "never set" and "set then cleared"
//! are the same state and serialize identically. Keys are stored in a
//! `BTreeMap`, which makes [`FilterStore::serialized`] independent of insertion
//! order and therefore safe to compare by value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One element of a multi-select filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterItem {
    Flag(bool),
    Text(String),
}

impl From<&str> for FilterItem {
    fn from(value: &str) -> Self {
        FilterItem::Text(value.to_string())
    }
}

impl From<bool> for FilterItem {
    fn from(value: bool) -> Self {
        FilterItem::Flag(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Text(String),
    List(Vec<FilterItem>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Flag(value)
    }
}

impl From<FilterItem> for FilterValue {
    fn from(item: FilterItem) -> Self {
        match item {
            FilterItem::Flag(flag) => FilterValue::Flag(flag),
            FilterItem::Text(text) => FilterValue::Text(text),
        }
    }
}

impl FilterValue {
    /// An empty list filters nothing and is stored as absent.
    fn is_applied(&self) -> bool {
        !matches!(self, FilterValue::List(items) if items.is_empty())
    }

    fn into_items(self) -> Vec<FilterItem> {
        match self {
            FilterValue::Flag(flag) => vec![FilterItem::Flag(flag)],
            FilterValue::Text(text) => vec![FilterItem::Text(text)],
            FilterValue::List(items) => items,
        }
    }
}

pub type FilterMap = BTreeMap<String, FilterValue>;

static EMPTY_FILTERS: FilterMap = BTreeMap::new();

#[derive(Debug, Default, Clone)]
pub struct FilterStore {
    categories: BTreeMap<String, FilterMap>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears (`None`) one filter key in `category`.
    pub fn set_filter(&mut self, category: &str, key: &str, value: Option<FilterValue>) {
        match value.filter(FilterValue::is_applied) {
            Some(value) => {
                self.categories
                    .entry(category.to_string())
                    .or_default()
                    .insert(key.to_string(), value);
            }
            None => {
                if let Some(filters) = self.categories.get_mut(category) {
                    filters.remove(key);
                }
            }
        }
    }

    /// Adds `item` to the multi-select filter under `key`, or removes it if
    /// already present. A scalar value already stored under `key` becomes the
    /// first list element. Removing the last element clears the key.
    pub fn toggle_filter(&mut self, category: &str, key: &str, item: FilterItem) {
        let current = self
            .categories
            .get_mut(category)
            .and_then(|filters| filters.remove(key));

        let mut items = current.map(FilterValue::into_items).unwrap_or_default();
        match items.iter().position(|existing| *existing == item) {
            Some(index) => {
                items.remove(index);
            }
            None => items.push(item),
        }

        self.set_filter(category, key, Some(FilterValue::List(items)));
    }

    /// Empties exactly one category.
    pub fn reset_filter(&mut self, category: &str) {
        if self.categories.remove(category).is_some() {
            tracing::debug!(category = %category, "Filters reset");
        }
    }

    pub fn reset_all_filters(&mut self) {
        self.categories.clear();
    }

    /// Returns the category's filters; an unknown category is empty.
    pub fn filters(&self, category: &str) -> &FilterMap {
        self.categories.get(category).unwrap_or(&EMPTY_FILTERS)
    }

    pub fn get(&self, category: &str, key: &str) -> Option<&FilterValue> {
        self.filters(category).get(key)
    }

    /// JSON encoding of the category's filters with sorted keys, or `None`
    /// when nothing is applied.
    pub fn serialized(&self, category: &str) -> Option<String> {
        let filters = self.filters(category);
        if filters.is_empty() {
            return None;
        }
        // String keys and plain JSON values cannot fail to serialize.
        serde_json::to_string(filters).ok()
    }
}

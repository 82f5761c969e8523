//! Wire types for the admin console backend.
//!
//! This crate is shared by the session core and its clients to prevent schema
//! drift. The backend remains the authority on validation; these types are
//! deliberately lenient on input so a missing field surfaces as a semantic
//! failure (for example an empty role) rather than a parse error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

pub const REFRESH_PATH: &str = "/auth/refresh";
pub const PROFILE_PATH: &str = "/auth/profile";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const PRODUCTS_PATH: &str = "/products";

/// URL query parameter carrying the 1-based page number.
pub const PAGE_PARAM: &str = "page";
pub const LIMIT_PARAM: &str = "limit";
/// URL query parameter carrying the opaque JSON-encoded filter dictionary.
pub const FILTER_PARAM: &str = "filter";

// ═══════════════════════════════════════════════════════════════════════════════
// Session Endpoints
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub access_token_expiry_in_seconds: Option<i64>,
}

/// Accepts integral or fractional seconds. Fractions are truncated and values
/// beyond `i64` saturate.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<Number>::deserialize(deserializer)?;
    Ok(number.and_then(|n| {
        n.as_i64()
            .or_else(|| n.as_f64().filter(|secs| secs.is_finite()).map(|secs| secs as i64))
    }))
}

impl RefreshResponse {
    pub fn new(access_token: impl Into<String>, expiry_in_seconds: i64) -> Self {
        Self {
            access_token: Some(access_token.into()),
            access_token_expiry_in_seconds: Some(expiry_in_seconds),
        }
    }

    /// Returns the issued token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Profile returned by the "who am I" endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl UserProfile {
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }

    pub fn has_role(&self) -> bool {
        !self.role.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductListResponse {
    #[serde(default)]
    pub data: Vec<Product>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// List Endpoints
// ═══════════════════════════════════════════════════════════════════════════════

/// Pagination metadata the server reports alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub page: u32,
    pub total_page: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(flatten)]
    pub meta: ListMeta,
}

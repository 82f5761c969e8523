//! HTTP seams for the backend endpoints.
//!
//! [`SessionApi`] covers the three session endpoints plus the product list the
//! console loads once access is validated. [`ListApi`] fetches one page of any
//! list resource. [`HttpClient`] implements both over a blocking reqwest client;
//! tests substitute scripted implementations.
//!
//! Every call takes the bearer token explicitly. Callers obtain it through
//! [`crate::SessionManager::authorize`], never from the token store directly.

use console_api::{
    ErrorBody, ListPage, Product, ProductListResponse, RefreshResponse, UserProfile,
    LOGOUT_PATH, PRODUCTS_PATH, PROFILE_PATH, REFRESH_PATH,
};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::query::PaginationQuery;

const USER_AGENT: &str = concat!("console-core/", env!("CARGO_PKG_VERSION"));

pub trait SessionApi {
    fn refresh(&self, token: &str) -> Result<RefreshResponse>;

    fn profile(&self, token: &str) -> Result<UserProfile>;

    fn logout(&self, token: &str) -> Result<()>;

    fn products(&self, token: &str) -> Result<Vec<Product>>;
}

pub trait ListApi {
    fn fetch_page(&self, token: &str, path: &str, query: &PaginationQuery)
        -> Result<ListPage<Value>>;
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    http: Client,
}

impl HttpClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let base_url = config.api_base_url.trim().to_string();
        Url::parse(&base_url).map_err(|err| ConsoleError::InvalidBaseUrl {
            url: base_url.clone(),
            details: err.to_string(),
        })?;

        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ConsoleError::Transport(err.to_string()))?;

        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn get(&self, token: &str, path: &str, query: &[(String, String)]) -> Result<Response> {
        let endpoint = self.endpoint(path);
        tracing::debug!(endpoint = %endpoint, "GET");

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .map_err(|err| ConsoleError::Transport(err.to_string()))?;

        check_status(response)
    }

    fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<T> {
        let response = self.get(token, path, &[])?;
        response
            .json()
            .map_err(|err| ConsoleError::MalformedResponse {
                endpoint: path.to_string(),
                details: err.to_string(),
            })
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ConsoleError::Unauthorized);
    }
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .unwrap_or_else(|_| "unable to read response body".to_string());
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or(body);
    Err(ConsoleError::Http {
        status: status.as_u16(),
        message,
    })
}

impl SessionApi for HttpClient {
    fn refresh(&self, token: &str) -> Result<RefreshResponse> {
        self.get_json(token, REFRESH_PATH)
    }

    fn profile(&self, token: &str) -> Result<UserProfile> {
        self.get_json(token, PROFILE_PATH)
    }

    fn logout(&self, token: &str) -> Result<()> {
        self.get(token, LOGOUT_PATH, &[]).map(|_| ())
    }

    fn products(&self, token: &str) -> Result<Vec<Product>> {
        let response: ProductListResponse = self.get_json(token, PRODUCTS_PATH)?;
        Ok(response.data)
    }
}

impl ListApi for HttpClient {
    fn fetch_page(
        &self,
        token: &str,
        path: &str,
        query: &PaginationQuery,
    ) -> Result<ListPage<Value>> {
        let response = self.get(token, path, &query.to_query_pairs())?;
        response
            .json()
            .map_err(|err| ConsoleError::MalformedResponse {
                endpoint: path.to_string(),
                details: err.to_string(),
            })
    }
}

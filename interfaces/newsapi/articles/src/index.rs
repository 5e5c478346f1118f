use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// Which listing of the provider to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/top-headlines`: filtered by country and category.
    TopHeadlines,
    /// `/everything`: free-text search with date bounds.
    Everything,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::TopHeadlines => "top-headlines",
            Endpoint::Everything => "everything",
        }
    }
}

/// A fully planned upstream request. Empty fields are not sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlesRequest {
    pub endpoint: Endpoint,
    pub page: u32,
    pub q: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub sort_by: Option<String>,
}

impl ArticlesRequest {
    pub fn new(endpoint: Endpoint, page: u32) -> Self {
        Self {
            endpoint,
            page,
            q: None,
            country: None,
            category: None,
            from: None,
            sort_by: None,
        }
    }

    /// Query string pairs in the order the provider documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string())];
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(country) = &self.country {
            pairs.push(("country", country.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy", sort_by.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One article as returned by the provider. `url` doubles as the article id and
/// is empty when the provider left it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: Option<ArticleSource>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// Body the provider sends alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub async fn fetch_articles(
        &self,
        request: &ArticlesRequest,
    ) -> Result<ArticlesResponse, FetchArticlesError> {
        let url = format!("{}/{}", self.base_url, request.endpoint.path());
        let pairs = request.query_pairs();
        debug!(%url, query = ?pairs, "fetching articles");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .header("User-Agent", "rust-client")
            .query(&pairs)
            .send()
            .await
            .map_err(|source| FetchArticlesError::RequestSend { source })?;

        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|source| FetchArticlesError::ResponseRead { source })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| "Failed to fetch news".to_string());
            return Err(FetchArticlesError::Upstream { status, message });
        }

        serde_json::from_str(&body).map_err(|source| FetchArticlesError::DeserializeResponseBody { source })
    }
}

#[derive(Debug, Error)]
pub enum FetchArticlesError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
    },

    #[error("DeserializeResponseBody: {source}")]
    DeserializeResponseBody {
        source: serde_json::Error,
    },
}

use std::cmp::Reverse;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{Days, Months, NaiveDate, Utc};
use interfaces_newsapi_articles::index::{
    Article, ArticlesRequest, ArticlesResponse, Endpoint, FetchArticlesError, NewsApiClient,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::{spawn_blocking, JoinError};
use tracing::info;

use crate::db::{InteractionStore, StoreError};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where articles come from. Implemented by the NewsAPI client and by test doubles.
pub trait NewsSource: Send + Sync + 'static {
    fn fetch_articles<'a>(
        &'a self,
        request: &'a ArticlesRequest,
    ) -> BoxFuture<'a, Result<ArticlesResponse, FetchArticlesError>>;
}

impl NewsSource for NewsApiClient {
    fn fetch_articles<'a>(
        &'a self,
        request: &'a ArticlesRequest,
    ) -> BoxFuture<'a, Result<ArticlesResponse, FetchArticlesError>> {
        Box::pin(NewsApiClient::fetch_articles(self, request))
    }
}

const DEFAULT_TOPIC_QUERY: &str = "technology OR AI OR startup";
const TECHNOLOGY_TOPIC_QUERY: &str = "technology OR AI OR startup OR coding";
const DEFAULT_CATEGORY: &str = "technology";
const DEFAULT_COUNTRY: &str = "us";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Today,
    Week,
    Month,
}

impl TimeRange {
    /// Earliest publication date included, as a calendar date.
    pub fn lower_bound(self, today: NaiveDate) -> NaiveDate {
        match self {
            TimeRange::Today => today,
            TimeRange::Week => today.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN),
            TimeRange::Month => today.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    PublishedAt,
    Upvotes,
}

/// Raw `/api/news` query string. Every field is optional and untrusted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsQuery {
    pub q: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub time_range: Option<String>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsFilters {
    pub q: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub time_range: Option<TimeRange>,
    pub sort_by: SortBy,
    pub page: u32,
}

impl Default for NewsFilters {
    fn default() -> Self {
        Self {
            q: None,
            country: None,
            category: None,
            time_range: None,
            sort_by: SortBy::default(),
            page: 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum InvalidFilterError {
    #[error("Invalid page: {value}")]
    Page {
        value: String,
    },
    #[error("Invalid timeRange: {value}")]
    TimeRange {
        value: String,
    },
    #[error("Invalid sortBy: {value}")]
    SortBy {
        value: String,
    },
}

// Browsers send "undefined" for unset fields.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "undefined")
}

impl TryFrom<NewsQuery> for NewsFilters {
    type Error = InvalidFilterError;

    fn try_from(query: NewsQuery) -> Result<Self, Self::Error> {
        let page = match present(query.page) {
            None => 1,
            Some(value) => match value.parse::<u32>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(InvalidFilterError::Page { value }),
            },
        };

        let time_range = match present(query.time_range).as_deref() {
            None => None,
            Some("today") => Some(TimeRange::Today),
            Some("week") => Some(TimeRange::Week),
            Some("month") => Some(TimeRange::Month),
            Some(other) => return Err(InvalidFilterError::TimeRange { value: other.to_string() }),
        };

        let sort_by = match present(query.sort_by).as_deref() {
            None | Some("publishedAt") => SortBy::PublishedAt,
            Some("upvotes") => SortBy::Upvotes,
            Some(other) => return Err(InvalidFilterError::SortBy { value: other.to_string() }),
        };

        Ok(Self {
            q: present(query.q),
            country: present(query.country),
            category: present(query.category),
            time_range,
            sort_by,
            page,
        })
    }
}

/// Chooses the upstream listing and fills in defaults.
///
/// Broad search is used for date bounds, non-default sorting, or a bare
/// free-text query; everything else goes to the headline listing.
pub fn plan_request(filters: &NewsFilters, today: NaiveDate) -> ArticlesRequest {
    let bare_query = filters.q.is_some() && filters.country.is_none() && filters.category.is_none();
    let broad = filters.time_range.is_some() || filters.sort_by != SortBy::PublishedAt || bare_query;

    if broad {
        let mut request = ArticlesRequest::new(Endpoint::Everything, filters.page);
        request.q = Some(filters.q.clone().unwrap_or_else(|| {
            if filters.category.as_deref() == Some(DEFAULT_CATEGORY) {
                TECHNOLOGY_TOPIC_QUERY.to_string()
            } else {
                DEFAULT_TOPIC_QUERY.to_string()
            }
        }));
        request.from = filters.time_range.map(|range| range.lower_bound(today));
        // Upvote ordering is local; the provider always sorts by date.
        request.sort_by = Some("publishedAt".to_string());
        return request;
    }

    let mut request = ArticlesRequest::new(Endpoint::TopHeadlines, filters.page);
    request.q = filters.q.clone();
    request.country = filters.country.clone();
    request.category = filters.category.clone();
    if request.q.is_none() && request.country.is_none() && request.category.is_none() {
        request.category = Some(DEFAULT_CATEGORY.to_string());
        request.country = Some(DEFAULT_COUNTRY.to_string());
    }
    request
}

/// An upstream article with its stored vote count joined in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub upvotes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPage {
    pub status: String,
    pub total_results: u64,
    pub articles: Vec<ScoredArticle>,
}

/// Joins counts by url (0 when absent or the url is empty). Stable descending
/// sort for `SortBy::Upvotes`.
pub fn merge_upvotes(
    articles: Vec<Article>,
    counts: &HashMap<String, i64>,
    sort_by: SortBy,
) -> Vec<ScoredArticle> {
    let mut merged: Vec<ScoredArticle> = articles
        .into_iter()
        .map(|article| {
            let upvotes = match article.url.as_str() {
                "" => 0,
                url => counts.get(url).copied().unwrap_or(0),
            };
            ScoredArticle { article, upvotes }
        })
        .collect();

    if sort_by == SortBy::Upvotes {
        merged.sort_by_key(|scored| Reverse(scored.upvotes));
    }

    merged
}

#[derive(Debug, Error)]
pub enum AggregateNewsError {
    #[error("News API key not configured")]
    SourceNotConfigured,
    #[error(transparent)]
    FetchArticles {
        source: FetchArticlesError,
    },
    #[error("Store: {source}")]
    Store {
        source: StoreError,
    },
    #[error("Worker: {source}")]
    Worker {
        source: JoinError,
    },
}

pub struct AggregationService {
    source: Option<Arc<dyn NewsSource>>,
    interactions: Arc<dyn InteractionStore>,
}

impl AggregationService {
    pub fn new(source: Option<Arc<dyn NewsSource>>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self { source, interactions }
    }

    pub async fn aggregate(&self, filters: &NewsFilters) -> Result<NewsPage, AggregateNewsError> {
        self.aggregate_on(filters, Utc::now().date_naive()).await
    }

    /// Same as [`aggregate`](Self::aggregate) with an explicit current date.
    pub async fn aggregate_on(
        &self,
        filters: &NewsFilters,
        today: NaiveDate,
    ) -> Result<NewsPage, AggregateNewsError> {
        let source = self.source.as_ref().ok_or(AggregateNewsError::SourceNotConfigured)?;
        let request = plan_request(filters, today);
        info!(
            endpoint = request.endpoint.path(),
            page = request.page,
            q = ?request.q,
            country = ?request.country,
            category = ?request.category,
            from = ?request.from,
            "news request"
        );

        let response = source
            .fetch_articles(&request)
            .await
            .map_err(|source| AggregateNewsError::FetchArticles { source })?;

        let ids: Vec<String> = response
            .articles
            .iter()
            .filter(|article| !article.url.is_empty())
            .map(|article| article.url.clone())
            .collect();
        let store = Arc::clone(&self.interactions);
        let counts = spawn_blocking(move || store.upvote_counts(&ids))
            .await
            .map_err(|source| AggregateNewsError::Worker { source })?
            .map_err(|source| AggregateNewsError::Store { source })?;

        Ok(NewsPage {
            status: response.status,
            total_results: response.total_results,
            articles: merge_upvotes(response.articles, &counts, filters.sort_by),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn article(url: &str) -> Article {
        Article {
            source: None,
            author: None,
            title: Some(url.to_string()),
            description: None,
            url: url.to_string(),
            url_to_image: None,
            published_at: None,
            content: None,
        }
    }

    fn query(pairs: &[(&str, &str)]) -> NewsQuery {
        let mut query = NewsQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "q" => query.q = value,
                "country" => query.country = value,
                "category" => query.category = value,
                "page" => query.page = value,
                "timeRange" => query.time_range = value,
                "sortBy" => query.sort_by = value,
                other => panic!("unknown key {other}"),
            }
        }
        query
    }

    #[test]
    fn blank_and_undefined_values_are_absent() {
        let filters = NewsFilters::try_from(query(&[
            ("q", "   "),
            ("country", "undefined"),
            ("category", " business "),
            ("timeRange", ""),
        ]))
        .unwrap();

        assert_eq!(filters.q, None);
        assert_eq!(filters.country, None);
        assert_eq!(filters.category.as_deref(), Some("business"));
        assert_eq!(filters.time_range, None);
        assert_eq!(filters.page, 1);
    }

    #[test]
    fn bad_filter_values_are_rejected() {
        assert!(matches!(
            NewsFilters::try_from(query(&[("page", "0")])),
            Err(InvalidFilterError::Page { .. })
        ));
        assert!(matches!(
            NewsFilters::try_from(query(&[("page", "two")])),
            Err(InvalidFilterError::Page { .. })
        ));
        assert!(matches!(
            NewsFilters::try_from(query(&[("timeRange", "year")])),
            Err(InvalidFilterError::TimeRange { .. })
        ));
        assert!(matches!(
            NewsFilters::try_from(query(&[("sortBy", "relevancy")])),
            Err(InvalidFilterError::SortBy { .. })
        ));
    }

    #[test]
    fn no_filters_default_to_us_technology_headlines() {
        let request = plan_request(&NewsFilters::default(), date(2024, 5, 20));

        assert_eq!(request.endpoint, Endpoint::TopHeadlines);
        assert_eq!(request.category.as_deref(), Some("technology"));
        assert_eq!(request.country.as_deref(), Some("us"));
        assert_eq!(request.q, None);
        assert_eq!(request.from, None);
    }

    #[test]
    fn country_and_category_stay_on_headlines() {
        let filters = NewsFilters {
            q: Some("chips".to_string()),
            country: Some("de".to_string()),
            category: Some("business".to_string()),
            page: 3,
            ..NewsFilters::default()
        };
        let request = plan_request(&filters, date(2024, 5, 20));

        assert_eq!(request.endpoint, Endpoint::TopHeadlines);
        assert_eq!(request.q.as_deref(), Some("chips"));
        assert_eq!(request.country.as_deref(), Some("de"));
        assert_eq!(request.category.as_deref(), Some("business"));
        assert_eq!(request.page, 3);
    }

    #[test]
    fn bare_query_uses_broad_search() {
        let filters = NewsFilters { q: Some("rust".to_string()), ..NewsFilters::default() };
        let request = plan_request(&filters, date(2024, 5, 20));

        assert_eq!(request.endpoint, Endpoint::Everything);
        assert_eq!(request.q.as_deref(), Some("rust"));
        assert_eq!(request.country, None);
        assert_eq!(request.sort_by.as_deref(), Some("publishedAt"));
    }

    #[test]
    fn week_by_upvotes_uses_broad_search_with_default_topic() {
        let filters = NewsFilters::try_from(query(&[
            ("timeRange", "week"),
            ("sortBy", "upvotes"),
            ("q", ""),
        ]))
        .unwrap();
        let request = plan_request(&filters, date(2024, 5, 20));

        assert_eq!(request.endpoint, Endpoint::Everything);
        assert_eq!(request.q.as_deref(), Some("technology OR AI OR startup"));
        assert_eq!(request.from, Some(date(2024, 5, 13)));
    }

    #[test]
    fn technology_category_broadens_default_topic() {
        let filters = NewsFilters {
            category: Some("technology".to_string()),
            time_range: Some(TimeRange::Today),
            ..NewsFilters::default()
        };
        let request = plan_request(&filters, date(2024, 5, 20));

        assert_eq!(request.q.as_deref(), Some("technology OR AI OR startup OR coding"));
        assert_eq!(request.from, Some(date(2024, 5, 20)));
        assert_eq!(request.category, None);
    }

    #[test]
    fn month_bound_clamps_to_month_end() {
        assert_eq!(TimeRange::Month.lower_bound(date(2024, 3, 31)), date(2024, 2, 29));
        assert_eq!(TimeRange::Month.lower_bound(date(2024, 1, 15)), date(2023, 12, 15));
        assert_eq!(TimeRange::Week.lower_bound(date(2024, 3, 3)), date(2024, 2, 25));
    }

    #[test]
    fn merge_defaults_missing_counts_to_zero() {
        let counts = HashMap::from([("b".to_string(), 5)]);
        let merged = merge_upvotes(vec![article("a"), article("b")], &counts, SortBy::PublishedAt);

        assert_eq!(merged[0].upvotes, 0);
        assert_eq!(merged[1].upvotes, 5);
        assert_eq!(merged[0].article.url, "a");
    }

    #[test]
    fn article_without_url_scores_zero() {
        let counts = HashMap::from([(String::new(), 9), ("a".to_string(), 1)]);
        let merged = merge_upvotes(vec![article(""), article("a")], &counts, SortBy::Upvotes);

        assert_eq!(merged[0].article.url, "a");
        assert_eq!(merged[1].upvotes, 0);
    }

    #[test]
    fn upvote_sort_is_descending_and_stable() {
        let counts = HashMap::from([
            ("b".to_string(), 3),
            ("c".to_string(), 7),
            ("d".to_string(), 3),
        ]);
        let merged = merge_upvotes(
            vec![article("a"), article("b"), article("c"), article("d")],
            &counts,
            SortBy::Upvotes,
        );

        let order: Vec<&str> = merged.iter().map(|s| s.article.url.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn scored_article_serializes_flat() {
        let scored = ScoredArticle { article: article("https://x.test/1"), upvotes: 2 };
        let value = serde_json::to_value(&scored).unwrap();

        assert_eq!(value["url"], "https://x.test/1");
        assert_eq!(value["upvotes"], 2);
        assert!(value.get("article").is_none());
    }
}

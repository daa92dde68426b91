//! HTTP fetch gateway for the backend API.
//!
//! All endpoints go through [`ApiClient::get_json`], which owns the retry
//! policy (bounded attempts with exponential backoff on 429/5xx), the
//! per-attempt timeout, and the normalization of transport and decode
//! failures into [`ApiError`]. Callers never retry on their own, so no
//! request is ever retried concurrently with itself.

use crate::api::types::{
    ArticleDetail, ArticleUpdate, CategoryTree, MapData, MapResponse, PosturaEvent, Subcategory,
    TimeFilter,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors produced by the fetch gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the client-side timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body was not the expected JSON shape
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
}

/// Outcome of a map-data fetch: the backend answers `{error: "no_articles"}`
/// as a first-class business result, distinct from transport failures.
#[derive(Debug, Clone, PartialEq)]
pub enum MapLoad {
    Data(MapData),
    Empty { message: String },
}

/// Retry and timeout policy applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// Per-attempt timeout.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Thin typed wrapper around `reqwest::Client` for the article API.
///
/// Cheap to clone (the inner client is an `Arc`); one instance is shared
/// by every background task.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    policy: RetryPolicy,
}

impl ApiClient {
    pub fn new(base: Url, http: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { http, base, policy }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetch the category tree, optionally scoped to a category or
    /// subcategory, always constrained by the time filter.
    pub async fn fetch_articles(
        &self,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        time_filter: TimeFilter,
    ) -> Result<CategoryTree, ApiError> {
        let mut query: Vec<(&str, String)> =
            vec![("time_filter", time_filter.as_str().to_string())];
        if let Some(id) = category_id {
            query.push(("category_id", id.to_string()));
        }
        if let Some(id) = subcategory_id {
            query.push(("subcategory_id", id.to_string()));
        }
        self.get_json("/api/articles", &query).await
    }

    /// Fetch the subcategory tab bar for one category.
    pub async fn fetch_subcategories(
        &self,
        category_id: i64,
        time_filter: TimeFilter,
    ) -> Result<Vec<Subcategory>, ApiError> {
        let query = [
            ("category_id", category_id.to_string()),
            ("time_filter", time_filter.as_str().to_string()),
        ];
        self.get_json("/api/subcategories", &query).await
    }

    /// Fetch the full detail payload for a single article.
    pub async fn fetch_article(&self, article_id: i64) -> Result<ArticleDetail, ApiError> {
        self.get_json(&format!("/api/article/{}", article_id), &[])
            .await
    }

    /// Fetch the 2-D similarity map for the given time window.
    pub async fn fetch_map_data(&self, time_filter: TimeFilter) -> Result<MapLoad, ApiError> {
        let query = [("time_filter", time_filter.as_str().to_string())];
        let response: MapResponse = self.get_json("/api/mapa-data", &query).await?;
        match response {
            MapResponse::Data(data) => Ok(MapLoad::Data(data)),
            MapResponse::Failure { error, message } if error == "no_articles" => {
                Ok(MapLoad::Empty {
                    message: message.unwrap_or_else(|| {
                        "No hay suficientes datos para generar la visualización.".to_string()
                    }),
                })
            }
            MapResponse::Failure { error, .. } => Err(ApiError::Malformed(format!(
                "unexpected error payload: {}",
                error
            ))),
        }
    }

    /// Fetch stance groupings for the given scope.
    pub async fn fetch_posturas(
        &self,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        time_filter: TimeFilter,
    ) -> Result<Vec<PosturaEvent>, ApiError> {
        let mut query: Vec<(&str, String)> =
            vec![("time_filter", time_filter.as_str().to_string())];
        if let Some(id) = category_id {
            query.push(("category_id", id.to_string()));
        }
        if let Some(id) = subcategory_id {
            query.push(("subcategory_id", id.to_string()));
        }
        self.get_json("/api/posturas", &query).await
    }

    /// Fetch article updates published since the watermark timestamp.
    pub async fn fetch_updates(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ArticleUpdate>, ApiError> {
        let query = [("since", since.to_rfc3339_opts(SecondsFormat::Secs, true))];
        self.get_json("/api/article-updates", &query).await
    }

    /// GET a JSON document with retry, backoff, and timeout applied.
    ///
    /// # Behavior
    ///
    /// - Each attempt is bounded by `policy.request_timeout`
    /// - 429 and 5xx responses are retried with exponential backoff
    ///   (2s, 4s, 8s) up to `policy.max_retries`
    /// - Other non-2xx statuses fail immediately with [`ApiError::HttpStatus`]
    /// - Decode failures are reported as [`ApiError::Malformed`]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| ApiError::Malformed(format!("invalid endpoint path '{}': {}", path, e)))?;

        let mut retry_count = 0;
        let response = loop {
            let request = self.http.get(url.clone()).query(query);
            let response = tokio::time::timeout(self.policy.request_timeout, request.send())
                .await
                .map_err(|_| ApiError::Timeout)?
                .map_err(ApiError::Network)?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= self.policy.max_retries {
                    return Err(ApiError::RateLimited(self.policy.max_retries));
                }
                let delay_secs = 2u64.pow(retry_count);
                tracing::warn!(
                    url = %url,
                    retry = retry_count,
                    delay_secs,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retry_count += 1;
                continue;
            }

            if status.is_server_error() {
                if retry_count >= self.policy.max_retries {
                    return Err(ApiError::HttpStatus(status.as_u16()));
                }
                let delay_secs = 2u64.pow(retry_count);
                tracing::warn!(
                    url = %url,
                    status = %status,
                    retry = retry_count,
                    delay_secs,
                    "Server error, retrying after delay"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                return Err(ApiError::HttpStatus(status.as_u16()));
            }

            break response;
        };

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Malformed(e.to_string())
            } else {
                ApiError::Network(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let base = Url::parse(&server.uri()).unwrap();
        ApiClient::new(
            base,
            reqwest::Client::new(),
            RetryPolicy {
                max_retries: 2,
                request_timeout: Duration::from_secs(5),
            },
        )
    }

    #[tokio::test]
    async fn test_fetch_articles_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .and(query_param("time_filter", "72h"))
            .and(query_param("category_id", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"categories": [{"categoria_id": 4, "nombre": "Cultura"}]}"#,
            ))
            .mount(&server)
            .await;

        let tree = client_for(&server)
            .fetch_articles(Some(4), None, TimeFilter::H72)
            .await
            .unwrap();
        assert_eq!(tree.categories.len(), 1);
        assert_eq!(tree.categories[0].nombre, "Cultura");
    }

    #[tokio::test]
    async fn test_non_2xx_is_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_articles(None, None, TimeFilter::H24)
            .await
            .unwrap_err();
        match err {
            ApiError::HttpStatus(404) => {}
            e => panic!("Expected HttpStatus(404), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_server_error_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/subcategories"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3) // Initial request + 2 retries
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_subcategories(1, TimeFilter::H48)
            .await
            .unwrap_err();
        match err {
            ApiError::HttpStatus(500) => {}
            e => panic!("Expected HttpStatus(500), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_server_error_retry_then_success() {
        use wiremock::matchers::any;

        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(any())
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"[{"id": 1, "nombre": "Banca"}]"#),
            )
            .mount(&server)
            .await;

        let subs = client_for(&server)
            .fetch_subcategories(1, TimeFilter::H48)
            .await
            .unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].article_count, 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_malformed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"items": []}"#))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_articles(None, None, TimeFilter::H72)
            .await
            .unwrap_err();
        match err {
            ApiError::Malformed(_) => {}
            e => panic!("Expected Malformed, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/article/9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"id": 9, "titular": "T"}"#)
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let client = ApiClient::new(
            base,
            reqwest::Client::new(),
            RetryPolicy {
                max_retries: 0,
                request_timeout: Duration::from_millis(200),
            },
        );
        let err = client.fetch_article(9).await.unwrap_err();
        match err {
            ApiError::Timeout => {}
            e => panic!("Expected Timeout, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_map_data_no_articles_is_empty_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mapa-data"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"error": "no_articles", "message": "Sin artículos"}"#,
            ))
            .mount(&server)
            .await;

        let load = client_for(&server)
            .fetch_map_data(TimeFilter::H24)
            .await
            .unwrap();
        assert_eq!(
            load,
            MapLoad::Empty {
                message: "Sin artículos".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_updates_since_param_is_rfc3339() {
        let server = MockServer::start().await;
        let since = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Mock::given(method("GET"))
            .and(path("/api/article-updates"))
            .and(query_param("since", "2024-05-01T10:00:00Z"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"titular": "Actualizado", "updated_on": "2024-05-01T10:05:00Z"}]"#,
            ))
            .mount(&server)
            .await;

        let updates = client_for(&server).fetch_updates(since).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].titular, "Actualizado");
    }
}

use crate::config::NetworkConfig;
use crate::internal::cache::Cache;
use crate::internal::models::{ArticlesResponse, PageOutcome, QueryMode, QueryState};
use crate::utils::url::mask_api_key;
use reqwest::{Client, Url};
use std::time::Duration;
use strum_macros::Display;
use thiserror::Error;

const MAX_CACHED_PAGES: usize = 64;

/// Coarse error category surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    Network,
    Api,
    Parse,
}

/// Everything that can go wrong with a single page fetch.
///
/// URLs stored in the variants have the API key masked.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to send GET request to {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url} returned HTTP {status}")]
    Status {
        url: String,
        status: u16,
        message: Option<String>,
    },
    #[error("failed to parse JSON response from {url}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("news API returned status '{status}': {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: String,
        code: Option<String>,
        message: Option<String>,
    },
    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::Status { .. } | Self::InvalidUrl { .. } => {
                ErrorKind::Network
            }
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Api { .. } => ErrorKind::Api,
        }
    }

    /// Short text for the error indicator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } | Self::InvalidUrl { .. } => {
                "Could not fetch news: network error".to_string()
            }
            Self::Status {
                status,
                message: Some(message),
                ..
            } => format!("Could not fetch news (HTTP {status}): {message}"),
            Self::Status { status, .. } => format!("Could not fetch news (HTTP {status})"),
            Self::Parse { .. } => "Could not read the news response".to_string(),
            Self::Api {
                message: Some(message),
                ..
            } => format!("News API error: {message}"),
            Self::Api { code, .. } => format!(
                "News API error: {}",
                code.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Map an `"ok"`-or-not response to a page outcome.
pub fn classify(response: ArticlesResponse) -> Result<PageOutcome, FetchError> {
    if !response.is_ok() {
        return Err(FetchError::Api {
            status: response.status,
            code: response.code,
            message: response.message,
        });
    }

    match response.articles.is_empty() {
        true => Ok(PageOutcome::Empty {
            total_results: response.total_results,
        }),
        false => Ok(PageOutcome::Articles {
            articles: response.articles,
            total_results: response.total_results,
        }),
    }
}

/// HTTP client for the news API.
///
/// One attempt per request: no retries, no timeouts. Successful `"ok"`
/// responses are cached per URL when a TTL is configured.
#[derive(Clone)]
pub struct NewsApiService {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
    cache: Option<Cache<String, ArticlesResponse>>,
}

impl NewsApiService {
    pub fn new(config: &NetworkConfig, enable_metrics: bool) -> Self {
        let api_key = config.resolve_api_key().unwrap_or_else(|| {
            tracing::warn!(
                "No news API key configured; set {} or network.api_key",
                crate::config::API_KEY_ENV
            );
            String::new()
        });

        let cache = (config.cache_ttl_secs > 0).then(|| {
            Cache::with_metrics(
                Duration::from_secs(config.cache_ttl_secs),
                MAX_CACHED_PAGES,
                enable_metrics,
            )
        });

        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key,
            country: config.country.clone(),
            cache,
        }
    }

    /// Service pointed at an arbitrary base URL with caching disabled.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            country: country.into(),
            cache: None,
        }
    }

    /// Build the endpoint URL for a query. Headlines carry the country filter,
    /// search carries the term and no country.
    pub fn build_url(&self, query: &QueryState) -> Result<Url, FetchError> {
        let page = query.page.to_string();
        let page_size = query.page_size.to_string();

        let (endpoint, params) = match query.mode {
            QueryMode::Headlines => (
                "top-headlines",
                vec![
                    ("country", self.country.as_str()),
                    ("apiKey", self.api_key.as_str()),
                    ("page", page.as_str()),
                    ("pageSize", page_size.as_str()),
                ],
            ),
            QueryMode::Search => (
                "everything",
                vec![
                    ("apiKey", self.api_key.as_str()),
                    ("q", query.query.as_str()),
                    ("page", page.as_str()),
                    ("pageSize", page_size.as_str()),
                ],
            ),
        };

        let raw = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        Url::parse_with_params(&raw, &params).map_err(|e| FetchError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    /// GET `url` and parse the body as an [`ArticlesResponse`].
    #[tracing::instrument(skip(self, url), fields(url = %mask_api_key(url)))]
    pub async fn fetch_articles(&self, url: &str) -> Result<ArticlesResponse, FetchError> {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(&url.to_string())
        {
            tracing::debug!("serving page from cache");
            return Ok(hit);
        }

        let masked = mask_api_key(url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: masked.clone(),
                source,
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| FetchError::Network {
            url: masked.clone(),
            source,
        })?;

        if !status.is_success() {
            // NewsAPI explains 4xx responses in an error body; keep the message if there is one.
            let message = serde_json::from_str::<ArticlesResponse>(&body)
                .ok()
                .and_then(|r| r.message);
            tracing::warn!(status = status.as_u16(), ?message, "news API request failed");
            return Err(FetchError::Status {
                url: masked,
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ArticlesResponse =
            serde_json::from_str(&body).map_err(|source| FetchError::Parse {
                url: masked,
                source,
            })?;

        tracing::info!(
            status = %parsed.status,
            total = parsed.total_results,
            count = parsed.articles.len(),
            "fetched articles"
        );

        if parsed.is_ok()
            && let Some(cache) = &self.cache
        {
            cache.set(url.to_string(), parsed.clone());
        }

        Ok(parsed)
    }

    /// Fetch one page of `query` and classify it.
    pub async fn load_page(&self, query: &QueryState) -> Result<PageOutcome, FetchError> {
        let url = self.build_url(query)?;
        let response = self.fetch_articles(url.as_str()).await?;
        classify(response)
    }

    /// Drop every cached page so the next load hits the network.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::models::Article;
    use mockito::Matcher;

    fn service(base: &str) -> NewsApiService {
        NewsApiService::with_base_url(base, "test-key", "in")
    }

    #[test]
    fn test_build_headlines_url() {
        let url = service("https://newsapi.org/v2/")
            .build_url(&QueryState::headlines(10))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://newsapi.org/v2/top-headlines?country=in&apiKey=test-key&page=1&pageSize=10"
        );
    }

    #[test]
    fn test_build_search_url_omits_country_and_encodes_term() {
        let query = QueryState::search("climate change & india", 10).next_page();
        let url = service("https://newsapi.org/v2").build_url(&query).unwrap();
        assert_eq!(url.path(), "/v2/everything");
        assert!(!url.as_str().contains("country="));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apiKey".to_string(), "test-key".to_string()),
                ("q".to_string(), "climate change & india".to_string()),
                ("page".to_string(), "2".to_string()),
                ("pageSize".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_url_rejects_bad_base() {
        let err = service("not a base").build_url(&QueryState::headlines(10));
        assert!(matches!(err, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_classify_error_status() {
        let response = ArticlesResponse {
            status: "error".to_string(),
            code: Some("rateLimited".to_string()),
            message: Some("Too many requests".to_string()),
            ..ArticlesResponse::default()
        };
        let err = classify(response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.user_message(), "News API error: Too many requests");
    }

    #[test]
    fn test_classify_empty_is_not_an_error() {
        let response = ArticlesResponse {
            status: "ok".to_string(),
            total_results: 0,
            ..ArticlesResponse::default()
        };
        assert_eq!(
            classify(response).unwrap(),
            PageOutcome::Empty { total_results: 0 }
        );
    }

    #[test]
    fn test_classify_articles() {
        let article = Article {
            title: "One".to_string(),
            url: "https://example.com/1".to_string(),
            ..Article::default()
        };
        let response = ArticlesResponse {
            status: "ok".to_string(),
            total_results: 12,
            articles: vec![article.clone()],
            ..ArticlesResponse::default()
        };
        assert_eq!(
            classify(response).unwrap(),
            PageOutcome::Articles {
                articles: vec![article],
                total_results: 12
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_articles_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("country".into(), "in".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"ok","totalResults":1,"articles":[
                    {"source":{"id":null,"name":"The Hindu"},"title":"Headline","url":"https://example.com/h"}
                ]}"#,
            )
            .create_async()
            .await;

        let result = service(&server.url())
            .load_page(&QueryState::headlines(10))
            .await;

        mock.assert_async().await;
        match result.unwrap() {
            PageOutcome::Articles {
                articles,
                total_results,
            } => {
                assert_eq!(total_results, 1);
                assert_eq!(articles[0].source.name, "The Hindu");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_articles_http_error_is_network_kind() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#)
            .create_async()
            .await;

        let err = service(&server.url())
            .load_page(&QueryState::headlines(10))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(matches!(err, FetchError::Status { status: 401, .. }));
        assert!(err.user_message().contains("Your API key is invalid."));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_fetch_articles_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/everything")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = service(&server.url())
            .load_page(&QueryState::search("rust", 10))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_fetch_articles_connection_refused() {
        let err = service("http://localhost:1")
            .fetch_articles("http://localhost:1/top-headlines?apiKey=test-key")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("apiKey=***"));
    }

    #[tokio::test]
    async fn test_cached_page_skips_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"ok","totalResults":0,"articles":[]}"#)
            .expect(2)
            .create_async()
            .await;

        let config = NetworkConfig {
            base_url: server.url(),
            api_key: Some("test-key".to_string()),
            cache_ttl_secs: 60,
            ..NetworkConfig::default()
        };
        let api = NewsApiService::new(&config, false);
        let query = QueryState::headlines(10);

        api.load_page(&query).await.unwrap();
        api.load_page(&query).await.unwrap();
        api.clear_cache();
        api.load_page(&query).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"error","code":"unexpectedError","message":"boom"}"#)
            .expect(2)
            .create_async()
            .await;

        let config = NetworkConfig {
            base_url: server.url(),
            api_key: Some("test-key".to_string()),
            cache_ttl_secs: 60,
            ..NetworkConfig::default()
        };
        let api = NewsApiService::new(&config, false);
        let query = QueryState::headlines(10);

        assert!(api.load_page(&query).await.is_err());
        assert!(api.load_page(&query).await.is_err());

        mock.assert_async().await;
    }
}

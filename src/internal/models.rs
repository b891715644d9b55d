use serde::{Deserialize, Deserializer};
use strum_macros::Display;

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Source {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A single article as returned by the news API. The URL is its identity.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    pub url_to_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

/// Body of both the `top-headlines` and `everything` endpoints.
///
/// `code` and `message` are only present when `status` is `"error"`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ArticlesResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Which endpoint a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum QueryMode {
    #[default]
    Headlines,
    Search,
}

/// Mode, pagination cursor and search term of the current query session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub mode: QueryMode,
    pub page: u32,
    pub page_size: u32,
    pub query: String,
}

impl QueryState {
    pub fn headlines(page_size: u32) -> Self {
        Self {
            mode: QueryMode::Headlines,
            page: 1,
            page_size: page_size.max(1),
            query: String::new(),
        }
    }

    pub fn search(term: impl Into<String>, page_size: u32) -> Self {
        Self {
            mode: QueryMode::Search,
            page: 1,
            page_size: page_size.max(1),
            query: term.into(),
        }
    }

    /// Same mode and term, one page further.
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }
}

/// Result of classifying a successfully parsed `"ok"` response.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Articles {
        articles: Vec<Article>,
        total_results: u64,
    },
    Empty {
        total_results: u64,
    },
}

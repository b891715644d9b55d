use super::models::Article;
use crate::utils::datetime::parse_published_at;
use crate::utils::url::extract_domain;

/// Image shown for articles that come without one.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/300x200?text=No+Image";

/// Display-ready projection of an [`Article`] with every fallback applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCard {
    pub title: String,
    /// Author, or the source name when the author is missing.
    pub byline: String,
    /// Description, or empty.
    pub description: String,
    /// Image URL, or [`PLACEHOLDER_IMAGE_URL`].
    pub image_url: String,
    pub url: String,
    pub source: String,
    pub domain: Option<String>,
    /// Publication time in unix seconds.
    pub published_at: Option<i64>,
}

/// Project articles to cards, one per article, in input order.
pub fn render(articles: &[Article]) -> Vec<ArticleCard> {
    articles.iter().map(render_card).collect()
}

pub fn render_card(article: &Article) -> ArticleCard {
    ArticleCard {
        title: article.title.clone(),
        byline: present(&article.author)
            .unwrap_or(article.source.name.as_str())
            .to_string(),
        description: present(&article.description).unwrap_or_default().to_string(),
        image_url: present(&article.url_to_image)
            .unwrap_or(PLACEHOLDER_IMAGE_URL)
            .to_string(),
        url: article.url.clone(),
        source: article.source.name.clone(),
        domain: extract_domain(&article.url),
        published_at: article.published_at.as_deref().and_then(parse_published_at),
    }
}

// Blank strings count as missing; the API sends `""` for some authors.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

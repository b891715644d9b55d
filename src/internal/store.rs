use super::models::Article;

/// Accumulated articles of the current query session.
///
/// Articles are kept in arrival order and never de-duplicated. The total is
/// whatever the most recent response reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleStore {
    articles: Vec<Article>,
    total_results: u64,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.articles.clear();
        self.total_results = 0;
    }

    /// Append one page and take the latest total.
    pub fn append(&mut self, articles: Vec<Article>, total_results: u64) {
        self.articles.extend(articles);
        self.total_results = total_results;
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    /// The "more" affordance: something is loaded and the server has more.
    pub fn show_more(&self) -> bool {
        !self.articles.is_empty() && (self.articles.len() as u64) < self.total_results
    }
}

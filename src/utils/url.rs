use reqwest::Url;

/// Host of an article URL for display, without a leading `www.`.
/// Example: "https://www.bbc.co.uk/news/1" -> Some("bbc.co.uk")
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then(|| host.to_string())
}

/// Replace the value of the `apiKey` query parameter so URLs can be logged.
/// Input that does not parse as a URL, or carries no key, is returned as is.
pub fn mask_api_key(url: &str) -> String {
    const PARAM: &str = "apiKey";

    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.query_pairs().any(|(key, _)| key == PARAM) {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            let value = match key == PARAM {
                true => "***".to_string(),
                false => value.into_owned(),
            };
            (key.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

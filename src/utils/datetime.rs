use jiff::Timestamp;

/// Parse an RFC 3339 `publishedAt` value into unix seconds.
pub fn parse_published_at(value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<Timestamp>()
        .ok()
        .map(|ts| ts.as_second())
}

/// Format `timestamp` relative to `now` (both unix seconds).
pub fn format_relative(timestamp: i64, now: i64) -> String {
    // Future timestamps (clock skew on the publisher side) read as "just now".
    let delta = now.saturating_sub(timestamp);
    match delta {
        d if d >= 86_400 => format!("{}d ago", d / 86_400),
        d if d >= 3_600 => format!("{}h ago", d / 3_600),
        d if d >= 60 => format!("{}m ago", d / 60),
        _ => "just now".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_717_230_600; // 2024-06-01T08:30:00Z

    #[test]
    fn parses_rfc3339() {
        assert_eq!(parse_published_at("2024-06-01T08:30:00Z"), Some(NOW));
        assert_eq!(parse_published_at(" 2024-06-01T10:30:00+02:00 "), Some(NOW));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_published_at("yesterday"), None);
        assert_eq!(parse_published_at(""), None);
    }

    #[test]
    fn formats_relative_units() {
        assert_eq!(format_relative(NOW, NOW), "just now");
        assert_eq!(format_relative(NOW + 30, NOW), "just now");
        assert_eq!(format_relative(NOW - 30, NOW), "just now");
        assert_eq!(format_relative(NOW - 5 * 60, NOW), "5m ago");
        assert_eq!(format_relative(NOW - 2 * 3_600, NOW), "2h ago");
        assert_eq!(format_relative(NOW - 3 * 86_400, NOW), "3d ago");
    }
}

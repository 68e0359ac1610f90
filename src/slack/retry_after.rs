//! `Retry-After` header parsing

/// Parse a `Retry-After` value into seconds from now
///
/// Slack sends a plain number of seconds; the HTTP-date form (RFC 7231) is
/// accepted as well. Dates in the past mean "retry now" (0).
pub fn parse_retry_after(header_value: &str) -> Option<u64> {
    if let Ok(seconds) = header_value.trim().parse::<u64>() {
        return Some(seconds);
    }

    if let Ok(target_time) = chrono::DateTime::parse_from_rfc2822(header_value.trim()) {
        let seconds = target_time
            .signed_duration_since(chrono::Utc::now())
            .num_seconds();
        return Some(seconds.max(0) as u64);
    }

    tracing::debug!(header_value, "Unparseable retry-after header");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric() {
        assert_eq!(parse_retry_after("30"), Some(30));
        assert_eq!(parse_retry_after(" 5 "), Some(5));
    }

    #[test]
    fn test_http_date_in_past() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), Some(0));
    }

    #[test]
    fn test_http_date_in_future() {
        let future = (chrono::Utc::now() + chrono::Duration::seconds(120)).to_rfc2822();
        let secs = parse_retry_after(&future).unwrap();
        assert!((100..=120).contains(&secs));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(parse_retry_after(""), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-1"), None);
    }
}

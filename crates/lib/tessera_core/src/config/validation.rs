//! Parsing and range checks for configuration values.

use chrono::Duration;

/// Lowest cost bcrypt accepts.
pub const MIN_HASH_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_HASH_COST: u32 = 31;

/// Longest accepted token lifetime, in days.
pub const MAX_TTL_DAYS: i64 = 3650;

/// Parse a lifetime such as `3600`, `90s`, `15m`, `24h` or `7d`.
/// A bare number is seconds. Zero and negative values are rejected.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&raw[..i], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let n: i64 = digits.trim().parse().ok()?;
    if n <= 0 {
        return None;
    }
    match unit {
        's' => Duration::try_seconds(n),
        'm' => Duration::try_minutes(n),
        'h' => Duration::try_hours(n),
        'd' => Duration::try_days(n),
        _ => None,
    }
}

/// Parse a bcrypt cost and check it is in range.
pub fn parse_cost(raw: &str) -> Option<u32> {
    raw.trim().parse().ok().filter(|c| cost_in_range(*c))
}

/// A lifetime must be positive and at most [`MAX_TTL_DAYS`] so that
/// `now + ttl` is always a representable token expiry.
pub fn ttl_in_range(ttl: Duration) -> bool {
    ttl > Duration::zero() && ttl <= Duration::days(MAX_TTL_DAYS)
}

pub fn cost_in_range(cost: u32) -> bool {
    (MIN_HASH_COST..=MAX_HASH_COST).contains(&cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_ttl("3600"), Some(Duration::hours(1)));
    }

    #[test]
    fn unit_suffixes() {
        assert_eq!(parse_ttl("90s"), Some(Duration::seconds(90)));
        assert_eq!(parse_ttl("15m"), Some(Duration::minutes(15)));
        assert_eq!(parse_ttl("24h"), Some(Duration::hours(24)));
        assert_eq!(parse_ttl("7d"), Some(Duration::days(7)));
        assert_eq!(parse_ttl(" 2H "), Some(Duration::hours(2)));
    }

    #[test]
    fn ttl_range() {
        assert!(ttl_in_range(Duration::seconds(1)));
        assert!(ttl_in_range(Duration::days(MAX_TTL_DAYS)));
        assert!(!ttl_in_range(Duration::zero()));
        assert!(!ttl_in_range(Duration::days(MAX_TTL_DAYS) + Duration::seconds(1)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_ttl(""), None);
        assert_eq!(parse_ttl("h"), None);
        assert_eq!(parse_ttl("0"), None);
        assert_eq!(parse_ttl("-5m"), None);
        assert_eq!(parse_ttl("10w"), None);
        assert_eq!(parse_ttl("ten minutes"), None);
    }

    #[test]
    fn cost_bounds() {
        assert_eq!(parse_cost("4"), Some(4));
        assert_eq!(parse_cost("31"), Some(31));
        assert_eq!(parse_cost("3"), None);
        assert_eq!(parse_cost("32"), None);
        assert_eq!(parse_cost("twelve"), None);
    }
}

//! Time-to-live parsing for duration strings such as `90s`, `30m` or `1h30m`.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Parse a duration string made of `<number><unit>` segments.
///
/// Supported units are `ms`, `s`, `m`, `h` and `d`; segments may be chained
/// (`1h30m`). Fractional numbers are accepted (`1.5h`).
///
/// # Returns
/// The parsed duration, or `None` when the string is empty or malformed.
pub fn parse_ttl(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let mut total = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3_600.0,
            "d" => 86_400.0,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += value * seconds_per_unit;
    }

    Duration::try_from_secs_f64(total).ok()
}

/// Resolve a caller-supplied TTL against the configured default and ceiling.
///
/// Missing, blank or unparseable input falls back to `default`.
///
/// # Errors
/// [`AppError::InvalidInput`] when the TTL is zero or exceeds `max`.
pub fn resolve_ttl(
    raw: Option<&str>,
    default: Duration,
    max: Duration,
) -> Result<chrono::Duration, AppError> {
    let ttl = match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => default,
        Some(value) => parse_ttl(value).unwrap_or_else(|| {
            tracing::debug!(ttl = value, "Unparseable TTL, using default");
            default
        }),
    };
    if ttl.is_zero() {
        return Err(AppError::InvalidInput("ttl must be positive".to_string()));
    }
    if ttl > max {
        return Err(AppError::InvalidInput(format!(
            "ttl exceeds maximum of {}",
            format_ttl(max)
        )));
    }
    chrono::Duration::from_std(ttl)
        .map_err(|_| AppError::InvalidInput("ttl out of range".to_string()))
}

/// Instant `ttl` after `now`.
///
/// # Errors
/// [`AppError::InvalidInput`] when `ttl` is not positive or lands beyond the
/// representable calendar.
pub fn expiry_after(
    now: DateTime<Utc>,
    ttl: chrono::Duration,
) -> Result<DateTime<Utc>, AppError> {
    if ttl <= chrono::Duration::zero() {
        return Err(AppError::InvalidInput("ttl must be positive".to_string()));
    }
    now.checked_add_signed(ttl)
        .ok_or_else(|| AppError::InvalidInput("ttl out of range".to_string()))
}

/// Render a duration in the same unit syntax accepted by [`parse_ttl`].
pub fn format_ttl(ttl: Duration) -> String {
    let mut secs = ttl.as_secs();
    if secs == 0 {
        return format!("{}ms", ttl.as_millis());
    }
    let mut out = String::new();
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{expiry_after, format_ttl, parse_ttl, resolve_ttl};
    use crate::error::AppError;
    use std::time::Duration;

    #[test]
    fn parse_ttl_accepts_single_and_chained_units() {
        let cases = [
            ("90s", 90),
            ("30m", 30 * 60),
            ("24h", 24 * 3600),
            ("1h30m", 5400),
            ("2d", 2 * 86_400),
            (" 1.5h ", 5400),
        ];
        for (input, expected) in cases {
            assert_eq!(
                parse_ttl(input),
                Some(Duration::from_secs(expected)),
                "input: {}",
                input
            );
        }
        assert_eq!(parse_ttl("250ms"), Some(Duration::from_millis(250)));
    }

    #[test]
    fn parse_ttl_rejects_malformed_input() {
        for input in ["", "h", "10", "10x", "1h-5m", "abc", "1..5h", "99999999999999999999999d"] {
            assert_eq!(parse_ttl(input), None, "input: {}", input);
        }
    }

    #[test]
    fn format_ttl_uses_largest_units() {
        assert_eq!(format_ttl(Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_ttl(Duration::from_secs(86_400 + 5)), "1d5s");
        assert_eq!(format_ttl(Duration::from_millis(20)), "20ms");
    }

    #[test]
    fn resolve_ttl_falls_back_to_default_and_enforces_ceiling() {
        let default = Duration::from_secs(24 * 3600);
        let max = Duration::from_secs(48 * 3600);

        let fallback = [None, Some(""), Some("  "), Some("soon")];
        for raw in fallback {
            let ttl = resolve_ttl(raw, default, max).expect("fallback");
            assert_eq!(ttl, chrono::Duration::hours(24), "raw: {:?}", raw);
        }

        let ttl = resolve_ttl(Some("90m"), default, max).expect("explicit");
        assert_eq!(ttl, chrono::Duration::minutes(90));

        for raw in ["0s", "72h"] {
            let err = resolve_ttl(Some(raw), default, max).expect_err("rejected");
            assert!(matches!(err, AppError::InvalidInput(_)), "raw: {}", raw);
        }
    }

    #[test]
    fn expiry_after_rejects_non_positive_and_overflowing_ttls() {
        let now = chrono::Utc::now();
        assert_eq!(
            expiry_after(now, chrono::Duration::minutes(5)).expect("in range"),
            now + chrono::Duration::minutes(5)
        );
        for ttl in [
            chrono::Duration::zero(),
            chrono::Duration::seconds(-1),
            chrono::Duration::days(100_000_000),
        ] {
            assert!(matches!(
                expiry_after(now, ttl),
                Err(AppError::InvalidInput(_))
            ));
        }
    }
}

//! Clock-style durations: `H:MM:SS`, `M:SS` and plain seconds.

/// Parse `H:M:S`, `M:S` or `S` into seconds.
///
/// Every part must be a plain unsigned number; more than three parts is
/// rejected.
pub fn parse_clock(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    parts.iter().try_fold(0u64, |total, part| {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u64 = part.parse().ok()?;
        total.checked_mul(60)?.checked_add(value)
    })
}

/// `1:02:03` past an hour, otherwise `2:03`.
pub fn format_clock(seconds: u64) -> String {
    let (hours, minutes, seconds) = split(seconds);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Like [`format_clock`], but under a minute shows `3s`.
pub fn format_remaining(seconds: u64) -> String {
    let (hours, minutes, secs) = split(seconds);
    if hours == 0 && minutes == 0 {
        format!("{secs}s")
    } else {
        format_clock(seconds)
    }
}

fn split(seconds: u64) -> (u64, u64, u64) {
    (seconds / 3600, seconds % 3600 / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_forms() {
        assert_eq!(parse_clock("1:02:03"), Some(3723));
        assert_eq!(parse_clock("4:05"), Some(245));
        assert_eq!(parse_clock("59"), Some(59));
        assert_eq!(parse_clock(" 0:07 "), Some(7));
    }

    #[test]
    fn test_parse_clock_rejects_garbage() {
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock("1::3"), None);
        assert_eq!(parse_clock("-1:00"), None);
        assert_eq!(parse_clock("live"), None);
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(3723), "1:02:03");
        assert_eq!(format_remaining(123), "2:03");
        assert_eq!(format_remaining(3), "3s");
        assert_eq!(format_remaining(0), "0s");
        assert_eq!(format_remaining(3600), "1:00:00");
    }

    #[test]
    fn test_format_clock_keeps_minutes() {
        assert_eq!(format_clock(5), "0:05");
        assert_eq!(format_clock(600), "10:00");
    }
}

//! Time formatting helpers.

use dao_types::Timestamp;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Countdown shown next to a protocol: time left in its voting window, or
/// `"ended"` once it has passed.
pub fn format_remaining(expires_at: Timestamp, now: Timestamp) -> String {
    if now >= expires_at {
        "ended".to_string()
    } else {
        format_duration(expires_at.as_secs() - now.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3 * 3600 + 120), "3h 2m");
        assert_eq!(format_duration(7 * 86400), "7d 0h");
    }

    #[test]
    fn remaining_window() {
        let expires = Timestamp::new(10_000);
        assert_eq!(format_remaining(expires, Timestamp::new(9_955)), "45s");
        assert_eq!(format_remaining(expires, Timestamp::new(10_000)), "ended");
        assert_eq!(format_remaining(expires, Timestamp::new(20_000)), "ended");
    }
}

// ABOUTME: Shared utility functions for Engage
// ABOUTME: ID generation and business-day SLA arithmetic

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

/// Generate a prefixed unique identifier such as `dlv-V1StGXR8_Z5jdHi6B-myT`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

/// Advance `start` by `days` business days, skipping Saturdays and Sundays.
/// The time of day is preserved.
pub fn add_business_days(start: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let mut current = start;
    let mut remaining = days;

    while remaining > 0 {
        current += Duration::days(1);
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn test_generate_id() {
        let id1 = generate_id("dlv");
        let id2 = generate_id("dlv");

        assert!(id1.starts_with("dlv-"));
        assert_eq!(id1.len(), "dlv-".len() + 21);
        assert_ne!(id1, id2);
    }

    #[rstest]
    // Monday + 3 => Thursday
    #[case(2024, 6, 3, 3, 6)]
    // Thursday + 3 => Tuesday (skips weekend)
    #[case(2024, 6, 6, 3, 11)]
    // Friday + 1 => Monday
    #[case(2024, 6, 7, 1, 10)]
    // Saturday + 1 => Monday
    #[case(2024, 6, 8, 1, 10)]
    // Zero days leaves the date unchanged
    #[case(2024, 6, 8, 0, 8)]
    fn test_add_business_days(
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
        #[case] days: u32,
        #[case] expected_day: u32,
    ) {
        let start = Utc.with_ymd_and_hms(year, month, day, 14, 30, 0).unwrap();
        let due = add_business_days(start, days);

        assert_eq!(due.day(), expected_day);
        assert_eq!(due.month(), month);
        assert_eq!(due.time(), start.time());
    }
}

//! Foundational low-level utilities shared across shipit crates.
//!
//! Provides the clock helpers used by Slack request signature skew checks.

pub mod time_utils;

pub use time_utils::{current_unix_timestamp, unix_skew_seconds};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_unix_timestamp_is_after_2020() {
        assert!(current_unix_timestamp() > 1_577_836_800);
    }

    #[test]
    fn unix_skew_seconds_is_symmetric() {
        assert_eq!(unix_skew_seconds(100, 160), 60);
        assert_eq!(unix_skew_seconds(160, 100), 60);
        assert_eq!(unix_skew_seconds(42, 42), 0);
    }
}

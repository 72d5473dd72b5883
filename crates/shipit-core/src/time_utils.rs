/// Returns the current Unix timestamp in seconds.
pub fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Absolute distance in seconds between two Unix timestamps.
pub fn unix_skew_seconds(left_unix: u64, right_unix: u64) -> u64 {
    left_unix.abs_diff(right_unix)
}

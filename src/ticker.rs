use std::time::Duration;

/// Default event poll interval in milliseconds.
/// Short enough that swipe debounce deadlines resolve promptly.
pub const DEFAULT_TICK_MS: u64 = 50;

/// Get tick duration
pub fn tick_duration(tick_ms: u64) -> Duration {
    Duration::from_millis(tick_ms.max(1))
}

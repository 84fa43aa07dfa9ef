use chrono::Utc;

/// Wall-clock time in milliseconds since the Unix epoch.
///
/// All timestamps carried in state and event payloads use this unit.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

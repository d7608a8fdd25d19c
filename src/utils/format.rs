//! Timer text derivation

/// Format remaining milliseconds as `MM:SS`.
///
/// Milliseconds are truncated to whole seconds, never rounded.
pub fn format_time(remaining_millis: u64) -> String {
    let total_seconds = remaining_millis / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

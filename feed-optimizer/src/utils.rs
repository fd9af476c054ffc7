/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Text helpers for log output
pub mod text {
    use super::truncate_to_char_boundary;

    /// Shorten text for a single log line, marking the cut with an ellipsis.
    pub fn preview(text: &str, max_bytes: usize) -> String {
        let text = text.trim();
        let cut = truncate_to_char_boundary(text, max_bytes);
        if cut.len() < text.len() {
            format!("{}...", cut.trim_end())
        } else {
            cut.to_string()
        }
    }
}

/// Time helpers
pub mod time {
    use std::time::Duration;

    /// Format duration in human-readable form
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();

        if total_seconds < 60 {
            format!("{:.1}s", duration.as_secs_f64())
        } else if total_seconds < 3600 {
            format!("{}m{}s", total_seconds / 60, total_seconds % 60)
        } else {
            format!("{}h{}m", total_seconds / 3600, (total_seconds % 3600) / 60)
        }
    }
}

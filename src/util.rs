// src/util.rs — Shared string helpers for display and log lines

/// Longest prefix of `s` that fits in `max_len` bytes without splitting a
/// UTF-8 character.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// First line of `s`, cut to `max_len` bytes with a trailing `...` when
/// anything was dropped.
pub fn preview(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    let multiline = first_line.len() < s.trim_end().len();
    if first_line.len() <= max_len && !multiline {
        return first_line.to_string();
    }
    let budget = max_len.saturating_sub(3);
    format!("{}...", truncate_str(first_line, budget))
}

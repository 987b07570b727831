//! Small helpers shared across modules

/// Cut `s` to at most `max_len` bytes on a char boundary, marking the cut with "..."
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let end = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|i| *i <= max_len)
        .last()
        .unwrap_or(0);
    format!("{}...", &s[..end])
}

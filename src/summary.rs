/// Word count kept by [`truncate_words`] unless configured otherwise
pub const DEFAULT_SUMMARY_WORDS: usize = 100;

/// Placeholder "summary": the first `max_words` words followed by `...`.
///
/// Text with `max_words` words or fewer comes back unchanged, whitespace included.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        text.to_string()
    }
}

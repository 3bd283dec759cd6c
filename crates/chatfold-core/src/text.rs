/// Titles longer than this are truncated before being surfaced.
pub const MAX_TITLE_CHARS: usize = 100;

/// Number of characters kept when a title is truncated.
pub const TRUNCATED_TITLE_CHARS: usize = 90;

pub const ELLIPSIS: &str = "...";

/// Collapse every whitespace run (including newlines) to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cap a title at [`MAX_TITLE_CHARS`]; longer titles keep their first
/// [`TRUNCATED_TITLE_CHARS`] characters followed by [`ELLIPSIS`].
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let mut out: String = title.chars().take(TRUNCATED_TITLE_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}

// ABOUTME: Presentation helpers that map post fields to display strings.
// ABOUTME: Covers long-form en-US dates, reading time labels, avatar initials, and share excerpts.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::Post;

/// Number of characters of raw content included in a share excerpt.
pub const SHARE_EXCERPT_CHARS: usize = 100;

/// Format an ISO-8601 timestamp as a long en-US date, e.g. "January 5, 2025".
/// Full timestamps are shown in UTC. Input that does not parse is returned
/// unchanged.
pub fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).format("%B %-d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%B %-d, %Y").to_string();
    }
    raw.to_string()
}

/// "{n} min read"
pub fn reading_time_label(minutes: u32) -> String {
    format!("{} min read", minutes)
}

/// Up to two uppercase initials from a display name, for the avatar.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

/// The first [`SHARE_EXCERPT_CHARS`] characters of the raw content followed by
/// an ellipsis. The ellipsis is appended even when the content is shorter.
pub fn share_excerpt(content: &str) -> String {
    let head: String = content.chars().take(SHARE_EXCERPT_CHARS).collect();
    format!("{}...", head)
}

/// Link to the public view page of a post.
pub fn view_href(post_id: &str) -> String {
    format!("/posts/{}", post_id)
}

/// Link to the edit page of a post.
pub fn edit_href(post_id: &str) -> String {
    format!("/posts/{}/edit", post_id)
}

/// Author display name, empty when the post has no author.
pub fn author_name(post: &Post) -> String {
    post.author
        .as_ref()
        .map(|a| a.name.clone())
        .unwrap_or_default()
}

// ABOUTME: JSON API handlers for postview.
// ABOUTME: Sanitized post lookup and SSE streaming of a page session's rendered view.

pub mod posts;
pub mod stream;

// ABOUTME: The single HTML trust boundary between external content and rendered pages.
// ABOUTME: Defines the Sanitizer trait, the fixed render allow-list, and an ammonia-backed implementation.

use std::collections::{HashMap, HashSet};

/// Tags allowed to survive the render gate.
pub const RENDER_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "ul", "ol", "li", "br", "strong", "em",
];

/// Attributes allowed to survive the render gate. None at all: no inline
/// styles, no event handlers, no href or src.
pub const RENDER_ATTRIBUTES: &[&str] = &[];

/// An allow-list of tags and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    pub tags: HashSet<&'static str>,
    pub attributes: HashSet<&'static str>,
}

impl SanitizePolicy {
    /// The policy used for every piece of external HTML that reaches a page.
    pub fn render() -> Self {
        Self {
            tags: RENDER_TAGS.iter().copied().collect(),
            attributes: RENDER_ATTRIBUTES.iter().copied().collect(),
        }
    }
}

/// Strips disallowed markup from arbitrary HTML.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str, policy: &SanitizePolicy) -> String;
}

/// Sanitizer backed by `ammonia`. Disallowed tags are unwrapped (their text
/// survives) except `script` and `style`, whose contents are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct AmmoniaSanitizer;

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str, policy: &SanitizePolicy) -> String {
        let tags: HashSet<&str> = policy.tags.iter().copied().collect();
        let attributes: HashSet<&str> = policy.attributes.iter().copied().collect();

        ammonia::Builder::default()
            .tags(tags)
            .generic_attributes(attributes)
            .tag_attributes(HashMap::new())
            .generic_attribute_prefixes(HashSet::new())
            .url_schemes(HashSet::new())
            .link_rel(None)
            .strip_comments(true)
            .clean(html)
            .to_string()
    }
}

/// Run `html` through the render policy.
pub fn sanitize_for_render(sanitizer: &dyn Sanitizer, html: &str) -> String {
    sanitizer.sanitize(html, &SanitizePolicy::render())
}

//! Discovery of marked images and naming of their relocated copies

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Absolute URL whose last path segment carries a file extension
///
/// Parentheses are legal in the path (`photo(1).jpg`); a trailing `)` from a
/// CSS `url(...)` is left out because the extension must be alphanumeric.
static FILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s"'<>(),/]+/(?:[^\s"'<>,]*/)?[^\s"'<>,/]+\.[A-Za-z0-9]+"#)
        .expect("Invalid file URL regex")
});

/// Finds every absolute file URL inside an attribute value
///
/// `srcset`-style values yield one URL per candidate.
pub fn absolute_file_urls(value: &str) -> Vec<&str> {
    FILE_URL
        .find_iter(value)
        .filter(|m| {
            // The extension has to end the path, not a directory name
            value[m.end()..]
                .chars()
                .next()
                .map_or(true, |c| c != '/' && !c.is_ascii_alphanumeric())
        })
        .map(|m| m.as_str())
        .collect()
}

/// Collects the image URLs of every `<img>` carrying `marker`
///
/// All attributes of a marked image are inspected, so `src`, `srcset`, and
/// lazy-loading variants are all picked up. Each URL is returned once; images
/// are visited in document order.
pub fn marked_image_urls(html: &str, marker: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(&format!("img[{}]", marker)) else {
        tracing::warn!("Image marker '{}' is not a valid attribute name", marker);
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for element in document.select(&selector) {
        for (_, value) in element.value().attrs() {
            for url in absolute_file_urls(value) {
                if seen.insert(url.to_string()) {
                    urls.push(url.to_string());
                }
            }
        }
    }

    urls
}

/// File name a relocated image is stored under
///
/// This is the percent-decoded last path segment of the URL. Path separators
/// that appear after decoding are replaced so the file stays inside the
/// assets directory.
pub fn image_file_name(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_else(|| url.rsplit('/').next().unwrap_or(url).to_string());

    let decoded = urlencoding::decode(&segment)
        .map(|cow| cow.into_owned())
        .unwrap_or(segment);

    decoded.replace(['/', '\\'], "_")
}

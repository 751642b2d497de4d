//! Sitemap parsing and generation

use crate::url::{manifest_path, strip_origin};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;

/// Manifest path of the site's error page, always exported
pub const NOT_FOUND_PATH: &str = "404";

/// Extracts the text of every `<loc>` element, whitespace trimmed
///
/// Entities and CDATA sections are decoded. A malformed document keeps the
/// values read before the error.
fn loc_values(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                if let Some(value) = current.take() {
                    let value = value.trim();
                    if !value.is_empty() {
                        out.push(value.to_string());
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(value) = current.as_mut() {
                    match e.unescape() {
                        Ok(text) => value.push_str(&text),
                        Err(err) => {
                            tracing::warn!(
                                "Sitemap entity error at {}: {}",
                                reader.buffer_position(),
                                err
                            );
                            break;
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(value) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!(
                    "Sitemap parse error at {}: {}",
                    reader.buffer_position(),
                    err
                );
                break;
            }
            _ => {}
        }
    }

    out
}

/// Turns a sitemap document into manifest paths
///
/// Each `<loc>` loses its scheme and host and any surrounding slashes. The
/// home page entry becomes empty and is dropped. Duplicates collapse, and
/// `"404"` is always the last path whether or not the sitemap lists it.
///
/// # Example
///
/// ```
/// use flowbake::crawler::paths_from_sitemap;
///
/// let xml = "<urlset><url><loc>https://dev.example/about/</loc></url>\
///            <url><loc>https://dev.example/</loc></url></urlset>";
/// assert_eq!(paths_from_sitemap(xml), vec!["about", "404"]);
/// ```
pub fn paths_from_sitemap(xml: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for loc in loc_values(xml) {
        let path = manifest_path(strip_origin(&loc));
        if path.is_empty() || path == NOT_FOUND_PATH {
            continue;
        }
        if seen.insert(path.to_string()) {
            paths.push(path.to_string());
        }
    }

    paths.push(NOT_FOUND_PATH.to_string());
    paths
}

/// Synthesizes a sitemap for a site that does not publish one
///
/// The home page comes first, followed by each path in order.
pub fn generate_sitemap<S: AsRef<str>>(target_host: &str, paths: &[S]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    push_url(&mut xml, &format!("{}/", target_host));
    for path in paths {
        let path = manifest_path(path.as_ref());
        if path.is_empty() {
            continue;
        }
        push_url(&mut xml, &format!("{}/{}", target_host, path));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str) {
    xml.push_str("  <url>\n    <loc>");
    xml.push_str(&escape(loc));
    xml.push_str("</loc>\n  </url>\n");
}

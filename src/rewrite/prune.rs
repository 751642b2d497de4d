//! Unused style rule pruning
//!
//! Every page of a site links the same master stylesheet, but any single page
//! only uses a fraction of it. Before a stylesheet is inlined into a page it
//! is reduced to the rules whose selectors the page (markup plus script) can
//! actually reference.

use std::collections::HashSet;

/// Reduces a stylesheet to the rules referenced by a set of usage sources
pub trait StylePruner: Send + Sync {
    /// Returns the subset of `stylesheet` referenced by `sources`
    fn prune(&self, sources: &[&str], stylesheet: &str) -> String;
}

/// Pruner that keeps the stylesheet unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAllPruner;

impl StylePruner for KeepAllPruner {
    fn prune(&self, _sources: &[&str], stylesheet: &str) -> String {
        stylesheet.to_string()
    }
}

/// Pruner that keeps selectors whose classes and ids appear in the sources
///
/// # Rules
///
/// - A selector is used when every `.class` and `#id` it names occurs as a
///   word in one of the sources. Selectors naming neither (`body`, `*`,
///   `::selection`) are always used. Anything inside `[...]` or `(...)` is
///   ignored, which errs on the side of keeping rules.
/// - A style rule keeps its used selectors and is dropped when none remain.
/// - `@media`, `@supports`, `@document`, and `@layer` blocks are pruned
///   recursively and dropped when they end up empty.
/// - Every other at-rule (`@font-face`, `@keyframes`, `@import`, ...) is kept.
/// - Comments are removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsedSelectorPruner;

impl StylePruner for UsedSelectorPruner {
    fn prune(&self, sources: &[&str], stylesheet: &str) -> String {
        let used = usage_words(sources);
        let css = strip_comments(stylesheet);
        let mut out = String::with_capacity(css.len() / 2);
        prune_into(&css, &used, &mut out);
        out
    }
}

const GROUPING_RULES: &[&str] = &["media", "supports", "document", "layer"];

#[derive(Debug, PartialEq, Eq)]
enum CssItem<'a> {
    /// `@import …;` and friends
    Statement(&'a str),
    /// `prelude { body }`
    Block { prelude: &'a str, body: &'a str },
}

fn prune_into(css: &str, used: &HashSet<&str>, out: &mut String) {
    for item in css_items(css) {
        match item {
            CssItem::Statement(statement) => {
                out.push_str(statement);
                out.push_str(";\n");
            }
            CssItem::Block { prelude, body } if prelude.starts_with('@') => {
                if GROUPING_RULES.contains(&at_rule_name(prelude).as_str()) {
                    let mut inner = String::new();
                    prune_into(body, used, &mut inner);
                    if !inner.trim().is_empty() {
                        out.push_str(prelude);
                        out.push_str("{\n");
                        out.push_str(&inner);
                        out.push_str("}\n");
                    }
                } else {
                    out.push_str(prelude);
                    out.push('{');
                    out.push_str(body);
                    out.push_str("}\n");
                }
            }
            CssItem::Block { prelude, body } => {
                let kept: Vec<&str> = split_selectors(prelude)
                    .into_iter()
                    .filter(|selector| selector_is_used(selector, used))
                    .collect();
                if !kept.is_empty() {
                    out.push_str(&kept.join(","));
                    out.push('{');
                    out.push_str(body);
                    out.push_str("}\n");
                }
            }
        }
    }
}

/// Every maximal run of identifier characters in the sources
fn usage_words<'a>(sources: &[&'a str]) -> HashSet<&'a str> {
    sources
        .iter()
        .flat_map(|source| source.split(|c: char| !is_ident_char(c)))
        .filter(|word| !word.is_empty())
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Lowercased name of an at-rule prelude (`@media screen` → `media`)
fn at_rule_name(prelude: &str) -> String {
    prelude
        .trim_start_matches('@')
        .chars()
        .take_while(|c| is_ident_char(*c))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Index just past the string literal opening at `start`
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn strip_comments(css: &str) -> String {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&css[copied..i]);
                let end = css[i + 2..]
                    .find("*/")
                    .map(|p| i + 2 + p + 2)
                    .unwrap_or(bytes.len());
                i = end;
                copied = end;
            }
            _ => i += 1,
        }
    }

    out.push_str(&css[copied..]);
    out
}

/// Index of the `}` closing the block opened at `open`, or the input length
fn matching_brace(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Splits a (comment-free) stylesheet into top-level statements and blocks
fn css_items(css: &str) -> Vec<CssItem<'_>> {
    let bytes = css.as_bytes();
    let mut items = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b';' => {
                let statement = css[start..i].trim();
                if !statement.is_empty() {
                    items.push(CssItem::Statement(statement));
                }
                i += 1;
                start = i;
            }
            b'{' => {
                let close = matching_brace(bytes, i);
                items.push(CssItem::Block {
                    prelude: css[start..i].trim(),
                    body: &css[i + 1..close],
                });
                i = (close + 1).min(bytes.len());
                start = i;
            }
            b'}' => {
                // Stray closing brace
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }

    let trailing = css[start.min(bytes.len())..].trim();
    if !trailing.is_empty() {
        items.push(CssItem::Statement(trailing));
    }
    items
}

/// Splits a selector list on top-level commas
fn split_selectors(prelude: &str) -> Vec<&str> {
    let bytes = prelude.as_bytes();
    let mut selectors = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b',' if depth == 0 => {
                selectors.push(prelude[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    selectors.push(prelude[start.min(bytes.len())..].trim());

    selectors.retain(|s| !s.is_empty());
    selectors
}

fn selector_is_used(selector: &str, used: &HashSet<&str>) -> bool {
    let mut chars = selector.chars().peekable();
    let mut depth = 0i32;

    while let Some(c) = chars.next() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '\\' => {
                chars.next();
            }
            '.' | '#' if depth == 0 => {
                let mut name = String::new();
                let mut escaped = false;
                while let Some(&next) = chars.peek() {
                    if next == '\\' {
                        escaped = true;
                        chars.next();
                        if let Some(literal) = chars.next() {
                            name.push(literal);
                        }
                    } else if is_ident_char(next) {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Escaped names never appear verbatim in markup; keep them.
                if !escaped && !name.is_empty() && !used.contains(name.as_str()) {
                    return false;
                }
            }
            _ => {}
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS: &str = r#"/* header */
@charset "utf-8";
@import url("fonts.css");
body{margin:0}
.used{color:red}
.unused{color:blue}
.a, .b{x:y}
#hero .used{padding:0}
#missing .used{padding:1px}
@media (max-width: 767px){.unused{display:none}}
@media print{.used{color:black}}
@font-face{font-family:"X";src:url("x.woff")}
@keyframes spin{from{transform:rotate(0)}to{transform:rotate(360deg)}}
.content::after{content:"}"}
"#;

    fn pruned() -> String {
        let html = r#"<div id="hero" class="used b"><span class="content"></span></div>"#;
        let script = "el.classList.add('js-added')";
        UsedSelectorPruner.prune(&[html, script], CSS)
    }

    #[test]
    fn test_keeps_used_rules() {
        let css = pruned();
        assert!(css.contains("body{margin:0}"));
        assert!(css.contains(".used{color:red}"));
        assert!(css.contains("#hero .used{padding:0}"));
    }

    #[test]
    fn test_drops_unused_rules() {
        let css = pruned();
        assert!(!css.contains(".unused"));
        assert!(!css.contains("#missing"));
    }

    #[test]
    fn test_selector_lists_are_filtered() {
        let css = pruned();
        assert!(css.contains(".b{x:y}"));
        assert!(!css.contains(".a"));
    }

    #[test]
    fn test_grouping_rules_recurse() {
        let css = pruned();
        assert!(!css.contains("max-width"));
        assert!(css.contains("@media print{\n.used{color:black}\n}"));
    }

    #[test]
    fn test_other_at_rules_kept() {
        let css = pruned();
        assert!(css.contains("@charset \"utf-8\";"));
        assert!(css.contains("@import url(\"fonts.css\");"));
        assert!(css.contains("@font-face{font-family:\"X\";src:url(\"x.woff\")}"));
        assert!(css.contains("@keyframes spin{from{transform:rotate(0)}to{transform:rotate(360deg)}}"));
    }

    #[test]
    fn test_strings_and_comments() {
        let css = pruned();
        assert!(!css.contains("header"));
        assert!(css.contains(".content::after{content:\"}\"}"));
    }

    #[test]
    fn test_script_usage_counts() {
        let css = UsedSelectorPruner.prune(
            &["<div></div>", "el.classList.add('w--open')"],
            ".w--open{display:block}.w--closed{display:none}",
        );
        assert_eq!(css, ".w--open{display:block}\n");
    }

    #[test]
    fn test_pseudo_arguments_ignored() {
        let used: HashSet<&str> = ["nav"].into_iter().collect();
        assert!(selector_is_used(".nav:not(.hidden)", &used));
        assert!(selector_is_used("a[href$=\".pdf\"]", &used));
        assert!(!selector_is_used(".nav .menu", &used));
    }

    #[test]
    fn test_split_selectors() {
        assert_eq!(
            split_selectors(".a, .b:is(.c, .d) , [data-x=\"1,2\"]"),
            vec![".a", ".b:is(.c, .d)", "[data-x=\"1,2\"]"]
        );
    }

    #[test]
    fn test_keep_all() {
        assert_eq!(KeepAllPruner.prune(&[], CSS), CSS);
    }

    #[test]
    fn test_unterminated_block() {
        let css = UsedSelectorPruner.prune(&["x"], ".x{color:red");
        assert_eq!(css, ".x{color:red}\n");
    }
}

/// Prefix leading from a page's output file back to the bundle root
///
/// A page at `about` is written to `about.html` next to the shared assets, so
/// its prefix is `./`. Every `/` in the manifest path adds one directory
/// level: `blog/post` needs `../`, `a/b/c` needs `../../`.
///
/// # Examples
///
/// ```
/// use flowbake::rewrite::relative_prefix;
///
/// assert_eq!(relative_prefix("index"), "./");
/// assert_eq!(relative_prefix("blog/post-1"), "../");
/// ```
pub fn relative_prefix(path: &str) -> String {
    match path.matches('/').count() {
        0 => "./".to_string(),
        depth => "../".repeat(depth),
    }
}

/// Output file of a manifest path, relative to the bundle root
pub fn page_file(path: &str) -> String {
    format!("{}.html", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_pages() {
        assert_eq!(relative_prefix("index"), "./");
        assert_eq!(relative_prefix("404"), "./");
        assert_eq!(relative_prefix("about"), "./");
    }

    #[test]
    fn test_nested_pages() {
        assert_eq!(relative_prefix("blog/post"), "../");
        assert_eq!(relative_prefix("a/b/c"), "../../");
        assert_eq!(relative_prefix("a/b/c/d"), "../../../");
    }

    #[test]
    fn test_page_file() {
        assert_eq!(page_file("index"), "index.html");
        assert_eq!(page_file("blog/post"), "blog/post.html");
    }
}

//! HTML file renderer
//!
//! Locates the target element with a regex over the raw markup and
//! splices the new text between its opening tag and the matching close
//! tag. Same-name children are counted so nested markup stays balanced.

use super::{RenderError, Renderer, Selector};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Opening tag carrying a quoted class attribute
const OPEN_TAG_PATTERN: &str =
    r#"(?i)<([a-z][a-z0-9-]*)\b[^>]*?\sclass\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>"#;

/// Any opening or closing tag
const ANY_TAG_PATTERN: &str = r"(?i)<(/?)([a-z][a-z0-9-]*)\b[^>]*>";

/// An HTML file whose target element is rewritten on every render
///
/// Only the inner text of the first element whose class list contains
/// the selector's class is touched. The rest of the file is preserved
/// byte for byte.
#[derive(Debug)]
pub struct HtmlDocument {
    path: PathBuf,
    open_tag: Regex,
    any_tag: Regex,
}

impl HtmlDocument {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| RenderError::Io(std::io::Error::other(e.to_string())))
        };

        Ok(Self {
            path: path.into(),
            open_tag: compile(OPEN_TAG_PATTERN)?,
            any_tag: compile(ANY_TAG_PATTERN)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte range of the target element's contents, if it exists
    fn find_inner(&self, html: &str, class: &str) -> Option<(usize, usize)> {
        for caps in self.open_tag.captures_iter(html) {
            let tag = caps.get(0)?;
            let classes = caps.get(2).or_else(|| caps.get(3))?.as_str();

            if !classes.split_whitespace().any(|c| c == class) {
                continue;
            }
            if tag.as_str().ends_with("/>") {
                continue;
            }

            let name = caps.get(1)?.as_str();
            let start = tag.end();
            let end = self.matching_close(html, start, name)?;
            return Some((start, end));
        }

        None
    }

    /// Offset of the close tag pairing with an element opened before `from`
    fn matching_close(&self, html: &str, from: usize, name: &str) -> Option<usize> {
        let mut depth = 0usize;

        for caps in self.any_tag.captures_iter(&html[from..]) {
            let tag = caps.get(0)?;
            if !caps.get(2)?.as_str().eq_ignore_ascii_case(name) {
                continue;
            }

            let closing = !caps.get(1)?.as_str().is_empty();
            if closing {
                if depth == 0 {
                    return Some(from + tag.start());
                }
                depth -= 1;
            } else if !tag.as_str().ends_with("/>") {
                depth += 1;
            }
        }

        None
    }
}

impl Renderer for HtmlDocument {
    fn render(&self, selector: &Selector, text: &str) -> Result<bool, RenderError> {
        let html = std::fs::read_to_string(&self.path)?;

        let Some((start, end)) = self.find_inner(&html, selector.class()) else {
            tracing::trace!("No {} element in {:?}", selector, self.path);
            return Ok(false);
        };

        let mut updated = String::with_capacity(html.len() + text.len());
        updated.push_str(&html[..start]);
        updated.push_str(&escape_text(text));
        updated.push_str(&html[end..]);

        std::fs::write(&self.path, updated)?;
        Ok(true)
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_doc(html: &str) -> (HtmlDocument, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("post.html");
        std::fs::write(&path, html).unwrap();
        (HtmlDocument::new(path).unwrap(), dir)
    }

    fn read(doc: &HtmlDocument) -> String {
        std::fs::read_to_string(doc.path()).unwrap()
    }

    #[test]
    fn test_replaces_inner_text() {
        let (doc, _dir) = write_doc(
            r#"<article><span class="meta views-count">loading</span><p>body</p></article>"#,
        );

        assert!(doc.render(&Selector::default(), "5.001k views").unwrap());
        assert_eq!(
            read(&doc),
            r#"<article><span class="meta views-count">5.001k views</span><p>body</p></article>"#
        );

        // A second render replaces the previous text
        assert!(doc.render(&Selector::default(), "5.003k views").unwrap());
        assert!(read(&doc).contains(">5.003k views</span>"));
    }

    #[test]
    fn test_missing_element_leaves_file_untouched() {
        let original = r#"<div class="views-counter">12</div><div class='count'>1</div>"#;
        let (doc, _dir) = write_doc(original);

        assert!(!doc.render(&Selector::default(), "5.001k views").unwrap());
        assert_eq!(read(&doc), original);
    }

    #[test]
    fn test_first_match_only_and_single_quotes() {
        let (doc, _dir) = write_doc(
            "<P class='views-count'>a</P>\n<p class=\"views-count\">b</p>",
        );

        assert!(doc.render(&Selector::default(), "999 views").unwrap());
        assert_eq!(
            read(&doc),
            "<P class='views-count'>999 views</P>\n<p class=\"views-count\">b</p>"
        );
    }

    #[test]
    fn test_self_closing_element_is_skipped() {
        let original = r#"<span class="views-count"/>"#;
        let (doc, _dir) = write_doc(original);

        assert!(!doc.render(&Selector::default(), "1 views").unwrap());
        assert_eq!(read(&doc), original);
    }

    #[test]
    fn test_nested_same_tag_children_are_replaced_whole() {
        let (doc, _dir) = write_doc(
            r#"<div class="views-count"><div>old</div><div><div>x</div></div></div><p>x</p>"#,
        );

        assert!(doc.render(&Selector::default(), "5.001k views").unwrap());
        assert_eq!(
            read(&doc),
            r#"<div class="views-count">5.001k views</div><p>x</p>"#
        );
    }

    #[test]
    fn test_unclosed_element_is_not_a_match() {
        let original = r#"<div class="views-count"><div>old</div>"#;
        let (doc, _dir) = write_doc(original);

        assert!(!doc.render(&Selector::default(), "1 views").unwrap());
        assert_eq!(read(&doc), original);
    }

    #[test]
    fn test_data_class_attribute_is_not_a_class() {
        let original = r#"<span data-class="views-count">12</span>"#;
        let (doc, _dir) = write_doc(original);

        assert!(!doc.render(&Selector::default(), "5.001k views").unwrap());
        assert_eq!(read(&doc), original);
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(escape_text("<b>&"), "&lt;b&gt;&amp;");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let doc = HtmlDocument::new(dir.path().join("absent.html")).unwrap();
        assert!(matches!(
            doc.render(&Selector::default(), "1 views"),
            Err(RenderError::Io(_))
        ));
    }
}

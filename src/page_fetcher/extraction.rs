//! Main readable content extraction
//!
//! Finds the primary content container of a page, strips page chrome
//! (navigation, headers, footers, sidebars, scripts) and converts what is
//! left to markdown. Tables and user comment sections are kept.

use anyhow::Result;
use ego_tree::NodeId;
use htmd::HtmlToMarkdown;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::utils::squeeze_blank_lines;

/// Pages larger than this are rejected instead of parsed (10 MB)
pub const MAX_HTML_SIZE: usize = 10 * 1024 * 1024;

/// Deeper subtrees are truncated during serialization
const MAX_NESTING_DEPTH: usize = 100;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Containers tried in priority order; the first match wins
static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "main",
        "article",
        "[role='main']",
        "#main-content",
        ".main-content",
        "#content",
        ".content",
        ".post-content",
        ".entry-content",
        "[itemprop='articleBody']",
        ".article-body",
        ".story-body",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("BUG: hardcoded content selector is invalid"))
    .collect()
});

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid"));

/// Page chrome removed from whichever container was chosen
static CHROME_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "script",
        "style",
        "noscript",
        "template",
        "iframe",
        "form",
        "nav",
        "header",
        "footer",
        "aside",
        ".sidebar",
        "#sidebar",
        ".navigation",
        ".menu",
        ".ads",
        ".advertisement",
        ".social-share",
        ".related-posts",
        ".cookie-notice",
        ".popup",
        ".modal",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("BUG: hardcoded chrome selector is invalid"))
    .collect()
});

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript", "template"])
        .build()
}

/// Extract the main readable content of `html` as markdown
///
/// Returns `Ok(None)` when the page has no readable text at all.
pub fn extract_main_content(html: &str) -> Result<Option<String>> {
    if html.len() > MAX_HTML_SIZE {
        anyhow::bail!(
            "Page too large to extract: {} bytes (maximum {MAX_HTML_SIZE})",
            html.len()
        );
    }

    let document = Html::parse_document(html);
    let container = CONTENT_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())
        .or_else(|| document.select(&BODY).next());

    let cleaned = match container {
        Some(element) => strip_page_chrome(&element),
        None => return Ok(None),
    };

    let markdown = converter().convert(&cleaned)?;
    let markdown = squeeze_blank_lines(&markdown);

    if markdown.is_empty() {
        Ok(None)
    } else {
        Ok(Some(markdown))
    }
}

/// Serialize `element`'s children, skipping every chrome subtree
fn strip_page_chrome(element: &ElementRef) -> String {
    let to_remove: HashSet<NodeId> = CHROME_SELECTORS
        .iter()
        .flat_map(|selector| element.select(selector).map(|e| e.id()))
        .collect();

    let mut output = String::new();
    serialize_children(element, &to_remove, &mut output, 0);
    output
}

fn serialize_children(element: &ElementRef, to_remove: &HashSet<NodeId>, output: &mut String, depth: usize) {
    if depth > MAX_NESTING_DEPTH {
        tracing::warn!(
            element = element.value().name(),
            "Maximum HTML nesting depth {MAX_NESTING_DEPTH} exceeded; truncating subtree"
        );
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_escaped(output, text),
            Node::Element(_) => {
                let Some(child_elem) = ElementRef::wrap(child) else {
                    continue;
                };
                if to_remove.contains(&child_elem.id()) {
                    continue;
                }

                let name = child_elem.value().name();
                output.push('<');
                output.push_str(name);
                for (attr, value) in child_elem.value().attrs() {
                    output.push(' ');
                    output.push_str(attr);
                    output.push_str("=\"");
                    push_escaped(output, value);
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&name) {
                    continue;
                }

                serialize_children(&child_elem, to_remove, output, depth + 1);
                output.push_str("</");
                output.push_str(name);
                output.push('>');
            }
            _ => {}
        }
    }
}

fn push_escaped(output: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            c => output.push(c),
        }
    }
}

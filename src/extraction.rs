//! Visible-text extraction from raw HTML.
//!
//! The classifier operates on what a reader would see, not on markup:
//! `<script>`/`<style>` contents and all tags are stripped, and whitespace
//! is collapsed. Both the oracle and the trainer feed the same cleaned text
//! through the model, so this function is shared between them.

use scraper::{Html, Node};

/// Extract the visible text of an HTML document as a single
/// whitespace-collapsed string.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut pieces: Vec<&str> = Vec::new();
    for node in document.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            if text.trim().is_empty() {
                continue;
            }
            if under_non_content_tag(&node) {
                continue;
            }
            pieces.push(text);
        }
    }

    let joined = pieces.join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a text node sits directly inside a tag whose content is never
/// rendered as text.
fn under_non_content_tag(node: &ego_tree::NodeRef<'_, Node>) -> bool {
    node.parent()
        .and_then(|parent| match parent.value() {
            Node::Element(el) => Some(el.name().to_ascii_lowercase()),
            _ => None,
        })
        .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript"))
}

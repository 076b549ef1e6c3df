//! Structure-preserving adversarial text perturbation.
//!
//! Rewrites the text nodes of an HTML document so that a human reader sees
//! the same page while its lexical surface shifts enough to move a
//! text-based classifier. Tag names and attributes are untouched; the only
//! structural change is one provenance marker appended to `<head>`.
//!
//! Three transforms run in fixed order on every non-empty text node:
//!
//! 1. random capitalization (each letter upper-cased with probability 0.15)
//! 2. stopword injection (one filler word before every 7th word)
//! 3. benign paraphrase substitution (phishing phrases swapped for
//!    neutral equivalents, matched case-insensitively)

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use scraper::{Html, Node};
use std::sync::OnceLock;

/// Probability that any single alphabetic character is upper-cased.
pub const CAPITALIZE_P: f64 = 0.15;

/// A filler word is injected before every `INJECT_EVERY`-th word.
pub const INJECT_EVERY: usize = 7;

const FILLERS: [&str; 5] = ["just", "only", "really", "very", "kind of"];

const PARAPHRASES: [(&str, &str); 3] = [
    ("log in", "sign in"),
    ("verify", "confirm"),
    ("account", "user account"),
];

/// Perturb an HTML document with a thread-local random source.
pub fn perturb(html: &str) -> String {
    perturb_with(html, &mut rand::thread_rng())
}

/// Perturb with a fixed seed. Output is reproducible, for tests.
pub fn perturb_seeded(html: &str, seed: u64) -> String {
    perturb_with(html, &mut StdRng::seed_from_u64(seed))
}

/// Perturb an HTML document using the given random source.
///
/// Pure over its inputs: no network, no storage. Script and style contents
/// are left alone so the output stays renderable.
pub fn perturb_with<R: Rng>(html: &str, rng: &mut R) -> String {
    let mut document = Html::parse_document(html);

    let text_nodes: Vec<ego_tree::NodeId> = document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) if !text.trim().is_empty() && !in_raw_tag(&node) => Some(node.id()),
            _ => None,
        })
        .collect();

    for id in text_nodes {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Text(text) = node.value() {
                let original = text.text.to_string();
                let transformed =
                    benign_paraphrase(&inject_stopwords(&randomize_caps(&original, rng), rng));
                text.text = transformed.as_str().into();
            }
        }
    }

    let mut out = document.root_element().html();
    insert_marker(&mut out, rng.gen_range(0..10_000));
    out
}

fn in_raw_tag(node: &ego_tree::NodeRef<'_, Node>) -> bool {
    node.parent()
        .and_then(|parent| match parent.value() {
            Node::Element(el) => Some(el.name().to_ascii_lowercase()),
            _ => None,
        })
        .is_some_and(|name| matches!(name.as_str(), "script" | "style"))
}

/// Upper-case each alphabetic character independently with probability
/// [`CAPITALIZE_P`].
fn randomize_caps<R: Rng>(text: &str, rng: &mut R) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphabetic() && rng.gen::<f64>() < CAPITALIZE_P {
                c.to_uppercase().next().unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Insert a random filler word before every [`INJECT_EVERY`]-th word.
fn inject_stopwords<R: Rng>(text: &str, rng: &mut R) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return text.to_string();
    }

    let mut out: Vec<&str> = Vec::with_capacity(words.len() + words.len() / INJECT_EVERY + 1);
    for (i, word) in words.iter().enumerate() {
        if i % INJECT_EVERY == 0 {
            out.push(FILLERS[rng.gen_range(0..FILLERS.len())]);
        }
        out.push(word);
    }
    out.join(" ")
}

/// Replace phishing-associated phrases with benign equivalents.
///
/// Matching is case-insensitive so that phrases mangled by the earlier
/// capitalization pass are still caught. The replacement keeps a leading
/// capital when the matched text had one.
fn benign_paraphrase(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in paraphrase_patterns() {
        out = pattern
            .replace_all(&out, |caps: &regex::Captures<'_>| {
                let matched = &caps[0];
                if matched.chars().next().is_some_and(char::is_uppercase) {
                    capitalize_first(replacement)
                } else {
                    (*replacement).to_string()
                }
            })
            .into_owned();
    }
    out
}

fn paraphrase_patterns() -> &'static Vec<(Regex, &'static str)> {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        PARAPHRASES
            .iter()
            .map(|(from, to)| {
                let re = Regex::new(&format!("(?i){}", regex::escape(from)))
                    .expect("paraphrase pattern is valid");
                (re, *to)
            })
            .collect()
    })
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Append the provenance marker inside `<head>`. Documents without a head
/// are left unmarked.
fn insert_marker(html: &mut String, nonce: u32) {
    if let Some(pos) = html.to_ascii_lowercase().find("</head>") {
        html.insert_str(
            pos,
            &format!(r#"<meta name="x-benign-variant" content="{nonce}">"#),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Bank login</title></head>
        <body>
        <form class="login-box" action="/submit" method="post">
        <p>Please verify your account to log in.</p>
        <input type="text" name="user">
        </form>
        <script>var x = 1;</script>
        </body></html>"#;

    fn element_count(html: &str) -> usize {
        Html::parse_document(html)
            .tree
            .root()
            .descendants()
            .filter(|n| matches!(n.value(), Node::Element(_)))
            .count()
    }

    fn tag_names(html: &str) -> Vec<String> {
        Html::parse_document(html)
            .tree
            .root()
            .descendants()
            .filter_map(|n| match n.value() {
                Node::Element(el) => Some(el.name().to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn seeded_perturbation_is_reproducible() {
        assert_eq!(perturb_seeded(PAGE, 7), perturb_seeded(PAGE, 7));
    }

    #[test]
    fn adds_exactly_one_marker_element() {
        let out = perturb_seeded(PAGE, 1);
        assert_eq!(element_count(&out), element_count(PAGE) + 1);
        assert!(out.contains(r#"name="x-benign-variant""#));
    }

    #[test]
    fn preserves_markup_skeleton() {
        let out = perturb_seeded(PAGE, 2);

        let mut original = tag_names(PAGE);
        let mut perturbed = tag_names(&out);
        // The marker is the only structural delta.
        let pos = perturbed.iter().position(|t| t == "meta").unwrap();
        perturbed.remove(pos);
        original.sort();
        perturbed.sort();
        assert_eq!(original, perturbed);

        // Attributes are untouched.
        assert!(out.contains(r#"class="login-box""#));
        assert!(out.contains(r#"action="/submit""#));
        assert!(out.contains(r#"name="user""#));
    }

    #[test]
    fn paraphrases_survive_random_capitalization() {
        for seed in 0..50 {
            let out = perturb_seeded(PAGE, seed);
            assert!(out.contains("confirm") || out.contains("Confirm"), "seed {seed}");
            assert!(!out.contains("verify"), "seed {seed}");
        }
    }

    #[test]
    fn script_content_is_untouched() {
        let out = perturb_seeded(PAGE, 3);
        assert!(out.contains("var x = 1;"));
    }

    #[test]
    fn paraphrase_keeps_leading_capital() {
        assert_eq!(benign_paraphrase("Verify now"), "Confirm now");
        assert_eq!(benign_paraphrase("please verify"), "please confirm");
    }

    #[test]
    fn stopword_injection_spacing() {
        let mut rng = StdRng::seed_from_u64(0);
        let text = (0..14).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let out = inject_stopwords(&text, &mut rng);
        let extra = out.split_whitespace().count() - 14;
        // One filler per started group of seven words; "kind of" counts as two.
        assert!((2..=4).contains(&extra), "extra words: {extra}");
    }

    #[test]
    fn no_head_means_no_marker() {
        let mut fragment = "<div>plain</div>".to_string();
        insert_marker(&mut fragment, 42);
        assert!(!fragment.contains("x-benign-variant"));
    }
}

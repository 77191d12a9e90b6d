//! Mention extraction from event bodies.
//!
//! Forum markup carries mentions as anchors rendered by the forum; plain text
//! carries them as `@name` tokens. Extraction never fails: a body that cannot
//! be parsed simply yields no mentions.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::event::BodyFormat;

/// Opening of a rendered mention anchor.
pub const MENTION_MARKER: &str = r#"a class="mention" href="/u/"#;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+").expect("email pattern is valid"));

/// Candidate usernames mentioned in `body`.
pub fn extract_mentions(body: &str, format: BodyFormat) -> BTreeSet<String> {
    match format {
        BodyFormat::Markup => markup_mentions(body),
        BodyFormat::PlainText => plain_mentions(body),
    }
}

fn markup_mentions(body: &str) -> BTreeSet<String> {
    let mut mentions = BTreeSet::new();
    for (index, _) in body.match_indices(MENTION_MARKER) {
        let rest = &body[index + MENTION_MARKER.len()..];
        let Some(open) = rest.find("\">") else {
            continue;
        };
        let name = &rest[open + 2..];
        let Some(close) = name.find('<') else {
            continue;
        };
        let name = name[..close].replace('@', "");
        let name = name.trim();
        if !name.is_empty() {
            mentions.insert(name.to_string());
        }
    }
    mentions
}

fn plain_mentions(body: &str) -> BTreeSet<String> {
    let mut mentions = BTreeSet::new();
    for token in body.split_whitespace().filter(|token| token.contains('@')) {
        if EMAIL.is_match(token) {
            continue;
        }
        let mut name = token.replace('@', "");
        if name.ends_with(|c: char| c.is_ascii_punctuation()) {
            name.pop();
        }
        if !name.is_empty() {
            mentions.insert(name);
        }
    }
    mentions
}

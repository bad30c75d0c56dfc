//! `@Display Name` mention rewriting.
//!
//! Tokens are letter-initial words joined by spaces or tabs, up to
//! [`MAX_NAME_WORDS`] words. The longest word prefix that resolves wins, so
//! `@Jane Doe for review` resolves `jane doe` and leaves the rest alone.
//! A prefix that does not resolve as written is retried without trailing
//! sentence punctuation or a possessive `'s`, which stay in the output.
//! Names that start with a digit or symbol, or use non-Latin letters, are
//! never matched.

use std::sync::LazyLock;

use regex::Regex;

pub const MAX_NAME_WORDS: usize = 4;

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([A-Za-z][\w.'\-]*(?:[ \t]+[A-Za-z][\w.'\-]*){0,3})").expect("mention regex")
});

const SENTENCE_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ':', ';'];

/// True when `text` contains anything that could be a mention.
///
/// Applies the same filter as [`resolve_mentions`], so `bob@Example` is not
/// a candidate.
pub fn has_mention_candidates(text: &str) -> bool {
    MENTION
        .find_iter(text)
        .any(|m| !preceded_by_word_char(text, m.start()))
}

/// Rewrite mentions whose name `lookup` resolves to a handle.
///
/// `lookup` receives the lowercased candidate name. Unresolved tokens are
/// copied through unchanged.
pub fn resolve_mentions<F>(text: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in MENTION.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if preceded_by_word_char(text, whole.start()) {
            continue;
        }

        let words: Vec<&str> = name.as_str().split_whitespace().collect();
        let resolved = (1..=words.len().min(MAX_NAME_WORDS)).rev().find_map(|n| {
            let candidate = words[..n].join(" ");
            if let Some(handle) = lookup(&candidate.to_lowercase()) {
                return Some((consumed_len(name.as_str(), n), handle));
            }
            let trimmed = strip_sentence_suffix(&candidate);
            if trimmed.len() == candidate.len() {
                return None;
            }
            let suffix_len = candidate.len() - trimmed.len();
            lookup(&trimmed.to_lowercase())
                .map(|handle| (consumed_len(name.as_str(), n) - suffix_len, handle))
        });

        if let Some((consumed, handle)) = resolved {
            out.push_str(&text[last..whole.start()]);
            out.push('@');
            out.push_str(&handle);
            last = name.start() + consumed;
        }
    }

    out.push_str(&text[last..]);
    out
}

/// `name` without trailing sentence punctuation and a possessive `'s`.
fn strip_sentence_suffix(name: &str) -> &str {
    let name = name.trim_end_matches(SENTENCE_PUNCTUATION);
    let name = name
        .strip_suffix("'s")
        .or_else(|| name.strip_suffix("\u{2019}s"))
        .unwrap_or(name);
    name.trim_end_matches(SENTENCE_PUNCTUATION)
}

fn preceded_by_word_char(text: &str, at: usize) -> bool {
    text[..at]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '@')
}

/// Byte length of the first `words` whitespace-separated words of `name`,
/// including the separators between them.
fn consumed_len(name: &str, words: usize) -> usize {
    let mut seen = 0;
    let mut in_word = false;
    for (i, c) in name.char_indices() {
        let is_space = c == ' ' || c == '\t';
        if !is_space && !in_word {
            in_word = true;
        } else if is_space && in_word {
            in_word = false;
            seen += 1;
            if seen == words {
                return i;
            }
        }
    }
    name.len()
}

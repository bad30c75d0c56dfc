//! Conversion from common markdown to Slack `mrkdwn`.
//!
//! The conversion is a fixed, ordered table of regex rules. Order is part of
//! the contract: line-level constructs run before inline ones, images before
//! links, bold-italic before bold. Code, math and (for the emphasis pass)
//! Slack links are stashed behind private-use placeholders first so no rule
//! sees them, and so the converter leaves its own output alone when run
//! again.
//!
//! Single-asterisk `*text*` is Slack bold and is passed through untouched.
//! Markdown italic is therefore only recognised in its `_text_` form, which
//! Slack already understands.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Slack has no horizontal rule; a line of box-drawing characters reads as one.
pub const HORIZONTAL_RULE: &str = "──────────";

enum Replacement {
    Template(&'static str),
    With(fn(&Captures) -> String),
}

struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl Rule {
    fn template(name: &'static str, pattern: &str, template: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("rule {name}: {e}")),
            replacement: Replacement::Template(template),
        }
    }

    fn with(name: &'static str, pattern: &str, f: fn(&Captures) -> String) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("rule {name}: {e}")),
            replacement: Replacement::With(f),
        }
    }

    fn apply(&self, text: &str) -> String {
        match &self.replacement {
            Replacement::Template(t) => self.pattern.replace_all(text, *t).into_owned(),
            Replacement::With(f) => self.pattern.replace_all(text, *f).into_owned(),
        }
    }
}

/// Code fences, inline code, block math, inline math.
///
/// Inline math touching a letter or digit on either side (`$HOME/$PATH`) is
/// rejected in [`protect_code`].
static PROTECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```.*?```|`[^`\n]+`|\$\$.+?\$\$|\$[^\s$](?:[^$\n]*[^\s$])?\$")
        .expect("protected span regex")
});

/// Slack links and bare URLs, hidden from the emphasis rules.
static LINKISH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>\n]+>|https?://[^\s<>]+").expect("linkish regex"));

static FENCE_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```[ \t]*[A-Za-z0-9_+#.\-]+[ \t]*\n").expect("fence language regex")
});

const CODE_OPEN: char = '\u{E000}';
const CODE_CLOSE: char = '\u{E001}';
const LINK_OPEN: char = '\u{E002}';
const LINK_CLOSE: char = '\u{E003}';

static CODE_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("code slot regex"));
static LINK_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E002}(\\d+)\u{E003}").expect("link slot regex"));

/// Block-level and link rules, run on text with code and math stashed.
static STRUCTURE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::with(
            "horizontal_rule",
            r"(?m)^[ ]{0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$",
            |_: &Captures| HORIZONTAL_RULE.to_string(),
        ),
        Rule::with(
            "heading",
            r"(?m)^[ ]{0,3}#{1,6}[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$",
            |caps: &Captures| {
                let title = caps[1].replace("**", "").replace("__", "");
                format!("*{}*", title.trim())
            },
        ),
        Rule::template(
            "task_done",
            r"(?m)^([ \t]*)[-*+][ \t]+\[[xX]\][ \t]+",
            "${1}☑ ",
        ),
        Rule::template("task_open", r"(?m)^([ \t]*)[-*+][ \t]+\[ \][ \t]+", "${1}☐ "),
        Rule::template("bullet", r"(?m)^([ \t]*)[-*+][ \t]+", "${1}• "),
        Rule::template("footnote_definition", r"(?m)^\[\^([^\]\s]+)\]:[ \t]*", "[${1}] "),
        Rule::template("footnote_reference", r"\[\^([^\]\s]+)\]", "[${1}]"),
        Rule::with(
            "image",
            r#"!\[([^\]]*)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#,
            |caps: &Captures| slack_link(&caps[2], &caps[1]),
        ),
        Rule::with(
            "link",
            r#"\[([^\]]+)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#,
            |caps: &Captures| slack_link(&caps[2], &caps[1]),
        ),
    ]
});

/// Inline emphasis rules, run with links and URLs stashed as well.
static EMPHASIS_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::template(
            "bold_italic_stars",
            r"\*\*\*(\S(?:[^\n]*?\S)?)\*\*\*",
            "*_${1}_*",
        ),
        Rule::template("bold_italic_underscores", r"___(\S(?:[^\n]*?\S)?)___", "*_${1}_*"),
        Rule::template("bold_stars", r"\*\*(\S(?:[^\n]*?\S)?)\*\*", "*${1}*"),
        Rule::template("bold_underscores", r"__(\S(?:[^\n]*?\S)?)__", "*${1}*"),
        Rule::template("strikethrough", r"~~(\S(?:[^\n]*?\S)?)~~", "~${1}~"),
    ]
});

fn slack_link(url: &str, label: &str) -> String {
    let label = label.trim();
    if label.is_empty() || label == url {
        format!("<{url}>")
    } else {
        format!("<{url}|{label}>")
    }
}

fn protect_code(text: &str, range: Range<usize>) -> Option<String> {
    let span = &text[range.clone()];
    if span.starts_with("```") {
        Some(FENCE_LANGUAGE.replace(span, "```\n").into_owned())
    } else if let Some(inner) = span.strip_prefix("$$").and_then(|s| s.strip_suffix("$$")) {
        Some(format!("```\n{}\n```", inner.trim()))
    } else if let Some(inner) = span.strip_prefix('$').and_then(|s| s.strip_suffix('$')) {
        let before = text[..range.start].chars().next_back();
        let after = text[range.end..].chars().next();
        if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric) {
            return None;
        }
        Some(format!("`{inner}`"))
    } else {
        Some(span.to_string())
    }
}

fn keep_span(text: &str, range: Range<usize>) -> Option<String> {
    Some(text[range].to_string())
}

fn stash(
    text: &str,
    pattern: &Regex,
    slots: &mut Vec<String>,
    open: char,
    close: char,
    transform: fn(&str, Range<usize>) -> Option<String>,
) -> String {
    pattern
        .replace_all(text, |caps: &Captures| {
            let Some(span) = caps.get(0) else {
                return String::new();
            };
            match transform(text, span.range()) {
                Some(stashed) => {
                    slots.push(stashed);
                    format!("{open}{}{close}", slots.len() - 1)
                }
                None => span.as_str().to_string(),
            }
        })
        .into_owned()
}

fn restore(text: &str, slot: &Regex, slots: &[String]) -> String {
    slot.replace_all(text, |caps: &Captures| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| slots.get(i))
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

/// Rewrite markdown into Slack `mrkdwn`.
pub fn to_mrkdwn(text: &str) -> String {
    let mut code = Vec::new();
    let mut converted = stash(text, &PROTECTED, &mut code, CODE_OPEN, CODE_CLOSE, protect_code);

    for rule in STRUCTURE_RULES.iter() {
        converted = rule.apply(&converted);
    }

    let mut links = Vec::new();
    converted = stash(
        &converted,
        &LINKISH,
        &mut links,
        LINK_OPEN,
        LINK_CLOSE,
        keep_span,
    );
    for rule in EMPHASIS_RULES.iter() {
        converted = rule.apply(&converted);
    }

    let converted = restore(&converted, &LINK_SLOT, &links);
    restore(&converted, &CODE_SLOT, &code)
}

/// Names of the conversion rules in application order.
pub fn rule_order() -> Vec<&'static str> {
    STRUCTURE_RULES
        .iter()
        .chain(EMPHASIS_RULES.iter())
        .map(|r| r.name)
        .collect()
}

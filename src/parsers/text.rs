//! Topic segmentation of extracted FAQ text.
//!
//! Converted pages arrive as one flat blob. `segment_by_topic` tries to cut
//! it back into the tabs the page was built from, keyed by topic name. No
//! single rule works on every page, so the rules run as tiers, each one a
//! fallback for the previous:
//!
//! 1. no topic keyword at all: the whole text is `General`
//! 2. split at `?` followed by a capital letter
//! 3. fewer than five fragments: split at each topic keyword instead, the
//!    keyword becoming the label of the text after it
//! 4. still nothing: split before interrogative words
//! 5. file every fragment under the most recent topic, dropping scraps
//! 6. everything landed in `General`: bucket question sentences by the
//!    words of each topic name
//!
//! The result is lossy and order-sensitive. It never fails; the worst case
//! is the input returned under `General`.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Section used for text with no recognisable topic
pub const GENERAL: &str = "General";

/// Topic names, matched case-sensitively on word boundaries
pub const TOPIC_KEYWORDS: [&str; 13] = [
    "JioPay Business App",
    "JioPay Business Dashboard",
    "Collect link",
    "User Management",
    "Repeat",
    "Campaign",
    "Settlement",
    "Refunds",
    "Notifications",
    "Voucher",
    "DQR",
    "Partner program",
    "P2PM / Low KYC merchants",
];

const INTERROGATIVES: [&str; 8] = ["What", "How", "Can", "Do", "Is", "Why", "Where", "Who"];

/// Tier 2 is kept only if it yields at least this many fragments
const MIN_QUESTION_FRAGMENTS: usize = 5;

/// Fragments shorter than this (in characters) are dropped
const MIN_FRAGMENT_CHARS: usize = 10;

/// Section name to accumulated text
pub type TabSections = BTreeMap<String, String>;

static KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    // Longest first so "JioPay Business Dashboard" is never cut short
    let mut keywords = TOPIC_KEYWORDS.to_vec();
    keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation)).expect("keyword pattern is valid")
});

static QUESTION_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?\s+[A-Z]").expect("question break pattern is valid"));

static INTERROGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", INTERROGATIVES.join("|")))
        .expect("interrogative pattern is valid")
});

static LEADING_INTERROGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{})\b", INTERROGATIVES.join("|")))
        .expect("leading interrogative pattern is valid")
});

static QUESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][^?\n]*\?").expect("question pattern is valid"));

/// A piece of text, optionally already labelled with its topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub label: Option<String>,
    pub text: String,
}

impl Fragment {
    fn unlabelled(text: &str) -> Self {
        Self {
            label: None,
            text: text.to_string(),
        }
    }
}

/// Split extracted text into topic sections
pub fn segment_by_topic(text: &str) -> TabSections {
    if !KEYWORD.is_match(text) {
        return general(text);
    }

    let mut fragments = split_on_questions(text);
    if fragments.len() < MIN_QUESTION_FRAGMENTS {
        fragments = split_on_keywords(text);
    }
    if fragments.is_empty() {
        fragments = split_on_interrogatives(text);
    }

    let mut sections = assign_sections(fragments);
    if sections.len() == 1 && sections.contains_key(GENERAL) {
        let bucketed = bucket_questions(text);
        if !bucketed.is_empty() {
            sections = bucketed;
        }
    }

    if sections.is_empty() {
        ::log::debug!("Segmentation produced nothing, keeping text as {}", GENERAL);
        return general(text);
    }
    sections
}

/// Whether the text names any topic
pub fn has_topic_keyword(text: &str) -> bool {
    KEYWORD.is_match(text)
}

/// Split after every `?` that is followed by whitespace and a capital letter
pub fn split_on_questions(text: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut start = 0;

    for m in QUESTION_BREAK.find_iter(text) {
        push_unlabelled(&mut fragments, &text[start..m.start() + 1]);
        // The capital letter is ASCII, one byte
        start = m.end() - 1;
    }
    push_unlabelled(&mut fragments, &text[start..]);

    fragments
}

/// Split at every topic keyword; each keyword labels the text after it.
/// Text before the first keyword is kept unlabelled.
pub fn split_on_keywords(text: &str) -> Vec<Fragment> {
    let matches: Vec<_> = KEYWORD.find_iter(text).collect();
    let Some(first) = matches.first() else {
        return Vec::new();
    };

    let mut fragments = Vec::new();
    push_unlabelled(&mut fragments, &text[..first.start()]);

    for (i, m) in matches.iter().enumerate() {
        let end = matches.get(i + 1).map_or(text.len(), |next| next.start());
        let body = &text[m.end()..end];
        if !body.trim().is_empty() {
            fragments.push(Fragment {
                label: Some(m.as_str().to_string()),
                text: body.to_string(),
            });
        }
    }

    fragments
}

/// Split before every interrogative word
pub fn split_on_interrogatives(text: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut start = 0;

    for m in INTERROGATIVE.find_iter(text) {
        if m.start() > start {
            push_unlabelled(&mut fragments, &text[start..m.start()]);
        }
        start = m.start();
    }
    push_unlabelled(&mut fragments, &text[start..]);

    fragments
}

/// File fragments under the most recently seen topic
pub fn assign_sections(fragments: Vec<Fragment>) -> TabSections {
    let mut sections = TabSections::new();
    let mut current = GENERAL.to_string();

    for fragment in fragments {
        if let Some(label) = fragment.label {
            current = label;
        } else if let Some(last) = KEYWORD.find_iter(&fragment.text).last() {
            current = last.as_str().to_string();
        }

        let body = fragment.text.trim();
        if body.chars().count() < MIN_FRAGMENT_CHARS {
            continue;
        }
        append(&mut sections, &current, &close_question(body));
    }

    sections
}

/// Bucket every question sentence by the first topic sharing a word with it
pub fn bucket_questions(text: &str) -> TabSections {
    let mut sections = TabSections::new();

    for m in QUESTION.find_iter(text) {
        let question = m.as_str().trim();
        let lower = question.to_lowercase();
        let topic = TOPIC_KEYWORDS
            .iter()
            .find(|keyword| topic_words(keyword).any(|word| lower.contains(&word)))
            .copied()
            .unwrap_or(GENERAL);
        append(&mut sections, topic, question);
    }

    sections
}

/// Add a `?` to fragments that open like a question but never end
pub fn close_question(fragment: &str) -> String {
    if LEADING_INTERROGATIVE.is_match(fragment) && !fragment.ends_with(['?', '.', '!']) {
        format!("{}?", fragment)
    } else {
        fragment.to_string()
    }
}

fn topic_words(keyword: &str) -> impl Iterator<Item = String> + '_ {
    keyword
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(str::to_lowercase)
}

fn general(text: &str) -> TabSections {
    let mut sections = TabSections::new();
    sections.insert(GENERAL.to_string(), text.to_string());
    sections
}

fn push_unlabelled(fragments: &mut Vec<Fragment>, text: &str) {
    if !text.trim().is_empty() {
        fragments.push(Fragment::unlabelled(text));
    }
}

fn append(sections: &mut TabSections, section: &str, text: &str) {
    let entry = sections.entry(section.to_string()).or_default();
    if !entry.is_empty() {
        entry.push('\n');
    }
    entry.push_str(text);
}

//! Phrase matching heuristics.
//!
//! Two independent nearest-neighbour searches over a candidate word list:
//! - "closest value": compares alphabetic position sums (`a`=1 .. `z`=26)
//! - "closest lexical": compares words by string ordering
//!
//! Each search has a canonical strategy and an alternate one. The two
//! alternates reproduce a second, divergent rendition of the same feature and
//! are kept selectable so the outputs can be compared side by side.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Result of matching one text against a candidate set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub value: Option<String>,
    pub lexical: Option<String>,
}

/// Strategy for the "closest value" search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ValueStrategy {
    /// `|char_value(word) - char_value(text)|`, ties to the larger value,
    /// then to the lexicographically smaller word.
    #[default]
    #[serde(rename = "value-diff")]
    ValueDiffAbsolute,
    /// `|len(text) - char_value(word)|`, ties to the lexicographically
    /// larger word.
    #[serde(rename = "length-diff")]
    LengthDiffAbsolute,
}

/// Strategy for the "closest lexical" search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum LexicalStrategy {
    /// Greatest word sorting strictly before the text, seeded with the first
    /// candidate.
    #[default]
    #[serde(rename = "lower-bound")]
    LexicalLowerBound,
    /// Smallest `|compare_ignore_case(text, word)|`, ties to the
    /// lexicographically smaller word.
    #[serde(rename = "case-insensitive")]
    CaseInsensitiveNearest,
}

impl ValueStrategy {
    pub const ALL: [ValueStrategy; 2] = [
        ValueStrategy::ValueDiffAbsolute,
        ValueStrategy::LengthDiffAbsolute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueStrategy::ValueDiffAbsolute => "value-diff",
            ValueStrategy::LengthDiffAbsolute => "length-diff",
        }
    }
}

impl LexicalStrategy {
    pub const ALL: [LexicalStrategy; 2] = [
        LexicalStrategy::LexicalLowerBound,
        LexicalStrategy::CaseInsensitiveNearest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LexicalStrategy::LexicalLowerBound => "lower-bound",
            LexicalStrategy::CaseInsensitiveNearest => "case-insensitive",
        }
    }
}

impl fmt::Display for ValueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LexicalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "value-diff" => Ok(ValueStrategy::ValueDiffAbsolute),
            "length-diff" => Ok(ValueStrategy::LengthDiffAbsolute),
            other => anyhow::bail!(
                "Unknown value strategy '{}'. Expected one of: value-diff, length-diff",
                other
            ),
        }
    }
}

impl FromStr for LexicalStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lower-bound" => Ok(LexicalStrategy::LexicalLowerBound),
            "case-insensitive" => Ok(LexicalStrategy::CaseInsensitiveNearest),
            other => anyhow::bail!(
                "Unknown lexical strategy '{}'. Expected one of: lower-bound, case-insensitive",
                other
            ),
        }
    }
}

/// A pair of strategies applied together to one candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Matcher {
    pub value: ValueStrategy,
    pub lexical: LexicalStrategy,
}

impl Matcher {
    pub fn new(value: ValueStrategy, lexical: LexicalStrategy) -> Self {
        Self { value, lexical }
    }

    pub fn analyze(&self, text: &str, words: &[String]) -> AnalyzeResult {
        AnalyzeResult {
            value: self.closest_value(text, words).map(str::to_string),
            lexical: self.closest_lexical(text, words).map(str::to_string),
        }
    }

    pub fn closest_value<'a>(&self, text: &str, words: &'a [String]) -> Option<&'a str> {
        match self.value {
            ValueStrategy::ValueDiffAbsolute => closest_by_value_diff(text, words),
            ValueStrategy::LengthDiffAbsolute => closest_by_length_diff(text, words),
        }
    }

    pub fn closest_lexical<'a>(&self, text: &str, words: &'a [String]) -> Option<&'a str> {
        match self.lexical {
            LexicalStrategy::LexicalLowerBound => closest_lower_bound(text, words),
            LexicalStrategy::CaseInsensitiveNearest => closest_case_insensitive(text, words),
        }
    }
}

/// Sum of alphabetic positions (`a`=1 .. `z`=26) over the lowercased chars.
///
/// Non-letters are not filtered: their code points go through the same
/// arithmetic, so digits and punctuation contribute zero or negative weights.
pub fn char_value(s: &str) -> i64 {
    s.chars()
        .map(|c| {
            let lower = c.to_lowercase().next().unwrap_or(c);
            lower as i64 - 'a' as i64 + 1
        })
        .sum()
}

fn closest_by_value_diff<'a>(text: &str, words: &'a [String]) -> Option<&'a str> {
    let text_value = char_value(text);
    let mut best: Option<(&'a str, i64, i64)> = None;

    for word in words {
        let word_value = char_value(word);
        let diff = (word_value - text_value).abs();

        best = match best {
            None => Some((word.as_str(), diff, word_value)),
            Some((current, best_diff, best_value)) => {
                let replace = match diff.cmp(&best_diff) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => match word_value.cmp(&best_value) {
                        Ordering::Greater => true,
                        Ordering::Less => false,
                        Ordering::Equal => word.as_str() < current,
                    },
                };
                if replace {
                    Some((word.as_str(), diff, word_value))
                } else {
                    Some((current, best_diff, best_value))
                }
            }
        };
    }

    best.map(|(word, _, _)| word)
}

fn closest_by_length_diff<'a>(text: &str, words: &'a [String]) -> Option<&'a str> {
    let text_len = text.chars().count() as i64;
    let key = |word: &str| (text_len - char_value(word)).abs();

    words
        .iter()
        .min_by(|a, b| key(a.as_str()).cmp(&key(b.as_str())).then_with(|| b.cmp(a)))
        .map(String::as_str)
}

fn closest_lower_bound<'a>(text: &str, words: &'a [String]) -> Option<&'a str> {
    let mut closest: Option<&'a str> = None;

    for word in words {
        let word = word.as_str();
        match closest {
            None => closest = Some(word),
            Some(current) if word < text && word > current => closest = Some(word),
            Some(_) => {}
        }
    }

    closest
}

fn closest_case_insensitive<'a>(text: &str, words: &'a [String]) -> Option<&'a str> {
    let key = |word: &str| compare_ignore_case(text, word).abs();

    words
        .iter()
        .min_by(|a, b| key(a.as_str()).cmp(&key(b.as_str())).then_with(|| a.cmp(b)))
        .map(String::as_str)
}

/// Numeric case-insensitive comparison.
///
/// Returns the code point difference at the first position where the two
/// strings still differ after upper- and then lower-case folding, or the
/// length difference when one is a prefix of the other.
pub fn compare_ignore_case(a: &str, b: &str) -> i64 {
    let left: Vec<char> = a.chars().collect();
    let right: Vec<char> = b.chars().collect();

    for (&c1, &c2) in left.iter().zip(right.iter()) {
        if c1 == c2 {
            continue;
        }
        let (u1, u2) = (fold_upper(c1), fold_upper(c2));
        if u1 == u2 {
            continue;
        }
        let (l1, l2) = (fold_lower(u1), fold_lower(u2));
        if l1 != l2 {
            return l1 as i64 - l2 as i64;
        }
    }

    left.len() as i64 - right.len() as i64
}

fn fold_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

fn fold_lower(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

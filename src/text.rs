//! Text normalization, tokenization and phrase matching shared by the scorers.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use unicode_normalization::UnicodeNormalization;

use crate::error::LexiconError;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("static url pattern"));

/// NFC-normalize, unify quotes and drop URLs. Every scorer sees text through this.
pub fn normalize(text: &str) -> String {
    let nfc: String = text.nfc().collect();
    let unquoted = nfc.replace(['’', '‘', '`'], "'").replace(['“', '”'], "\"");
    URL_RE.replace_all(&unquoted, " ").into_owned()
}

/// True for null-equivalent bodies: empty or whitespace only.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Emoji(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lower: String,
    pub kind: TokenKind,
}

impl Token {
    fn word(text: &str) -> Self {
        Self {
            text: text.to_string(),
            lower: text.to_lowercase(),
            kind: TokenKind::Word,
        }
    }

    fn emoji(c: char) -> Self {
        Self {
            text: c.to_string(),
            lower: c.to_string(),
            kind: TokenKind::Emoji(c),
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// Shouted = a word of at least two letters, all of them upper-case.
    pub fn is_shouted(&self) -> bool {
        self.is_word() && is_all_caps(&self.text)
    }
}

/// Split on whitespace; each chunk yields word tokens (alphanumerics with inner
/// apostrophes) and emoji tokens for code points the caller recognizes.
pub fn tokenize(text: &str, is_emoji: impl Fn(char) -> bool) -> Vec<Token> {
    let mut out = Vec::new();
    for chunk in text.split_whitespace() {
        let mut word = String::new();
        for c in chunk.chars() {
            if c.is_alphanumeric() || (c == '\'' && !word.is_empty()) {
                word.push(c);
                continue;
            }
            flush_word(&mut word, &mut out);
            if is_emoji(c) {
                out.push(Token::emoji(c));
            }
        }
        flush_word(&mut word, &mut out);
    }
    out
}

fn flush_word(word: &mut String, out: &mut Vec<Token>) {
    let trimmed = word.trim_end_matches('\'');
    if !trimmed.is_empty() {
        out.push(Token::word(trimmed));
    }
    word.clear();
}

fn is_all_caps(s: &str) -> bool {
    let mut letters = 0usize;
    for c in s.chars().filter(|c| c.is_alphabetic()) {
        if !c.is_uppercase() {
            return false;
        }
        letters += 1;
    }
    letters >= 2
}

/// Whole text written in capitals (at least two letters, none lower-case).
pub fn is_shouting(text: &str) -> bool {
    is_all_caps(text)
}

/// Share of words that start with a capital letter without opening a sentence.
/// The pronoun "I" never counts as a proper noun.
pub fn proper_noun_density(text: &str) -> f64 {
    let mut total = 0usize;
    let mut proper = 0usize;
    let mut sentence_start = true;

    for chunk in text.split_whitespace() {
        let core: String = chunk
            .chars()
            .skip_while(|c| !c.is_alphanumeric())
            .take_while(|c| c.is_alphanumeric() || *c == '\'')
            .collect();
        if !core.is_empty() {
            total += 1;
            let capitalized = core.chars().next().map_or(false, char::is_uppercase);
            if capitalized && !sentence_start && core != "I" {
                proper += 1;
            }
        }
        let tail = chunk.trim_end_matches(|c: char| matches!(c, '"' | '\'' | ')' | ']'));
        if core.is_empty() && !tail.ends_with(['.', '!', '?']) {
            continue;
        }
        sentence_start = tail.ends_with(['.', '!', '?']);
    }

    if total == 0 {
        0.0
    } else {
        proper as f64 / total as f64
    }
}

pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// A named bank of words/phrases compiled into one alternation.
///
/// Phrases are tried longest first, so "not really sure" wins over "not sure"
/// at the same position. Whitespace inside a phrase matches any run of
/// whitespace; word boundaries are applied on edges that are word characters.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    phrases: Vec<String>,
    matcher: Option<Regex>,
}

impl PhraseSet {
    /// Case-insensitive bank.
    pub fn new<S: AsRef<str>>(name: &str, phrases: &[S]) -> Result<Self, LexiconError> {
        Self::build(name, phrases, true)
    }

    /// Case-sensitive bank, used for proper-noun gazetteers.
    pub fn case_sensitive<S: AsRef<str>>(name: &str, phrases: &[S]) -> Result<Self, LexiconError> {
        Self::build(name, phrases, false)
    }

    fn build<S: AsRef<str>>(
        name: &str,
        phrases: &[S],
        case_insensitive: bool,
    ) -> Result<Self, LexiconError> {
        let mut list: Vec<String> = phrases
            .iter()
            .map(|p| p.as_ref().split_whitespace().collect::<Vec<_>>().join(" "))
            .map(|p| if case_insensitive { p.to_lowercase() } else { p })
            .filter(|p| !p.is_empty())
            .collect();
        list.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        list.dedup();

        let matcher = if list.is_empty() {
            None
        } else {
            let alternation = list.iter().map(|p| phrase_pattern(p)).collect::<Vec<_>>().join("|");
            let re = RegexBuilder::new(&format!("(?:{alternation})"))
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|source| LexiconError::Matcher {
                    bank: name.to_string(),
                    source,
                })?;
            Some(re)
        };

        Ok(Self {
            phrases: list,
            matcher,
        })
    }

    /// Normalized phrases, longest first.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Non-overlapping hits anywhere in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.matcher.as_ref().map_or(0, |re| re.find_iter(text).count())
    }

    pub fn contains_any(&self, text: &str) -> bool {
        self.matcher.as_ref().map_or(false, |re| re.is_match(text))
    }

    /// `text` with every hit replaced by a separator, so no other bank can
    /// match words inside a hit or bridge across one.
    pub fn mask(&self, text: &str) -> String {
        match &self.matcher {
            Some(re) => re.replace_all(text, " | ").into_owned(),
            None => text.to_string(),
        }
    }

    /// Byte spans and matched text of every hit.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<(usize, usize, &'t str)> {
        match &self.matcher {
            Some(re) => re
                .find_iter(text)
                .map(|m| (m.start(), m.end(), m.as_str()))
                .collect(),
            None => Vec::new(),
        }
    }
}

fn phrase_pattern(phrase: &str) -> String {
    let body = phrase
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let is_word = |c: Option<char>| c.map_or(false, |c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(phrase.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(phrase.chars().last()) { r"\b" } else { "" };
    format!("{lead}{body}{trail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unifies_quotes_and_strips_urls() {
        let t = normalize("I didn’t like https://example.com/x it");
        assert!(t.contains("didn't"));
        assert!(!t.contains("example.com"));
    }

    #[test]
    fn tokenize_splits_words_and_emoji() {
        let toks = tokenize("It's GREAT!!😍🔥 ok", |c| c == '😍');
        let texts: Vec<&str> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["It's", "GREAT", "😍", "ok"]);
        assert!(toks[1].is_shouted());
        assert_eq!(toks[2].kind, TokenKind::Emoji('😍'));
    }

    #[test]
    fn single_capital_is_not_shouting() {
        assert!(!is_shouting("I"));
        assert!(is_shouting("I HATED IT"));
        assert!(!is_shouting("I hated it"));
        assert!(!is_shouting("123 !!!"));
    }

    #[test]
    fn phrase_set_prefers_longest_and_respects_boundaries() {
        let set = PhraseSet::new("hedges", &["not sure", "not really sure", "sure"]).unwrap();
        assert_eq!(set.count("I'm not really sure"), 1);
        assert_eq!(set.count("I'm NOT   sure"), 1);
        assert_eq!(set.count("unsure, ensure"), 0);
    }

    #[test]
    fn mask_blanks_hits_without_joining_neighbours() {
        let hedges = PhraseSet::new("hedges", &["not sure", "maybe"]).unwrap();
        let certainty = PhraseSet::new("certainty", &["i'm sure"]).unwrap();
        let masked = hedges.mask("good, NOT sure");
        assert!(!masked.to_lowercase().contains("sure"));
        assert!(masked.starts_with("good,"));
        assert!(!certainty.contains_any(&hedges.mask("i'm maybe sure")));
        assert_eq!(hedges.mask("plain text"), "plain text");
    }

    #[test]
    fn case_sensitive_set_skips_lowercase() {
        let set = PhraseSet::case_sensitive("gazetteer", &["Meta"]).unwrap();
        assert_eq!(set.count("Meta bought it"), 1);
        assert_eq!(set.count("a meta joke"), 0);
    }

    #[test]
    fn empty_phrase_set_never_matches() {
        let set = PhraseSet::new("none", &[] as &[&str]).unwrap();
        assert_eq!(set.count("anything"), 0);
        assert!(!set.contains_any("anything"));
    }

    #[test]
    fn proper_noun_density_ignores_sentence_starts() {
        assert_eq!(proper_noun_density("The show aired."), 0.0);
        let d = proper_noun_density("I met Elon Musk in London.");
        assert!((d - 3.0 / 6.0).abs() < 1e-12);
        assert_eq!(proper_noun_density(""), 0.0);
    }

    #[test]
    fn round3_rounds_half_away() {
        assert_eq!(round3(0.4), 0.4);
        assert_eq!(round3(1.0 / 3.0), 0.333);
    }
}

//! Immutable lexical knowledge shared by every scorer.
//!
//! A [`LexiconBank`] is built once (from the embedded v1 tables or from a
//! directory that overrides some of them) and then handed to the scorers
//! behind an `Arc`. Nothing mutates it afterwards.

pub mod banks;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::LexiconError;
use crate::text::PhraseSet;

pub const VALENCE_TABLE: &str = "valence.v1.tsv";
pub const SUBJECTIVITY_TABLE: &str = "subjectivity.v1.tsv";
pub const BOOSTER_TABLE: &str = "boosters.v1.tsv";
pub const EMOJI_TABLE: &str = "emoji.v1.tsv";
pub const ENTITY_TABLE: &str = "entities.v1.tsv";

const VALENCE_V1: &str = include_str!("../../data/valence.v1.tsv");
const SUBJECTIVITY_V1: &str = include_str!("../../data/subjectivity.v1.tsv");
const BOOSTERS_V1: &str = include_str!("../../data/boosters.v1.tsv");
const EMOJI_V1: &str = include_str!("../../data/emoji.v1.tsv");
const ENTITIES_V1: &str = include_str!("../../data/entities.v1.tsv");

const VARIATION_SELECTOR: char = '\u{FE0F}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoosterKind {
    Amplify,
    Dampen,
}

impl BoosterKind {
    pub fn sign(self) -> f64 {
        match self {
            BoosterKind::Amplify => 1.0,
            BoosterKind::Dampen => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmojiClass {
    Positive,
    Negative,
    StrongNegative,
    Neutral,
}

impl EmojiClass {
    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "positive" => Some(EmojiClass::Positive),
            "negative" => Some(EmojiClass::Negative),
            "strong_negative" => Some(EmojiClass::StrongNegative),
            "neutral" => Some(EmojiClass::Neutral),
            _ => None,
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self, EmojiClass::Negative | EmojiClass::StrongNegative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmojiEntry {
    pub valence: f64,
    pub class: EmojiClass,
}

/// Term banks consumed by the scenario-matching plausibility strategy.
#[derive(Debug, Clone)]
pub struct ScenarioBanks {
    pub tech_reality: PhraseSet,
    pub logical_inference: PhraseSet,
    pub fantasy_flags: PhraseSet,
    pub real_world_actors: PhraseSet,
    pub sarcasm_markers: PhraseSet,
    pub soft_realism: PhraseSet,
}

#[derive(Debug, Clone)]
pub struct LexiconBank {
    valence: HashMap<String, f64>,
    subjectivity: HashMap<String, f64>,
    boosters: HashMap<String, BoosterKind>,
    negations: HashSet<String>,
    emoji: HashMap<char, EmojiEntry>,
    entities: Vec<(String, String)>,
    pub hedges: PhraseSet,
    pub amplifiers: PhraseSet,
    pub certainty_verbs: PhraseSet,
    pub superlatives: PhraseSet,
    pub contrastives: PhraseSet,
    pub negated_opinions: PhraseSet,
    pub scenarios: ScenarioBanks,
    fingerprint: String,
}

/// Raw text of each table before parsing.
struct TableSources<'a> {
    valence: Cow<'a, str>,
    subjectivity: Cow<'a, str>,
    boosters: Cow<'a, str>,
    emoji: Cow<'a, str>,
    entities: Cow<'a, str>,
}

impl LexiconBank {
    /// The embedded v1 tables.
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::from_sources(TableSources {
            valence: Cow::Borrowed(VALENCE_V1),
            subjectivity: Cow::Borrowed(SUBJECTIVITY_V1),
            boosters: Cow::Borrowed(BOOSTERS_V1),
            emoji: Cow::Borrowed(EMOJI_V1),
            entities: Cow::Borrowed(ENTITIES_V1),
        })
    }

    /// Tables found in `dir` replace the embedded ones; missing files fall back.
    pub fn from_dir(dir: &Path) -> Result<Self, LexiconError> {
        let load = |name: &str, fallback: &'static str| -> Result<Cow<'static, str>, LexiconError> {
            let path = dir.join(name);
            if path.is_file() {
                debug!("Loading lexicon table override - path={}", path.display());
                std::fs::read_to_string(&path)
                    .map(Cow::Owned)
                    .map_err(|source| LexiconError::Read { path, source })
            } else {
                Ok(Cow::Borrowed(fallback))
            }
        };

        Self::from_sources(TableSources {
            valence: load(VALENCE_TABLE, VALENCE_V1)?,
            subjectivity: load(SUBJECTIVITY_TABLE, SUBJECTIVITY_V1)?,
            boosters: load(BOOSTER_TABLE, BOOSTERS_V1)?,
            emoji: load(EMOJI_TABLE, EMOJI_V1)?,
            entities: load(ENTITY_TABLE, ENTITIES_V1)?,
        })
    }

    fn from_sources(src: TableSources<'_>) -> Result<Self, LexiconError> {
        let valence: HashMap<String, f64> = parse_weighted("valence", &src.valence)?.into_iter().collect();
        let subjectivity: HashMap<String, f64> =
            parse_weighted("subjectivity", &src.subjectivity)?.into_iter().collect();
        let boosters = parse_boosters(&src.boosters)?;
        let emoji = parse_emoji(&src.emoji)?;
        let entities = parse_entities(&src.entities)?;

        let mut amplifier_words: Vec<&str> = boosters
            .iter()
            .filter(|(_, kind)| **kind == BoosterKind::Amplify)
            .map(|(word, _)| word.as_str())
            .collect();
        amplifier_words.sort_unstable();
        let amplifiers = PhraseSet::new("amplifiers", amplifier_words.as_slice())?;

        let fingerprint = fingerprint_of(&src);

        let bank = Self {
            negations: banks::NEGATIONS.iter().map(|s| s.to_string()).collect(),
            hedges: PhraseSet::new("hedges", banks::HEDGES)?,
            amplifiers,
            certainty_verbs: PhraseSet::new("certainty_verbs", banks::CERTAINTY_VERBS)?,
            superlatives: PhraseSet::new("superlatives", banks::SUPERLATIVES)?,
            contrastives: PhraseSet::new("contrastives", banks::CONTRASTIVES)?,
            negated_opinions: PhraseSet::new("negated_opinions", banks::NEGATED_OPINIONS)?,
            scenarios: ScenarioBanks {
                tech_reality: PhraseSet::new("tech_reality", banks::TECH_REALITY)?,
                logical_inference: PhraseSet::new("logical_inference", banks::LOGICAL_INFERENCE)?,
                fantasy_flags: PhraseSet::new("fantasy_flags", banks::FANTASY_FLAGS)?,
                real_world_actors: PhraseSet::new("real_world_actors", banks::REAL_WORLD_ACTORS)?,
                sarcasm_markers: PhraseSet::new("sarcasm_markers", banks::SARCASM_MARKERS)?,
                soft_realism: PhraseSet::new("soft_realism", banks::SOFT_REALISM)?,
            },
            valence,
            subjectivity,
            boosters,
            emoji,
            entities,
            fingerprint,
        };

        info!(
            "Lexicon bank ready - fingerprint={}, valence={}, subjectivity={}, boosters={}, emoji={}, entities={}",
            bank.fingerprint,
            bank.valence.len(),
            bank.subjectivity.len(),
            bank.boosters.len(),
            bank.emoji.len(),
            bank.entities.len()
        );
        Ok(bank)
    }

    /// Stable xxh3 digest of every table and bank; changes whenever scores could.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn valence(&self, word: &str) -> Option<f64> {
        self.valence.get(word).copied()
    }

    pub fn subjectivity(&self, word: &str) -> Option<f64> {
        self.subjectivity.get(word).copied()
    }

    pub fn booster(&self, word: &str) -> Option<BoosterKind> {
        self.boosters.get(word).copied()
    }

    /// Negation words plus any contraction ending in "n't".
    pub fn is_negation(&self, word: &str) -> bool {
        self.negations.contains(word) || word.ends_with("n't")
    }

    pub fn emoji(&self, c: char) -> Option<EmojiEntry> {
        self.emoji.get(&c).copied()
    }

    pub fn is_emoji(&self, c: char) -> bool {
        self.emoji.contains_key(&c)
    }

    /// Gazetteer rows as (surface form, recognizer label).
    pub fn entities(&self) -> &[(String, String)] {
        &self.entities
    }
}

fn data_lines(src: &str) -> impl Iterator<Item = (usize, &str)> {
    src.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
}

fn malformed(table: &str, line: usize, reason: impl Into<String>) -> LexiconError {
    LexiconError::Malformed {
        table: table.to_string(),
        line,
        reason: reason.into(),
    }
}

fn parse_weighted(table: &str, src: &str) -> Result<Vec<(String, f64)>, LexiconError> {
    let mut out = Vec::new();
    for (line_no, line) in data_lines(src) {
        let (word, value) = line
            .split_once('\t')
            .ok_or_else(|| malformed(table, line_no, "expected <word>\\t<value>"))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| malformed(table, line_no, format!("'{}' is not a number", value.trim())))?;
        if !value.is_finite() {
            return Err(malformed(table, line_no, "value must be finite"));
        }
        out.push((word.trim().to_lowercase(), value));
    }
    Ok(out)
}

fn parse_boosters(src: &str) -> Result<HashMap<String, BoosterKind>, LexiconError> {
    let mut out = HashMap::new();
    for (line_no, line) in data_lines(src) {
        let (word, kind) = line
            .split_once('\t')
            .ok_or_else(|| malformed("boosters", line_no, "expected <word>\\t<+|->"))?;
        let kind = match kind.trim() {
            "+" => BoosterKind::Amplify,
            "-" => BoosterKind::Dampen,
            other => return Err(malformed("boosters", line_no, format!("unknown direction '{other}'"))),
        };
        out.insert(word.trim().to_lowercase(), kind);
    }
    Ok(out)
}

fn parse_emoji(src: &str) -> Result<HashMap<char, EmojiEntry>, LexiconError> {
    let mut out = HashMap::new();
    for (line_no, line) in data_lines(src) {
        let fields: Vec<&str> = line.split('\t').collect();
        let [symbol, valence, class] = fields[..] else {
            return Err(malformed("emoji", line_no, "expected <emoji>\\t<valence>\\t<class>"));
        };
        let mut chars = symbol.trim().chars().filter(|c| *c != VARIATION_SELECTOR);
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(malformed("emoji", line_no, "emoji must be a single code point"));
        };
        let valence: f64 = valence
            .trim()
            .parse()
            .map_err(|_| malformed("emoji", line_no, "valence is not a number"))?;
        let class = EmojiClass::parse(class)
            .ok_or_else(|| malformed("emoji", line_no, format!("unknown class '{}'", class.trim())))?;
        out.insert(c, EmojiEntry { valence, class });
    }
    Ok(out)
}

fn parse_entities(src: &str) -> Result<Vec<(String, String)>, LexiconError> {
    let mut out = Vec::new();
    for (line_no, line) in data_lines(src) {
        let (name, label) = line
            .split_once('\t')
            .ok_or_else(|| malformed("entities", line_no, "expected <name>\\t<label>"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed("entities", line_no, "empty entity name"));
        }
        out.push((name.to_string(), label.trim().to_uppercase()));
    }
    Ok(out)
}

fn fingerprint_of(src: &TableSources<'_>) -> String {
    let mut material = String::new();
    for part in [&src.valence, &src.subjectivity, &src.boosters, &src.emoji, &src.entities] {
        material.push_str(part);
        material.push('\u{1f}');
    }
    for bank in [
        banks::NEGATIONS,
        banks::HEDGES,
        banks::CERTAINTY_VERBS,
        banks::SUPERLATIVES,
        banks::CONTRASTIVES,
        banks::NEGATED_OPINIONS,
        banks::TECH_REALITY,
        banks::LOGICAL_INFERENCE,
        banks::FANTASY_FLAGS,
        banks::REAL_WORLD_ACTORS,
        banks::SARCASM_MARKERS,
        banks::SOFT_REALISM,
    ] {
        material.push_str(&bank.join("|"));
        material.push('\u{1f}');
    }
    format!("{:016x}", xxh3_64(material.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_parse() {
        let lex = LexiconBank::builtin().unwrap();
        assert_eq!(lex.valence("love"), Some(3.2));
        assert_eq!(lex.subjectivity("perfect"), Some(1.0));
        assert_eq!(lex.booster("absolutely"), Some(BoosterKind::Amplify));
        assert_eq!(lex.booster("slightly"), Some(BoosterKind::Dampen));
        assert_eq!(lex.emoji('🤬').map(|e| e.class), Some(EmojiClass::StrongNegative));
        assert!(lex.entities().iter().any(|(n, l)| n == "Elon Musk" && l == "PERSON"));
    }

    #[test]
    fn neutral_fixture_words_carry_no_valence() {
        let lex = LexiconBank::builtin().unwrap();
        for w in ["politician", "blackmailed", "deepfake", "videos", "show", "seasons", "soul", "immortal"] {
            assert_eq!(lex.valence(w), None, "{w} should be neutral");
        }
    }

    #[test]
    fn negation_includes_contractions() {
        let lex = LexiconBank::builtin().unwrap();
        assert!(lex.is_negation("didn't"));
        assert!(lex.is_negation("never"));
        assert!(!lex.is_negation("knot"));
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = LexiconBank::builtin().unwrap();
        let b = LexiconBank::builtin().unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    #[test]
    fn directory_override_replaces_only_present_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VALENCE_TABLE), "# custom\nshow\t2.0\n").unwrap();
        let lex = LexiconBank::from_dir(dir.path()).unwrap();
        assert_eq!(lex.valence("show"), Some(2.0));
        assert_eq!(lex.valence("love"), None);
        assert_eq!(lex.subjectivity("perfect"), Some(1.0));
        assert_ne!(lex.fingerprint(), LexiconBank::builtin().unwrap().fingerprint());
    }

    #[test]
    fn malformed_rows_are_reported_with_line_numbers() {
        let err = parse_weighted("valence", "# header\ngood\tnope\n").unwrap_err();
        match err {
            LexiconError::Malformed { table, line, .. } => {
                assert_eq!(table, "valence");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_emoji("😀😀\t1.0\tpositive\n").is_err());
        assert!(parse_boosters("very\t*\n").is_err());
    }
}

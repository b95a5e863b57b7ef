use crate::lexicon::{BoosterKind, LexiconBank};
use crate::text::{is_blank, normalize, tokenize};

/// Mean subjectivity of the words found in the subjectivity table.
///
/// A hit directly after an amplifying booster ("really creepy") is scaled by
/// `booster_scale` and capped at 1.0. No hits (or blank text) gives 0.0.
pub fn estimate(lexicon: &LexiconBank, text: &str, booster_scale: f64) -> f64 {
    if is_blank(text) {
        return 0.0;
    }
    let text = normalize(text);
    let tokens = tokenize(&text, |c| lexicon.is_emoji(c));

    let mut sum = 0.0;
    let mut hits = 0usize;
    let mut prev_amplifies = false;
    for token in &tokens {
        if token.is_word() {
            if let Some(mut s) = lexicon.subjectivity(&token.lower) {
                if prev_amplifies {
                    s = (s * booster_scale).min(1.0);
                }
                sum += s;
                hits += 1;
            }
        }
        prev_amplifies = token.is_word() && lexicon.booster(&token.lower) == Some(BoosterKind::Amplify);
    }

    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

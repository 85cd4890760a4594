/*!
 * Word validity rules and kana helpers.
 *
 * Tokens rejected here are still stored, flagged invalid with a reason, so
 * that they are never offered for enhancement.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Parts of speech that are registered as vocabulary
pub const CONTENT_PARTS_OF_SPEECH: [&str; 4] = ["名詞", "動詞", "形容詞", "副詞"];

const NOUN: &str = "名詞";

static ALL_SYMBOLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\W_]+$").expect("symbol pattern is valid"));

static SINGLE_KANA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ぁ-んァ-ヶー]$").expect("kana pattern is valid"));

static HIRAGANA_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ぁ-んー]+$").expect("hiragana pattern is valid"));

/// Why a token was not accepted as a word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    AllSymbolsOrNum,
    SingleKanaNoise,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Empty => "EMPTY",
            SkipReason::AllSymbolsOrNum => "ALL_SYMBOLS_OR_NUM",
            SkipReason::SingleKanaNoise => "SINGLE_KANA_NOISE",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a part of speech is registered as vocabulary
pub fn is_content_word(part_of_speech: &str) -> bool {
    CONTENT_PARTS_OF_SPEECH.contains(&part_of_speech)
}

/// Check a base form, returning the reason it should be skipped if any.
///
/// A leading digit or symbol is fine as long as a letter follows it (`1等`).
pub fn check_word(base_form: &str, part_of_speech: &str) -> Option<SkipReason> {
    if base_form.is_empty() {
        return Some(SkipReason::Empty);
    }

    if ALL_SYMBOLS.is_match(base_form) {
        return Some(SkipReason::AllSymbolsOrNum);
    }

    if SINGLE_KANA.is_match(base_form) && part_of_speech != NOUN {
        return Some(SkipReason::SingleKanaNoise);
    }

    None
}

/// Whether the text is written entirely in hiragana (long vowel mark allowed)
pub fn is_pure_hiragana(text: &str) -> bool {
    HIRAGANA_ONLY.is_match(text)
}

/// Convert katakana to hiragana, leaving every other character unchanged
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ァ'..='ヶ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Initial reading stored for a new word.
///
/// Hiragana base forms are their own reading; otherwise the tokenizer's
/// reading is converted to hiragana. `*` means the tokenizer had none.
pub fn initial_reading(base_form: &str, token_reading: Option<&str>) -> Option<String> {
    if is_pure_hiragana(base_form) {
        return Some(base_form.to_string());
    }

    token_reading
        .map(str::trim)
        .filter(|r| !r.is_empty() && *r != "*")
        .map(katakana_to_hiragana)
}

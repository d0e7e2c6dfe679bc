use std::collections::HashMap;

/// Closed ARPAbet symbol set accepted as weak-unit feedback.
pub const VALID_PHONEMES: [&str; 39] = [
    "AA", "AE", "AH", "AO", "AW", "AY", "B", "CH", "D", "DH", "EH", "ER", "EY", "F", "G", "HH",
    "IH", "IY", "JH", "K", "L", "M", "N", "NG", "OW", "OY", "P", "R", "S", "SH", "T", "TH", "UH",
    "UW", "V", "W", "Y", "Z", "ZH",
];

pub const DEFAULT_WORD: &str = "mama";

const DEFAULT_WORDS: &[(&str, &str)] = &[
    ("R", "car"),
    ("S", "bus"),
    ("CH", "chair"),
    ("L", "ball"),
    ("SH", "fish"),
    ("TH", "bath"),
    ("K", "cake"),
    ("G", "dog"),
    ("F", "leaf"),
    ("Z", "zoo"),
    ("JH", "juice"),
];

pub fn is_valid_phoneme(symbol: &str) -> bool {
    VALID_PHONEMES.contains(&symbol)
}

/// Canonical spelling of a user-supplied symbol, if it is in the vocabulary.
pub fn normalize_phoneme(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    is_valid_phoneme(&symbol).then_some(symbol)
}

/// Display word used to prompt practice of a unit.
#[derive(Debug, Clone)]
pub struct WordTable {
    words: HashMap<String, String>,
    fallback: String,
}

impl Default for WordTable {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS
                .iter()
                .map(|(unit, word)| (unit.to_string(), word.to_string()))
                .collect(),
            fallback: DEFAULT_WORD.to_string(),
        }
    }
}

impl WordTable {
    pub fn with_entry(mut self, unit: impl Into<String>, word: impl Into<String>) -> Self {
        self.words.insert(unit.into(), word.into());
        self
    }

    pub fn with_fallback(mut self, word: impl Into<String>) -> Self {
        self.fallback = word.into();
        self
    }

    pub fn word_for(&self, unit: &str) -> &str {
        self.words.get(unit).map(String::as_str).unwrap_or(&self.fallback)
    }
}

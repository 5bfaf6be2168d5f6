//! Character-range language heuristic
//!
//! Not a statistical classifier: the first matching range wins.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Japanese,
    Chinese,
    English,
    None,
}

impl Language {
    /// Short code used inside prompts
    pub fn code(&self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::Chinese => "zh",
            Language::English => "en",
            Language::None => "none",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FAF}')
}

/// Classify `text`: kana → Japanese, else CJK ideographs → Chinese, else
/// Latin letters → English, else `fallback`.
pub fn detect_language(text: &str, fallback: Language) -> Language {
    if text.chars().any(is_kana) {
        return Language::Japanese;
    }
    if text.chars().any(is_cjk_ideograph) {
        return Language::Chinese;
    }
    if text.chars().any(|c| c.is_ascii_alphabetic()) {
        return Language::English;
    }
    fallback
}

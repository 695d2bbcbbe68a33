//! Language detection from script and function-word heuristics.

use crate::style::Language;
use serde::Serialize;

/// Share of Devanagari letters above which text is taken as Hindi.
const DEVANAGARI_THRESHOLD: f64 = 0.3;

/// Minimum function-word density for a Latin-script verdict.
const MIN_WORD_DENSITY: f64 = 0.05;

const ENGLISH_WORDS: &[&str] = &[
    "the", "and", "of", "to", "a", "in", "is", "it", "that", "for", "on", "with", "as", "this",
    "are", "be", "was", "by", "we", "you", "from", "or", "an", "at", "not", "our", "will", "can",
    "have", "has", "which", "their", "they",
];

/// Romanized Hindi function words.
const HINGLISH_WORDS: &[&str] = &[
    "hai", "hain", "ka", "ki", "ke", "ko", "nahi", "nahin", "aur", "mein", "kya", "yeh", "woh",
    "bhi", "tha", "thi", "hum", "aap", "kar", "karna", "liye", "se", "par", "ek", "jo",
];

/// English letter bigrams that rarely dominate romanized Hindi.
const ENGLISH_BIGRAMS: &[&str] = &["th", "wh", "ng", "ou", "ea"];

/// Where the reported language came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Detected,
    Hint,
    Default,
}

/// Outcome of language detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LanguageDetection {
    pub language: Language,
    /// 0.0 when the language was not detected from the text.
    pub confidence: f64,
    pub source: DetectionSource,
}

/// Detect the language of `text`, falling back to `hint` and then
/// `default`. Never fails.
pub fn detect_language(text: &str, hint: Option<Language>, default: Language) -> LanguageDetection {
    if let Some((language, confidence)) = detect_from_text(text) {
        log::debug!("Detected language {} ({:.2})", language, confidence);
        return LanguageDetection {
            language,
            confidence,
            source: DetectionSource::Detected,
        };
    }

    match hint {
        Some(language) => LanguageDetection {
            language,
            confidence: 0.0,
            source: DetectionSource::Hint,
        },
        None => LanguageDetection {
            language: default,
            confidence: 0.0,
            source: DetectionSource::Default,
        },
    }
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn detect_from_text(text: &str) -> Option<(Language, f64)> {
    let mut devanagari = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        if is_devanagari(c) {
            if c.is_alphabetic() || ('\u{093E}'..='\u{094D}').contains(&c) {
                devanagari += 1;
            }
        } else if c.is_alphabetic() && (c.is_ascii() || ('\u{00C0}'..='\u{024F}').contains(&c)) {
            latin += 1;
        }
    }

    let letters = devanagari + latin;
    if letters == 0 {
        return None;
    }

    let share = devanagari as f64 / letters as f64;
    if share >= DEVANAGARI_THRESHOLD {
        return Some((Language::Hi, share));
    }

    // Latin script: English or romanized Hindi?
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        return None;
    }

    let english = words
        .iter()
        .filter(|w| ENGLISH_WORDS.contains(&w.as_str()))
        .count() as f64;
    let hinglish = words
        .iter()
        .filter(|w| HINGLISH_WORDS.contains(&w.as_str()))
        .count() as f64;

    let lower = text.to_lowercase();
    let bigram_hits = ENGLISH_BIGRAMS
        .iter()
        .map(|b| lower.matches(b).count())
        .sum::<usize>() as f64;
    let english_score = english / words.len() as f64 + 0.25 * bigram_hits / latin.max(1) as f64;
    let hinglish_score = hinglish / words.len() as f64;

    let best = english_score.max(hinglish_score);
    if best < MIN_WORD_DENSITY {
        return None;
    }

    // Short samples earn less confidence.
    let sample_weight = (words.len() as f64 / 8.0).min(1.0);
    let confidence = (best / (english_score + hinglish_score)) * sample_weight;
    if hinglish_score > english_score {
        Some((Language::Hi, confidence))
    } else {
        Some((Language::En, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        let d = detect_language(
            "The results of the study show that the method is effective.",
            None,
            Language::Hi,
        );
        assert_eq!(d.language, Language::En);
        assert_eq!(d.source, DetectionSource::Detected);
        assert!(d.confidence > 0.5);
    }

    #[test]
    fn test_detects_devanagari() {
        let d = detect_language(
            "\u{092F}\u{0939} \u{090F}\u{0915} \u{092A}\u{0930}\u{0940}\u{0915}\u{094D}\u{0937}\u{0923} \u{0939}\u{0948}",
            None,
            Language::En,
        );
        assert_eq!(d.language, Language::Hi);
        assert_eq!(d.source, DetectionSource::Detected);
    }

    #[test]
    fn test_detects_romanized_hindi() {
        let d = detect_language("yeh kya hai aur woh bhi nahi hai", None, Language::En);
        assert_eq!(d.language, Language::Hi);
    }

    #[test]
    fn test_falls_back_to_hint_then_default() {
        let d = detect_language("12345 67890", Some(Language::Hi), Language::En);
        assert_eq!(d.language, Language::Hi);
        assert_eq!(d.source, DetectionSource::Hint);

        let d = detect_language("12345 67890", None, Language::En);
        assert_eq!(d.language, Language::En);
        assert_eq!(d.source, DetectionSource::Default);
        assert_eq!(d.confidence, 0.0);
    }
}

//! Lexical and stylistic signals for tone and theme suggestions.

use crate::style::{Theme, Tone};
use serde::Serialize;

const FORMAL_WORDS: &[&str] = &[
    "therefore", "furthermore", "moreover", "consequently", "hereby", "pursuant", "regarding",
    "accordingly", "nevertheless", "respectively", "objective", "stakeholders", "shall",
    "kindly", "sincerely", "aforementioned", "\u{0905}\u{0924}\u{0903}", "\u{0915}\u{0943}\u{092A}\u{092F}\u{093E}",
];

const CASUAL_WORDS: &[&str] = &[
    "hey", "cool", "awesome", "guys", "gonna", "wanna", "stuff", "okay", "ok", "yeah", "super",
    "pretty", "kinda", "folks", "chill", "yaar",
];

const TECHNICAL_WORDS: &[&str] = &[
    "algorithm", "api", "architecture", "system", "data", "database", "function", "latency",
    "throughput", "performance", "implementation", "protocol", "server", "cache", "module",
    "deploy", "deployment", "configuration", "benchmark", "compiler", "network", "memory",
    "interface", "query",
];

const STORY_WORDS: &[&str] = &[
    "once", "upon", "suddenly", "journey", "story", "remember", "then", "later", "finally",
    "began", "felt", "dream", "adventure", "hero", "night", "morning", "ago",
];

const HUMOR_WORDS: &[&str] = &[
    "haha", "hahaha", "lol", "lmao", "joke", "jokes", "funny", "hilarious", "pun", "kidding",
    "silly", "laugh", "oops",
];

const FIRST_PERSON: &[&str] = &["i", "we", "my", "our", "me", "us"];

const MEDICAL_WORDS: &[&str] = &[
    "patient", "patients", "clinical", "diagnosis", "treatment", "therapy", "disease", "medical",
    "health", "hospital", "symptoms", "dose", "surgery", "care", "medicine",
];

const ACADEMIC_WORDS: &[&str] = &[
    "research", "study", "hypothesis", "thesis", "university", "literature", "methodology",
    "findings", "experiment", "analysis", "theory", "lecture", "students", "paper", "abstract",
];

const CREATIVE_WORDS: &[&str] = &[
    "design", "art", "creative", "imagine", "inspiration", "color", "colour", "brand", "idea",
    "ideas", "vision", "craft", "music", "photography",
];

const MINIMALIST_WORDS: &[&str] = &["minimal", "simple", "simplicity", "clean", "essentials", "less"];

const PROFESSIONAL_WORDS: &[&str] = &[
    "business", "revenue", "strategy", "market", "client", "clients", "quarter", "growth",
    "sales", "roadmap", "budget", "kpi", "team", "customer", "profit",
];

/// Score of one tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToneScore {
    pub tone: Tone,
    /// Signal hits per 100 words.
    pub score: f64,
}

/// Tone scores and the winning tone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneAssessment {
    pub tone: Tone,
    pub scores: Vec<ToneScore>,
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn count_in(words: &[String], lexicon: &[&str]) -> f64 {
    words.iter().filter(|w| lexicon.contains(&w.as_str())).count() as f64
}

fn is_emoji(c: char) -> bool {
    matches!(c as u32, 0x1F300..=0x1FAFF | 0x2600..=0x27BF)
}

fn looks_technical(word: &str) -> bool {
    word.contains('_')
        || (word.chars().any(|c| c.is_ascii_digit()) && word.chars().any(|c| c.is_alphabetic()))
}

/// Score every tone and pick the strongest.
///
/// Ties go to the tone declared first in [`Tone::ALL`]. When no signal
/// fires at all, `hint` wins, then [`Tone::Formal`].
pub fn assess_tone(text: &str, hint: Option<Tone>) -> ToneAssessment {
    let words = words(text);
    let total = words.len().max(1) as f64;

    let sentences: Vec<&str> = text
        .split(['.', '!', '?', '\u{0964}'])
        .filter(|s| !s.trim().is_empty())
        .collect();
    let long_sentences = sentences
        .iter()
        .filter(|s| s.split_whitespace().count() > 20)
        .count() as f64;
    let contractions = words
        .iter()
        .filter(|w| w.contains('\'') && !w.starts_with('\'') && !w.ends_with('\''))
        .count() as f64;
    let exclamations = text.matches('!').count() as f64;
    let double_bangs = text.matches("!!").count() as f64;
    let emoji = text.chars().filter(|c| is_emoji(*c)).count() as f64;
    let technical_tokens =
        text.split_whitespace().filter(|w| looks_technical(w)).count() as f64;
    let past_tense = words
        .iter()
        .filter(|w| w.len() > 4 && w.ends_with("ed"))
        .count() as f64;
    let first_person = count_in(&words, FIRST_PERSON);

    let raw = [
        (Tone::Formal, count_in(&words, FORMAL_WORDS) + 0.5 * long_sentences),
        (
            Tone::Casual,
            count_in(&words, CASUAL_WORDS) + contractions + 0.5 * exclamations + 0.5 * emoji,
        ),
        (
            Tone::Technical,
            count_in(&words, TECHNICAL_WORDS) + 0.5 * technical_tokens,
        ),
        (
            Tone::Storytelling,
            count_in(&words, STORY_WORDS) + 0.25 * past_tense + 0.25 * first_person,
        ),
        (
            Tone::Humorous,
            count_in(&words, HUMOR_WORDS) + double_bangs + emoji,
        ),
    ];

    let scores: Vec<ToneScore> = raw
        .iter()
        .map(|(tone, hits)| ToneScore {
            tone: *tone,
            score: hits * 100.0 / total,
        })
        .collect();

    let mut best = scores[0];
    for candidate in &scores[1..] {
        if candidate.score > best.score {
            best = *candidate;
        }
    }

    let tone = if best.score > 0.0 {
        best.tone
    } else {
        hint.unwrap_or(Tone::Formal)
    };

    ToneAssessment { tone, scores }
}

/// Suggest a theme from domain vocabulary, or `None` if nothing matches.
pub fn suggest_theme(text: &str) -> Option<Theme> {
    let words = words(text);
    let lexicon = |theme: Theme| -> &'static [&'static str] {
        match theme {
            Theme::Professional => PROFESSIONAL_WORDS,
            Theme::Academic => ACADEMIC_WORDS,
            Theme::Creative => CREATIVE_WORDS,
            Theme::Minimalist => MINIMALIST_WORDS,
            Theme::Medical => MEDICAL_WORDS,
        }
    };

    let mut best: Option<(Theme, f64)> = None;
    for theme in Theme::ALL {
        let hits = count_in(&words, lexicon(theme));
        if hits > 0.0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((theme, hits));
        }
    }
    best.map(|(theme, _)| theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_text() {
        let a = assess_tone(
            "The API server caches query results to cut latency and raise throughput.",
            None,
        );
        assert_eq!(a.tone, Tone::Technical);
        assert_eq!(a.scores.len(), 5);
    }

    #[test]
    fn test_casual_text() {
        let a = assess_tone("Hey guys, it's gonna be awesome! Don't miss it!", None);
        assert_eq!(a.tone, Tone::Casual);
    }

    #[test]
    fn test_humorous_text() {
        let a = assess_tone("haha that joke was hilarious lol", None);
        assert_eq!(a.tone, Tone::Humorous);
    }

    #[test]
    fn test_storytelling_text() {
        let a = assess_tone(
            "Once upon a time we started a journey. Suddenly the night changed everything.",
            None,
        );
        assert_eq!(a.tone, Tone::Storytelling);
    }

    #[test]
    fn test_tie_broken_by_priority() {
        // One formal word and one casual word.
        let a = assess_tone("therefore cool", None);
        assert_eq!(a.scores[0].score, a.scores[1].score);
        assert_eq!(a.tone, Tone::Formal);
    }

    #[test]
    fn test_no_signal_uses_hint() {
        assert_eq!(assess_tone("blue green", Some(Tone::Humorous)).tone, Tone::Humorous);
        assert_eq!(assess_tone("blue green", None).tone, Tone::Formal);
    }

    #[test]
    fn test_theme_suggestion() {
        assert_eq!(
            suggest_theme("Patient outcomes after treatment in the clinical trial"),
            Some(Theme::Medical)
        );
        assert_eq!(
            suggest_theme("Quarterly revenue growth and sales strategy"),
            Some(Theme::Professional)
        );
        assert_eq!(suggest_theme("blue green"), None);
    }
}

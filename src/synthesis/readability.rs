//! Spanish readability metrics.
//!
//! Reading ease uses the Fernández-Huerta adaptation of the Flesch score:
//! `206.84 - 0.60 * P - 1.02 * F`, with `P` syllables per hundred words
//! and `F` mean words per sentence. Syllables are approximated by vowel
//! groups, which is accurate enough for scoring generated prose.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Minimum acceptable reading-ease score.
pub const MIN_READING_EASE: f64 = 60.0;

/// Maximum acceptable mean sentence length, in words.
pub const MAX_SENTENCE_WORDS: f64 = 20.0;

/// Computed readability metrics for one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    /// Fernández-Huerta reading ease.
    pub flesch_reading_ease: f64,

    /// Mean words per sentence.
    pub avg_sentence_length: f64,

    /// Word count.
    pub word_count: usize,

    /// Sentence count.
    pub sentence_count: usize,
}

impl ReadabilityMetrics {
    /// Whether the text satisfies both readability constraints.
    #[must_use]
    pub fn acceptable(&self) -> bool {
        self.flesch_reading_ease >= MIN_READING_EASE
            && self.avg_sentence_length <= MAX_SENTENCE_WORDS
    }
}

fn is_spanish_vowel(c: char) -> bool {
    matches!(
        c.to_lowercase().next().unwrap_or(c),
        'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü'
    )
}

/// Approximates the syllable count of one word by counting vowel groups.
#[must_use]
pub fn syllables(word: &str) -> usize {
    let mut count = 0;
    let mut in_group = false;
    for c in word.chars() {
        if is_spanish_vowel(c) {
            if !in_group {
                count += 1;
            }
            in_group = true;
        } else {
            in_group = false;
        }
    }
    count.max(1)
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn words(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}

/// Computes the readability metrics of a text.
#[must_use]
pub fn measure(text: &str) -> ReadabilityMetrics {
    let sentence_list = sentences(text);
    let word_list = words(text);
    let word_count = word_list.len();
    let sentence_count = sentence_list.len().max(1);

    if word_count == 0 {
        return ReadabilityMetrics {
            flesch_reading_ease: 0.0,
            avg_sentence_length: 0.0,
            word_count: 0,
            sentence_count: 0,
        };
    }

    let syllable_count: usize = word_list.iter().map(|w| syllables(w)).sum();
    #[allow(clippy::cast_precision_loss)]
    let (w, s, syl) = (
        word_count as f64,
        sentence_count as f64,
        syllable_count as f64,
    );
    let p = syl / w * 100.0;
    let f = w / s;

    ReadabilityMetrics {
        flesch_reading_ease: 206.84 - 0.60 * p - 1.02 * f,
        avg_sentence_length: f,
        word_count,
        sentence_count: sentence_list.len(),
    }
}

/// Splits sentences longer than the limit at commas, conjunctions or the
/// midpoint, producing shorter sentences with the same content.
#[must_use]
pub fn split_long_sentences(text: &str) -> String {
    let mut out = Vec::new();
    for sentence in sentences(text) {
        let sentence_words = words(sentence);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        if sentence_words.len() as f64 <= MAX_SENTENCE_WORDS {
            out.push(sentence.to_string());
            continue;
        }

        // Prefer a comma split near the middle; fall back to a hard split.
        let midpoint = sentence.len() / 2;
        let split_at = sentence
            .char_indices()
            .filter(|(_, c)| *c == ',')
            .map(|(i, _)| i)
            .min_by_key(|i| i.abs_diff(midpoint));
        if let Some(at) = split_at {
            out.push(sentence[..at].trim().to_string());
            out.push(capitalize(sentence[at + 1..].trim()));
        } else {
            let half = sentence_words.len() / 2;
            out.push(sentence_words[..half].join(" "));
            out.push(capitalize(&sentence_words[half..].join(" ")));
        }
    }
    let mut joined = out.join(". ");
    joined.push('.');
    joined
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

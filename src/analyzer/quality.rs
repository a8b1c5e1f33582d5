//! Content quality: word counts and readability indices
//!
//! The indices follow the standard published formulas. They are only
//! computed when the page holds more than 50 words; below that they swing
//! wildly and say nothing useful about the content.

use crate::analyzer::types::{ContentQuality, Readability};

/// Minimum word count before readability indices are computed
const MIN_WORDS_FOR_READABILITY: usize = 50;

/// Analyzes cleaned page text
pub fn analyze_content_quality(text: &str) -> ContentQuality {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();

    if word_count <= MIN_WORDS_FOR_READABILITY {
        return ContentQuality {
            word_count,
            insufficient_content: true,
            readability: None,
        };
    }

    let sentences = count_sentences(text).max(1);
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let polysyllables = words.iter().filter(|w| count_syllables(w) >= 3).count();
    let characters: usize = words.iter().map(|w| w.chars().count()).sum();

    let words_f = word_count as f64;
    let sentences_f = sentences as f64;
    let syllables_f = syllables as f64;

    let flesch_reading_ease =
        206.835 - 1.015 * (words_f / sentences_f) - 84.6 * (syllables_f / words_f);
    let flesch_kincaid_grade =
        0.39 * (words_f / sentences_f) + 11.8 * (syllables_f / words_f) - 15.59;
    let smog_index = 1.043 * (polysyllables as f64 * 30.0 / sentences_f).sqrt() + 3.1291;
    let automated_readability_index =
        4.71 * (characters as f64 / words_f) + 0.5 * (words_f / sentences_f) - 21.43;

    ContentQuality {
        word_count,
        insufficient_content: false,
        readability: Some(Readability {
            flesch_reading_ease,
            flesch_kincaid_grade,
            smog_index,
            automated_readability_index,
            syllable_count: syllables,
        }),
    }
}

/// Counts sentences by terminal punctuation runs
fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut in_terminator = false;
    for c in text.chars() {
        if c == '.' || c == '!' || c == '?' {
            if !in_terminator {
                count += 1;
            }
            in_terminator = true;
        } else {
            in_terminator = false;
        }
    }
    count
}

/// Estimates syllables in a word by counting vowel groups
///
/// A trailing silent 'e' is discounted when the word has more than one
/// vowel group. Every word counts as at least one syllable.
fn count_syllables(word: &str) -> usize {
    let word: String = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if word.is_empty() {
        return 1;
    }

    let mut groups = 0;
    let mut prev_vowel = false;
    for c in word.chars() {
        let vowel = "aeiouy".contains(c);
        if vowel && !prev_vowel {
            groups += 1;
        }
        prev_vowel = vowel;
    }

    if groups > 1 && word.ends_with('e') && !word.ends_with("le") {
        groups -= 1;
    }

    groups.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_reports_only_count() {
        let quality = analyze_content_quality("just a few words here");
        assert_eq!(quality.word_count, 5);
        assert!(quality.insufficient_content);
        assert!(quality.readability.is_none());
    }

    #[test]
    fn test_exactly_fifty_words_is_insufficient() {
        let text = vec!["word"; 50].join(" ");
        let quality = analyze_content_quality(&text);
        assert_eq!(quality.word_count, 50);
        assert!(quality.insufficient_content);
    }

    #[test]
    fn test_long_text_computes_readability() {
        let sentence = "The quick brown fox jumps over the lazy dog near the river bank. ";
        let text = sentence.repeat(8);
        let quality = analyze_content_quality(&text);

        assert_eq!(quality.word_count, 104);
        assert!(!quality.insufficient_content);
        let readability = quality.readability.unwrap();
        assert!(readability.flesch_reading_ease > 0.0);
        assert!(readability.syllable_count >= quality.word_count);
    }

    #[test]
    fn test_readability_deterministic() {
        let text = "Readable prose flows well. It carries the reader along. ".repeat(10);
        let a = analyze_content_quality(&text);
        let b = analyze_content_quality(&text);
        assert_eq!(
            a.readability.unwrap().flesch_reading_ease,
            b.readability.unwrap().flesch_reading_ease
        );
    }

    #[test]
    fn test_count_sentences() {
        assert_eq!(count_sentences("One. Two! Three?"), 3);
        assert_eq!(count_sentences("Ellipsis... still one sentence end"), 1);
        assert_eq!(count_sentences("no terminator"), 0);
    }

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("water"), 2);
        assert_eq!(count_syllables("beautiful"), 3);
        // Silent e
        assert_eq!(count_syllables("make"), 1);
        // -le keeps its syllable
        assert_eq!(count_syllables("table"), 2);
        // Never zero
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("123"), 1);
    }
}

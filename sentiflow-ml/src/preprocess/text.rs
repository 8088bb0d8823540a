//! Individual text transforms. Each is a total `&str -> String` function.

use crate::preprocess::lemma::lemmatize_word;
use crate::preprocess::stopwords::StopWords;
use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+|www\.\S+").expect("URL pattern is a valid regex")
});

/// Arabic semicolon, stripped along with ASCII punctuation.
const ARABIC_SEMICOLON: char = '\u{061B}';

/// Lowercase every whitespace-separated token and rejoin with single spaces.
pub fn lower_case(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop tokens that exactly match a stop word.
pub fn remove_stop_words(text: &str, stop_words: &StopWords) -> String {
    text.split_whitespace()
        .filter(|w| !stop_words.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// First code point of each run of ten decimal digits outside ASCII.
const DECIMAL_ZEROS: &[u32] = &[
    0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66, 0x0CE6,
    0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x19D0, 0x1A80,
    0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0, 0xAA50, 0xABF0,
    0xFF10, 0x2080,
];

/// Digit characters: decimal digits in any script, plus superscript and
/// circled digits. Fractions, roman numerals and other numeric symbols are
/// not digits.
fn is_digit(c: char) -> bool {
    if c.is_ascii_digit() {
        return true;
    }
    let cp = u32::from(c);
    matches!(cp, 0xB2 | 0xB3 | 0xB9 | 0x2070 | 0x2074..=0x2079 | 0x2460..=0x2468)
        || DECIMAL_ZEROS.iter().any(|&zero| (zero..zero + 10).contains(&cp))
}

/// Remove every digit character.
pub fn removing_numbers(text: &str) -> String {
    text.chars().filter(|&c| !is_digit(c)).collect()
}

/// Replace ASCII punctuation with spaces, then collapse and trim whitespace.
pub fn removing_punctuations(text: &str) -> String {
    let spaced: String = text
        .chars()
        .filter(|c| *c != ARABIC_SEMICOLON)
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `http(s)://...` and `www....` URLs.
pub fn removing_urls(text: &str) -> String {
    URL_PATTERN.replace_all(text, "").into_owned()
}

/// Lemmatize each whitespace-separated token.
pub fn lemmatization(text: &str) -> String {
    text.split_whitespace()
        .map(lemmatize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lower_case() {
        assert_eq!(lower_case("  Hello   WORLD\tAgain "), "hello world again");
        assert_eq!(lower_case(""), "");
    }

    #[test]
    fn test_remove_stop_words() {
        let sw = StopWords::english();
        assert_eq!(remove_stop_words("this is a great day", &sw), "great day");
        assert_eq!(remove_stop_words("i don't know", &sw), "know");
        assert_eq!(remove_stop_words("", &sw), "");
    }

    #[test]
    fn test_removing_numbers() {
        assert_eq!(removing_numbers("top 10 songs of 2009"), "top  songs of ");
        assert_eq!(removing_numbers("٣ arabic digit"), " arabic digit");
    }

    #[test]
    fn test_removing_numbers_keeps_numeric_symbols() {
        assert_eq!(removing_numbers("½ cup"), "½ cup");
        assert_eq!(removing_numbers("chapter Ⅻ"), "chapter Ⅻ");
        assert_eq!(removing_numbers("x² ①"), "x ");
        assert_eq!(removing_numbers("१२३ ４５"), " ");
    }

    #[test]
    fn test_removing_punctuations() {
        assert_eq!(removing_punctuations("Hello, World!!"), "Hello World");
        assert_eq!(removing_punctuations("can't-stop؛ now..."), "can t stop now");
        assert_eq!(removing_punctuations("!!!"), "");
    }

    #[test]
    fn test_removing_urls() {
        assert_eq!(
            removing_urls("see https://t.co/abc and www.example.com now"),
            "see  and  now"
        );
        assert_eq!(removing_urls("no links here"), "no links here");
    }

    #[test]
    fn test_lemmatization() {
        assert_eq!(lemmatization("cats  and dogs"), "cat and dog");
        assert_eq!(lemmatization(""), "");
    }
}

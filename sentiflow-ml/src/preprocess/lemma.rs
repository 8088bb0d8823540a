//! Rule-based noun lemmatizer.
//!
//! Reduces plural nouns to their singular form with an irregular-plural table
//! followed by suffix rules. Without a dictionary the rules are conservative:
//! short tokens, tokens with non-letters and words listed in [`INVARIANT`]
//! are returned unchanged.

/// Irregular plurals and plurals the suffix rules would get wrong.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("wolves", "wolf"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("wives", "wife"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("loaves", "loaf"),
    ("aches", "ache"),
    ("headaches", "headache"),
    ("caches", "cache"),
    ("niches", "niche"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("zombies", "zombie"),
    ("calories", "calorie"),
    ("selfies", "selfie"),
    ("brownies", "brownie"),
    ("goodies", "goodie"),
    ("smoothies", "smoothie"),
    ("pies", "pie"),
    ("ties", "tie"),
    ("lies", "lie"),
];

/// Words ending in `s` that are not plurals, or whose plural is the word
/// itself. The suffix rules would otherwise truncate them.
const INVARIANT: &[&str] = &[
    // adverbs
    "always",
    "sometimes",
    "perhaps",
    "afterwards",
    "towards",
    "upwards",
    "backwards",
    "besides",
    "nowadays",
    "whereas",
    // uncountable or same-form nouns
    "news",
    "thanks",
    "series",
    "species",
    "means",
    "lens",
    "chaos",
    "kudos",
    "ethos",
    "canvas",
    "atlas",
    "alias",
    "bias",
    "diabetes",
    "measles",
    "herpes",
    // proper nouns common in tweets
    "christmas",
    "texas",
    "vegas",
    "dallas",
    "paris",
    // -ics disciplines
    "physics",
    "mathematics",
    "maths",
    "politics",
    "economics",
    "athletics",
    "ethics",
    "genetics",
    "gymnastics",
    "aerobics",
    "linguistics",
    "logistics",
    "robotics",
    "electronics",
    "analytics",
];

/// Lemmatize a single lowercase token.
pub fn lemmatize_word(word: &str) -> String {
    if let Some((_, lemma)) = EXCEPTIONS.iter().find(|(plural, _)| *plural == word) {
        return (*lemma).to_string();
    }
    if INVARIANT.contains(&word)
        || word.chars().count() < 4
        || !word.chars().all(char::is_alphabetic)
    {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    for suffix in ["ches", "shes", "xes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{stem}y");
        }
    }
    if word.ends_with('s') && !["ss", "us", "is", "ous"].iter().any(|s| word.ends_with(s)) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        assert_eq!(lemmatize_word("days"), "day");
        assert_eq!(lemmatize_word("friends"), "friend");
        assert_eq!(lemmatize_word("parties"), "party");
        assert_eq!(lemmatize_word("classes"), "class");
        assert_eq!(lemmatize_word("churches"), "church");
        assert_eq!(lemmatize_word("wishes"), "wish");
        assert_eq!(lemmatize_word("boxes"), "box");
        assert_eq!(lemmatize_word("houses"), "house");
    }

    #[test]
    fn test_irregular_plurals() {
        assert_eq!(lemmatize_word("children"), "child");
        assert_eq!(lemmatize_word("feet"), "foot");
        assert_eq!(lemmatize_word("movies"), "movie");
        assert_eq!(lemmatize_word("headaches"), "headache");
    }

    #[test]
    fn test_non_plurals_untouched() {
        for word in ["yes", "miss", "bonus", "this", "famous", "happy", "gas", "k9s"] {
            assert_eq!(lemmatize_word(word), word, "{word}");
        }
    }

    #[test]
    fn test_words_that_only_look_plural() {
        for word in [
            "always",
            "news",
            "thanks",
            "christmas",
            "series",
            "species",
            "perhaps",
            "sometimes",
            "mathematics",
            "physics",
            "politics",
            "economics",
        ] {
            assert_eq!(lemmatize_word(word), word, "{word}");
        }
        // Ordinary -ics plurals still reduce.
        assert_eq!(lemmatize_word("comics"), "comic");
        assert_eq!(lemmatize_word("lyrics"), "lyric");
    }
}

//! Slug derivation for entry permalinks.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static PUNCTUATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"[\t !"#$%&'()*\-/<=>?@\[\\\]^_`{|},.:]+"##).expect("valid slug punctuation regex")
});

const SLUG_DELIMITER: &str = "-";

/// Derives the URL slug of an entry title.
///
/// The title is lower-cased and split on punctuation/whitespace; each word is
/// NFKD-decomposed and reduced to its ASCII characters, empty fragments are
/// dropped and the rest joined with `-`.
///
/// A title made only of punctuation or non-Latin script yields `""`; callers
/// reject such titles before insert.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    PUNCTUATION_RE
        .split(&lowered)
        .map(|word| word.nfkd().filter(char::is_ascii).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(SLUG_DELIMITER)
}

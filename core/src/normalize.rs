use crate::MovieRecord;
use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Build the canonical tag string for a movie: overview tokens followed by
/// genres, keywords, cast, and crew (each entry collapsed to a single token),
/// NFKC-normalized, lower-cased, and stemmed token by token.
///
/// Pure transform: the same record always yields the same tag string, and
/// missing fields degrade to empty contributions.
pub fn tag_string(record: &MovieRecord) -> String {
    let mut tokens: Vec<String> = Vec::new();

    if let Some(overview) = &record.overview {
        tokens.extend(overview.split_whitespace().map(str::to_string));
    }
    for field in [&record.genres, &record.keywords, &record.cast, &record.crew] {
        tokens.extend(field.iter().map(|entry| collapse_spaces(entry)));
    }

    let joined = tokens.join(" ").nfkc().collect::<String>().to_lowercase();
    let stemmed: Vec<String> = joined
        .split_whitespace()
        .map(|token| STEMMER.stem(token).to_string())
        .collect();
    stemmed.join(" ")
}

/// "Science Fiction" -> "ScienceFiction", so multi-word entities survive
/// whitespace tokenization as one term.
fn collapse_spaces(entry: &str) -> String {
    entry.split_whitespace().collect()
}

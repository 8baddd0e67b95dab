use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default vocabulary cap, matching the corpus scale this engine targets.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// A frozen term -> column mapping learned once from the corpus tag strings.
///
/// Columns follow `terms` order: descending document frequency, ties broken
/// by ascending term, truncated to the configured cap. After `fit` the
/// vocabulary never grows; vectorizing text with unknown terms silently
/// contributes zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    columns: HashMap<String, usize>,
}

impl Vocabulary {
    /// Learn a vocabulary of at most `max_features` terms from the corpus
    /// tag strings, by descending document frequency after stop-word removal.
    pub fn fit(tags: &[String], max_features: usize) -> Self {
        let mut df: HashMap<&str, u32> = HashMap::new();
        for tag in tags {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tag.split_whitespace() {
                if is_stopword(token) || !seen.insert(token) {
                    continue;
                }
                *df.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, u32)> = df.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let total = ranked.len();
        ranked.truncate(max_features);

        let terms: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        let columns = terms
            .iter()
            .enumerate()
            .map(|(col, term)| (term.clone(), col))
            .collect();
        tracing::debug!(kept = terms.len(), total, "vocabulary fitted");
        Self { terms, columns }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.columns.get(term).copied()
    }

    /// Map one tag string to an L2-normalized count row over the frozen
    /// vocabulary. A tag string with no vocabulary overlap yields the zero
    /// vector unchanged, not NaN.
    pub fn vectorize(&self, tags: &str) -> Vec<f32> {
        let mut row = vec![0.0f32; self.terms.len()];
        for token in tags.split_whitespace() {
            if let Some(col) = self.column(token) {
                row[col] += 1.0;
            }
        }
        l2_normalize(&mut row);
        row
    }

    /// Vectorize the whole corpus, one row per tag string in input order.
    pub fn transform(&self, tags: &[String]) -> Vec<Vec<f32>> {
        tags.iter().map(|t| self.vectorize(t)).collect()
    }
}

fn l2_normalize(row: &mut [f32]) {
    let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in row.iter_mut() {
            *v /= norm;
        }
    }
}

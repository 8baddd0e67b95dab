use crate::error::Error;
use crate::index::FlatIndex;
use crate::{MovieMeta, RowId};
use std::collections::HashMap;

/// Read path over a finalized corpus: title lookup, nearest-neighbor search,
/// self-exclusion, and resolution of row positions back to movie metadata.
///
/// The `(movies, index)` pair is immutable once constructed; swapping in a
/// fresh corpus means building a new `Recommender` and replacing the old one
/// wholesale.
pub struct Recommender {
    movies: Vec<MovieMeta>,
    title_to_row: HashMap<String, RowId>,
    index: FlatIndex,
}

impl Recommender {
    /// Wrap a corpus map and its index. The two must be row-aligned; a count
    /// mismatch means the artifacts were produced by different builds.
    pub fn new(movies: Vec<MovieMeta>, index: FlatIndex) -> Result<Self, Error> {
        if movies.len() != index.ntotal() {
            return Err(Error::CorpusMismatch {
                movies: movies.len(),
                vectors: index.ntotal(),
            });
        }
        let mut title_to_row: HashMap<String, RowId> = HashMap::new();
        for (row, meta) in movies.iter().enumerate() {
            // First occurrence in build order wins for duplicate titles.
            title_to_row
                .entry(meta.title.clone())
                .or_insert(row as RowId);
        }
        Ok(Self {
            movies,
            title_to_row,
            index,
        })
    }

    pub fn num_movies(&self) -> usize {
        self.movies.len()
    }

    /// Row-ordered corpus metadata, e.g. for a selection UI.
    pub fn movies(&self) -> &[MovieMeta] {
        &self.movies
    }

    /// Up to `k` movies most similar to `title`, best first. An unknown
    /// title yields an empty list so callers can fall back to "try another
    /// movie"; an index inconsistency is a hard error.
    pub fn recommend(&self, title: &str, k: usize) -> Result<Vec<MovieMeta>, Error> {
        let Some(&row) = self.title_to_row.get(title) else {
            return Ok(Vec::new());
        };
        let query = self.index.reconstruct(row)?;
        // Over-fetch by one: the query movie matches itself with the top
        // score, but under exact ties it is not guaranteed to sit at
        // position 0, so exclusion is by row wherever it appears.
        let hits = self.index.search(query, k.saturating_add(1))?;
        let recs = hits
            .into_iter()
            .filter(|hit| hit.row != row)
            .take(k)
            .map(|hit| self.movies[hit.row as usize].clone())
            .collect();
        Ok(recs)
    }
}

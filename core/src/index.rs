use crate::error::Error;
use crate::RowId;
use serde::{Deserialize, Serialize};

/// A single search result: row position plus inner-product score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub row: RowId,
    pub score: f32,
}

/// Exact flat inner-product index over unit-norm vectors.
///
/// Vectors are stored row-major at dense 0-based positions in build order.
/// Because every stored row is unit-norm, inner product equals cosine
/// similarity; the index never substitutes another metric. Search is
/// exact brute force, O(N * d) per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Ingest vectors of dimension `dim`. The matrix may be empty; a row of
    /// the wrong width is a build error.
    pub fn build(rows: Vec<Vec<f32>>, dim: usize) -> Result<Self, Error> {
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in &rows {
            if row.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        tracing::debug!(vectors = rows.len(), dim, "flat index built");
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn ntotal(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    /// Return the stored vector at `row`.
    pub fn reconstruct(&self, row: RowId) -> Result<&[f32], Error> {
        let pos = row as usize;
        if pos >= self.ntotal() {
            return Err(Error::OutOfRange {
                pos,
                len: self.ntotal(),
            });
        }
        let start = pos * self.dim;
        Ok(&self.data[start..start + self.dim])
    }

    /// Top-k rows by inner product against `query`, ordered by descending
    /// score with ties broken by ascending row position. Returns at most
    /// `ntotal` hits; a `k` past the end is capped, not an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, Error> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }
        if self.dim == 0 {
            return Ok(Vec::new());
        }
        let mut hits: Vec<Hit> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(row, stored)| Hit {
                row: row as RowId,
                score: dot(stored, query),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.row.cmp(&b.row)));
        hits.truncate(k);
        Ok(hits)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

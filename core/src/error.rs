use thiserror::Error;

/// Errors surfaced by the index and engine. A zero feature vector is not an
/// error anywhere; it simply never scores.
#[derive(Debug, Error)]
pub enum Error {
    #[error("row position {pos} out of range for index of {len} vectors")]
    OutOfRange { pos: usize, len: usize },

    #[error("query vector has dimension {got}, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("corpus holds {movies} movies but index holds {vectors} vectors")]
    CorpusMismatch { movies: usize, vectors: usize },
}

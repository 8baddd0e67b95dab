pub mod engine;
pub mod error;
pub mod index;
pub mod normalize;
pub mod persist;
pub mod vocab;

pub use engine::Recommender;
pub use error::Error;
pub use index::{FlatIndex, Hit};
pub use vocab::Vocabulary;

use serde::{Deserialize, Serialize};

pub type MovieId = u32;
pub type RowId = u32;

/// A raw catalog entry as ingested from the metadata API or a corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub crew: Vec<String>,
}

/// Minimal per-movie metadata kept alongside the index, keyed by row position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieMeta {
    pub movie_id: MovieId,
    pub title: String,
}

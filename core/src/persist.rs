use crate::index::FlatIndex;
use crate::vocab::Vocabulary;
use crate::MovieMeta;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_movies: u32,
    pub dim: u32,
    pub created_at: String,
    pub version: u32,
}

/// Locations of the serialized artifacts under one data directory. The three
/// binary artifacts are row-aligned; they are only ever written together.
pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    pub fn movies(&self) -> PathBuf {
        self.root.join("movies.bin")
    }
    pub fn index(&self) -> PathBuf {
        self.root.join("index.bin")
    }
    pub fn vocab(&self) -> PathBuf {
        self.root.join("vocab.bin")
    }
    pub fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    /// All four artifact files, e.g. for publishing.
    pub fn all(&self) -> [PathBuf; 4] {
        [self.movies(), self.index(), self.vocab(), self.meta()]
    }

    pub fn exist(&self) -> bool {
        self.all().iter().all(|p| p.exists())
    }
}

pub fn save_movies(paths: &ArtifactPaths, movies: &[MovieMeta]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.movies())?;
    let bytes = bincode::serialize(movies)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_movies(paths: &ArtifactPaths) -> Result<Vec<MovieMeta>> {
    let mut f = File::open(paths.movies())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let movies = bincode::deserialize(&buf)?;
    Ok(movies)
}

pub fn save_index(paths: &ArtifactPaths, index: &FlatIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.index())?;
    let bytes = bincode::serialize(index)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_index(paths: &ArtifactPaths) -> Result<FlatIndex> {
    let mut f = File::open(paths.index())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let index = bincode::deserialize(&buf)?;
    Ok(index)
}

pub fn save_vocab(paths: &ArtifactPaths, vocab: &Vocabulary) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.vocab())?;
    let bytes = bincode::serialize(vocab)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_vocab(paths: &ArtifactPaths) -> Result<Vocabulary> {
    let mut f = File::open(paths.vocab())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let vocab = bincode::deserialize(&buf)?;
    Ok(vocab)
}

pub fn save_meta(paths: &ArtifactPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &ArtifactPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Load the structures required to serve: corpus map, index, meta. The
/// vocabulary is only needed when new free text must be vectorized, not for
/// title-based lookup.
pub fn load_snapshot(paths: &ArtifactPaths) -> Result<(Vec<MovieMeta>, FlatIndex, MetaFile)> {
    let movies = load_movies(paths)?;
    let index = load_index(paths)?;
    let meta = load_meta(paths)?;
    Ok((movies, index, meta))
}

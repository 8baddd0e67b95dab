use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use reel_core::normalize::tag_string;
use reel_core::persist::{
    save_index, save_meta, save_movies, save_vocab, ArtifactPaths, MetaFile,
};
use reel_core::{FlatIndex, MovieMeta, MovieRecord, Vocabulary};
use reel_release::ReleaseClient;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "updater")]
#[command(about = "Build and publish recommender artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the artifact triple from movie records in JSON/JSONL files
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output data directory
        #[arg(long)]
        output: String,
        /// Vocabulary cap
        #[arg(long, default_value_t = reel_core::vocab::DEFAULT_MAX_FEATURES)]
        max_features: usize,
    },
    /// Upload the artifact files to the release store under a tag
    Publish {
        /// Data directory holding the built artifacts
        #[arg(long)]
        data: String,
        /// Release tag, e.g. v1.0.0
        #[arg(long)]
        tag: String,
    },
    /// Show what is published under a release tag
    Info {
        /// Release tag to inspect
        #[arg(long)]
        tag: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, max_features } => build(&input, &output, max_features),
        Commands::Publish { data, tag } => publish(&data, &tag).await,
        Commands::Info { tag } => info(&tag).await,
    }
}

fn build(input: &str, output: &str, max_features: usize) -> Result<()> {
    let records = read_records(Path::new(input))?;
    if records.is_empty() {
        bail!("no usable movie records found under {input}");
    }
    tracing::info!(movies = records.len(), "corpus ingested");

    let tags: Vec<String> = records.iter().map(tag_string).collect();
    let vocab = Vocabulary::fit(&tags, max_features);
    if vocab.is_empty() {
        bail!("no vocabulary terms survived stop-word removal; corpus is unusable");
    }
    let matrix = vocab.transform(&tags);
    let index = FlatIndex::build(matrix, vocab.len())?;
    let movies: Vec<MovieMeta> = records
        .iter()
        .map(|r| MovieMeta { movie_id: r.movie_id, title: r.title.clone() })
        .collect();
    tracing::info!(terms = vocab.len(), dim = index.dim(), "feature matrix built");

    let paths = ArtifactPaths::new(output);
    save_movies(&paths, &movies)?;
    save_index(&paths, &index)?;
    save_vocab(&paths, &vocab)?;
    let meta = MetaFile {
        num_movies: movies.len() as u32,
        dim: vocab.len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, "artifact build complete");
    Ok(())
}

async fn publish(data: &str, tag: &str) -> Result<()> {
    let paths = ArtifactPaths::new(data);
    if !paths.exist() {
        bail!("artifacts missing under {data}; run `updater build` first");
    }
    let client = ReleaseClient::from_env()?;
    let files = paths.all();
    let files: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    client.publish(tag, &files).await?;
    tracing::info!(tag, "artifacts published");
    Ok(())
}

async fn info(tag: &str) -> Result<()> {
    let client = ReleaseClient::from_env()?;
    match client.release_info(tag).await? {
        Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
        None => bail!("release {tag} not found"),
    }
    Ok(())
}

/// Collect movie records from a JSON/JSONL file or a directory of them.
/// Records that fail to parse or carry an empty title are logged and
/// skipped; file order and in-file order fix the row positions.
fn read_records(input: &Path) -> Result<Vec<MovieRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }

    let mut records = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    Ok(records)
}

fn read_jsonl(file: &Path, records: &mut Vec<MovieRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<MovieRecord>(&line) {
            Ok(record) => push_record(record, records),
            Err(e) => tracing::warn!(file = %file.display(), %e, "skipping malformed record"),
        }
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<MovieRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                match serde_json::from_value::<MovieRecord>(v) {
                    Ok(record) => push_record(record, records),
                    Err(e) => tracing::warn!(file = %file.display(), %e, "skipping malformed record"),
                }
            }
        }
        serde_json::Value::Object(_) => match serde_json::from_value::<MovieRecord>(json) {
            Ok(record) => push_record(record, records),
            Err(e) => tracing::warn!(file = %file.display(), %e, "skipping malformed record"),
        },
        _ => {}
    }
    Ok(())
}

fn push_record(record: MovieRecord, records: &mut Vec<MovieRecord>) {
    if record.title.trim().is_empty() {
        tracing::warn!(movie_id = record.movie_id, "skipping record with empty title");
        return;
    }
    records.push(record);
}

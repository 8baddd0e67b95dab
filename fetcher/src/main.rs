use anyhow::{anyhow, Result};
use clap::Parser;
use reel_core::{MovieId, MovieRecord};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Duration;
use tokio::time::sleep;

const API_BASE: &str = "https://api.themoviedb.org/3";
const MAX_RETRIES: u32 = 5;
/// Top-billed cast entries kept per movie.
const CAST_LIMIT: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(about = "Fetch popular movies from TMDb into a JSONL corpus", long_about = None)]
struct Cli {
    /// Number of popular-list pages to fetch (20 movies per page)
    #[arg(long, default_value_t = 50)]
    pages: u32,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/movies.jsonl")]
    output: String,
    /// Request timeout seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
    /// Delay between popular-list pages, in milliseconds
    #[arg(long, default_value_t = 500)]
    page_delay_ms: u64,
}

#[derive(Deserialize)]
struct PopularPage {
    results: Vec<PopularEntry>,
}

#[derive(Deserialize)]
struct PopularEntry {
    id: MovieId,
}

#[derive(Deserialize)]
struct Details {
    title: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<Named>,
}

#[derive(Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastEntry>,
    #[serde(default)]
    crew: Vec<CrewEntry>,
}

#[derive(Deserialize)]
struct CastEntry {
    name: String,
}

#[derive(Deserialize)]
struct CrewEntry {
    name: String,
    job: Option<String>,
}

#[derive(Deserialize)]
struct KeywordList {
    #[serde(default)]
    keywords: Vec<Named>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Cli::parse();
    let api_key = std::env::var("TMDB_API_KEY")
        .map_err(|_| anyhow!("TMDB_API_KEY must be set"))?;

    if let Some(dir) = std::path::Path::new(&args.output).parent() {
        fs::create_dir_all(dir).ok();
    }
    let mut out = BufWriter::new(File::create(&args.output)?);

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let mut fetched = 0usize;
    let mut skipped = 0usize;
    for page in 1..=args.pages {
        let url = format!(
            "{API_BASE}/movie/popular?api_key={api_key}&language=en-US&page={page}"
        );
        let Some(listing) = fetch_with_retry::<PopularPage>(&client, &url).await else {
            tracing::warn!(page, "skipping page after retries");
            skipped += 1;
            continue;
        };

        for entry in listing.results {
            match fetch_movie(&client, &api_key, entry.id).await {
                Some(record) => {
                    serde_json::to_writer(&mut out, &record)?;
                    out.write_all(b"\n")?;
                    fetched += 1;
                }
                None => skipped += 1,
            }
        }

        if page % 10 == 0 {
            tracing::info!(page, pages = args.pages, fetched, "progress");
        }
        sleep(Duration::from_millis(args.page_delay_ms)).await;
    }
    out.flush()?;

    tracing::info!(fetched, skipped, output = %args.output, "fetch complete");
    Ok(())
}

/// Assemble one corpus record from the details, credits, and keywords
/// endpoints. Any endpoint that stays unreachable after retries drops the
/// movie, never the run.
async fn fetch_movie(client: &Client, api_key: &str, movie_id: MovieId) -> Option<MovieRecord> {
    let details_url = format!("{API_BASE}/movie/{movie_id}?api_key={api_key}&language=en-US");
    let credits_url = format!("{API_BASE}/movie/{movie_id}/credits?api_key={api_key}");
    let keywords_url = format!("{API_BASE}/movie/{movie_id}/keywords?api_key={api_key}");

    let details = fetch_with_retry::<Details>(client, &details_url).await?;
    let credits = fetch_with_retry::<Credits>(client, &credits_url).await?;
    let keywords = fetch_with_retry::<KeywordList>(client, &keywords_url)
        .await
        .map(|k| k.keywords)
        .unwrap_or_default();

    let title = details.title.unwrap_or_default();
    if title.trim().is_empty() {
        tracing::warn!(movie_id, "dropping movie without a title");
        return None;
    }

    Some(MovieRecord {
        movie_id,
        title,
        overview: details.overview,
        genres: details.genres.into_iter().map(|g| g.name).collect(),
        keywords: keywords.into_iter().map(|k| k.name).collect(),
        cast: credits
            .cast
            .into_iter()
            .take(CAST_LIMIT)
            .map(|c| c.name)
            .collect(),
        crew: credits
            .crew
            .into_iter()
            .filter(|c| c.job.as_deref() == Some("Director"))
            .map(|c| c.name)
            .collect(),
    })
}

/// GET a JSON endpoint with capped exponential backoff. Five attempts; the
/// terminal outcome is give up and return absent.
async fn fetch_with_retry<T: DeserializeOwned>(client: &Client, url: &str) -> Option<T> {
    for attempt in 0..MAX_RETRIES {
        let result = match client.get(url).send().await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => resp.json::<T>().await.map_err(anyhow::Error::from),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(value) => return Some(value),
            Err(e) => {
                if attempt + 1 < MAX_RETRIES {
                    let wait = Duration::from_millis((1u64 << attempt) * 1000 + 500);
                    tracing::debug!(%e, attempt = attempt + 1, ?wait, "retrying");
                    sleep(wait).await;
                } else {
                    tracing::warn!(%e, url, "giving up after retries");
                }
            }
        }
    }
    None
}

use reel_core::MovieId;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;

const API_BASE: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const MAX_RETRIES: u32 = 5;

/// Best-effort poster lookup against the movie-metadata API. A lookup that
/// exhausts its retries costs the visual, never the recommendation.
#[derive(Clone)]
pub struct PosterClient {
    http: Client,
    api_key: Option<String>,
}

impl PosterClient {
    /// Reads `TMDB_API_KEY`; without it every lookup resolves to `None`.
    pub fn from_env() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: std::env::var("TMDB_API_KEY").ok(),
        }
    }

    pub async fn fetch(&self, movie_id: MovieId) -> Option<String> {
        let api_key = self.api_key.as_ref()?;
        let url = format!("{API_BASE}/movie/{movie_id}?api_key={api_key}&language=en-US");

        for attempt in 0..MAX_RETRIES {
            match self.try_fetch(&url).await {
                Ok(poster_path) => {
                    // A definitive answer without a poster is not retried.
                    return poster_path.map(|p| format!("{IMAGE_BASE}{p}"));
                }
                Err(e) => {
                    if attempt + 1 < MAX_RETRIES {
                        sleep(Duration::from_secs(1 << attempt)).await;
                    } else {
                        tracing::debug!(movie_id, %e, "poster lookup gave up");
                    }
                }
            }
        }
        None
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        Ok(value
            .get("poster_path")
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }
}

pub mod poster;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use poster::PosterClient;
use reel_core::persist::{load_snapshot, ArtifactPaths};
use reel_core::{MovieId, Recommender};
use reel_release::ReleaseClient;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct RecommendParams {
    pub title: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    5
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub took_s: f64,
    pub results: Vec<RecommendedMovie>,
}

#[derive(Serialize)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_url: Option<String>,
}

#[derive(Serialize)]
pub struct MovieListEntry {
    pub movie_id: MovieId,
    pub title: String,
}

#[derive(Clone)]
pub struct AppState {
    data_dir: PathBuf,
    // Readers clone the inner Arc and serve from that snapshot; reload
    // builds a full replacement off to the side and swaps it under the
    // write lock, so a half-built corpus is never observable.
    recommender: Arc<RwLock<Arc<Recommender>>>,
    poster: PosterClient,
    admin_token: Option<String>,
}

/// Load the artifacts (downloading them from the release store when absent
/// and configured) and assemble the router.
pub async fn build_app(data_dir: String) -> Result<Router> {
    let dir = PathBuf::from(&data_dir);
    ensure_artifacts(&dir).await?;
    let recommender = Arc::new(load_recommender(&dir)?);
    tracing::info!(movies = recommender.num_movies(), "corpus loaded");

    let state = AppState {
        data_dir: dir,
        recommender: Arc::new(RwLock::new(recommender)),
        poster: PosterClient::from_env(),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/movies", get(movies_handler))
        .route("/recommend", get(recommend_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

fn load_recommender(dir: &PathBuf) -> Result<Recommender> {
    let paths = ArtifactPaths::new(dir);
    let (movies, index, meta) = load_snapshot(&paths)?;
    tracing::info!(version = meta.version, created_at = %meta.created_at, "artifacts read");
    let recommender = Recommender::new(movies, index)?;
    Ok(recommender)
}

async fn ensure_artifacts(dir: &PathBuf) -> Result<()> {
    let paths = ArtifactPaths::new(dir);
    if paths.exist() {
        return Ok(());
    }
    if !ReleaseClient::env_configured() {
        anyhow::bail!(
            "artifacts missing under {} and GITHUB_TOKEN/GITHUB_REPO are not set",
            dir.display()
        );
    }
    let tag = release_tag();
    tracing::info!(%tag, "downloading artifacts from release store");
    let client = ReleaseClient::from_env()?;
    client
        .download_assets(&tag, dir)
        .await
        .with_context(|| format!("fetching artifacts for tag {tag}"))?;
    Ok(())
}

fn release_tag() -> String {
    std::env::var("GITHUB_RELEASE_TAG").unwrap_or_else(|_| "v1.0.0".to_string())
}

pub async fn movies_handler(State(state): State<AppState>) -> Json<Vec<MovieListEntry>> {
    let snapshot = state.recommender.read().clone();
    let list = snapshot
        .movies()
        .iter()
        .map(|m| MovieListEntry { movie_id: m.movie_id, title: m.title.clone() })
        .collect();
    Json(list)
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 20);
    let snapshot = state.recommender.read().clone();

    let recs = snapshot.recommend(&params.title, k).map_err(|e| {
        // Reaching here means the loaded artifacts disagree with each other.
        tracing::error!(%e, title = %params.title, "recommendation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let mut results = Vec::with_capacity(recs.len());
    for rec in recs {
        let poster_url = state.poster.fetch(rec.movie_id).await;
        results.push(RecommendedMovie {
            movie_id: rec.movie_id,
            title: rec.title,
            poster_url,
        });
    }

    Ok(Json(RecommendResponse {
        query: params.title,
        took_s: start.elapsed().as_secs_f64(),
        results,
    }))
}

async fn reload_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;

    if ReleaseClient::env_configured() {
        let tag = release_tag();
        let client = ReleaseClient::from_env()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        client
            .download_assets(&tag, &state.data_dir)
            .await
            .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
    }

    let fresh = load_recommender(&state.data_dir)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let num_movies = fresh.num_movies();
    *state.recommender.write() = Arc::new(fresh);
    tracing::info!(num_movies, "snapshot reloaded");
    Ok(Json(serde_json::json!({ "reloaded": true, "num_movies": num_movies })))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers
        .get("X-ADMIN-TOKEN")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

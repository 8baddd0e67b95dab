use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use reel_core::persist::{
    save_index, save_meta, save_movies, save_vocab, ArtifactPaths, MetaFile,
};
use reel_core::{FlatIndex, MovieMeta, Vocabulary};
use serde_json::Value;
use tower::ServiceExt;

fn build_tiny_artifacts(dir: &std::path::Path) {
    let paths = ArtifactPaths::new(dir);
    let tags = vec![
        "space war".to_string(),
        "space love".to_string(),
        "desert love".to_string(),
    ];
    let vocab = Vocabulary::fit(&tags, 10);
    let index = FlatIndex::build(vocab.transform(&tags), vocab.len()).unwrap();
    let movies = vec![
        MovieMeta { movie_id: 10, title: "A".into() },
        MovieMeta { movie_id: 20, title: "B".into() },
        MovieMeta { movie_id: 30, title: "C".into() },
    ];
    save_movies(&paths, &movies).unwrap();
    save_index(&paths, &index).unwrap();
    save_vocab(&paths, &vocab).unwrap();
    save_meta(
        &paths,
        &MetaFile {
            num_movies: 3,
            dim: vocab.len() as u32,
            created_at: "2026-01-01T00:00:00Z".into(),
            version: 1,
        },
    )
    .unwrap();
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn recommend_returns_nearest_neighbor() {
    let dir = tempfile::tempdir().unwrap();
    build_tiny_artifacts(dir.path());
    let app = reel_server::build_app(dir.path().to_string_lossy().to_string())
        .await
        .unwrap();

    let (status, json) = get(app, "/recommend?title=A&k=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "A");
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "B");
    assert_eq!(results[0]["movie_id"], 20);
    // No metadata API key in the test environment, so no poster.
    assert!(results[0]["poster_url"].is_null());
}

#[tokio::test]
async fn unknown_title_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    build_tiny_artifacts(dir.path());
    let app = reel_server::build_app(dir.path().to_string_lossy().to_string())
        .await
        .unwrap();

    let (status, json) = get(app, "/recommend?title=Nope&k=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn movies_lists_corpus_in_row_order() {
    let dir = tempfile::tempdir().unwrap();
    build_tiny_artifacts(dir.path());
    let app = reel_server::build_app(dir.path().to_string_lossy().to_string())
        .await
        .unwrap();

    let (status, json) = get(app, "/movies").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["A", "B", "C"]);
}

#[tokio::test]
async fn reload_requires_admin_token() {
    let dir = tempfile::tempdir().unwrap();
    build_tiny_artifacts(dir.path());
    let app = reel_server::build_app(dir.path().to_string_lossy().to_string())
        .await
        .unwrap();

    let resp = app
        .oneshot(
            Request::post("/admin/reload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_answers_ok() {
    let dir = tempfile::tempdir().unwrap();
    build_tiny_artifacts(dir.path());
    let app = reel_server::build_app(dir.path().to_string_lossy().to_string())
        .await
        .unwrap();

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

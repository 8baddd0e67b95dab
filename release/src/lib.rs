//! GitHub Releases as a versioned artifact store.
//!
//! The recommender's artifact triple is exchanged under a release tag: a tag
//! either yields the complete asset set or nothing. Uploads replace stale
//! assets of the same name; downloads land in a staging directory and are
//! moved into place only once every asset has arrived.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const API_BASE: &str = "https://api.github.com";
const UPLOADS_BASE: &str = "https://uploads.github.com";
const USER_AGENT: &str = "reel-release/0.1";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    /// API endpoint for the asset; fetched with an octet-stream accept
    /// header, which also works for private repositories.
    pub url: String,
    pub size: u64,
}

/// Summary of a published release: tag, display name, and asset names.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseInfo {
    pub tag: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
    pub assets: Vec<String>,
}

pub struct ReleaseClient {
    http: reqwest::Client,
    repo: String,
    api_base: String,
    uploads_base: String,
}

impl ReleaseClient {
    pub fn new(token: &str, repo: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("GITHUB_TOKEN is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            repo: repo.to_string(),
            api_base: API_BASE.to_string(),
            uploads_base: UPLOADS_BASE.to_string(),
        })
    }

    /// Read `GITHUB_TOKEN` and `GITHUB_REPO` (`owner/name`) from the
    /// environment; both are required.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN")
            .map_err(|_| anyhow!("GITHUB_TOKEN must be set"))?;
        let repo = std::env::var("GITHUB_REPO")
            .map_err(|_| anyhow!("GITHUB_REPO must be set (format: owner/name)"))?;
        Self::new(&token, &repo)
    }

    /// Whether the environment carries the release-store configuration.
    pub fn env_configured() -> bool {
        std::env::var("GITHUB_TOKEN").is_ok() && std::env::var("GITHUB_REPO").is_ok()
    }

    pub async fn release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let url = format!("{}/repos/{}/releases/tags/{tag}", self.api_base, self.repo);
        let resp = self.http.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let release = resp.error_for_status()?.json::<Release>().await?;
        Ok(Some(release))
    }

    pub async fn create_or_get_release(&self, tag: &str) -> Result<Release> {
        if let Some(release) = self.release_by_tag(tag).await? {
            tracing::info!(tag, "found existing release");
            return Ok(release);
        }
        tracing::info!(tag, "creating release");
        let url = format!("{}/repos/{}/releases", self.api_base, self.repo);
        let body = serde_json::json!({
            "tag_name": tag,
            "name": format!("Model artifacts {tag}"),
            "body": "Movie recommender artifacts",
            "draft": false,
            "prerelease": false,
        });
        let release = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("creating release {tag}"))?
            .json::<Release>()
            .await?;
        Ok(release)
    }

    /// Upload every file under `tag`, replacing assets of the same name.
    pub async fn publish(&self, tag: &str, files: &[&Path]) -> Result<()> {
        let release = self.create_or_get_release(tag).await?;
        for path in files {
            self.upload_asset(&release, path).await?;
        }
        Ok(())
    }

    async fn upload_asset(&self, release: &Release, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("asset path has no file name: {}", path.display()))?;
        if let Some(stale) = release.assets.iter().find(|a| a.name == name) {
            tracing::info!(name, "deleting stale asset");
            let url = format!("{}/repos/{}/releases/assets/{}", self.api_base, self.repo, stale.id);
            self.http.delete(&url).send().await?.error_for_status()?;
        }

        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let size = bytes.len();
        let url = self.upload_url(release.id, name);
        self.http
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("uploading {name}"))?;
        tracing::info!(name, size, "asset uploaded");
        Ok(())
    }

    /// Download every asset of `tag` into `dest`. Assets are staged in a
    /// scratch directory first so `dest` only ever sees the complete set.
    pub async fn download_assets(&self, tag: &str, dest: &Path) -> Result<Vec<String>> {
        let release = self
            .release_by_tag(tag)
            .await?
            .ok_or_else(|| anyhow!("release {tag} not found in {}", self.repo))?;
        if release.assets.is_empty() {
            bail!("release {tag} has no assets");
        }

        fs::create_dir_all(dest)?;
        let staging = dest.join(format!(".fetch-{tag}"));
        fs::create_dir_all(&staging)?;

        let result = self.download_into(&release, &staging).await;
        let names = match result {
            Ok(names) => names,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };
        for name in &names {
            fs::rename(staging.join(name), dest.join(name))?;
        }
        let _ = fs::remove_dir_all(&staging);
        tracing::info!(tag, assets = names.len(), "artifacts downloaded");
        Ok(names)
    }

    async fn download_into(&self, release: &Release, dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(release.assets.len());
        for asset in &release.assets {
            tracing::info!(name = %asset.name, size = asset.size, "downloading asset");
            let bytes = self
                .http
                .get(&asset.url)
                .header(ACCEPT, "application/octet-stream")
                .send()
                .await?
                .error_for_status()
                .with_context(|| format!("downloading {}", asset.name))?
                .bytes()
                .await?;
            fs::write(dir.join(&asset.name), &bytes)?;
            names.push(asset.name.clone());
        }
        Ok(names)
    }

    /// Summarize a release, or `None` when the tag does not exist.
    pub async fn release_info(&self, tag: &str) -> Result<Option<ReleaseInfo>> {
        let Some(release) = self.release_by_tag(tag).await? else {
            return Ok(None);
        };
        Ok(Some(ReleaseInfo {
            tag: release.tag_name,
            name: release.name,
            created_at: release.created_at,
            assets: release.assets.into_iter().map(|a| a.name).collect(),
        }))
    }

    fn upload_url(&self, release_id: u64, name: &str) -> String {
        format!(
            "{}/repos/{}/releases/{release_id}/assets?name={name}",
            self.uploads_base, self.repo
        )
    }
}

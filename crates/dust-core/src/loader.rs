//! Retrieval of the per-dataset JSON documents.
//!
//! Every resource lives at `{dataset}/{resource}.json` under a source root.
//! Failures surface as they happen; retrying is left to the caller.

use std::future::Future;
use std::path::PathBuf;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{GuideError, Result};
use crate::model::{Art, Camp, Event, Pin, RawDataset};

pub const EVENTS_RESOURCE: &str = "events";
pub const CAMPS_RESOURCE: &str = "camps";
pub const ART_RESOURCE: &str = "art";
pub const POINTS_RESOURCE: &str = "potties";

/// Somewhere dataset documents can be read from.
pub trait DatasetSource: Send + Sync + 'static {
    /// Raw body of `{dataset}/{resource}.json`.
    fn fetch(&self, dataset: &str, resource: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Documents served over HTTP below `base_url`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("dust-guide/0.1")
            .build()
            .map_err(|err| GuideError::fetch("http client", err))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn resource_url(&self, dataset: &str, resource: &str) -> String {
        format!(
            "{}/{}/{}.json",
            self.base_url,
            urlencoding::encode(dataset),
            resource
        )
    }
}

impl DatasetSource for HttpSource {
    fn fetch(&self, dataset: &str, resource: &str) -> impl Future<Output = Result<String>> + Send {
        let url = self.resource_url(dataset, resource);
        let request = self.client.get(url.clone());
        async move {
            debug!(%url, "Fetching dataset resource");
            let response = request
                .send()
                .await
                .map_err(|err| GuideError::fetch(&url, err))?;
            if !response.status().is_success() {
                return Err(GuideError::fetch(
                    &url,
                    format!("server responded with {}", response.status()),
                ));
            }
            response.text().await.map_err(|err| GuideError::fetch(&url, err))
        }
    }
}

/// Documents stored on disk below `root`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resource_path(&self, dataset: &str, resource: &str) -> PathBuf {
        self.root.join(dataset).join(format!("{resource}.json"))
    }
}

impl DatasetSource for DirectorySource {
    fn fetch(&self, dataset: &str, resource: &str) -> impl Future<Output = Result<String>> + Send {
        let path = self.resource_path(dataset, resource);
        async move {
            debug!(path = %path.display(), "Reading dataset resource");
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| GuideError::fetch(path.display().to_string(), err))
        }
    }
}

async fn fetch_json<S, T>(source: &S, dataset: &str, resource: &str) -> Result<T>
where
    S: DatasetSource,
    T: DeserializeOwned,
{
    let body = source.fetch(dataset, resource).await?;
    serde_json::from_str(&body).map_err(|source| GuideError::Parse {
        resource: format!("{dataset}/{resource}.json"),
        source,
    })
}

/// Load events, camps and art for `dataset`.
pub async fn load_dataset<S: DatasetSource>(source: &S, dataset: &str) -> Result<RawDataset> {
    let events: Vec<Event> = fetch_json(source, dataset, EVENTS_RESOURCE).await?;
    let camps: Vec<Camp> = fetch_json(source, dataset, CAMPS_RESOURCE).await?;
    let art: Vec<Art> = fetch_json(source, dataset, ART_RESOURCE).await?;
    Ok(RawDataset { events, camps, art })
}

/// Load the auxiliary map points for `dataset`.
pub async fn load_points<S: DatasetSource>(source: &S, dataset: &str) -> Result<Vec<Pin>> {
    fetch_json(source, dataset, POINTS_RESOURCE).await
}

// crates/containership/src/transport.rs
// Analysis service transport: trait seam plus the reqwest implementation

use crate::config::Settings;
use crate::error::{ContainershipError, Result};
use crate::http::create_shared_client;
use crate::ingest::Upload;
use async_trait::async_trait;
use containership_types::BatchAnalysis;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, warn};

/// Raw response body chunks, in arrival order
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// Everything the ingestion engine needs from the analysis service.
///
/// Dropping a returned [`ChunkStream`] must release the underlying
/// connection; cancellation relies on it.
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// Open the combined `data: <json>` stream for an upload
    async fn open_stream(&self, upload: &Upload) -> Result<ChunkStream>;

    /// One-shot analysis of an upload
    async fn fetch_batch(&self, upload: &Upload) -> Result<BatchAnalysis>;

    /// Open the raw text stream for a single clause
    async fn open_item(&self, index: usize, content: &str) -> Result<ChunkStream>;
}

/// [`AnalysisTransport`] over HTTP
pub struct HttpTransport {
    client: Client,
    settings: Settings,
}

impl HttpTransport {
    pub fn new(settings: Settings) -> Self {
        let client = create_shared_client(settings.request_timeout, settings.connect_timeout);
        Self { client, settings }
    }

    /// Reuse an existing reqwest::Client
    pub fn with_client(client: Client, settings: Settings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn upload_form(upload: &Upload) -> Form {
        let part = Part::bytes(upload.contents().to_vec()).file_name(upload.name().to_string());
        Form::new().part("file", part)
    }
}

/// Turn a non-success status into a transport error, keeping the body for context
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "Analysis service returned an error status");
    Err(ContainershipError::Transport {
        status: status.as_u16(),
        body,
    })
}

fn into_chunks(response: Response) -> ChunkStream {
    response
        .bytes_stream()
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ContainershipError::from))
        .boxed()
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn open_stream(&self, upload: &Upload) -> Result<ChunkStream> {
        let url = self.settings.stream_url()?;
        debug!(url = %url, file = upload.name(), "Opening analysis stream");

        let response = self
            .client
            .post(url)
            .header("Accept", "text/event-stream")
            .multipart(Self::upload_form(upload))
            .send()
            .await?;

        Ok(into_chunks(check_status(response).await?))
    }

    async fn fetch_batch(&self, upload: &Upload) -> Result<BatchAnalysis> {
        let url = self.settings.batch_url()?;
        debug!(url = %url, file = upload.name(), "Requesting batch analysis");

        let response = self
            .client
            .post(url)
            .multipart(Self::upload_form(upload))
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn open_item(&self, index: usize, content: &str) -> Result<ChunkStream> {
        let url = self.settings.item_url()?;
        debug!(url = %url, index, "Opening clause stream");

        let response = self.client.post(url).json(content).send().await?;

        Ok(into_chunks(check_status(response).await?))
    }
}

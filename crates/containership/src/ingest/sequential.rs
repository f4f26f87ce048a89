// crates/containership/src/ingest/sequential.rs
// Sequential per-clause recommendation streaming

use super::SharedDocument;
use crate::document::DocumentModel;
use crate::error::{ContainershipError, Result};
use crate::stream::Utf8Decoder;
use crate::transport::AnalysisTransport;
use futures::StreamExt;
use tokio::sync::RwLockWriteGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Stored in place of a recommendation whose request failed
pub const ITEM_ERROR_PLACEHOLDER: &str = "Error loading recommendation for this clause.";

/// Result of one sequential pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequentialReport {
    /// Items attempted
    pub items: usize,
    /// Indices whose request failed, ascending
    pub failed: Vec<usize>,
}

/// Streams a recommendation for every clause of a document, one request at
/// a time and strictly in index order.
///
/// Each item's text accumulates into its clause as chunks arrive. A failed
/// item gets [`ITEM_ERROR_PLACEHOLDER`] and the pass moves on; only
/// cancellation stops it early, and nothing is written after it.
pub struct SequentialStreamer<'a> {
    transport: &'a dyn AnalysisTransport,
    document: SharedDocument,
    token: CancellationToken,
}

impl<'a> SequentialStreamer<'a> {
    pub fn new(transport: &'a dyn AnalysisTransport, document: SharedDocument, token: CancellationToken) -> Self {
        Self {
            transport,
            document,
            token,
        }
    }

    pub async fn run(&self) -> Result<SequentialReport> {
        let contents: Vec<String> = {
            let model = self.document.read().await;
            model.clauses().iter().map(|c| c.content.clone()).collect()
        };

        let mut report = SequentialReport {
            items: contents.len(),
            failed: Vec::new(),
        };
        info!(items = contents.len(), "Starting sequential recommendations");

        for (index, content) in contents.iter().enumerate() {
            if self.token.is_cancelled() {
                return Err(ContainershipError::Cancelled);
            }
            self.model().await?.begin_item(index);

            match self.stream_item(index, content).await {
                Ok(()) => debug!(index, "Item finished"),
                Err(ContainershipError::Cancelled) => return Err(ContainershipError::Cancelled),
                Err(e) => {
                    warn!(index, error = %e, "Item failed");
                    self.model().await?.set_item_text(index, ITEM_ERROR_PLACEHOLDER);
                    report.failed.push(index);
                }
            }
        }

        self.model().await?.finish_items();
        info!(
            items = report.items,
            failed = report.failed.len(),
            "Sequential recommendations finished"
        );
        Ok(report)
    }

    async fn stream_item(&self, index: usize, content: &str) -> Result<()> {
        let opened = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(ContainershipError::Cancelled),
            opened = self.transport.open_item(index, content) => opened,
        };
        let mut chunks = opened.map_err(|e| item_error(index, e))?;
        let mut decoder = Utf8Decoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return Err(ContainershipError::Cancelled),
                next = chunks.next() => next,
            };
            match next {
                Some(Ok(bytes)) => {
                    let text = decoder.decode(&bytes);
                    self.append(index, &text).await?;
                }
                Some(Err(e)) => return Err(item_error(index, e)),
                None => break,
            }
        }

        let tail = decoder.finish();
        self.append(index, &tail).await
    }

    async fn append(&self, index: usize, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.model().await?.append_item_text(index, text);
        Ok(())
    }

    /// Write access to the document, refused once the pass is cancelled
    async fn model(&self) -> Result<RwLockWriteGuard<'_, DocumentModel>> {
        let model = self.document.write().await;
        if self.token.is_cancelled() {
            return Err(ContainershipError::Cancelled);
        }
        Ok(model)
    }
}

fn item_error(index: usize, error: ContainershipError) -> ContainershipError {
    match error {
        ContainershipError::Cancelled => ContainershipError::Cancelled,
        other => ContainershipError::PerItem {
            index,
            reason: other.to_string(),
        },
    }
}

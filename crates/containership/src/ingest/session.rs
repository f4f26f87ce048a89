// crates/containership/src/ingest/session.rs
// Analysis sessions: one document model per ingestion, replaced on each new run

use super::sequential::{SequentialReport, SequentialStreamer};
use super::upload::Upload;
use super::SharedDocument;
use crate::document::segment::segment_clauses;
use crate::document::{DocumentModel, Progress};
use crate::error::{ContainershipError, Result};
use crate::stream::{DispatchReport, Dispatcher, StreamOutcome};
use crate::transport::{AnalysisTransport, ChunkStream};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Which service flow produced the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Combined `data: <json>` message stream
    Stream,
    /// One-shot request, whole result at once
    Batch,
    /// Local segmentation, then one recommendation stream per clause
    Sequential,
}

impl std::fmt::Display for IngestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestMode::Stream => write!(f, "stream"),
            IngestMode::Batch => write!(f, "batch"),
            IngestMode::Sequential => write!(f, "sequential"),
        }
    }
}

/// Summary of a finished ingestion
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub session_id: Uuid,
    pub mode: IngestMode,
    pub progress: Progress,
    /// Frame diagnostics; empty outside stream mode
    pub dispatch: DispatchReport,
    /// Per-item results; only set in sequential mode
    pub items: Option<SequentialReport>,
}

#[derive(Clone)]
struct Session {
    id: Uuid,
    document: SharedDocument,
    token: CancellationToken,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            document: Arc::new(RwLock::new(DocumentModel::new())),
            token: CancellationToken::new(),
        }
    }
}

/// Drives ingestions against an [`AnalysisTransport`].
///
/// Every `analyze_*` call validates its upload first, then cancels whatever
/// ingestion is still running and installs a fresh document. Updates from a
/// superseded run never reach the new document.
///
/// Only one run writes at a time: a new run cancels the previous one and
/// waits for it to unwind before touching any document.
pub struct Analyzer {
    transport: Arc<dyn AnalysisTransport>,
    expected_name: String,
    current: Mutex<Session>,
    /// Held for the whole of each run
    running: Mutex<()>,
}

impl Analyzer {
    pub fn new(transport: Arc<dyn AnalysisTransport>, expected_name: impl Into<String>) -> Self {
        Self {
            transport,
            expected_name: expected_name.into(),
            current: Mutex::new(Session::new()),
            running: Mutex::new(()),
        }
    }

    /// The document of the current session
    pub async fn document(&self) -> SharedDocument {
        self.current.lock().await.document.clone()
    }

    pub async fn session_id(&self) -> Uuid {
        self.current.lock().await.id
    }

    /// Abort the running ingestion, if any. The document keeps what it has.
    pub async fn cancel(&self) {
        let session = self.current.lock().await;
        if !session.token.is_cancelled() {
            info!(session = %session.id, "Cancelling ingestion");
            session.token.cancel();
        }
    }

    /// Cancel the previous session and start a new one
    async fn begin(&self, mode: IngestMode) -> Session {
        let mut current = self.current.lock().await;
        current.token.cancel();
        let previous = current.id;
        *current = Session::new();
        info!(session = %current.id, previous = %previous, mode = %mode, "Starting analysis session");
        current.clone()
    }

    /// Ingest through the combined message stream
    pub async fn analyze_stream(&self, upload: &Upload) -> Result<IngestReport> {
        upload.validate(&self.expected_name)?;
        let session = self.begin(IngestMode::Stream).await;
        let _run = self.running.lock().await;

        let opened = tokio::select! {
            biased;
            _ = session.token.cancelled() => return Err(ContainershipError::Cancelled),
            opened = self.transport.open_stream(upload) => opened,
        };
        let chunks = match opened {
            Ok(chunks) => chunks,
            Err(e) => {
                session.document.write().await.fail(e.to_string());
                return Err(e);
            }
        };

        let dispatch = ingest_stream(chunks, &session.document, &session.token).await?;
        self.report(&session, IngestMode::Stream, dispatch, None).await
    }

    /// Ingest through the one-shot endpoint
    pub async fn analyze_batch(&self, upload: &Upload) -> Result<IngestReport> {
        upload.validate(&self.expected_name)?;
        let session = self.begin(IngestMode::Batch).await;
        let _run = self.running.lock().await;

        let fetched = tokio::select! {
            biased;
            _ = session.token.cancelled() => return Err(ContainershipError::Cancelled),
            fetched = self.transport.fetch_batch(upload) => fetched,
        };

        let mut model = session.document.write().await;
        match fetched {
            Ok(batch) => {
                info!(clauses = batch.clauses.len(), "Batch analysis received");
                model.apply_batch(batch);
                model.complete();
            }
            Err(e) => {
                model.fail(e.to_string());
                return Err(e);
            }
        }
        drop(model);

        self.report(&session, IngestMode::Batch, DispatchReport::default(), None)
            .await
    }

    /// Segment the upload locally, then stream a recommendation per clause
    pub async fn analyze_sequential(&self, upload: &Upload) -> Result<IngestReport> {
        upload.validate(&self.expected_name)?;
        let text = upload.text().into_owned();
        let clauses = segment_clauses(&text)?;
        let session = self.begin(IngestMode::Sequential).await;
        let _run = self.running.lock().await;

        {
            let mut model = session.document.write().await;
            if session.token.is_cancelled() {
                return Err(ContainershipError::Cancelled);
            }
            model.apply_original(text);
            model.apply_structure(clauses);
        }

        let items = SequentialStreamer::new(self.transport.as_ref(), session.document.clone(), session.token.clone())
            .run()
            .await?;
        session.document.write().await.complete();

        self.report(&session, IngestMode::Sequential, DispatchReport::default(), Some(items))
            .await
    }

    /// Re-run per-clause streaming over the current document's clauses.
    ///
    /// Keeps the document but cancels whatever is still running on it, and
    /// gives this pass a token of its own.
    pub async fn stream_items(&self) -> Result<SequentialReport> {
        let session = {
            let mut current = self.current.lock().await;
            current.token.cancel();
            current.token = CancellationToken::new();
            info!(session = %current.id, "Starting per-clause pass");
            current.clone()
        };
        let _run = self.running.lock().await;

        SequentialStreamer::new(self.transport.as_ref(), session.document, session.token)
            .run()
            .await
    }

    async fn report(
        &self,
        session: &Session,
        mode: IngestMode,
        dispatch: DispatchReport,
        items: Option<SequentialReport>,
    ) -> Result<IngestReport> {
        let progress = session.document.read().await.progress().clone();
        if let Progress::Failed(reason) = &progress {
            return Err(ContainershipError::StreamFailed(reason.clone()));
        }
        info!(session = %session.id, mode = %mode, progress = %progress, "Analysis session finished");
        Ok(IngestReport {
            session_id: session.id,
            mode,
            progress,
            dispatch,
            items,
        })
    }
}

/// Drain a combined message stream into `document`.
///
/// All frames completed by one chunk are applied under a single write lock.
/// Cancellation drops the stream (closing the connection) and leaves the
/// document as it was. A transport error, a service-reported error, or an
/// end of stream before the terminal message marks the document failed.
pub async fn ingest_stream(
    mut chunks: ChunkStream,
    document: &SharedDocument,
    token: &CancellationToken,
) -> Result<DispatchReport> {
    let mut dispatcher = Dispatcher::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Stream cancelled, dropping connection");
                return Err(ContainershipError::Cancelled);
            }
            next = chunks.next() => next,
        };

        match next {
            Some(Ok(bytes)) => {
                let mut model = document.write().await;
                if token.is_cancelled() {
                    return Err(ContainershipError::Cancelled);
                }
                dispatcher.feed(&mut model, &bytes);
            }
            Some(Err(e)) => {
                warn!(error = %e, "Stream transport failed");
                document.write().await.fail(e.to_string());
                return Err(e);
            }
            None => break,
        }
    }

    dispatcher.finish();
    match dispatcher.outcome() {
        Some(StreamOutcome::Complete) => {}
        Some(StreamOutcome::Failed(reason)) => {
            return Err(ContainershipError::StreamFailed(reason.clone()));
        }
        None => {
            let reason = "stream ended before completion";
            warn!(frames = dispatcher.report().frames, "{}", reason);
            document.write().await.fail(reason);
            return Err(ContainershipError::StreamFailed(reason.to_string()));
        }
    }

    let report = dispatcher.into_report();
    debug!(
        frames = report.frames,
        applied = report.applied,
        skipped = report.skipped_total,
        ignored = report.ignored,
        "Stream drained"
    );
    Ok(report)
}

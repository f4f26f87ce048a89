// crates/containership/src/ingest/mod.rs
// Ingestion flows: upload checks, sessions, sequential item streaming

pub mod sequential;
pub mod session;
pub mod upload;

pub use sequential::{SequentialReport, SequentialStreamer, ITEM_ERROR_PLACEHOLDER};
pub use session::{ingest_stream, Analyzer, IngestMode, IngestReport};
pub use upload::Upload;

use crate::document::DocumentModel;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A document shared between an ingestion task and its readers
pub type SharedDocument = Arc<RwLock<DocumentModel>>;

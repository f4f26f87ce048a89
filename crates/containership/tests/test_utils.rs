//! Test utilities for ContainerShip integration tests

use async_trait::async_trait;
use containership::ingest::Upload;
use containership::transport::{AnalysisTransport, ChunkStream};
use containership::{ContainershipError, Result};
use containership_types::BatchAnalysis;
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted response body
#[derive(Clone)]
pub enum Script {
    /// Chunks delivered in order, then end of body
    Chunks(Vec<Vec<u8>>),
    /// Chunks delivered in order, then the body never ends
    Hang(Vec<Vec<u8>>),
    /// Request rejected with this HTTP status
    Status(u16),
    /// Chunks, then a mid-body network failure
    Broken(Vec<Vec<u8>>),
}

impl Script {
    pub fn frames(frames: &[&str]) -> Self {
        Script::Chunks(frames.iter().map(|f| format!("{}\n", f).into_bytes()).collect())
    }

    pub fn text(chunks: &[&str]) -> Self {
        Script::Chunks(chunks.iter().map(|c| c.as_bytes().to_vec()).collect())
    }

    fn open(&self) -> Result<ChunkStream> {
        let ok = |chunks: &Vec<Vec<u8>>| chunks.iter().cloned().map(Ok).collect::<Vec<Result<Vec<u8>>>>();
        match self {
            Script::Chunks(chunks) => Ok(stream::iter(ok(chunks)).boxed()),
            Script::Hang(chunks) => Ok(stream::iter(ok(chunks)).chain(stream::pending()).boxed()),
            Script::Status(status) => Err(ContainershipError::Transport {
                status: *status,
                body: "scripted failure".into(),
            }),
            Script::Broken(chunks) => {
                let mut items = ok(chunks);
                items.push(Err(ContainershipError::StreamFailed("connection reset".into())));
                Ok(stream::iter(items).boxed())
            }
        }
    }
}

/// In-memory [`AnalysisTransport`] driven by canned responses
pub struct ScriptedTransport {
    streams: Mutex<Vec<Script>>,
    batch: Option<BatchAnalysis>,
    items: Vec<Script>,
    requests: AtomicUsize,
    item_payloads: Mutex<Vec<String>>,
    live_items: Arc<AtomicUsize>,
    peak_live_items: Arc<AtomicUsize>,
}

/// Counts a per-item body as live until its stream is dropped
struct LiveItem(Arc<AtomicUsize>);

impl Drop for LiveItem {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(Vec::new()),
            batch: None,
            items: Vec::new(),
            requests: AtomicUsize::new(0),
            item_payloads: Mutex::new(Vec::new()),
            live_items: Arc::new(AtomicUsize::new(0)),
            peak_live_items: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a combined-stream response; calls consume them in order
    pub fn with_stream(self, script: Script) -> Self {
        self.streams.lock().unwrap().push(script);
        self
    }

    pub fn with_batch(mut self, batch: BatchAnalysis) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Per-item responses, indexed by clause
    pub fn with_items(mut self, items: Vec<Script>) -> Self {
        self.items = items;
        self
    }

    /// Total requests issued, of any kind
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Payloads sent to the per-item endpoint, in order
    pub fn item_payloads(&self) -> Vec<String> {
        self.item_payloads.lock().unwrap().clone()
    }

    /// Per-item bodies currently open
    pub fn live_items(&self) -> usize {
        self.live_items.load(Ordering::SeqCst)
    }

    /// Most per-item bodies ever open at once
    pub fn peak_live_items(&self) -> usize {
        self.peak_live_items.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisTransport for ScriptedTransport {
    async fn open_stream(&self, _upload: &Upload) -> Result<ChunkStream> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut streams = self.streams.lock().unwrap();
        if streams.is_empty() {
            return Err(ContainershipError::Transport {
                status: 404,
                body: "no scripted stream".into(),
            });
        }
        streams.remove(0).open()
    }

    async fn fetch_batch(&self, _upload: &Upload) -> Result<BatchAnalysis> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.batch.clone().ok_or(ContainershipError::Transport {
            status: 500,
            body: "no scripted batch".into(),
        })
    }

    async fn open_item(&self, index: usize, content: &str) -> Result<ChunkStream> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.item_payloads.lock().unwrap().push(content.to_string());
        match self.items.get(index) {
            Some(script) => {
                let chunks = script.open()?;
                let live = self.live_items.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_live_items.fetch_max(live, Ordering::SeqCst);
                let guard = LiveItem(self.live_items.clone());
                Ok(chunks
                    .map(move |chunk| {
                        let _live = &guard;
                        chunk
                    })
                    .boxed())
            }
            None => Err(ContainershipError::Transport {
                status: 404,
                body: format!("no scripted item {}", index),
            }),
        }
    }
}

pub fn dockerfile(contents: &str) -> Upload {
    Upload::new("Dockerfile", contents.as_bytes().to_vec())
}

/// Frames of a complete two-clause analysis
pub fn two_clause_frames() -> Vec<&'static str> {
    vec![
        r#"data: {"type":"original_dockerfile","data":"FROM a\nRUN b\n"}"#,
        r#"data: {"type":"clause_structure","data":[{"lineNumbers":[1],"content":"FROM a"},{"lineNumbers":[2],"content":"RUN b"}]}"#,
        r#"data: {"type":"clause_update","data":{"index":0,"total":2,"clause":{"lineNumbers":[1],"content":"FROM a","recommendation":"use a pinned tag"}}}"#,
        r#"data: {"type":"clause_update","data":{"index":1,"total":2,"clause":{"lineNumbers":[2],"content":"RUN b","recommendation":"combine RUN steps"}}}"#,
        r#"data: {"type":"optimized_dockerfile","data":"FROM a:1.0\nRUN b\n"}"#,
        r#"data: {"type":"complete"}"#,
    ]
}

/// Frames of a two-clause analysis that stops after the structure
pub fn structure_only_frames() -> Vec<&'static str> {
    vec![
        r#"data: {"type":"original_dockerfile","data":"FROM a\nRUN b\n"}"#,
        r#"data: {"type":"clause_structure","data":[{"lineNumbers":[1],"content":"FROM a"},{"lineNumbers":[2],"content":"RUN b"}]}"#,
        r#"data: {"type":"complete"}"#,
    ]
}

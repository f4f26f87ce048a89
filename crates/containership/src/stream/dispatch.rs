// crates/containership/src/stream/dispatch.rs
// Typed message dispatch from stream frames into the document model

use super::frame::FrameDecoder;
use crate::document::DocumentModel;
use crate::error::{ContainershipError, Result};
use containership_types::{AnalysisEvent, Envelope};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// How the combined stream ended, once a terminal message arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Complete,
    Failed(String),
}

/// A frame that was decoded but not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFrame {
    /// 1-based position among payload-carrying frames
    pub frame: usize,
    pub reason: String,
}

/// Skipped frames kept in a report; later ones are only counted
pub const MAX_SKIPPED_RECORDED: usize = 64;

/// Per-stream dispatch diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Payload-carrying frames seen
    pub frames: usize,
    pub applied: usize,
    /// The first [`MAX_SKIPPED_RECORDED`] skipped frames
    pub skipped: Vec<SkippedFrame>,
    /// Every skipped frame, recorded or not
    pub skipped_total: usize,
    /// Frames that arrived after the terminal message
    pub ignored: usize,
}

/// Parse one frame payload into a typed message.
///
/// Malformed JSON or a payload of the wrong shape is a `FrameParse` error;
/// an unrecognized `type` is a `Protocol` error.
pub fn decode_event(payload: &str) -> Result<AnalysisEvent> {
    let envelope: Envelope =
        serde_json::from_str(payload).map_err(|e| ContainershipError::FrameParse(e.to_string()))?;

    let kind = envelope.kind.as_str();
    let event = match kind {
        AnalysisEvent::ORIGINAL => AnalysisEvent::OriginalDockerfile(data(kind, envelope.data)?),
        AnalysisEvent::STRUCTURE => AnalysisEvent::ClauseStructure(data(kind, envelope.data)?),
        AnalysisEvent::UPDATE => AnalysisEvent::ClauseUpdate(data(kind, envelope.data)?),
        AnalysisEvent::OPTIMIZED => AnalysisEvent::OptimizedDockerfile(data(kind, envelope.data)?),
        AnalysisEvent::ERROR => AnalysisEvent::Error(error_reason(envelope.data)),
        AnalysisEvent::COMPLETE => AnalysisEvent::Complete,
        other => {
            return Err(ContainershipError::Protocol(format!(
                "unknown message type '{}'",
                other
            )));
        }
    };
    Ok(event)
}

fn data<T: DeserializeOwned>(kind: &str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ContainershipError::FrameParse(format!("{} payload: {}", kind, e)))
}

fn error_reason(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(reason) => reason,
        serde_json::Value::Null => "analysis failed".to_string(),
        other => other.to_string(),
    }
}

/// Decodes frames and applies them to a [`DocumentModel`].
///
/// Bad frames are recorded and skipped; they never stop the loop. After a
/// terminal message (`complete` or `error`) later frames are still decoded
/// but only counted.
#[derive(Debug, Default)]
pub struct Dispatcher {
    frames: FrameDecoder,
    report: DispatchReport,
    outcome: Option<StreamOutcome>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk, applying every frame it completes
    pub fn feed(&mut self, model: &mut DocumentModel, chunk: &[u8]) {
        for frame in self.frames.push_bytes(chunk) {
            self.dispatch_frame(model, &frame);
        }
    }

    pub fn feed_str(&mut self, model: &mut DocumentModel, text: &str) {
        for frame in self.frames.push_str(text) {
            self.dispatch_frame(model, &frame);
        }
    }

    /// Handle one complete frame line
    pub fn dispatch_frame(&mut self, model: &mut DocumentModel, frame: &str) {
        let Some(payload) = self.frames.payload(frame) else {
            return;
        };
        if payload.trim().is_empty() {
            return;
        }
        self.report.frames += 1;
        let position = self.report.frames;

        if self.outcome.is_some() {
            debug!(frame = position, "Ignoring frame after terminal message");
            self.report.ignored += 1;
            return;
        }

        let result = decode_event(payload).and_then(|event| self.apply(model, event));
        match result {
            Ok(()) => self.report.applied += 1,
            Err(e) => {
                warn!(frame = position, error = %e, "Skipping frame");
                self.report.skipped_total += 1;
                if self.report.skipped.len() < MAX_SKIPPED_RECORDED {
                    self.report.skipped.push(SkippedFrame {
                        frame: position,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Apply a typed message to the model
    pub fn apply(&mut self, model: &mut DocumentModel, event: AnalysisEvent) -> Result<()> {
        debug!(kind = event.kind(), "Applying message");
        match event {
            AnalysisEvent::OriginalDockerfile(text) => model.apply_original(text),
            AnalysisEvent::ClauseStructure(clauses) => {
                info!(clauses = clauses.len(), "Clause structure received");
                model.apply_structure(clauses);
            }
            AnalysisEvent::ClauseUpdate(update) => {
                let len = model.clauses().len();
                if let Some(total) = update.total.filter(|&t| t != len) {
                    debug!(total, known = len, "Clause update total differs from structure");
                }
                if !model.apply_clause_update(update.index, update.clause) {
                    return Err(ContainershipError::Protocol(format!(
                        "clause_update index {} outside structure of {} clauses",
                        update.index, len
                    )));
                }
            }
            AnalysisEvent::OptimizedDockerfile(text) => model.apply_optimized(text),
            AnalysisEvent::Error(reason) => {
                warn!(reason = %reason, "Analysis service reported an error");
                model.fail(reason.clone());
                self.outcome = Some(StreamOutcome::Failed(reason));
            }
            AnalysisEvent::Complete => {
                model.complete();
                self.outcome = Some(StreamOutcome::Complete);
            }
        }
        Ok(())
    }

    /// End of stream; drops any partial frame
    pub fn finish(&mut self) {
        self.frames.finish();
    }

    pub fn outcome(&self) -> Option<&StreamOutcome> {
        self.outcome.as_ref()
    }

    pub fn report(&self) -> &DispatchReport {
        &self.report
    }

    pub fn into_report(self) -> DispatchReport {
        self.report
    }
}

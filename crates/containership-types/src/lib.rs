// crates/containership-types/src/lib.rs
// Shared types for ContainerShip (wire messages and clause model)
// No async or native-only dependencies allowed here

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recommendation text a clause carries until its analysis arrives
pub const PLACEHOLDER_RECOMMENDATION: &str = "Here are some recommendations for this clause.";

// ═══════════════════════════════════════
// DOMAIN TYPES
// ═══════════════════════════════════════

/// One logical instruction block of a Dockerfile.
///
/// `line_numbers` is strictly increasing and 1-based. Distinct clauses of one
/// document never share a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    #[serde(alias = "lineNumbers")]
    pub line_numbers: Vec<u32>,
    #[serde(default)]
    pub lines: BTreeMap<u32, String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "recommendations", alias = "recommendation")]
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
}

impl Clause {
    /// Build a clause from `(line_number, text)` pairs in document order
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let mut clause = Clause::default();
        let mut texts = Vec::new();
        for (number, text) in lines {
            let text = text.into();
            clause.line_numbers.push(number);
            texts.push(text.clone());
            clause.lines.insert(number, text);
        }
        clause.content = texts.join("\n");
        clause.recommendation = PLACEHOLDER_RECOMMENDATION.to_string();
        clause
    }

    pub fn first_line(&self) -> Option<u32> {
        self.line_numbers.first().copied()
    }

    pub fn last_line(&self) -> Option<u32> {
        self.line_numbers.last().copied()
    }

    /// True while the recommendation is still empty or the placeholder
    pub fn is_placeholder(&self) -> bool {
        self.recommendation.is_empty() || self.recommendation == PLACEHOLDER_RECOMMENDATION
    }
}

/// Payload of a `clause_update` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseUpdate {
    pub index: usize,
    #[serde(default)]
    pub total: Option<usize>,
    pub clause: Clause,
}

/// One-shot (non-streaming) analysis response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    #[serde(alias = "originalText", alias = "raw_file_contents")]
    pub original_dockerfile: String,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    #[serde(default, alias = "optimizedText", skip_serializing_if = "Option::is_none")]
    pub optimized_dockerfile: Option<String>,
}

// ═══════════════════════════════════════
// STREAM MESSAGES
// ═══════════════════════════════════════

/// Raw `{type, data}` envelope carried by every stream frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Typed message of the combined analysis stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AnalysisEvent {
    OriginalDockerfile(String),
    ClauseStructure(Vec<Clause>),
    ClauseUpdate(ClauseUpdate),
    OptimizedDockerfile(String),
    Error(String),
    Complete,
}

impl AnalysisEvent {
    pub const ORIGINAL: &'static str = "original_dockerfile";
    pub const STRUCTURE: &'static str = "clause_structure";
    pub const UPDATE: &'static str = "clause_update";
    pub const OPTIMIZED: &'static str = "optimized_dockerfile";
    pub const ERROR: &'static str = "error";
    pub const COMPLETE: &'static str = "complete";

    /// Wire name of this message's `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisEvent::OriginalDockerfile(_) => Self::ORIGINAL,
            AnalysisEvent::ClauseStructure(_) => Self::STRUCTURE,
            AnalysisEvent::ClauseUpdate(_) => Self::UPDATE,
            AnalysisEvent::OptimizedDockerfile(_) => Self::OPTIMIZED,
            AnalysisEvent::Error(_) => Self::ERROR,
            AnalysisEvent::Complete => Self::COMPLETE,
        }
    }

    /// True for messages that close the logical sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisEvent::Error(_) | AnalysisEvent::Complete)
    }

    /// Encode as one newline-terminated `data: <json>` line
    pub fn to_frame(&self) -> serde_json::Result<String> {
        Ok(format!("data: {}\n", serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_accepts_both_field_spellings() {
        let snake: Clause = serde_json::from_str(
            r#"{"line_numbers":[2,3],"content":"RUN a \\\n  b","recommendations":"split it"}"#,
        )
        .unwrap();
        let camel: Clause =
            serde_json::from_str(r#"{"lineNumbers":[2,3],"content":"RUN a \\\n  b","recommendation":"split it"}"#)
                .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.recommendation, "split it");
    }

    #[test]
    fn test_clause_lines_map_uses_numeric_keys() {
        let clause: Clause =
            serde_json::from_str(r#"{"line_numbers":[4],"lines":{"4":"EXPOSE 80"},"content":"EXPOSE 80"}"#)
                .unwrap();
        assert_eq!(clause.lines.get(&4).map(String::as_str), Some("EXPOSE 80"));
        assert!(clause.is_placeholder());
    }

    #[test]
    fn test_from_lines() {
        let clause = Clause::from_lines([(3, "RUN apt-get update \\"), (4, "  && apt-get install -y curl")]);
        assert_eq!(clause.line_numbers, vec![3, 4]);
        assert_eq!(clause.content, "RUN apt-get update \\\n  && apt-get install -y curl");
        assert_eq!(clause.first_line(), Some(3));
        assert_eq!(clause.last_line(), Some(4));
        assert!(clause.is_placeholder());
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(AnalysisEvent::OriginalDockerfile("FROM a\n".into())).unwrap();
        assert_eq!(json["type"], "original_dockerfile");
        assert_eq!(json["data"], "FROM a\n");

        let complete: AnalysisEvent = serde_json::from_str(r#"{"type":"complete"}"#).unwrap();
        assert_eq!(complete, AnalysisEvent::Complete);
        assert!(complete.is_terminal());
    }

    #[test]
    fn test_to_frame() {
        let frame = AnalysisEvent::Error("boom".into()).to_frame().unwrap();
        assert_eq!(frame, "data: {\"type\":\"error\",\"data\":\"boom\"}\n");
    }

    #[test]
    fn test_batch_aliases() {
        let batch: BatchAnalysis =
            serde_json::from_str(r#"{"originalText":"FROM a","optimizedText":"FROM a:1","clauses":[]}"#).unwrap();
        assert_eq!(batch.original_dockerfile, "FROM a");
        assert_eq!(batch.optimized_dockerfile.as_deref(), Some("FROM a:1"));
    }
}

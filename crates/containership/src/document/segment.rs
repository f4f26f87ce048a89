// crates/containership/src/document/segment.rs
// Local Dockerfile clause segmentation and technology detection

use crate::error::{ContainershipError, Result};
use containership_types::Clause;

/// Instruction keywords that open a new clause
pub const RESERVED_INSTRUCTIONS: &[&str] = &[
    "FROM",
    "RUN",
    "CMD",
    "LABEL",
    "EXPOSE",
    "ENV",
    "ADD",
    "COPY",
    "ENTRYPOINT",
    "VOLUME",
    "USER",
    "WORKDIR",
    "ARG",
    "ONBUILD",
    "HEALTHCHECK",
    "SHELL",
    "STOPSIGNAL",
];

/// Keyword that opens a clause on this line, if any.
///
/// Matching is case-sensitive and requires the keyword to be followed by
/// whitespace or the end of the line, so `ENVIRONMENT=x` stays a
/// continuation.
pub fn leading_instruction(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    RESERVED_INSTRUCTIONS.iter().copied().find(|keyword| {
        trimmed
            .strip_prefix(*keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// Split Dockerfile text into clauses with 1-based line numbers.
///
/// Blank lines and `#` comments are skipped; every other line either opens a
/// clause (reserved instruction) or continues the current one.
pub fn segment_clauses(text: &str) -> Result<Vec<Clause>> {
    let technology = detect_technology(text);
    let mut clauses = Vec::new();
    let mut current: Vec<(u32, String)> = Vec::new();
    let mut instruction: Option<&'static str> = None;

    for (i, raw) in text.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let number = line_number(i)?;

        match leading_instruction(line) {
            Some(keyword) => {
                if !current.is_empty() {
                    clauses.push(finish_clause(std::mem::take(&mut current), instruction, technology));
                }
                instruction = Some(keyword);
            }
            None if current.is_empty() => {
                return Err(ContainershipError::Validation(format!(
                    "line {} continues a clause but no instruction precedes it",
                    number
                )));
            }
            None => {}
        }
        current.push((number, line.to_string()));
    }

    if !current.is_empty() {
        clauses.push(finish_clause(current, instruction, technology));
    }

    Ok(clauses)
}

/// 1-based line number for the line at `offset`
fn line_number(offset: usize) -> Result<u32> {
    offset
        .checked_add(1)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ContainershipError::Validation(format!("line {} is past the supported line range", offset)))
}

fn finish_clause(lines: Vec<(u32, String)>, instruction: Option<&str>, technology: &str) -> Clause {
    let mut clause = Clause::from_lines(lines);
    clause.instruction = instruction.map(str::to_string);
    clause.technology = Some(technology.to_string());
    clause
}

/// Guess the primary technology stack of a Dockerfile.
///
/// Language keywords are checked first (in a fixed precedence), then the
/// base image of the first `FROM`.
pub fn detect_technology(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("python") {
        return if has("flask") {
            "Python Flask"
        } else if has("django") {
            "Python Django"
        } else if has("fastapi") {
            "Python FastAPI"
        } else {
            "Python"
        };
    }

    if has("node") || has("npm") {
        return if has("react") {
            "Node.js React"
        } else if has("express") {
            "Node.js Express"
        } else if has("next") {
            "Next.js"
        } else {
            "Node.js"
        };
    }

    if has("java") {
        return if has("spring") {
            "Java Spring"
        } else if has("maven") {
            "Java Maven"
        } else {
            "Java"
        };
    }

    // A bare "go" would match `cargo`, `mongo` and `google`
    if has("golang") || has(" go build") || has(" go mod") || has("go.mod") {
        return "Go";
    }
    if has("rust") {
        return "Rust";
    }
    if has("php") {
        return "PHP";
    }
    if has("ruby") {
        return "Ruby";
    }

    let base_image = lower
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("from "))
        .map(str::trim);

    match base_image {
        Some(image) if image.contains("openjdk") => "Java",
        Some(image) if image.starts_with("go:") || image.contains("/go:") => "Go",
        _ => "Generic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use containership_types::PLACEHOLDER_RECOMMENDATION;

    const NODE_DOCKERFILE: &str = "FROM node:16-alpine
WORKDIR /app
COPY package*.json ./
RUN npm install
COPY . .
EXPOSE 3000
CMD [\"npm\", \"start\"]
";

    // ========================================================================
    // Segmentation
    // ========================================================================

    #[test]
    fn test_one_clause_per_instruction() {
        let clauses = segment_clauses(NODE_DOCKERFILE).unwrap();
        assert_eq!(clauses.len(), 7);
        assert_eq!(clauses[0].line_numbers, vec![1]);
        assert_eq!(clauses[0].content, "FROM node:16-alpine");
        assert_eq!(clauses[0].instruction.as_deref(), Some("FROM"));
        assert_eq!(clauses[6].line_numbers, vec![7]);
        assert_eq!(clauses[6].instruction.as_deref(), Some("CMD"));
        assert!(clauses.iter().all(|c| c.recommendation == PLACEHOLDER_RECOMMENDATION));
        assert!(clauses.iter().all(|c| c.technology.as_deref() == Some("Node.js")));
    }

    #[test]
    fn test_continuation_lines_join_clause() {
        let text = "FROM debian:12\n\n# tools\nRUN apt-get update \\\n    && apt-get install -y curl\nUSER app\n";
        let clauses = segment_clauses(text).unwrap();

        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[1].line_numbers, vec![4, 5]);
        assert_eq!(clauses[1].content, "RUN apt-get update \\\n    && apt-get install -y curl");
        assert_eq!(clauses[1].lines.get(&5).map(String::as_str), Some("    && apt-get install -y curl"));
        assert_eq!(clauses[2].line_numbers, vec![6]);
    }

    #[test]
    fn test_keyword_needs_word_boundary() {
        assert_eq!(leading_instruction("  RUN make"), Some("RUN"));
        assert_eq!(leading_instruction("ENV"), Some("ENV"));
        assert_eq!(leading_instruction("ENVIRONMENT=prod"), None);
        assert_eq!(leading_instruction("run make"), None);
    }

    #[test]
    fn test_leading_continuation_is_rejected() {
        let err = segment_clauses("  && echo hi\nFROM alpine\n").unwrap_err();
        assert!(matches!(err, ContainershipError::Validation(_)));
    }

    #[test]
    fn test_crlf_lines() {
        let clauses = segment_clauses("FROM alpine\r\nRUN true\r\n").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1].content, "RUN true");
    }

    #[test]
    fn test_line_number_range() {
        assert_eq!(line_number(0).unwrap(), 1);
        assert_eq!(line_number(u32::MAX as usize - 1).unwrap(), u32::MAX);
        assert!(matches!(
            line_number(u32::MAX as usize),
            Err(ContainershipError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_text() {
        assert!(segment_clauses("").unwrap().is_empty());
        assert!(segment_clauses("# only a comment\n\n").unwrap().is_empty());
    }

    // ========================================================================
    // Technology detection
    // ========================================================================

    #[test]
    fn test_detect_technology() {
        assert_eq!(detect_technology("FROM python:3.12\nRUN pip install flask"), "Python Flask");
        assert_eq!(detect_technology("FROM python:3.12"), "Python");
        assert_eq!(detect_technology(NODE_DOCKERFILE), "Node.js");
        assert_eq!(detect_technology("FROM eclipse-temurin\nRUN java -jar spring.jar"), "Java Spring");
        assert_eq!(detect_technology("FROM golang:1.22\nRUN go build ./..."), "Go");
        assert_eq!(detect_technology("FROM rust:1.80\nRUN cargo build --release"), "Rust");
        assert_eq!(detect_technology("FROM rust AS build\nCOPY . ."), "Rust");
        assert_eq!(detect_technology("FROM scratch\nCOPY go.mod go.sum ./"), "Go");
        assert_eq!(detect_technology("FROM openjdk:21"), "Java");
        assert_eq!(detect_technology("FROM alpine\nRUN echo hi"), "Generic");
    }
}

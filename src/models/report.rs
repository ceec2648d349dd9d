//! Run reports and output-format selection.

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A retrieved chunk as recorded in a run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub title: String,
    pub similarity_score: f32,
    pub content_preview: String,
}

impl RetrievedDoc {
    pub fn new(title: impl Into<String>, similarity_score: f32, content: &str) -> Self {
        let preview: String = content.chars().take(200).collect();
        let preview = if content.chars().count() > 200 {
            format!("{}...", preview)
        } else {
            preview
        };
        Self {
            title: title.into(),
            similarity_score,
            content_preview: preview,
        }
    }
}

/// Usage counters reported by the chat backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmInfo {
    pub model: String,
    pub generation_ms: u64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Result of one full retrieve-and-generate run.
///
/// Remote-call failures during generation land in `error` rather than
/// aborting the run; `answer` is `None` in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskReport {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub strategy: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmInfo>,

    pub retrieved_documents: Vec<RetrievedDoc>,
    pub context_chars: usize,
    pub retrieval_ms: u64,
    pub total_ms: u64,
    pub timestamp: String,
}

impl AskReport {
    pub fn failed(query: impl Into<String>, strategy: String, error: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: None,
            error: Some(error.into()),
            strategy,
            llm: None,
            retrieved_documents: Vec::new(),
            context_chars: 0,
            retrieval_ms: 0,
            total_ms: 0,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub total_ms: u64,
    pub avg_ms_per_query: u64,
    pub total_tokens_used: u32,
}

/// Report for a sequential batch of queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub results: Vec<AskReport>,
    pub timestamp: String,
}

impl BatchReport {
    pub fn new(results: Vec<AskReport>, total_ms: u64) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        let total_tokens = results
            .iter()
            .filter_map(|r| r.llm.as_ref())
            .map(|l| l.total_tokens)
            .sum();
        let summary = BatchSummary {
            total_queries: results.len(),
            successful_queries: successful,
            failed_queries: results.len() - successful,
            total_ms,
            avg_ms_per_query: if results.is_empty() {
                0
            } else {
                total_ms / results.len() as u64
            },
            total_tokens_used: total_tokens,
        };
        Self {
            summary,
            results,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_retrieved_doc_preview_truncation() {
        let long = "x".repeat(300);
        let doc = RetrievedDoc::new("t", 0.9, &long);
        assert!(doc.content_preview.ends_with("..."));
        assert_eq!(doc.content_preview.chars().count(), 203);

        let short = RetrievedDoc::new("t", 0.9, "hello");
        assert_eq!(short.content_preview, "hello");
    }

    #[test]
    fn test_batch_report_summary() {
        let ok = AskReport {
            query: "q1".into(),
            answer: Some("a".into()),
            error: None,
            strategy: "rule-based".into(),
            llm: Some(LlmInfo {
                total_tokens: 120,
                ..Default::default()
            }),
            retrieved_documents: vec![],
            context_chars: 10,
            retrieval_ms: 5,
            total_ms: 12,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let failed = AskReport::failed("q2", "rule-based".into(), "backend down");

        let report = BatchReport::new(vec![ok, failed], 100);
        assert_eq!(report.summary.total_queries, 2);
        assert_eq!(report.summary.successful_queries, 1);
        assert_eq!(report.summary.failed_queries, 1);
        assert_eq!(report.summary.avg_ms_per_query, 50);
        assert_eq!(report.summary.total_tokens_used, 120);
    }

    #[test]
    fn test_ask_report_serializes_error_field() {
        let report = AskReport::failed("q", "remote".into(), "timeout");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"error\":\"timeout\""));
        assert!(!json.contains("\"answer\""));
    }
}

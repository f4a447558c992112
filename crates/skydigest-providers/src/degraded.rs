//! Model-free fallback summaries.

use async_trait::async_trait;
use skydigest_core::{
    conversation::Language,
    traits::{Summarizer, Summary, SummaryRequest},
};

const MAX_LINES: usize = 10;
const MAX_LINE_CHARS: usize = 120;

/// First non-empty lines of the day, clipped, under a degraded marker.
pub fn degraded_summary(lines: &[&str], language: Language) -> Summary {
    let bullets: Vec<String> = lines
        .iter()
        .flat_map(|l| l.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(MAX_LINES)
        .map(|l| format!("- {}", l.chars().take(MAX_LINE_CHARS).collect::<String>()))
        .collect();

    let marker = match language {
        Language::Zh => "(降级摘要)",
        Language::En => "(degraded summary)",
    };
    let text = if bullets.is_empty() {
        let nothing = match language {
            Language::Zh => "无可摘要内容",
            Language::En => "nothing to summarize",
        };
        format!("{marker} {nothing}")
    } else {
        format!("{marker}\n{}", bullets.join("\n"))
    };

    Summary {
        text,
        degraded: true,
    }
}

/// Summarizer used when no model is configured.
pub struct DegradedSummarizer;

#[async_trait]
impl Summarizer for DegradedSummarizer {
    fn name(&self) -> &str {
        "degraded"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Summary {
        let lines: Vec<&str> = request.messages.iter().map(|m| m.text.as_str()).collect();
        degraded_summary(&lines, request.language)
    }
}

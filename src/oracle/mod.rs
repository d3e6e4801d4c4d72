//! Semantic content oracle.
//!
//! The oracle supplies the descriptive text of a docstring: a summary and
//! one description per argument, return value and exception. Its output is
//! non-deterministic, so the rest of the crate only relies on its contract:
//! a [`ContentRequest`] goes in, a [`SemanticContent`] comes out, and any
//! per-call failure degrades to fixed placeholder content.

pub mod groq;
pub mod prompts;
pub mod types;

use async_trait::async_trait;
use tracing::warn;

use crate::core::errors::Result;
use crate::core::model::RoutineMetadata;
use crate::docstring::content::default_summary;
use crate::docstring::{SemanticContent, PLACEHOLDER_DESCRIPTION};

pub use groq::GroqOracle;
pub use prompts::{build_prompt, parse_content, strip_code_fence};
pub use types::{ContentRequest, OracleConfig};

/// Source of semantic docstring content.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce content for one routine.
    async fn generate(&self, request: &ContentRequest) -> Result<SemanticContent>;
}

/// Generator that never calls out and always returns placeholder content.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderGenerator;

#[async_trait]
impl ContentGenerator for PlaceholderGenerator {
    async fn generate(&self, request: &ContentRequest) -> Result<SemanticContent> {
        Ok(SemanticContent {
            summary: default_summary(&request.name),
            args: request
                .args
                .iter()
                .map(|name| (name.clone(), PLACEHOLDER_DESCRIPTION.to_string()))
                .collect(),
            ..SemanticContent::default()
        })
    }
}

/// Ask `generator` for content, substituting the fallback on any failure.
pub async fn generate_or_fallback(
    generator: &dyn ContentGenerator,
    routine: &RoutineMetadata,
) -> SemanticContent {
    let request = ContentRequest::from_routine(routine);
    match generator.generate(&request).await {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Content generation failed for '{}', using placeholders: {}",
                routine.name, err
            );
            SemanticContent::fallback(routine)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GeneratorConfig;
    use crate::core::errors::DocsmithError;
    use crate::core::model::ArgumentInfo;
    use std::time::Duration;

    struct Failing;

    #[async_trait]
    impl ContentGenerator for Failing {
        async fn generate(&self, _request: &ContentRequest) -> Result<SemanticContent> {
            Err(DocsmithError::generation("service unavailable"))
        }
    }

    struct Canned(&'static str);

    #[async_trait]
    impl ContentGenerator for Canned {
        async fn generate(&self, _request: &ContentRequest) -> Result<SemanticContent> {
            parse_content(self.0)
        }
    }

    fn routine() -> RoutineMetadata {
        let mut routine = RoutineMetadata::new("add", 1);
        routine.args = vec![ArgumentInfo::new("a"), ArgumentInfo::new("b")];
        routine
    }

    #[tokio::test]
    async fn failures_fall_back_to_placeholders() {
        let content = generate_or_fallback(&Failing, &routine()).await;
        assert_eq!(content, SemanticContent::fallback(&routine()));
    }

    #[tokio::test]
    async fn malformed_completion_falls_back() {
        let content = generate_or_fallback(&Canned("not json"), &routine()).await;
        assert_eq!(content.summary, "Short description of `add`.");
        assert_eq!(content.args.len(), 2);
    }

    #[tokio::test]
    async fn valid_completion_is_used() {
        let content =
            generate_or_fallback(&Canned(r#"{"summary": "Add numbers.", "args": {}}"#), &routine())
                .await;
        assert_eq!(content.summary, "Add numbers.");
    }

    #[tokio::test]
    async fn placeholder_generator_matches_fallback() {
        let content = generate_or_fallback(&PlaceholderGenerator, &routine()).await;
        assert_eq!(content, SemanticContent::fallback(&routine()));
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back() {
        let config = OracleConfig::with_key(&GeneratorConfig::default(), "test-key")
            .with_endpoint("http://127.0.0.1:1/v1/chat/completions")
            .with_timeout(Duration::from_secs(2));
        let oracle = GroqOracle::new(config).unwrap();

        let err = oracle
            .generate(&ContentRequest::from_routine(&routine()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsmithError::Generation { .. }));

        let content = generate_or_fallback(&oracle, &routine()).await;
        assert_eq!(content, SemanticContent::fallback(&routine()));
    }
}

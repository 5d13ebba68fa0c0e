use std::time::Instant;

use super::prompt::{generation_settings, REPETITION_PENALTY, TOP_P};
use super::types::{ApiUsed, GeneratedAnswer, QueryType, ResponseLength};
use super::RagError;

/// Parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// `None` for providers without a repetition control.
    pub repetition_penalty: Option<f32>,
}

/// A text-generation backend.
pub trait GenerationProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn supports_repetition_penalty(&self) -> bool {
        true
    }

    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, RagError>;
}

/// Tries providers in order until one returns non-empty text.
pub struct AnswerGenerator {
    providers: Vec<(ApiUsed, Box<dyn GenerationProvider>)>,
}

impl AnswerGenerator {
    pub fn new(
        primary: Box<dyn GenerationProvider>,
        secondary: Option<Box<dyn GenerationProvider>>,
    ) -> Self {
        let mut providers = vec![(ApiUsed::Primary, primary)];
        if let Some(secondary) = secondary {
            providers.push((ApiUsed::Secondary, secondary));
        }
        Self { providers }
    }

    pub fn has_fallback(&self) -> bool {
        self.providers.len() > 1
    }

    /// Generate an answer for an assembled prompt.
    ///
    /// The secondary provider is only called after the primary fails.
    /// Returns `GenerationFailed` when every provider fails or returns
    /// empty text.
    pub fn generate(
        &self,
        prompt: &str,
        length: ResponseLength,
        query_type: QueryType,
        temperature: f32,
    ) -> Result<GeneratedAnswer, RagError> {
        let settings = generation_settings(length, query_type);

        for (api_used, provider) in &self.providers {
            let request = CompletionRequest {
                system: &settings.system_instruction,
                prompt,
                max_tokens: settings.max_tokens,
                temperature,
                top_p: TOP_P,
                repetition_penalty: provider
                    .supports_repetition_penalty()
                    .then_some(REPETITION_PENALTY),
            };

            let started = Instant::now();
            let outcome = provider.complete(&request).and_then(|raw| {
                if raw.trim().is_empty() {
                    Err(RagError::EmptyResponse)
                } else {
                    Ok(raw)
                }
            });

            match outcome {
                Ok(raw) => {
                    let text = trim_incomplete_sentence(&raw);
                    tracing::info!(
                        provider = provider.name(),
                        api_used = ?api_used,
                        chars = text.len(),
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Answer generated"
                    );
                    return Ok(GeneratedAnswer {
                        text,
                        api_used: *api_used,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        api_used = ?api_used,
                        error = %e,
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Generation provider failed"
                    );
                }
            }
        }

        tracing::error!(attempts = self.providers.len(), "All generation providers failed");
        Err(RagError::GenerationFailed {
            attempts: self.providers.len(),
        })
    }
}

/// Drop a dangling partial sentence left by the output cap.
///
/// Text already ending in `.`, `!`, `?` or `"` is returned unmodified.
/// Otherwise the text is cut after the last `.`, `!` or `?`; with none
/// present it is returned unmodified.
pub fn trim_incomplete_sentence(text: &str) -> String {
    if text.ends_with(['.', '!', '?', '"']) {
        return text.to_string();
    }

    match text.rfind(['.', '!', '?']) {
        Some(idx) if idx > 0 => text[..=idx].to_string(),
        _ => text.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::mock::{MockProvider, Shared};
    use super::*;
    use crate::pipeline::rag::prompt::DEFAULT_TEMPERATURE;

    fn shared(provider: MockProvider) -> (Arc<MockProvider>, Box<dyn GenerationProvider>) {
        let arc = Arc::new(provider);
        (arc.clone(), Box::new(Shared(arc)))
    }

    #[test]
    fn trim_keeps_text_without_terminal_punctuation() {
        assert_eq!(
            trim_incomplete_sentence("The treatment is effective"),
            "The treatment is effective"
        );
    }

    #[test]
    fn trim_cuts_dangling_sentence() {
        assert_eq!(
            trim_incomplete_sentence("First point. Second point that got cut"),
            "First point."
        );
    }

    #[test]
    fn trim_keeps_complete_text() {
        assert_eq!(trim_incomplete_sentence("Done!"), "Done!");
        assert_eq!(
            trim_incomplete_sentence("They said \"rest.\""),
            "They said \"rest.\""
        );
    }

    #[test]
    fn trim_returns_complete_text_byte_for_byte() {
        let raw = "  Rest well.\n\nCall your team if it worsens.";
        assert_eq!(trim_incomplete_sentence(raw), raw);
    }

    #[test]
    fn trailing_whitespace_counts_as_incomplete() {
        assert_eq!(trim_incomplete_sentence("Is it safe?  \n"), "Is it safe?");
        assert_eq!(trim_incomplete_sentence("Done.  \n"), "Done.");
        assert_eq!(trim_incomplete_sentence("No punctuation  "), "No punctuation  ");
    }

    #[test]
    fn trim_ignores_punctuation_at_start() {
        assert_eq!(trim_incomplete_sentence(".and then"), ".and then");
    }

    #[test]
    fn primary_success_skips_secondary() {
        let (primary, primary_box) = shared(MockProvider::replying("primary", "Use FOLFOX."));
        let (secondary, secondary_box) = shared(MockProvider::replying("secondary", "Other."));
        let generator = AnswerGenerator::new(primary_box, Some(secondary_box));

        let answer = generator
            .generate("prompt", ResponseLength::Brief, QueryType::Treatment, DEFAULT_TEMPERATURE)
            .unwrap();

        assert_eq!(answer.text, "Use FOLFOX.");
        assert_eq!(answer.api_used, ApiUsed::Primary);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 0);
        assert_eq!(*primary.last_max_tokens.lock().unwrap(), Some(250));
        assert_eq!(*primary.last_penalty.lock().unwrap(), Some(REPETITION_PENALTY));
    }

    #[test]
    fn primary_failure_falls_back_to_secondary() {
        let (_, primary_box) = shared(MockProvider::failing("primary"));
        let (secondary, secondary_box) =
            shared(MockProvider::replying("secondary", "Fallback answer. Cut off").without_penalty());
        let generator = AnswerGenerator::new(primary_box, Some(secondary_box));

        let answer = generator
            .generate("prompt", ResponseLength::Normal, QueryType::General, DEFAULT_TEMPERATURE)
            .unwrap();

        assert_eq!(answer.api_used, ApiUsed::Secondary);
        assert_eq!(answer.text, "Fallback answer.");
        assert_eq!(*secondary.last_penalty.lock().unwrap(), None);
    }

    #[test]
    fn empty_primary_output_falls_back() {
        let (_, primary_box) = shared(MockProvider::replying("primary", "   \n"));
        let (_, secondary_box) = shared(MockProvider::replying("secondary", "Answer."));
        let generator = AnswerGenerator::new(primary_box, Some(secondary_box));

        let answer = generator
            .generate("prompt", ResponseLength::Normal, QueryType::General, DEFAULT_TEMPERATURE)
            .unwrap();
        assert_eq!(answer.api_used, ApiUsed::Secondary);
    }

    #[test]
    fn both_failing_is_generation_failure() {
        let generator = AnswerGenerator::new(
            Box::new(MockProvider::failing("primary")),
            Some(Box::new(MockProvider::replying("secondary", ""))),
        );

        let err = generator
            .generate("prompt", ResponseLength::Normal, QueryType::General, DEFAULT_TEMPERATURE)
            .unwrap_err();
        assert!(matches!(err, RagError::GenerationFailed { attempts: 2 }));
    }

    #[test]
    fn primary_only_failure_reports_single_attempt() {
        let generator = AnswerGenerator::new(Box::new(MockProvider::failing("primary")), None);
        assert!(!generator.has_fallback());

        let err = generator
            .generate("prompt", ResponseLength::Detailed, QueryType::Prognosis, DEFAULT_TEMPERATURE)
            .unwrap_err();
        assert!(matches!(err, RagError::GenerationFailed { attempts: 1 }));
    }
}

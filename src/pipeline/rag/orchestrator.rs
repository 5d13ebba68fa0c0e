use uuid::Uuid;

use super::classify::classify_query;
use super::context::assemble_prompt;
use super::conversation::MAX_HISTORY_TURNS;
use super::generation::AnswerGenerator;
use super::prompt::DEFAULT_TEMPERATURE;
use super::retrieval::HybridRetriever;
use super::types::{ChatResponse, ChunkSearch, HistoryStore, PatientQuery, ProfileStore};
use super::RagError;
use crate::models::{HistoryTurn, PatientContext};
use crate::pipeline::safety::{finalize, is_urgent, sanitize_query};

/// Question-answering pipeline for one request.
///
/// sanitize → classify → urgency → retrieve → profile/history → assemble
/// → generate → finalize. Only generation can fail the request; search,
/// profile, and history failures degrade to empty inputs.
pub struct ChatPipeline<'a, S, P, H>
where
    S: ChunkSearch + ?Sized,
    P: ProfileStore + ?Sized,
    H: HistoryStore + ?Sized,
{
    search: &'a S,
    profiles: &'a P,
    history: &'a H,
    generator: &'a AnswerGenerator,
}

impl<'a, S, P, H> ChatPipeline<'a, S, P, H>
where
    S: ChunkSearch + ?Sized,
    P: ProfileStore + ?Sized,
    H: HistoryStore + ?Sized,
{
    pub fn new(
        search: &'a S,
        profiles: &'a P,
        history: &'a H,
        generator: &'a AnswerGenerator,
    ) -> Self {
        Self {
            search,
            profiles,
            history,
            generator,
        }
    }

    pub fn answer(&self, query: &PatientQuery) -> Result<ChatResponse, RagError> {
        let sanitized =
            sanitize_query(&query.text).map_err(|e| RagError::InvalidInput(e.to_string()))?;
        if sanitized.was_modified {
            let kinds: Vec<&str> = sanitized
                .modifications
                .iter()
                .map(|m| m.kind.as_str())
                .collect();
            tracing::warn!(modifications = ?kinds, "Patient message sanitized");
        }
        if sanitized.injection_suspected {
            tracing::warn!("Patient message contains a prompt-injection marker");
        }
        let question = sanitized.text;

        let query_type = classify_query(&question);
        // Checked on the raw message so sanitization cannot hide a symptom.
        let urgent = is_urgent(&query.text);

        let chunks = HybridRetriever::new(self.search).retrieve(
            &question,
            query_type,
            query.response_length.retrieval_limit(),
        );

        let profile = self.load_profile(&query.user_id);
        let history = self.load_history(query.conversation_id);

        let prompt = assemble_prompt(&question, &chunks, profile.as_ref(), &history, query_type);

        tracing::debug!(
            query_type = query_type.as_str(),
            response_length = query.response_length.as_str(),
            urgent,
            sources = prompt.sources_used,
            history_turns = history.len(),
            patient_context = prompt.patient_context_used,
            estimated_tokens = prompt.estimated_tokens,
            "Prompt assembled"
        );

        let generated = self.generator.generate(
            &prompt.text,
            query.response_length,
            query_type,
            DEFAULT_TEMPERATURE,
        )?;

        Ok(ChatResponse {
            answer: finalize(&generated.text, urgent),
            api_used: generated.api_used,
            retrieved_count: chunks.len(),
            patient_context_used: prompt.patient_context_used,
            query_type,
            is_urgent: urgent,
        })
    }

    fn load_profile(&self, user_id: &str) -> Option<PatientContext> {
        match self.profiles.patient_context(user_id) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, "Patient profile unavailable, answering without it");
                None
            }
        }
    }

    /// Prior turns in chronological order.
    fn load_history(&self, conversation_id: Option<Uuid>) -> Vec<HistoryTurn> {
        let Some(conversation_id) = conversation_id else {
            return Vec::new();
        };

        match self.history.recent_history(&conversation_id, MAX_HISTORY_TURNS) {
            Ok(mut turns) => {
                turns.reverse();
                turns
            }
            Err(e) => {
                tracing::warn!(error = %e, "Conversation history unavailable, answering without it");
                Vec::new()
            }
        }
    }
}

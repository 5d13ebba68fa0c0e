use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RagError;
use crate::models::{HistoryTurn, PatientContext};

/// Intent category of a patient question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Treatment,
    SideEffect,
    Prognosis,
    Diagnosis,
    Screening,
    General,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Treatment => "treatment",
            Self::SideEffect => "side_effect",
            Self::Prognosis => "prognosis",
            Self::Diagnosis => "diagnosis",
            Self::Screening => "screening",
            Self::General => "general",
        }
    }

    /// Parse a query type name; unknown values become `General`.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "treatment" => Self::Treatment,
            "side_effect" => Self::SideEffect,
            "prognosis" => Self::Prognosis,
            "diagnosis" => Self::Diagnosis,
            "screening" => Self::Screening,
            _ => Self::General,
        }
    }
}

/// Requested answer length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLength {
    Brief,
    #[default]
    Normal,
    Detailed,
}

impl ResponseLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Normal => "normal",
            Self::Detailed => "detailed",
        }
    }

    /// Parse a response length; unknown values become `Normal`.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "brief" => Self::Brief,
            "detailed" => Self::Detailed,
            _ => Self::Normal,
        }
    }

    /// Output cap handed to the provider, in tokens.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::Brief => 250,
            Self::Normal => 500,
            Self::Detailed => 800,
        }
    }

    /// How many reference passages the retriever returns.
    pub fn retrieval_limit(&self) -> usize {
        match self {
            Self::Brief | Self::Normal => 8,
            Self::Detailed => 10,
        }
    }
}

/// Which provider produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiUsed {
    Primary,
    Secondary,
}

/// A chunk with its relevance rank (higher is better).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub content: String,
    pub rank: f64,
}

/// A patient's question, normalized by the calling layer.
#[derive(Debug, Clone)]
pub struct PatientQuery {
    pub text: String,
    pub user_id: String,
    pub response_length: ResponseLength,
    /// Existing conversation for this session, if any.
    pub conversation_id: Option<Uuid>,
}

/// Prompt text handed to a generation provider.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub text: String,
    pub sources_used: usize,
    pub patient_context_used: bool,
    pub estimated_tokens: usize,
}

/// Raw provider output after sentence repair.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAnswer {
    pub text: String,
    pub api_used: ApiUsed,
}

/// Outbound response contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub api_used: ApiUsed,
    pub retrieved_count: usize,
    pub patient_context_used: bool,
    pub query_type: QueryType,
    pub is_urgent: bool,
}

/// Ranked full-text search over chunks that are ready for retrieval.
pub trait ChunkSearch {
    fn search(&self, query_text: &str, limit: usize) -> Result<Vec<ScoredChunk>, RagError>;
}

/// Read access to stored patient profiles.
pub trait ProfileStore {
    fn patient_context(&self, user_id: &str) -> Result<Option<PatientContext>, RagError>;
}

/// Read access to prior turns. Returns the most recent turns first.
pub trait HistoryStore {
    fn recent_history(
        &self,
        conversation_id: &Uuid,
        max_turns: usize,
    ) -> Result<Vec<HistoryTurn>, RagError>;
}

/// Stand-in for every collaborator when storage cannot be reached.
pub struct NoStorage;

impl ChunkSearch for NoStorage {
    fn search(&self, _query_text: &str, _limit: usize) -> Result<Vec<ScoredChunk>, RagError> {
        Ok(Vec::new())
    }
}

impl ProfileStore for NoStorage {
    fn patient_context(&self, _user_id: &str) -> Result<Option<PatientContext>, RagError> {
        Ok(None)
    }
}

impl HistoryStore for NoStorage {
    fn recent_history(
        &self,
        _conversation_id: &Uuid,
        _max_turns: usize,
    ) -> Result<Vec<HistoryTurn>, RagError> {
        Ok(Vec::new())
    }
}

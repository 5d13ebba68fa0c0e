pub mod types;
pub mod classify;
pub mod retrieval;
pub mod context;
pub mod prompt;
pub mod generation;
pub mod providers;
pub mod profile;
pub mod conversation;
pub mod orchestrator;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Provider connection failed: {0}")]
    ProviderConnection(String),

    #[error("Provider returned HTTP {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("All {attempts} generation providers failed")]
    GenerationFailed { attempts: usize },

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

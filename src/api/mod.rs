//! HTTP surface for the question-answering pipeline.
//!
//! Routes are nested under `/api/`. `/api/chat` requires an `X-User-Id`
//! header; `/api/health` is open.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;

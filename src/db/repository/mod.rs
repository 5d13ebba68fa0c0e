//! Repository layer — entity-scoped database operations.

mod chunk_search;
mod conversation;
mod profile;

pub use chunk_search::*;
pub use conversation::*;
pub use profile::*;

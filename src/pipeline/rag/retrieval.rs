use std::cmp::Ordering;
use std::collections::HashSet;

use rusqlite::Connection;

use super::types::{ChunkSearch, QueryType, ScoredChunk};
use super::RagError;
use crate::db::repository;

/// Multiplier applied to ranks from the direct (unexpanded) search.
pub const DIRECT_MATCH_BOOST: f64 = 1.5;

/// Extra search terms appended to the query for the expanded strategy.
///
/// `Screening` and `General` have no entry and use the direct search alone.
const KEYWORD_EXPANSIONS: &[(QueryType, &str)] = &[
    (
        QueryType::Treatment,
        "chemotherapy regimen FOLFOX FOLFIRI treatment protocol",
    ),
    (
        QueryType::SideEffect,
        "side effects adverse events toxicity management supportive care",
    ),
    (
        QueryType::Prognosis,
        "survival rate prognosis outcomes recurrence staging",
    ),
    (
        QueryType::Diagnosis,
        "diagnosis staging pathology biopsy TNM classification",
    ),
];

pub fn keyword_expansion(query_type: QueryType) -> Option<&'static str> {
    KEYWORD_EXPANSIONS
        .iter()
        .find(|(qt, _)| *qt == query_type)
        .map(|(_, expansion)| *expansion)
}

/// Merge direct and expanded results into one ranked, deduplicated list.
///
/// Direct results are inserted first with their rank boosted. An expanded
/// result is only inserted when its id has not been seen, so a direct hit
/// always keeps its own (boosted) rank.
pub fn fuse_results(direct: Vec<ScoredChunk>, expanded: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    let mut seen: HashSet<String> = HashSet::with_capacity(direct.len() + expanded.len());
    let mut fused = Vec::with_capacity(direct.len() + expanded.len());

    for mut chunk in direct {
        if seen.insert(chunk.chunk_id.clone()) {
            chunk.rank *= DIRECT_MATCH_BOOST;
            fused.push(chunk);
        }
    }

    for chunk in expanded {
        if seen.insert(chunk.chunk_id.clone()) {
            fused.push(chunk);
        }
    }

    // Stable sort: equal ranks keep direct-before-expanded order.
    fused.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(Ordering::Equal));
    fused
}

/// Two-strategy keyword retriever over a `ChunkSearch` backend.
pub struct HybridRetriever<'a, S: ChunkSearch + ?Sized> {
    search: &'a S,
}

impl<'a, S: ChunkSearch + ?Sized> HybridRetriever<'a, S> {
    pub fn new(search: &'a S) -> Self {
        Self { search }
    }

    /// Ranked passages for a query, at most `limit` of them.
    pub fn retrieve(&self, query: &str, query_type: QueryType, limit: usize) -> Vec<String> {
        self.retrieve_chunks(query, query_type, limit)
            .into_iter()
            .map(|chunk| chunk.content)
            .collect()
    }

    /// Like `retrieve`, but keeps ids and fused ranks.
    pub fn retrieve_chunks(
        &self,
        query: &str,
        query_type: QueryType,
        limit: usize,
    ) -> Vec<ScoredChunk> {
        if limit == 0 {
            return Vec::new();
        }

        let direct = self.run_strategy("direct", query, limit);

        let expanded = match keyword_expansion(query_type) {
            Some(expansion) => {
                let expanded_query = format!("{query} {expansion}");
                self.run_strategy("expanded", &expanded_query, limit)
            }
            None => Vec::new(),
        };

        let direct_hits = direct.len();
        let expanded_hits = expanded.len();

        let mut fused = fuse_results(direct, expanded);
        fused.truncate(limit);

        tracing::debug!(
            query_type = query_type.as_str(),
            direct_hits,
            expanded_hits,
            returned = fused.len(),
            "Hybrid retrieval complete"
        );

        fused
    }

    /// A failed search degrades to no results for that strategy.
    fn run_strategy(&self, strategy: &str, text: &str, limit: usize) -> Vec<ScoredChunk> {
        match self.search.search(text, limit) {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!(strategy, error = %e, "Search strategy failed, continuing without it");
                Vec::new()
            }
        }
    }
}

/// `ChunkSearch` backed by the SQLite FTS5 chunk index.
pub struct FtsChunkSearch<'a> {
    conn: &'a Connection,
}

impl<'a> FtsChunkSearch<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ChunkSearch for FtsChunkSearch<'_> {
    fn search(&self, query_text: &str, limit: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let rows = repository::search_ready_chunks(self.conn, query_text, limit)
            .map_err(|e| RagError::Search(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ScoredChunk {
                chunk_id: row.chunk_id,
                content: row.content,
                rank: row.rank,
            })
            .collect())
    }
}

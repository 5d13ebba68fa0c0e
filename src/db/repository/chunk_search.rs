use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::enums::ChunkStatus;

/// A reference chunk row as stored for retrieval.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub status: ChunkStatus,
}

/// One FTS5 hit. `rank` is the negated BM25 score, so higher is better.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSearchRow {
    pub chunk_id: String,
    pub content: String,
    pub rank: f64,
}

pub fn insert_chunk(conn: &Connection, chunk: &DocumentChunk) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO document_chunks (id, document_id, content, status) VALUES (?1, ?2, ?3, ?4)",
        params![
            chunk.id,
            chunk.document_id,
            chunk.content,
            chunk.status.as_str(),
        ],
    )?;
    Ok(())
}

/// Full-text search over chunks marked ready for retrieval.
///
/// Terms are OR-ed so that a keyword-expanded query widens recall
/// instead of narrowing it; BM25 still favours chunks matching more terms.
pub fn search_ready_chunks(
    conn: &Connection,
    query: &str,
    limit: usize,
) -> Result<Vec<ChunkSearchRow>, DatabaseError> {
    let fts_query = sanitize_fts_query(query);
    if fts_query.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT c.id, c.content, -bm25(chunks_fts) AS score
         FROM chunks_fts
         JOIN document_chunks c ON c.rowid = chunks_fts.rowid
         WHERE chunks_fts MATCH ?1 AND c.status = ?2
         ORDER BY score DESC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(
        params![fts_query, ChunkStatus::Ready.as_str(), limit as i64],
        |row| {
            Ok(ChunkSearchRow {
                chunk_id: row.get(0)?,
                content: row.get(1)?,
                rank: row.get(2)?,
            })
        },
    )?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)
}

/// Sanitize a search query for FTS5.
/// Strips operators and quotes each term so user text cannot break the MATCH syntax.
fn sanitize_fts_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .map(|w| w.trim_matches('-'))
        .filter(|w| w.chars().count() >= 3)
        .map(|w| format!("\"{}\"", w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" OR ")
}

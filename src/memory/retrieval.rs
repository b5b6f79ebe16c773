//! The cognitive retrieval pipeline.
//!
//! Ranks candidates by a blend of MINERVA 2 probe similarity, ACT-R
//! base-level activation, and one-hop spreading activation, thresholds by
//! logistic retrieval probability, and reinforces the winners: every
//! returned memory gets an access record stamped with the single `now`
//! captured at call entry. Only returned items are reinforced — candidates
//! dropped by the probability filter are not.
//!
//! The pipeline recovers at its boundary. A probe that cannot be embedded
//! (no provider configured, provider failure, deadline already expired)
//! degrades to pure base-level ranking; candidates missing an embedding are
//! skipped in similarity mode rather than failing the batch.

use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use crate::cognition::{base_level, cosine, cube, retrieval_probability, spread, IncidentEdge};
use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::{MemoriaError, Result};
use crate::memory::store::row_to_memory;
use crate::memory::types::{Memory, MemoryKind};
use crate::memory::{bytes_to_vector, now_ms};

/// What to search with: raw text (embedded via the provider) or a vector.
pub enum Probe<'a> {
    Text(&'a str),
    Vector(Vec<f32>),
}

/// A retrieval request.
pub struct RetrievalQuery<'a> {
    pub probe: Probe<'a>,
    /// Restrict to one memory kind.
    pub kind: Option<MemoryKind>,
    /// Restrict to one project scope.
    pub project_id: Option<&'a str>,
    /// If already expired when the probe would be embedded, skip embedding
    /// and fall back to base-level ranking.
    pub deadline: Option<Instant>,
}

impl<'a> RetrievalQuery<'a> {
    pub fn text(probe: &'a str) -> Self {
        Self {
            probe: Probe::Text(probe),
            kind: None,
            project_id: None,
            deadline: None,
        }
    }

    pub fn vector(probe: Vec<f32>) -> Self {
        Self {
            probe: Probe::Vector(probe),
            kind: None,
            project_id: None,
            deadline: None,
        }
    }
}

/// How the ranking was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Full cognitive blend against a probe vector.
    Similarity,
    /// No probe vector was available; ranked by base-level activation only.
    RecencyFallback,
}

/// One ranked result with its full signal breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMemory {
    pub memory: Memory,
    /// Raw cosine similarity; `None` in fallback mode.
    pub similarity: Option<f64>,
    /// `sim³` — the MINERVA 2 emphasis.
    pub probe_activation: f64,
    pub base_level: f64,
    pub spreading: f64,
    pub score: f64,
    pub probability: f64,
}

/// Response from [`retrieve`].
#[derive(Debug, Serialize)]
pub struct RetrievalResponse {
    pub results: Vec<RankedMemory>,
    pub mode: RetrievalMode,
    /// Candidates that survived filtering, before truncation to `max_results`.
    pub total_candidates: usize,
}

/// Run the retrieval pipeline with `now` taken from the wall clock.
pub fn retrieve(
    conn: &mut Connection,
    embedder: Option<&dyn Embedder>,
    query: &RetrievalQuery<'_>,
    config: &RetrievalConfig,
) -> Result<RetrievalResponse> {
    retrieve_at(conn, embedder, query, config, now_ms())
}

/// Run the retrieval pipeline at an explicit `now`.
///
/// Given an identical store snapshot, configuration, probe, and `now`, the
/// ranked output is identical — ties break by most-recent access and then
/// by id, so replaying a call reproduces it exactly.
pub fn retrieve_at(
    conn: &mut Connection,
    embedder: Option<&dyn Embedder>,
    query: &RetrievalQuery<'_>,
    config: &RetrievalConfig,
    now_ms: i64,
) -> Result<RetrievalResponse> {
    if config.probe_weight < 0.0 || config.base_level_weight < 0.0 || config.spreading_weight < 0.0
    {
        return Err(MemoriaError::InvariantViolation(
            "retrieval weights must be non-negative".into(),
        ));
    }

    let probe_vector = resolve_probe(embedder, query);

    let candidates = load_candidates(conn, query)?;
    if candidates.is_empty() {
        let mode = match probe_vector {
            Some(_) => RetrievalMode::Similarity,
            None => RetrievalMode::RecencyFallback,
        };
        return Ok(RetrievalResponse {
            results: Vec::new(),
            mode,
            total_candidates: 0,
        });
    }

    let histories = load_access_histories(conn, query)?;

    let mut ranked = match &probe_vector {
        Some(probe) => {
            let embeddings = load_embeddings(conn)?;
            let incident = load_incident_edges(conn)?;
            score_by_similarity(
                candidates, probe, &embeddings, &incident, &histories, config, now_ms,
            )
        }
        None => score_by_base_level(candidates, &histories, config, now_ms),
    };

    // Sort by score, tie-break by most recent access, then id for determinism.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let last_a = last_access(&histories, &a.memory.id);
                let last_b = last_access(&histories, &b.memory.id);
                last_b.cmp(&last_a)
            })
            .then_with(|| a.memory.id.cmp(&b.memory.id))
    });

    let total_candidates = ranked.len();
    ranked.truncate(config.max_results);

    // Retrieval reinforcement: returned memories share the entry timestamp.
    reinforce(conn, &ranked, now_ms)?;

    let mode = match probe_vector {
        Some(_) => RetrievalMode::Similarity,
        None => RetrievalMode::RecencyFallback,
    };
    tracing::debug!(
        returned = ranked.len(),
        total_candidates,
        ?mode,
        "retrieval complete"
    );

    Ok(RetrievalResponse {
        results: ranked,
        mode,
        total_candidates,
    })
}

// ── Context assembly ──────────────────────────────────────────────────────────

/// One gist selected for the working context.
#[derive(Debug, Serialize)]
pub struct ContextEntry {
    pub id: String,
    pub gist: String,
    pub score: f64,
    pub tokens: usize,
}

/// Response from [`assemble_context`].
#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub entries: Vec<ContextEntry>,
    pub token_estimate: usize,
    /// e.g. `"3 memories, ~120 tokens"`.
    pub summary: String,
}

/// Assemble a token-budgeted working context for the current task.
///
/// Retrieves up to 10 candidates, drops weak matches (raw similarity below
/// the configured minimum), then greedily packs gists in ranked order until
/// the token budget (≈4 chars per token) is exhausted.
pub fn assemble_context(
    conn: &mut Connection,
    embedder: Option<&dyn Embedder>,
    task: &str,
    project_id: Option<&str>,
    config: &RetrievalConfig,
) -> Result<ContextResponse> {
    let mut retrieval_config = config.clone();
    retrieval_config.max_results = 10;

    let query = RetrievalQuery {
        probe: Probe::Text(task),
        kind: None,
        project_id,
        deadline: None,
    };
    let response = retrieve(conn, embedder, &query, &retrieval_config)?;

    let mut entries = Vec::new();
    let mut token_sum = 0usize;
    for ranked in response.results {
        if let Some(sim) = ranked.similarity {
            if sim < config.context_min_similarity {
                continue;
            }
        }
        let tokens = ranked.memory.gist.len() / 4;
        if !entries.is_empty() && token_sum + tokens > config.context_token_budget {
            break;
        }
        token_sum += tokens;
        entries.push(ContextEntry {
            id: ranked.memory.id,
            gist: ranked.memory.gist,
            score: ranked.score,
            tokens,
        });
    }

    let summary = format!("{} memories, ~{} tokens", entries.len(), token_sum);
    Ok(ContextResponse {
        entries,
        token_estimate: token_sum,
        summary,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Resolve the probe to a vector, or `None` for base-level fallback.
fn resolve_probe(embedder: Option<&dyn Embedder>, query: &RetrievalQuery<'_>) -> Option<Vec<f32>> {
    match &query.probe {
        Probe::Vector(v) => Some(v.clone()),
        Probe::Text(text) => {
            if let Some(deadline) = query.deadline {
                if Instant::now() >= deadline {
                    tracing::warn!("deadline expired before probe embedding, using fallback");
                    return None;
                }
            }
            let embedder = embedder?;
            match embedder.embed(text) {
                Ok(embedded) => Some(embedded.vector),
                Err(e) => {
                    tracing::warn!(error = %e, "probe embedding failed, using fallback");
                    None
                }
            }
        }
    }
}

fn load_candidates(conn: &Connection, query: &RetrievalQuery<'_>) -> Result<Vec<Memory>> {
    let kind = query.kind.map(|k| k.as_str());
    let mut stmt = conn.prepare(
        "SELECT id, kind, content, gist, emotional_weight, tags, project_id, access_count, created_at \
         FROM memories \
         WHERE (?1 IS NULL OR kind = ?1) AND (?2 IS NULL OR project_id = ?2)",
    )?;
    let rows = stmt
        .query_map(params![kind, query.project_id], row_to_memory)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_access_histories(
    conn: &Connection,
    query: &RetrievalQuery<'_>,
) -> Result<HashMap<String, Vec<i64>>> {
    let kind = query.kind.map(|k| k.as_str());
    let mut stmt = conn.prepare(
        "SELECT a.memory_id, a.accessed_at_ms FROM memory_accesses a \
         JOIN memories m ON a.memory_id = m.id \
         WHERE (?1 IS NULL OR m.kind = ?1) AND (?2 IS NULL OR m.project_id = ?2) \
         ORDER BY a.accessed_at_ms",
    )?;
    let mut histories: HashMap<String, Vec<i64>> = HashMap::new();
    let rows = stmt.query_map(params![kind, query.project_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (id, at) = row?;
        histories.entry(id).or_default().push(at);
    }
    Ok(histories)
}

/// All stored vectors, keyed by memory id. Spreading needs neighbors that
/// may sit outside the query's scope filter, so the map is unscoped.
fn load_embeddings(conn: &Connection) -> Result<HashMap<String, Vec<f32>>> {
    let mut stmt = conn.prepare("SELECT memory_id, vector FROM embeddings")?;
    let mut map = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
    })?;
    for row in rows {
        let (id, bytes) = row?;
        map.insert(id, bytes_to_vector(&bytes));
    }
    Ok(map)
}

/// Incident-edge lists for every memory, counting both directions of every
/// stored edge (the fan).
fn load_incident_edges(conn: &Connection) -> Result<HashMap<String, Vec<IncidentEdge>>> {
    let mut stmt = conn.prepare("SELECT source_id, target_id, strength FROM associations")?;
    let mut incident: HashMap<String, Vec<IncidentEdge>> = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;
    for row in rows {
        let (source, target, strength) = row?;
        incident.entry(source.clone()).or_default().push(IncidentEdge {
            other_id: target.clone(),
            strength,
        });
        incident.entry(target).or_default().push(IncidentEdge {
            other_id: source,
            strength,
        });
    }
    Ok(incident)
}

fn score_by_similarity(
    candidates: Vec<Memory>,
    probe: &[f32],
    embeddings: &HashMap<String, Vec<f32>>,
    incident: &HashMap<String, Vec<IncidentEdge>>,
    histories: &HashMap<String, Vec<i64>>,
    config: &RetrievalConfig,
    now_ms: i64,
) -> Vec<RankedMemory> {
    let empty: Vec<IncidentEdge> = Vec::new();
    candidates
        .into_iter()
        .filter_map(|memory| {
            // Similarity mode requires an embedding; skip rather than fail.
            let vector = embeddings.get(&memory.id)?;
            let sim = match cosine(probe, vector) {
                Ok(sim) => sim,
                // Stale-model vector with a different dimensionality —
                // pending regeneration, not an error for this candidate set.
                Err(_) => return None,
            };

            let probe_activation = cube(sim);
            let base = base_level(
                histories.get(&memory.id).map_or(&[][..], |h| h),
                now_ms,
                config.decay,
            );
            let spreading = spread(
                probe,
                incident.get(&memory.id).unwrap_or(&empty),
                embeddings,
            );

            let blended = config.probe_weight * probe_activation
                + config.base_level_weight * base
                + config.spreading_weight * spreading;
            // Emotional salience scales the blend; neutral weight 0.5 is
            // the identity.
            let score = blended * (1.0 + (memory.emotional_weight - 0.5));
            let probability =
                retrieval_probability(score, config.threshold, config.noise);

            if probability < config.min_probability {
                return None;
            }

            Some(RankedMemory {
                memory,
                similarity: Some(sim),
                probe_activation,
                base_level: base,
                spreading,
                score,
                probability,
            })
        })
        .collect()
}

/// Recency fallback: rank by base-level activation alone, no probability
/// filter (the logistic gate thresholds the blended signal, which does not
/// exist here).
fn score_by_base_level(
    candidates: Vec<Memory>,
    histories: &HashMap<String, Vec<i64>>,
    config: &RetrievalConfig,
    now_ms: i64,
) -> Vec<RankedMemory> {
    candidates
        .into_iter()
        .map(|memory| {
            let base = base_level(
                histories.get(&memory.id).map_or(&[][..], |h| h),
                now_ms,
                config.decay,
            );
            let probability = retrieval_probability(base, config.threshold, config.noise);
            RankedMemory {
                memory,
                similarity: None,
                probe_activation: 0.0,
                base_level: base,
                spreading: 0.0,
                score: base,
                probability,
            }
        })
        .collect()
}

fn last_access(histories: &HashMap<String, Vec<i64>>, memory_id: &str) -> i64 {
    histories
        .get(memory_id)
        .and_then(|h| h.last().copied())
        .unwrap_or(i64::MIN)
}

/// Append one access record per returned memory, all sharing `now_ms`.
fn reinforce(conn: &mut Connection, returned: &[RankedMemory], now_ms: i64) -> Result<()> {
    if returned.is_empty() {
        return Ok(());
    }
    let tx = conn.transaction()?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO memory_accesses (memory_id, accessed_at_ms) VALUES (?1, ?2)",
        )?;
        let mut bump =
            tx.prepare("UPDATE memories SET access_count = access_count + 1 WHERE id = ?1")?;
        for ranked in returned {
            insert.execute(params![ranked.memory.id, now_ms])?;
            bump.execute(params![ranked.memory.id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::embedding::EmbeddedText;
    use crate::memory::store::{store_memory, StoreOptions};

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    fn spike(dim: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; 16];
        v[dim % 16] = 1.0;
        v
    }

    fn insert_with_embedding(conn: &mut Connection, content: &str, vector: Vec<f32>) -> String {
        store_memory(
            conn,
            content,
            MemoryKind::Context,
            StoreOptions {
                embedding: Some(EmbeddedText {
                    vector,
                    model: "test-model".into(),
                }),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    fn open_config() -> RetrievalConfig {
        RetrievalConfig {
            min_probability: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn empty_store_returns_empty() {
        let mut conn = test_db();
        let response = retrieve(
            &mut conn,
            None,
            &RetrievalQuery::vector(spike(0)),
            &open_config(),
        )
        .unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.total_candidates, 0);
    }

    #[test]
    fn most_similar_ranks_first() {
        let mut conn = test_db();
        let id_match = insert_with_embedding(&mut conn, "matching", spike(0));
        let _id_other = insert_with_embedding(&mut conn, "other", spike(1));

        let response = retrieve(
            &mut conn,
            None,
            &RetrievalQuery::vector(spike(0)),
            &open_config(),
        )
        .unwrap();

        assert_eq!(response.mode, RetrievalMode::Similarity);
        assert_eq!(response.results[0].memory.id, id_match);
        assert!((response.results[0].similarity.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn candidates_without_embeddings_are_skipped_in_similarity_mode() {
        let mut conn = test_db();
        let _bare =
            store_memory(&mut conn, "bare", MemoryKind::Context, StoreOptions::default())
                .unwrap();
        let embedded = insert_with_embedding(&mut conn, "embedded", spike(0));

        let response = retrieve(
            &mut conn,
            None,
            &RetrievalQuery::vector(spike(0)),
            &open_config(),
        )
        .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].memory.id, embedded);
    }

    #[test]
    fn text_probe_without_embedder_falls_back_to_recency() {
        let mut conn = test_db();
        insert_with_embedding(&mut conn, "anything", spike(0));

        let response = retrieve(
            &mut conn,
            None,
            &RetrievalQuery::text("some probe"),
            &open_config(),
        )
        .unwrap();

        assert_eq!(response.mode, RetrievalMode::RecencyFallback);
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].similarity.is_none());
    }

    struct FailingEmbedder;
    impl Embedder for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<EmbeddedText> {
            Err(MemoriaError::ProviderFailure("connection refused".into()))
        }
        fn model(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn provider_failure_falls_back_not_fails() {
        let mut conn = test_db();
        insert_with_embedding(&mut conn, "anything", spike(0));

        let response = retrieve(
            &mut conn,
            Some(&FailingEmbedder),
            &RetrievalQuery::text("probe"),
            &open_config(),
        )
        .unwrap();

        assert_eq!(response.mode, RetrievalMode::RecencyFallback);
        assert_eq!(response.results.len(), 1);
    }

    #[test]
    fn expired_deadline_falls_back() {
        let mut conn = test_db();
        insert_with_embedding(&mut conn, "anything", spike(0));

        struct PanickingEmbedder;
        impl Embedder for PanickingEmbedder {
            fn embed(&self, _text: &str) -> Result<EmbeddedText> {
                panic!("must not be called after deadline");
            }
            fn model(&self) -> &str {
                "panicking"
            }
        }

        let query = RetrievalQuery {
            probe: Probe::Text("probe"),
            kind: None,
            project_id: None,
            deadline: Some(Instant::now() - std::time::Duration::from_millis(1)),
        };
        let response =
            retrieve(&mut conn, Some(&PanickingEmbedder), &query, &open_config()).unwrap();
        assert_eq!(response.mode, RetrievalMode::RecencyFallback);
    }

    #[test]
    fn kind_filter_restricts_candidates() {
        let mut conn = test_db();
        let bug = store_memory(
            &mut conn,
            "a bug",
            MemoryKind::Bug,
            StoreOptions {
                embedding: Some(EmbeddedText {
                    vector: spike(0),
                    model: "m".into(),
                }),
                ..Default::default()
            },
        )
        .unwrap()
        .id;
        insert_with_embedding(&mut conn, "a context", spike(0));

        let query = RetrievalQuery {
            probe: Probe::Vector(spike(0)),
            kind: Some(MemoryKind::Bug),
            project_id: None,
            deadline: None,
        };
        let response = retrieve(&mut conn, None, &query, &open_config()).unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].memory.id, bug);
    }

    #[test]
    fn min_probability_filters_weak_candidates() {
        let mut conn = test_db();
        // Orthogonal to the probe: sim 0, and base level is strongly
        // negative after backdating.
        let id = insert_with_embedding(&mut conn, "weak", spike(5));
        let month_ago = now_ms() - 30 * 86_400_000;
        conn.execute(
            "UPDATE memory_accesses SET accessed_at_ms = ?1 WHERE memory_id = ?2",
            params![month_ago, id],
        )
        .unwrap();

        let config = RetrievalConfig {
            min_probability: 0.1,
            ..Default::default()
        };
        let response = retrieve(
            &mut conn,
            None,
            &RetrievalQuery::vector(spike(0)),
            &config,
        )
        .unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn retrieval_reinforces_only_returned() {
        let mut conn = test_db();
        let returned = insert_with_embedding(&mut conn, "returned", spike(0));
        let skipped =
            store_memory(&mut conn, "no embedding", MemoryKind::Context, StoreOptions::default())
                .unwrap()
                .id;

        retrieve(
            &mut conn,
            None,
            &RetrievalQuery::vector(spike(0)),
            &open_config(),
        )
        .unwrap();

        let count_returned: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM memory_accesses WHERE memory_id = ?1",
                params![returned],
                |row| row.get(0),
            )
            .unwrap();
        let count_skipped: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM memory_accesses WHERE memory_id = ?1",
                params![skipped],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count_returned, 2); // creation + retrieval
        assert_eq!(count_skipped, 1); // creation only

        let access_count: u32 = conn
            .query_row(
                "SELECT access_count FROM memories WHERE id = ?1",
                params![returned],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(access_count, 2);
    }

    #[test]
    fn reinforcement_shares_one_timestamp() {
        let mut conn = test_db();
        insert_with_embedding(&mut conn, "first", spike(0));
        insert_with_embedding(&mut conn, "second", spike(0));

        let now = now_ms() + 10_000;
        retrieve_at(
            &mut conn,
            None,
            &RetrievalQuery::vector(spike(0)),
            &open_config(),
            now,
        )
        .unwrap();

        let stamps: Vec<i64> = conn
            .prepare("SELECT accessed_at_ms FROM memory_accesses WHERE accessed_at_ms = ?1")
            .unwrap()
            .query_map(params![now], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(stamps.len(), 2);
    }

    #[test]
    fn equal_scores_tie_break_by_id() {
        let mut conn = test_db();
        let now = now_ms();
        let mut ids = vec![
            insert_with_embedding(&mut conn, "twin a", spike(0)),
            insert_with_embedding(&mut conn, "twin b", spike(0)),
        ];
        // Equalize histories exactly
        conn.execute(
            "UPDATE memory_accesses SET accessed_at_ms = ?1",
            params![now - 1000],
        )
        .unwrap();

        let response = retrieve_at(
            &mut conn,
            None,
            &RetrievalQuery::vector(spike(0)),
            &open_config(),
            now,
        )
        .unwrap();

        ids.sort();
        let got: Vec<&str> = response.results.iter().map(|r| r.memory.id.as_str()).collect();
        assert_eq!(got, ids.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    }

    #[test]
    fn context_assembly_respects_budget_and_reports_summary() {
        let mut conn = test_db();
        for i in 0..6 {
            store_memory(
                &mut conn,
                &format!("memory number {i} with a reasonably sized gist line for budget math"),
                MemoryKind::Context,
                StoreOptions {
                    embedding: Some(EmbeddedText {
                        vector: spike(0),
                        model: "m".into(),
                    }),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let config = RetrievalConfig {
            min_probability: 0.0,
            context_token_budget: 40,
            ..Default::default()
        };
        let response = assemble_context(
            &mut conn,
            None,
            "anything",
            None,
            &config,
        )
        .unwrap();

        // Fallback mode (no embedder): similarity filter is skipped but the
        // budget still truncates.
        assert!(!response.entries.is_empty());
        assert!(response.entries.len() < 6);
        assert!(response.token_estimate <= 40 + 20);
        assert_eq!(
            response.summary,
            format!(
                "{} memories, ~{} tokens",
                response.entries.len(),
                response.token_estimate
            )
        );
    }

    struct StubEmbedder(Vec<f32>);
    impl Embedder for StubEmbedder {
        fn embed(&self, _text: &str) -> Result<EmbeddedText> {
            Ok(EmbeddedText {
                vector: self.0.clone(),
                model: "stub".into(),
            })
        }
        fn model(&self) -> &str {
            "stub"
        }
    }

    #[test]
    fn context_assembly_drops_weak_similarity() {
        let mut conn = test_db();
        let strong = insert_with_embedding(&mut conn, "strong match", spike(0));
        let _weak = insert_with_embedding(&mut conn, "orthogonal noise", spike(3));

        let config = RetrievalConfig {
            min_probability: 0.0,
            ..Default::default()
        };
        let embedder = StubEmbedder(spike(0));
        let response =
            assemble_context(&mut conn, Some(&embedder), "probe", None, &config).unwrap();

        // Only the strong match survives the similarity floor.
        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].id, strong);
    }
}

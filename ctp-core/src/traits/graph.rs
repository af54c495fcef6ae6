//! `PropertyGraph` — the graph-database collaborator consumed by
//! `ctp-graph` (§4.5, §6). Non-goals name "a specific property-graph
//! implementation" out of scope; this trait is the seam a real Neo4j/
//! memgraph adapter would implement, with an in-memory `petgraph`-backed
//! implementation in `ctp-testkit` standing in for tests.

use crate::errors::CtpError;
use crate::types::{Poi, Relationship};

pub type GraphResult<T> = Result<T, CtpError>;

/// One upsert unit: a node keyed by `semantic_id` plus its outbound edges.
#[derive(Debug, Clone)]
pub struct GraphUpsertBatch {
    pub pois: Vec<Poi>,
    pub relationships: Vec<Relationship>,
}

/// Summary of an upsert batch, for metrics and the `RunReport`.
#[derive(Debug, Clone, Default)]
pub struct GraphUpsertOutcome {
    pub nodes_upserted: usize,
    pub edges_upserted: usize,
    pub edges_skipped_orphan: usize,
}

/// Abstraction over the property graph that the pipeline builds into.
/// Implementations bulk-upsert in batches of `BATCH_SIZE` (§6) and must be
/// idempotent: re-applying the same batch leaves the graph unchanged.
pub trait PropertyGraph: Send + Sync {
    /// Create any indexes the implementation needs (e.g. on `semantic_id`).
    /// Must be safe to call repeatedly.
    fn ensure_indexes(&self) -> GraphResult<()>;

    /// Upsert a batch of nodes and edges. Edges whose endpoints are not
    /// present as nodes (in this batch or already in the graph) are
    /// reported as skipped, never inserted dangling (invariant I1).
    fn upsert_batch(&self, batch: &GraphUpsertBatch) -> GraphResult<GraphUpsertOutcome>;

    fn node_exists(&self, semantic_id: &str) -> GraphResult<bool>;
    fn node_count(&self) -> GraphResult<u64>;
    fn edge_count(&self) -> GraphResult<u64>;

    /// Find edges with no resolvable source or target node — used by the
    /// integrity gate's I1 check and its auto-repair pass.
    fn find_orphan_edges(&self) -> GraphResult<Vec<Relationship>>;

    /// Drop an edge by id, used by auto-repair once an orphan is confirmed.
    fn remove_edge(&self, relationship_id: &str) -> GraphResult<()>;
}

use serde::{Deserialize, Serialize};

use super::identifiers::{RelationshipId, SessionId, SubAgentId};

/// Triangulation session lifecycle (§3, §4.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Running,
    Completed,
    Failed,
}

/// One of the six independent sub-agent kinds (§4.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Syntactic,
    Semantic,
    Contextual,
    Architecture,
    Security,
    Performance,
}

impl AgentKind {
    /// The six kinds, in the fixed order the orchestrator spawns them.
    pub const ALL: [AgentKind; 6] = [
        Self::Syntactic,
        Self::Semantic,
        Self::Contextual,
        Self::Architecture,
        Self::Security,
        Self::Performance,
    ];

    /// Default consensus weight (§4.3.2): syntactic 0.25, semantic 0.30,
    /// contextual 0.25, any other ("triangulated-other") 0.20.
    pub fn default_weight(&self) -> f64 {
        match self {
            Self::Syntactic => 0.25,
            Self::Semantic => 0.30,
            Self::Contextual => 0.25,
            Self::Architecture | Self::Security | Self::Performance => 0.20,
        }
    }
}

/// One consensus attempt for a low-confidence relationship (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangulationSession {
    pub id: SessionId,
    pub relationship_id: RelationshipId,
    pub status: SessionStatus,
    pub final_confidence: Option<f64>,
    pub consensus_score: Option<f64>,
    pub strategy: String,
}

impl TriangulationSession {
    pub fn open(relationship_id: RelationshipId) -> Self {
        Self {
            id: SessionId::generate(),
            relationship_id,
            status: SessionStatus::Open,
            final_confidence: None,
            consensus_score: None,
            strategy: "default".to_string(),
        }
    }

    /// Invariant I5: a COMPLETED session has non-null `final_confidence` and
    /// `consensus_score`.
    pub fn satisfies_i5(&self) -> bool {
        self.status != SessionStatus::Completed
            || (self.final_confidence.is_some() && self.consensus_score.is_some())
    }
}

/// One of N independent verdicts within a session (§3). Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgentAnalysis {
    pub id: SubAgentId,
    pub session_id: SessionId,
    pub agent_kind: AgentKind,
    pub verdict_confidence: f64,
    pub reasoning: String,
}

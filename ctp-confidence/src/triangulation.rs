//! Slow-path triangulation orchestrator (§4.3.2): up to six independent
//! sub-agents vote on a low-confidence relationship; a weighted consensus
//! either resolves, fails, or asks for a retry under a different strategy.

use std::sync::Arc;

use regex::Regex;
use std::sync::LazyLock;

use ctp_core::errors::CtpError;
use ctp_core::traits::{LlmClient, PromptMode};
use ctp_core::types::{AgentKind, RelationshipType, SessionStatus, SubAgentAnalysis, TriangulationSession};

use crate::cancellation::CancellationToken;

static CONFIDENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)confidence[^0-9]{0,5}([01](?:\.\d+)?)").unwrap());

pub const CONSENSUS_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone)]
pub enum TriangulationOutcome {
    Completed { final_confidence: f64, consensus_score: f64, analyses: Vec<SubAgentAnalysis> },
    Failed { consensus_score: f64, analyses: Vec<SubAgentAnalysis> },
    Requeue { strategy: String },
    Cancelled,
}

/// Minimal context the orchestrator needs about the relationship under
/// triangulation; callers assemble this from storage (source/target POI
/// descriptions, current reason, evidence).
#[derive(Debug, Clone)]
pub struct TriangulationContext {
    pub from_description: String,
    pub to_description: String,
    pub relationship_type: RelationshipType,
    pub reason: String,
}

pub struct TriangulationOrchestrator {
    llm: Arc<dyn LlmClient>,
    parallelism: usize,
    max_retries: u32,
}

impl TriangulationOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, parallelism: usize, max_retries: u32) -> Self {
        Self { llm, parallelism: parallelism.min(AgentKind::ALL.len()), max_retries }
    }

    fn build_prompt(kind: AgentKind, ctx: &TriangulationContext) -> String {
        format!(
            "You are the {:?} triangulation sub-agent. Evaluate whether a {} relationship \
             from `{}` to `{}` is correct. Prior reasoning: {}. \
             Respond with a confidence between 0 and 1 and a short justification.",
            kind,
            ctx.relationship_type.as_str(),
            ctx.from_description,
            ctx.to_description,
            ctx.reason,
        )
    }

    fn parse_verdict(text: &str) -> (f64, String) {
        let confidence = CONFIDENCE_PATTERN
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);
        (confidence, text.trim().to_string())
    }

    async fn run_sub_agent(
        &self,
        kind: AgentKind,
        session_id: &ctp_core::types::identifiers::SessionId,
        ctx: &TriangulationContext,
    ) -> Result<SubAgentAnalysis, CtpError> {
        let prompt = Self::build_prompt(kind, ctx);
        let response = self.llm.analyze(&prompt, PromptMode::Triangulated).await?;
        let (confidence, reasoning) = Self::parse_verdict(&response.text);
        Ok(SubAgentAnalysis {
            id: ctp_core::types::identifiers::SubAgentId::generate(),
            session_id: session_id.clone(),
            agent_kind: kind,
            verdict_confidence: confidence,
            reasoning,
        })
    }

    /// Run one triangulation attempt. `attempt` is 1-indexed; callers
    /// track attempts across requeues and stop once `max_retries` is hit.
    pub async fn run(
        &self,
        session: &mut TriangulationSession,
        ctx: &TriangulationContext,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> Result<TriangulationOutcome, CtpError> {
        session.status = SessionStatus::Running;

        let mut analyses = Vec::with_capacity(self.parallelism);
        for kind in AgentKind::ALL.into_iter().take(self.parallelism) {
            if cancel.is_cancelled() {
                session.status = SessionStatus::Failed;
                return Ok(TriangulationOutcome::Cancelled);
            }
            analyses.push(self.run_sub_agent(kind, &session.id, ctx).await?);
        }

        if cancel.is_cancelled() {
            session.status = SessionStatus::Failed;
            return Ok(TriangulationOutcome::Cancelled);
        }

        let weighted_sum: f64 = analyses.iter().map(|a| a.verdict_confidence * a.agent_kind.default_weight()).sum();
        let total_weight: f64 = analyses.iter().map(|a| a.agent_kind.default_weight()).sum();
        let final_confidence = if total_weight > 0.0 { weighted_sum / total_weight } else { 0.0 };

        let n = analyses.len() as f64;
        let mean: f64 = analyses.iter().map(|a| a.verdict_confidence).sum::<f64>() / n;
        let variance: f64 =
            analyses.iter().map(|a| (a.verdict_confidence - mean).powi(2)).sum::<f64>() / n;
        let consensus_score = (1.0 - variance).clamp(0.0, 1.0);

        if consensus_score >= CONSENSUS_THRESHOLD {
            session.status = SessionStatus::Completed;
            session.final_confidence = Some(final_confidence);
            session.consensus_score = Some(consensus_score);
            Ok(TriangulationOutcome::Completed { final_confidence, consensus_score, analyses })
        } else if attempt >= self.max_retries {
            session.status = SessionStatus::Failed;
            Ok(TriangulationOutcome::Failed { consensus_score, analyses })
        } else {
            session.status = SessionStatus::Open;
            Ok(TriangulationOutcome::Requeue { strategy: format!("retry-{}", attempt + 1) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_core::types::identifiers::RelationshipId;
    use ctp_testkit::FakeLlmClient;

    fn ctx() -> TriangulationContext {
        TriangulationContext {
            from_description: "fn a()".to_string(),
            to_description: "fn b()".to_string(),
            relationship_type: RelationshipType::Calls,
            reason: "a calls b".to_string(),
        }
    }

    #[tokio::test]
    async fn high_agreement_completes_with_consensus() {
        let llm = Arc::new(FakeLlmClient::always("confidence: 0.9 reasoning: consistent evidence"));
        let orchestrator = TriangulationOrchestrator::new(llm, 6, 3);
        let mut session = TriangulationSession::open(RelationshipId::generate());
        let outcome = orchestrator.run(&mut session, &ctx(), 1, &CancellationToken::new()).await.unwrap();
        match outcome {
            TriangulationOutcome::Completed { consensus_score, .. } => assert!(consensus_score >= CONSENSUS_THRESHOLD),
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.satisfies_i5());
    }

    #[tokio::test]
    async fn cancellation_before_any_agent_runs_yields_cancelled() {
        let llm = Arc::new(FakeLlmClient::always("confidence: 0.9"));
        let orchestrator = TriangulationOrchestrator::new(llm, 6, 3);
        let mut session = TriangulationSession::open(RelationshipId::generate());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = orchestrator.run(&mut session, &ctx(), 1, &cancel).await.unwrap();
        assert!(matches!(outcome, TriangulationOutcome::Cancelled));
        assert_eq!(session.status, SessionStatus::Failed);
    }

    #[tokio::test]
    async fn disagreement_requeues_before_retries_exhausted() {
        let llm = Arc::new(FakeLlmClient::scripted(vec![
            mk("0.9"), mk("0.1"), mk("0.9"), mk("0.1"), mk("0.9"), mk("0.1"),
        ]));
        let orchestrator = TriangulationOrchestrator::new(llm, 6, 3);
        let mut session = TriangulationSession::open(RelationshipId::generate());
        let outcome = orchestrator.run(&mut session, &ctx(), 1, &CancellationToken::new()).await.unwrap();
        assert!(matches!(outcome, TriangulationOutcome::Requeue { .. }));
    }

    #[tokio::test]
    async fn disagreement_at_final_retry_fails() {
        let llm = Arc::new(FakeLlmClient::scripted(vec![
            mk("0.9"), mk("0.1"), mk("0.9"), mk("0.1"), mk("0.9"), mk("0.1"),
        ]));
        let orchestrator = TriangulationOrchestrator::new(llm, 6, 3);
        let mut session = TriangulationSession::open(RelationshipId::generate());
        let outcome = orchestrator.run(&mut session, &ctx(), 3, &CancellationToken::new()).await.unwrap();
        assert!(matches!(outcome, TriangulationOutcome::Failed { .. }));
        assert_eq!(session.status, SessionStatus::Failed);
    }

    fn mk(confidence: &str) -> ctp_core::traits::LlmResponse {
        ctp_core::traits::LlmResponse {
            text: format!("confidence: {confidence} reasoning: scripted"),
            usage: Default::default(),
        }
    }
}

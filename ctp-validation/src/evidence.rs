//! Stage 2: evidence collection (§4.4). Gathers supporting material from
//! three sources: the candidate's own row, POI descriptions of its
//! endpoints, and sibling relationships sharing an endpoint.

use chrono::{DateTime, Utc};

use crate::candidate::RelationshipCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceSource {
    OwnRow,
    EndpointDescription,
    SiblingRelationship,
}

#[derive(Debug, Clone)]
pub struct EvidenceItem {
    pub source: EvidenceSource,
    pub content: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// `descriptions` maps a POI's `semantic_id` to its description text.
pub fn collect_evidence(
    candidate: &RelationshipCandidate,
    descriptions: &std::collections::HashMap<String, String>,
    siblings: &[RelationshipCandidate],
) -> Vec<EvidenceItem> {
    let mut items = vec![EvidenceItem {
        source: EvidenceSource::OwnRow,
        content: format!("{} -> {} ({:?})", candidate.from, candidate.to, candidate.relationship_type),
        confidence: candidate.confidence,
        timestamp: candidate.observed_at,
    }];

    for endpoint in [&candidate.from, &candidate.to] {
        if let Some(description) = descriptions.get(endpoint) {
            items.push(EvidenceItem {
                source: EvidenceSource::EndpointDescription,
                content: description.clone(),
                confidence: candidate.confidence,
                timestamp: candidate.observed_at,
            });
        }
    }

    for sibling in siblings {
        let shares_endpoint = sibling.from == candidate.from
            || sibling.to == candidate.to
            || sibling.from == candidate.to
            || sibling.to == candidate.from;
        if shares_endpoint && sibling.relationship_id != candidate.relationship_id {
            items.push(EvidenceItem {
                source: EvidenceSource::SiblingRelationship,
                content: format!("{} -> {} ({:?})", sibling.from, sibling.to, sibling.relationship_type),
                confidence: sibling.confidence,
                timestamp: sibling.observed_at,
            });
        }
    }

    items
}

/// Aggregate evidence strength: mean confidence across all items, the
/// signal resolution strategies use when comparing competing candidates.
pub fn evidence_strength(items: &[EvidenceItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|i| i.confidence).sum::<f64>() / items.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_core::types::identifiers::RelationshipId;
    use ctp_core::types::{RelationshipType, SourceMode};

    use crate::candidate::Scope;
    use std::collections::HashMap;

    fn candidate(from: &str, to: &str) -> RelationshipCandidate {
        RelationshipCandidate {
            relationship_id: RelationshipId::generate(),
            from: from.to_string(),
            to: to.to_string(),
            relationship_type: RelationshipType::Calls,
            confidence: 0.6,
            scope: Scope::File,
            source_mode: SourceMode::Batch,
            observed_at: Utc::now(),
            priority: 0.0,
        }
    }

    #[test]
    fn collects_own_row_endpoint_and_sibling_evidence() {
        let c = candidate("a", "b");
        let sibling = candidate("b", "c");
        let mut descriptions = HashMap::new();
        descriptions.insert("a".to_string(), "fn a does x".to_string());

        let items = collect_evidence(&c, &descriptions, &[sibling]);
        assert!(items.iter().any(|i| i.source == EvidenceSource::OwnRow));
        assert!(items.iter().any(|i| i.source == EvidenceSource::EndpointDescription));
        assert!(items.iter().any(|i| i.source == EvidenceSource::SiblingRelationship));
    }

    #[test]
    fn evidence_strength_averages_confidence() {
        let items = vec![
            EvidenceItem { source: EvidenceSource::OwnRow, content: String::new(), confidence: 0.8, timestamp: Utc::now() },
            EvidenceItem { source: EvidenceSource::OwnRow, content: String::new(), confidence: 0.4, timestamp: Utc::now() },
        ];
        assert!((evidence_strength(&items) - 0.6).abs() < 1e-9);
    }
}

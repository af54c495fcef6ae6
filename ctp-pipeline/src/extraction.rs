//! File-analysis stage (§4.1's `file-analysis` queue, conceptually): turns
//! one walked file into candidate POIs and relationships via the LLM
//! collaborator. The prompt/response schema is a placeholder for the real
//! extraction contract — `spec.md` names LLM prompt content a Non-goal, so
//! only the envelope shape this pipeline expects is fixed here.

use serde::Deserialize;

use ctp_core::errors::CtpError;
use ctp_core::traits::{FileWalker as _, LlmClient, PromptMode, WalkedFile};
use ctp_core::types::{PoiType, RelationshipType};

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedPoi {
    pub semantic_id: Option<String>,
    pub name: String,
    pub poi_type: PoiType,
    #[serde(default = "default_line")]
    pub start_line: u32,
    #[serde(default = "default_line")]
    pub end_line: u32,
    #[serde(default)]
    pub description: String,
}

fn default_line() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedRelationship {
    pub from: String,
    pub to: String,
    pub relationship_type: RelationshipType,
    pub reason: String,
    #[serde(default)]
    pub evidence_items: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub pois: Vec<ExtractedPoi>,
    #[serde(default)]
    pub relationships: Vec<ExtractedRelationship>,
}

fn parse_extraction(text: &str) -> Result<ExtractionResult, CtpError> {
    serde_json::from_str(text).map_err(|e| CtpError::Contract(format!("malformed extraction response: {e}")))
}

/// Call the LLM once per file in batch mode and parse its structured
/// response. Returns a `CONTRACT` error (never fatal to the run) if the
/// response doesn't parse.
pub async fn analyze_file(llm: &dyn LlmClient, file: &WalkedFile) -> Result<ExtractionResult, CtpError> {
    let prompt = format!(
        "Analyze `{}` (content hash {}, {} bytes) and report its points of interest \
         and relationships as JSON: {{\"pois\": [...], \"relationships\": [...]}}.",
        file.path, file.content_hash, file.size_bytes
    );
    let response = llm.analyze(&prompt, PromptMode::Batch).await?;
    parse_extraction(&response.text)
}

/// Drain a walker into its full file list. Walkers are restartable and
/// finite (§6); the orchestrator owns no cursor beyond this call.
pub fn drain_walker(walker: &mut dyn FileWalker) -> Result<Vec<WalkedFile>, CtpError> {
    let mut files = Vec::new();
    while let Some(file) = walker.next_file()? {
        files.push(file);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_testkit::FakeLlmClient;

    #[tokio::test]
    async fn parses_a_well_formed_extraction_response() {
        let llm = FakeLlmClient::always(
            r#"{"pois":[{"name":"a","poi_type":"function","start_line":1,"end_line":2}],
                "relationships":[{"from":"a","to":"b","relationship_type":"CALLS","reason":"a calls b"}]}"#,
        );
        let file = WalkedFile { path: "a.rs".to_string(), content_hash: "h".to_string(), size_bytes: 10 };
        let result = analyze_file(&llm, &file).await.unwrap();
        assert_eq!(result.pois.len(), 1);
        assert_eq!(result.relationships.len(), 1);
    }

    #[tokio::test]
    async fn malformed_response_is_a_contract_error() {
        let llm = FakeLlmClient::always("not json");
        let file = WalkedFile { path: "a.rs".to_string(), content_hash: "h".to_string(), size_bytes: 10 };
        let err = analyze_file(&llm, &file).await.unwrap_err();
        assert!(matches!(err, CtpError::Contract(_)));
    }
}

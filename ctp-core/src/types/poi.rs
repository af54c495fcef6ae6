use serde::{Deserialize, Serialize};

use super::identifiers::{FileId, PoiId, RunId};

/// A POI's kind, per §3's data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiType {
    File,
    Class,
    Function,
    Variable,
    Import,
    Export,
    Table,
    View,
    Index,
    Trigger,
}

impl PoiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Class => "class",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Import => "import",
            Self::Export => "export",
            Self::Table => "table",
            Self::View => "view",
            Self::Index => "index",
            Self::Trigger => "trigger",
        }
    }
}

/// A named entity inside a file (§3). `semantic_id` is unique per
/// `(run_id, semantic_id)` — invariant I4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    pub id: PoiId,
    pub file_id: FileId,
    pub run_id: RunId,
    pub semantic_id: String,
    pub name: String,
    pub poi_type: PoiType,
    pub start_line: u32,
    pub end_line: u32,
    pub description: String,
}

impl Poi {
    /// `semantic_id = type:name@path:start_line`; file-type POIs use the
    /// path alone (§3, glossary).
    pub fn compute_semantic_id(poi_type: PoiType, name: &str, path: &str, start_line: u32) -> String {
        if poi_type == PoiType::File {
            path.to_string()
        } else {
            format!("{}:{}@{}:{}", poi_type.as_str(), name, path, start_line)
        }
    }

    /// Invariant I6: a POI referenced by a VALIDATED relationship must have
    /// a non-empty name and type. Type is always present (it's an enum), so
    /// this only checks the name.
    pub fn satisfies_i6(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

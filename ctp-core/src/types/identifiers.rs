//! Newtype identifiers. Kept as thin `String` wrappers (not interned) since
//! the pipeline's hot path is I/O-bound on the relational store and LLM
//! calls, not identifier comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(RunId);
string_id!(FileId);
string_id!(PoiId);
string_id!(RelationshipId);
string_id!(EvidenceId);
string_id!(SessionId);
string_id!(SubAgentId);
string_id!(OutboxEventId);
string_id!(JobId);

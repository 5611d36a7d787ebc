use crate::diagnostic::ToolInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRecord {
    pub schema: String,
    pub tool: ToolInfo,

    /// False for dry runs.
    pub applied: bool,

    #[serde(default)]
    pub preconditions: ApplyPreconditions,

    #[serde(default)]
    pub results: Vec<FileApplyResult>,

    pub summary: ApplySummary,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ApplyRecord {
    pub fn new(tool: ToolInfo) -> Self {
        Self {
            schema: crate::schema::ABSFIX_APPLY_V1.to_string(),
            tool,
            applied: false,
            preconditions: ApplyPreconditions::default(),
            results: vec![],
            summary: ApplySummary::default(),
            ended_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyPreconditions {
    pub verified: bool,

    #[serde(default)]
    pub mismatches: Vec<PreconditionMismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreconditionMismatch {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileApplyResult {
    pub path: String,
    pub status: ApplyStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub classes: u64,
    pub stubs_inserted: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    Applied,
    Blocked,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplySummary {
    pub attempted: u64,
    pub applied: u64,
    pub blocked: u64,
    pub failed: u64,
    pub files_modified: u64,
}

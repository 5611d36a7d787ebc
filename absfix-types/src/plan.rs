use crate::diagnostic::{DiagnosticRef, ToolInfo};
use crate::edit::{EditSet, StubPolicy};
use serde::{Deserialize, Serialize};

/// Machine-readable plan artifact: the edit set plus everything needed to review it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairPlan {
    pub schema: String,
    pub tool: ToolInfo,

    #[serde(default)]
    pub inputs: Vec<PlanInput>,

    pub policy: PlanPolicy,

    pub edits: EditSet,

    /// Classes the batch could not repair.
    #[serde(default)]
    pub failures: Vec<UnrepairedClass>,

    #[serde(default)]
    pub blocked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason_token: Option<String>,

    pub summary: PlanSummary,
}

impl RepairPlan {
    pub fn new(tool: ToolInfo, policy: PlanPolicy) -> Self {
        Self {
            schema: crate::schema::ABSFIX_PLAN_V1.to_string(),
            tool,
            inputs: vec![],
            policy,
            edits: EditSet::new(),
            failures: vec![],
            blocked: false,
            blocked_reason: None,
            blocked_reason_token: None,
            summary: PlanSummary::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInput {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanPolicy {
    #[serde(default)]
    pub stub_policy: StubPolicy,

    #[serde(default)]
    pub require_clean_hashes: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_classes: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    pub diagnostics_total: u64,
    pub diagnostics_ignored: u64,
    pub files_touched: u64,
    pub classes_repaired: u64,
    pub stubs_total: u64,
    pub members_skipped: u64,
    pub classes_failed: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_bytes: Option<u64>,
}

/// A class the batch had to leave alone, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnrepairedClass {
    pub diagnostic: DiagnosticRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Stable token, see [`failure_tokens`].
    pub reason_token: String,

    pub reason: String,
}

/// Stable tokens for unrepaired classes and blocked plans.
pub mod failure_tokens {
    pub const NOT_A_CLASS: &str = "not_a_class";
    pub const UNRESOLVABLE_BASE_TYPE: &str = "unresolvable_base_type";
    pub const NO_SUPPORTED_MEMBERS: &str = "no_supported_members";
    pub const MAX_FILES: &str = "max_files";
    pub const MAX_CLASSES: &str = "max_classes";
}

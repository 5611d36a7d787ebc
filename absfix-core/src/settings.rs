//! Clap-free settings for plan and apply pipelines.

use absfix_types::edit::StubPolicy;
use camino::Utf8PathBuf;

/// Settings for the plan pipeline.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub repo_root: Utf8PathBuf,
    pub artifacts_dir: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    // Stubs
    pub stub_policy: StubPolicy,
    pub indent_unit: String,
    pub newline: Option<String>,

    // Caps
    pub max_files: Option<u64>,
    pub max_classes: Option<u64>,

    // Preconditions
    pub require_clean_hashes: bool,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            repo_root: Utf8PathBuf::from("."),
            artifacts_dir: Utf8PathBuf::from("artifacts"),
            out_dir: Utf8PathBuf::from("artifacts/absfix"),
            stub_policy: StubPolicy::default(),
            indent_unit: "    ".to_string(),
            newline: None,
            max_files: None,
            max_classes: None,
            require_clean_hashes: true,
        }
    }
}

/// Settings for the apply pipeline.
#[derive(Debug, Clone)]
pub struct ApplySettings {
    pub repo_root: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    pub dry_run: bool,

    // Layout of inserted blocks
    pub indent_unit: String,
    pub newline: Option<String>,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            repo_root: Utf8PathBuf::from("."),
            out_dir: Utf8PathBuf::from("artifacts/absfix"),
            dry_run: true,
            indent_unit: "    ".to_string(),
            newline: None,
        }
    }
}

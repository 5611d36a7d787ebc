//! Edit engine for absfix edit sets.
//!
//! Responsibilities:
//! - Attach file preconditions (sha256) to an edit set.
//! - Splice stub blocks into source text at their anchors (in-memory or to disk).
//! - Generate a unified diff preview.

mod buffer;
mod error;

pub use buffer::{PatchApplier, SourceBuffer, detect_newline};
pub use error::{EditError, EditResult, PolicyBlockError};

use absfix_types::apply::{
    ApplyPreconditions, ApplyRecord, ApplyStatus, FileApplyResult, PreconditionMismatch,
};
use absfix_types::diagnostic::ToolInfo;
use absfix_types::edit::{ClassEdit, EditSet, FileEdit, FormattingHint};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use diffy::PatchFormatter;
use fs_err as fs;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub dry_run: bool,

    /// Refuse to touch files whose sha256 differs from the one recorded at plan time.
    pub require_clean_hashes: bool,

    pub indent_unit: String,

    /// `None` keeps each file's own newline convention.
    pub newline: Option<String>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            require_clean_hashes: true,
            indent_unit: FormattingHint::default().indent_unit,
            newline: None,
        }
    }
}

impl ApplyOptions {
    fn hint_for(&self, source: &str) -> FormattingHint {
        FormattingHint {
            newline: self
                .newline
                .clone()
                .unwrap_or_else(|| detect_newline(source).to_string()),
            indent_unit: self.indent_unit.clone(),
        }
    }
}

/// Record the sha256 of every touched file, as read from `repo_root`.
pub fn attach_preconditions(repo_root: &Utf8Path, edits: &mut EditSet) -> anyhow::Result<()> {
    for file in edits.files.iter_mut() {
        let abs = abs_path(repo_root, &file.path);
        let bytes = fs::read(&abs).with_context(|| format!("read {}", abs))?;
        file.sha256 = Some(sha256_hex(&bytes));
    }
    Ok(())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn abs_path(repo_root: &Utf8Path, rel: &Utf8Path) -> Utf8PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        repo_root.join(rel)
    }
}

/// The block inserted for one class: its stubs, one after another.
pub fn class_block(edit: &ClassEdit) -> String {
    edit.stubs
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Apply every class edit of `file` to `contents`. A file's edits land together or not at all.
pub fn render_file_edit(
    contents: &str,
    file: &FileEdit,
    hint: &FormattingHint,
) -> EditResult<String> {
    let mut buf = SourceBuffer::new(contents);
    for class in &file.classes {
        buf.insert_after(class.anchor, &class_block(class), hint)
            .map_err(|e| match e {
                EditError::PolicyBlock(PolicyBlockError::AnchorMismatch { message }) => {
                    PolicyBlockError::AnchorMismatch {
                        message: format!("{} ({}): {message}", file.path, class.display_name()),
                    }
                    .into()
                }
                other => other,
            })?;
    }
    Ok(buf.render())
}

pub fn preview_patch(
    repo_root: &Utf8Path,
    edits: &EditSet,
    opts: &ApplyOptions,
) -> anyhow::Result<String> {
    let outcome = execute(repo_root, edits, opts)?;
    Ok(render_patch(&outcome.before, &outcome.after))
}

/// Apply an edit set. When `opts.dry_run` is true, no files are written, but results and a
/// patch are still produced.
pub fn apply_edit_set(
    repo_root: &Utf8Path,
    edits: &EditSet,
    tool: ToolInfo,
    opts: &ApplyOptions,
) -> anyhow::Result<(ApplyRecord, String)> {
    let outcome = execute(repo_root, edits, opts)?;
    let patch = render_patch(&outcome.before, &outcome.after);

    let mut record = ApplyRecord::new(tool);
    record.applied = !opts.dry_run;
    record.preconditions = outcome.preconditions;
    record.results = outcome.results;
    record.summary.attempted = outcome.attempted;

    if !opts.dry_run {
        // Write only changed files.
        for (path, new_contents) in &outcome.after {
            let old = outcome.before.get(path).map(String::as_str).unwrap_or_default();
            if old == new_contents.as_str() {
                continue;
            }
            let abs = abs_path(repo_root, path);
            fs::write(&abs, new_contents).with_context(|| format!("write {}", abs))?;
            record.summary.files_modified += 1;
        }
    }

    for r in &record.results {
        match r.status {
            ApplyStatus::Applied => record.summary.applied += 1,
            ApplyStatus::Blocked => record.summary.blocked += 1,
            ApplyStatus::Failed => record.summary.failed += 1,
            ApplyStatus::Skipped => {}
        }
    }
    record.ended_at = Some(Utc::now());

    info!(
        dry_run = opts.dry_run,
        attempted = record.summary.attempted,
        applied = record.summary.applied,
        blocked = record.summary.blocked,
        failed = record.summary.failed,
        "apply finished"
    );
    Ok((record, patch))
}

/// Turn a blocked apply record into the matching policy error, if any file was blocked.
pub fn check_policy_block(record: &ApplyRecord) -> Option<PolicyBlockError> {
    if !record.preconditions.verified {
        let paths: Vec<_> = record
            .preconditions
            .mismatches
            .iter()
            .map(|m| m.path.as_str())
            .collect();
        return Some(PolicyBlockError::PreconditionMismatch {
            message: format!("changed since plan: {}", paths.join(", ")),
        });
    }
    // Hash-blocked files were reported above; what is left are anchors that no longer fit.
    let anchors: Vec<_> = record
        .results
        .iter()
        .filter(|r| r.status == ApplyStatus::Blocked)
        .filter_map(|r| r.message.as_deref())
        .collect();
    if !anchors.is_empty() {
        return Some(PolicyBlockError::AnchorMismatch {
            message: anchors.join("; "),
        });
    }
    None
}

struct ExecuteOutcome {
    before: BTreeMap<Utf8PathBuf, String>,
    after: BTreeMap<Utf8PathBuf, String>,
    preconditions: ApplyPreconditions,
    results: Vec<FileApplyResult>,
    attempted: u64,
}

fn execute(
    repo_root: &Utf8Path,
    edits: &EditSet,
    opts: &ApplyOptions,
) -> anyhow::Result<ExecuteOutcome> {
    let mut before = BTreeMap::new();
    let mut after = BTreeMap::new();
    let mut preconditions = ApplyPreconditions {
        verified: true,
        mismatches: vec![],
    };
    let mut results = Vec::new();
    let mut attempted = 0;

    for file in &edits.files {
        if file.classes.is_empty() {
            continue;
        }
        let abs = abs_path(repo_root, &file.path);
        let contents = fs::read_to_string(&abs).with_context(|| format!("read {}", abs))?;
        let actual_sha = sha256_hex(contents.as_bytes());

        let mut result = FileApplyResult {
            path: file.path.to_string(),
            status: ApplyStatus::Skipped,
            message: None,
            classes: file.classes.len() as u64,
            stubs_inserted: 0,
            sha256_before: Some(actual_sha.clone()),
            sha256_after: None,
        };

        if let Some(expected) = &file.sha256
            && expected != &actual_sha
        {
            warn!(path = %file.path, "file changed since plan");
            preconditions.mismatches.push(PreconditionMismatch {
                path: file.path.to_string(),
                expected: expected.clone(),
                actual: actual_sha.clone(),
            });
            if opts.require_clean_hashes {
                preconditions.verified = false;
                result.status = ApplyStatus::Blocked;
                result.message = Some("sha256 mismatch: file changed since plan".to_string());
                results.push(result);
                continue;
            }
        }

        attempted += 1;
        let hint = opts.hint_for(&contents);
        match render_file_edit(&contents, file, &hint) {
            Ok(new_contents) => {
                debug!(path = %file.path, classes = file.classes.len(), "rendered insertions");
                result.stubs_inserted = file.classes.iter().map(|c| c.stubs.len() as u64).sum();
                result.sha256_after = Some(sha256_hex(new_contents.as_bytes()));
                if opts.dry_run {
                    result.message = Some("dry-run: not written".to_string());
                } else {
                    result.status = ApplyStatus::Applied;
                }
                before.insert(file.path.clone(), contents);
                after.insert(file.path.clone(), new_contents);
            }
            Err(e) => {
                warn!(path = %file.path, error = %e, "edits do not fit file");
                result.status = if e.is_policy_block() {
                    ApplyStatus::Blocked
                } else {
                    ApplyStatus::Failed
                };
                result.message = Some(e.to_string());
            }
        }
        results.push(result);
    }

    Ok(ExecuteOutcome {
        before,
        after,
        preconditions,
        results,
        attempted,
    })
}

pub fn render_patch(
    before: &BTreeMap<Utf8PathBuf, String>,
    after: &BTreeMap<Utf8PathBuf, String>,
) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for (path, old) in before {
        let new = after.get(path).unwrap_or(old);
        if old == new {
            continue;
        }

        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

        let patch = diffy::create_patch(old, new);
        // diffy prints its own ---/+++ header; keep only the hunks.
        let body = formatter.fmt_patch(&patch).to_string();
        for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

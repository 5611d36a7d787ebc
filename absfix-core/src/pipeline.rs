//! Core plan and apply pipelines, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: reports, the program model and artifact writes all go
//! through the port traits. Only the repository files being edited are read directly.

use crate::ports::{DiagnosticSource, ProgramSource, WritePort};
use crate::settings::{ApplySettings, PlanSettings};
use absfix_diagnostics::{LoadedReport, collect_diagnostics};
use absfix_domain::{RepairAggregator, StubSynthesizer};
use absfix_edit::{
    ApplyOptions, apply_edit_set, attach_preconditions, check_policy_block, preview_patch,
};
use absfix_render::{render_apply_md, render_plan_md};
use absfix_types::apply::{ApplyRecord, ApplyStatus, FileApplyResult};
use absfix_types::diagnostic::ToolInfo;
use absfix_types::plan::{PlanInput, PlanPolicy, RepairPlan, failure_tokens};
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use tracing::{info, warn};

/// Error type for pipeline results.  Exit code 2 = policy block, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("policy block")]
    PolicyBlock,
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::PolicyBlock => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Outcome of `run_plan`.
pub struct PlanOutcome {
    pub plan: RepairPlan,
    pub patch: String,
    pub policy_block: bool,
}

/// Run the plan pipeline. Returns the plan and its patch preview.
///
/// The caller is responsible for writing artifacts to disk (via `WritePort`)
/// or the convenience `write_plan_artifacts` helper.
pub fn run_plan(
    settings: &PlanSettings,
    diagnostics_port: &dyn DiagnosticSource,
    program_port: &dyn ProgramSource,
    tool: ToolInfo,
) -> Result<PlanOutcome, ToolError> {
    let reports = diagnostics_port.load_reports()?;
    for r in &reports {
        if let Err(e) = &r.report {
            warn!(path = %r.path, error = %e, "unreadable diagnostics report");
        }
    }
    let diagnostics = collect_diagnostics(&reports);
    let program = program_port.load_program().context("load program model")?;

    let synth = StubSynthesizer::new(settings.stub_policy, settings.indent_unit.clone());
    let aggregator = RepairAggregator::new(&program, &program).with_synthesizer(synth);
    let (mut edits, failures) = match aggregator.repair_all(&diagnostics) {
        Ok(edits) => (edits, vec![]),
        Err(partial) => (partial.edits, partial.failures),
    };

    let mut plan = RepairPlan::new(
        tool,
        PlanPolicy {
            stub_policy: settings.stub_policy,
            require_clean_hashes: settings.require_clean_hashes,
            max_files: settings.max_files,
            max_classes: settings.max_classes,
        },
    );
    plan.inputs = plan_inputs(&reports);

    if settings.require_clean_hashes {
        attach_preconditions(&settings.repo_root, &mut edits).context("attach preconditions")?;
    }

    let preview_opts = ApplyOptions {
        dry_run: true,
        require_clean_hashes: false,
        indent_unit: settings.indent_unit.clone(),
        newline: settings.newline.clone(),
    };
    let mut patch =
        preview_patch(&settings.repo_root, &edits, &preview_opts).context("preview patch")?;

    plan.summary.diagnostics_total = diagnostics.len() as u64;
    plan.summary.diagnostics_ignored =
        diagnostics.iter().filter(|d| !d.is_recognized()).count() as u64;
    plan.summary.files_touched = edits.files.len() as u64;
    plan.summary.classes_repaired = edits.class_count() as u64;
    plan.summary.stubs_total = edits.stub_count() as u64;
    plan.summary.members_skipped = edits.skipped_count() as u64;
    plan.summary.classes_failed = failures.len() as u64;
    plan.summary.patch_bytes = Some(patch.len() as u64);
    plan.failures = failures.iter().map(|f| f.to_unrepaired()).collect();
    plan.edits = edits;

    if let Some((token, reason)) = caps_exceeded(&plan) {
        warn!(token, %reason, "plan blocked");
        plan.blocked = true;
        plan.blocked_reason = Some(reason);
        plan.blocked_reason_token = Some(token.to_string());
        plan.summary.patch_bytes = Some(0);
        patch.clear();
    }

    info!(
        classes = plan.summary.classes_repaired,
        stubs = plan.summary.stubs_total,
        failed = plan.summary.classes_failed,
        blocked = plan.blocked,
        "plan ready"
    );

    let policy_block = plan.blocked;
    Ok(PlanOutcome {
        plan,
        patch,
        policy_block,
    })
}

fn caps_exceeded(plan: &RepairPlan) -> Option<(&'static str, String)> {
    if let Some(max) = plan.policy.max_files
        && plan.summary.files_touched > max
    {
        return Some((
            failure_tokens::MAX_FILES,
            format!(
                "caps exceeded: {} files > max_files {}",
                plan.summary.files_touched, max
            ),
        ));
    }
    if let Some(max) = plan.policy.max_classes
        && plan.summary.classes_repaired > max
    {
        return Some((
            failure_tokens::MAX_CLASSES,
            format!(
                "caps exceeded: {} classes > max_classes {}",
                plan.summary.classes_repaired, max
            ),
        ));
    }
    None
}

fn plan_inputs(reports: &[LoadedReport]) -> Vec<PlanInput> {
    reports
        .iter()
        .map(|r| PlanInput {
            path: r.path.to_string(),
            schema: r.report.as_ref().ok().map(|rep| rep.schema.clone()),
            tool: r.report.as_ref().ok().map(|rep| rep.tool.name.clone()),
        })
        .collect()
}

/// Write all plan artifacts to the output directory.
pub fn write_plan_artifacts(
    outcome: &PlanOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let plan_json = serde_json::to_string_pretty(&outcome.plan).context("serialize plan")?;
    writer.write_file(&out_dir.join("plan.json"), plan_json.as_bytes())?;

    let edits_json =
        serde_json::to_string_pretty(&outcome.plan.edits).context("serialize edits")?;
    writer.write_file(&out_dir.join("edits.json"), edits_json.as_bytes())?;

    let plan_md = render_plan_md(&outcome.plan);
    writer.write_file(&out_dir.join("plan.md"), plan_md.as_bytes())?;

    writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;

    Ok(())
}

/// Outcome of `run_apply`.
pub struct ApplyOutcome {
    pub apply: ApplyRecord,
    pub patch: String,
    pub policy_block: bool,
}

/// Run the apply pipeline over `out_dir/plan.json`. Returns the apply record and patch.
pub fn run_apply(settings: &ApplySettings, tool: ToolInfo) -> Result<ApplyOutcome, ToolError> {
    let plan_path = settings.out_dir.join("plan.json");
    let plan_str = fs::read_to_string(&plan_path).with_context(|| format!("read {}", plan_path))?;
    let plan: RepairPlan = serde_json::from_str(&plan_str).context("parse plan.json")?;

    if plan.blocked {
        let apply = blocked_apply(&plan, tool);
        return Ok(ApplyOutcome {
            apply,
            patch: String::new(),
            policy_block: true,
        });
    }

    let opts = ApplyOptions {
        dry_run: settings.dry_run,
        require_clean_hashes: plan.policy.require_clean_hashes,
        indent_unit: settings.indent_unit.clone(),
        newline: settings.newline.clone(),
    };
    let (apply, patch) =
        apply_edit_set(&settings.repo_root, &plan.edits, tool, &opts).context("apply edits")?;

    let policy_block = check_policy_block(&apply).is_some();
    Ok(ApplyOutcome {
        apply,
        patch,
        policy_block,
    })
}

fn blocked_apply(plan: &RepairPlan, tool: ToolInfo) -> ApplyRecord {
    let reason = plan
        .blocked_reason
        .clone()
        .unwrap_or_else(|| "plan is blocked".to_string());
    let mut apply = ApplyRecord::new(tool);
    for file in &plan.edits.files {
        apply.results.push(FileApplyResult {
            path: file.path.to_string(),
            status: ApplyStatus::Blocked,
            message: Some(reason.clone()),
            classes: file.classes.len() as u64,
            stubs_inserted: 0,
            sha256_before: file.sha256.clone(),
            sha256_after: None,
        });
    }
    apply.summary.blocked = apply.results.len() as u64;
    apply
}

/// Write all apply artifacts to the output directory.
pub fn write_apply_artifacts(
    outcome: &ApplyOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let apply_json = serde_json::to_string_pretty(&outcome.apply).context("serialize apply")?;
    writer.write_file(&out_dir.join("apply.json"), apply_json.as_bytes())?;

    let apply_md = render_apply_md(&outcome.apply);
    writer.write_file(&out_dir.join("apply.md"), apply_md.as_bytes())?;

    writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FsWritePort, InMemoryDiagnosticSource, InMemoryProgramSource};
    use absfix_types::diagnostic::{Diagnostic, DiagnosticReport};
    use absfix_types::edit::StubPolicy;
    use absfix_types::snapshot::ProgramSnapshot;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const SHAPES: &str = "abstract class Shape {\n    abstract area(): number;\n    abstract get name(): string;\n}\n\nclass Circle extends Shape {\n}\n\nclass Square extends Shape {\n}\n";

    #[derive(Default)]
    struct MemWritePort {
        files: Mutex<HashMap<String, Vec<u8>>>,
        dirs: Mutex<Vec<String>>,
    }

    impl WritePort for MemWritePort {
        fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
            let key = path.as_str().replace('\\', "/");
            self.files
                .lock()
                .expect("lock files")
                .insert(key, contents.to_vec());
            Ok(())
        }

        fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
            let key = path.as_str().replace('\\', "/");
            self.dirs.lock().expect("lock dirs").push(key);
            Ok(())
        }
    }

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "absfix".into(),
            version: Some("0.0.0-test".into()),
        }
    }

    fn offset(needle: &str) -> u64 {
        SHAPES.find(needle).expect("needle") as u64
    }

    fn class_json(name: &str, extends: Option<&str>, members: serde_json::Value) -> serde_json::Value {
        let start = offset(&format!("class {name}"));
        let open = start + SHAPES[start as usize..].find('{').expect("brace") as u64;
        let end = open + SHAPES[open as usize..].find('}').expect("close") as u64 + 1;
        let extends: Vec<_> = extends.into_iter().map(|b| serde_json::json!({ "name": b })).collect();
        serde_json::json!({
            "name": name,
            "span": { "start": start, "end": end },
            "name_span": { "start": start + 6, "end": start + 6 + name.len() as u64 },
            "open_brace": open,
            "extends": extends,
            "members": members,
        })
    }

    fn snapshot() -> ProgramSnapshot {
        let mut shape = class_json(
            "Shape",
            None,
            serde_json::json!([
                { "name": "area", "abstract": true,
                  "shape": { "kind": "method", "params": [], "return_type": "number" } },
                { "name": "name", "abstract": true,
                  "shape": { "kind": "get_accessor", "return_type": "string" } }
            ]),
        );
        shape["abstract"] = serde_json::json!(true);
        serde_json::from_value(serde_json::json!({
            "schema": "absfix.snapshot.v1",
            "files": [{
                "path": "src/shapes.ts",
                "classes": [
                    shape,
                    class_json("Circle", Some("Shape"), serde_json::json!([])),
                    class_json("Square", Some("Shape"), serde_json::json!([]))
                ]
            }]
        }))
        .expect("snapshot")
    }

    fn reports() -> InMemoryDiagnosticSource {
        let circle = offset("class Circle") + 6;
        let square = offset("class Square") + 6;
        let report = DiagnosticReport {
            schema: "tsc.diagnostics.v1".to_string(),
            tool: ToolInfo::new("tsc"),
            diagnostics: vec![
                Diagnostic::new(2515, "src/shapes.ts", circle),
                Diagnostic::new(2515, "src/shapes.ts", circle),
                Diagnostic::new(2515, "src/shapes.ts", square),
                Diagnostic::new(2322, "src/shapes.ts", 3),
            ],
        };
        InMemoryDiagnosticSource::new(vec![LoadedReport {
            path: Utf8PathBuf::from("artifacts/tsc/diagnostics.json"),
            source_id: "tsc".to_string(),
            report: Ok(report),
        }])
    }

    fn temp_repo() -> (TempDir, Utf8PathBuf) {
        let td = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf8");
        fs::create_dir_all(root.join("src")).expect("src");
        fs::write(root.join("src/shapes.ts"), SHAPES).expect("write");
        (td, root)
    }

    fn plan_settings(root: &Utf8Path) -> PlanSettings {
        PlanSettings {
            repo_root: root.to_path_buf(),
            artifacts_dir: root.join("artifacts"),
            out_dir: root.join("artifacts/absfix"),
            ..PlanSettings::default()
        }
    }

    #[test]
    fn run_plan_repairs_each_class_once() {
        let (_td, root) = temp_repo();
        let outcome = run_plan(
            &plan_settings(&root),
            &reports(),
            &InMemoryProgramSource::new(snapshot()),
            tool(),
        )
        .expect("run_plan");

        let plan = &outcome.plan;
        assert!(!outcome.policy_block);
        assert_eq!(plan.summary.diagnostics_total, 4);
        assert_eq!(plan.summary.diagnostics_ignored, 1);
        assert_eq!(plan.summary.classes_repaired, 2);
        assert_eq!(plan.summary.stubs_total, 4);
        assert_eq!(plan.summary.classes_failed, 0);
        assert_eq!(plan.inputs[0].tool.as_deref(), Some("tsc"));
        assert!(plan.edits.files[0].sha256.as_deref().unwrap_or("").len() == 64);
        assert_eq!(plan.summary.patch_bytes, Some(outcome.patch.len() as u64));
        assert_eq!(outcome.patch.matches("+    area(): number {").count(), 2);
    }

    #[test]
    fn run_plan_skips_hashes_when_disabled() {
        let (_td, root) = temp_repo();
        let mut settings = plan_settings(&root);
        settings.require_clean_hashes = false;
        settings.stub_policy = StubPolicy::CommentMarker;
        let outcome = run_plan(
            &settings,
            &reports(),
            &InMemoryProgramSource::new(snapshot()),
            tool(),
        )
        .expect("run_plan");
        assert!(outcome.plan.edits.files[0].sha256.is_none());
        assert!(outcome.patch.contains("// TODO: implement area"));
    }

    #[test]
    fn run_plan_blocks_when_class_cap_exceeded() {
        let (_td, root) = temp_repo();
        let mut settings = plan_settings(&root);
        settings.max_classes = Some(1);
        let outcome = run_plan(
            &settings,
            &reports(),
            &InMemoryProgramSource::new(snapshot()),
            tool(),
        )
        .expect("run_plan");

        assert!(outcome.policy_block);
        assert_eq!(
            outcome.plan.blocked_reason_token.as_deref(),
            Some("max_classes")
        );
        assert!(outcome.patch.is_empty());
        assert_eq!(outcome.plan.summary.patch_bytes, Some(0));
    }

    #[test]
    fn write_plan_artifacts_writes_expected_files() {
        let (_td, root) = temp_repo();
        let outcome = run_plan(
            &plan_settings(&root),
            &reports(),
            &InMemoryProgramSource::new(snapshot()),
            tool(),
        )
        .expect("run_plan");

        let writer = MemWritePort::default();
        write_plan_artifacts(&outcome, Utf8Path::new("out"), &writer).expect("write");

        let files = writer.files.lock().expect("files");
        for name in ["out/plan.json", "out/edits.json", "out/plan.md", "out/patch.diff"] {
            assert!(files.contains_key(name), "missing {name}");
        }
        let edits: serde_json::Value =
            serde_json::from_slice(&files["out/edits.json"]).expect("edits json");
        assert_eq!(edits["schema"], absfix_types::schema::ABSFIX_EDITS_V1);
    }

    #[test]
    fn plan_then_apply_round_trip_on_disk() {
        let (_td, root) = temp_repo();
        let settings = plan_settings(&root);
        let outcome = run_plan(
            &settings,
            &reports(),
            &InMemoryProgramSource::new(snapshot()),
            tool(),
        )
        .expect("run_plan");
        write_plan_artifacts(&outcome, &settings.out_dir, &FsWritePort).expect("write plan");

        let dry = run_apply(
            &ApplySettings {
                repo_root: root.clone(),
                out_dir: settings.out_dir.clone(),
                ..ApplySettings::default()
            },
            tool(),
        )
        .expect("dry run");
        assert!(!dry.policy_block);
        assert_eq!(dry.patch, outcome.patch);
        assert_eq!(fs::read_to_string(root.join("src/shapes.ts")).unwrap(), SHAPES);

        let real = run_apply(
            &ApplySettings {
                repo_root: root.clone(),
                out_dir: settings.out_dir.clone(),
                dry_run: false,
                ..ApplySettings::default()
            },
            tool(),
        )
        .expect("apply");
        assert_eq!(real.apply.summary.files_modified, 1);
        let after = fs::read_to_string(root.join("src/shapes.ts")).unwrap();
        assert_eq!(after.matches("get name(): string {").count(), 2);

        // The file changed, so a second apply of the same plan is refused.
        let again = run_apply(
            &ApplySettings {
                repo_root: root.clone(),
                out_dir: settings.out_dir.clone(),
                dry_run: false,
                ..ApplySettings::default()
            },
            tool(),
        )
        .expect("apply again");
        assert!(again.policy_block);
        assert_eq!(fs::read_to_string(root.join("src/shapes.ts")).unwrap(), after);
    }

    #[test]
    fn run_apply_refuses_blocked_plan() {
        let (_td, root) = temp_repo();
        let mut settings = plan_settings(&root);
        settings.max_files = Some(0);
        let outcome = run_plan(
            &settings,
            &reports(),
            &InMemoryProgramSource::new(snapshot()),
            tool(),
        )
        .expect("run_plan");
        write_plan_artifacts(&outcome, &settings.out_dir, &FsWritePort).expect("write plan");

        let applied = run_apply(
            &ApplySettings {
                repo_root: root.clone(),
                out_dir: settings.out_dir.clone(),
                dry_run: false,
                ..ApplySettings::default()
            },
            tool(),
        )
        .expect("apply");
        assert!(applied.policy_block);
        assert_eq!(applied.apply.summary.blocked, 1);
        assert!(applied.apply.results.iter().all(|r| r.status == ApplyStatus::Blocked));
        assert_eq!(fs::read_to_string(root.join("src/shapes.ts")).unwrap(), SHAPES);

        let writer = MemWritePort::default();
        write_apply_artifacts(&applied, Utf8Path::new("out"), &writer).expect("write");
        let files = writer.files.lock().expect("files");
        assert!(files.contains_key("out/apply.json"));
        assert!(files.contains_key("out/apply.md"));
    }

    #[test]
    fn tool_error_exit_codes() {
        assert_eq!(ToolError::PolicyBlock.exit_code(), 2);
        assert_eq!(ToolError::from(anyhow::anyhow!("x")).exit_code(), 1);
    }
}

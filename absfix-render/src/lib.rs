//! Rendering helpers (markdown) for human-readable artifacts.

use absfix_types::apply::{ApplyRecord, ApplyStatus};
use absfix_types::edit::StubKind;
use absfix_types::plan::RepairPlan;

pub fn render_plan_md(plan: &RepairPlan) -> String {
    let mut out = String::new();
    out.push_str("# absfix plan\n\n");
    out.push_str(&format!(
        "- Stub policy: `{}`\n",
        plan.policy.stub_policy.label()
    ));
    out.push_str(&format!(
        "- Diagnostics: {} (ignored {})\n",
        plan.summary.diagnostics_total, plan.summary.diagnostics_ignored
    ));
    out.push_str(&format!(
        "- Classes repaired: {} ({} stubs, {} members skipped)\n",
        plan.summary.classes_repaired, plan.summary.stubs_total, plan.summary.members_skipped
    ));
    out.push_str(&format!(
        "- Classes failed: {}\n",
        plan.summary.classes_failed
    ));
    out.push_str(&format!("- Files touched: {}\n", plan.summary.files_touched));
    if let Some(bytes) = plan.summary.patch_bytes {
        out.push_str(&format!("- Patch bytes: {}\n", bytes));
    }
    out.push_str(&format!("- Inputs: {}\n\n", plan.inputs.len()));

    if plan.blocked {
        out.push_str(&format!(
            "**Blocked** (`{}`): {}\n\n",
            plan.blocked_reason_token.as_deref().unwrap_or("-"),
            plan.blocked_reason.as_deref().unwrap_or("no reason given")
        ));
    }

    out.push_str("## Classes\n\n");
    if plan.edits.is_empty() {
        out.push_str("_No classes to repair._\n");
    }

    let mut n = 0;
    for file in &plan.edits.files {
        for class in &file.classes {
            n += 1;
            out.push_str(&format!("### {}. {}\n\n", n, class.display_name()));
            out.push_str(&format!("- File: `{}`\n", file.path));
            out.push_str(&format!("- Declaration at: {}\n", class.class.start));
            out.push_str(&format!("- Insert at: {}\n", class.anchor.position()));
            if !class.triggers.is_empty() {
                let codes: Vec<String> = class
                    .triggers
                    .iter()
                    .map(|t| format!("TS{}@{}", t.code, t.start))
                    .collect();
                out.push_str(&format!("- Diagnostics: {}\n", codes.join(", ")));
            }

            out.push_str("\n**Stubs**\n\n");
            for stub in &class.stubs {
                out.push_str(&format!("- `{}` ({})\n", stub.name, kind_label(stub.kind)));
            }
            if !class.skipped.is_empty() {
                out.push_str("\n**Skipped**\n\n");
                for s in &class.skipped {
                    out.push_str(&format!("- `{}`: {}\n", s.name, s.reason));
                }
            }
            out.push('\n');
        }
    }

    if !plan.failures.is_empty() {
        out.push_str("\n## Unrepaired\n\n");
        for f in &plan.failures {
            out.push_str(&format!(
                "- `{}` at `{}:{}` (`{}`): {}\n",
                f.class_name.as_deref().unwrap_or("-"),
                f.diagnostic.file,
                f.diagnostic.start,
                f.reason_token,
                f.reason
            ));
        }
    }

    out
}

pub fn render_apply_md(apply: &ApplyRecord) -> String {
    let mut out = String::new();
    out.push_str("# absfix apply\n\n");
    if !apply.applied {
        out.push_str("_Dry run: nothing was written._\n\n");
    }
    out.push_str(&format!(
        "- Attempted: {}\n- Applied: {}\n- Blocked: {}\n- Failed: {}\n- Files modified: {}\n\n",
        apply.summary.attempted,
        apply.summary.applied,
        apply.summary.blocked,
        apply.summary.failed,
        apply.summary.files_modified
    ));

    if !apply.preconditions.mismatches.is_empty() {
        out.push_str("## Precondition mismatches\n\n");
        for m in &apply.preconditions.mismatches {
            out.push_str(&format!(
                "- `{}` expected {} got {}\n",
                m.path, m.expected, m.actual
            ));
        }
        out.push('\n');
    }

    out.push_str("## Results\n\n");
    if apply.results.is_empty() {
        out.push_str("_No results._\n");
        return out;
    }

    for (i, r) in apply.results.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", i + 1, r.path));
        out.push_str(&format!("- Status: `{}`\n", status_label(r.status)));
        out.push_str(&format!(
            "- Classes: {} ({} stubs)\n",
            r.classes, r.stubs_inserted
        ));
        if let Some(msg) = &r.message {
            out.push_str(&format!("- Message: {}\n", msg));
        }
        let before = r.sha256_before.as_deref().unwrap_or("-");
        let after = r.sha256_after.as_deref().unwrap_or("-");
        out.push_str(&format!("- sha256: {} → {}\n", before, after));
        out.push('\n');
    }

    out
}

fn kind_label(k: StubKind) -> &'static str {
    match k {
        StubKind::Method => "method",
        StubKind::Property => "property",
        StubKind::GetAccessor => "get accessor",
        StubKind::SetAccessor => "set accessor",
        StubKind::AccessorPair => "get/set accessor",
    }
}

fn status_label(s: ApplyStatus) -> &'static str {
    match s {
        ApplyStatus::Applied => "applied",
        ApplyStatus::Blocked => "blocked",
        ApplyStatus::Failed => "failed",
        ApplyStatus::Skipped => "skipped",
    }
}

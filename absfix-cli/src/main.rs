mod config;
mod explain;

use absfix_core::adapters::{FsDiagnosticSource, FsProgramSource, FsWritePort};
use absfix_core::pipeline::{
    ToolError, run_apply, run_plan, write_apply_artifacts, write_plan_artifacts,
};
use absfix_core::settings::{ApplySettings, PlanSettings};
use absfix_types::apply::ApplyStatus;
use absfix_types::diagnostic::ToolInfo;
use absfix_types::edit::StubPolicy;
use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{ConfigMerger, NewlineStyle};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "absfix",
    version,
    about = "Implements inherited abstract members reported by the compiler."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a repair plan from compiler diagnostics.
    Plan(PlanArgs),
    /// Apply an existing plan (default: dry-run).
    Apply(ApplyArgs),
    /// Explain the repair or a stub policy.
    Explain(ExplainArgs),
}

#[derive(Debug, Parser)]
struct PlanArgs {
    /// Repository root (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Artifacts directory scanned for */diagnostics.json (default: <repo_root>/artifacts).
    #[arg(long)]
    artifacts_dir: Option<Utf8PathBuf>,

    /// Read these diagnostics reports instead of scanning the artifacts directory.
    #[arg(long = "report")]
    reports: Vec<Utf8PathBuf>,

    /// Program snapshot JSON (default: <artifacts_dir>/program.json).
    #[arg(long)]
    program: Option<Utf8PathBuf>,

    /// Output directory for absfix artifacts (default: <artifacts_dir>/absfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Stub body policy: throw-stub, type-default or comment-marker.
    #[arg(long)]
    stub_policy: Option<StubPolicy>,

    /// Indentation unit for stub bodies.
    #[arg(long)]
    indent: Option<String>,

    /// Line endings of inserted blocks.
    #[arg(long, value_enum)]
    newline: Option<NewlineStyle>,

    /// Disable sha256 preconditions (not recommended).
    #[arg(long, default_value_t = false)]
    no_clean_hashes: bool,

    /// Maximum number of files the plan may touch.
    #[arg(long)]
    max_files: Option<u64>,

    /// Maximum number of classes the plan may repair.
    #[arg(long)]
    max_classes: Option<u64>,
}

#[derive(Debug, Parser)]
struct ApplyArgs {
    /// Repository root (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Directory containing plan.json (default: <repo_root>/artifacts/absfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Write changes to disk. If omitted, runs a dry-run and only emits artifacts.
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Indentation unit for stub bodies.
    #[arg(long)]
    indent: Option<String>,

    /// Line endings of inserted blocks.
    #[arg(long, value_enum)]
    newline: Option<NewlineStyle>,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Topic: "missing-abstract-member", a diagnostic code (TS2515) or a stub policy.
    topic: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Apply(args) => cmd_apply(args),
        Command::Explain(args) => cmd_explain(args).map_err(ToolError::from),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(ToolError::PolicyBlock) => {
            error!("policy block");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn cmd_plan(args: PlanArgs) -> Result<(), ToolError> {
    let repo_root = args.repo_root;
    let artifacts_dir = args
        .artifacts_dir
        .unwrap_or_else(|| repo_root.join("artifacts"));
    let out_dir = args.out_dir.unwrap_or_else(|| artifacts_dir.join("absfix"));
    let program = args
        .program
        .unwrap_or_else(|| artifacts_dir.join("program.json"));

    let file_config = config::load_or_default(&repo_root).context("load absfix.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_plan_args(
        args.stub_policy,
        args.indent.as_deref(),
        args.newline,
        args.no_clean_hashes,
    )?;

    let settings = PlanSettings {
        repo_root: repo_root.clone(),
        artifacts_dir: artifacts_dir.clone(),
        out_dir: out_dir.clone(),
        stub_policy: merged.stub_policy,
        indent_unit: merged.indent_unit,
        newline: merged.newline,
        max_files: args.max_files.or(merged.max_files),
        max_classes: args.max_classes.or(merged.max_classes),
        require_clean_hashes: merged.require_clean_hashes,
    };
    debug!(?settings, "merged plan settings");

    let diagnostics = FsDiagnosticSource::new(artifacts_dir).with_files(args.reports);
    let program = FsProgramSource::new(program);

    let outcome = run_plan(&settings, &diagnostics, &program, tool_info())?;
    write_plan_artifacts(&outcome, &out_dir, &FsWritePort)?;

    info!("wrote plan to {}", out_dir);
    println!(
        "planned {} stubs in {} classes ({} unrepaired)",
        outcome.plan.summary.stubs_total,
        outcome.plan.summary.classes_repaired,
        outcome.plan.summary.classes_failed
    );

    if outcome.policy_block {
        return Err(ToolError::PolicyBlock);
    }
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> Result<(), ToolError> {
    let repo_root = args.repo_root;
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| repo_root.join("artifacts").join("absfix"));

    let file_config = config::load_or_default(&repo_root).context("load absfix.toml config")?;
    let merged =
        ConfigMerger::new(file_config).merge_apply_args(args.indent.as_deref(), args.newline)?;

    let settings = ApplySettings {
        repo_root,
        out_dir: out_dir.clone(),
        dry_run: !args.apply,
        indent_unit: merged.indent_unit,
        newline: merged.newline,
    };
    debug!(?settings, "merged apply settings");

    let outcome = run_apply(&settings, tool_info())?;
    write_apply_artifacts(&outcome, &out_dir, &FsWritePort)?;

    info!("wrote apply artifacts to {}", out_dir);
    if settings.dry_run {
        println!(
            "dry-run: {} files would change (pass --apply to write)",
            outcome
                .apply
                .results
                .iter()
                .filter(|r| r.status == ApplyStatus::Skipped)
                .count()
        );
    } else {
        println!(
            "applied: {} files modified",
            outcome.apply.summary.files_modified
        );
    }

    if outcome.policy_block {
        return Err(ToolError::PolicyBlock);
    }
    Ok(())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "absfix".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    use explain::{FIX, Topic, list_topics, lookup, policy_meaning};

    let topic = match args.topic.as_deref() {
        None => Topic::Fix(&FIX),
        Some(q) => match lookup(q) {
            Some(t) => t,
            None => anyhow::bail!(
                "Unknown topic: '{}'\n\nAvailable topics: {}",
                q,
                list_topics().join(", ")
            ),
        },
    };

    match topic {
        Topic::Fix(fix) => {
            println!("================================================================================");
            println!("FIX: {}", fix.title);
            println!("================================================================================");
            println!();
            println!("Key:     {}", fix.key);
            let codes: Vec<String> = fix.codes.iter().map(|c| format!("TS{c}")).collect();
            println!("Codes:   {}", codes.join(", "));
            println!();

            println!("DESCRIPTION");
            println!("--------------------------------------------------------------------------------");
            println!("{}", fix.description);
            println!();

            println!("SAFETY RATIONALE");
            println!("--------------------------------------------------------------------------------");
            println!("{}", fix.safety_rationale);
            println!();

            println!("STUB POLICIES");
            println!("--------------------------------------------------------------------------------");
            for policy in [
                StubPolicy::ThrowStub,
                StubPolicy::TypeDefault,
                StubPolicy::CommentMarker,
            ] {
                println!("{}", policy_meaning(policy));
                println!();
            }

            println!("REMEDIATION GUIDANCE");
            println!("--------------------------------------------------------------------------------");
            println!("{}", fix.remediation);
            println!();
        }
        Topic::Policy(policy) => {
            println!("STUB POLICY: {}", policy.label());
            println!("--------------------------------------------------------------------------------");
            println!("{}", policy_meaning(policy));
            println!();
            println!("Select it with `--stub-policy {}` or in absfix.toml:", policy.label());
            println!();
            println!("    [stubs]");
            println!("    policy = \"{}\"", policy.label());
        }
    }

    Ok(())
}

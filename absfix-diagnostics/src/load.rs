use absfix_types::diagnostic::{Diagnostic, DiagnosticReport};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub path: Utf8PathBuf,
    /// Directory name under artifacts/... (best effort).
    pub source_id: String,
    pub report: Result<DiagnosticReport, ReportLoadError>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

/// Load every `artifacts/*/diagnostics.json`, sorted by path.
pub fn load_reports(artifacts_dir: &Utf8Path) -> anyhow::Result<Vec<LoadedReport>> {
    let pattern = artifacts_dir.join("*/diagnostics.json");
    let pattern_str = pattern.as_str();

    debug!(pattern = %pattern_str, "scanning artifacts for diagnostic reports");

    let mut out = Vec::new();
    for entry in glob(pattern_str).context("glob artifacts/*/diagnostics.json")? {
        let path = entry
            .map_err(|e| anyhow::anyhow!("glob error: {e}"))?
            .to_string_lossy()
            .to_string();

        let utf8_path = Utf8PathBuf::from(path);
        let source_id = utf8_path
            .parent()
            .and_then(|p| p.file_name())
            .unwrap_or("unknown")
            .to_string();

        // Our own output directory never holds compiler diagnostics.
        if source_id == "absfix" {
            debug!(path = %utf8_path, "skipping absfix's own output");
            continue;
        }

        out.push(read_report(utf8_path, source_id));
    }

    // Deterministic order matters.
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

/// Load a single report from an explicit path.
pub fn load_report_file(path: &Utf8Path) -> LoadedReport {
    let source_id = path
        .file_stem()
        .unwrap_or("unknown")
        .to_string();
    read_report(path.to_path_buf(), source_id)
}

fn read_report(path: Utf8PathBuf, source_id: String) -> LoadedReport {
    let report = match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str::<DiagnosticReport>(&s).map_err(|e| ReportLoadError::Json {
            message: e.to_string(),
        }),
        Err(e) => Err(ReportLoadError::Io {
            message: e.to_string(),
        }),
    };

    LoadedReport {
        path,
        source_id,
        report,
    }
}

/// Flatten all successfully loaded reports into one diagnostic list, preserving report order
/// and the order of diagnostics inside each report.
pub fn collect_diagnostics(loaded: &[LoadedReport]) -> Vec<Diagnostic> {
    loaded
        .iter()
        .filter_map(|r| r.report.as_ref().ok())
        .flat_map(|r| r.diagnostics.iter().cloned())
        .collect()
}

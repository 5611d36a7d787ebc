//! Default filesystem-backed port implementations.

use crate::ports::{DiagnosticSource, ProgramSource, WritePort};
use absfix_diagnostics::LoadedReport;
use absfix_domain::SnapshotProgram;
use absfix_types::snapshot::ProgramSnapshot;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tracing::debug;

/// Loads reports from the filesystem via `absfix_diagnostics::load_reports`.
///
/// Explicit report files, when given, replace the artifacts scan.
#[derive(Debug, Clone)]
pub struct FsDiagnosticSource {
    pub artifacts_dir: Utf8PathBuf,
    pub explicit: Vec<Utf8PathBuf>,
}

impl FsDiagnosticSource {
    pub fn new(artifacts_dir: Utf8PathBuf) -> Self {
        Self {
            artifacts_dir,
            explicit: vec![],
        }
    }

    pub fn with_files(mut self, files: Vec<Utf8PathBuf>) -> Self {
        self.explicit = files;
        self
    }
}

impl DiagnosticSource for FsDiagnosticSource {
    fn load_reports(&self) -> anyhow::Result<Vec<LoadedReport>> {
        if !self.explicit.is_empty() {
            let mut out: Vec<_> = self
                .explicit
                .iter()
                .map(|p| absfix_diagnostics::load_report_file(p))
                .collect();
            out.sort_by(|a, b| a.path.cmp(&b.path));
            return Ok(out);
        }
        absfix_diagnostics::load_reports(&self.artifacts_dir)
            .with_context(|| format!("load diagnostics from {}", self.artifacts_dir))
    }
}

/// In-memory report source for embedding and testing.
///
/// Drops absfix's own output directory and sorts by path on construction to match
/// `FsDiagnosticSource`'s deterministic ordering.
#[derive(Debug, Clone)]
pub struct InMemoryDiagnosticSource {
    reports: Vec<LoadedReport>,
}

impl InMemoryDiagnosticSource {
    pub fn new(mut reports: Vec<LoadedReport>) -> Self {
        reports.retain(|r| {
            let p = r.path.as_str().replace('\\', "/").to_ascii_lowercase();
            let own = r.source_id.eq_ignore_ascii_case("absfix")
                || p.starts_with("artifacts/absfix/")
                || p.contains("/artifacts/absfix/");
            if own {
                debug!(path = r.path.as_str(), "skipping absfix's own output");
            }
            !own
        });
        reports.sort_by(|a, b| a.path.cmp(&b.path));
        Self { reports }
    }
}

impl DiagnosticSource for InMemoryDiagnosticSource {
    fn load_reports(&self) -> anyhow::Result<Vec<LoadedReport>> {
        Ok(self.reports.clone())
    }
}

/// Reads a program snapshot JSON file.
#[derive(Debug, Clone)]
pub struct FsProgramSource {
    pub path: Utf8PathBuf,
}

impl FsProgramSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl ProgramSource for FsProgramSource {
    fn load_program(&self) -> anyhow::Result<SnapshotProgram> {
        SnapshotProgram::load(&self.path)
    }
}

/// Serves an already-built snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgramSource {
    snapshot: ProgramSnapshot,
}

impl InMemoryProgramSource {
    pub fn new(snapshot: ProgramSnapshot) -> Self {
        Self { snapshot }
    }
}

impl ProgramSource for InMemoryProgramSource {
    fn load_program(&self) -> anyhow::Result<SnapshotProgram> {
        Ok(SnapshotProgram::new(self.snapshot.clone()))
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use absfix_diagnostics::ReportLoadError;
    use tempfile::TempDir;

    fn make_report(path: &str, source_id: &str) -> LoadedReport {
        LoadedReport {
            path: Utf8PathBuf::from(path),
            source_id: source_id.to_string(),
            report: Err(ReportLoadError::Io {
                message: "stub".to_string(),
            }),
        }
    }

    #[test]
    fn in_memory_source_sorts_and_skips_own_output() {
        let source = InMemoryDiagnosticSource::new(vec![
            make_report("artifacts/tsc-web/diagnostics.json", "tsc-web"),
            make_report("artifacts/absfix/diagnostics.json", "other"),
            make_report("repo/artifacts/absfix/x.json", "x"),
            make_report("artifacts/tsc-api/diagnostics.json", "tsc-api"),
            make_report("elsewhere/d.json", "absfix"),
        ]);
        let paths: Vec<_> = source
            .load_reports()
            .unwrap()
            .into_iter()
            .map(|r| r.path.to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "artifacts/tsc-api/diagnostics.json",
                "artifacts/tsc-web/diagnostics.json"
            ]
        );
    }

    #[test]
    fn fs_write_port_creates_parents() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let target = root.join("a/b/c.txt");
        FsWritePort.write_file(&target, b"hi").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "hi");
    }

    #[test]
    fn fs_program_source_reports_missing_file() {
        let source = FsProgramSource::new(Utf8PathBuf::from("does/not/exist.json"));
        let err = source.load_program().unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.json"));
    }

    #[test]
    fn explicit_report_files_replace_scan() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let file = root.join("tsc.json");
        fs::write(
            &file,
            r#"{"schema":"tsc.diagnostics.v1","tool":{"name":"tsc"},"diagnostics":[]}"#,
        )
        .unwrap();
        let source = FsDiagnosticSource::new(root.join("artifacts")).with_files(vec![file]);
        let reports = source.load_reports().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].source_id, "tsc");
        assert!(reports[0].report.is_ok());
    }
}

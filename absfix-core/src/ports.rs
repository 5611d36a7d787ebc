//! Port traits abstracting all I/O away from the pipeline.

use absfix_diagnostics::LoadedReport;
use absfix_domain::SnapshotProgram;
use camino::Utf8Path;

/// Source of compiler diagnostic reports.
pub trait DiagnosticSource {
    fn load_reports(&self) -> anyhow::Result<Vec<LoadedReport>>;
}

/// Source of the program's declaration model.
pub trait ProgramSource {
    fn load_program(&self) -> anyhow::Result<SnapshotProgram>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}

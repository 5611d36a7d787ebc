//! Diagnostic report ingestion.
//!
//! absfix consumes diagnostics produced by a compiler front end. Loading is tolerant: a report
//! with extra fields still loads, and a report that fails to parse is kept as an error entry so
//! the plan can list it as an input instead of silently dropping it.

mod load;

pub use load::{
    LoadedReport, ReportLoadError, collect_diagnostics, load_report_file, load_reports,
};

//! Embeddable core library for absfix.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into an editor integration or other host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`DiagnosticSource`](ports::DiagnosticSource): load compiler diagnostic reports
//! - [`ProgramSource`](ports::ProgramSource): load the program's class model
//! - [`WritePort`](ports::WritePort): write files and create directories
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_plan`](pipeline::run_plan): repair every reported class into a plan
//! - [`run_apply`](pipeline::run_apply): apply an existing plan

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export loader types so embedders don't need absfix-diagnostics directly.
pub use absfix_diagnostics::{LoadedReport, ReportLoadError};

// Re-export the model ports so embedders can bring their own compiler bridge.
pub use absfix_domain::{AstLocator, SnapshotProgram, TypeResolver};

//! Domain logic: turn missing-abstract-member diagnostics into deterministic stub insertions.
//!
//! This crate owns *what* should be inserted and where. It does not own *how* text is
//! spliced into files; that's the `absfix-edit` crate.

mod aggregator;
mod error;
mod instantiate;
mod members;
mod ports;
mod resolver;
mod snapshot;
mod synth;
mod target;

pub use aggregator::{CancelFlag, RepairAggregator};
pub use error::{BatchError, ClassFailure, PartialBatchFailure, RepairError, SynthError};
pub use instantiate::Substitution;
pub use members::MemberTable;
pub use ports::{AstLocator, TypeHandle, TypeResolver};
pub use resolver::{CandidateSet, MemberResolver};
pub use snapshot::SnapshotProgram;
pub use synth::StubSynthesizer;
pub use target::ClassTarget;

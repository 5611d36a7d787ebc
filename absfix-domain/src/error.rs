//! Error taxonomy for member resolution, synthesis and batch repair.
//!
//! - Class-level errors ([`RepairError`]) abort the repair of one class only.
//! - Member-level errors ([`SynthError`]) skip one member; the rest of the class is still repaired.
//! - [`PartialBatchFailure`] carries the successfully computed edits next to the failures.

use absfix_types::diagnostic::Diagnostic;
use absfix_types::edit::EditSet;
use absfix_types::plan::{UnrepairedClass, failure_tokens};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Why one member could not be stubbed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error("unsupported member shape `{kind}` for member `{member}`")]
    UnsupportedMemberShape { member: String, kind: String },
}

impl SynthError {
    pub fn member(&self) -> &str {
        match self {
            SynthError::UnsupportedMemberShape { member, .. } => member,
        }
    }
}

/// Why one class could not be repaired.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepairError {
    #[error("no class-like declaration at {file}:{position}")]
    NotAClass { file: Utf8PathBuf, position: u64 },

    #[error("cannot resolve base type of {class}: {reason}")]
    UnresolvableBaseType { class: String, reason: String },

    #[error("none of the {} owed members of {class} could be synthesized", skipped.len())]
    NoSupportedMembers {
        class: String,
        skipped: Vec<SynthError>,
    },
}

impl RepairError {
    pub fn unresolvable(class: impl Into<String>, reason: impl Into<String>) -> Self {
        RepairError::UnresolvableBaseType {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Stable token for reports.
    pub fn token(&self) -> &'static str {
        match self {
            RepairError::NotAClass { .. } => failure_tokens::NOT_A_CLASS,
            RepairError::UnresolvableBaseType { .. } => failure_tokens::UNRESOLVABLE_BASE_TYPE,
            RepairError::NoSupportedMembers { .. } => failure_tokens::NO_SUPPORTED_MEMBERS,
        }
    }
}

/// One diagnostic whose class could not be repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFailure {
    pub diagnostic: Diagnostic,
    pub class_name: Option<String>,
    pub error: RepairError,
}

impl ClassFailure {
    pub fn to_unrepaired(&self) -> UnrepairedClass {
        UnrepairedClass {
            diagnostic: self.diagnostic.to_ref(),
            class_name: self.class_name.clone(),
            reason_token: self.error.token().to_string(),
            reason: self.error.to_string(),
        }
    }
}

/// A batch in which at least one class could not be repaired.
///
/// `edits` holds every insertion that was computed successfully and is safe to apply.
#[derive(Debug, Error, Clone)]
#[error("{} class(es) could not be repaired", failures.len())]
pub struct PartialBatchFailure {
    pub edits: EditSet,
    pub failures: Vec<ClassFailure>,
}

#[derive(Debug, Error, Clone)]
pub enum BatchError {
    #[error(transparent)]
    Partial(#[from] PartialBatchFailure),

    /// Cancelled between files. `completed` holds the files finished before the flag was seen.
    #[error("batch cancelled after {} file(s)", completed.files.len())]
    Cancelled {
        completed: EditSet,
        failures: Vec<ClassFailure>,
    },
}

//! Error types for absfix-edit.
//!
//! This module defines error types that distinguish between:
//! - Policy blocks (exit code 2): stale preconditions, anchors that no longer fit, caps
//! - Runtime errors (exit code 1): I/O errors, invalid arguments

use thiserror::Error;

/// The top-level error type for absfix-edit operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// A policy block occurred (exit code 2).
    #[error("policy block: {0}")]
    PolicyBlock(#[from] PolicyBlockError),

    /// A runtime/tool error occurred (exit code 1).
    #[error("runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
}

/// Policy block errors that should result in exit code 2.
#[derive(Debug, Error)]
pub enum PolicyBlockError {
    /// One or more files changed since the plan was computed.
    #[error("precondition mismatch: {message}")]
    PreconditionMismatch { message: String },

    /// An insertion anchor does not sit right after an opening brace.
    #[error("anchor mismatch: {message}")]
    AnchorMismatch { message: String },

    /// Caps exceeded (max files, max classes).
    #[error("caps exceeded: {message}")]
    CapsExceeded { message: String },
}

impl EditError {
    /// Returns true if this is a policy block error (exit code 2).
    pub fn is_policy_block(&self) -> bool {
        matches!(self, EditError::PolicyBlock(_))
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            EditError::PolicyBlock(_) => 2,
            EditError::Runtime(_) => 1,
        }
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;

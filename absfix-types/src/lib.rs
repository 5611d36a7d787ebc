//! Shared DTOs (schemas-as-code) for the absfix workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod apply;
pub mod diagnostic;
pub mod edit;
pub mod member;
pub mod path;
pub mod plan;
pub mod snapshot;

/// Schema identifiers.
pub mod schema {
    pub const ABSFIX_EDITS_V1: &str = "absfix.edits.v1";
    pub const ABSFIX_PLAN_V1: &str = "absfix.plan.v1";
    pub const ABSFIX_APPLY_V1: &str = "absfix.apply.v1";
    pub const ABSFIX_SNAPSHOT_V1: &str = "absfix.snapshot.v1";
}

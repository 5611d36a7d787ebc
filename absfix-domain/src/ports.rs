use crate::error::RepairError;
use crate::members::MemberTable;
use crate::target::ClassTarget;
use camino::Utf8Path;

/// A base type as instantiated by one class: the declaration name plus the type arguments
/// that class supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHandle {
    pub name: String,
    pub type_args: Vec<String>,
}

impl std::fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.type_args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}<{}>", self.name, self.type_args.join(", "))
        }
    }
}

/// Read-only semantic model.
///
/// absfix-domain never mutates this; implementations wrap whatever the host compiler exposes.
pub trait TypeResolver {
    /// Resolve the class's base type reference, with its type arguments.
    fn instantiated_base_type(&self, class: &ClassTarget) -> Result<TypeHandle, RepairError>;

    /// All members of the instantiated type, inherited ones included, in declaration order.
    /// Signatures must already have the type's parameters substituted.
    fn members_of(&self, ty: &TypeHandle) -> Result<MemberTable, RepairError>;
}

/// Maps a diagnostic position back to the class declaration it reports on.
pub trait AstLocator {
    fn find_class_at(&self, file: &Utf8Path, position: u64) -> Result<ClassTarget, RepairError>;
}

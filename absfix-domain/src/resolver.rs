use crate::error::RepairError;
use crate::ports::{TypeHandle, TypeResolver};
use crate::target::ClassTarget;
use absfix_types::member::MemberDescriptor;
use tracing::debug;

/// Members a class still has to declare, in base-type declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    pub base: TypeHandle,
    members: Vec<MemberDescriptor>,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemberDescriptor> {
        self.members.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a MemberDescriptor;
    type IntoIter = std::slice::Iter<'a, MemberDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Computes the abstract members a concrete class owes its base class.
pub struct MemberResolver<'a> {
    types: &'a dyn TypeResolver,
}

impl<'a> MemberResolver<'a> {
    pub fn new(types: &'a dyn TypeResolver) -> Self {
        Self { types }
    }

    /// Abstract, non-private members of the instantiated base type that the class does not
    /// declare yet.
    pub fn resolve(&self, class: &ClassTarget) -> Result<CandidateSet, RepairError> {
        class.single_base()?;

        let base = self.types.instantiated_base_type(class)?;
        let table = self.types.members_of(&base)?;

        // The table is keyed by name upstream, so duplicates cannot occur here.
        let members: Vec<MemberDescriptor> = table
            .iter()
            .filter(|m| m.is_owed() && !class.declares(&m.name))
            .cloned()
            .collect();

        debug!(
            class = %class.display_name(),
            base = %base,
            inherited = table.len(),
            owed = members.len(),
            "resolved candidate members"
        );

        Ok(CandidateSet { base, members })
    }
}

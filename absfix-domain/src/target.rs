use crate::error::RepairError;
use absfix_types::edit::{ClassKey, InsertionAnchor};
use absfix_types::snapshot::HeritageRef;
use std::collections::BTreeSet;

/// One concrete class declaration located from a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTarget {
    pub key: ClassKey,

    /// `None` for anonymous class expressions.
    pub name: Option<String>,

    pub anchor: InsertionAnchor,

    /// `extends` clauses as written. A repairable class has exactly one.
    pub heritage: Vec<HeritageRef>,

    /// Names the class body already declares.
    pub declared: BTreeSet<String>,
}

impl ClassTarget {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => format!("class expression at {}", self.key),
        }
    }

    /// The single base type abstract members are drawn from.
    pub fn single_base(&self) -> Result<&HeritageRef, RepairError> {
        match self.heritage.as_slice() {
            [base] => Ok(base),
            [] => Err(RepairError::unresolvable(
                self.display_name(),
                "class has no extends clause",
            )),
            more => Err(RepairError::unresolvable(
                self.display_name(),
                format!("expected a single base class, found {}", more.len()),
            )),
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.declared.contains(name)
    }
}

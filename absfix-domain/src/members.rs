use absfix_types::member::MemberDescriptor;
use std::collections::HashMap;

/// Name-keyed member map that iterates in declaration order.
///
/// A name can only appear once: inserting an existing name replaces the descriptor but keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberTable {
    members: Vec<MemberDescriptor>,
    index: HashMap<String, usize>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, member: MemberDescriptor) {
        match self.index.get(&member.name) {
            Some(&i) => self.members[i] = member,
            None => {
                self.index.insert(member.name.clone(), self.members.len());
                self.members.push(member);
            }
        }
    }

    /// Insert only if no member with that name is present yet.
    ///
    /// Used when walking up a heritage chain: the most derived declaration wins.
    pub fn insert_inherited(&mut self, member: MemberDescriptor) -> bool {
        if self.index.contains_key(&member.name) {
            return false;
        }
        self.insert(member);
        true
    }

    /// Insert a member of a single declaration.
    ///
    /// A getter and a setter of the same name fold into one accessor pair; any other repeated
    /// name (overload signatures) keeps the first declaration.
    pub fn declare(&mut self, member: MemberDescriptor) {
        match self.index.get(&member.name) {
            Some(&i) => {
                self.members[i].merge_accessor(&member);
            }
            None => self.insert(member),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MemberDescriptor> {
        self.index.get(name).map(|&i| &self.members[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemberDescriptor> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<MemberDescriptor> for MemberTable {
    fn from_iter<I: IntoIterator<Item = MemberDescriptor>>(iter: I) -> Self {
        let mut table = MemberTable::new();
        for m in iter {
            table.insert(m);
        }
        table
    }
}

impl IntoIterator for MemberTable {
    type Item = MemberDescriptor;
    type IntoIter = std::vec::IntoIter<MemberDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a MemberTable {
    type Item = &'a MemberDescriptor;
    type IntoIter = std::slice::Iter<'a, MemberDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

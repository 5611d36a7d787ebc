//! Snapshot-backed implementation of both model ports.

use crate::error::RepairError;
use crate::instantiate::Substitution;
use crate::members::MemberTable;
use crate::ports::{AstLocator, TypeHandle, TypeResolver};
use crate::target::ClassTarget;
use absfix_types::edit::{ClassKey, EditSet, InsertionAnchor};
use absfix_types::snapshot::{ClassDecl, ProgramSnapshot};
use anyhow::Context;
use camino::Utf8Path;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum DeclRef {
    File { file: usize, class: usize },
    External(usize),
}

/// A [`ProgramSnapshot`] indexed for lookups by class name and by source position.
///
/// Names resolve to the first declaration found, source files before externals.
#[derive(Debug, Clone)]
pub struct SnapshotProgram {
    snapshot: ProgramSnapshot,
    by_name: HashMap<String, DeclRef>,
}

impl SnapshotProgram {
    pub fn new(snapshot: ProgramSnapshot) -> Self {
        let mut by_name = HashMap::new();
        for (fi, file) in snapshot.files.iter().enumerate() {
            for (ci, class) in file.classes.iter().enumerate() {
                if let Some(name) = &class.name {
                    by_name
                        .entry(name.clone())
                        .or_insert(DeclRef::File { file: fi, class: ci });
                }
            }
        }
        for (ei, class) in snapshot.externals.iter().enumerate() {
            if let Some(name) = &class.name {
                by_name.entry(name.clone()).or_insert(DeclRef::External(ei));
            }
        }
        Self { snapshot, by_name }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let snapshot: ProgramSnapshot =
            serde_json::from_str(json).context("parse program snapshot")?;
        Ok(Self::new(snapshot))
    }

    pub fn load(path: &Utf8Path) -> anyhow::Result<Self> {
        let json = fs_err::read_to_string(path)
            .with_context(|| format!("read program snapshot {}", path))?;
        Self::from_json(&json).with_context(|| format!("load program snapshot {}", path))
    }

    pub fn snapshot(&self) -> &ProgramSnapshot {
        &self.snapshot
    }

    /// Fold applied edits back into the declaration model. Returns the number of members added.
    pub fn absorb(&mut self, edits: &EditSet) -> usize {
        // Only member lists change, so the name index stays valid.
        self.snapshot.absorb(edits)
    }

    fn decl(&self, r: DeclRef) -> &ClassDecl {
        match r {
            DeclRef::File { file, class } => &self.snapshot.files[file].classes[class],
            DeclRef::External(i) => &self.snapshot.externals[i],
        }
    }

    fn lookup(&self, name: &str) -> Option<&ClassDecl> {
        self.by_name.get(name).map(|r| self.decl(*r))
    }
}

impl TypeResolver for SnapshotProgram {
    fn instantiated_base_type(&self, class: &ClassTarget) -> Result<TypeHandle, RepairError> {
        let base = class.single_base()?;
        match self.lookup(&base.name) {
            Some(decl) if decl.is_class_like() => Ok(TypeHandle {
                name: base.name.clone(),
                type_args: base.type_args.clone(),
            }),
            Some(_) => Err(RepairError::unresolvable(
                class.display_name(),
                format!("base type `{}` is not a class", base.name),
            )),
            None => Err(RepairError::unresolvable(
                class.display_name(),
                format!("unknown base type `{}`", base.name),
            )),
        }
    }

    fn members_of(&self, ty: &TypeHandle) -> Result<MemberTable, RepairError> {
        let mut table = MemberTable::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = ty.clone();

        loop {
            let Some(decl) = self.lookup(&current.name) else {
                return Err(RepairError::unresolvable(
                    ty.to_string(),
                    format!("unknown base type `{}`", current.name),
                ));
            };
            // `lookup` returned Some, so the indexed name is the declaration's own.
            let name = decl.name.as_deref().unwrap_or_default();
            if !visited.insert(name) {
                return Err(RepairError::unresolvable(
                    ty.to_string(),
                    format!("circular heritage through `{name}`"),
                ));
            }
            if !decl.is_class_like() {
                return Err(RepairError::unresolvable(
                    ty.to_string(),
                    format!("base type `{name}` is not a class"),
                ));
            }

            let sub = Substitution::bind(&decl.type_params, &current.type_args);
            let mut level = MemberTable::new();
            for m in &decl.members {
                level.declare(sub.member(m));
            }
            for m in level {
                table.insert_inherited(m);
            }

            match decl.extends.as_slice() {
                [] => break,
                [next] => {
                    current = TypeHandle {
                        name: next.name.clone(),
                        type_args: next.type_args.iter().map(|a| sub.apply(a)).collect(),
                    };
                }
                more => {
                    return Err(RepairError::unresolvable(
                        ty.to_string(),
                        format!("`{name}` extends {} types", more.len()),
                    ));
                }
            }
        }

        debug!(ty = %ty, members = table.len(), depth = visited.len(), "collected members");
        Ok(table)
    }
}

impl AstLocator for SnapshotProgram {
    fn find_class_at(&self, file: &Utf8Path, position: u64) -> Result<ClassTarget, RepairError> {
        let not_a_class = || RepairError::NotAClass {
            file: file.to_path_buf(),
            position,
        };

        let source = self.snapshot.file(file).ok_or_else(not_a_class)?;

        // Innermost wins when a class expression sits inside another class.
        let decl = source
            .classes
            .iter()
            .filter(|c| c.name_span.contains(position))
            .min_by_key(|c| c.span.end.saturating_sub(c.span.start))
            .ok_or_else(not_a_class)?;

        if !decl.is_class_like() {
            return Err(not_a_class());
        }

        Ok(ClassTarget {
            key: ClassKey::new(file, decl.span.start),
            name: decl.name.clone(),
            anchor: InsertionAnchor::after_open_brace(decl.open_brace),
            heritage: decl.extends.clone(),
            declared: decl.members.iter().map(|m| m.name.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn program() -> SnapshotProgram {
        let snapshot = serde_json::from_value(json!({
            "schema": "absfix.snapshot.v1",
            "files": [{
                "path": "a.ts",
                "classes": [
                    {
                        "name": "Outer",
                        "span": { "start": 0, "end": 200 },
                        "name_span": { "start": 6, "end": 11 },
                        "open_brace": 12
                    },
                    {
                        "form": "expression",
                        "span": { "start": 40, "end": 80 },
                        "name_span": { "start": 40, "end": 45 },
                        "open_brace": 60,
                        "extends": [{ "name": "Outer" }]
                    },
                    {
                        "name": "Shape",
                        "form": "other",
                        "span": { "start": 100, "end": 150 },
                        "name_span": { "start": 110, "end": 115 },
                        "open_brace": 116
                    }
                ]
            }]
        }))
        .unwrap();
        SnapshotProgram::new(snapshot)
    }

    #[test]
    fn locates_by_name_span() {
        let p = program();
        let outer = p.find_class_at(Utf8Path::new("a.ts"), 8).unwrap();
        assert_eq!(outer.name.as_deref(), Some("Outer"));
        assert_eq!(outer.anchor.position(), 13);

        let expr = p.find_class_at(Utf8Path::new("a.ts"), 42).unwrap();
        assert_eq!(expr.name, None);
        assert_eq!(expr.key, ClassKey::new("a.ts", 40));
    }

    #[test]
    fn positions_off_the_name_are_not_classes() {
        let p = program();
        for (file, pos) in [("a.ts", 30), ("a.ts", 112), ("missing.ts", 8)] {
            assert!(matches!(
                p.find_class_at(Utf8Path::new(file), pos),
                Err(RepairError::NotAClass { .. })
            ));
        }
    }

    #[test]
    fn non_class_base_is_unresolvable() {
        let p = program();
        let mut target = p.find_class_at(Utf8Path::new("a.ts"), 42).unwrap();
        target.heritage = vec![absfix_types::snapshot::HeritageRef::new("Shape")];
        let err = p.instantiated_base_type(&target).unwrap_err();
        assert!(err.to_string().contains("not a class"));
    }
}

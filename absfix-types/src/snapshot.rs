//! Serialized view of a program's class declarations.
//!
//! A snapshot is produced by the host compiler and is the only semantic input absfix needs:
//! class spans (for locating a diagnostic's class), heritage clauses and declared members.

use crate::edit::{EditSet, StubKind};
use crate::member::{MemberDescriptor, MemberShape, Param, TypeParam};
use crate::path::same_file;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    pub schema: String,

    #[serde(default)]
    pub files: Vec<SourceFileDecl>,

    /// Class declarations with no source in this program (ambient/library types).
    #[serde(default)]
    pub externals: Vec<ClassDecl>,
}

impl Default for ProgramSnapshot {
    fn default() -> Self {
        Self {
            schema: crate::schema::ABSFIX_SNAPSHOT_V1.to_string(),
            files: vec![],
            externals: vec![],
        }
    }
}

impl ProgramSnapshot {
    pub fn file(&self, path: &camino::Utf8Path) -> Option<&SourceFileDecl> {
        self.files.iter().find(|f| same_file(&f.path, path))
    }

    /// Record every stub of `edits` as a declared, concrete member of its class.
    ///
    /// Offsets are left untouched: this updates the declaration model only, so a snapshot that
    /// absorbed an edit set answers "what does this class declare now" without a re-parse.
    /// Returns the number of members added.
    pub fn absorb(&mut self, edits: &EditSet) -> usize {
        let mut added = 0;
        for fe in &edits.files {
            let Some(file) = self.files.iter_mut().find(|f| same_file(&f.path, &fe.path)) else {
                continue;
            };
            for ce in &fe.classes {
                let Some(class) = file
                    .classes
                    .iter_mut()
                    .find(|c| c.span.start == ce.class.start)
                else {
                    continue;
                };
                for stub in &ce.stubs {
                    if class.members.iter().any(|m| m.name == stub.name) {
                        continue;
                    }
                    class
                        .members
                        .push(MemberDescriptor::new(stub.name.clone(), declared_shape(stub.kind)));
                    added += 1;
                }
            }
        }
        added
    }
}

fn declared_shape(kind: StubKind) -> MemberShape {
    match kind {
        StubKind::Method => MemberShape::Method {
            type_params: vec![],
            params: vec![],
            return_type: None,
        },
        StubKind::Property => MemberShape::Property { ty: None },
        StubKind::GetAccessor => MemberShape::GetAccessor { return_type: None },
        StubKind::SetAccessor => MemberShape::SetAccessor {
            param: value_param(),
        },
        StubKind::AccessorPair => MemberShape::AccessorPair {
            return_type: None,
            param: value_param(),
        },
    }
}

fn value_param() -> Param {
    Param {
        name: "value".to_string(),
        ty: None,
        optional: false,
        rest: false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileDecl {
    pub path: Utf8PathBuf,

    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassForm {
    #[default]
    Declaration,
    Expression,
    /// Any non-class declaration the host chose to include (interfaces, enums, ...).
    Other,
}

/// A reference to a base type in an `extends` clause, e.g. `Repo<User, number>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeritageRef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_args: Vec<String>,
}

impl HeritageRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_args: vec![],
        }
    }

    pub fn with_args<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            type_args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for HeritageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.type_args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}<{}>", self.name, self.type_args.join(", "))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    /// `None` for anonymous class expressions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub form: ClassForm,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub span: Span,

    /// The name identifier, or the `class` keyword for class expressions.
    #[serde(default)]
    pub name_span: Span,

    /// Offset of the `{` that opens the class body.
    #[serde(default)]
    pub open_brace: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<HeritageRef>,

    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
}

impl ClassDecl {
    pub fn is_class_like(&self) -> bool {
        matches!(self.form, ClassForm::Declaration | ClassForm::Expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::{ClassEdit, ClassKey, FileEdit, InsertionAnchor, StubDeclaration};
    use camino::Utf8Path;

    fn snapshot() -> ProgramSnapshot {
        serde_json::from_value(serde_json::json!({
            "schema": "absfix.snapshot.v1",
            "files": [{
                "path": "src/shapes.ts",
                "classes": [{ "name": "Circle", "span": { "start": 10, "end": 40 }, "open_brace": 30 }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn file_lookup_normalizes_both_sides() {
        let s = snapshot();
        assert!(s.file(Utf8Path::new("./src/shapes.ts")).is_some());
        assert!(s.file(Utf8Path::new("src/../src/shapes.ts")).is_some());
        assert!(s.file(Utf8Path::new("shapes.ts")).is_none());
    }

    #[test]
    fn absorb_matches_dotted_edit_paths() {
        let mut s = snapshot();
        let mut file = FileEdit::new("./src/shapes.ts");
        file.classes.push(ClassEdit {
            id: "x".to_string(),
            class: ClassKey::new("./src/shapes.ts", 10),
            class_name: Some("Circle".to_string()),
            anchor: InsertionAnchor::after_open_brace(30),
            stubs: vec![StubDeclaration {
                name: "area".to_string(),
                kind: StubKind::Method,
                text: "area() {}".to_string(),
            }],
            skipped: vec![],
            triggers: vec![],
        });
        let mut edits = EditSet::new();
        edits.files.push(file);

        assert_eq!(s.absorb(&edits), 1);
        assert_eq!(s.files[0].classes[0].members[0].name, "area");
    }
}

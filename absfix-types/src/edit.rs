use crate::diagnostic::DiagnosticRef;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Identity of one class declaration: its file plus the offset where the declaration starts.
///
/// A class declaration belongs to exactly one file, so keys never collide across files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassKey {
    pub file: Utf8PathBuf,
    pub start: u64,
}

impl ClassKey {
    pub fn new(file: impl Into<Utf8PathBuf>, start: u64) -> Self {
        Self {
            file: file.into(),
            start,
        }
    }
}

impl std::fmt::Display for ClassKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.file, self.start)
    }
}

/// Opaque insertion point inside a class body: immediately after its opening brace.
///
/// Produced by the AST locator; consumers only hand it back to a patch applier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsertionAnchor(u64);

impl InsertionAnchor {
    pub fn after_open_brace(open_brace: u64) -> Self {
        Self(open_brace.saturating_add(1))
    }

    /// Byte offset at which inserted text starts.
    pub fn position(self) -> u64 {
        self.0
    }
}

/// Placeholder convention for synthesized bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubPolicy {
    /// `throw new Error("Method not implemented.");`
    #[default]
    ThrowStub,
    /// Return a minimal value of the declared type where one is knowable.
    TypeDefault,
    /// A `TODO` marker comment.
    CommentMarker,
}

impl StubPolicy {
    pub fn label(self) -> &'static str {
        match self {
            StubPolicy::ThrowStub => "throw_stub",
            StubPolicy::TypeDefault => "type_default",
            StubPolicy::CommentMarker => "comment_marker",
        }
    }
}

impl std::str::FromStr for StubPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "throw_stub" | "throw" => Ok(StubPolicy::ThrowStub),
            "type_default" | "default" => Ok(StubPolicy::TypeDefault),
            "comment_marker" | "comment" => Ok(StubPolicy::CommentMarker),
            other => Err(format!("unknown stub policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubKind {
    Method,
    Property,
    GetAccessor,
    SetAccessor,
    /// Getter and setter of one name, emitted together.
    AccessorPair,
}

/// A synthesized member declaration.
///
/// `text` is unindented; nested lines already carry one indent unit per level and lines are
/// separated by `\n`. The patch applier re-indents and converts newlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubDeclaration {
    pub name: String,
    pub kind: StubKind,
    pub text: String,
}

/// An owed member that could not be synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMember {
    pub name: String,
    pub reason: String,
}

/// All insertions for one class: a single contiguous block at its anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEdit {
    /// Deterministic id (uuid v5 over file, class and member names).
    pub id: String,

    pub class: ClassKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    pub anchor: InsertionAnchor,

    pub stubs: Vec<StubDeclaration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedMember>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<DiagnosticRef>,
}

impl ClassEdit {
    pub fn display_name(&self) -> &str {
        self.class_name.as_deref().unwrap_or("(anonymous class)")
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.stubs.iter().map(|s| s.name.as_str())
    }
}

/// All class edits for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEdit {
    pub path: Utf8PathBuf,

    /// sha256 of the file contents the edit was computed against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    pub classes: Vec<ClassEdit>,
}

impl FileEdit {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            sha256: None,
            classes: vec![],
        }
    }
}

/// Aggregated insertions for a whole repair run, one entry per touched file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditSet {
    pub schema: String,

    #[serde(default)]
    pub files: Vec<FileEdit>,
}

impl Default for EditSet {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSet {
    pub fn new() -> Self {
        Self {
            schema: crate::schema::ABSFIX_EDITS_V1.to_string(),
            files: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(|f| f.classes.is_empty())
    }

    pub fn file(&self, path: &Utf8Path) -> Option<&FileEdit> {
        self.files.iter().find(|f| crate::path::same_file(&f.path, path))
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassEdit> {
        self.files.iter().flat_map(|f| f.classes.iter())
    }

    pub fn class_count(&self) -> usize {
        self.classes().count()
    }

    pub fn stub_count(&self) -> usize {
        self.classes().map(|c| c.stubs.len()).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.classes().map(|c| c.skipped.len()).sum()
    }
}

/// Layout hints passed to the patch applier alongside inserted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingHint {
    pub newline: String,
    pub indent_unit: String,
}

impl Default for FormattingHint {
    fn default() -> Self {
        Self {
            newline: "\n".to_string(),
            indent_unit: "    ".to_string(),
        }
    }
}

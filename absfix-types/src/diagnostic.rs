use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Compiler diagnostic codes this tool repairs.
pub mod codes {
    /// Non-abstract class '{0}' does not implement inherited abstract member '{1}' from class '{2}'.
    pub const CLASS_MISSING_ABSTRACT_MEMBER: u32 = 2515;

    /// Non-abstract class expression does not implement inherited abstract member '{0}' from class '{1}'.
    pub const CLASS_EXPRESSION_MISSING_ABSTRACT_MEMBER: u32 = 2653;

    pub const RECOGNIZED: &[u32] = &[
        CLASS_MISSING_ABSTRACT_MEMBER,
        CLASS_EXPRESSION_MISSING_ABSTRACT_MEMBER,
    ];

    pub fn is_recognized(code: u32) -> bool {
        RECOGNIZED.contains(&code)
    }
}

/// A diagnostics report as emitted by a compiler front end.
///
/// Reading is tolerant: unknown fields are ignored and optional fields may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Schema identifier, e.g. "tsc.diagnostics.v1".
    pub schema: String,

    pub tool: ToolInfo,

    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Suggestion,
    Message,
}

/// One diagnostic: a code plus a span in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: u32,

    pub file: Utf8PathBuf,

    /// Byte offset of the span start. For the recognized codes this is the class name
    /// identifier, or the `class` keyword of a class expression.
    pub start: u64,

    #[serde(default)]
    pub length: u64,

    #[serde(default)]
    pub category: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Diagnostic {
    pub fn new(code: u32, file: impl Into<Utf8PathBuf>, start: u64) -> Self {
        Self {
            code,
            file: file.into(),
            start,
            length: 0,
            category: Severity::Error,
            message: None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        codes::is_recognized(self.code)
    }

    pub fn to_ref(&self) -> DiagnosticRef {
        DiagnosticRef {
            code: self.code,
            file: self.file.clone(),
            start: self.start,
        }
    }
}

/// Compact back-reference from an edit to the diagnostic that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiagnosticRef {
    pub code: u32,
    pub file: Utf8PathBuf,
    pub start: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerant_report_parsing() {
        let report: DiagnosticReport = serde_json::from_value(serde_json::json!({
            "schema": "tsc.diagnostics.v1",
            "tool": { "name": "tsc", "extra": true },
            "diagnostics": [
                { "code": 2515, "file": "src/shapes.ts", "start": 42, "unexpected": 1 }
            ]
        }))
        .expect("parse");
        assert_eq!(report.diagnostics.len(), 1);
        let d = &report.diagnostics[0];
        assert!(d.is_recognized());
        assert_eq!(d.length, 0);
        assert_eq!(d.category, Severity::Error);
    }

    #[test]
    fn unrelated_codes_are_not_recognized() {
        assert!(!codes::is_recognized(2420));
        assert!(codes::is_recognized(2653));
    }
}

use crate::error::{EditResult, PolicyBlockError};
use absfix_types::edit::{FormattingHint, InsertionAnchor};
use std::collections::BTreeMap;

/// Text insertion primitive. Insertion only, always right after a class body's opening brace.
pub trait PatchApplier {
    fn insert_after(
        &mut self,
        anchor: InsertionAnchor,
        text: &str,
        hint: &FormattingHint,
    ) -> EditResult<()>;
}

/// In-memory source file that collects insertions against its original offsets.
///
/// Anchors always refer to the unmodified text, so insertions can be queued in any order;
/// [`SourceBuffer::render`] splices them in back to front.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    original: String,
    insertions: BTreeMap<usize, String>,
}

impl SourceBuffer {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            insertions: BTreeMap::new(),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn insertion_count(&self) -> usize {
        self.insertions.len()
    }

    pub fn render(&self) -> String {
        let extra: usize = self.insertions.values().map(String::len).sum();
        let mut out = String::with_capacity(self.original.len() + extra);
        let mut cursor = 0;
        for (&pos, text) in &self.insertions {
            out.push_str(&self.original[cursor..pos]);
            out.push_str(text);
            cursor = pos;
        }
        out.push_str(&self.original[cursor..]);
        out
    }

    fn check_anchor(&self, pos: usize) -> EditResult<()> {
        let fits = pos > 0
            && pos <= self.original.len()
            && self.original.is_char_boundary(pos)
            && self.original.as_bytes()[pos - 1] == b'{';
        if !fits {
            return Err(PolicyBlockError::AnchorMismatch {
                message: format!("offset {pos} does not follow an opening brace"),
            }
            .into());
        }
        if self.insertions.contains_key(&pos) {
            return Err(PolicyBlockError::AnchorMismatch {
                message: format!("offset {pos} already has an insertion"),
            }
            .into());
        }
        Ok(())
    }
}

impl PatchApplier for SourceBuffer {
    fn insert_after(
        &mut self,
        anchor: InsertionAnchor,
        text: &str,
        hint: &FormattingHint,
    ) -> EditResult<()> {
        let pos = usize::try_from(anchor.position()).map_err(|_| {
            PolicyBlockError::AnchorMismatch {
                message: format!("offset {} is out of range", anchor.position()),
            }
        })?;
        self.check_anchor(pos)?;

        let block = format_block(&self.original, pos, text, hint);
        self.insertions.insert(pos, block);
        Ok(())
    }
}

/// Lay out `text` as class members starting at `pos`.
///
/// Each line goes on its own line, one indent unit deeper than the line holding the brace.
/// When the brace is followed by more text on the same line (`{}`), the block is closed with a
/// newline so that text stays at the class indentation.
fn format_block(source: &str, pos: usize, text: &str, hint: &FormattingHint) -> String {
    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    let class_indent: String = source[line_start..pos]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    let member_indent = format!("{class_indent}{}", hint.indent_unit);

    let mut out = String::new();
    for line in text.lines() {
        out.push_str(&hint.newline);
        if !line.is_empty() {
            out.push_str(&member_indent);
            out.push_str(line);
        }
    }

    let rest_of_line_is_empty = source[pos..]
        .chars()
        .take_while(|c| *c != '\n')
        .all(|c| c.is_whitespace());
    if !rest_of_line_is_empty {
        out.push_str(&hint.newline);
        out.push_str(&class_indent);
    }
    out
}

/// The newline convention a file already uses (`\r\n` if its first line break is one).
pub fn detect_newline(source: &str) -> &'static str {
    match source.find('\n') {
        Some(i) if i > 0 && source.as_bytes()[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hint() -> FormattingHint {
        FormattingHint::default()
    }

    #[test]
    fn inserts_indented_block_after_brace() {
        let src = "class Circle extends Shape {\n    radius = 1;\n}\n";
        let mut buf = SourceBuffer::new(src);
        buf.insert_after(
            InsertionAnchor::after_open_brace(27),
            "area(): number {\n    return 0;\n}",
            &hint(),
        )
        .unwrap();
        assert_eq!(
            buf.render(),
            "class Circle extends Shape {\n    area(): number {\n        return 0;\n    }\n    radius = 1;\n}\n"
        );
    }

    #[test]
    fn empty_body_is_split_onto_lines() {
        let src = "  class A extends B {}";
        let mut buf = SourceBuffer::new(src);
        buf.insert_after(InsertionAnchor::after_open_brace(20), "x: number;", &hint())
            .unwrap();
        assert_eq!(buf.render(), "  class A extends B {\n      x: number;\n  }");
    }

    #[test]
    fn crlf_hint_is_honoured() {
        let src = "class A extends B {\r\n}\r\n";
        assert_eq!(detect_newline(src), "\r\n");
        let h = FormattingHint {
            newline: "\r\n".to_string(),
            indent_unit: "\t".to_string(),
        };
        let mut buf = SourceBuffer::new(src);
        buf.insert_after(InsertionAnchor::after_open_brace(18), "a(): void {}", &h)
            .unwrap();
        assert_eq!(buf.render(), "class A extends B {\r\n\ta(): void {}\r\n}\r\n");
    }

    #[test]
    fn anchors_are_against_original_offsets() {
        let src = "class A extends X {\n}\nclass B extends X {\n}\n";
        let mut buf = SourceBuffer::new(src);
        buf.insert_after(InsertionAnchor::after_open_brace(40), "b;", &hint())
            .unwrap();
        buf.insert_after(InsertionAnchor::after_open_brace(18), "a;", &hint())
            .unwrap();
        assert_eq!(
            buf.render(),
            "class A extends X {\n    a;\n}\nclass B extends X {\n    b;\n}\n"
        );
    }

    #[test]
    fn misplaced_anchor_is_a_policy_block() {
        let mut buf = SourceBuffer::new("class A {}");
        let err = buf
            .insert_after(InsertionAnchor::after_open_brace(3), "x;", &hint())
            .unwrap_err();
        assert!(err.is_policy_block());

        let err = buf
            .insert_after(InsertionAnchor::after_open_brace(200), "x;", &hint())
            .unwrap_err();
        assert!(err.is_policy_block());
    }

    #[test]
    fn second_insertion_at_same_anchor_is_rejected() {
        let mut buf = SourceBuffer::new("class A {}");
        let anchor = InsertionAnchor::after_open_brace(8);
        buf.insert_after(anchor, "x;", &hint()).unwrap();
        assert!(buf.insert_after(anchor, "y;", &hint()).is_err());
        assert_eq!(buf.insertion_count(), 1);
    }
}

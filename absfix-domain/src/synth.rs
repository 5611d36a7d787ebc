//! Stub synthesis: one concrete declaration per owed member.
//!
//! Output is TypeScript-shaped source text. The synthesizer only reads signatures; bodies are
//! placeholders chosen by [`StubPolicy`].

use crate::error::SynthError;
use absfix_types::edit::{StubDeclaration, StubKind, StubPolicy};
use absfix_types::member::{MemberDescriptor, MemberShape, Param, TypeParam};

const NOT_IMPLEMENTED: &str = "throw new Error(\"Method not implemented.\");";

#[derive(Debug, Clone)]
pub struct StubSynthesizer {
    policy: StubPolicy,
    indent_unit: String,
}

impl Default for StubSynthesizer {
    fn default() -> Self {
        Self::new(StubPolicy::default(), "    ")
    }
}

impl StubSynthesizer {
    pub fn new(policy: StubPolicy, indent_unit: impl Into<String>) -> Self {
        Self {
            policy,
            indent_unit: indent_unit.into(),
        }
    }

    pub fn policy(&self) -> StubPolicy {
        self.policy
    }

    pub fn synthesize(&self, member: &MemberDescriptor) -> Result<StubDeclaration, SynthError> {
        let (kind, text) = match &member.shape {
            MemberShape::Method {
                type_params,
                params,
                return_type,
            } => {
                let head = format!(
                    "{}{}{}{}({}){}",
                    modifiers(member, false),
                    member.name,
                    if member.optional { "?" } else { "" },
                    render_type_params(type_params),
                    render_params(params),
                    annotation(return_type.as_deref()),
                );
                let body = self.value_body(&member.name, return_type.as_deref());
                (StubKind::Method, self.block(&head, &body))
            }
            MemberShape::Property { ty } => (StubKind::Property, self.property(member, ty)),
            MemberShape::GetAccessor { return_type } => (
                StubKind::GetAccessor,
                self.getter(member, return_type.as_deref()),
            ),
            MemberShape::SetAccessor { param } => {
                (StubKind::SetAccessor, self.setter(member, param))
            }
            MemberShape::AccessorPair { return_type, param } => (
                StubKind::AccessorPair,
                format!(
                    "{}\n{}",
                    self.getter(member, return_type.as_deref()),
                    self.setter(member, param)
                ),
            ),
            MemberShape::Unknown => {
                return Err(SynthError::UnsupportedMemberShape {
                    member: member.name.clone(),
                    kind: member.shape.label().to_string(),
                });
            }
        };

        Ok(StubDeclaration {
            name: member.name.clone(),
            kind,
            text,
        })
    }

    fn property(&self, member: &MemberDescriptor, ty: &Option<String>) -> String {
        let mut out = format!("{}{}", modifiers(member, true), member.name);
        if member.optional {
            out.push('?');
        }
        out.push_str(&annotation(ty.as_deref()));

        if self.policy == StubPolicy::TypeDefault
            && !member.optional
            && let Some(value) = ty.as_deref().and_then(default_value)
        {
            out.push_str(" = ");
            out.push_str(&value);
        }
        out.push(';');
        out
    }

    fn getter(&self, member: &MemberDescriptor, return_type: Option<&str>) -> String {
        let head = format!(
            "{}get {}(){}",
            modifiers(member, false),
            member.name,
            annotation(return_type)
        );
        let body = self.value_body(&member.name, return_type);
        self.block(&head, &body)
    }

    fn setter(&self, member: &MemberDescriptor, param: &Param) -> String {
        let head = format!(
            "{}set {}({})",
            modifiers(member, false),
            member.name,
            render_param(param)
        );
        let body = match self.policy {
            StubPolicy::ThrowStub => vec![NOT_IMPLEMENTED.to_string()],
            StubPolicy::TypeDefault => vec![],
            StubPolicy::CommentMarker => vec![todo_marker(&member.name)],
        };
        self.block(&head, &body)
    }

    /// Body statements for something that returns `return_type`.
    fn value_body(&self, name: &str, return_type: Option<&str>) -> Vec<String> {
        match self.policy {
            StubPolicy::ThrowStub => vec![NOT_IMPLEMENTED.to_string()],
            StubPolicy::TypeDefault => {
                if !requires_value(return_type) {
                    return vec![];
                }
                match return_type.and_then(default_value) {
                    Some(v) => vec![format!("return {v};")],
                    None => vec![NOT_IMPLEMENTED.to_string()],
                }
            }
            StubPolicy::CommentMarker => {
                let mut body = vec![todo_marker(name)];
                if requires_value(return_type) {
                    body.push(NOT_IMPLEMENTED.to_string());
                }
                body
            }
        }
    }

    fn block(&self, head: &str, body: &[String]) -> String {
        if body.is_empty() {
            return format!("{head} {{}}");
        }
        let mut out = format!("{head} {{");
        for line in body {
            out.push('\n');
            out.push_str(&self.indent_unit);
            out.push_str(line);
        }
        out.push_str("\n}");
        out
    }
}

fn todo_marker(name: &str) -> String {
    format!("// TODO: implement {name}")
}

fn modifiers(member: &MemberDescriptor, is_property: bool) -> String {
    let mut out = String::new();
    if let Some(kw) = member.visibility.keyword() {
        out.push_str(kw);
        out.push(' ');
    }
    if is_property && member.readonly {
        out.push_str("readonly ");
    }
    out
}

fn annotation(ty: Option<&str>) -> String {
    match ty {
        Some(t) if !t.trim().is_empty() => format!(": {}", t.trim()),
        _ => String::new(),
    }
}

fn render_type_params(params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = params
        .iter()
        .map(|p| {
            let mut s = p.name.clone();
            if let Some(c) = &p.constraint {
                s.push_str(" extends ");
                s.push_str(c);
            }
            if let Some(d) = &p.default {
                s.push_str(" = ");
                s.push_str(d);
            }
            s
        })
        .collect();
    format!("<{}>", parts.join(", "))
}

fn render_params(params: &[Param]) -> String {
    params.iter().map(render_param).collect::<Vec<_>>().join(", ")
}

fn render_param(p: &Param) -> String {
    format!(
        "{}{}{}{}",
        if p.rest { "..." } else { "" },
        p.name,
        if p.optional { "?" } else { "" },
        annotation(p.ty.as_deref())
    )
}

/// Whether a body must end in a value for the declaration to type-check.
fn requires_value(return_type: Option<&str>) -> bool {
    match return_type.map(str::trim) {
        None => false,
        Some(t) => !matches!(t, "" | "void" | "undefined" | "any"),
    }
}

/// A minimal value of type `ty`, if one can be stated without guessing semantics.
pub(crate) fn default_value(ty: &str) -> Option<String> {
    // `(v: T) => A | null` is a function returning a union, not a nullable type.
    if is_function_type(ty) {
        return None;
    }
    let parts = split_top_level_union(ty);
    if parts.len() > 1 {
        if parts.iter().any(|p| *p == "undefined" || *p == "void") {
            return Some("undefined".to_string());
        }
        if parts.contains(&"null") {
            return Some("null".to_string());
        }
        return parts.first().and_then(|p| default_value(p));
    }

    let t = ty.trim();
    let value = match t {
        "number" => "0",
        "string" => "\"\"",
        "boolean" => "false",
        "bigint" => "0n",
        "any" | "undefined" => "undefined",
        "null" => "null",
        "true" | "false" => t,
        _ if t.ends_with("[]")
            || t.starts_with("Array<")
            || t.starts_with("ReadonlyArray<") =>
        {
            "[]"
        }
        _ if is_literal(t) => t,
        _ => return None,
    };
    Some(value.to_string())
}

fn is_literal(t: &str) -> bool {
    let quoted = t.len() >= 2
        && ((t.starts_with('"') && t.ends_with('"')) || (t.starts_with('\'') && t.ends_with('\'')));
    let numeric =
        t.starts_with(|c: char| c.is_ascii_digit() || c == '-') && t.parse::<f64>().is_ok();
    quoted || numeric
}

/// A top-level `=>` ahead of any top-level `|` makes the whole type a function type.
fn is_function_type(ty: &str) -> bool {
    let mut depth = 0i32;
    let bytes = ty.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'<' | b'[' | b'{' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'=' => {
                if depth == 0 {
                    return true;
                }
            }
            b')' | b'>' | b']' | b'}' => depth -= 1,
            b'|' if depth == 0 => return false,
            _ => {}
        }
    }
    false
}

fn split_top_level_union(ty: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let bytes = ty.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'<' | b'[' | b'{' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b')' | b'>' | b']' | b'}' => depth -= 1,
            b'|' if depth == 0 => {
                parts.push(ty[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(ty[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

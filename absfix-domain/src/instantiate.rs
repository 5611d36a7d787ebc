//! Generic instantiation of member signatures.
//!
//! Signatures are source text, so substitution works on identifier tokens: a type parameter
//! name is replaced wherever it appears as a standalone identifier, but not inside string
//! literals, after a `.` (qualified names) or in object-type key position. Template literal
//! types are substituted inside their `${...}` holes only.

use absfix_types::member::{MemberDescriptor, MemberShape, Param, TypeParam};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<String, String>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a declaration's type parameters to the arguments a reference supplies.
    ///
    /// Missing arguments fall back to the parameter default (itself instantiated with the
    /// bindings made so far); parameters with neither stay unbound and are left as written.
    pub fn bind(params: &[TypeParam], args: &[String]) -> Self {
        let mut sub = Substitution::new();
        for (i, p) in params.iter().enumerate() {
            let value = match args.get(i) {
                Some(a) => Some(a.trim().to_string()),
                None => p.default.as_deref().map(|d| sub.apply(d)),
            };
            if let Some(v) = value {
                sub.map.insert(p.name.clone(), v);
            }
        }
        sub
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// A copy without bindings for `names` (used for method-level type parameters).
    fn shadowed(&self, names: &[TypeParam]) -> Substitution {
        let mut map = self.map.clone();
        for p in names {
            map.remove(&p.name);
        }
        Substitution { map }
    }

    pub fn apply(&self, text: &str) -> String {
        if self.map.is_empty() {
            return text.to_string();
        }

        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut prev_sig: Option<char> = None;
        let mut brackets: Vec<char> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '`' {
                i = self.apply_template(&chars, i, &mut out);
                prev_sig = Some(c);
                continue;
            }

            if matches!(c, '"' | '\'') {
                let end = skip_string(&chars, i);
                out.extend(&chars[i..end]);
                prev_sig = Some(c);
                i = end;
                continue;
            }

            if is_ident_start(c) {
                let mut j = i + 1;
                while j < chars.len() && is_ident_continue(chars[j]) {
                    j += 1;
                }
                let word: String = chars[i..j].iter().collect();
                let next_sig = next_significant(&chars, j).map(|k| chars[k]);

                let qualified = prev_sig == Some('.');
                let key_position = brackets.last() == Some(&'{')
                    && matches!(prev_sig, Some('{' | ',' | ';'))
                    && starts_annotation(&chars, j);

                match self.map.get(&word) {
                    Some(rep) if !qualified && !key_position => {
                        if next_sig == Some('[') && needs_parens(rep) {
                            out.push('(');
                            out.push_str(rep);
                            out.push(')');
                        } else {
                            out.push_str(rep);
                        }
                    }
                    _ => out.push_str(&word),
                }
                prev_sig = Some(chars[j - 1]);
                i = j;
                continue;
            }

            match c {
                '(' | '[' | '{' | '<' => brackets.push(c),
                '>' if prev_sig == Some('=') => {}
                ')' | ']' | '}' | '>' => {
                    brackets.pop();
                }
                _ => {}
            }

            out.push(c);
            if !c.is_whitespace() {
                prev_sig = Some(c);
            }
            i += 1;
        }

        out
    }

    /// Copy a template literal starting at `start`, substituting inside each `${...}` hole.
    /// Returns the index one past the closing backtick (or end of input).
    fn apply_template(&self, chars: &[char], start: usize, out: &mut String) -> usize {
        out.push('`');
        let mut i = start + 1;
        while i < chars.len() {
            match chars[i] {
                '\\' => {
                    let end = (i + 2).min(chars.len());
                    out.extend(&chars[i..end]);
                    i = end;
                }
                '`' => {
                    out.push('`');
                    return i + 1;
                }
                '$' if chars.get(i + 1) == Some(&'{') => {
                    let open = i + 2;
                    let close = matching_brace(chars, open);
                    let hole: String = chars[open..close].iter().collect();
                    out.push_str("${");
                    out.push_str(&self.apply(&hole));
                    if close < chars.len() {
                        out.push('}');
                    }
                    i = close + 1;
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }
        chars.len()
    }

    /// Instantiate every type mentioned in a member's signature.
    pub fn member(&self, m: &MemberDescriptor) -> MemberDescriptor {
        if self.map.is_empty() {
            return m.clone();
        }

        let shape = match &m.shape {
            MemberShape::Method {
                type_params,
                params,
                return_type,
            } => {
                let inner = self.shadowed(type_params);
                MemberShape::Method {
                    type_params: type_params
                        .iter()
                        .map(|tp| TypeParam {
                            name: tp.name.clone(),
                            constraint: tp.constraint.as_deref().map(|c| inner.apply(c)),
                            default: tp.default.as_deref().map(|d| inner.apply(d)),
                        })
                        .collect(),
                    params: params.iter().map(|p| inner.param(p)).collect(),
                    return_type: return_type.as_deref().map(|t| inner.apply(t)),
                }
            }
            MemberShape::Property { ty } => MemberShape::Property {
                ty: ty.as_deref().map(|t| self.apply(t)),
            },
            MemberShape::GetAccessor { return_type } => MemberShape::GetAccessor {
                return_type: return_type.as_deref().map(|t| self.apply(t)),
            },
            MemberShape::SetAccessor { param } => MemberShape::SetAccessor {
                param: self.param(param),
            },
            MemberShape::AccessorPair { return_type, param } => MemberShape::AccessorPair {
                return_type: return_type.as_deref().map(|t| self.apply(t)),
                param: self.param(param),
            },
            MemberShape::Unknown => MemberShape::Unknown,
        };

        MemberDescriptor {
            shape,
            ..m.clone()
        }
    }

    fn param(&self, p: &Param) -> Param {
        Param {
            ty: p.ty.as_deref().map(|t| self.apply(t)),
            ..p.clone()
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn next_significant(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&k| !chars[k].is_whitespace())
}

/// `:` or `?:` follows at `from`, i.e. the preceding name is a property key.
fn starts_annotation(chars: &[char], from: usize) -> bool {
    match next_significant(chars, from) {
        Some(k) if chars[k] == ':' => true,
        Some(k) if chars[k] == '?' => {
            matches!(next_significant(chars, k + 1), Some(n) if chars[n] == ':')
        }
        _ => false,
    }
}

/// Index of the `}` closing a hole whose contents start at `from` (or end of input).
fn matching_brace(chars: &[char], from: usize) -> usize {
    let mut depth = 0usize;
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' | '`' => {
                i = skip_string(chars, i);
                continue;
            }
            '{' => depth += 1,
            '}' if depth == 0 => return i,
            '}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

/// Index one past the closing quote (or end of input).
fn skip_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn needs_parens(rep: &str) -> bool {
    let mut depth = 0i32;
    let chars: Vec<char> = rep.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        match c {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '>' if i > 0 && chars[i - 1] == '=' => {
                if depth == 0 {
                    return true;
                }
            }
            '>' => depth -= 1,
            '|' | '&' | '?' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

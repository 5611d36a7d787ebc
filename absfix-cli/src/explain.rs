//! Explanations for the `absfix explain` command.
//!
//! Covers the repair itself (keyed by name or by diagnostic code) and each stub policy.

use absfix_types::diagnostic::codes;
use absfix_types::edit::StubPolicy;

/// Information about the repair absfix performs.
#[derive(Debug, Clone)]
pub struct FixExplanation {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub safety_rationale: &'static str,
    pub remediation: &'static str,
    /// Diagnostic codes that trigger the repair.
    pub codes: &'static [u32],
}

pub static FIX: FixExplanation = FixExplanation {
    key: "missing-abstract-member",
    title: "Implement Inherited Abstract Members",
    description: r#"Adds stub declarations for every abstract member a concrete class inherits
but does not implement.

For each reported class absfix resolves the instantiated base type, collects
its abstract members across the whole inheritance chain, drops private members
and members the class already declares, and writes one block of stubs right
after the class body's opening brace. Generic parameters of the base are
substituted with the class's type arguments.

Example transformation:
    class Circle extends Shape {
    }
becomes:
    class Circle extends Shape {
        area(): number {
            throw new Error("Method not implemented.");
        }
        get name(): string {
            throw new Error("Method not implemented.");
        }
    }"#,
    safety_rationale: r#"The edit is insertion-only:
- Existing text is never modified or removed
- Each class receives at most one contiguous block, however many diagnostics point at it
- Members the class already declares are never re-added, so re-running is a no-op
- Plans record the sha256 of each file and apply refuses files that changed since"#,
    remediation: r#"Classes absfix could not repair are listed under "Unrepaired" in plan.md:
- not_a_class: the diagnostic does not point at a class declaration or expression
- unresolvable_base_type: the base is missing, not a class, has several bases,
  or the heritage chain is circular; fix the extends clause first
- no_supported_members: every owed member has a shape absfix cannot stub
  (index signatures, constructors); implement those by hand"#,
    codes: codes::RECOGNIZED,
};

/// Look up the fix by key, by diagnostic code (`2515`, `TS2515`), or by a stub policy name.
pub fn lookup(query: &str) -> Option<Topic> {
    let q = query.trim().to_ascii_lowercase().replace('_', "-");
    if q == FIX.key || q == "fix" {
        return Some(Topic::Fix(&FIX));
    }
    let code = q.strip_prefix("ts").unwrap_or(&q);
    if let Ok(code) = code.parse::<u32>()
        && FIX.codes.contains(&code)
    {
        return Some(Topic::Fix(&FIX));
    }
    q.parse::<StubPolicy>().ok().map(Topic::Policy)
}

#[derive(Debug, Clone, Copy)]
pub enum Topic {
    Fix(&'static FixExplanation),
    Policy(StubPolicy),
}

pub fn list_topics() -> Vec<&'static str> {
    vec![FIX.key, "throw-stub", "type-default", "comment-marker"]
}

pub fn policy_meaning(policy: StubPolicy) -> &'static str {
    match policy {
        StubPolicy::ThrowStub => {
            "THROW_STUB (default) fills every body and accessor with\n\
             `throw new Error(\"Method not implemented.\");`.\n\
             Properties are declared without an initializer."
        }
        StubPolicy::TypeDefault => {
            "TYPE_DEFAULT returns a minimal value of the declared type where one is knowable:\n\
             `0` for number, `\"\"` for string, `false` for boolean, `[]` for arrays,\n\
             `undefined` for optional or union-with-undefined types, nothing for void.\n\
             Other types fall back to the throw stub."
        }
        StubPolicy::CommentMarker => {
            "COMMENT_MARKER writes a `// TODO: implement <name>` marker in each body.\n\
             Bodies that must produce a value also keep the throw stub so the result\n\
             still type-checks."
        }
    }
}

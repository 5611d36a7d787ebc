//! Repo-relative path normalization.
//!
//! Diagnostics and snapshots come from different producers, so `./src/a.ts` and `src/a.ts`
//! must name the same file.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Drop `.` components and fold `..` into a preceding normal component.
///
/// Purely lexical: the filesystem is never consulted, so symlinks are not resolved.
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out: Vec<Utf8Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match out.last() {
                Some(Utf8Component::Normal(_)) => {
                    out.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    out.into_iter().collect()
}

pub fn same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    a == b || normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_current_dir() {
        assert_eq!(normalize(Utf8Path::new("./src/a.ts")), "src/a.ts");
        assert_eq!(normalize(Utf8Path::new("src/./a.ts")), "src/a.ts");
        assert!(same_file(Utf8Path::new("./a.ts"), Utf8Path::new("a.ts")));
    }

    #[test]
    fn folds_parent_dir() {
        assert_eq!(normalize(Utf8Path::new("src/lib/../a.ts")), "src/a.ts");
        assert_eq!(normalize(Utf8Path::new("../a.ts")), "../a.ts");
        assert_eq!(normalize(Utf8Path::new("/../a.ts")), "/a.ts");
        assert!(!same_file(Utf8Path::new("a.ts"), Utf8Path::new("b/a.ts")));
    }
}

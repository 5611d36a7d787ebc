//! Property-based tests for batch ordering and dedup in absfix-domain.
//!
//! These tests verify that:
//! - Shuffling or repeating diagnostics never changes which classes are repaired
//! - Each class gets at most one block, whatever the number of diagnostics
//! - Files always come out in path order

use absfix_domain::{RepairAggregator, SnapshotProgram};
use absfix_types::diagnostic::Diagnostic;
use absfix_types::edit::EditSet;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

const FILES: [&str; 3] = ["lib/a.ts", "lib/b.ts", "main.ts"];
const CLASSES_PER_FILE: u64 = 3;

/// Every file declares three concrete subclasses of `Base`, one per 100 bytes.
fn program() -> SnapshotProgram {
    let base = json!({
        "name": "Base",
        "abstract": true,
        "span": { "start": 0, "end": 90 },
        "name_span": { "start": 15, "end": 19 },
        "open_brace": 20,
        "members": [
            { "name": "run", "abstract": true,
              "shape": { "kind": "method", "params": [], "return_type": "void" } },
            { "name": "label", "abstract": true,
              "shape": { "kind": "property", "type": "string" } }
        ]
    });

    let files: Vec<_> = FILES
        .iter()
        .map(|path| {
            let classes: Vec<_> = (0..CLASSES_PER_FILE)
                .map(|i| {
                    let start = 100 * (i + 1);
                    json!({
                        "name": format!("C{i}"),
                        "span": { "start": start, "end": start + 90 },
                        "name_span": { "start": start + 6, "end": start + 8 },
                        "open_brace": start + 30,
                        "extends": [{ "name": "Base" }]
                    })
                })
                .collect();
            json!({ "path": path, "classes": classes })
        })
        .collect();

    let snapshot = json!({
        "schema": "absfix.snapshot.v1",
        "files": files,
        "externals": [base]
    });
    SnapshotProgram::from_json(&snapshot.to_string()).unwrap()
}

/// (file index, class index, byte offset inside the name) triples.
fn arb_diagnostics() -> impl Strategy<Value = Vec<Diagnostic>> {
    prop::collection::vec((0..FILES.len(), 0..CLASSES_PER_FILE, 6u64..8), 1..20).prop_map(
        |picks| {
            picks
                .into_iter()
                .map(|(f, c, off)| Diagnostic::new(2515, FILES[f], 100 * (c + 1) + off))
                .collect()
        },
    )
}

fn fingerprint(set: &EditSet) -> Vec<(String, u64, Vec<String>, String)> {
    set.files
        .iter()
        .flat_map(|f| {
            f.classes.iter().map(|c| {
                (
                    f.path.to_string(),
                    c.class.start,
                    c.member_names().map(str::to_string).collect(),
                    c.id.clone(),
                )
            })
        })
        .collect()
}

proptest! {
    /// Reversing the input changes nothing but trigger order.
    #[test]
    fn input_order_does_not_change_edits(diags in arb_diagnostics()) {
        let p = program();
        let agg = RepairAggregator::new(&p, &p);

        let forward = agg.repair_all(&diags).unwrap();
        let mut reversed = diags.clone();
        reversed.reverse();
        let backward = agg.repair_all(&reversed).unwrap();

        let forward_classes: HashSet<_> = fingerprint(&forward).into_iter().collect();
        let backward_classes: HashSet<_> = fingerprint(&backward).into_iter().collect();
        prop_assert_eq!(forward_classes, backward_classes);

        let paths: Vec<_> = forward.files.iter().map(|f| f.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        prop_assert_eq!(paths, sorted);
    }

    /// Each distinct class is repaired exactly once and keeps every trigger.
    #[test]
    fn one_block_per_class(diags in arb_diagnostics()) {
        let p = program();
        let set = RepairAggregator::new(&p, &p).repair_all(&diags).unwrap();

        let distinct: HashSet<_> = diags
            .iter()
            .map(|d| (d.file.clone(), d.start / 100))
            .collect();
        prop_assert_eq!(set.class_count(), distinct.len());
        prop_assert_eq!(set.stub_count(), 2 * distinct.len());

        let keys: HashSet<_> = set.classes().map(|c| c.class.clone()).collect();
        prop_assert_eq!(keys.len(), set.class_count());

        let triggers: usize = set.classes().map(|c| c.triggers.len()).sum();
        prop_assert_eq!(triggers, diags.len());
    }

    /// Running the same batch twice is byte-for-byte identical.
    #[test]
    fn repeated_runs_are_identical(diags in arb_diagnostics()) {
        let p = program();
        let agg = RepairAggregator::new(&p, &p);
        let a = serde_json::to_string(&agg.repair_all(&diags).unwrap()).unwrap();
        let b = serde_json::to_string(&agg.repair_all(&diags).unwrap()).unwrap();
        prop_assert_eq!(a, b);
    }
}

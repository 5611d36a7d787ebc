use crate::error::{BatchError, ClassFailure, PartialBatchFailure, RepairError};
use crate::ports::{AstLocator, TypeResolver};
use crate::resolver::MemberResolver;
use crate::synth::StubSynthesizer;
use crate::target::ClassTarget;
use absfix_types::diagnostic::{Diagnostic, DiagnosticRef};
use absfix_types::edit::{ClassEdit, ClassKey, EditSet, FileEdit, SkippedMember};
use absfix_types::path;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Caller-owned cancellation signal, checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives single-class and batch repair over the external type and AST model.
pub struct RepairAggregator<'a> {
    types: &'a dyn TypeResolver,
    locator: &'a dyn AstLocator,
    synth: StubSynthesizer,
}

/// Outcome of one class within a file, keyed by class identity.
enum Settled {
    Edit(usize),
    NothingOwed,
    Failed,
}

struct BatchRun {
    edits: EditSet,
    failures: Vec<ClassFailure>,
    cancelled: bool,
}

impl<'a> RepairAggregator<'a> {
    pub fn new(types: &'a dyn TypeResolver, locator: &'a dyn AstLocator) -> Self {
        Self {
            types,
            locator,
            synth: StubSynthesizer::default(),
        }
    }

    pub fn with_synthesizer(mut self, synth: StubSynthesizer) -> Self {
        self.synth = synth;
        self
    }

    /// Repair a single class. `Ok(None)` means the class owes nothing.
    pub fn repair_one(&self, class: &ClassTarget) -> Result<Option<EditSet>, RepairError> {
        let Some(edit) = self.repair_class(class, vec![])? else {
            return Ok(None);
        };

        let mut file = FileEdit::new(class.key.file.clone());
        file.classes.push(edit);
        let mut set = EditSet::new();
        set.files.push(file);
        Ok(Some(set))
    }

    /// Repair every class named by `diagnostics`, at most once per class.
    ///
    /// On failure the error still carries every edit that was computed.
    pub fn repair_all(&self, diagnostics: &[Diagnostic]) -> Result<EditSet, PartialBatchFailure> {
        let run = self.run_batch(diagnostics, None);
        if run.failures.is_empty() {
            Ok(run.edits)
        } else {
            Err(PartialBatchFailure {
                edits: run.edits,
                failures: run.failures,
            })
        }
    }

    /// Like [`repair_all`](Self::repair_all), stopping between files once `cancel` is set.
    pub fn repair_all_cancellable(
        &self,
        diagnostics: &[Diagnostic],
        cancel: &CancelFlag,
    ) -> Result<EditSet, BatchError> {
        let run = self.run_batch(diagnostics, Some(cancel));
        if run.cancelled {
            return Err(BatchError::Cancelled {
                completed: run.edits,
                failures: run.failures,
            });
        }
        if run.failures.is_empty() {
            Ok(run.edits)
        } else {
            Err(BatchError::Partial(PartialBatchFailure {
                edits: run.edits,
                failures: run.failures,
            }))
        }
    }

    fn run_batch(&self, diagnostics: &[Diagnostic], cancel: Option<&CancelFlag>) -> BatchRun {
        // Files in path order, diagnostics in input order within a file.
        let mut by_file: BTreeMap<Utf8PathBuf, Vec<&Diagnostic>> = BTreeMap::new();
        for d in diagnostics {
            if !d.is_recognized() {
                debug!(code = d.code, file = %d.file, "ignoring unrelated diagnostic");
                continue;
            }
            by_file.entry(path::normalize(&d.file)).or_default().push(d);
        }

        let mut run = BatchRun {
            edits: EditSet::new(),
            failures: Vec::new(),
            cancelled: false,
        };

        for (file, diags) in by_file {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                info!(
                    completed_files = run.edits.files.len(),
                    "batch cancelled"
                );
                run.cancelled = true;
                break;
            }

            let (file_edit, mut failures) = self.repair_file(&file, &diags);
            run.failures.append(&mut failures);
            if let Some(fe) = file_edit {
                run.edits.files.push(fe);
            }
        }

        info!(
            files = run.edits.files.len(),
            classes = run.edits.class_count(),
            stubs = run.edits.stub_count(),
            failures = run.failures.len(),
            "batch repair finished"
        );
        run
    }

    /// All edits for one file. The entry is only built once every diagnostic of the file has
    /// been handled.
    fn repair_file(
        &self,
        file: &Utf8Path,
        diags: &[&Diagnostic],
    ) -> (Option<FileEdit>, Vec<ClassFailure>) {
        let mut classes: Vec<ClassEdit> = Vec::new();
        let mut failures = Vec::new();
        let mut settled: HashMap<ClassKey, Settled> = HashMap::new();

        for d in diags {
            let class = match self.locator.find_class_at(file, d.start) {
                Ok(c) => c,
                Err(error) => {
                    warn!(file = %file, position = d.start, %error, "diagnostic does not point at a class");
                    failures.push(ClassFailure {
                        diagnostic: (*d).clone(),
                        class_name: None,
                        error,
                    });
                    continue;
                }
            };

            match settled.get(&class.key) {
                Some(Settled::Edit(i)) => {
                    debug!(class = %class.display_name(), "duplicate diagnostic for repaired class");
                    classes[*i].triggers.push(d.to_ref());
                    continue;
                }
                Some(Settled::NothingOwed | Settled::Failed) => continue,
                None => {}
            }

            match self.repair_class(&class, vec![d.to_ref()]) {
                Ok(Some(edit)) => {
                    settled.insert(class.key.clone(), Settled::Edit(classes.len()));
                    classes.push(edit);
                }
                Ok(None) => {
                    settled.insert(class.key.clone(), Settled::NothingOwed);
                }
                Err(error) => {
                    warn!(class = %class.display_name(), %error, "class left unrepaired");
                    settled.insert(class.key.clone(), Settled::Failed);
                    failures.push(ClassFailure {
                        diagnostic: (*d).clone(),
                        class_name: class.name.clone(),
                        error,
                    });
                }
            }
        }

        if classes.is_empty() {
            return (None, failures);
        }

        let mut fe = FileEdit::new(file);
        fe.classes = classes;
        (Some(fe), failures)
    }

    fn repair_class(
        &self,
        class: &ClassTarget,
        triggers: Vec<DiagnosticRef>,
    ) -> Result<Option<ClassEdit>, RepairError> {
        let candidates = MemberResolver::new(self.types).resolve(class)?;
        if candidates.is_empty() {
            debug!(class = %class.display_name(), "nothing owed");
            return Ok(None);
        }

        let mut stubs = Vec::new();
        let mut errors = Vec::new();
        for member in &candidates {
            match self.synth.synthesize(member) {
                Ok(stub) => stubs.push(stub),
                Err(e) => {
                    warn!(class = %class.display_name(), member = %member.name, error = %e, "skipping member");
                    errors.push(e);
                }
            }
        }

        if stubs.is_empty() {
            return Err(RepairError::NoSupportedMembers {
                class: class.display_name(),
                skipped: errors,
            });
        }

        let skipped = errors
            .iter()
            .map(|e| SkippedMember {
                name: e.member().to_string(),
                reason: e.to_string(),
            })
            .collect();

        let mut edit = ClassEdit {
            id: String::new(),
            class: class.key.clone(),
            class_name: class.name.clone(),
            anchor: class.anchor,
            stubs,
            skipped,
            triggers,
        };
        edit.id = deterministic_edit_id(&edit).to_string();
        Ok(Some(edit))
    }
}

fn deterministic_edit_id(edit: &ClassEdit) -> Uuid {
    // Deterministic ID: v5(namespace, stable_key_bytes)
    const NAMESPACE: Uuid = Uuid::from_bytes([
        0x9a, 0x41, 0x0e, 0x7c, 0x5b, 0x2f, 0x4d, 0x13, 0xa6, 0x88, 0x31, 0xc4, 0x70, 0x1d, 0xe2,
        0x5f,
    ]);

    let stable_key = format!(
        "{}|{}|{}",
        edit.class.file,
        edit.class.start,
        edit.member_names().collect::<Vec<_>>().join(",")
    );
    Uuid::new_v5(&NAMESPACE, stable_key.as_bytes())
}

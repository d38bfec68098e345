//! Form state controller
//!
//! Owns the current values of one application, the snapshot they were loaded
//! from, per-field touched/error state and the watch subscriptions. Every
//! write goes through [`FormController::set`], which routes it past the
//! destructive-change guard and notifies watchers once the change has been
//! committed.

use crate::error::{FormError, FormResult};
use crate::guard::{ConfirmChoice, ConfirmationPrompt, DestructiveChangeGuard, GuardDecision};
use crate::visibility::Visibility;
use indexmap::{IndexMap, IndexSet};
use rca_schema::{
    gate_for, Application, ApplicationKind, ApplicationStatus, Field, FieldError, FieldIssue,
    FieldPath, FieldValue, FormLayout, FormValues, Schema, Section, ValidationMode,
    ValidationReport,
};
use std::fmt;

/// Handle returned by [`FormController::watch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// What a watcher subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchTarget {
    Field(Field),
    Section(Section),
    Any,
}

impl WatchTarget {
    fn matches(self, field: Field) -> bool {
        match self {
            Self::Field(f) => f == field,
            Self::Section(s) => field.section() == s,
            Self::Any => true,
        }
    }
}

/// Committed change delivered to watchers
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: Field,
    pub previous: FieldValue,
    pub current: FieldValue,
}

/// Result of [`FormController::set`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// Value committed
    Applied,
    /// Value held back until the prompt is answered
    ConfirmationRequired(ConfirmationPrompt),
}

type Watcher = Box<dyn FnMut(&FieldChange) + Send>;

/// State of one open form
pub struct FormController {
    kind: ApplicationKind,
    status: ApplicationStatus,
    initial: FormValues,
    values: FormValues,
    touched: IndexSet<Field>,
    errors: IndexMap<FieldPath, FieldIssue>,
    schema: Schema,
    watchers: Vec<(WatchId, WatchTarget, Watcher)>,
    next_watch: u64,
    pending: Option<ConfirmationPrompt>,
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("touched", &self.touched)
            .field("errors", &self.errors.len())
            .field("watchers", &self.watchers.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl FormController {
    /// Controller with empty values
    #[must_use]
    pub fn new(kind: ApplicationKind, status: ApplicationStatus) -> Self {
        Self::with_values(kind, status, FormValues::default())
    }

    /// Controller initialised from a fetched application
    #[must_use]
    pub fn from_application(app: &Application) -> Self {
        Self::with_values(app.kind, app.status, app.form.clone())
    }

    fn with_values(kind: ApplicationKind, status: ApplicationStatus, values: FormValues) -> Self {
        Self {
            kind,
            status,
            initial: values.clone(),
            values,
            touched: IndexSet::new(),
            errors: IndexMap::new(),
            schema: Schema::for_kind(kind),
            watchers: Vec::new(),
            next_watch: 0,
            pending: None,
        }
    }

    /// Replace the built-in schema
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ApplicationKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    /// Inputs are disabled
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.status.is_read_only()
    }

    /// Current values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Current value of one field
    #[must_use]
    pub fn get(&self, field: Field) -> FieldValue {
        field.get(&self.values)
    }

    /// Write a field.
    ///
    /// Guarded gate changes that would discard data are held back and
    /// returned as [`SetOutcome::ConfirmationRequired`]; the value stays
    /// unchanged until [`resolve_confirmation`](Self::resolve_confirmation).
    ///
    /// # Errors
    /// - [`FormError::ReadOnly`] outside of draft
    /// - [`FormError::ConfirmationPending`] while a prompt is open
    /// - [`FormError::Field`] when the value kind does not match
    pub fn set(&mut self, field: Field, value: FieldValue) -> FormResult<SetOutcome> {
        self.ensure_editable()?;
        if value.kind() != field.kind() {
            return Err(FieldError::TypeMismatch {
                field: field.wire_name(),
                expected: field.kind(),
                actual: value.kind(),
            }
            .into());
        }

        match DestructiveChangeGuard::evaluate(&self.values, field, &value) {
            GuardDecision::Confirm(prompt) => {
                self.pending = Some(prompt.clone());
                Ok(SetOutcome::ConfirmationRequired(prompt))
            }
            GuardDecision::Commit => {
                self.apply(vec![(field, value)])?;
                Ok(SetOutcome::Applied)
            }
        }
    }

    /// Open prompt, if any
    #[inline]
    #[must_use]
    pub fn pending_confirmation(&self) -> Option<&ConfirmationPrompt> {
        self.pending.as_ref()
    }

    /// Answer the open prompt.
    ///
    /// [`ConfirmChoice::DeleteData`] turns the gate off and resets every
    /// dependent in one batch; watchers see the batch only after all of it
    /// has been written.
    ///
    /// # Errors
    /// [`FormError::NoPendingConfirmation`] when no prompt is open.
    pub fn resolve_confirmation(&mut self, choice: ConfirmChoice) -> FormResult<()> {
        let prompt = self.pending.take().ok_or(FormError::NoPendingConfirmation)?;
        match choice {
            ConfirmChoice::KeepData => {
                tracing::debug!(gate = %prompt.gate, "section data kept");
                Ok(())
            }
            ConfirmChoice::DeleteData => {
                let Some(gate) = gate_for(prompt.gate) else {
                    return Ok(());
                };
                tracing::info!(gate = %prompt.gate, cleared = prompt.populated.len(), "section data deleted");
                self.apply(DestructiveChangeGuard::clearing_changes(gate))
            }
        }
    }

    /// Write a batch, then notify watchers of every effective change
    fn apply(&mut self, changes: Vec<(Field, FieldValue)>) -> FormResult<()> {
        let mut next = self.values.clone();
        let mut committed = Vec::with_capacity(changes.len());
        for (field, value) in changes {
            let previous = field.get(&next);
            if previous == value {
                continue;
            }
            field.set(&mut next, value.clone())?;
            committed.push(FieldChange {
                field,
                previous,
                current: value,
            });
        }
        self.values = next;

        for change in &committed {
            self.touched.insert(change.field);
            self.errors.retain(|path, _| !path.is_within(change.field));
        }
        for change in &committed {
            for (_, target, watcher) in &mut self.watchers {
                if target.matches(change.field) {
                    watcher(change);
                }
            }
        }
        Ok(())
    }

    fn ensure_editable(&self) -> FormResult<()> {
        if self.is_read_only() {
            return Err(FormError::ReadOnly {
                status: self.status,
            });
        }
        if let Some(prompt) = &self.pending {
            return Err(FormError::ConfirmationPending { gate: prompt.gate });
        }
        Ok(())
    }

    /// Subscribe to committed changes
    pub fn watch<F>(&mut self, target: WatchTarget, callback: F) -> WatchId
    where
        F: FnMut(&FieldChange) + Send + 'static,
    {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watchers.push((id, target, Box::new(callback)));
        id
    }

    /// Drop a subscription; returns false if it was already gone
    pub fn unwatch(&mut self, id: WatchId) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|(w, _, _)| *w != id);
        self.watchers.len() != before
    }

    /// Values differ from the last loaded or saved snapshot
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    /// Fields that differ from the snapshot
    #[must_use]
    pub fn dirty_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| f.get(&self.values) != f.get(&self.initial))
            .collect()
    }

    /// Mark a field as visited without changing it
    pub fn touch(&mut self, field: Field) {
        self.touched.insert(field);
    }

    #[must_use]
    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    /// Adopt `saved` as the clean snapshot
    pub fn mark_saved(&mut self, saved: FormValues) {
        self.initial = saved;
    }

    /// Update the status after a workflow action
    pub fn set_status(&mut self, status: ApplicationStatus) {
        self.status = status;
    }

    /// Run the schema and replace the inline errors with its findings.
    ///
    /// # Errors
    /// Returns the report when any rule fails.
    pub fn validate(&mut self, mode: ValidationMode) -> Result<(), ValidationReport> {
        self.errors.clear();
        let result = self.schema.validate(&self.values, mode);
        if let Err(report) = &result {
            for issue in &report.issues {
                self.errors.entry(issue.path.clone()).or_insert_with(|| issue.clone());
            }
        }
        result
    }

    /// Attach an inline error produced outside the schema
    pub fn set_issue(&mut self, issue: FieldIssue) {
        self.errors.insert(issue.path.clone(), issue);
    }

    /// Inline errors under a field, including record members
    pub fn errors_for(&self, field: Field) -> impl Iterator<Item = &FieldIssue> {
        self.errors.values().filter(move |i| i.path.is_within(field))
    }

    /// Every inline error, in the order found
    pub fn errors(&self) -> impl Iterator<Item = &FieldIssue> {
        self.errors.values()
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Visibility of the current values
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        Visibility::compute(&FormLayout::for_kind(self.kind), &self.values, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rca_schema::{CellLine, TabId};
    use std::sync::{Arc, Mutex};

    fn draft() -> FormController {
        FormController::new(ApplicationKind::Ibc, ApplicationStatus::Draft)
    }

    #[test]
    fn set_marks_dirty_and_touched() {
        let mut form = draft();
        assert!(!form.is_dirty());
        form.set(Field::Title, "Vectors".into()).unwrap();
        assert!(form.is_dirty());
        assert!(form.is_touched(Field::Title));
        assert_eq!(form.dirty_fields(), vec![Field::Title]);

        form.mark_saved(form.values().clone());
        assert!(!form.is_dirty());
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut form = draft();
        let err = form.set(Field::Title, FieldValue::Bool(true)).unwrap_err();
        assert!(matches!(err, FormError::Field(FieldError::TypeMismatch { .. })));
    }

    #[test]
    fn read_only_rejects_writes() {
        let mut form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::UnderReview);
        let err = form.set(Field::Title, "x".into()).unwrap_err();
        assert_eq!(
            err,
            FormError::ReadOnly {
                status: ApplicationStatus::UnderReview
            }
        );
    }

    #[test]
    fn watchers_filter_by_target() {
        let mut form = draft();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        form.watch(WatchTarget::Section(Section::Transport), move |c| {
            sink.lock().unwrap().push(c.field);
        });

        form.set(Field::Title, "x".into()).unwrap();
        form.set(Field::TransportMethod, "Courier".into()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Field::TransportMethod]);
    }

    #[test]
    fn unchanged_value_does_not_notify() {
        let mut form = draft();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        form.watch(WatchTarget::Any, move |_| *sink.lock().unwrap() += 1);
        form.set(Field::DualUseResearch, false.into()).unwrap();
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn unwatch_stops_notifications() {
        let mut form = draft();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = form.watch(WatchTarget::Field(Field::Title), move |_| *sink.lock().unwrap() += 1);
        form.set(Field::Title, "a".into()).unwrap();
        assert!(form.unwatch(id));
        assert!(!form.unwatch(id));
        form.set(Field::Title, "b".into()).unwrap();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn pending_prompt_blocks_writes() {
        let mut form = draft();
        form.set(Field::HumanNonHumanPrimateMaterial, true.into()).unwrap();
        form.set(Field::HumanMaterialsDescription, "PBMC".into()).unwrap();

        let outcome = form.set(Field::HumanNonHumanPrimateMaterial, false.into()).unwrap();
        assert!(matches!(outcome, SetOutcome::ConfirmationRequired(_)));
        assert!(form.values().human_non_human_primate_material);

        let err = form.set(Field::Title, "x".into()).unwrap_err();
        assert_eq!(
            err,
            FormError::ConfirmationPending {
                gate: Field::HumanNonHumanPrimateMaterial
            }
        );
    }

    #[test]
    fn keep_data_leaves_values() {
        let mut form = draft();
        form.set(Field::HumanNonHumanPrimateMaterial, true.into()).unwrap();
        form.set(Field::StemCells, vec!["iPSC".to_string()].into()).unwrap();
        let before = form.values().clone();

        form.set(Field::HumanNonHumanPrimateMaterial, false.into()).unwrap();
        form.resolve_confirmation(ConfirmChoice::KeepData).unwrap();
        assert_eq!(form.values(), &before);
        assert!(form.pending_confirmation().is_none());
        assert_eq!(
            form.resolve_confirmation(ConfirmChoice::KeepData),
            Err(FormError::NoPendingConfirmation)
        );
    }

    #[test]
    fn delete_data_clears_section_as_one_batch() {
        let mut form = draft();
        form.set(Field::HumanNonHumanPrimateMaterial, true.into()).unwrap();
        form.set(
            Field::CellLines,
            FieldValue::CellLines(vec![CellLine {
                name: "HEK293".into(),
                ..CellLine::default()
            }]),
        )
        .unwrap();

        // dependents that were already empty produce no change
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&snapshots);
        form.watch(WatchTarget::Any, move |c| sink.lock().unwrap().push(c.field));

        form.set(Field::HumanNonHumanPrimateMaterial, false.into()).unwrap();
        form.resolve_confirmation(ConfirmChoice::DeleteData).unwrap();

        assert!(!form.values().human_non_human_primate_material);
        assert!(form.values().cell_lines.is_empty());
        assert_eq!(
            *snapshots.lock().unwrap(),
            vec![Field::HumanNonHumanPrimateMaterial, Field::CellLines]
        );
    }

    #[test]
    fn validate_populates_inline_errors() {
        let mut form = draft();
        let report = form.validate(ValidationMode::Submit).unwrap_err();
        assert!(!report.is_empty());
        assert_eq!(form.errors_for(Field::Title).count(), 1);

        form.set(Field::Title, "Vectors".into()).unwrap();
        assert_eq!(form.errors_for(Field::Title).count(), 0);
        assert!(form.errors_for(Field::ProjectSummary).count() > 0);
    }

    #[test]
    fn visibility_follows_values() {
        let mut form = draft();
        assert!(!form.visibility().is_visible(TabId::Transport));
        form.set(Field::TransportOfMaterials, true.into()).unwrap();
        assert!(form.visibility().is_visible(TabId::Transport));
    }
}

//! Destructive-change guard
//!
//! Turning a guarded gate off while its section still holds data must not
//! silently discard that data. The guard intercepts the change before it is
//! committed: the gate keeps its `true` value and a [`ConfirmationPrompt`]
//! lists what would be lost. Only an explicit "delete" clears the section,
//! in one batch together with the gate.

use rca_schema::{gate_for, Field, FieldValue, FormValues, Gate};

/// Label of the choice that keeps the data
pub const KEEP_LABEL: &str = "Cancel (Keep Data)";

/// Label of the choice that clears the section
pub const DELETE_LABEL: &str = "Delete Data and Continue";

/// Prompt shown before a section is cleared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    /// Gate being turned off
    pub gate: Field,
    pub title: String,
    pub message: String,
    /// Dependents that currently hold data
    pub populated: Vec<Field>,
    pub keep_label: &'static str,
    pub delete_label: &'static str,
}

impl ConfirmationPrompt {
    fn new(gate: &Gate, populated: Vec<Field>) -> Self {
        let listed = populated
            .iter()
            .map(|f| f.wire_name())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            gate: gate.field,
            title: format!("Remove {} data?", gate.section_title),
            message: format!(
                "Answering \"No\" will permanently delete the information entered in the {} section ({listed}).",
                gate.section_title
            ),
            populated,
            keep_label: KEEP_LABEL,
            delete_label: DELETE_LABEL,
        }
    }
}

/// Answer to a [`ConfirmationPrompt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    /// Leave the gate on, keep every value
    KeepData,
    /// Turn the gate off and clear its dependents
    DeleteData,
}

/// Outcome of evaluating a field change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Commit the change as-is
    Commit,
    /// Hold the change until the user confirms
    Confirm(ConfirmationPrompt),
}

/// Stateless evaluator over the gate table
#[derive(Debug, Clone, Copy, Default)]
pub struct DestructiveChangeGuard;

impl DestructiveChangeGuard {
    /// Decide whether setting `field` to `next` may commit directly.
    ///
    /// Only a guarded gate going from `true` to `false` with populated
    /// dependents needs confirmation.
    #[must_use]
    pub fn evaluate(values: &FormValues, field: Field, next: &FieldValue) -> GuardDecision {
        let Some(gate) = gate_for(field).filter(|g| g.confirm_on_clear) else {
            return GuardDecision::Commit;
        };
        if !gate.is_open(values) || next.as_bool() != Some(false) {
            return GuardDecision::Commit;
        }

        let populated = gate.populated_dependents(values);
        if populated.is_empty() {
            tracing::debug!(gate = %field, "gate cleared with empty section");
            return GuardDecision::Commit;
        }

        tracing::info!(gate = %field, populated = populated.len(), "confirmation required before clearing section");
        GuardDecision::Confirm(ConfirmationPrompt::new(gate, populated))
    }

    /// Changes applied when the user confirms deletion: the gate set to
    /// `false` followed by every dependent reset to its empty value.
    #[must_use]
    pub fn clearing_changes(gate: &Gate) -> Vec<(Field, FieldValue)> {
        std::iter::once((gate.field, FieldValue::Bool(false)))
            .chain(gate.dependents.iter().map(|&f| (f, f.empty_value())))
            .collect()
    }
}

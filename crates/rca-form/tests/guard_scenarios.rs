//! Functional tests for the destructive-change guard as seen through the
//! form controller.
//!
//! - Turning a guarded gate off with data opens a prompt and keeps the gate on.
//! - "Keep data" changes nothing; "delete data" clears the section in one batch.
//! - Empty sections and unguarded gates commit directly.

use rca_form::prelude::*;
use rca_schema::{
    gate_for, ApplicationKind, ApplicationStatus, CellLine, Field, FieldValue, HazardousProcedure,
    TabId,
};
use std::sync::{Arc, Mutex};

/// Helper: IBC draft with the human / NHP section holding one HEK293 line.
fn form_with_hek293() -> FormController {
    let mut form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::Draft);
    form.set(Field::HumanNonHumanPrimateMaterial, true.into()).unwrap();

    let mut editor = SubRecordEditor::<CellLine>::new();
    editor.open_for_create(&form).unwrap();
    *editor.buffer_mut() = CellLine {
        name: "HEK293".into(),
        biosafety_level: "BSL-2".into(),
        acquisition_sources: vec!["ATCC".into()],
        passage: "12".into(),
        exposure_types: vec!["splash".into()],
        ..CellLine::default()
    };
    editor.save(&mut form).unwrap();
    form
}

/// Tenet: the false state of a populated guarded gate is never committed
/// before the user confirms.
#[test]
fn hek293_prompt_then_keep() {
    let mut form = form_with_hek293();

    let outcome = form
        .set(Field::HumanNonHumanPrimateMaterial, false.into())
        .unwrap();
    let SetOutcome::ConfirmationRequired(prompt) = outcome else {
        panic!("expected a confirmation prompt");
    };
    assert_eq!(prompt.populated, vec![Field::CellLines]);
    assert_eq!(form.get(Field::HumanNonHumanPrimateMaterial), FieldValue::Bool(true));
    assert!(form.visibility().is_visible(TabId::CellLines));

    form.resolve_confirmation(ConfirmChoice::KeepData).unwrap();
    assert!(form.values().human_non_human_primate_material);
    assert_eq!(form.values().cell_lines[0].name, "HEK293");
}

/// Tenet: confirming deletion clears the gate and every dependent together.
#[test]
fn hek293_prompt_then_delete() {
    let mut form = form_with_hek293();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    form.watch(WatchTarget::Field(Field::HumanNonHumanPrimateMaterial), move |change| {
        sink.lock().unwrap().push(change.current.clone());
    });

    form.set(Field::HumanNonHumanPrimateMaterial, false.into())
        .unwrap();
    // gate watchers never see an unconfirmed false
    assert!(observed.lock().unwrap().is_empty());

    form.resolve_confirmation(ConfirmChoice::DeleteData).unwrap();
    assert!(!form.values().human_non_human_primate_material);
    assert!(form.values().cell_lines.is_empty());
    assert!(!form.visibility().is_visible(TabId::HumanMaterials));
    assert_eq!(*observed.lock().unwrap(), vec![FieldValue::Bool(false)]);
}

/// Tenet: "Delete Data and Continue" empties every dependent of the section,
/// not only the one that triggered the prompt.
#[test]
fn hek293_delete_clears_whole_human_section() {
    let mut form = form_with_hek293();
    let line_id = form.values().cell_lines[0].id.clone();
    let procedure = HazardousProcedure {
        procedure: "Sonication".into(),
        cell_line_id: Some(line_id),
        hazards: vec!["aerosol".into()],
        control_measures: "Biosafety cabinet".into(),
        ..HazardousProcedure::default()
    };
    form.set(Field::HazardousProcedures, FieldValue::HazardousProcedures(vec![procedure]))
        .unwrap();
    form.set(Field::StemCells, vec!["iPSC".to_string()].into()).unwrap();
    form.set(Field::HumanMaterials, vec!["Blood".to_string()].into()).unwrap();
    form.set(Field::HumanMaterialsDescription, "Primary PBMCs".into()).unwrap();
    form.set(Field::BloodborneTrainingCompleted, true.into()).unwrap();

    let gate = gate_for(Field::HumanNonHumanPrimateMaterial).unwrap();
    let SetOutcome::ConfirmationRequired(prompt) = form
        .set(Field::HumanNonHumanPrimateMaterial, false.into())
        .unwrap()
    else {
        panic!("expected a confirmation prompt");
    };
    assert_eq!(prompt.populated, gate.dependents.to_vec());

    form.resolve_confirmation(ConfirmChoice::DeleteData).unwrap();
    for &field in gate.dependents {
        assert!(form.get(field).is_empty(), "{field} not cleared");
    }
    assert!(!form.values().human_non_human_primate_material);
}

/// Tenet: the nucleic-acid gate is guarded the same way.
#[test]
fn nucleic_acid_gate_prompts_when_populated() {
    let mut form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::Draft);
    form.set(Field::RecombinantOrSyntheticNucleicAcid, true.into()).unwrap();
    form.set(Field::NihSectionIIID, true.into()).unwrap();
    form.set(Field::NucleicAcidDescription, "Lentiviral shRNA".into()).unwrap();

    let SetOutcome::ConfirmationRequired(prompt) = form
        .set(Field::RecombinantOrSyntheticNucleicAcid, false.into())
        .unwrap()
    else {
        panic!("expected a confirmation prompt");
    };
    assert_eq!(prompt.gate, Field::RecombinantOrSyntheticNucleicAcid);
    assert_eq!(
        prompt.populated,
        vec![Field::NihSectionIIID, Field::NucleicAcidDescription]
    );
    assert!(form.values().recombinant_or_synthetic_nucleic_acid);
    assert!(form.visibility().is_visible(TabId::NucleicAcids));

    form.resolve_confirmation(ConfirmChoice::KeepData).unwrap();
    assert_eq!(form.values().nucleic_acid_description, "Lentiviral shRNA");

    form.set(Field::RecombinantOrSyntheticNucleicAcid, false.into()).unwrap();
    form.resolve_confirmation(ConfirmChoice::DeleteData).unwrap();
    assert!(!form.values().nih_section_iii_d);
    assert!(form.values().nucleic_acid_description.is_empty());
}

/// Tenet: whitespace-only text is not data, so it never triggers a prompt.
#[test]
fn whitespace_only_section_commits_without_prompt() {
    let mut form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::Draft);
    form.set(Field::HumanNonHumanPrimateMaterial, true.into()).unwrap();
    form.set(Field::HumanMaterialsDescription, "   ".into()).unwrap();

    let outcome = form
        .set(Field::HumanNonHumanPrimateMaterial, false.into())
        .unwrap();
    assert_eq!(outcome, SetOutcome::Applied);
    assert!(!form.values().human_non_human_primate_material);
}

/// Tenet: the guard re-evaluates on every change, not once per session.
#[test]
fn guard_fires_repeatedly() {
    let mut form = form_with_hek293();
    for _ in 0..3 {
        let outcome = form
            .set(Field::HumanNonHumanPrimateMaterial, false.into())
            .unwrap();
        assert!(matches!(outcome, SetOutcome::ConfirmationRequired(_)));
        form.resolve_confirmation(ConfirmChoice::KeepData).unwrap();
    }
    assert!(form.values().human_non_human_primate_material);
}

/// Tenet: a hazardous procedure whose cell line is deleted keeps its
/// reference, which then resolves to nothing.
#[test]
fn deleting_cell_line_leaves_dangling_reference() {
    let mut form = form_with_hek293();
    let line_id = form.values().cell_lines[0].id.clone();

    let mut procedures = SubRecordEditor::<HazardousProcedure>::new();
    procedures.open_for_create(&form).unwrap();
    *procedures.buffer_mut() = HazardousProcedure {
        procedure: "Sonication".into(),
        cell_line_id: Some(line_id.clone()),
        hazards: vec!["aerosol".into()],
        control_measures: "Biosafety cabinet".into(),
        ..HazardousProcedure::default()
    };
    procedures.save(&mut form).unwrap();

    let mut lines = SubRecordEditor::<CellLine>::new();
    lines.request_delete(&form, 0).unwrap();
    lines.confirm_delete(&mut form).unwrap();

    let procedure = &form.values().hazardous_procedures[0];
    assert_eq!(procedure.cell_line_id.as_ref(), Some(&line_id));
    assert!(procedure.cell_line(&form.values().cell_lines).is_none());
}

/// Tenet: unguarded gates hide their section but keep its data.
#[test]
fn transport_gate_retains_data() {
    let mut form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::Draft);
    form.set(Field::TransportOfMaterials, true.into()).unwrap();
    form.set(Field::TransportMethod, "Courier".into()).unwrap();

    let outcome = form.set(Field::TransportOfMaterials, false.into()).unwrap();
    assert_eq!(outcome, SetOutcome::Applied);
    assert_eq!(form.values().transport_method, "Courier");
    assert!(!form.visibility().is_visible(TabId::Transport));
}

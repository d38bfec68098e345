//! Declarative validation schemas
//!
//! A [`Schema`] is an ordered list of [`SchemaRule`]s. Rules inspect the whole
//! [`FormValues`] record and emit [`FieldIssue`]s addressed by [`FieldPath`],
//! so a UI can render each message next to the input that caused it.
//!
//! Fields hidden behind a closed gate are never validated; their data is
//! retained but does not block an action.

use crate::field::{Field, FormValues};
use crate::gates::controlling_gate;
use crate::model::ApplicationKind;
use crate::path::FieldPath;
use crate::record::{CellLine, HazardousProcedure, SubRecord, SyntheticExperiment, TeamMember};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Which action the values are validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// Saving a draft: only structural limits apply
    Draft,
    /// Submitting: the full rule set applies
    Submit,
}

/// Single validation message bound to a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: FieldPath,
    /// Stable machine-readable code, e.g. `required`
    pub code: &'static str,
    pub message: String,
}

impl FieldIssue {
    /// Create issue
    #[inline]
    pub fn new(path: impl Into<FieldPath>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every issue found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} validation issue(s)", .issues.len())]
pub struct ValidationReport {
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    /// No issues
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues under a top-level field
    pub fn issues_for(&self, field: Field) -> impl Iterator<Item = &FieldIssue> {
        self.issues.iter().filter(move |i| i.path.is_within(field))
    }
}

/// One validation rule
pub trait SchemaRule: Send + Sync {
    /// Rule identifier, used in logs
    fn rule_id(&self) -> &'static str;

    /// Whether the rule runs in `mode`
    fn applies_in(&self, mode: ValidationMode) -> bool {
        mode == ValidationMode::Submit
    }

    /// Check the values
    fn check(&self, values: &FormValues) -> Vec<FieldIssue>;
}

/// False when `field` sits behind a closed gate
fn is_active(field: Field, values: &FormValues) -> bool {
    controlling_gate(field).map_or(true, |gate| gate.is_open(values))
}

/// Field must hold data; a boolean must be `true`
#[derive(Debug, Clone)]
pub struct Required {
    pub field: Field,
    pub message: String,
}

impl Required {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl SchemaRule for Required {
    fn rule_id(&self) -> &'static str {
        "required"
    }

    fn check(&self, values: &FormValues) -> Vec<FieldIssue> {
        if is_active(self.field, values) && self.field.get(values).is_empty() {
            vec![FieldIssue::new(self.field, "required", self.message.clone())]
        } else {
            Vec::new()
        }
    }
}

/// At least one of several fields must hold data.
///
/// The issue is reported on the first field of the group.
#[derive(Debug, Clone)]
pub struct AnyOf {
    pub fields: &'static [Field],
    pub message: String,
}

impl AnyOf {
    pub fn new(fields: &'static [Field], message: impl Into<String>) -> Self {
        Self {
            fields,
            message: message.into(),
        }
    }
}

impl SchemaRule for AnyOf {
    fn rule_id(&self) -> &'static str {
        "any_of"
    }

    fn check(&self, values: &FormValues) -> Vec<FieldIssue> {
        let Some(&first) = self.fields.first() else {
            return Vec::new();
        };
        if !is_active(first, values) || self.fields.iter().any(|f| !f.get(values).is_empty()) {
            return Vec::new();
        }
        vec![FieldIssue::new(first, "any_of", self.message.clone())]
    }
}

/// Upper bound on text length, in characters
#[derive(Debug, Clone, Copy)]
pub struct MaxLength {
    pub field: Field,
    pub max: usize,
}

impl SchemaRule for MaxLength {
    fn rule_id(&self) -> &'static str {
        "max_length"
    }

    fn applies_in(&self, _mode: ValidationMode) -> bool {
        true
    }

    fn check(&self, values: &FormValues) -> Vec<FieldIssue> {
        match self.field.get(values).as_text() {
            Some(text) if text.chars().count() > self.max => vec![FieldIssue::new(
                self.field,
                "max_length",
                format!("Must be at most {} characters", self.max),
            )],
            _ => Vec::new(),
        }
    }
}

/// Every record of `R` passes its checklist and resolves its references
pub struct RecordsComplete<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R: SubRecord> RecordsComplete<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R: SubRecord> Default for RecordsComplete<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SubRecord> fmt::Debug for RecordsComplete<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordsComplete").field("field", &R::FIELD).finish()
    }
}

impl<R: SubRecord> SchemaRule for RecordsComplete<R> {
    fn rule_id(&self) -> &'static str {
        "records_complete"
    }

    fn check(&self, values: &FormValues) -> Vec<FieldIssue> {
        if !is_active(R::FIELD, values) {
            return Vec::new();
        }
        R::records(values)
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let (code, issue) = match record.check_required() {
                    Err(issue) => ("record_incomplete", issue),
                    Ok(()) => ("dangling_reference", record.check_references(values).err()?),
                };
                Some(FieldIssue::new(
                    FieldPath::new(R::FIELD).at(index).member(issue.member),
                    code,
                    format!("{} {}: {}", R::LABEL, index + 1, issue.message),
                ))
            })
            .collect()
    }
}

type RefineFn = dyn Fn(&FormValues) -> Option<FieldIssue> + Send + Sync;

/// Free-form rule over the whole record
pub struct Refine {
    id: &'static str,
    check: Box<RefineFn>,
}

impl Refine {
    pub fn new<F>(id: &'static str, check: F) -> Self
    where
        F: Fn(&FormValues) -> Option<FieldIssue> + Send + Sync + 'static,
    {
        Self {
            id,
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for Refine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refine").field("id", &self.id).finish_non_exhaustive()
    }
}

impl SchemaRule for Refine {
    fn rule_id(&self) -> &'static str {
        self.id
    }

    fn check(&self, values: &FormValues) -> Vec<FieldIssue> {
        (self.check)(values).into_iter().collect()
    }
}

/// Validation schema of one form kind
pub struct Schema {
    kind: ApplicationKind,
    rules: Vec<Box<dyn SchemaRule>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<_> = self.rules.iter().map(|r| r.rule_id()).collect();
        f.debug_struct("Schema")
            .field("kind", &self.kind)
            .field("rules", &ids)
            .finish()
    }
}

impl Schema {
    /// Empty schema
    #[must_use]
    pub fn new(kind: ApplicationKind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
        }
    }

    /// Append a rule
    #[must_use]
    pub fn rule(mut self, rule: impl SchemaRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Form kind this schema validates
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ApplicationKind {
        self.kind
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Schema has no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule applicable in `mode`.
    ///
    /// # Errors
    /// Returns every issue found, in rule order.
    pub fn validate(&self, values: &FormValues, mode: ValidationMode) -> Result<(), ValidationReport> {
        let issues: Vec<FieldIssue> = self
            .rules
            .iter()
            .filter(|rule| rule.applies_in(mode))
            .flat_map(|rule| rule.check(values))
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { issues })
        }
    }

    /// Built-in schema for a form kind
    #[must_use]
    pub fn for_kind(kind: ApplicationKind) -> Self {
        match kind {
            ApplicationKind::Ibc => ibc_schema(),
            ApplicationKind::Pmo => pmo_schema(),
            ApplicationKind::ChangeRequest => change_request_schema(),
        }
    }
}

const TITLE_MAX: usize = 255;
const BIOSAFETY_LEVELS: [&str; 4] = ["BSL-1", "BSL-2", "BSL-3", "BSL-4"];

const NIH_SECTIONS: &[Field] = &[
    Field::NihSectionIIIA,
    Field::NihSectionIIIB,
    Field::NihSectionIIIC,
    Field::NihSectionIIID,
    Field::NihSectionIIIE,
    Field::NihSectionIIIF,
];

fn common(kind: ApplicationKind) -> Schema {
    Schema::new(kind)
        .rule(MaxLength {
            field: Field::Title,
            max: TITLE_MAX,
        })
        .rule(Required::new(Field::Title, "Title is required"))
        .rule(Required::new(
            Field::PrincipalInvestigatorId,
            "Select a principal investigator",
        ))
        .rule(RecordsComplete::<TeamMember>::new())
}

fn ibc_schema() -> Schema {
    common(ApplicationKind::Ibc)
        .rule(Required::new(Field::ProjectSummary, "Project summary is required"))
        .rule(Required::new(Field::BiosafetyLevel, "Biosafety level is required"))
        .rule(Refine::new("biosafety_level_format", |values| {
            let level = values.biosafety_level.trim();
            (!level.is_empty() && !BIOSAFETY_LEVELS.contains(&level)).then(|| {
                FieldIssue::new(
                    Field::BiosafetyLevel,
                    "invalid_format",
                    "Biosafety level must be one of BSL-1, BSL-2, BSL-3 or BSL-4",
                )
            })
        }))
        // nucleic acids
        .rule(AnyOf::new(
            NIH_SECTIONS,
            "Select at least one applicable NIH Guidelines section",
        ))
        .rule(Required::new(
            Field::NucleicAcidDescription,
            "Describe the nucleic acid work",
        ))
        .rule(RecordsComplete::<SyntheticExperiment>::new())
        // human / NHP materials
        .rule(Required::new(
            Field::HumanMaterialsDescription,
            "Describe the human or NHP materials",
        ))
        .rule(Required::new(
            Field::BloodborneTrainingCompleted,
            "Bloodborne pathogens training must be completed",
        ))
        .rule(RecordsComplete::<CellLine>::new())
        .rule(RecordsComplete::<HazardousProcedure>::new())
        // transport and dual use
        .rule(Required::new(Field::TransportMethod, "Transport method is required"))
        .rule(Required::new(
            Field::TransportDestinations,
            "Transport destinations are required",
        ))
        .rule(Required::new(Field::DualUseAgents, "Select at least one agent"))
        .rule(Required::new(
            Field::DualUseDescription,
            "Describe the dual use potential",
        ))
}

fn pmo_schema() -> Schema {
    common(ApplicationKind::Pmo)
        .rule(Required::new(Field::ActivityObjectives, "Objectives are required"))
        .rule(Required::new(Field::FundingSource, "Funding source is required"))
        .rule(Required::new(Field::IrbProtocolNumber, "IRB protocol number is required"))
        .rule(Required::new(
            Field::IacucProtocolNumber,
            "IACUC protocol number is required",
        ))
}

fn change_request_schema() -> Schema {
    common(ApplicationKind::ChangeRequest)
        .rule(Required::new(
            Field::ParentApplicationId,
            "Select the application to change",
        ))
        .rule(Required::new(Field::ChangeDescription, "Describe the change"))
        .rule(Required::new(
            Field::ChangeJustification,
            "Justification is required",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use pretty_assertions::assert_eq;

    fn base_ibc() -> FormValues {
        FormValues {
            title: "Lentiviral transduction of HEK293".into(),
            project_summary: "Gene knockdown study".into(),
            principal_investigator_id: "pi-1".into(),
            biosafety_level: "BSL-2".into(),
            ..FormValues::default()
        }
    }

    fn codes(report: &ValidationReport) -> Vec<String> {
        report.issues.iter().map(|i| format!("{}:{}", i.path, i.code)).collect()
    }

    #[test]
    fn minimal_ibc_passes() {
        let schema = Schema::for_kind(ApplicationKind::Ibc);
        assert!(schema.validate(&base_ibc(), ValidationMode::Submit).is_ok());
    }

    #[test]
    fn empty_ibc_reports_required_fields() {
        let schema = Schema::for_kind(ApplicationKind::Ibc);
        let report = schema
            .validate(&FormValues::default(), ValidationMode::Submit)
            .unwrap_err();
        assert_eq!(
            codes(&report),
            vec![
                "title:required",
                "principalInvestigatorId:required",
                "projectSummary:required",
                "biosafetyLevel:required",
            ]
        );
    }

    #[test]
    fn draft_mode_only_checks_limits() {
        let schema = Schema::for_kind(ApplicationKind::Ibc);
        assert!(schema
            .validate(&FormValues::default(), ValidationMode::Draft)
            .is_ok());

        let values = FormValues {
            title: "x".repeat(TITLE_MAX + 1),
            ..FormValues::default()
        };
        let report = schema.validate(&values, ValidationMode::Draft).unwrap_err();
        assert_eq!(codes(&report), vec!["title:max_length"]);
    }

    #[test]
    fn closed_gate_hides_dependents() {
        let mut values = base_ibc();
        // retained data behind a closed, unguarded gate
        values.transport_method = String::new();
        values.transport_destinations = "Building 4".into();
        let schema = Schema::for_kind(ApplicationKind::Ibc);
        assert!(schema.validate(&values, ValidationMode::Submit).is_ok());

        values.transport_of_materials = true;
        let report = schema.validate(&values, ValidationMode::Submit).unwrap_err();
        assert_eq!(codes(&report), vec!["transportMethod:required"]);
    }

    #[test]
    fn nucleic_acid_gate_requires_nih_section() {
        let mut values = base_ibc();
        values.recombinant_or_synthetic_nucleic_acid = true;
        values.nucleic_acid_description = "shRNA".into();
        let schema = Schema::for_kind(ApplicationKind::Ibc);
        let report = schema.validate(&values, ValidationMode::Submit).unwrap_err();
        assert_eq!(codes(&report), vec!["nihSectionIIIA:any_of"]);

        values.nih_section_iii_d = true;
        assert!(schema.validate(&values, ValidationMode::Submit).is_ok());
    }

    #[test]
    fn human_gate_requires_training() {
        let mut values = base_ibc();
        values.human_non_human_primate_material = true;
        values.human_materials_description = "Primary cells".into();
        let schema = Schema::for_kind(ApplicationKind::Ibc);
        let report = schema.validate(&values, ValidationMode::Submit).unwrap_err();
        assert_eq!(codes(&report), vec!["bloodborneTrainingCompleted:required"]);
    }

    #[test]
    fn incomplete_record_is_addressed_by_member() {
        let mut values = base_ibc();
        values.human_non_human_primate_material = true;
        values.human_materials_description = "Primary cells".into();
        values.bloodborne_training_completed = true;
        values.cell_lines = vec![CellLine {
            name: "HEK293".into(),
            ..CellLine::default()
        }];
        let report = Schema::for_kind(ApplicationKind::Ibc)
            .validate(&values, ValidationMode::Submit)
            .unwrap_err();
        assert_eq!(codes(&report), vec!["cellLines.0.biosafetyLevel:record_incomplete"]);
        assert_eq!(report.issues_for(Field::CellLines).count(), 1);
        assert!(report.issues[0].message.starts_with("cell line 1:"));
    }

    #[test]
    fn dangling_cell_line_reference_is_reported() {
        let mut values = base_ibc();
        values.human_non_human_primate_material = true;
        values.human_materials_description = "Primary cells".into();
        values.bloodborne_training_completed = true;
        values.hazardous_procedures = vec![HazardousProcedure {
            procedure: "Sonication".into(),
            cell_line_id: Some(RecordId::server("deleted")),
            hazards: vec!["aerosol".into()],
            control_measures: "BSC".into(),
            ..HazardousProcedure::default()
        }];
        let report = Schema::for_kind(ApplicationKind::Ibc)
            .validate(&values, ValidationMode::Submit)
            .unwrap_err();
        assert_eq!(
            codes(&report),
            vec!["hazardousProcedures.0.cellLineId:dangling_reference"]
        );
    }

    #[test]
    fn biosafety_level_format() {
        let mut values = base_ibc();
        values.biosafety_level = "level two".into();
        let report = Schema::for_kind(ApplicationKind::Ibc)
            .validate(&values, ValidationMode::Submit)
            .unwrap_err();
        assert_eq!(codes(&report), vec!["biosafetyLevel:invalid_format"]);
    }

    #[test]
    fn pmo_gates_drive_protocol_numbers() {
        let mut values = FormValues {
            title: "Survey".into(),
            principal_investigator_id: "pi-1".into(),
            activity_objectives: "Measure".into(),
            funding_source: "NIH".into(),
            ..FormValues::default()
        };
        let schema = Schema::for_kind(ApplicationKind::Pmo);
        assert!(schema.validate(&values, ValidationMode::Submit).is_ok());

        values.involves_animals = true;
        let report = schema.validate(&values, ValidationMode::Submit).unwrap_err();
        assert_eq!(codes(&report), vec!["iacucProtocolNumber:required"]);
    }

    #[test]
    fn change_request_requires_parent() {
        let values = FormValues {
            title: "Add BSL-3 room".into(),
            principal_investigator_id: "pi-1".into(),
            change_description: "New room".into(),
            change_justification: "Capacity".into(),
            ..FormValues::default()
        };
        let report = Schema::for_kind(ApplicationKind::ChangeRequest)
            .validate(&values, ValidationMode::Submit)
            .unwrap_err();
        assert_eq!(codes(&report), vec!["parentApplicationId:required"]);
    }

    #[test]
    fn custom_schema_builder() {
        let schema = Schema::new(ApplicationKind::Ibc).rule(Refine::new("never", |_| None));
        assert_eq!(schema.len(), 1);
        assert!(format!("{schema:?}").contains("never"));
        assert!(schema
            .validate(&FormValues::default(), ValidationMode::Submit)
            .is_ok());
    }
}

//! Typed form fields
//!
//! Every compliance-form question is declared once in the table at the bottom
//! of this module. The table generates:
//! - [`FormValues`]: the flat, serde-mapped value record
//! - [`Field`]: one variant per question, with typed `get`/`set` accessors
//!
//! Field access never goes through string keys; wire names only appear at the
//! serialization boundary and in [`Field::from_wire`].

use crate::error::FieldError;
use crate::record::{legacy_team_members, CellLine, HazardousProcedure, SyntheticExperiment, TeamMember};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Value kinds a field can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Bool,
    Text,
    TextList,
    CellLines,
    HazardousProcedures,
    SyntheticExperiments,
    TeamMembers,
}

impl FieldKind {
    /// True for kinds backed by sub-record arrays
    #[inline]
    #[must_use]
    pub const fn holds_records(self) -> bool {
        matches!(
            self,
            Self::CellLines | Self::HazardousProcedures | Self::SyntheticExperiments | Self::TeamMembers
        )
    }
}

/// Typed value of a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    TextList(Vec<String>),
    CellLines(Vec<CellLine>),
    HazardousProcedures(Vec<HazardousProcedure>),
    SyntheticExperiments(Vec<SyntheticExperiment>),
    TeamMembers(Vec<TeamMember>),
}

impl FieldValue {
    /// Kind of this value
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Text(_) => FieldKind::Text,
            Self::TextList(_) => FieldKind::TextList,
            Self::CellLines(_) => FieldKind::CellLines,
            Self::HazardousProcedures(_) => FieldKind::HazardousProcedures,
            Self::SyntheticExperiments(_) => FieldKind::SyntheticExperiments,
            Self::TeamMembers(_) => FieldKind::TeamMembers,
        }
    }

    /// Empty default for a kind: `false`, `""` or `[]`
    #[must_use]
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => Self::Bool(false),
            FieldKind::Text => Self::Text(String::new()),
            FieldKind::TextList => Self::TextList(Vec::new()),
            FieldKind::CellLines => Self::CellLines(Vec::new()),
            FieldKind::HazardousProcedures => Self::HazardousProcedures(Vec::new()),
            FieldKind::SyntheticExperiments => Self::SyntheticExperiments(Vec::new()),
            FieldKind::TeamMembers => Self::TeamMembers(Vec::new()),
        }
    }

    /// Holds no entered data.
    ///
    /// `false` and a zero-length array are empty. Text is empty when it is
    /// empty after trimming, so whitespace-only text never counts as data:
    /// it neither triggers a clearing prompt nor satisfies a required field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Text(s) => s.trim().is_empty(),
            Self::TextList(v) => v.is_empty(),
            Self::CellLines(v) => v.is_empty(),
            Self::HazardousProcedures(v) => v.is_empty(),
            Self::SyntheticExperiments(v) => v.is_empty(),
            Self::TeamMembers(v) => v.is_empty(),
        }
    }

    /// Boolean payload
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text payload
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Number of array entries (0 for scalars)
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(_) | Self::Text(_) => 0,
            Self::TextList(v) => v.len(),
            Self::CellLines(v) => v.len(),
            Self::HazardousProcedures(v) => v.len(),
            Self::SyntheticExperiments(v) => v.len(),
            Self::TeamMembers(v) => v.len(),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        Self::TextList(v)
    }
}

/// Form section a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    General,
    /// Client-side scratch state, never persisted
    Scratch,
    BiosafetyOptions,
    NucleicAcids,
    HumanMaterials,
    Transport,
    DualUse,
    ActivityPlan,
    ChangeRequest,
}

macro_rules! field_type {
    (Bool) => { bool };
    (Text) => { String };
    (TextList) => { Vec<String> };
    (CellLines) => { Vec<CellLine> };
    (HazardousProcedures) => { Vec<HazardousProcedure> };
    (SyntheticExperiments) => { Vec<SyntheticExperiment> };
    (TeamMembers) => { Vec<TeamMember> };
}

macro_rules! form_fields {
    ($(
        $(#[$attr:meta])*
        $variant:ident($name:ident: $kind:ident) = $wire:literal in $section:ident;
    )*) => {
        /// Flat value record of a compliance form
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct FormValues {
            $(
                $(#[$attr])*
                #[serde(rename = $wire)]
                pub $name: field_type!($kind),
            )*
        }

        /// Typed path to a top-level form field
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Field {
            $(
                #[doc = concat!("`", $wire, "`")]
                $variant,
            )*
        }

        impl Field {
            /// Every field, in declaration order
            pub const ALL: &'static [Field] = &[$(Field::$variant,)*];

            /// camelCase wire name
            #[must_use]
            pub const fn wire_name(self) -> &'static str {
                match self {
                    $(Field::$variant => $wire,)*
                }
            }

            /// Declared value kind
            #[must_use]
            pub const fn kind(self) -> FieldKind {
                match self {
                    $(Field::$variant => FieldKind::$kind,)*
                }
            }

            /// Owning section
            #[must_use]
            pub const fn section(self) -> Section {
                match self {
                    $(Field::$variant => Section::$section,)*
                }
            }

            /// Read the field's current value
            #[must_use]
            pub fn get(self, values: &FormValues) -> FieldValue {
                match self {
                    $(Field::$variant => FieldValue::$kind(values.$name.clone()),)*
                }
            }

            /// Write the field.
            ///
            /// # Errors
            /// [`FieldError::TypeMismatch`] when the value kind differs from the field kind.
            pub fn set(self, values: &mut FormValues, value: FieldValue) -> Result<(), FieldError> {
                match (self, value) {
                    $((Field::$variant, FieldValue::$kind(v)) => {
                        values.$name = v;
                        Ok(())
                    })*
                    (field, value) => Err(FieldError::TypeMismatch {
                        field: field.wire_name(),
                        expected: field.kind(),
                        actual: value.kind(),
                    }),
                }
            }
        }
    };
}

form_fields! {
    // General
    Title(title: Text) = "title" in General;
    ProjectSummary(project_summary: Text) = "projectSummary" in General;
    PrincipalInvestigatorId(principal_investigator_id: Text) = "principalInvestigatorId" in General;
    BiosafetyLevel(biosafety_level: Text) = "biosafetyLevel" in General;
    #[serde(with = "legacy_team_members")]
    ProtocolTeamMembers(protocol_team_members: TeamMembers) = "protocolTeamMembers" in General;

    // Scratch
    /// Staff user ids picked in the team selector
    TeamMemberSelection(team_member_selection: TextList) = "teamMemberSelection" in Scratch;
    /// Research activities the application is associated with
    ResearchActivityIds(research_activity_ids: TextList) = "researchActivityIds" in Scratch;
    /// Free-text comment entered on submit
    SubmissionComment(submission_comment: Text) = "submissionComment" in Scratch;

    // Biosafety options
    RecombinantOrSyntheticNucleicAcid(recombinant_or_synthetic_nucleic_acid: Bool) = "recombinantOrSyntheticNucleicAcid" in BiosafetyOptions;
    HumanNonHumanPrimateMaterial(human_non_human_primate_material: Bool) = "humanNonHumanPrimateMaterial" in BiosafetyOptions;
    TransportOfMaterials(transport_of_materials: Bool) = "transportOfMaterials" in BiosafetyOptions;
    DualUseResearch(dual_use_research: Bool) = "dualUseResearch" in BiosafetyOptions;
    BiologicalAgents(biological_agents: TextList) = "biologicalAgents" in BiosafetyOptions;

    // NIH Guidelines, section III
    NihSectionIIIA(nih_section_iii_a: Bool) = "nihSectionIIIA" in NucleicAcids;
    NihSectionIIIB(nih_section_iii_b: Bool) = "nihSectionIIIB" in NucleicAcids;
    NihSectionIIIC(nih_section_iii_c: Bool) = "nihSectionIIIC" in NucleicAcids;
    NihSectionIIID(nih_section_iii_d: Bool) = "nihSectionIIID" in NucleicAcids;
    NihSectionIIIE(nih_section_iii_e: Bool) = "nihSectionIIIE" in NucleicAcids;
    NihSectionIIIF(nih_section_iii_f: Bool) = "nihSectionIIIF" in NucleicAcids;
    NucleicAcidDescription(nucleic_acid_description: Text) = "nucleicAcidDescription" in NucleicAcids;
    VectorsUsed(vectors_used: Text) = "vectorsUsed" in NucleicAcids;
    HostOrganisms(host_organisms: Text) = "hostOrganisms" in NucleicAcids;
    SyntheticExperiments(synthetic_experiments: SyntheticExperiments) = "syntheticExperiments" in NucleicAcids;

    // Human / non-human primate materials
    CellLines(cell_lines: CellLines) = "cellLines" in HumanMaterials;
    HazardousProcedures(hazardous_procedures: HazardousProcedures) = "hazardousProcedures" in HumanMaterials;
    StemCells(stem_cells: TextList) = "stemCells" in HumanMaterials;
    HumanMaterials(human_materials: TextList) = "humanMaterials" in HumanMaterials;
    HumanMaterialsDescription(human_materials_description: Text) = "humanMaterialsDescription" in HumanMaterials;
    BloodborneTrainingCompleted(bloodborne_training_completed: Bool) = "bloodborneTrainingCompleted" in HumanMaterials;

    // Transport
    TransportMethod(transport_method: Text) = "transportMethod" in Transport;
    TransportDestinations(transport_destinations: Text) = "transportDestinations" in Transport;

    // Dual use research of concern
    DualUseAgents(dual_use_agents: TextList) = "dualUseAgents" in DualUse;
    DualUseDescription(dual_use_description: Text) = "dualUseDescription" in DualUse;

    // PMO research-activity plan
    ActivityObjectives(activity_objectives: Text) = "activityObjectives" in ActivityPlan;
    FundingSource(funding_source: Text) = "fundingSource" in ActivityPlan;
    InvolvesHumanSubjects(involves_human_subjects: Bool) = "involvesHumanSubjects" in ActivityPlan;
    IrbProtocolNumber(irb_protocol_number: Text) = "irbProtocolNumber" in ActivityPlan;
    InvolvesAnimals(involves_animals: Bool) = "involvesAnimals" in ActivityPlan;
    IacucProtocolNumber(iacuc_protocol_number: Text) = "iacucProtocolNumber" in ActivityPlan;

    // Change request
    ParentApplicationId(parent_application_id: Text) = "parentApplicationId" in ChangeRequest;
    ChangeDescription(change_description: Text) = "changeDescription" in ChangeRequest;
    ChangeJustification(change_justification: Text) = "changeJustification" in ChangeRequest;
}

impl Field {
    /// Look up a field by wire name
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.wire_name() == name)
    }

    /// Scratch fields are stripped from every payload
    #[inline]
    #[must_use]
    pub fn is_ui_only(self) -> bool {
        self.section() == Section::Scratch
    }

    /// Empty default value for this field
    #[inline]
    #[must_use]
    pub fn empty_value(self) -> FieldValue {
        FieldValue::empty(self.kind())
    }

    /// Fields of a section, in declaration order
    pub fn in_section(section: Section) -> impl Iterator<Item = Field> {
        Self::ALL.iter().copied().filter(move |f| f.section() == section)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

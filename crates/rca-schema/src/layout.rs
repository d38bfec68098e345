//! Tab layout per application kind

use crate::field::Field;
use crate::gates::gate_for;
use crate::model::ApplicationKind;

/// Tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TabId {
    General,
    BiosafetyOptions,
    NucleicAcids,
    NihGuidelines,
    SyntheticExperiments,
    HumanMaterials,
    CellLines,
    HazardousProcedures,
    Transport,
    DualUse,
    ActivityPlan,
    HumanSubjects,
    AnimalUse,
    ChangeDetails,
    Review,
}

/// Static description of a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSpec {
    pub id: TabId,
    pub title: &'static str,
    /// Gating boolean; must be a gate from [`crate::gates::GATES`]
    pub gate: Option<Field>,
    /// Inputs placed on an ungated tab, or sub-placement inside a gated
    /// section. Left empty on a gated tab; see [`TabSpec::inputs`].
    pub placed: &'static [Field],
    /// Nested tabs, shown only while this tab is shown
    pub children: &'static [TabSpec],
}

impl TabSpec {
    /// Inputs rendered on the tab.
    ///
    /// A gated tab renders the dependents of its gate that none of its
    /// nested tabs claim, so gate membership is read from
    /// [`crate::gates::GATES`] only.
    #[must_use]
    pub fn inputs(&self) -> Vec<Field> {
        match self.gate.and_then(gate_for) {
            Some(gate) if self.placed.is_empty() => gate
                .dependents
                .iter()
                .copied()
                .filter(|f| !self.children.iter().any(|c| c.inputs().contains(f)))
                .collect(),
            _ => self.placed.to_vec(),
        }
    }
}

const GENERAL: TabSpec = TabSpec {
    id: TabId::General,
    title: "General Information",
    gate: None,
    placed: &[
        Field::Title,
        Field::ProjectSummary,
        Field::PrincipalInvestigatorId,
        Field::ResearchActivityIds,
        Field::TeamMemberSelection,
        Field::ProtocolTeamMembers,
    ],
    children: &[],
};

const REVIEW: TabSpec = TabSpec {
    id: TabId::Review,
    title: "Review & Submit",
    gate: None,
    placed: &[Field::SubmissionComment],
    children: &[],
};

const IBC_TABS: &[TabSpec] = &[
    GENERAL,
    TabSpec {
        id: TabId::BiosafetyOptions,
        title: "Biosafety Options",
        gate: None,
        placed: &[
            Field::BiosafetyLevel,
            Field::RecombinantOrSyntheticNucleicAcid,
            Field::HumanNonHumanPrimateMaterial,
            Field::TransportOfMaterials,
            Field::DualUseResearch,
            Field::BiologicalAgents,
        ],
        children: &[],
    },
    TabSpec {
        id: TabId::NucleicAcids,
        title: "Nucleic Acids",
        gate: Some(Field::RecombinantOrSyntheticNucleicAcid),
        placed: &[],
        children: &[
            TabSpec {
                id: TabId::NihGuidelines,
                title: "NIH Guidelines",
                gate: None,
                placed: &[
                    Field::NihSectionIIIA,
                    Field::NihSectionIIIB,
                    Field::NihSectionIIIC,
                    Field::NihSectionIIID,
                    Field::NihSectionIIIE,
                    Field::NihSectionIIIF,
                ],
                children: &[],
            },
            TabSpec {
                id: TabId::SyntheticExperiments,
                title: "Synthetic Experiments",
                gate: None,
                placed: &[Field::SyntheticExperiments],
                children: &[],
            },
        ],
    },
    TabSpec {
        id: TabId::HumanMaterials,
        title: "Human & NHP Materials",
        gate: Some(Field::HumanNonHumanPrimateMaterial),
        placed: &[],
        children: &[
            TabSpec {
                id: TabId::CellLines,
                title: "Cell Lines",
                gate: None,
                placed: &[Field::CellLines],
                children: &[],
            },
            TabSpec {
                id: TabId::HazardousProcedures,
                title: "Hazardous Procedures",
                gate: None,
                placed: &[Field::HazardousProcedures],
                children: &[],
            },
        ],
    },
    TabSpec {
        id: TabId::Transport,
        title: "Transport",
        gate: Some(Field::TransportOfMaterials),
        placed: &[],
        children: &[],
    },
    TabSpec {
        id: TabId::DualUse,
        title: "Dual Use",
        gate: Some(Field::DualUseResearch),
        placed: &[],
        children: &[],
    },
    REVIEW,
];

const PMO_TABS: &[TabSpec] = &[
    GENERAL,
    TabSpec {
        id: TabId::ActivityPlan,
        title: "Activity Plan",
        gate: None,
        placed: &[
            Field::ActivityObjectives,
            Field::FundingSource,
            Field::InvolvesHumanSubjects,
            Field::InvolvesAnimals,
        ],
        children: &[
            TabSpec {
                id: TabId::HumanSubjects,
                title: "Human Subjects",
                gate: Some(Field::InvolvesHumanSubjects),
                placed: &[],
                children: &[],
            },
            TabSpec {
                id: TabId::AnimalUse,
                title: "Animal Use",
                gate: Some(Field::InvolvesAnimals),
                placed: &[],
                children: &[],
            },
        ],
    },
    REVIEW,
];

const CHANGE_REQUEST_TABS: &[TabSpec] = &[
    GENERAL,
    TabSpec {
        id: TabId::ChangeDetails,
        title: "Requested Changes",
        gate: None,
        placed: &[
            Field::ParentApplicationId,
            Field::ChangeDescription,
            Field::ChangeJustification,
        ],
        children: &[],
    },
    REVIEW,
];

/// Tab tree of one form kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLayout {
    pub kind: ApplicationKind,
    pub tabs: &'static [TabSpec],
}

impl FormLayout {
    /// Layout for a form kind
    #[must_use]
    pub fn for_kind(kind: ApplicationKind) -> Self {
        let tabs = match kind {
            ApplicationKind::Ibc => IBC_TABS,
            ApplicationKind::Pmo => PMO_TABS,
            ApplicationKind::ChangeRequest => CHANGE_REQUEST_TABS,
        };
        Self { kind, tabs }
    }

    /// Depth-first walk: `(depth, parent, tab)`
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, Option<TabId>, &'static TabSpec)> {
        fn visit(
            tabs: &'static [TabSpec],
            depth: usize,
            parent: Option<TabId>,
            out: &mut Vec<(usize, Option<TabId>, &'static TabSpec)>,
        ) {
            for tab in tabs {
                out.push((depth, parent, tab));
                visit(tab.children, depth + 1, Some(tab.id), out);
            }
        }

        let mut out = Vec::new();
        visit(self.tabs, 0, None, &mut out);
        out
    }

    /// Find a tab anywhere in the tree
    #[must_use]
    pub fn tab(&self, id: TabId) -> Option<&'static TabSpec> {
        self.walk().into_iter().map(|(_, _, t)| t).find(|t| t.id == id)
    }

    /// Every field placed on some tab
    #[must_use]
    pub fn fields(&self) -> Vec<Field> {
        self.walk()
            .into_iter()
            .flat_map(|(_, _, t)| t.inputs())
            .collect()
    }
}

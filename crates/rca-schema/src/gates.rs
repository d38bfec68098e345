//! Gating fields and the sections they control
//!
//! A gate is a boolean question ("does this apply to your research?") that
//! shows or hides a section. This table is the single source for both tab
//! visibility and the destructive-change guard.

use crate::field::{Field, FormValues};

/// A gating boolean and its dependent fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    /// The gating boolean
    pub field: Field,
    /// Fields shown only while the gate is true
    pub dependents: &'static [Field],
    /// Turning the gate off with populated dependents needs confirmation,
    /// after which the dependents are cleared
    pub confirm_on_clear: bool,
    /// Section name used in prompts
    pub section_title: &'static str,
}

impl Gate {
    /// Current gate value
    #[inline]
    #[must_use]
    pub fn is_open(&self, values: &FormValues) -> bool {
        self.field.get(values).as_bool().unwrap_or(false)
    }

    /// Dependents currently holding data
    #[must_use]
    pub fn populated_dependents(&self, values: &FormValues) -> Vec<Field> {
        self.dependents
            .iter()
            .copied()
            .filter(|f| !f.get(values).is_empty())
            .collect()
    }
}

/// Every gate, in form order
pub static GATES: &[Gate] = &[
    Gate {
        field: Field::RecombinantOrSyntheticNucleicAcid,
        dependents: &[
            Field::NihSectionIIIA,
            Field::NihSectionIIIB,
            Field::NihSectionIIIC,
            Field::NihSectionIIID,
            Field::NihSectionIIIE,
            Field::NihSectionIIIF,
            Field::NucleicAcidDescription,
            Field::VectorsUsed,
            Field::HostOrganisms,
            Field::SyntheticExperiments,
        ],
        confirm_on_clear: true,
        section_title: "Recombinant or Synthetic Nucleic Acids",
    },
    Gate {
        field: Field::HumanNonHumanPrimateMaterial,
        dependents: &[
            Field::CellLines,
            Field::HazardousProcedures,
            Field::StemCells,
            Field::HumanMaterials,
            Field::HumanMaterialsDescription,
            Field::BloodborneTrainingCompleted,
        ],
        confirm_on_clear: true,
        section_title: "Human and Non-Human Primate Materials",
    },
    Gate {
        field: Field::TransportOfMaterials,
        dependents: &[Field::TransportMethod, Field::TransportDestinations],
        confirm_on_clear: false,
        section_title: "Transport of Materials",
    },
    Gate {
        field: Field::DualUseResearch,
        dependents: &[Field::DualUseAgents, Field::DualUseDescription],
        confirm_on_clear: false,
        section_title: "Dual Use Research of Concern",
    },
    Gate {
        field: Field::InvolvesHumanSubjects,
        dependents: &[Field::IrbProtocolNumber],
        confirm_on_clear: false,
        section_title: "Human Subjects",
    },
    Gate {
        field: Field::InvolvesAnimals,
        dependents: &[Field::IacucProtocolNumber],
        confirm_on_clear: false,
        section_title: "Animal Use",
    },
];

/// Gate whose boolean is `field`
#[must_use]
pub fn gate_for(field: Field) -> Option<&'static Gate> {
    GATES.iter().find(|g| g.field == field)
}

/// Gate controlling `field`, if it is a dependent
#[must_use]
pub fn controlling_gate(field: Field) -> Option<&'static Gate> {
    GATES.iter().find(|g| g.dependents.contains(&field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    #[test]
    fn gates_are_booleans() {
        for gate in GATES {
            assert_eq!(gate.field.kind(), FieldKind::Bool, "{}", gate.field);
        }
    }

    #[test]
    fn exactly_two_guarded_gates() {
        let guarded: Vec<_> = GATES
            .iter()
            .filter(|g| g.confirm_on_clear)
            .map(|g| g.field)
            .collect();
        assert_eq!(
            guarded,
            vec![
                Field::RecombinantOrSyntheticNucleicAcid,
                Field::HumanNonHumanPrimateMaterial
            ]
        );
    }

    #[test]
    fn dependents_belong_to_one_gate() {
        for &field in Field::ALL {
            let owners = GATES.iter().filter(|g| g.dependents.contains(&field)).count();
            assert!(owners <= 1, "{field} controlled by {owners} gates");
        }
    }

    #[test]
    fn populated_dependents_lists_only_data() {
        let mut values = FormValues::default();
        values.human_non_human_primate_material = true;
        values.human_materials_description = "Primary PBMCs".into();
        let gate = gate_for(Field::HumanNonHumanPrimateMaterial).unwrap();
        assert!(gate.is_open(&values));
        assert_eq!(
            gate.populated_dependents(&values),
            vec![Field::HumanMaterialsDescription]
        );
    }

    #[test]
    fn controlling_gate_lookup() {
        assert_eq!(
            controlling_gate(Field::CellLines).map(|g| g.field),
            Some(Field::HumanNonHumanPrimateMaterial)
        );
        assert!(controlling_gate(Field::Title).is_none());
    }
}

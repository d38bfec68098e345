//! Sub-records held in array-valued fields of an application
//!
//! Each sub-record carries a [`RecordId`]. Records created on the client get a
//! temporary id; the backend assigns a permanent one when the parent
//! application round-trips.

use crate::field::{Field, FieldValue, FormValues};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Identifier of a sub-record, stable for the record's lifetime on the client
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Prefix marking client-generated ids
    pub const TEMPORARY_PREFIX: &'static str = "tmp-";

    /// Generate a fresh temporary id
    #[inline]
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("{}{}", Self::TEMPORARY_PREFIX, Ulid::new()))
    }

    /// Wrap a server-assigned id
    #[inline]
    #[must_use]
    pub fn server(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// True until the backend has assigned an id
    #[inline]
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(Self::TEMPORARY_PREFIX)
    }

    /// Raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::temporary()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First failing required member of a sub-record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    /// Wire name of the offending member
    pub member: &'static str,
    /// User-facing message
    pub message: String,
}

impl RecordIssue {
    /// Create issue for member
    #[inline]
    pub fn new(member: &'static str, message: impl Into<String>) -> Self {
        Self {
            member,
            message: message.into(),
        }
    }
}

impl Display for RecordIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.member, self.message)
    }
}

/// A child record edited through its own dialog.
///
/// Ties the record type to the array field that holds it.
pub trait SubRecord: Clone + Default + PartialEq + Send + Sync + 'static {
    /// Field holding the records
    const FIELD: Field;

    /// Human label, e.g. "cell line"
    const LABEL: &'static str;

    /// Record id
    fn id(&self) -> &RecordId;

    /// Replace the record id
    fn set_id(&mut self, id: RecordId);

    /// Required-field checklist; stops at the first failure.
    ///
    /// # Errors
    /// Returns the first missing or empty required member.
    fn check_required(&self) -> Result<(), RecordIssue>;

    /// Checks references to sibling records in the parent form.
    ///
    /// # Errors
    /// Returns an issue naming the dangling reference.
    fn check_references(&self, _values: &FormValues) -> Result<(), RecordIssue> {
        Ok(())
    }

    /// Wrap records as a field value
    fn into_value(records: Vec<Self>) -> FieldValue;

    /// Extract records from a field value of the matching kind
    fn from_value(value: FieldValue) -> Option<Vec<Self>>;

    /// Current records in the parent form
    fn records(values: &FormValues) -> Vec<Self> {
        Self::from_value(Self::FIELD.get(values)).unwrap_or_default()
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Cell line used under the human / NHP materials section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellLine {
    pub id: RecordId,
    pub name: String,
    pub biosafety_level: String,
    pub acquisition_sources: Vec<String>,
    pub passage: String,
    pub exposure_types: Vec<String>,
    pub notes: String,
}

impl SubRecord for CellLine {
    const FIELD: Field = Field::CellLines;
    const LABEL: &'static str = "cell line";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn check_required(&self) -> Result<(), RecordIssue> {
        if blank(&self.name) {
            return Err(RecordIssue::new("name", "Cell line name is required"));
        }
        if blank(&self.biosafety_level) {
            return Err(RecordIssue::new(
                "biosafetyLevel",
                "Biosafety level is required",
            ));
        }
        if self.acquisition_sources.iter().all(|s| blank(s)) {
            return Err(RecordIssue::new(
                "acquisitionSources",
                "Select at least one acquisition source",
            ));
        }
        if blank(&self.passage) {
            return Err(RecordIssue::new("passage", "Passage is required"));
        }
        if self.exposure_types.iter().all(|s| blank(s)) {
            return Err(RecordIssue::new(
                "exposureTypes",
                "Select at least one exposure type",
            ));
        }
        Ok(())
    }

    fn into_value(records: Vec<Self>) -> FieldValue {
        FieldValue::CellLines(records)
    }

    fn from_value(value: FieldValue) -> Option<Vec<Self>> {
        match value {
            FieldValue::CellLines(records) => Some(records),
            _ => None,
        }
    }
}

/// Hazardous procedure performed on a cell line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HazardousProcedure {
    pub id: RecordId,
    pub procedure: String,
    /// Referenced cell line, by record id
    pub cell_line_id: Option<RecordId>,
    pub hazards: Vec<String>,
    pub control_measures: String,
}

impl HazardousProcedure {
    /// Resolve the referenced cell line; `None` when unset or deleted
    #[must_use]
    pub fn cell_line<'a>(&self, cell_lines: &'a [CellLine]) -> Option<&'a CellLine> {
        let id = self.cell_line_id.as_ref()?;
        cell_lines.iter().find(|c| &c.id == id)
    }
}

impl SubRecord for HazardousProcedure {
    const FIELD: Field = Field::HazardousProcedures;
    const LABEL: &'static str = "hazardous procedure";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn check_required(&self) -> Result<(), RecordIssue> {
        if blank(&self.procedure) {
            return Err(RecordIssue::new("procedure", "Procedure is required"));
        }
        if self.cell_line_id.is_none() {
            return Err(RecordIssue::new("cellLineId", "Select a cell line"));
        }
        if self.hazards.iter().all(|s| blank(s)) {
            return Err(RecordIssue::new("hazards", "Select at least one hazard"));
        }
        if blank(&self.control_measures) {
            return Err(RecordIssue::new(
                "controlMeasures",
                "Control measures are required",
            ));
        }
        Ok(())
    }

    fn check_references(&self, values: &FormValues) -> Result<(), RecordIssue> {
        match &self.cell_line_id {
            Some(id) if !values.cell_lines.iter().any(|c| &c.id == id) => Err(RecordIssue::new(
                "cellLineId",
                format!("Referenced cell line {id} no longer exists"),
            )),
            _ => Ok(()),
        }
    }

    fn into_value(records: Vec<Self>) -> FieldValue {
        FieldValue::HazardousProcedures(records)
    }

    fn from_value(value: FieldValue) -> Option<Vec<Self>> {
        match value {
            FieldValue::HazardousProcedures(records) => Some(records),
            _ => None,
        }
    }
}

/// Synthetic nucleic acid experiment classified under the NIH Guidelines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyntheticExperiment {
    pub id: RecordId,
    pub description: String,
    /// NIH Guidelines section, e.g. "III-D"
    pub nih_section: String,
    pub containment_level: String,
}

impl SubRecord for SyntheticExperiment {
    const FIELD: Field = Field::SyntheticExperiments;
    const LABEL: &'static str = "synthetic experiment";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn check_required(&self) -> Result<(), RecordIssue> {
        if blank(&self.description) {
            return Err(RecordIssue::new("description", "Description is required"));
        }
        if blank(&self.nih_section) {
            return Err(RecordIssue::new("nihSection", "NIH Guidelines section is required"));
        }
        if blank(&self.containment_level) {
            return Err(RecordIssue::new(
                "containmentLevel",
                "Containment level is required",
            ));
        }
        Ok(())
    }

    fn into_value(records: Vec<Self>) -> FieldValue {
        FieldValue::SyntheticExperiments(records)
    }

    fn from_value(value: FieldValue) -> Option<Vec<Self>> {
        match value {
            FieldValue::SyntheticExperiments(records) => Some(records),
            _ => None,
        }
    }
}

/// Protocol team member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMember {
    pub id: RecordId,
    pub user_id: String,
    pub name: String,
    pub role: String,
}

impl SubRecord for TeamMember {
    const FIELD: Field = Field::ProtocolTeamMembers;
    const LABEL: &'static str = "team member";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn check_required(&self) -> Result<(), RecordIssue> {
        if blank(&self.user_id) {
            return Err(RecordIssue::new("userId", "Select a staff member"));
        }
        if blank(&self.name) {
            return Err(RecordIssue::new("name", "Name is required"));
        }
        if blank(&self.role) {
            return Err(RecordIssue::new("role", "Role is required"));
        }
        Ok(())
    }

    fn into_value(records: Vec<Self>) -> FieldValue {
        FieldValue::TeamMembers(records)
    }

    fn from_value(value: FieldValue) -> Option<Vec<Self>> {
        match value {
            FieldValue::TeamMembers(records) => Some(records),
            _ => None,
        }
    }
}

/// Wire encoding of `protocolTeamMembers`.
///
/// The backend stores the list as a JSON-encoded string. Writes keep that
/// encoding; reads accept the string form, a native array, or null.
pub mod legacy_team_members {
    use super::TeamMember;
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Text(String),
        List(Vec<TeamMember>),
    }

    /// Serialize as a JSON string
    ///
    /// # Errors
    /// Propagates JSON encoding failures.
    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(members: &Vec<TeamMember>, s: S) -> Result<S::Ok, S::Error> {
        let encoded = serde_json::to_string(members).map_err(ser::Error::custom)?;
        s.serialize_str(&encoded)
    }

    /// Deserialize from either encoding
    ///
    /// # Errors
    /// Fails when the string form is not a JSON array of members.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<TeamMember>, D::Error> {
        match Option::<Encoded>::deserialize(d)? {
            None => Ok(Vec::new()),
            Some(Encoded::List(list)) => Ok(list),
            Some(Encoded::Text(text)) if text.trim().is_empty() => Ok(Vec::new()),
            Some(Encoded::Text(text)) => serde_json::from_str(&text).map_err(de::Error::custom),
        }
    }
}

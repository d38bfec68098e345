//! Request bodies for application writes

use crate::error::RemoteResult;
use rca_schema::{ApplicationKind, Field, FormValues};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `PATCH /applications/{id}` and `POST /applications`.
///
/// Form fields are flattened next to `isDraft` (and `kind` on create).
/// UI-only scratch fields are never sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ApplicationKind>,
    pub is_draft: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ApplicationPayload {
    /// Update body for an existing application
    ///
    /// # Errors
    /// Fails if the values cannot be serialized.
    pub fn from_form(values: &FormValues, is_draft: bool) -> RemoteResult<Self> {
        let Value::Object(mut fields) = serde_json::to_value(values)? else {
            return Ok(Self {
                kind: None,
                is_draft,
                fields: Map::new(),
            });
        };
        for field in Field::ALL.iter().filter(|f| f.is_ui_only()) {
            fields.remove(field.wire_name());
        }
        Ok(Self {
            kind: None,
            is_draft,
            fields,
        })
    }

    /// Create body for a new application
    ///
    /// # Errors
    /// Fails if the values cannot be serialized.
    pub fn for_create(kind: ApplicationKind, values: &FormValues, is_draft: bool) -> RemoteResult<Self> {
        Ok(Self {
            kind: Some(kind),
            ..Self::from_form(values, is_draft)?
        })
    }

    /// Field value by wire name
    #[inline]
    #[must_use]
    pub fn field(&self, field: Field) -> Option<&Value> {
        self.fields.get(field.wire_name())
    }
}

//! Leads as returned by the amoCRM v4 API and their custom-field
//! normalization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::CrmId;

/// Custom field name mapped to its first scalar value, in the order amoCRM
/// listed the fields.
pub type CustomFields = IndexMap<String, serde_json::Value>;

/// A lead fetched from amoCRM. Transient: lives for one request only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: CrmId,
    pub name: String,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub responsible_user_id: Option<CrmId>,
    #[serde(default)]
    pub account_id: Option<CrmId>,
    /// amoCRM sends `null` when the lead has no custom fields.
    #[serde(default)]
    pub custom_fields_values: Option<Vec<CustomField>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub field_id: CrmId,
    pub field_name: String,
    #[serde(default)]
    pub field_code: Option<String>,
    #[serde(default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub values: Vec<CustomFieldValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    /// String, number or boolean depending on the field type.
    pub value: serde_json::Value,
    #[serde(default)]
    pub enum_id: Option<CrmId>,
    #[serde(default)]
    pub enum_code: Option<String>,
}

impl Lead {
    fn custom_fields(&self) -> &[CustomField] {
        self.custom_fields_values.as_deref().unwrap_or_default()
    }

    /// Map each custom field's display name to the first of its values.
    ///
    /// Fields without any value are left out (see
    /// [`Lead::fields_without_values`]). When a name repeats, the last
    /// field's value wins and keeps the position of the first occurrence.
    pub fn custom_field_map(&self) -> CustomFields {
        self.custom_fields()
            .iter()
            .filter_map(|field| {
                field
                    .values
                    .first()
                    .map(|first| (field.field_name.clone(), first.value.clone()))
            })
            .collect()
    }

    /// Names of custom fields that carry an empty value list.
    pub fn fields_without_values(&self) -> impl Iterator<Item = &str> {
        self.custom_fields()
            .iter()
            .filter(|field| field.values.is_empty())
            .map(|field| field.field_name.as_str())
    }
}

/// Serialize a normalized mapping for storage. Non-ASCII text is kept
/// verbatim rather than `\u` escaped.
pub fn serialize_custom_fields(fields: &CustomFields) -> Result<String, CoreError> {
    serde_json::to_string(fields)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize custom fields: {e}")))
}

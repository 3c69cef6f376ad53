use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_STATUS_FILTER: &str = "COMPLETED_ENDED_SUCCESS";
pub const DEFAULT_DOCUMENT_TYPE: &str = "ID_CARD";
pub const FAILED_URL_PLACEHOLDER: &str = "Failed to format URL";

/// Short-lived credential returned by the API-key exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub token: Option<String>,
}

/// Accepts either a JSON string or number and keeps its textual form.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(crate::domain::services::json_scalar_text(&value).unwrap_or_default())
}

fn optional_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(crate::domain::services::json_scalar_text))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInstance {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(
        rename = "processDefnId",
        default,
        deserialize_with = "optional_string_or_number"
    )]
    pub process_defn_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessInstance {
    pub fn has_status(&self, status: &str) -> bool {
        self.status.as_deref() == Some(status)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstancePage {
    #[serde(default)]
    pub content: Option<Vec<ProcessInstance>>,
    #[serde(default)]
    pub last: Option<bool>,
}

impl InstancePage {
    /// A page without a `last` flag ends pagination.
    pub fn is_last(&self) -> bool {
        self.last.unwrap_or(true)
    }

    pub fn into_content(self) -> Vec<ProcessInstance> {
        self.content.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceDetails {
    #[serde(rename = "processTokenParameters", default)]
    pub process_token_parameters: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstanceDetails {
    /// The document number submitted when the process token was created.
    pub fn valid_id(&self) -> Option<&Value> {
        self.process_token_parameters
            .as_ref()
            .and_then(|params| params.get("ID"))
            .filter(|value| !value.is_null())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct UserData(pub Value);

impl UserData {
    /// null、false、0、空字串、空陣列與空物件都視為沒有資料
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Bool(flag) => !flag,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(fields) => fields.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTokenParameters {
    pub country_code: String,
    pub document_type: String,
    #[serde(rename = "ID")]
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessToken {
    pub name: String,
    pub description: String,
    pub status: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub process_defn_name: String,
    pub process_defn_version: String,
    pub ui_url: String,
    pub parameters: ProcessTokenParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessTokenCreated {
    #[serde(rename = "startProcessAddress", default)]
    pub start_process_address: Option<String>,
}

impl ProcessTokenCreated {
    pub fn start_process_address(&self) -> &str {
        self.start_process_address.as_deref().unwrap_or("N/A")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRow {
    #[serde(rename = "Applicant ID")]
    pub applicant_id: i64,
    #[serde(rename = "Formatted Process URL")]
    pub process_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Matching,
    NonMatching,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    #[serde(rename = "Instance ID")]
    pub instance_id: String,
    #[serde(rename = "Document Number")]
    pub document_number: Option<String>,
    #[serde(rename = "Valid ID")]
    pub valid_id: Option<String>,
}

impl ComparisonRow {
    pub const HEADERS: [&'static str; 3] = ["Instance ID", "Document Number", "Valid ID"];

    pub fn cells(&self) -> [&str; 3] {
        [
            self.instance_id.as_str(),
            self.document_number.as_deref().unwrap_or(""),
            self.valid_id.as_deref().unwrap_or(""),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub matching: Vec<ComparisonRow>,
    pub non_matching: Vec<ComparisonRow>,
    pub skipped: usize,
}

impl AuditReport {
    pub fn push(&mut self, classification: Classification, row: ComparisonRow) {
        match classification {
            Classification::Matching => self.matching.push(row),
            Classification::NonMatching => self.non_matching.push(row),
        }
    }
}

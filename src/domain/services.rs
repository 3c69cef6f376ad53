use crate::domain::model::{Classification, ProcessInstance};
use serde_json::Value;
use url::Url;

const DOCUMENT_NUMBER_FIELD: &str = "Document Number";

/// Textual form of a JSON scalar: strings verbatim, numbers and booleans
/// as rendered by serde_json. `null` has no text.
pub fn json_scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn filter_by_status(instances: Vec<ProcessInstance>, status: &str) -> Vec<ProcessInstance> {
    instances
        .into_iter()
        .filter(|instance| instance.has_status(status))
        .collect()
}

/// Finds the OCR visual-zone value of the "Document Number" biographic
/// entry. Missing levels or unexpected shapes yield `None`.
pub fn extract_document_number(user_data: &Value) -> Option<String> {
    let entries = user_data
        .get("documents")?
        .get("doc1")?
        .get("biographicData")?
        .as_array()?;

    let entry = entries.iter().find(|entry| {
        entry.get("fieldName").and_then(Value::as_str) == Some(DOCUMENT_NUMBER_FIELD)
    })?;

    entry
        .get("values")
        .and_then(|values| values.get("visualZoneValue"))
        .and_then(json_scalar_text)
}

pub fn classify(valid_id: Option<&str>, document_number: Option<&str>) -> Classification {
    match (valid_id, document_number) {
        (Some(valid), Some(document)) if valid == document => Classification::Matching,
        _ => Classification::NonMatching,
    }
}

/// Pulls the first non-empty `pt` query value out of a start-process URL.
/// Relative addresses are resolved against `base_url`.
pub fn extract_pt_parameter(start_process_url: &str, base_url: &str) -> Option<String> {
    let parsed = match Url::parse(start_process_url) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base_url).ok()?;
            base.join(start_process_url).ok()?
        }
        Err(_) => return None,
    };

    parsed
        .query_pairs()
        .find(|(key, value)| key == "pt" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

pub fn format_process_url(base_url: &str, pt: &str) -> String {
    format!("{}/web/trustweb/?pt={}", base_url.trim_end_matches('/'), pt)
}

pub fn trustweb_ui_url(base_url: &str) -> String {
    format!("{}/web/trustweb", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(id: &str, status: &str) -> ProcessInstance {
        serde_json::from_value(json!({"id": id, "processDefnId": "pd", "status": status}))
            .unwrap()
    }

    fn user_data_with(entries: Value) -> Value {
        json!({"documents": {"doc1": {"biographicData": entries}}})
    }

    #[test]
    fn test_filter_by_status_keeps_order() {
        let instances = vec![
            instance("a", "COMPLETED_ENDED_SUCCESS"),
            instance("b", "RUNNING"),
            instance("c", "COMPLETED_ENDED_SUCCESS"),
        ];

        let filtered = filter_by_status(instances, "COMPLETED_ENDED_SUCCESS");
        let ids: Vec<&str> = filtered.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_extract_document_number_found() {
        let data = user_data_with(json!([
            {"fieldName": "Surname", "values": {"visualZoneValue": "DOE"}},
            {"fieldName": "Document Number", "values": {"visualZoneValue": "8001015009087"}}
        ]));
        assert_eq!(
            extract_document_number(&data),
            Some("8001015009087".to_string())
        );
    }

    #[test]
    fn test_extract_document_number_numeric_value() {
        let data = user_data_with(json!([
            {"fieldName": "Document Number", "values": {"visualZoneValue": 123456}}
        ]));
        assert_eq!(extract_document_number(&data), Some("123456".to_string()));
    }

    #[test]
    fn test_extract_document_number_absent() {
        assert_eq!(extract_document_number(&json!({})), None);
        assert_eq!(extract_document_number(&json!({"documents": {}})), None);
        assert_eq!(extract_document_number(&json!({"documents": "oops"})), None);
        assert_eq!(
            extract_document_number(&user_data_with(json!({"not": "a list"}))),
            None
        );
        assert_eq!(
            extract_document_number(&user_data_with(json!([
                {"fieldName": "Document Number"}
            ]))),
            None
        );
        assert_eq!(
            extract_document_number(&user_data_with(json!([
                {"fieldName": "Surname", "values": {"visualZoneValue": "DOE"}}
            ]))),
            None
        );
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Some("123"), Some("123")), Classification::Matching);
        assert_eq!(classify(Some("123"), Some("124")), Classification::NonMatching);
        assert_eq!(classify(Some("123"), None), Classification::NonMatching);
        assert_eq!(classify(None, Some("123")), Classification::NonMatching);
        assert_eq!(classify(None, None), Classification::NonMatching);
    }

    #[test]
    fn test_classify_numeric_valid_id_against_text() {
        let valid = json_scalar_text(&json!(8001015009087_i64));
        assert_eq!(
            classify(valid.as_deref(), Some("8001015009087")),
            Classification::Matching
        );
    }

    #[test]
    fn test_extract_pt_parameter() {
        let base = "https://vendor.test";
        assert_eq!(
            extract_pt_parameter("https://other.host/start?pt=abc123&lang=en", base),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_pt_parameter("/web/trustweb/?pt=rel-1", base),
            Some("rel-1".to_string())
        );
        assert_eq!(extract_pt_parameter("https://vendor.test/start?pt=", base), None);
        assert_eq!(extract_pt_parameter("https://vendor.test/start", base), None);
        assert_eq!(extract_pt_parameter("N/A", base), None);
    }

    #[test]
    fn test_format_process_url() {
        assert_eq!(
            format_process_url("https://vendor.test", "abc123"),
            "https://vendor.test/web/trustweb/?pt=abc123"
        );
        assert_eq!(
            trustweb_ui_url("https://vendor.test/"),
            "https://vendor.test/web/trustweb"
        );
    }
}

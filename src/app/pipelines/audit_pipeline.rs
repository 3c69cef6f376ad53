use crate::adapters::http::VendorClient;
use crate::adapters::spreadsheet::Workbook;
use crate::config::AuditJobConfig;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    AuditReport, BearerToken, Classification, ComparisonRow, ProcessInstance,
};
use crate::domain::services::{
    classify, extract_document_number, filter_by_status, json_scalar_text,
};
use crate::utils::error::Result;
use chrono::NaiveDate;

pub const MATCHING_SHEET: &str = "Matching IDs";
pub const NON_MATCHING_SHEET: &str = "Non-Matching IDs";

#[derive(Debug)]
pub struct AuditBatch {
    pub bearer: BearerToken,
    pub instances: Vec<ProcessInstance>,
}

/// Cross-checks the submitted document number of every completed process
/// instance against the number read from the document itself.
pub struct AuditPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    connection: C,
    job: AuditJobConfig,
    client: VendorClient,
    report_date: Option<NaiveDate>,
}

impl<S: Storage, C: ConfigProvider> AuditPipeline<S, C> {
    pub fn new(storage: S, connection: C, job: AuditJobConfig) -> Result<Self> {
        let client = VendorClient::from_config(&connection)?;
        Ok(Self {
            storage,
            connection,
            job,
            client,
            report_date: None,
        })
    }

    /// Pins the date used in the report file name (defaults to today).
    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    pub fn report_file_name(&self) -> String {
        let date = self
            .report_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        self.job.report_file_name(date)
    }

    /// Builds the comparison row for one instance. `None` means the user
    /// data could not be read and the instance is left out of the report.
    async fn compare(
        &self,
        bearer: &BearerToken,
        instance: &ProcessInstance,
    ) -> Option<(Classification, ComparisonRow)> {
        let valid_id = match self.client.get_instance_details(bearer, &instance.id).await {
            Ok(details) => details.valid_id().and_then(json_scalar_text),
            Err(e) => {
                tracing::warn!("Error fetching details for instance {}: {}", instance.id, e);
                None
            }
        };

        let Some(process_def_id) = instance.process_defn_id.as_deref() else {
            tracing::warn!("Instance {} has no process definition id", instance.id);
            return None;
        };

        let user_data = match self
            .client
            .get_user_data(bearer, process_def_id, &instance.id)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Error fetching user data for instance {}: {}", instance.id, e);
                return None;
            }
        };

        if user_data.is_empty() {
            tracing::warn!("Instance {} returned empty user data", instance.id);
            return None;
        }

        let document_number = extract_document_number(&user_data.0);
        if document_number.is_none() {
            tracing::debug!("No document number found for instance {}", instance.id);
        }

        let classification = classify(valid_id.as_deref(), document_number.as_deref());
        tracing::debug!(
            "Instance {}: valid ID {:?}, document number {:?} -> {:?}",
            instance.id,
            valid_id,
            document_number,
            classification
        );

        Some((
            classification,
            ComparisonRow {
                instance_id: instance.id.clone(),
                document_number,
                valid_id,
            },
        ))
    }

    pub fn build_workbook(report: &AuditReport) -> Result<Workbook> {
        let mut workbook = Workbook::new();

        let matching = workbook.add_sheet(MATCHING_SHEET, ComparisonRow::HEADERS)?;
        for row in &report.matching {
            matching.push_row(row.cells());
        }

        let non_matching = workbook.add_sheet(NON_MATCHING_SHEET, ComparisonRow::HEADERS)?;
        for row in &report.non_matching {
            non_matching.push_row(row.cells());
        }

        Ok(workbook)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AuditPipeline<S, C> {
    type Extracted = AuditBatch;
    type Transformed = AuditReport;

    fn name(&self) -> &str {
        "audit-instances"
    }

    async fn extract(&self) -> Result<AuditBatch> {
        let bearer = self
            .client
            .issue_bearer_token(self.connection.api_key())
            .await?;

        let all = self
            .client
            .list_process_instances(&bearer, self.job.page_size)
            .await;
        let total = all.len();
        let instances = filter_by_status(all, &self.job.status);

        tracing::info!(
            "Fetched {} process instances, {} with status {}",
            total,
            instances.len(),
            self.job.status
        );

        Ok(AuditBatch { bearer, instances })
    }

    async fn transform(&self, data: AuditBatch) -> Result<AuditReport> {
        let mut report = AuditReport::default();

        for instance in &data.instances {
            match self.compare(&data.bearer, instance).await {
                Some((classification, row)) => report.push(classification, row),
                None => report.skipped += 1,
            }
        }

        tracing::info!(
            "Audit complete: {} matching, {} non-matching, {} skipped",
            report.matching.len(),
            report.non_matching.len(),
            report.skipped
        );

        Ok(report)
    }

    async fn load(&self, result: AuditReport) -> Result<String> {
        let file_name = self.report_file_name();
        let data = Self::build_workbook(&result)?.to_bytes()?;

        self.storage.write_file(&file_name, &data).await?;

        let location = self.storage.location(&file_name);
        tracing::info!("Spreadsheet created: {}", location);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::utils::error::TrustkitError;
    use crate::utils::logger::capture::LogBuffer;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                TrustkitError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("memory://{}", path)
        }
    }

    fn instance(id: &str) -> ProcessInstance {
        serde_json::from_value(json!({
            "id": id,
            "processDefnId": "pd-1",
            "status": "COMPLETED_ENDED_SUCCESS"
        }))
        .unwrap()
    }

    fn user_data(document_number: &str) -> serde_json::Value {
        json!({"documents": {"doc1": {"biographicData": [
            {"fieldName": "Document Number", "values": {"visualZoneValue": document_number}}
        ]}}})
    }

    fn pipeline(server: &MockServer) -> AuditPipeline<MockStorage, ConnectionConfig> {
        let connection = ConnectionConfig::new(&server.base_url(), "key");
        AuditPipeline::new(MockStorage::default(), connection, AuditJobConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_compare_matching_numeric_valid_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/process-manager/processInstances/i-1/withParameters");
            then.status(200)
                .json_body(json!({"processTokenParameters": {"ID": 8001015009087_i64}}));
        });
        server.mock(|when, then| {
            when.method(GET).path(
                "/api/userdata-server/processDefinitions/pd-1/processInstances/i-1/userdata",
            );
            then.status(200).json_body(user_data("8001015009087"));
        });

        let pipeline = pipeline(&server);
        let (classification, row) = pipeline
            .compare(&BearerToken::new("t"), &instance("i-1"))
            .await
            .unwrap();

        assert_eq!(classification, Classification::Matching);
        assert_eq!(row.valid_id.as_deref(), Some("8001015009087"));
        assert_eq!(row.document_number.as_deref(), Some("8001015009087"));
    }

    #[tokio::test]
    async fn test_compare_details_failure_is_non_matching() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/process-manager/processInstances/i-2/withParameters");
            then.status(404).body("not found");
        });
        server.mock(|when, then| {
            when.method(GET).path(
                "/api/userdata-server/processDefinitions/pd-1/processInstances/i-2/userdata",
            );
            then.status(200).json_body(user_data("123"));
        });

        let pipeline = pipeline(&server);
        let (classification, row) = pipeline
            .compare(&BearerToken::new("t"), &instance("i-2"))
            .await
            .unwrap();

        assert_eq!(classification, Classification::NonMatching);
        assert_eq!(row.valid_id, None);
    }

    #[tokio::test]
    async fn test_compare_skips_missing_or_empty_user_data() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/withParameters");
            then.status(200).json_body(json!({"processTokenParameters": {"ID": "1"}}));
        });
        server.mock(|when, then| {
            when.method(GET).path(
                "/api/userdata-server/processDefinitions/pd-1/processInstances/i-3/userdata",
            );
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path(
                "/api/userdata-server/processDefinitions/pd-1/processInstances/i-4/userdata",
            );
            then.status(200).json_body(json!({}));
        });
        server.mock(|when, then| {
            when.method(GET).path(
                "/api/userdata-server/processDefinitions/pd-1/processInstances/i-5/userdata",
            );
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.method(GET).path(
                "/api/userdata-server/processDefinitions/pd-1/processInstances/i-6/userdata",
            );
            then.status(200).json_body(json!(""));
        });

        let pipeline = pipeline(&server);
        let bearer = BearerToken::new("t");
        for id in ["i-3", "i-4", "i-5", "i-6"] {
            assert!(pipeline.compare(&bearer, &instance(id)).await.is_none(), "{}", id);
        }
    }

    #[tokio::test]
    async fn test_user_data_failure_is_logged_once() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/withParameters");
            then.status(200).json_body(json!({"processTokenParameters": {"ID": "1"}}));
        });
        server.mock(|when, then| {
            when.method(GET).path_contains("/userdata");
            then.status(503).body("userdata-offline");
        });

        let pipeline = pipeline(&server);
        let logs = LogBuffer::default();
        let _guard = tracing::subscriber::set_default(
            logs.subscriber(tracing_subscriber::EnvFilter::new("trustkit=debug")),
        );

        let outcome = pipeline
            .compare(&BearerToken::new("t"), &instance("i-7"))
            .await;

        assert!(outcome.is_none());
        assert_eq!(logs.contents().matches("userdata-offline").count(), 1);
    }

    #[test]
    fn test_build_workbook_has_both_sheets() {
        let mut report = AuditReport::default();
        report.push(
            Classification::Matching,
            ComparisonRow {
                instance_id: "i-1".to_string(),
                document_number: Some("1".to_string()),
                valid_id: Some("1".to_string()),
            },
        );

        let workbook =
            AuditPipeline::<MockStorage, ConnectionConfig>::build_workbook(&report).unwrap();
        let names: Vec<&str> = workbook.sheets().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![MATCHING_SHEET, NON_MATCHING_SHEET]);
        assert_eq!(workbook.sheets()[0].row_count(), 1);
        assert_eq!(workbook.sheets()[1].row_count(), 0);
    }

    #[tokio::test]
    async fn test_report_file_name_uses_pinned_date() {
        let server = MockServer::start();
        let pipeline =
            pipeline(&server).with_report_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(
            pipeline.report_file_name(),
            "process_instances_insights_31-12-2025.xlsx"
        );
    }
}

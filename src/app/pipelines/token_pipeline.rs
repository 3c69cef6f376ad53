use crate::adapters::http::VendorClient;
use crate::config::TokenJobConfig;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    BearerToken, CreateProcessToken, ProcessTokenParameters, TokenRow, FAILED_URL_PLACEHOLDER,
};
use crate::domain::services::{extract_pt_parameter, format_process_url, trustweb_ui_url};
use crate::utils::error::{Result, TrustkitError};

const CSV_HEADERS: [&str; 2] = ["Applicant ID", "Formatted Process URL"];

/// Output of the extract phase. `bearer` is `None` on a dry run.
#[derive(Debug)]
pub struct TokenBatch {
    pub bearer: Option<BearerToken>,
    pub applicant_ids: Vec<i64>,
}

#[derive(Debug, Default)]
pub struct TokenOutcome {
    pub rows: Vec<TokenRow>,
    pub failed_ids: Vec<i64>,
}

/// Issues one process token per applicant and exports the resulting
/// verification URLs to CSV.
pub struct TokenPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    connection: C,
    job: TokenJobConfig,
    client: VendorClient,
}

impl<S: Storage, C: ConfigProvider> TokenPipeline<S, C> {
    pub fn new(storage: S, connection: C, job: TokenJobConfig) -> Result<Self> {
        let client = VendorClient::from_config(&connection)?;
        Ok(Self {
            storage,
            connection,
            job,
            client,
        })
    }

    pub fn build_request(&self, applicant_id: i64) -> CreateProcessToken {
        CreateProcessToken {
            name: uuid::Uuid::new_v4().to_string(),
            description: "A process token".to_string(),
            status: "ACTIVE".to_string(),
            token_type: "UNLIMITED".to_string(),
            process_defn_name: self.job.process_definition_name.clone(),
            process_defn_version: self.job.process_definition_version.clone(),
            ui_url: trustweb_ui_url(self.client.base_url()),
            parameters: ProcessTokenParameters {
                country_code: self.job.country_code.clone(),
                document_type: self.job.document_type.clone(),
                id: applicant_id,
            },
        }
    }

    /// Creates the token for one applicant. `None` means the API refused
    /// it and no row is written.
    async fn issue_for(&self, bearer: &BearerToken, applicant_id: i64) -> Option<TokenRow> {
        let request = self.build_request(applicant_id);

        let created = match self.client.create_process_token(bearer, &request).await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(
                    "Failed to create process token for ID {}: {}",
                    applicant_id,
                    e
                );
                return None;
            }
        };

        let start_address = created.start_process_address();
        let process_url = match extract_pt_parameter(start_address, self.client.base_url()) {
            Some(pt) => {
                let url = format_process_url(self.client.base_url(), &pt);
                tracing::info!("Process token created for ID {}: {}", applicant_id, url);
                url
            }
            None => {
                tracing::warn!("Failed to extract 'pt' parameter from {}", start_address);
                FAILED_URL_PLACEHOLDER.to_string()
            }
        };

        Some(TokenRow {
            applicant_id,
            process_url,
        })
    }

    pub fn render_csv(rows: &[TokenRow]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        // 即使沒有資料也寫入標題列
        writer.write_record(CSV_HEADERS)?;
        for row in rows {
            writer.serialize(row)?;
        }

        writer
            .into_inner()
            .map_err(|e| TrustkitError::IoError(e.into_error()))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TokenPipeline<S, C> {
    type Extracted = TokenBatch;
    type Transformed = TokenOutcome;

    fn name(&self) -> &str {
        "issue-tokens"
    }

    async fn extract(&self) -> Result<TokenBatch> {
        let applicant_ids = self.job.applicant_ids.clone();

        if self.job.dry_run {
            tracing::info!(
                "Dry run: {} process tokens would be created for {} v{}",
                applicant_ids.len(),
                self.job.process_definition_name,
                self.job.process_definition_version
            );
            return Ok(TokenBatch {
                bearer: None,
                applicant_ids,
            });
        }

        let bearer = self
            .client
            .issue_bearer_token(self.connection.api_key())
            .await?;

        Ok(TokenBatch {
            bearer: Some(bearer),
            applicant_ids,
        })
    }

    async fn transform(&self, data: TokenBatch) -> Result<TokenOutcome> {
        let mut outcome = TokenOutcome::default();

        let Some(bearer) = data.bearer else {
            for id in &data.applicant_ids {
                tracing::info!("  - would create process token for ID {}", id);
            }
            return Ok(outcome);
        };

        for applicant_id in data.applicant_ids {
            match self.issue_for(&bearer, applicant_id).await {
                Some(row) => outcome.rows.push(row),
                None => outcome.failed_ids.push(applicant_id),
            }
        }

        tracing::info!(
            "Created {} process tokens, {} failed",
            outcome.rows.len(),
            outcome.failed_ids.len()
        );
        if !outcome.failed_ids.is_empty() {
            tracing::warn!("Applicant IDs without a token: {:?}", outcome.failed_ids);
        }

        Ok(outcome)
    }

    async fn load(&self, result: TokenOutcome) -> Result<String> {
        let location = self.storage.location(&self.job.csv_name);

        if self.job.dry_run {
            tracing::info!("Dry run: {} not written", location);
            return Ok(location);
        }

        let data = Self::render_csv(&result.rows)?;
        self.storage.write_file(&self.job.csv_name, &data).await?;

        tracing::info!("Process tokens saved to {}", location);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
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

    fn pipeline(server: &MockServer, ids: Vec<i64>) -> TokenPipeline<MockStorage, ConnectionConfig> {
        let connection = ConnectionConfig::new(&server.base_url(), "key");
        let job = TokenJobConfig::new(ids, "kyc", "3", "ZAF");
        TokenPipeline::new(MockStorage::default(), connection, job).unwrap()
    }

    #[test]
    fn test_render_csv_writes_header_without_rows() {
        let data = TokenPipeline::<MockStorage, ConnectionConfig>::render_csv(&[]).unwrap();
        assert_eq!(
            String::from_utf8(data).unwrap(),
            "Applicant ID,Formatted Process URL\n"
        );
    }

    #[tokio::test]
    async fn test_build_request_uses_job_settings() {
        let server = MockServer::start();
        let pipeline = pipeline(&server, vec![1]);

        let first = pipeline.build_request(1001);
        let second = pipeline.build_request(1001);

        assert_ne!(first.name, second.name);
        assert_eq!(first.process_defn_name, "kyc");
        assert_eq!(first.process_defn_version, "3");
        assert_eq!(first.ui_url, format!("{}/web/trustweb", server.base_url()));
        assert_eq!(first.parameters.country_code, "ZAF");
        assert_eq!(first.parameters.document_type, "ID_CARD");
        assert_eq!(first.parameters.id, 1001);
    }

    #[tokio::test]
    async fn test_transform_handles_each_outcome() {
        let server = MockServer::start();
        let ok = server.mock(|when, then| {
            when.method(POST)
                .path("/api/process-manager/processTokens")
                .json_body_partial(r#"{"parameters": {"ID": 1}}"#);
            then.status(201).json_body(json!({
                "startProcessAddress": "https://vendor.internal/start?pt=tok-1"
            }));
        });
        let no_pt = server.mock(|when, then| {
            when.method(POST)
                .path("/api/process-manager/processTokens")
                .json_body_partial(r#"{"parameters": {"ID": 2}}"#);
            then.status(201).json_body(json!({}));
        });
        let rejected = server.mock(|when, then| {
            when.method(POST)
                .path("/api/process-manager/processTokens")
                .json_body_partial(r#"{"parameters": {"ID": 3}}"#);
            then.status(400).body("bad definition");
        });

        let pipeline = pipeline(&server, vec![1, 2, 3]);
        let outcome = pipeline
            .transform(TokenBatch {
                bearer: Some(BearerToken::new("t")),
                applicant_ids: vec![1, 2, 3],
            })
            .await
            .unwrap();

        ok.assert();
        no_pt.assert();
        rejected.assert();
        assert_eq!(
            outcome.rows,
            vec![
                TokenRow {
                    applicant_id: 1,
                    process_url: format!("{}/web/trustweb/?pt=tok-1", server.base_url()),
                },
                TokenRow {
                    applicant_id: 2,
                    process_url: FAILED_URL_PLACEHOLDER.to_string(),
                },
            ]
        );
        assert_eq!(outcome.failed_ids, vec![3]);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_requests() {
        let server = MockServer::start();
        let issue = server.mock(|when, then| {
            when.any_request();
            then.status(200).json_body(json!({"token": "t"}));
        });

        let connection = ConnectionConfig::new(&server.base_url(), "key");
        let mut job = TokenJobConfig::new(vec![1, 2], "kyc", "3", "ZAF");
        job.dry_run = true;
        let storage = MockStorage::default();
        let pipeline = TokenPipeline::new(storage.clone(), connection, job).unwrap();

        let batch = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(batch).await.unwrap();
        let location = pipeline.load(outcome).await.unwrap();

        issue.assert_hits(0);
        assert_eq!(location, "memory://process_tokens.csv");
        assert!(storage.get_file("process_tokens.csv").await.is_none());
    }
}

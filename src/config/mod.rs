#[cfg(feature = "cli")]
pub mod cli;
pub mod profile;

#[cfg(feature = "cli")]
pub use cli::{AuditArgs, ConnectionArgs, TokenArgs};
pub use profile::Profile;

use crate::domain::model::{DEFAULT_DOCUMENT_TYPE, DEFAULT_STATUS_FILTER};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_name, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use std::time::Duration;

pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const DEFAULT_CSV_NAME: &str = "process_tokens.csv";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_REPORT_PREFIX: &str = "process_instances_insights";

/// Where the API lives, how to authenticate and where artifacts go.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Option<Duration>,
    pub output_path: String,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("request_timeout", &self.request_timeout)
            .field("output_path", &self.output_path)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            request_timeout: None,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }

    pub fn with_output_path(mut self, output_path: impl Into<String>) -> Self {
        self.output_path = output_path.into();
        self
    }
}

impl ConfigProvider for ConnectionConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

impl Validate for ConnectionConfig {
    fn validate(&self) -> Result<()> {
        validate_url("BASE_URL", &self.base_url)?;
        validate_non_empty_string("API_KEY", &self.api_key)?;
        validate_path("OUTPUT_PATH", &self.output_path)?;
        if let Some(timeout) = self.request_timeout {
            validate_positive_number("REQUEST_TIMEOUT_SECS", timeout.as_secs() as usize, 1)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenJobConfig {
    pub applicant_ids: Vec<i64>,
    pub process_definition_name: String,
    pub process_definition_version: String,
    pub country_code: String,
    pub document_type: String,
    pub csv_name: String,
    pub dry_run: bool,
}

impl TokenJobConfig {
    pub fn new(
        applicant_ids: Vec<i64>,
        process_definition_name: &str,
        process_definition_version: &str,
        country_code: &str,
    ) -> Self {
        Self {
            applicant_ids,
            process_definition_name: process_definition_name.to_string(),
            process_definition_version: process_definition_version.to_string(),
            country_code: country_code.to_string(),
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            csv_name: DEFAULT_CSV_NAME.to_string(),
            dry_run: false,
        }
    }
}

impl Validate for TokenJobConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("IDS", self.applicant_ids.len(), 1)?;
        validate_non_empty_string("PD_NAME", &self.process_definition_name)?;
        validate_non_empty_string("PD_VER", &self.process_definition_version)?;
        validate_non_empty_string("COUNTRY_CODE", &self.country_code)?;
        validate_non_empty_string("DOCUMENT_TYPE", &self.document_type)?;
        validate_file_name("csv_name", &self.csv_name, "csv")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditJobConfig {
    pub page_size: usize,
    pub status: String,
    pub report_prefix: String,
}

impl Default for AuditJobConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            status: DEFAULT_STATUS_FILTER.to_string(),
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
        }
    }
}

impl AuditJobConfig {
    /// `<prefix>_<dd-mm-YYYY>.xlsx`
    pub fn report_file_name(&self, date: chrono::NaiveDate) -> String {
        format!("{}_{}.xlsx", self.report_prefix, date.format("%d-%m-%Y"))
    }
}

impl Validate for AuditJobConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("PAGE_SIZE", self.page_size, 1)?;
        validate_non_empty_string("STATUS_FILTER", &self.status)?;
        validate_file_name("report_prefix", &format!("{}.xlsx", self.report_prefix), "xlsx")?;
        Ok(())
    }
}

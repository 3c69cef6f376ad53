use crate::config::{
    AuditJobConfig, ConnectionConfig, Profile, TokenJobConfig, DEFAULT_CSV_NAME,
    DEFAULT_OUTPUT_PATH, DEFAULT_PAGE_SIZE, DEFAULT_REPORT_PREFIX,
};
use crate::domain::model::{DEFAULT_DOCUMENT_TYPE, DEFAULT_STATUS_FILTER};
use crate::utils::error::{Result, TrustkitError};
use crate::utils::validation::parse_applicant_ids;
use clap::{Args, Parser};
use std::time::Duration;

fn required(field: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| TrustkitError::MissingConfigError {
        field: field.to_string(),
    })
}

/// Connection and logging flags shared by both tools.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Base URL of the vendor API
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// API key exchanged for a bearer token
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Directory the output file is written to
    #[arg(long, env = "OUTPUT_PATH")]
    pub output_path: Option<String>,

    /// Optional TOML profile providing fallback values
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Log elapsed time and memory usage per phase
    #[arg(long)]
    pub monitor: bool,
}

impl ConnectionArgs {
    pub fn load_profile(&self) -> Result<Profile> {
        match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading profile from: {}", path);
                Profile::from_file(path)
            }
            None => Ok(Profile::default()),
        }
    }

    pub fn resolve(&self, profile: &Profile) -> Result<ConnectionConfig> {
        let base_url = required("BASE_URL", self.base_url.clone().or_else(|| profile.base_url()))?;
        let api_key = required("API_KEY", self.api_key.clone().or_else(|| profile.api_key()))?;

        Ok(ConnectionConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout: self
                .request_timeout_secs
                .or_else(|| profile.request_timeout_secs())
                .map(Duration::from_secs),
            output_path: self
                .output_path
                .clone()
                .or_else(|| profile.output_path())
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
        })
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "issue-tokens")]
#[command(about = "Create process tokens for a list of applicant IDs and export their URLs to CSV")]
pub struct TokenArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Comma-separated applicant IDs
    #[arg(long, env = "IDS")]
    pub ids: Option<String>,

    /// Process definition name
    #[arg(long, env = "PD_NAME")]
    pub process_definition_name: Option<String>,

    /// Process definition version
    #[arg(long, env = "PD_VER")]
    pub process_definition_version: Option<String>,

    /// Country code passed as a process token parameter
    #[arg(long, env = "COUNTRY_CODE")]
    pub country_code: Option<String>,

    /// Document type passed as a process token parameter
    #[arg(long, env = "DOCUMENT_TYPE")]
    pub document_type: Option<String>,

    /// Name of the CSV file written to the output path
    #[arg(long)]
    pub csv_name: Option<String>,

    /// Dry run - log the planned requests without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

impl TokenArgs {
    pub fn resolve(&self, profile: &Profile) -> Result<TokenJobConfig> {
        let applicant_ids = match &self.ids {
            Some(raw) => parse_applicant_ids("IDS", raw)?,
            None => profile
                .applicant_ids()?
                .ok_or_else(|| TrustkitError::MissingConfigError {
                    field: "IDS".to_string(),
                })?,
        };

        Ok(TokenJobConfig {
            applicant_ids,
            process_definition_name: required(
                "PD_NAME",
                self.process_definition_name
                    .clone()
                    .or_else(|| profile.process_definition_name()),
            )?,
            process_definition_version: required(
                "PD_VER",
                self.process_definition_version
                    .clone()
                    .or_else(|| profile.process_definition_version()),
            )?,
            country_code: required(
                "COUNTRY_CODE",
                self.country_code.clone().or_else(|| profile.country_code()),
            )?,
            document_type: self
                .document_type
                .clone()
                .or_else(|| profile.document_type())
                .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
            csv_name: self
                .csv_name
                .clone()
                .or_else(|| profile.csv_name())
                .unwrap_or_else(|| DEFAULT_CSV_NAME.to_string()),
            dry_run: self.dry_run,
        })
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "audit-instances")]
#[command(about = "Compare submitted and extracted document numbers of completed process instances")]
pub struct AuditArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Page size used when listing process instances
    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Only instances in this status are audited
    #[arg(long, env = "STATUS_FILTER")]
    pub status: Option<String>,

    /// Report file name prefix; the date and .xlsx are appended
    #[arg(long)]
    pub report_prefix: Option<String>,
}

impl AuditArgs {
    pub fn resolve(&self, profile: &Profile) -> AuditJobConfig {
        AuditJobConfig {
            page_size: self
                .page_size
                .or_else(|| profile.page_size())
                .unwrap_or(DEFAULT_PAGE_SIZE),
            status: self
                .status
                .clone()
                .or_else(|| profile.status())
                .unwrap_or_else(|| DEFAULT_STATUS_FILTER.to_string()),
            report_prefix: self
                .report_prefix
                .clone()
                .or_else(|| profile.report_prefix())
                .unwrap_or_else(|| DEFAULT_REPORT_PREFIX.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_args_from_flags() {
        let args = TokenArgs::try_parse_from([
            "issue-tokens",
            "--base-url",
            "https://vendor.test/",
            "--api-key",
            "key",
            "--ids",
            "1001,1002",
            "--process-definition-name",
            "kyc",
            "--process-definition-version",
            "4",
            "--country-code",
            "ZAF",
        ])
        .unwrap();

        let profile = Profile::default();
        let connection = args.connection.resolve(&profile).unwrap();
        assert_eq!(connection.base_url, "https://vendor.test");

        let job = args.resolve(&profile).unwrap();
        assert_eq!(job.applicant_ids, vec![1001, 1002]);
        assert_eq!(job.document_type, "ID_CARD");
        assert_eq!(job.csv_name, "process_tokens.csv");
        assert!(!job.dry_run);
    }

    #[test]
    fn test_flags_take_precedence_over_profile() {
        let profile = Profile::from_toml_str(
            r#"
[connection]
base_url = "https://profile.test"
api_key = "profile-key"

[output]
path = "./from-profile"

[audit]
page_size = 25
status = "RUNNING"
"#,
        )
        .unwrap();

        let args = AuditArgs::try_parse_from([
            "audit-instances",
            "--base-url",
            "https://flag.test",
            "--page-size",
            "10",
        ])
        .unwrap();

        let connection = args.connection.resolve(&profile).unwrap();
        assert_eq!(connection.base_url, "https://flag.test");
        assert_eq!(connection.api_key, "profile-key");
        assert_eq!(connection.output_path, "./from-profile");

        let job = args.resolve(&profile);
        assert_eq!(job.page_size, 10);
        assert_eq!(job.status, "RUNNING");
        assert_eq!(job.report_prefix, "process_instances_insights");
    }

    #[test]
    fn test_missing_required_setting() {
        let args = TokenArgs::try_parse_from([
            "issue-tokens",
            "--ids",
            "1",
            "--process-definition-name",
            "kyc",
            "--country-code",
            "ZAF",
        ])
        .unwrap();

        let err = args.resolve(&Profile::default()).unwrap_err();
        assert!(matches!(
            err,
            TrustkitError::MissingConfigError { ref field } if field == "PD_VER"
        ));
    }
}

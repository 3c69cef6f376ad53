use crate::utils::error::{Result, TrustkitError};
use crate::utils::validation::parse_applicant_ids;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

/// Optional TOML profile. Every value is a fallback used when neither a
/// CLI flag nor an environment variable supplies it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    pub connection: Option<ConnectionSection>,
    pub output: Option<OutputSection>,
    pub tokens: Option<TokensSection>,
    pub audit: Option<AuditSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    List(Vec<i64>),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokensSection {
    pub ids: Option<IdList>,
    pub process_definition_name: Option<String>,
    pub process_definition_version: Option<String>,
    pub country_code: Option<String>,
    pub document_type: Option<String>,
    pub csv_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditSection {
    pub page_size: Option<usize>,
    pub status: Option<String>,
    pub report_prefix: Option<String>,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// A value that still carries an unresolved `${VAR}` counts as unset.
fn resolved(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| !placeholder_re().is_match(v))
        .cloned()
}

impl Profile {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TrustkitError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| TrustkitError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        placeholder_re()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn base_url(&self) -> Option<String> {
        self.connection.as_ref().and_then(|c| resolved(&c.base_url))
    }

    pub fn api_key(&self) -> Option<String> {
        self.connection.as_ref().and_then(|c| resolved(&c.api_key))
    }

    pub fn request_timeout_secs(&self) -> Option<u64> {
        self.connection.as_ref().and_then(|c| c.request_timeout_secs)
    }

    pub fn output_path(&self) -> Option<String> {
        self.output.as_ref().and_then(|o| resolved(&o.path))
    }

    pub fn applicant_ids(&self) -> Result<Option<Vec<i64>>> {
        match self.tokens.as_ref().and_then(|t| t.ids.as_ref()) {
            None => Ok(None),
            Some(IdList::List(ids)) => Ok(Some(ids.clone())),
            Some(IdList::Text(raw)) if placeholder_re().is_match(raw) => Ok(None),
            Some(IdList::Text(raw)) => parse_applicant_ids("tokens.ids", raw).map(Some),
        }
    }

    fn tokens_field(&self, pick: impl Fn(&TokensSection) -> &Option<String>) -> Option<String> {
        self.tokens.as_ref().and_then(|t| resolved(pick(t)))
    }

    pub fn process_definition_name(&self) -> Option<String> {
        self.tokens_field(|t| &t.process_definition_name)
    }

    pub fn process_definition_version(&self) -> Option<String> {
        self.tokens_field(|t| &t.process_definition_version)
    }

    pub fn country_code(&self) -> Option<String> {
        self.tokens_field(|t| &t.country_code)
    }

    pub fn document_type(&self) -> Option<String> {
        self.tokens_field(|t| &t.document_type)
    }

    pub fn csv_name(&self) -> Option<String> {
        self.tokens_field(|t| &t.csv_name)
    }

    pub fn page_size(&self) -> Option<usize> {
        self.audit.as_ref().and_then(|a| a.page_size)
    }

    pub fn status(&self) -> Option<String> {
        self.audit.as_ref().and_then(|a| resolved(&a.status))
    }

    pub fn report_prefix(&self) -> Option<String> {
        self.audit.as_ref().and_then(|a| resolved(&a.report_prefix))
    }
}

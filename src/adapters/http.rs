use crate::domain::model::{
    BearerToken, CreateProcessToken, InstanceDetails, InstancePage, IssuedToken, ProcessInstance,
    ProcessTokenCreated, UserData,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, TrustkitError};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

const ISSUE_TOKEN_PATH: &str = "/api/arthr/apiKeys/issue";
const PROCESS_TOKENS_PATH: &str = "/api/process-manager/processTokens";
const PROCESS_INSTANCES_PATH: &str = "/api/process-manager/processInstances";

/// Thin wrapper over the vendor's process-manager and user-data endpoints.
/// Every call is a single round trip; nothing is retried.
#[derive(Debug, Clone)]
pub struct VendorClient {
    client: Client,
    base_url: String,
}

impl VendorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 讀取錯誤回應的內容；由呼叫端決定如何記錄
    async fn vendor_failure(operation: &str, response: Response) -> TrustkitError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        TrustkitError::VendorError {
            operation: operation.to_string(),
            status,
            body,
        }
    }

    async fn expect_json<T: DeserializeOwned>(
        operation: &str,
        response: Response,
        expected: StatusCode,
    ) -> Result<T> {
        if response.status() != expected {
            return Err(Self::vendor_failure(operation, response).await);
        }
        let body = response.text().await?;
        tracing::debug!("{} response: {} bytes", operation, body.len());
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn issue_bearer_token(&self, api_key: &str) -> Result<BearerToken> {
        let url = self.endpoint(ISSUE_TOKEN_PATH);
        tracing::debug!("Issuing API token via {}", url);

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", api_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            tracing::error!("Failed to issue API token: {} {}", status.as_u16(), body);
            return Err(TrustkitError::TokenIssuanceError {
                status: status.as_u16(),
                body,
            });
        }

        let issued: IssuedToken =
            serde_json::from_str(&body).map_err(|_| TrustkitError::TokenIssuanceError {
                status: status.as_u16(),
                body: body.clone(),
            })?;

        match issued.token.filter(|t| !t.is_empty()) {
            Some(token) => {
                tracing::info!("API token received");
                Ok(BearerToken::new(token))
            }
            None => {
                tracing::error!("Token issuance response carried no token: {}", body);
                Err(TrustkitError::TokenIssuanceError {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    pub async fn create_process_token(
        &self,
        bearer: &BearerToken,
        request: &CreateProcessToken,
    ) -> Result<ProcessTokenCreated> {
        let response = self
            .client
            .post(self.endpoint(PROCESS_TOKENS_PATH))
            .bearer_auth(bearer.as_str())
            .json(request)
            .send()
            .await?;

        Self::expect_json("Create process token", response, StatusCode::CREATED).await
    }

    pub async fn fetch_instance_page(
        &self,
        bearer: &BearerToken,
        page: u32,
        size: usize,
    ) -> Result<InstancePage> {
        let response = self
            .client
            .get(self.endpoint(PROCESS_INSTANCES_PATH))
            .bearer_auth(bearer.as_str())
            .header("Content-Type", "application/json")
            .query(&[("page", page.to_string()), ("size", size.to_string())])
            .send()
            .await?;

        Self::expect_json("Fetch process instances", response, StatusCode::OK).await
    }

    /// Walks every page starting at 0 until a page reports `last`.
    /// A failed page ends the walk; instances gathered so far are kept.
    pub async fn list_process_instances(
        &self,
        bearer: &BearerToken,
        page_size: usize,
    ) -> Vec<ProcessInstance> {
        let mut instances = Vec::new();
        let mut page = 0u32;

        loop {
            match self.fetch_instance_page(bearer, page, page_size).await {
                Ok(result) => {
                    let is_last = result.is_last();
                    let content = result.into_content();
                    tracing::debug!("Page {} returned {} instances", page, content.len());
                    if content.is_empty() && !is_last {
                        tracing::warn!("Page {} is empty but not marked last, stopping", page);
                        break;
                    }
                    instances.extend(content);
                    if is_last {
                        break;
                    }
                    page += 1;
                }
                Err(e) => {
                    tracing::error!("Error fetching instances on page {}: {}", page, e);
                    break;
                }
            }
        }

        instances
    }

    pub async fn get_instance_details(
        &self,
        bearer: &BearerToken,
        instance_id: &str,
    ) -> Result<InstanceDetails> {
        let url = self.endpoint(&format!(
            "{}/{}/withParameters",
            PROCESS_INSTANCES_PATH, instance_id
        ));
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer.as_str())
            .header("Content-Type", "application/json")
            .send()
            .await?;

        Self::expect_json(
            &format!("Fetch details for instance {}", instance_id),
            response,
            StatusCode::OK,
        )
        .await
    }

    pub async fn get_user_data(
        &self,
        bearer: &BearerToken,
        process_def_id: &str,
        instance_id: &str,
    ) -> Result<UserData> {
        let url = self.endpoint(&format!(
            "/api/userdata-server/processDefinitions/{}/processInstances/{}/userdata",
            process_def_id, instance_id
        ));
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer.as_str())
            .header("Content-Type", "application/json")
            .send()
            .await?;

        Self::expect_json(
            &format!("Fetch user data for instance {}", instance_id),
            response,
            StatusCode::OK,
        )
        .await
    }
}

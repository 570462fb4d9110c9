use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{
        Checklist, ChecklistGroup, ChecklistId, ChecklistItem, GroupId, Machine, MachineId,
        MachineType, MachineTypeId, PossibleState, ReportId, UserId,
    },
    protocol::{
        BatchOutcome, CreateReportRequest, CreatedReport, LoginResponse, PdfEnvelope,
        ReportDetailsBatch, ReportFilters, ReportPage,
    },
};
use storage::PdfDocument;
use tracing::{debug, info, warn};
use url::Url;

use crate::{auth::token_subject, error::ClientError, InspectionBackend};

/// A signed-in user: the bearer token plus the id reports are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_id: UserId,
}

/// HTTP client for the inspection backend. Every call except `login`
/// needs a bearer token and fails with `Unauthorized` before touching the
/// network when there is none.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base =
            Url::parse(base_url.trim()).map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http,
            base,
            token: None,
        })
    }

    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Exchanges credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let url = self.endpoint(&["auth", "login"])?;
        let endpoint = url.path().to_string();
        let response = self
            .http
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized("invalid credentials".to_string()));
        }
        let response = check_status(&endpoint, response).await?;
        let body: LoginResponse = decode(&endpoint, response).await?;

        let user_id = token_subject(&body.access_token).unwrap_or_else(|| UserId::new(username));
        info!(user_id = %user_id, "signed in");
        Ok(Session {
            access_token: body.access_token,
            user_id,
        })
    }

    pub async fn list_reports(&self, filters: &ReportFilters) -> Result<ReportPage, ClientError> {
        self.get_json(&["reports", ""], &filters.backend_query()).await
    }

    pub async fn report(&self, id: &ReportId) -> Result<Value, ClientError> {
        self.get_json(&["reports", id.as_str(), ""], &[]).await
    }

    pub async fn report_details(&self, id: &ReportId) -> Result<Value, ClientError> {
        self.get_json(&["reports", id.as_str(), "details", ""], &[]).await
    }

    fn bearer(&self) -> Result<&str, ClientError> {
        self.token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ClientError::Unauthorized("missing access token".to_string()))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn authorized(
        &self,
        segments: &[&str],
        build: impl FnOnce(&Client, Url) -> RequestBuilder,
    ) -> Result<(String, Response), ClientError> {
        let token = self.bearer()?;
        let url = self.endpoint(segments)?;
        let endpoint = url.path().to_string();
        debug!(%endpoint, "backend request");
        let response = build(&self.http, url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        let response = check_status(&endpoint, response).await?;
        Ok((endpoint, response))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let (endpoint, response) = self
            .authorized(segments, |http, url| http.get(url).query(query))
            .await?;
        decode(&endpoint, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let (endpoint, response) = self
            .authorized(segments, |http, url| http.post(url).json(body))
            .await?;
        decode(&endpoint, response).await
    }
}

async fn check_status(endpoint: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        warn!(%endpoint, "backend rejected the access token");
        return Err(ClientError::Unauthorized(format!("{endpoint} rejected the token")));
    }
    let body = response.text().await.unwrap_or_default();
    warn!(%endpoint, status = status.as_u16(), "backend request failed");
    Err(ClientError::Upstream {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await.map_err(|source| ClientError::Transport {
        endpoint: endpoint.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

#[async_trait]
impl InspectionBackend for BackendClient {
    async fn machine_types(&self) -> Result<Vec<MachineType>, ClientError> {
        let mut types: Vec<MachineType> = self.get_json(&["machine-types", ""], &[]).await?;
        types.sort_by_key(|t| t.name.to_lowercase());
        Ok(types)
    }

    async fn machines_by_type(&self, id: &MachineTypeId) -> Result<Vec<Machine>, ClientError> {
        self.get_json(&["machines", "by-type", id.as_str()], &[]).await
    }

    async fn machine(&self, id: &MachineId) -> Result<Machine, ClientError> {
        self.get_json(&["machines", id.as_str()], &[]).await
    }

    async fn checklists_by_type(&self, id: &MachineTypeId) -> Result<Vec<Checklist>, ClientError> {
        self.get_json(&["checklists", "by-machine-type", id.as_str(), ""], &[])
            .await
    }

    async fn groups(&self, checklist_id: &ChecklistId) -> Result<Vec<ChecklistGroup>, ClientError> {
        let mut groups: Vec<ChecklistGroup> = self
            .get_json(&["checklists", checklist_id.as_str(), "groups"], &[])
            .await?;
        groups.sort_by_key(|g| g.order);
        Ok(groups)
    }

    async fn items(&self, group_id: &GroupId) -> Result<Vec<ChecklistItem>, ClientError> {
        let mut items: Vec<ChecklistItem> = self
            .get_json(&["checklists", "groups", group_id.as_str(), "items"], &[])
            .await?;
        items.sort_by_key(|i| i.order);
        Ok(items)
    }

    async fn states_by_type(&self, id: &MachineTypeId) -> Result<Vec<PossibleState>, ClientError> {
        self.get_json(&["states", "by-machine-type", id.as_str()], &[])
            .await
    }

    async fn create_report(&self, request: &CreateReportRequest) -> Result<CreatedReport, ClientError> {
        self.post_json(&["reports", ""], request).await
    }

    async fn create_details_batch(&self, batch: &ReportDetailsBatch) -> Result<BatchOutcome, ClientError> {
        self.post_json(&["reports", "details", "batch", ""], batch).await
    }

    /// Accepts either the JSON envelope with base64 content or a raw PDF body.
    async fn report_pdf(&self, id: &ReportId) -> Result<PdfDocument, ClientError> {
        let (endpoint, response) = self
            .authorized(&["reports", id.as_str(), "pdf", ""], |http, url| {
                http.get(url).header(ACCEPT, "application/json, application/pdf")
            })
            .await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/pdf") {
            let bytes = response.bytes().await.map_err(|source| ClientError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
            return Ok(PdfDocument {
                filename: format!("informe_{id}.pdf"),
                bytes: bytes.to_vec(),
            });
        }

        let envelope: PdfEnvelope = decode(&endpoint, response).await?;
        let bytes = STANDARD
            .decode(envelope.content.trim())
            .map_err(|err| ClientError::Decode {
                endpoint: endpoint.clone(),
                message: format!("pdf content is not base64: {err}"),
            })?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ClientError::Decode {
                endpoint,
                message: "content is not a pdf document".to_string(),
            });
        }
        Ok(PdfDocument {
            filename: envelope.filename,
            bytes,
        })
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;

//! Authenticated session against the data platform.
//!
//! One `SessionGateway` is created by the composition root and shared by
//! every turn. The session is opened at startup, re-opened on demand if it
//! was closed, and closed only when the owner shuts down.

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use omnibus_core::config::{Authenticator, ConnectionConfig, SearchConfig};

use crate::error::GatewayError;

const LOGIN_PATH: &str = "/session/v1/login-request";
const LOGOUT_PATH: &str = "/session?delete=true";
const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const CLIENT_APP_ID: &str = "omnibus";

/// Authorization material attached to every request.
#[derive(Clone)]
pub(crate) struct Credential {
    authorization: String,
    token_type: Option<&'static str>,
}

impl Credential {
    fn session_token(token: &str) -> Self {
        Self {
            authorization: format!("Snowflake Token=\"{}\"", token),
            token_type: None,
        }
    }

    fn bearer(token: &str, token_type: &'static str) -> Self {
        Self {
            authorization: format!("Bearer {}", token),
            token_type: Some(token_type),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
}

/// Long-lived channel to the search and completion services.
pub struct SessionGateway {
    client: reqwest::Client,
    connection: ConnectionConfig,
    search: SearchConfig,
    base_url: String,
    credential: Mutex<Option<Credential>>,
}

impl SessionGateway {
    /// Build the HTTP client without opening the session.
    pub fn new(connection: ConnectionConfig, search: SearchConfig) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = connection.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build http client: {}", e)))?;

        let base_url = connection.base_url();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GatewayError::Config(format!(
                "base url must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            connection,
            search,
            base_url,
            credential: Mutex::new(None),
        })
    }

    /// Build the client and open the session in one step.
    pub async fn connect(
        connection: ConnectionConfig,
        search: SearchConfig,
    ) -> Result<Self, GatewayError> {
        let gateway = Self::new(connection, search)?;
        gateway.open().await?;
        Ok(gateway)
    }

    /// Open the session. Does nothing if it is already open.
    pub async fn open(&self) -> Result<(), GatewayError> {
        let mut credential = self.credential.lock().await;
        if credential.is_none() {
            *credential = Some(self.authenticate().await?);
        }
        Ok(())
    }

    /// Close the session. Does nothing if it is already closed.
    pub async fn close(&self) -> Result<(), GatewayError> {
        let Some(credential) = self.credential.lock().await.take() else {
            return Ok(());
        };

        if self.connection.authenticator == Authenticator::Password {
            let response = self
                .request(&format!("{}{}", self.base_url, LOGOUT_PATH), &credential)
                .json(&json!({}))
                .send()
                .await?;
            ensure_success(response).await?;
        }
        tracing::info!(base_url = %self.base_url, "Session closed");
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.credential.lock().await.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Current credential, re-opening the session if it was closed.
    pub(crate) async fn credential(&self) -> Result<Credential, GatewayError> {
        let mut guard = self.credential.lock().await;
        if let Some(credential) = guard.as_ref() {
            return Ok(credential.clone());
        }
        tracing::info!(base_url = %self.base_url, "Session was closed; reopening");
        let credential = self.authenticate().await?;
        *guard = Some(credential.clone());
        Ok(credential)
    }

    /// Start a POST request carrying the session's authorization headers.
    pub(crate) fn request(&self, url: &str, credential: &Credential) -> RequestBuilder {
        let mut builder = self
            .client
            .post(url)
            .header(AUTHORIZATION, credential.authorization.as_str())
            .header(ACCEPT, HeaderValue::from_static("application/json, text/event-stream"))
            .header(USER_AGENT, concat!("omnibus/", env!("CARGO_PKG_VERSION")));
        if let Some(token_type) = credential.token_type {
            builder = builder.header(TOKEN_TYPE_HEADER, token_type);
        }
        builder
    }

    /// Check a service response. A 401 means the session expired server
    /// side: the cached credential is dropped so the next request logs in
    /// again, and the call fails with `SessionClosed`.
    pub(crate) async fn checked(&self, response: Response) -> Result<Response, GatewayError> {
        match ensure_success(response).await {
            Err(GatewayError::Status { status: 401, message }) => {
                self.credential.lock().await.take();
                tracing::warn!(%message, "Session expired; it will be reopened on the next request");
                Err(GatewayError::SessionClosed)
            }
            other => other,
        }
    }

    async fn authenticate(&self) -> Result<Credential, GatewayError> {
        match self.connection.authenticator {
            Authenticator::Password => self.login().await,
            Authenticator::ProgrammaticAccessToken => {
                self.bearer_credential("PROGRAMMATIC_ACCESS_TOKEN")
            }
            Authenticator::Oauth => self.bearer_credential("OAUTH"),
        }
    }

    fn bearer_credential(&self, token_type: &'static str) -> Result<Credential, GatewayError> {
        let token = self.connection.token.trim();
        if token.is_empty() {
            return Err(GatewayError::Auth("no access token configured".to_string()));
        }
        tracing::info!(token_type, "Session opened with access token");
        Ok(Credential::bearer(token, token_type))
    }

    async fn login(&self) -> Result<Credential, GatewayError> {
        let conn = &self.connection;
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(warehouse) = conn.warehouse.as_deref() {
            params.push(("warehouse", warehouse));
        }
        if let Some(database) = conn.database.as_deref() {
            params.push(("databaseName", database));
        }
        if let Some(schema) = conn.schema.as_deref() {
            params.push(("schemaName", schema));
        }
        if let Some(role) = conn.role.as_deref() {
            params.push(("roleName", role));
        }

        let body = json!({
            "data": {
                "ACCOUNT_NAME": conn.account,
                "LOGIN_NAME": conn.user,
                "PASSWORD": conn.password,
                "CLIENT_APP_ID": CLIENT_APP_ID,
                "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
            }
        });

        let response = self
            .client
            .post(format!("{}{}", self.base_url, LOGIN_PATH))
            .query(&params)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await.map_err(|e| match e {
            GatewayError::Status { status, message } if status == 401 || status == 403 => {
                GatewayError::Auth(message)
            }
            other => other,
        })?;

        let login: LoginResponse = response.json().await?;
        if !login.success {
            return Err(GatewayError::Auth(
                login
                    .message
                    .unwrap_or_else(|| "login rejected".to_string()),
            ));
        }
        let token = login
            .data
            .and_then(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::InvalidPayload("login response has no token".to_string()))?;

        tracing::info!(
            account = %conn.account,
            user = %conn.user,
            role = conn.role.as_deref().unwrap_or(""),
            warehouse = conn.warehouse.as_deref().unwrap_or(""),
            "Session opened"
        );
        Ok(Credential::session_token(&token))
    }
}

/// Turn a non-2xx response into `GatewayError::Status`.
///
/// The service reports failures as JSON with a `message` field; the raw body
/// is used when that field is missing.
async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

//! HTTP client for the parlor API.

use crate::{BalanceBackend, Error, Result};
use parlor_types::api::{
    BalanceResponse, BalanceUpdateRequest, BalanceUpdateResponse, ClickRequest, ClickResponse,
    ClickedItem, ErrorResponse, SessionRequest, SessionResponse,
};
use parlor_types::{Amount, BalanceAction};
use url::Url;

/// Thin reqwest wrapper carrying the base URL and the session token.
///
/// Every method is one request; no retries, since the server rolls back
/// failed mutations and the UI just keeps showing the prior balance.
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            token: None,
        })
    }

    /// Attach an existing session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Dev-mode login: create the user if needed and store the issued
    /// session token. Requires the server's dev-login switch.
    pub async fn login(&mut self, username: &str) -> Result<Amount> {
        let response = self
            .http_client
            .post(self.base_url.join("api/session")?)
            .json(&SessionRequest {
                username: username.to_string(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }
        let session: SessionResponse = response.json().await?;
        self.token = Some(session.token);
        Ok(session.balance)
    }

    fn bearer(&self) -> Result<&str> {
        self.token.as_deref().ok_or(Error::NotAuthenticated)
    }
}

impl BalanceBackend for ApiClient {
    async fn balance(&self) -> Result<Amount> {
        let response = self
            .http_client
            .get(self.base_url.join("api/balance")?)
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }
        let body: BalanceResponse = response.json().await?;
        Ok(body.balance)
    }

    async fn update(&self, wager: Amount, action: BalanceAction) -> Result<Amount> {
        let response = self
            .http_client
            .post(self.base_url.join("api/balance/update")?)
            .bearer_auth(self.bearer()?)
            .json(&BalanceUpdateRequest {
                bet_amount: wager,
                action,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }
        let body: BalanceUpdateResponse = response.json().await?;
        tracing::debug!(message = %body.message, "balance updated");
        Ok(body.balance)
    }

    async fn click(&self, item: &ClickedItem) -> Result<ClickResponse> {
        let response = self
            .http_client
            .post(self.base_url.join("api/moneyclicker/click")?)
            .bearer_auth(self.bearer()?)
            .json(&ClickRequest { item: item.clone() })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }
        Ok(response.json().await?)
    }
}

/// Pull the `{error}` body out of a non-2xx response, falling back to the
/// status line when the body is not the expected shape.
async fn read_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    Error::Failed { status, message }
}

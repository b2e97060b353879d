use axum::{
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::ledger::{LedgerError, UserId};
use crate::service::ServiceError;
use crate::App;
use parlor_types::api::{
    BalanceResponse, BalanceUpdateResponse, ClickRequest, ClickResponse, ErrorResponse,
    SessionRequest, SessionResponse,
};
use parlor_types::{Amount, BalanceAction};

#[derive(Serialize)]
struct HealthzResponse {
    ok: bool,
}

/// Server-side failure classification, mapped onto the wire statuses the
/// browser client understands.
enum ApiError {
    /// 401: no or invalid session; the client redirects to login.
    Unauthorized,
    /// 400: missing/invalid request fields; nothing was mutated.
    Validation(String),
    /// 404: the session's user row is gone.
    NotFound,
    /// 500: transaction conflict or storage failure, already rolled back.
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => ApiError::Validation(message),
            ServiceError::Ledger(LedgerError::NotFound) => ApiError::NotFound,
            ServiceError::Ledger(other) => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            ApiError::Internal(message) => {
                tracing::error!(%message, "balance mutation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Resolve the session token before any transaction begins. Accepts a
/// bearer token or the `session` cookie.
fn authenticate(app: &App, headers: &HeaderMap) -> Result<UserId, ApiError> {
    session_token(headers)
        .and_then(|token| app.sessions.resolve(&token))
        .ok_or(ApiError::Unauthorized)
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "session").then(|| value.to_string())
    })
}

pub(super) async fn healthz() -> Response {
    Json(HealthzResponse { ok: true }).into_response()
}

pub(super) async fn http_metrics(AxumState(app): AxumState<Arc<App>>) -> Response {
    Json(app.metrics.snapshot()).into_response()
}

pub(super) async fn get_balance(
    AxumState(app): AxumState<Arc<App>>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticate(&app, &headers) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };
    match app.service.balance(user).await {
        Ok(balance) => Json(BalanceResponse { balance }).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `POST /api/balance/update`.
///
/// The body is parsed by hand so missing fields and bad action strings
/// both surface as the 400s the browser client expects, rather than
/// axum's default 422.
pub(super) async fn update_balance(
    AxumState(app): AxumState<Arc<App>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let user = match authenticate(&app, &headers) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    let (wager, action) = match parse_update_body(&body) {
        Ok(parsed) => parsed,
        Err(err) => return err.into_response(),
    };

    match app.service.apply_action(user, wager, action).await {
        Ok((balance, message)) => Json(BalanceUpdateResponse { balance, message }).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn parse_update_body(body: &serde_json::Value) -> Result<(Amount, BalanceAction), ApiError> {
    let missing = || ApiError::Validation("Amount and action are required".to_string());

    let wager = body
        .get("betAmount")
        .and_then(|value| value.as_f64())
        .and_then(Amount::try_from_dollars_f64)
        .ok_or_else(missing)?;
    let action = body
        .get("action")
        .and_then(|value| value.as_str())
        .ok_or_else(missing)?;
    let action = BalanceAction::from_str(action)
        .map_err(|_| ApiError::Validation("Invalid action".to_string()))?;
    Ok((wager, action))
}

pub(super) async fn moneyclicker_click(
    AxumState(app): AxumState<Arc<App>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let user = match authenticate(&app, &headers) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    let request: ClickRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(_) => {
            return ApiError::Validation("Item is required".to_string()).into_response();
        }
    };

    match app.service.credit_click(user, &request.item).await {
        Ok(credit) => Json(ClickResponse {
            balance: credit.balance,
            amount: credit.amount,
            item_name: credit.item_name,
            message: credit.message,
        })
        .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Dev-mode login: create the user if needed and issue a session token.
/// Only routed when `dev_login` is enabled.
pub(super) async fn dev_session(
    AxumState(app): AxumState<Arc<App>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let request: SessionRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(_) => {
            return ApiError::Validation("Username is required".to_string()).into_response();
        }
    };
    if request.username.trim().is_empty() {
        return ApiError::Validation("Username is required".to_string()).into_response();
    }

    match app.ledger.create_user(request.username.trim()).await {
        Ok((user, balance)) => {
            let token = app.sessions.issue(user);
            tracing::info!(user, username = %request.username, "issued dev session");
            Json(SessionResponse { token, balance }).into_response()
        }
        Err(err) => ApiError::Internal(err.to_string()).into_response(),
    }
}

//! HTTP request/response shapes.
//!
//! Field names match the browser client's JSON verbatim (`betAmount`,
//! `itemName`); the server is the sole source of truth for balances, so
//! requests carry only an action and an amount, never a computed balance.

use crate::{Amount, BalanceAction};
use serde::{Deserialize, Serialize};

/// `GET /api/balance` response.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: Amount,
}

/// `POST /api/balance/update` request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BalanceUpdateRequest {
    #[serde(rename = "betAmount")]
    pub bet_amount: Amount,
    pub action: BalanceAction,
}

/// `POST /api/balance/update` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceUpdateResponse {
    pub balance: Amount,
    pub message: String,
}

/// The `item` field of a click request: either a bare kind id (the base
/// dollar bill) or a descriptor for a spawned item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClickedItem {
    Kind(String),
    Descriptor { name: String, value: Amount },
}

/// `POST /api/moneyclicker/click` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClickRequest {
    pub item: ClickedItem,
}

/// `POST /api/moneyclicker/click` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClickResponse {
    pub balance: Amount,
    pub amount: Amount,
    #[serde(rename = "itemName")]
    pub item_name: String,
    pub message: String,
}

/// Error body for every non-2xx response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `POST /api/session` request (dev login; stands in for the out-of-scope
/// signup/login subsystem).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRequest {
    pub username: String,
}

/// `POST /api/session` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub balance: Amount,
}

//! Contract setup and evaluation endpoints
//!
//! - POST /api/setup    - pair two users and record goal/stake terms
//! - POST /api/evaluate - settle one period against the daily goal
//!
//! The settlement arithmetic lives in `ideanet-core`; these handlers do
//! the glue: required-field validation, contract fallback resolution,
//! and the atomic balance mutation through the ledger.

use hyper::{Request, Response, StatusCode};
use ideanet_core::compute_transfer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::{error_response, json_response, parse_json_body, BoxBody};
use crate::server::AppState;
use crate::store::DEFAULT_GOAL_COUNT;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub friend_username: String,
    pub daily_goal_count: Option<f64>,
    pub stake_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub contract_id: String,
    pub user_id: String,
    pub friend_id: String,
    pub balances: BTreeMap<String, f64>,
    pub friends: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub contract_id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub friend_username: String,
    pub required: Option<f64>,
    pub completed: Option<f64>,
    pub stake: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub transfer_amount: f64,
    pub met_goal: bool,
    pub message: String,
    pub balances: BTreeMap<String, f64>,
}

/// POST /api/setup
pub async fn handle_setup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: SetupRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let username = body.username.trim().to_string();
    let friend_username = body.friend_username.trim().to_string();
    if username.is_empty() || friend_username.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "username and friendUsername are required",
        );
    }

    let user = state.ledger.ensure_user(&username).await;
    let friend = state.ledger.ensure_user(&friend_username).await;
    let contract = state
        .ledger
        .create_contract(
            &username,
            &friend_username,
            body.daily_goal_count,
            body.stake_amount,
        )
        .await;

    info!(
        contract = %contract.id,
        user = %username,
        friend = %friend_username,
        goal = contract.daily_goal_count,
        stake = contract.stake_amount,
        "Contract created"
    );

    let mut balances = BTreeMap::new();
    balances.insert(user.username.clone(), user.balance);
    balances.insert(friend.username.clone(), friend.balance);

    json_response(
        StatusCode::OK,
        &SetupResponse {
            contract_id: contract.id,
            user_id: user.username,
            friend_id: friend.username.clone(),
            balances,
            friends: vec![friend.username],
        },
    )
}

/// POST /api/evaluate
pub async fn handle_evaluate(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: EvaluateRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let username = body.username.trim().to_string();
    let friend_username = body.friend_username.trim().to_string();
    if username.is_empty() || friend_username.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "username and friendUsername are required",
        );
    }

    state.ledger.ensure_user(&username).await;
    state.ledger.ensure_user(&friend_username).await;

    // Explicit request values win; a resolvable contract fills the gaps;
    // the demo defaults cover the rest.
    let contract = match &body.contract_id {
        Some(id) => state.ledger.contract(id).await,
        None => None,
    };
    let required = body
        .required
        .or(contract.as_ref().map(|c| c.daily_goal_count))
        .unwrap_or(DEFAULT_GOAL_COUNT);
    let completed = body.completed.unwrap_or(0.0);
    let stake = body
        .stake
        .or(contract.as_ref().map(|c| c.stake_amount))
        .unwrap_or(state.args.default_stake);

    let settlement = compute_transfer(required, completed, stake);

    let (user_balance, friend_balance) = state
        .ledger
        .settle(&username, &friend_username, settlement.transfer_amount)
        .await;

    info!(
        user = %username,
        friend = %friend_username,
        required,
        completed,
        transfer = settlement.transfer_amount,
        met_goal = settlement.met_goal,
        "Contract evaluated"
    );

    let message = if settlement.met_goal {
        format!(
            "Great job. You completed {}/{}. No transfer applied.",
            fmt_count(completed),
            fmt_count(required)
        )
    } else {
        format!(
            "You completed {}/{}. ${:.2} was transferred to @{}.",
            fmt_count(completed),
            fmt_count(required),
            settlement.transfer_amount,
            friend_username
        )
    };

    let mut balances = BTreeMap::new();
    balances.insert(username, user_balance);
    balances.insert(friend_username, friend_balance);

    json_response(
        StatusCode::OK,
        &EvaluateResponse {
            transfer_amount: settlement.transfer_amount,
            met_goal: settlement.met_goal,
            message,
            balances,
        },
    )
}

/// Render a count the way it was supplied: whole numbers without a
/// trailing ".0", anything else as-is.
fn fmt_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_format_like_user_input() {
        assert_eq!(fmt_count(5.0), "5");
        assert_eq!(fmt_count(0.0), "0");
        assert_eq!(fmt_count(2.5), "2.5");
        assert_eq!(fmt_count(-3.0), "-3");
    }

    #[test]
    fn setup_request_accepts_camel_case() {
        let body: SetupRequest = serde_json::from_str(
            r#"{"username":"amal","friendUsername":"blake","dailyGoalCount":5,"stakeAmount":100}"#,
        )
        .unwrap();
        assert_eq!(body.username, "amal");
        assert_eq!(body.friend_username, "blake");
        assert_eq!(body.daily_goal_count, Some(5.0));
        assert_eq!(body.stake_amount, Some(100.0));
    }

    #[test]
    fn evaluate_request_fields_are_optional() {
        let body: EvaluateRequest =
            serde_json::from_str(r#"{"username":"amal","friendUsername":"blake"}"#).unwrap();
        assert!(body.contract_id.is_none());
        assert!(body.required.is_none());
        assert!(body.completed.is_none());
        assert!(body.stake.is_none());
    }
}

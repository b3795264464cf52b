// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request handlers.
//
// Authentication happens before the printer is touched: a rejected token
// never opens a connection. Each print runs as its own task under a child
// cancellation token whose drop guard lives in the handler, so a client
// that disconnects cancels its session.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use printgate_core::outcome::classify;
use printgate_core::types::PrintOutcome;
use printgate_print::Dialer;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub username: String,
    pub token: String,
    /// Base64 or literal text.
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    /// RFC 3339, UTC.
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<PrintOutcome>,
}

fn message(status: StatusCode, message: &'static str) -> Response {
    (
        status,
        Json(MessageBody {
            message,
            outcome: None,
        }),
    )
        .into_response()
}

fn outcome_response(outcome: PrintOutcome) -> Response {
    let disposition = classify(outcome);
    let status =
        StatusCode::from_u16(disposition.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = MessageBody {
        message: disposition.message,
        outcome: (!outcome.is_success()).then_some(outcome),
    };
    (status, Json(body)).into_response()
}

/// Handle POST /print.
pub async fn print<D: Dialer + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<PrintRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(req) => req,
        Err(rejection) => {
            debug!(error = %rejection, "malformed print request");
            return message(StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    let auth = state.auth.clone();
    let (username, token) = (req.username.clone(), req.token);
    let validation = tokio::task::spawn_blocking(move || auth.validate(&username, &token)).await;
    let authorised = match validation {
        Ok(valid) => valid,
        Err(e) => {
            error!(error = %e, "token validation task failed");
            return outcome_response(PrintOutcome::InternalError);
        }
    };
    if !authorised {
        info!(username = %req.username, "print rejected: unauthorized");
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let cancel = state.shutdown.child_token();
    let _disconnect_guard = cancel.clone().drop_guard();
    let relay = state.relay.clone();
    let payload = req.message;
    let session = tokio::spawn(async move { relay.submit(&payload, cancel).await });

    let outcome = match session.await {
        Ok(report) => {
            info!(
                username = %req.username,
                job_id = %report.job_id,
                outcome = %report.outcome,
                "print request finished"
            );
            report.outcome
        }
        Err(e) => {
            error!(error = %e, "print session task failed");
            PrintOutcome::InternalError
        }
    };
    outcome_response(outcome)
}

/// Handle POST /auth.
pub async fn auth<D: Dialer + 'static>(
    State(state): State<AppState<D>>,
    body: Result<Json<AuthRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(req) => req,
        Err(rejection) => {
            debug!(error = %rejection, "malformed auth request");
            return message(StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    let auth = state.auth.clone();
    let username = req.username.clone();
    let login = tokio::task::spawn_blocking(move || auth.login(&req.username, &req.password)).await;

    match login {
        Ok(Ok(Some(issued))) => Json(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
        .into_response(),
        Ok(Ok(None)) => message(StatusCode::UNAUTHORIZED, "Unauthorized"),
        Ok(Err(e)) => {
            warn!(username = %username, error = %e, "token issuance failed");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        Err(e) => {
            error!(error = %e, "login task failed");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Handle GET /health.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

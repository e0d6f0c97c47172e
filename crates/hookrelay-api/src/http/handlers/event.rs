//! Event receiver.
//!
//! Turns an HTTP request into an `InboundEvent`, hands it to the
//! dispatcher, and maps the dispatch response onto the HTTP reply. Work the
//! dispatcher continues in the background is logged once it settles.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{Instrument, debug, info_span};

use hookrelay_core::dispatch::{DispatchReceipt, DispatchResponse, TriggerOutcome};
use hookrelay_types::inbound::InboundEvent;

use crate::http::error::AppError;
use crate::state::AppState;

/// Build an inbound event from the request parts. Non-UTF-8 header values
/// are dropped.
pub fn inbound_event(path: String, headers: &HeaderMap, body: Bytes) -> InboundEvent {
    InboundEvent::new(path, body).with_headers(
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string()))),
    )
}

/// POST /events/{*path} - Receive a webhook event.
pub async fn receive_event(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let event = inbound_event(path, &headers, body);
    let DispatchReceipt { response, settled } = state.dispatcher.dispatch(event).await?;

    if let Some(settled) = settled {
        tokio::spawn(
            async move {
                let Ok(reports) = settled.await else {
                    return;
                };
                for report in reports {
                    let started = report.started().len();
                    let rejected = report.result.as_ref().map_or(0, |triggers| {
                        triggers
                            .iter()
                            .filter(|t| t.outcome == TriggerOutcome::AuthenticationRejected)
                            .count()
                    });
                    debug!(
                        workflow_id = %report.workflow_id,
                        started,
                        rejected,
                        failed = report.result.is_err(),
                        static_data_saved = report.static_data_saved,
                        "workflow unit settled"
                    );
                }
            }
            .instrument(info_span!("dispatch_settled")),
        );
    }

    Ok(match response {
        DispatchResponse::Acknowledged => StatusCode::OK.into_response(),
        DispatchResponse::Challenge(challenge) => {
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        DispatchResponse::Respond(data) => Json(data).into_response(),
    })
}
